use crate::embeddings::Embedder;
use crate::error::IngestError;
use crate::index::VectorIndex;

/// Number of passages fed into answer generation on the end-user path.
pub const DEFAULT_TOP_K: usize = 4;

/// Thin contract layer over the vector index: at most `k` passages, nearest
/// first. Callers must short-circuit before calling when no index exists.
pub fn retrieve(
    index: &VectorIndex,
    embedder: &dyn Embedder,
    query: &str,
    k: usize,
) -> Result<Vec<String>, IngestError> {
    index.query(embedder, query, k)
}
