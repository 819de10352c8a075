use crate::embeddings::Embedder;
use crate::error::IngestError;

/// Immutable in-memory similarity index over chunk embeddings. Built once
/// per processing run; reprocessing replaces the whole index instead of
/// mutating it.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    vector: Vec<f32>,
    text: String,
}

impl VectorIndex {
    /// Embeds every chunk and stores the pairs. Fails without producing a
    /// partial index when the chunk list is empty or any embedding fails.
    pub fn build(chunks: Vec<String>, embedder: &dyn Embedder) -> Result<Self, IngestError> {
        if chunks.is_empty() {
            return Err(IngestError::NoChunks);
        }

        let vectors = embedder
            .embed_batch(&chunks)
            .map_err(IngestError::Embedding)?;

        let entries = vectors
            .into_iter()
            .zip(chunks)
            .map(|(vector, text)| IndexEntry { vector, text })
            .collect();

        Ok(Self {
            entries,
            dimensions: embedder.dimensions(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Returns up to `k` chunk texts nearest to `query`, nearest first.
    /// Similarity is cosine, computed as a dot product since the embedder
    /// emits unit vectors. Ties keep original insertion order.
    pub fn query(
        &self,
        embedder: &dyn Embedder,
        query: &str,
        k: usize,
    ) -> Result<Vec<String>, IngestError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = embedder.embed(query).map_err(IngestError::Embedding)?;
        if query_vector.len() != self.dimensions {
            return Err(IngestError::Embedding(format!(
                "query vector has {} dimensions, index expects {}",
                query_vector.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (position, dot(&entry.vector, &query_vector)))
            .collect();

        scored.sort_by(|left, right| {
            right
                .1
                .total_cmp(&left.1)
                .then_with(|| left.0.cmp(&right.0))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(position, _)| self.entries[position].text.clone())
            .collect())
    }
}

fn dot(left: &[f32], right: &[f32]) -> f32 {
    left.iter()
        .zip(right.iter())
        .map(|(a, b)| a * b)
        .sum()
}
