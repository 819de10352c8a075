pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod generation;
pub mod index;
pub mod llm;
pub mod orchestrator;
pub mod retriever;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use chunking::{normalize_text, split_text, ChunkingConfig};
pub use config::{
    AssistantConfig, DEFAULT_CHAT_BASE_URL, DEFAULT_EMBEDDING_MODEL, DEFAULT_LLM_MODEL,
};
pub use embeddings::{Embedder, HashedNgramEmbedder};
pub use error::{ChatError, ConfigError, IngestError};
pub use extractor::{
    extract_documents, extract_documents_with, ExtractionReport, LopdfExtractor, PdfExtractor,
    PdfSource, SkippedDocument,
};
pub use generation::{
    AnswerGenerator, GeneratedAnswer, FALLBACK_PHRASE, GENERATION_FAILURE_ANSWER,
    NO_CONTEXT_ANSWER,
};
pub use index::VectorIndex;
pub use llm::{ChatClient, ChatMessage, ChatRole, FragmentStream, OpenRouterClient};
pub use orchestrator::{AskOutcome, ChatCoordinator, ProcessingReport};
pub use retriever::{retrieve, DEFAULT_TOP_K};
pub use session::{ChatTurn, IndexState, Session, SessionStore};
