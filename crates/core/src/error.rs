use thiserror::Error;
use uuid::Uuid;

/// Startup errors. These are the only errors that terminate the process;
/// everything else is contained at the operation that raised it.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing API key: set OPENROUTER_API_KEY")]
    MissingApiKey,

    #[error("unknown embedding model: {0}")]
    UnknownEmbeddingModel(String),
}

/// Failures inside one document-processing run. The owning session moves to
/// its failed state; other sessions are unaffected.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no documents were submitted")]
    NoDocuments,

    #[error("no text could be extracted from the submitted documents")]
    NoText,

    #[error("extracted text could not be split into chunks")]
    NoChunks,

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("embedding failed: {0}")]
    Embedding(String),
}

/// Errors surfaced by session operations and question answering.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("no documents have been processed for this session yet")]
    NotIndexed,

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat provider rejected the request: {0}")]
    Provider(String),

    #[error("malformed completion stream: {0}")]
    MalformedStream(String),
}

pub type Result<T, E = ChatError> = std::result::Result<T, E>;
