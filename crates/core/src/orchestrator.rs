//! Wires a user turn through retrieval, generation, and transcript update
//! for the targeted session, and runs the ingestion pipeline that builds a
//! session's index.

use crate::chunking::{normalize_text, split_text, ChunkingConfig};
use crate::embeddings::Embedder;
use crate::error::{ChatError, IngestError};
use crate::extractor::{extract_documents, PdfSource, SkippedDocument};
use crate::generation::{AnswerGenerator, GeneratedAnswer, GENERATION_FAILURE_ANSWER};
use crate::index::VectorIndex;
use crate::llm::ChatClient;
use crate::retriever::{retrieve, DEFAULT_TOP_K};
use crate::session::{ChatTurn, IndexState, SessionStore};
use futures_util::StreamExt;
use std::sync::Arc;
use uuid::Uuid;

/// What a successful processing run produced. Skipped files are warnings,
/// not failures.
#[derive(Debug)]
pub struct ProcessingReport {
    pub chunk_count: usize,
    pub document_names: Vec<String>,
    pub skipped: Vec<SkippedDocument>,
}

/// Final answer for one question, plus the contained generation error when
/// the fixed failure text was substituted.
#[derive(Debug)]
pub struct AskOutcome {
    pub answer: String,
    pub failure: Option<ChatError>,
}

pub struct ChatCoordinator<C: ChatClient> {
    store: SessionStore,
    embedder: Arc<dyn Embedder>,
    generator: AnswerGenerator<C>,
    chunking: ChunkingConfig,
}

impl<C: ChatClient> ChatCoordinator<C> {
    pub fn new(embedder: Arc<dyn Embedder>, generator: AnswerGenerator<C>) -> Self {
        Self {
            store: SessionStore::new(),
            embedder,
            generator,
            chunking: ChunkingConfig::default(),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    /// Runs extract → chunk → embed → index for one session. Any failed
    /// stage moves the session to its failed state with a stage-specific
    /// message; success swaps in the new index and clears the transcript.
    pub fn process_documents(
        &mut self,
        session_id: Uuid,
        sources: &[PdfSource],
    ) -> Result<ProcessingReport, ChatError> {
        if self.store.get(session_id).is_none() {
            return Err(ChatError::SessionNotFound(session_id));
        }
        if sources.is_empty() {
            // Nothing was submitted, so no processing run happened and the
            // session keeps whatever state it had.
            return Err(IngestError::NoDocuments.into());
        }

        let document_names: Vec<String> = sources.iter().map(|s| s.name.clone()).collect();
        let report = extract_documents(sources);

        let built = (|| {
            let text = normalize_text(&report.text);
            if text.is_empty() {
                return Err(IngestError::NoText);
            }

            let chunks = split_text(&text, self.chunking);
            if chunks.is_empty() {
                return Err(IngestError::NoChunks);
            }

            let index = VectorIndex::build(chunks, self.embedder.as_ref())?;
            Ok(index)
        })();

        let session = self
            .store
            .get_mut(session_id)
            .ok_or(ChatError::SessionNotFound(session_id))?;
        session.document_names = document_names.clone();

        match built {
            Ok(index) => {
                let chunk_count = index.len();
                session.index = IndexState::Ready(index);
                // Stale answers must not reference a replaced index.
                session.transcript.clear();
                Ok(ProcessingReport {
                    chunk_count,
                    document_names,
                    skipped: report.skipped,
                })
            }
            Err(error) => {
                session.index = IndexState::Failed(error.to_string());
                Err(error.into())
            }
        }
    }

    /// Answers one question against a session's index. Fails fast without
    /// touching the transcript when no index exists; otherwise the user turn
    /// is recorded before retrieval, and retrieval or generation failures
    /// are contained as a fixed assistant entry. `on_fragment` sees streamed
    /// fragments as they arrive; only the returned answer is durable.
    pub async fn ask<F>(
        &mut self,
        session_id: Uuid,
        question: &str,
        mut on_fragment: F,
    ) -> Result<AskOutcome, ChatError>
    where
        F: FnMut(&str),
    {
        let session = self
            .store
            .get(session_id)
            .ok_or(ChatError::SessionNotFound(session_id))?;
        if !session.index.is_indexed() {
            return Err(ChatError::NotIndexed);
        }

        let session = self
            .store
            .get_mut(session_id)
            .ok_or(ChatError::SessionNotFound(session_id))?;
        session.transcript.push(ChatTurn::user(question));

        // Readiness was checked above; re-borrow after the transcript write.
        let index = self
            .store
            .get(session_id)
            .and_then(|session| session.index.index())
            .ok_or(ChatError::NotIndexed)?;
        let retrieved = retrieve(index, self.embedder.as_ref(), question, DEFAULT_TOP_K);

        let (answer, failure) = match retrieved {
            Ok(passages) => match self.generator.generate(&passages, question).await {
                Ok(GeneratedAnswer::Fixed(text)) => (text, None),
                Ok(GeneratedAnswer::Stream(mut stream)) => {
                    let mut accumulated = String::new();
                    let mut failure = None;

                    while let Some(item) = stream.next().await {
                        match item {
                            Ok(fragment) => {
                                on_fragment(&fragment);
                                accumulated.push_str(&fragment);
                            }
                            Err(error) => {
                                failure = Some(error);
                                break;
                            }
                        }
                    }

                    match failure {
                        // Partial text is discarded, not committed.
                        Some(error) => (GENERATION_FAILURE_ANSWER.to_string(), Some(error)),
                        None => (accumulated, None),
                    }
                }
                Err(error) => (GENERATION_FAILURE_ANSWER.to_string(), Some(error)),
            },
            // A question-time embedding failure is contained the same way
            // as a generation failure; the user turn stays recorded.
            Err(error) => (
                GENERATION_FAILURE_ANSWER.to_string(),
                Some(ChatError::Ingest(error)),
            ),
        };

        let session = self
            .store
            .get_mut(session_id)
            .ok_or(ChatError::SessionNotFound(session_id))?;
        session.transcript.push(ChatTurn::assistant(answer.clone()));

        Ok(AskOutcome { answer, failure })
    }
}
