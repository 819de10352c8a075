//! Session registry: each session exclusively owns its documents, index,
//! and transcript. Sessions live for the process lifetime only.

use crate::error::ChatError;
use crate::index::VectorIndex;
use crate::llm::ChatRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Index lifecycle for one session. The pairing of "indexed" and "index
/// present" is encoded in the variants, so the two can never disagree.
#[derive(Debug, Clone, Default)]
pub enum IndexState {
    /// Just created, no processing attempted.
    #[default]
    Empty,
    /// Last processing run succeeded.
    Ready(VectorIndex),
    /// Last processing run failed; kept until the next attempt.
    Failed(String),
}

impl IndexState {
    pub fn is_indexed(&self) -> bool {
        matches!(self, IndexState::Ready(_))
    }

    pub fn index(&self) -> Option<&VectorIndex> {
        match self {
            IndexState::Ready(index) => Some(index),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            IndexState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub document_names: Vec<String>,
    pub index: IndexState,
    pub transcript: Vec<ChatTurn>,
}

impl Session {
    fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            created_at: Utc::now(),
            document_names: Vec::new(),
            index: IndexState::default(),
            transcript: Vec::new(),
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_indexed()
    }
}

/// Insertion-ordered registry of sessions plus the "current" pointer.
/// Constructed explicitly at process start and passed by reference; there
/// is no ambient global.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Vec<Session>,
    current: Option<Uuid>,
    created: usize,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session with the next sequential display name and makes it
    /// current.
    pub fn create(&mut self) -> Uuid {
        self.created += 1;
        let session = Session::new(format!("Chat {}", self.created));
        let id = session.id;
        self.sessions.push(session);
        self.current = Some(id);
        id
    }

    /// Returns the current session id, creating the first session when the
    /// registry is observed empty.
    pub fn ensure_session(&mut self) -> Uuid {
        if self.sessions.is_empty() {
            return self.create();
        }
        match self.current {
            Some(id) => id,
            None => {
                let id = self.sessions[0].id;
                self.current = Some(id);
                id
            }
        }
    }

    pub fn select(&mut self, id: Uuid) -> Result<(), ChatError> {
        if self.sessions.iter().any(|session| session.id == id) {
            self.current = Some(id);
            Ok(())
        } else {
            Err(ChatError::SessionNotFound(id))
        }
    }

    /// Removes a session. When the current session is deleted, the first
    /// remaining session becomes current, or none when the registry empties.
    pub fn delete(&mut self, id: Uuid) -> Result<(), ChatError> {
        let position = self
            .sessions
            .iter()
            .position(|session| session.id == id)
            .ok_or(ChatError::SessionNotFound(id))?;

        self.sessions.remove(position);
        if self.current == Some(id) {
            self.current = self.sessions.first().map(|session| session.id);
        }
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Option<&Session> {
        self.sessions.iter().find(|session| session.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|session| session.id == id)
    }

    pub fn current_id(&self) -> Option<Uuid> {
        self.current
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.and_then(|id| self.get(id))
    }

    pub fn list(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
