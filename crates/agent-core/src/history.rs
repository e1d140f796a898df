//! Conversation History
//!
//! Append-only per-session log of turns. Stores are read and rewritten
//! wholesale; there is no locking across processes, so concurrent writers to
//! the same session are last-writer-wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::message::Message;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// History store trait for persistence
pub trait HistoryStore: Send + Sync {
    /// All messages of a session in insertion order
    fn load(&self, session: &SessionId) -> Result<Vec<Message>>;

    /// Append messages to the end of a session
    fn append(&self, session: &SessionId, messages: &[Message]) -> Result<()>;

    /// Drop a session's history
    fn clear(&self, session: &SessionId) -> Result<()>;
}

fn poisoned<T>(_: T) -> AgentError {
    AgentError::History("history lock poisoned".into())
}

/// In-memory history store (for development/testing)
#[derive(Default)]
pub struct MemoryHistoryStore {
    sessions: RwLock<HashMap<SessionId, Vec<Message>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self, session: &SessionId) -> Result<Vec<Message>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions.get(session).cloned().unwrap_or_default())
    }

    fn append(&self, session: &SessionId, messages: &[Message]) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions
            .entry(session.clone())
            .or_default()
            .extend_from_slice(messages);
        Ok(())
    }

    fn clear(&self, session: &SessionId) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.remove(session);
        Ok(())
    }
}

/// One JSON file per session under a directory
pub struct JsonFileHistoryStore {
    dir: PathBuf,
}

impl JsonFileHistoryStore {
    /// Use `dir` for session files. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Session ids are hex-encoded, so distinct ids never share a file
    fn path_for(&self, session: &SessionId) -> PathBuf {
        self.dir.join(format!("{}.json", hex::encode(session.as_str())))
    }
}

impl HistoryStore for JsonFileHistoryStore {
    fn load(&self, session: &SessionId) -> Result<Vec<Message>> {
        let path = self.path_for(session);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn append(&self, session: &SessionId, messages: &[Message]) -> Result<()> {
        let mut history = self.load(session)?;
        history.extend_from_slice(messages);

        std::fs::create_dir_all(&self.dir)?;
        let bytes = serde_json::to_vec_pretty(&history)?;
        std::fs::write(self.path_for(session), bytes)?;
        Ok(())
    }

    fn clear(&self, session: &SessionId) -> Result<()> {
        match std::fs::remove_file(self.path_for(session)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn test_memory_store_preserves_order() {
        let store = MemoryHistoryStore::new();
        let session = SessionId::new();

        store.append(&session, &[Message::user("gm")]).unwrap();
        store.append(&session, &[Message::assistant("gm! how can I help?")]).unwrap();

        let history = store.load(&session).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[test]
    fn test_memory_store_isolates_sessions() {
        let store = MemoryHistoryStore::new();
        let a = SessionId::from_string("a");
        let b = SessionId::from_string("b");

        store.append(&a, &[Message::user("hello")]).unwrap();
        assert!(store.load(&b).unwrap().is_empty());

        store.clear(&a).unwrap();
        assert!(store.load(&a).unwrap().is_empty());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistoryStore::new(dir.path().join("history"));
        let session = SessionId::from_string("../escape attempt");

        assert!(store.load(&session).unwrap().is_empty());
        store.append(&session, &[Message::user("price of sol?")]).unwrap();
        store.append(&session, &[Message::assistant("$150")]).unwrap();

        let history = store.load(&session).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "$150");
        assert!(store.path_for(&session).starts_with(store.dir()));

        store.clear(&session).unwrap();
        assert!(store.load(&session).unwrap().is_empty());
    }

    #[test]
    fn test_file_store_keeps_similar_ids_apart() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistoryStore::new(dir.path());
        let colon = SessionId::from_string("alice:1");
        let underscore = SessionId::from_string("alice_1");

        store.append(&colon, &[Message::user("first session")]).unwrap();

        assert!(store.load(&underscore).unwrap().is_empty());
        assert_ne!(store.path_for(&colon), store.path_for(&underscore));
        assert_eq!(store.load(&colon).unwrap()[0].content, "first session");
    }
}
