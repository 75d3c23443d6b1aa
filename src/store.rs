//! Conversation storage.
//!
//! [`ConversationStore`] keeps per-conversation [`AgentState`] and hands out a
//! per-id turn lock, guaranteeing at-most-one in-flight turn per conversation.
//! The in-memory map is unbounded with no eviction; callers needing bounded
//! memory must add one.
//!
//! [`FileCheckpointer`] is a write-through JSON snapshot per conversation, a
//! durability add-on the core's correctness does not depend on.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::agent::AgentState;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Conversation {0} not found")]
    NotFound(String),
}

/// Keyed conversation storage plus per-id turn serialization.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn get(&self, id: &str) -> Option<AgentState>;

    async fn put(&self, state: AgentState);

    /// Remove a conversation. The only operation whose failure is surfaced to
    /// external callers as a hard error.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Lock guarding turns for one conversation id. Hold the guard for the
    /// whole turn; deriving a new turn's state from the stored one and
    /// writing it back is otherwise a lost-update race.
    async fn turn_lock(&self, id: &str) -> Arc<Mutex<()>>;
}

/// In-memory conversation store (non-persistent).
#[derive(Default)]
pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<String, AgentState>>,
    turn_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get(&self, id: &str) -> Option<AgentState> {
        self.conversations.read().await.get(id).cloned()
    }

    async fn put(&self, state: AgentState) {
        self.conversations
            .write()
            .await
            .insert(state.conversation_id.clone(), state);
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let removed = self.conversations.write().await.remove(id);
        self.turn_locks.lock().await.remove(id);
        match removed {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    async fn turn_lock(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.turn_locks.lock().await;
        locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// On-disk checkpoint of one conversation.
#[derive(Debug, Serialize, Deserialize)]
struct Checkpoint {
    saved_at: chrono::DateTime<Utc>,
    state: AgentState,
}

/// Write-through file checkpoints, one JSON file per conversation id.
///
/// All operations are best-effort: failures are logged by the caller and
/// never fail a turn.
pub struct FileCheckpointer {
    dir: PathBuf,
}

impl FileCheckpointer {
    pub fn new(dir: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: &str) -> PathBuf {
        // Conversation ids are caller-supplied; keep the filename safe.
        let safe: String = id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }

    pub fn save(&self, state: &AgentState) -> anyhow::Result<()> {
        let checkpoint = Checkpoint { saved_at: Utc::now(), state: state.clone() };
        let json = serde_json::to_vec_pretty(&checkpoint)?;
        std::fs::write(self.path_for(&state.conversation_id), json)?;
        Ok(())
    }

    pub fn load(&self, id: &str) -> Option<AgentState> {
        let bytes = std::fs::read(self.path_for(id)).ok()?;
        let checkpoint: Checkpoint = serde_json::from_slice(&bytes).ok()?;
        Some(checkpoint.state)
    }

    pub fn remove(&self, id: &str) {
        let _ = std::fs::remove_file(self.path_for(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delete_absent_id_is_not_found() {
        let store = InMemoryConversationStore::new();
        let result = store.delete("conv_missing").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_then_get_starts_fresh() {
        let store = InMemoryConversationStore::new();
        let mut state = AgentState::new("conv_1");
        state.push_user("hello");
        store.put(state).await;

        assert!(store.get("conv_1").await.is_some());
        store.delete("conv_1").await.unwrap();
        assert!(store.get("conv_1").await.is_none());
    }

    #[tokio::test]
    async fn turn_lock_is_stable_per_id() {
        let store = InMemoryConversationStore::new();
        let a = store.turn_lock("conv_1").await;
        let b = store.turn_lock("conv_1").await;
        let other = store.turn_lock("conv_2").await;

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[tokio::test]
    async fn turn_lock_serializes_holders() {
        let store = InMemoryConversationStore::new();
        let lock = store.turn_lock("conv_1").await;
        let guard = lock.lock().await;

        let second = store.turn_lock("conv_1").await;
        assert!(second.try_lock().is_err());
        drop(guard);
        assert!(second.try_lock().is_ok());
    }

    #[test]
    fn checkpoint_round_trips_state() {
        let dir = tempfile::tempdir().unwrap();
        let checkpointer = FileCheckpointer::new(dir.path().to_path_buf()).unwrap();

        let mut state = AgentState::new("conv_1");
        state.push_user("hello");
        state.current_response = Some("hi".to_string());
        checkpointer.save(&state).unwrap();

        let loaded = checkpointer.load("conv_1").unwrap();
        assert_eq!(loaded.conversation_id, "conv_1");
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.current_response.as_deref(), Some("hi"));

        checkpointer.remove("conv_1");
        assert!(checkpointer.load("conv_1").is_none());
    }

    #[test]
    fn checkpoint_filenames_are_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let checkpointer = FileCheckpointer::new(dir.path().to_path_buf()).unwrap();

        let state = AgentState::new("../evil/../../id");
        checkpointer.save(&state).unwrap();

        // Nothing escaped the checkpoint directory.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
