//! Conversation store port
//!
//! Durable turn history keyed by conversation id. The orchestrator seeds a
//! context from [`ConversationStore::load`] the first time an id is used and
//! appends every turn afterwards. Store failures are logged by the caller and
//! never fail a turn.

use async_trait::async_trait;
use parley_domain::Turn;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid conversation id: {0}")]
    InvalidId(String),
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// All persisted turns for `id`, oldest first. Unknown ids yield an empty list.
    async fn load(&self, id: &str) -> Result<Vec<Turn>, StoreError>;

    /// Persist one turn at the end of `id`'s history
    async fn append(&self, id: &str, turn: &Turn) -> Result<(), StoreError>;
}

/// Store that keeps nothing; every conversation starts empty.
pub struct NoConversationStore;

#[async_trait]
impl ConversationStore for NoConversationStore {
    async fn load(&self, _id: &str) -> Result<Vec<Turn>, StoreError> {
        Ok(Vec::new())
    }

    async fn append(&self, _id: &str, _turn: &Turn) -> Result<(), StoreError> {
        Ok(())
    }
}
