use async_trait::async_trait;
use parley_application::{ConversationStore, StoreError};
use parley_domain::Turn;
use std::collections::HashMap;
use std::sync::Mutex;

/// Process-lifetime store; history is lost on exit.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    conversations: Mutex<HashMap<String, Vec<Turn>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids with at least one stored turn
    pub fn ids(&self) -> Vec<String> {
        match self.conversations.lock() {
            Ok(map) => {
                let mut ids: Vec<String> = map.keys().cloned().collect();
                ids.sort();
                ids
            }
            Err(_) => Vec::new(),
        }
    }
}

fn poisoned() -> StoreError {
    StoreError::Io(std::io::Error::other("conversation store lock poisoned"))
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn load(&self, id: &str) -> Result<Vec<Turn>, StoreError> {
        let map = self.conversations.lock().map_err(|_| poisoned())?;
        Ok(map.get(id).cloned().unwrap_or_default())
    }

    async fn append(&self, id: &str, turn: &Turn) -> Result<(), StoreError> {
        let mut map = self.conversations.lock().map_err(|_| poisoned())?;
        map.entry(id.to_string()).or_default().push(turn.clone());
        Ok(())
    }
}
