//! File-backed conversation store: one JSONL file per conversation id.
//!
//! Each line is one serialized [`Turn`]. Lines that fail to parse are
//! skipped with a warning so one damaged record does not hide the rest of
//! a conversation.

use async_trait::async_trait;
use parley_application::{ConversationStore, StoreError};
use parley_domain::Turn;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const MAX_ID_LEN: usize = 128;

pub struct JsonlConversationStore {
    dir: PathBuf,
}

impl JsonlConversationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path for `id`. Ids map directly to file names, so only ASCII
    /// letters, digits, `-` and `_` are accepted.
    pub fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        let valid = !id.is_empty()
            && id.len() <= MAX_ID_LEN
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.dir.join(format!("{}.jsonl", id)))
    }
}

#[async_trait]
impl ConversationStore for JsonlConversationStore {
    async fn load(&self, id: &str) -> Result<Vec<Turn>, StoreError> {
        let path = self.path_for(id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut turns = Vec::new();
        for (n, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Turn>(line) {
                Ok(turn) => turns.push(turn),
                Err(e) => warn!("Skipping unreadable line {} of {}: {}", n + 1, path.display(), e),
            }
        }
        debug!("Loaded {} turn(s) for conversation '{}'", turns.len(), id);
        Ok(turns)
    }

    async fn append(&self, id: &str, turn: &Turn) -> Result<(), StoreError> {
        let path = self.path_for(id)?;
        let mut line =
            serde_json::to_string(turn).map_err(|e| StoreError::Serialization(e.to_string()))?;
        line.push('\n');

        tokio::fs::create_dir_all(&self.dir).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
