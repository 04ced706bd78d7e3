//! services/api/src/adapters/kv.rs
//!
//! Adapter for the local persistent key-value store. A single fixed key is
//! in use (the default recipient email), so the store is one small file.

use async_trait::async_trait;
use idea_polisher_core::ports::{DefaultRecipientStore, PortError, PortResult};
use std::io::ErrorKind;
use std::path::PathBuf;

/// An adapter that implements `DefaultRecipientStore` on top of a file.
#[derive(Clone)]
pub struct FileRecipientStore {
    path: PathBuf,
}

impl FileRecipientStore {
    /// Creates a new `FileRecipientStore` backed by `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl DefaultRecipientStore for FileRecipientStore {
    async fn load(&self) -> PortResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let recipient = contents.trim().to_string();
                Ok(if recipient.is_empty() {
                    None
                } else {
                    Some(recipient)
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Network(e.to_string())),
        }
    }

    async fn save(&self, recipient: &str) -> PortResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Network(e.to_string()))?;
        }
        tokio::fs::write(&self.path, recipient)
            .await
            .map_err(|e| PortError::Network(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_no_default() {
        let dir = std::env::temp_dir().join(format!("polisher-kv-{}", uuid::Uuid::new_v4()));
        let store = FileRecipientStore::new(dir.join("default_recipient"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = std::env::temp_dir().join(format!("polisher-kv-{}", uuid::Uuid::new_v4()));
        let store = FileRecipientStore::new(dir.join("default_recipient"));
        store.save("a@b.com").await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some("a@b.com".to_string()));
        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
