use crate::domain::model::StoreData;
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use tokio::sync::Mutex;

/// The bot's state file. All read-modify-write cycles go through one lock so
/// the polling loop and the notifier never overwrite each other's changes.
pub struct JsonStore<S: Storage> {
    storage: S,
    file_name: String,
    lock: Mutex<()>,
}

impl<S: Storage> JsonStore<S> {
    pub fn new(storage: S, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// A missing file is an empty store; an unreadable one is logged and
    /// treated as empty too.
    pub async fn load(&self) -> StoreData {
        let _guard = self.lock.lock().await;
        self.load_unlocked().await
    }

    pub async fn save(&self, data: &StoreData) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.save_unlocked(data).await
    }

    /// Loads, applies `f`, and saves in one locked step.
    pub async fn update<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut StoreData) -> R,
    {
        let _guard = self.lock.lock().await;
        let mut data = self.load_unlocked().await;
        let result = f(&mut data);
        self.save_unlocked(&data).await?;
        Ok(result)
    }

    async fn load_unlocked(&self) -> StoreData {
        if !self.storage.exists(&self.file_name).await {
            return StoreData::default();
        }

        match self.storage.read_file(&self.file_name).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("Failed to parse state file {}: {}", self.file_name, e);
                    StoreData::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to load state file {}: {}", self.file_name, e);
                StoreData::default()
            }
        }
    }

    async fn save_unlocked(&self, data: &StoreData) -> Result<()> {
        let json = serde_json::to_vec_pretty(data)?;
        self.storage.write_file(&self.file_name, &json).await?;
        tracing::debug!("State saved to {} ({} bytes)", self.file_name, json.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::AppError;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<tokio::sync::Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &[u8]) {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
        }

        async fn get(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                AppError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.put(path, data).await;
            Ok(())
        }

        async fn exists(&self, path: &str) -> bool {
            self.files.lock().await.contains_key(path)
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let store = JsonStore::new(MockStorage::default(), "state.json");
        assert_eq!(store.load().await, StoreData::default());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let storage = MockStorage::default();
        storage.put("state.json", b"{not json").await;

        let store = JsonStore::new(storage, "state.json");
        assert_eq!(store.load().await, StoreData::default());
    }

    #[tokio::test]
    async fn test_update_persists() {
        let storage = MockStorage::default();
        let store = JsonStore::new(storage.clone(), "state.json");

        let days = store
            .update(|data| {
                data.set_notify_days("chat-1", 7);
                data.notify_days("chat-1")
            })
            .await
            .unwrap();
        assert_eq!(days, Some(7));

        let raw = storage.get("state.json").await.unwrap();
        let parsed: StoreData = serde_json::from_slice(&raw).unwrap();
        assert_eq!(parsed.notify_days("chat-1"), Some(7));
        assert_eq!(store.load().await, parsed);
    }
}
