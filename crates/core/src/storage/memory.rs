use crate::storage::CredentialStore;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: tokio::sync::Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> anyhow::Result<()> {
        let mut guard = self.entries.lock().await;
        for key in keys {
            guard.remove(*key);
        }
        Ok(())
    }
}
