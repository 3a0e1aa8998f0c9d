use crate::storage::CredentialStore;
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const APP_DIR: &str = "ebikri";
const FILE_NAME: &str = "credentials.json";

/// Credential store backed by one JSON object on disk.
///
/// Writes go to a sibling temp file and are renamed into place, so a reader never
/// sees a half-written file. The mutex only serializes writers inside this process.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_raw(&self) -> anyhow::Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("failed to read credential file {}", self.path.display())),
        }
    }

    async fn load(&self) -> anyhow::Result<BTreeMap<String, String>> {
        match self.read_raw().await? {
            Some(text) if !text.trim().is_empty() => serde_json::from_str(&text).with_context(|| {
                format!("credential file {} is not a JSON object", self.path.display())
            }),
            _ => Ok(BTreeMap::new()),
        }
    }

    /// Entries to start a write from, plus whether the file must be rewritten even if
    /// nothing changes. An undecodable file is discarded so that login and logout can
    /// always recover it.
    async fn load_for_write(&self) -> anyhow::Result<(BTreeMap<String, String>, bool)> {
        let Some(text) = self.read_raw().await? else {
            return Ok((BTreeMap::new(), false));
        };
        if text.trim().is_empty() {
            return Ok((BTreeMap::new(), false));
        }

        match serde_json::from_str(&text) {
            Ok(entries) => Ok((entries, false)),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "credential file is corrupt; starting from an empty store"
                );
                Ok((BTreeMap::new(), true))
            }
        }
    }

    async fn save(&self, entries: &BTreeMap<String, String>) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }

        let body = serde_json::to_vec_pretty(entries).context("serialize credentials failed")?;
        let tmp = self.path.with_extension("json.tmp");

        // A stale temp file may carry wider permissions than we would create it with.
        match tokio::fs::remove_file(&tmp).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("failed to remove {}", tmp.display()))
            }
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&tmp)
            .await
            .with_context(|| format!("failed to create {}", tmp.display()))?;
        file.write_all(&body)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        file.sync_all()
            .await
            .with_context(|| format!("failed to flush {}", tmp.display()))?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to move credentials into {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let (mut entries, _) = self.load_for_write().await?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries).await
    }

    async fn remove_many(&self, keys: &[&str]) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let (mut entries, corrupt) = self.load_for_write().await?;
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() == before && !corrupt {
            return Ok(());
        }
        self.save(&entries).await
    }
}

pub fn default_credentials_path() -> PathBuf {
    if let Some(dir) = dirs::data_dir() {
        dir.join(APP_DIR).join(FILE_NAME)
    } else {
        PathBuf::from(format!(".{APP_DIR}")).join(FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nope.json"));
        assert_eq!(store.get("authToken").await.unwrap(), None);
    }

    #[tokio::test]
    async fn values_survive_a_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");

        let store = FileCredentialStore::new(&path);
        store.set("authToken", "abc").await.unwrap();
        store.set("user", r#"{"id":"1"}"#).await.unwrap();

        let reopened = FileCredentialStore::new(&path);
        assert_eq!(reopened.path(), path.as_path());
        assert_eq!(reopened.get("authToken").await.unwrap().as_deref(), Some("abc"));
        assert_eq!(reopened.get("user").await.unwrap().as_deref(), Some(r#"{"id":"1"}"#));
    }

    #[tokio::test]
    async fn remove_many_clears_both_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        store.set("authToken", "abc").await.unwrap();
        store.set("user", "{}").await.unwrap();
        store.set("theme", "dark").await.unwrap();

        store.remove_many(&["authToken", "user"]).await.unwrap();

        assert_eq!(store.get("authToken").await.unwrap(), None);
        assert_eq!(store.get("user").await.unwrap(), None);
        assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(store.get("authToken").await.is_err());
    }

    #[tokio::test]
    async fn logout_recovers_a_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{\"authToken\": ").unwrap();

        let store = FileCredentialStore::new(&path);
        store.remove_many(&["authToken", "user"]).await.unwrap();

        assert_eq!(store.get("authToken").await.unwrap(), None);
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "{}");
    }

    #[tokio::test]
    async fn login_overwrites_a_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileCredentialStore::new(&path);
        store.set("authToken", "abc").await.unwrap();
        assert_eq!(store.get("authToken").await.unwrap().as_deref(), Some("abc"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn credential_file_is_private_to_the_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        // Leftover temp file from a crashed write, world readable.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, "{}").unwrap();
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileCredentialStore::new(&path);
        store.set("authToken", "abc").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!tmp.exists());
    }
}
