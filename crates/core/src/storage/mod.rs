pub mod file;
pub mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

pub const TOKEN_KEY: &str = "authToken";
pub const USER_KEY: &str = "user";

/// Opaque async key/value persistence for the session credential.
///
/// Nothing is transactional across keys: a crash between two removals can leave
/// a user record without a token, which readers must treat as logged out.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    async fn remove_many(&self, keys: &[&str]) -> anyhow::Result<()>;
}
