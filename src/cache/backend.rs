//! Cache transport abstraction

use std::time::Duration;

use crate::error::Result;

/// Raw key/value transport underneath [`Cache`](super::Cache)
///
/// Keys arrive fully namespaced and values already encoded. Read-side
/// failures are reported as `CacheReadFailure`, write-side ones as
/// `CacheWriteFailure`. A missing key is `Ok(None)`, not an error.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`. A zero `ttl` means no expiry.
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    fn delete(&self, key: &str) -> Result<()>;

    fn exists(&self, key: &str) -> Result<bool>;

    /// Connectivity check
    fn ping(&self) -> Result<()>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}
