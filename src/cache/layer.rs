//! Namespaced cache-aside wrapper
//!
//! Everything that touches the cache goes through [`Cache`]. It owns the key
//! prefix, the JSON encoding, the retry loop and the fallback path.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{CacheBackend, RedisBackend};
use crate::config::CacheConfig;
use crate::error::{Result, VaultError};

/// Cache-aside front for one deployment's key namespace
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,

    /// Every key is stored as `{prefix}:{key}`
    prefix: String,

    /// Bound on a background population write
    populate_timeout: Duration,

    /// Count of foreground writes (`set`/`delete`), shared by every clone.
    /// Held across the backend call, so a background fill that checks it
    /// is ordered against them: a fill started before the latest write is
    /// dropped instead of landing on top of it.
    writes: Arc<Mutex<u64>>,
}

impl Cache {
    pub const DEFAULT_POPULATE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Wrap an existing backend
    pub fn new(backend: Arc<dyn CacheBackend>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
            populate_timeout: Self::DEFAULT_POPULATE_TIMEOUT,
            writes: Arc::new(Mutex::new(0)),
        }
    }

    /// Connect to Redis and verify it answers a ping
    ///
    /// Callers treat an error here as "run without a cache".
    pub fn connect(config: &CacheConfig) -> Result<Self> {
        let backend = RedisBackend::connect(config)?;
        backend.ping()?;

        tracing::info!("Connected to Redis at {}", backend.addr());
        Ok(Self::new(Arc::new(backend), config.key_prefix.clone()))
    }

    /// Override the bound on background population writes
    pub fn with_populate_timeout(mut self, timeout: Duration) -> Self {
        self.populate_timeout = timeout;
        self
    }

    /// Namespaced form of `key`
    pub fn key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn ping(&self) -> Result<()> {
        self.backend.ping()
    }

    // =========================================================================
    // Basic Operations
    // =========================================================================

    /// Encode `value` and store it under `key` with the given TTL
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let payload = serde_json::to_string(value)?;
        let full_key = self.key(key);

        let mut writes = self.writes.lock();
        *writes += 1;
        self.backend.set(&full_key, &payload, ttl).map_err(|e| {
            tracing::error!("Cache set {} failed: {}", full_key, e);
            as_write_failure(e)
        })?;

        tracing::debug!("Cache set {} (ttl {:?})", full_key, ttl);
        Ok(())
    }

    /// Fetch and decode `key`
    ///
    /// Returns `CacheMiss` if absent, `CacheReadFailure` on transport or
    /// decode errors.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let full_key = self.key(key);

        let payload = match self.backend.get(&full_key) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                tracing::trace!("Cache miss {}", full_key);
                return Err(VaultError::CacheMiss(full_key));
            }
            Err(e) => {
                tracing::error!("Cache get {} failed: {}", full_key, e);
                return Err(as_read_failure(e));
            }
        };

        serde_json::from_str(&payload).map_err(|e| {
            tracing::error!("Cache entry {} does not decode: {}", full_key, e);
            VaultError::CacheReadFailure(format!("decode {}: {}", full_key, e))
        })
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        let full_key = self.key(key);

        let mut writes = self.writes.lock();
        *writes += 1;
        self.backend.delete(&full_key).map_err(|e| {
            tracing::error!("Cache delete {} failed: {}", full_key, e);
            as_write_failure(e)
        })?;

        tracing::debug!("Cache delete {}", full_key);
        Ok(())
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        let full_key = self.key(key);
        self.backend.exists(&full_key).map_err(|e| {
            tracing::error!("Cache exists {} failed: {}", full_key, e);
            as_read_failure(e)
        })
    }

    // =========================================================================
    // Policies
    // =========================================================================

    /// `set`, retried up to `retries` more times with a fixed `delay`
    ///
    /// Returns the last error if every attempt fails.
    pub fn set_with_retry<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        retries: u32,
        delay: Duration,
    ) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.set(key, value, ttl) {
                Ok(()) => return Ok(()),
                Err(e) if attempt < retries => {
                    attempt += 1;
                    tracing::warn!(
                        "Cache set {} failed, retry {}/{} in {:?}: {}",
                        key,
                        attempt,
                        retries,
                        delay,
                        e
                    );
                    thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Cache-aside read
    ///
    /// 1. Try the cache; a hit returns immediately
    /// 2. On miss or any cache error, call `fallback` (the authoritative
    ///    source) on the caller's thread
    /// 3. If `fallback` fails, return `FallbackFailure` and leave the cache
    ///    alone
    /// 4. Otherwise hand a copy to a detached writer and return the value
    ///
    /// The background write has no completion signal. Its failures are
    /// logged, never returned, so callers must not assume the entry is
    /// present right after this returns. It is skipped if any `set` or
    /// `delete` ran after the fallback started, since the value it carries
    /// may already be stale.
    pub fn get_with_fallback<T, F>(&self, key: &str, fallback: F, ttl: Duration) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        match self.get::<T>(key) {
            Ok(value) => {
                tracing::trace!("Cache hit {}", self.key(key));
                return Ok(value);
            }
            Err(VaultError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Cache unusable for {}, using fallback: {}", key, e),
        }

        let writes_seen = *self.writes.lock();

        let value = fallback().map_err(|e| {
            tracing::error!("Fallback for {} failed: {}", key, e);
            VaultError::FallbackFailure(Box::new(e))
        })?;

        match serde_json::to_string(&value) {
            Ok(payload) => self.spawn_populate(self.key(key), payload, ttl, writes_seen),
            Err(e) => tracing::warn!("Skipping cache population of {}: {}", key, e),
        }

        Ok(value)
    }

    /// Write `payload` from a detached thread, giving up after
    /// `populate_timeout`. Nothing is written if the write count has moved
    /// past `writes_seen`.
    fn spawn_populate(&self, full_key: String, payload: String, ttl: Duration, writes_seen: u64) {
        let backend = Arc::clone(&self.backend);
        let writes = Arc::clone(&self.writes);
        let timeout = self.populate_timeout;

        let spawned = thread::Builder::new()
            .name("cache-populate".to_string())
            .spawn(move || {
                let (tx, rx) = channel::bounded(1);
                let writer_key = full_key.clone();

                // The writer may outlive the timeout; it is bounded by the
                // backend's own I/O timeouts.
                let writer = thread::Builder::new()
                    .name("cache-populate-io".to_string())
                    .spawn(move || {
                        let writes = writes.lock();
                        let outcome = if *writes == writes_seen {
                            backend.set(&writer_key, &payload, ttl).map(|()| true)
                        } else {
                            Ok(false)
                        };
                        drop(writes);
                        let _ = tx.send(outcome);
                    });

                if let Err(e) = writer {
                    tracing::error!("Could not start cache writer for {}: {}", full_key, e);
                    return;
                }

                match rx.recv_timeout(timeout) {
                    Ok(Ok(true)) => tracing::debug!("Background cache population of {} done", full_key),
                    Ok(Ok(false)) => tracing::debug!(
                        "Background cache population of {} dropped, superseded by a newer write",
                        full_key
                    ),
                    Ok(Err(e)) => {
                        tracing::error!("Background cache population of {} failed: {}", full_key, e)
                    }
                    Err(RecvTimeoutError::Timeout) => tracing::error!(
                        "Background cache population of {} timed out after {:?}",
                        full_key,
                        timeout
                    ),
                    Err(RecvTimeoutError::Disconnected) => tracing::error!(
                        "Background cache writer for {} exited without a result",
                        full_key
                    ),
                }
            });

        if let Err(e) = spawned {
            tracing::error!("Could not spawn cache population thread: {}", e);
        }
    }
}

fn as_read_failure(err: VaultError) -> VaultError {
    match err {
        VaultError::CacheReadFailure(_) => err,
        other => VaultError::CacheReadFailure(other.to_string()),
    }
}

fn as_write_failure(err: VaultError) -> VaultError {
    match err {
        VaultError::CacheWriteFailure(_) => err,
        other => VaultError::CacheWriteFailure(other.to_string()),
    }
}
