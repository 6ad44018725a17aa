//! Configuration for carvault
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for a carvault instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── cars.json        (the collection)
    ///     ├── cars.json.bak    (previous version)
    ///     └── cars.json.tmp    (only while a save is in flight)
    pub data_dir: PathBuf,

    /// File name of the vehicle collection, relative to `data_dir`
    pub collection_file: String,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// HTTP listen address
    pub listen_addr: String,

    // -------------------------------------------------------------------------
    // Cache Configuration
    // -------------------------------------------------------------------------
    pub cache: CacheConfig,
}

/// Which cache transport the service runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// External Redis server (falls back to no cache if unreachable)
    Redis,

    /// Process-local map, mostly for tests and single-node demos
    Memory,

    /// No cache at all
    Off,
}

/// Cache connection and policy settings
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub mode: CacheMode,

    /// Redis address (host:port)
    pub redis_addr: String,

    pub redis_password: Option<String>,

    /// Redis logical database index
    pub redis_db: i64,

    /// Namespace prepended to every key (`{prefix}:{key}`)
    pub key_prefix: String,

    /// Time-to-live of record entries
    pub ttl: Duration,

    /// Max pooled connections
    pub pool_size: u32,

    /// Idle connections kept warm
    pub min_idle: u32,

    /// Bound on establishing a connection (and the startup ping)
    pub connect_timeout: Duration,

    /// Read/write timeout applied to every pooled connection
    pub io_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            mode: CacheMode::Redis,
            redis_addr: "127.0.0.1:6379".to_string(),
            redis_password: None,
            redis_db: 0,
            key_prefix: "carvault".to_string(),
            ttl: Duration::from_secs(24 * 60 * 60),
            pool_size: 10,
            min_idle: 2,
            connect_timeout: Duration::from_secs(5),
            io_timeout: Duration::from_secs(3),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            collection_file: "cars.json".to_string(),
            listen_addr: "127.0.0.1:8080".to_string(),
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the collection file name
    pub fn collection_file(mut self, name: impl Into<String>) -> Self {
        self.config.collection_file = name.into();
        self
    }

    /// Set the HTTP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Select the cache transport
    pub fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.config.cache.mode = mode;
        self
    }

    /// Set the Redis address (host:port)
    pub fn redis_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.cache.redis_addr = addr.into();
        self
    }

    pub fn redis_password(mut self, password: Option<String>) -> Self {
        self.config.cache.redis_password = password.filter(|p| !p.is_empty());
        self
    }

    pub fn redis_db(mut self, db: i64) -> Self {
        self.config.cache.redis_db = db;
        self
    }

    /// Set the cache key namespace
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.cache.key_prefix = prefix.into();
        self
    }

    /// Set the TTL of cached records
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache.ttl = ttl;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
