//! Redis cache backend
//!
//! Synchronous `redis` connections pooled through `r2d2`.

use std::time::Duration;

use r2d2::{CustomizeConnection, Pool, PooledConnection};
use redis::{Client, Connection, RedisError, RedisResult};

use super::CacheBackend;
use crate::config::CacheConfig;
use crate::error::{Result, VaultError};

/// Applies read/write timeouts to every connection handed out by the pool
#[derive(Debug)]
struct IoTimeouts {
    timeout: Duration,
}

impl CustomizeConnection<Connection, RedisError> for IoTimeouts {
    fn on_acquire(&self, conn: &mut Connection) -> RedisResult<()> {
        conn.set_read_timeout(Some(self.timeout))?;
        conn.set_write_timeout(Some(self.timeout))
    }
}

/// [`CacheBackend`] talking to an external Redis server
pub struct RedisBackend {
    pool: Pool<Client>,

    /// host:port, for logs
    addr: String,
}

impl RedisBackend {
    /// Build the pool and wait (up to `connect_timeout`) for its idle
    /// connections to come up
    pub fn connect(config: &CacheConfig) -> Result<Self> {
        let url = connection_url(config)?;
        let client = Client::open(url.as_str())
            .map_err(|e| VaultError::Config(format!("redis address {}: {}", config.redis_addr, e)))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .min_idle(Some(config.min_idle))
            .connection_timeout(config.connect_timeout)
            .connection_customizer(Box::new(IoTimeouts {
                timeout: config.io_timeout,
            }))
            .build(client)
            .map_err(|e| {
                VaultError::CacheReadFailure(format!("connect {}: {}", config.redis_addr, e))
            })?;

        tracing::debug!(
            "Redis pool ready: {} (db {}, max {} connections)",
            config.redis_addr,
            config.redis_db,
            config.pool_size
        );

        Ok(Self {
            pool,
            addr: config.redis_addr.clone(),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn conn(&self) -> std::result::Result<PooledConnection<Client>, String> {
        self.pool
            .get()
            .map_err(|e| format!("no connection to {}: {}", self.addr, e))
    }

    fn read<T>(&self, op: impl FnOnce(&mut Connection) -> RedisResult<T>) -> Result<T> {
        let mut conn = self.conn().map_err(VaultError::CacheReadFailure)?;
        op(&mut *conn).map_err(|e| VaultError::CacheReadFailure(e.to_string()))
    }

    fn write<T>(&self, op: impl FnOnce(&mut Connection) -> RedisResult<T>) -> Result<T> {
        let mut conn = self.conn().map_err(VaultError::CacheWriteFailure)?;
        op(&mut *conn).map_err(|e| VaultError::CacheWriteFailure(e.to_string()))
    }
}

impl CacheBackend for RedisBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.read(|conn| redis::cmd("GET").arg(key).query::<Option<String>>(conn))
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.write(|conn| {
            let mut cmd = redis::cmd("SET");
            cmd.arg(key).arg(value);
            if !ttl.is_zero() {
                // PX keeps sub-second TTLs; anything shorter than 1ms rounds up
                let millis = ttl.as_millis().clamp(1, u64::MAX as u128) as u64;
                cmd.arg("PX").arg(millis);
            }
            cmd.query::<()>(conn)
        })
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.write(|conn| redis::cmd("DEL").arg(key).query::<i64>(conn))
            .map(|_| ())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        self.read(|conn| redis::cmd("EXISTS").arg(key).query::<bool>(conn))
    }

    fn ping(&self) -> Result<()> {
        let pong = self.read(|conn| redis::cmd("PING").query::<String>(conn))?;
        tracing::debug!("Redis ping: {}", pong);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

/// `redis://[:password@]host:port/db`
fn connection_url(config: &CacheConfig) -> Result<String> {
    let (host, port) = config
        .redis_addr
        .rsplit_once(':')
        .ok_or_else(|| VaultError::Config(format!("redis address {} has no port", config.redis_addr)))?;

    let port: u16 = port
        .parse()
        .map_err(|_| VaultError::Config(format!("invalid redis port in {}", config.redis_addr)))?;

    if host.is_empty() {
        return Err(VaultError::Config(format!("redis address {} has no host", config.redis_addr)));
    }

    let auth = match &config.redis_password {
        Some(password) => format!(":{}@", urlencoding::encode(password)),
        None => String::new(),
    };

    Ok(format!("redis://{}{}:{}/{}", auth, host, port, config.redis_db))
}
