//! Cache Module
//!
//! Best-effort acceleration of point lookups in front of the durable store.
//!
//! ## Responsibilities
//! - Namespace keys per deployment (`{prefix}:{key}`)
//! - JSON-encode values so any client can read them
//! - Cache-aside reads: fall back to the authoritative source on miss and
//!   repopulate in the background
//! - Never be required for correctness; the store stays authoritative
//!
//! ## Layers
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Cache        (namespacing, JSON, TTL,   │
//! │               retry, fallback)          │
//! └────────────────────┬────────────────────┘
//!                      │ Arc<dyn CacheBackend>
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//!   ┌─────────────┐         ┌─────────────┐
//!   │RedisBackend │         │MemoryBackend│
//!   │ (r2d2 pool) │         │  (HashMap)  │
//!   └─────────────┘         └─────────────┘
//! ```

mod backend;
mod layer;
mod memory;
mod redis_backend;

pub use backend::CacheBackend;
pub use layer::Cache;
pub use memory::MemoryBackend;
pub use redis_backend::RedisBackend;
