//! # carvault
//!
//! A small vehicle record service with:
//! - Crash-safe JSON file storage (temp file + atomic rename, `.bak` recovery)
//! - Cache-aside point lookups through an optional Redis cache
//! - Graceful degradation: the cache is never required for correctness
//! - An axum HTTP boundary
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP (axum)                             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ spawn_blocking
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     CarService                               │
//! │          (ids, timestamps, cache-aside policy)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │    Cache    │          │CarRepository │
//!   │ (optional)  │          │(whole-collec.│
//!   └─────────────┘          │  load/save)  │
//!                            └──────┬───────┘
//!                                   │
//!                                   ▼
//!                            ┌─────────────┐
//!                            │  JsonStore  │
//!                            │  (RwLock)   │
//!                            └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod model;
pub mod store;
pub mod cache;
pub mod repository;
pub mod service;
pub mod http;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, VaultError};
pub use config::Config;
pub use model::{Car, CarPatch, NewCar};
pub use service::CarService;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of carvault
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
