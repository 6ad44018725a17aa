//! Store Module
//!
//! Durable document storage on the local filesystem.
//!
//! ## Responsibilities
//! - Persist one serializable document per logical file name
//! - Atomic replace: readers never see a half-written file
//! - Keep the previous version as a backup and fall back to it on corruption
//! - Treat a missing file as an empty document
//!
//! ## File Layout
//! ```text
//! {root}/
//!   ├── {name}        current document (pretty JSON)
//!   ├── {name}.bak    previous document, refreshed before every save
//!   └── {name}.tmp    new document, only while a save is in flight
//! ```
//!
//! ## Save Sequence
//! ```text
//!  serialize ──▶ copy {name} → {name}.bak ──▶ write + fsync {name}.tmp
//!                  (best-effort)                      │
//!                                                     ▼
//!                                      rename {name}.tmp → {name}
//! ```

mod json;

pub use json::JsonStore;
