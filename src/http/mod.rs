//! HTTP Module
//!
//! Thin axum boundary over [`CarService`](crate::service::CarService).
//!
//! ## Routes
//!
//! - `GET    /api/cars`               — all records
//! - `GET    /api/cars/:id`           — one record (404 if missing)
//! - `POST   /api/cars`               — create, 201 with the stored record
//! - `PUT    /api/cars/:id`           — partial update
//! - `DELETE /api/cars/:id`           — delete, `{"message": ...}`
//! - `GET    /api/cars/brand/:brand`  — records of one brand
//! - `GET    /health`                 — `{"ok": true, "cache": bool}`
//!
//! ## Architecture
//! - Handlers run on the tokio runtime
//! - Service calls are blocking (file I/O, pooled Redis) and go through
//!   `spawn_blocking`
//! - Errors render as `{"error": "..."}` with a status from
//!   [`VaultError::status_code`](crate::error::VaultError::status_code)

mod handlers;
mod server;

pub use handlers::{router, ApiError};
pub use server::serve;
