//! # API Shared
//!
//! Shared response types and services for the PMS APIs.
//!
//! Contains:
//! - JSON response bodies (`HealthRes`, `MessageRes`, `ErrorRes`)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and the top-level `pms-run` binary.

pub mod health;
pub mod types;

pub use health::HealthService;
pub use types::*;
