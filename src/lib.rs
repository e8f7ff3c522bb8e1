//! Inspection tracking service.
//!
//! A REST API over a single PostgreSQL table of site inspections. Each
//! inspection moves between three review states:
//!
//! ```text
//! Draft | UnderReview | Approved
//! ```
//!
//! Any state may follow any other; there is no enforced workflow.
//!
//! # Startup
//!
//! The service waits for the database (bounded retries at a fixed interval),
//! creates the table if absent, and only then starts listening.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`inspection`]: Record types, validation and the inspection service
//! - [`store`]: Postgres and in-memory persistence
//! - [`startup`]: Database wait and schema initialization
//! - [`api`]: HTTP API for inspections, health and metrics
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod inspection;
pub mod metrics;
pub mod startup;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
