//! Unified error types for the inspection tracker.

use thiserror::Error;

/// Unified error type for the service binary and startup sequence.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Startup sequence error.
    #[error("startup error: {0}")]
    Startup(#[from] StartupError),

    /// Store error outside of a request.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised while bringing the service up.
#[derive(Error, Debug)]
pub enum StartupError {
    /// The store never answered the liveness probe within the retry budget.
    #[error("database not reachable after {attempts} attempts: {reason}")]
    DependencyUnreachable {
        /// Number of probes performed.
        attempts: u32,
        /// Failure reason of the last probe.
        reason: String,
    },

    /// Schema creation failed.
    #[error("schema initialization failed: {0}")]
    Schema(#[source] StoreError),
}

/// Caller-supplied input that breaks a business rule.
///
/// The `Display` text is returned to the client verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One of `site`, `inspection_date`, `findings` is absent or blank.
    #[error("Missing fields")]
    MissingFields,

    /// `inspection_date` is not a `YYYY-MM-DD` calendar date.
    #[error("Invalid inspection_date")]
    InvalidDate,

    /// `site` is longer than the column allows.
    #[error("Site too long")]
    SiteTooLong,

    /// Status is not one of the allowed values.
    #[error("Invalid status")]
    InvalidStatus,

    /// A text field contains a NUL character, which text columns cannot hold.
    #[error("Invalid characters")]
    InvalidCharacters,
}

/// Inspection service errors.
#[derive(Error, Debug)]
pub enum InspectionError {
    /// Input rejected before reaching the store.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Referenced inspection does not exist.
    #[error("inspection {id} not found")]
    NotFound {
        /// Requested inspection id.
        id: i32,
    },

    /// Unexpected store failure.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

/// Data store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database driver or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Row holds a value outside the model (e.g. an unknown status).
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Failure injected by the in-memory store. The Postgres store reports
    /// through `Database` instead.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
