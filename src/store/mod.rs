//! Inspection persistence.
//!
//! This module handles:
//! - The `InspectionStore` trait the service and startup sequence depend on
//! - PostgreSQL backend over a shared `sqlx` pool
//! - In-memory backend for tests and local demos

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StoreError;
use crate::inspection::{Inspection, InspectionStatus, NewInspection};

pub use memory::{MemoryConfig, MemoryStore};
pub use postgres::PgInspectionStore;

/// Backend holding the `inspections` table.
///
/// Each method is a single store round trip.
#[async_trait]
pub trait InspectionStore: Send + Sync {
    /// Trivial liveness query.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Create the table if absent. Never touches existing rows.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// All inspections, newest id first.
    async fn list(&self) -> Result<Vec<Inspection>, StoreError>;

    /// Insert a `Draft` inspection and return the persisted row.
    async fn insert(&self, new: &NewInspection) -> Result<Inspection, StoreError>;

    /// Set the status and refresh `updated_at`. `None` if no row has `id`.
    async fn update_status(
        &self,
        id: i32,
        status: InspectionStatus,
    ) -> Result<Option<Inspection>, StoreError>;

    /// Insert rows with explicit statuses, returning how many were written.
    async fn seed(&self, rows: &[(NewInspection, InspectionStatus)]) -> Result<u64, StoreError>;

    /// Release backend resources.
    async fn close(&self) {}
}

/// Sample rows written by the `seed` command.
pub fn sample_inspections() -> Vec<(NewInspection, InspectionStatus)> {
    let sample = |site: &str, (y, m, d): (i32, u32, u32), findings: &str| NewInspection {
        site: site.to_string(),
        inspection_date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
        findings: findings.to_string(),
    };

    vec![
        (
            sample("Site Alpha", (2025, 8, 1), "Fire extinguisher expired"),
            InspectionStatus::UnderReview,
        ),
        (
            sample("Site Beta", (2025, 8, 5), "Emergency exits clear"),
            InspectionStatus::Approved,
        ),
        (
            sample("Warehouse 3", (2025, 8, 7), "Damaged ladder"),
            InspectionStatus::Draft,
        ),
    ]
}
