//! In-memory inspection store for unit testing and local demos.
//!
//! Behaves like the Postgres backend (monotonic ids, newest-first listing,
//! strictly increasing `updated_at`) without a database. Failure modes are
//! configurable through [`MemoryConfig`].

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::error::StoreError;
use crate::inspection::{Inspection, InspectionStatus, NewInspection};

use super::InspectionStore;

/// Configuration for in-memory store behavior.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfig {
    /// Number of initial `ping` calls that fail before the store comes up.
    /// `u32::MAX` keeps it down forever.
    pub unreachable_pings: u32,
    /// Whether every query (list/insert/update/seed) fails.
    pub fail_queries: bool,
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Inspection>,
    last_id: i32,
}

/// In-memory inspection store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    config: MemoryConfig,
    table: Arc<Mutex<Table>>,
    pings: Arc<AtomicU32>,
}

impl MemoryStore {
    /// Create an empty, healthy store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with custom failure behavior.
    pub fn with_config(config: MemoryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Number of `ping` calls made so far.
    pub fn ping_count(&self) -> u32 {
        self.pings.load(Ordering::SeqCst)
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.table.lock().map(|t| t.rows.len()).unwrap_or(0)
    }

    /// Whether the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self) -> Result<MutexGuard<'_, Table>, StoreError> {
        if self.config.fail_queries {
            return Err(StoreError::Unavailable("mock query failure".to_string()));
        }
        self.table
            .lock()
            .map_err(|_| StoreError::Unavailable("table lock poisoned".to_string()))
    }

    fn push(table: &mut Table, new: &NewInspection, status: InspectionStatus) -> Inspection {
        table.last_id += 1;
        let now = Utc::now();
        let inspection = Inspection {
            id: table.last_id,
            site: new.site.clone(),
            inspection_date: new.inspection_date,
            findings: new.findings.clone(),
            status,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(inspection.clone());
        inspection
    }
}

#[async_trait]
impl InspectionStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let attempt = self.pings.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.config.unreachable_pings {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.table().map(|_| ())
    }

    async fn list(&self) -> Result<Vec<Inspection>, StoreError> {
        let table = self.table()?;
        Ok(table.rows.iter().rev().cloned().collect())
    }

    async fn insert(&self, new: &NewInspection) -> Result<Inspection, StoreError> {
        let mut table = self.table()?;
        Ok(Self::push(&mut table, new, InspectionStatus::Draft))
    }

    async fn update_status(
        &self,
        id: i32,
        status: InspectionStatus,
    ) -> Result<Option<Inspection>, StoreError> {
        let mut table = self.table()?;
        let Some(row) = table.rows.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };

        row.status = status;
        row.updated_at = Utc::now().max(row.updated_at + Duration::microseconds(1));
        Ok(Some(row.clone()))
    }

    async fn seed(&self, rows: &[(NewInspection, InspectionStatus)]) -> Result<u64, StoreError> {
        let mut table = self.table()?;
        for (new, status) in rows {
            Self::push(&mut table, new, *status);
        }
        Ok(rows.len() as u64)
    }
}
