//! PostgreSQL inspection store.
//!
//! All SQL is runtime-checked (`sqlx::query_as`, not `query_as!`) so the
//! crate builds without a live database.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::StoreError;
use crate::inspection::{Inspection, InspectionStatus, NewInspection};

use super::InspectionStore;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS inspections (
    id SERIAL PRIMARY KEY,
    site VARCHAR(120) NOT NULL,
    inspection_date DATE NOT NULL,
    findings TEXT NOT NULL,
    status VARCHAR(32) NOT NULL DEFAULT 'Draft'
        CHECK (status IN ('Draft', 'UnderReview', 'Approved')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const LIST: &str = r#"
SELECT id, site, inspection_date, findings, status, created_at, updated_at
FROM inspections
ORDER BY id DESC
"#;

const INSERT: &str = r#"
INSERT INTO inspections (site, inspection_date, findings, status)
VALUES ($1, $2, $3, $4)
RETURNING id, site, inspection_date, findings, status, created_at, updated_at
"#;

// updated_at must move forward even when NOW() has not.
const UPDATE_STATUS: &str = r#"
UPDATE inspections
SET status = $1,
    updated_at = GREATEST(NOW(), updated_at + INTERVAL '1 microsecond')
WHERE id = $2
RETURNING id, site, inspection_date, findings, status, created_at, updated_at
"#;

/// Raw `inspections` row.
#[derive(Debug, FromRow)]
struct InspectionRow {
    id: i32,
    site: String,
    inspection_date: NaiveDate,
    findings: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InspectionRow> for Inspection {
    type Error = StoreError;

    fn try_from(row: InspectionRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<InspectionStatus>().map_err(|_| {
            StoreError::Corrupt(format!("inspection {} has status {:?}", row.id, row.status))
        })?;

        Ok(Inspection {
            id: row.id,
            site: row.site,
            inspection_date: row.inspection_date,
            findings: row.findings,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Postgres-backed inspection store.
#[derive(Debug, Clone)]
pub struct PgInspectionStore {
    pool: PgPool,
}

impl PgInspectionStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a pool from configuration without opening a connection.
    ///
    /// Connections are established on first use, so an unreachable database
    /// surfaces through [`InspectionStore::ping`] rather than here.
    pub fn connect_lazy(config: &Config) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect_lazy(&config.database_url)?;

        info!(
            max_connections = config.db_max_connections,
            url = %config.redacted_database_url(),
            "Database pool created"
        );

        Ok(Self::new(pool))
    }

    /// Underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert_row(
        &self,
        new: &NewInspection,
        status: InspectionStatus,
    ) -> Result<Inspection, StoreError> {
        let row = sqlx::query_as::<_, InspectionRow>(INSERT)
            .bind(&new.site)
            .bind(new.inspection_date)
            .bind(&new.findings)
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }
}

#[async_trait]
impl InspectionStore for PgInspectionStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        debug!("inspections table ensured");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Inspection>, StoreError> {
        let rows = sqlx::query_as::<_, InspectionRow>(LIST)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Inspection::try_from).collect()
    }

    #[instrument(skip(self, new), fields(site = %new.site))]
    async fn insert(&self, new: &NewInspection) -> Result<Inspection, StoreError> {
        self.insert_row(new, InspectionStatus::Draft).await
    }

    #[instrument(skip(self))]
    async fn update_status(
        &self,
        id: i32,
        status: InspectionStatus,
    ) -> Result<Option<Inspection>, StoreError> {
        let row = sqlx::query_as::<_, InspectionRow>(UPDATE_STATUS)
            .bind(status.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Inspection::try_from).transpose()
    }

    async fn seed(&self, rows: &[(NewInspection, InspectionStatus)]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        for (new, status) in rows {
            sqlx::query(
                "INSERT INTO inspections (site, inspection_date, findings, status) VALUES ($1, $2, $3, $4)",
            )
            .bind(&new.site)
            .bind(new.inspection_date)
            .bind(&new.findings)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(rows.len() as u64)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}
