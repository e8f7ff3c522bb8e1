//! Inspection operations validated against business rules.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::error::InspectionError;
use crate::metrics;
use crate::store::InspectionStore;

use super::types::{CreateInspectionRequest, Inspection};
use super::validation::{parse_status, validate_create};

/// List, create and transition inspections.
///
/// Cheap to clone; all clones share one store.
#[derive(Clone)]
pub struct InspectionService {
    store: Arc<dyn InspectionStore>,
}

impl std::fmt::Debug for InspectionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InspectionService").finish_non_exhaustive()
    }
}

impl InspectionService {
    /// Create a service over the given store.
    pub fn new(store: Arc<dyn InspectionStore>) -> Self {
        Self { store }
    }

    /// Shared store handle.
    pub fn store(&self) -> &Arc<dyn InspectionStore> {
        &self.store
    }

    /// All inspections, most recently created first.
    pub async fn list(&self) -> Result<Vec<Inspection>, InspectionError> {
        Ok(self.store.list().await?)
    }

    /// Validate and insert a new `Draft` inspection.
    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        request: &CreateInspectionRequest,
    ) -> Result<Inspection, InspectionError> {
        let new = validate_create(request).inspect_err(|e| debug!(error = %e, "create rejected"))?;

        let inspection = self.store.insert(&new).await?;
        metrics::inc_inspections_created();
        info!(id = inspection.id, site = %inspection.site, "Inspection created");

        Ok(inspection)
    }

    /// Move an inspection to `status`.
    ///
    /// Any status may follow any other, including itself.
    #[instrument(skip(self))]
    pub async fn transition_status(
        &self,
        id: i32,
        status: Option<&str>,
    ) -> Result<Inspection, InspectionError> {
        let status = parse_status(status).inspect_err(|e| debug!(error = %e, "transition rejected"))?;

        let inspection = self
            .store
            .update_status(id, status)
            .await?
            .ok_or(InspectionError::NotFound { id })?;

        metrics::inc_status_transitions(status);
        info!(id, status = %status, "Inspection status changed");

        Ok(inspection)
    }
}
