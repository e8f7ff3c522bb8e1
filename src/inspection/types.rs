//! Inspection record types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Review state of an inspection.
///
/// Every state is reachable from every other state.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Default,
)]
pub enum InspectionStatus {
    /// Newly recorded, not yet submitted.
    #[default]
    Draft,
    /// Submitted for review.
    UnderReview,
    /// Review complete.
    Approved,
}

impl InspectionStatus {
    /// Storage and wire spelling.
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }
}

/// A persisted inspection record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inspection {
    /// Store-assigned identifier.
    pub id: i32,
    /// Inspected site.
    pub site: String,
    /// Day the inspection took place.
    pub inspection_date: NaiveDate,
    /// Inspector findings.
    pub findings: String,
    /// Current review state.
    pub status: InspectionStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last status change (or creation) time.
    pub updated_at: DateTime<Utc>,
}

/// Validated input for inserting a new inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInspection {
    /// Inspected site, trimmed.
    pub site: String,
    /// Day the inspection took place.
    pub inspection_date: NaiveDate,
    /// Inspector findings, trimmed.
    pub findings: String,
}

/// Body of `POST /api/inspections`.
///
/// Fields are optional so that absence is reported as a validation error
/// rather than a deserialization failure. Any `status` sent by the caller
/// is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateInspectionRequest {
    /// Inspected site.
    #[serde(default)]
    pub site: Option<String>,
    /// Inspection date as `YYYY-MM-DD`.
    #[serde(default)]
    pub inspection_date: Option<String>,
    /// Inspector findings.
    #[serde(default)]
    pub findings: Option<String>,
}

/// Body of `PUT /api/inspections/:id/status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdateRequest {
    /// Requested status name.
    #[serde(default)]
    pub status: Option<String>,
}
