//! Business-rule checks applied before any store access.

use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::ValidationError;

use super::types::{CreateInspectionRequest, InspectionStatus, NewInspection};

/// Maximum length of `site`, matching the column width.
pub const SITE_MAX_CHARS: usize = 120;

/// Wire format of `inspection_date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validate a create request into an insertable record.
///
/// Presence of all three fields is checked before their contents, so a body
/// missing one field and carrying a malformed date reports `MissingFields`.
pub fn validate_create(request: &CreateInspectionRequest) -> Result<NewInspection, ValidationError> {
    let site = required(&request.site)?;
    let inspection_date = required(&request.inspection_date)?;
    let findings = required(&request.findings)?;

    if [site, inspection_date, findings].iter().any(|v| v.contains('\0')) {
        return Err(ValidationError::InvalidCharacters);
    }

    if site.chars().count() > SITE_MAX_CHARS {
        return Err(ValidationError::SiteTooLong);
    }

    let inspection_date = NaiveDate::parse_from_str(inspection_date, DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate)?;

    Ok(NewInspection {
        site: site.to_string(),
        inspection_date,
        findings: findings.to_string(),
    })
}

/// Parse a requested status name.
pub fn parse_status(status: Option<&str>) -> Result<InspectionStatus, ValidationError> {
    status
        .and_then(|s| InspectionStatus::from_str(s).ok())
        .ok_or(ValidationError::InvalidStatus)
}

fn required(field: &Option<String>) -> Result<&str, ValidationError> {
    match field.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ValidationError::MissingFields),
    }
}
