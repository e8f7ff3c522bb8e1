//! Inspection records and the operations on them.
//!
//! This module handles:
//! - Record and status types
//! - Input validation
//! - The inspection service (list, create, transition status)

pub mod service;
pub mod types;
pub mod validation;

pub use service::InspectionService;
pub use types::{
    CreateInspectionRequest, Inspection, InspectionStatus, NewInspection, StatusUpdateRequest,
};
