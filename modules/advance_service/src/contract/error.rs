//! Contract error types for advance service
//!
//! These errors are transport-agnostic and used for inter-module communication.

use super::model::AdvanceStatus;

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Advance service domain errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdvancesError {
    /// Employee, advance or repayment not found (or owned by another employee)
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Resource type (employee, advance, repayment)
        resource: String,
        /// Resource identifier
        id: String,
    },

    /// Input rejected by field validation
    #[error("Validation failed: {}", format_violations(.violations))]
    Validation { violations: Vec<FieldViolation> },

    /// Status does not allow the requested action
    #[error("Cannot {action} an advance in status {status}")]
    InvalidTransition {
        status: AdvanceStatus,
        action: String,
    },

    /// Conflict with existing state (duplicates, ledger entries, ...)
    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    /// Caller lacks the privilege for the action
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    /// Internal error
    #[error("Internal error")]
    Internal,
}

impl AdvancesError {
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    /// Validation error for a single field
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            violations: vec![FieldViolation::new(field, message)],
        }
    }
}

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join(", ")
}
