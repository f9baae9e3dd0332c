//! HTTP error mapping to RFC-9457 Problem Details

use crate::contract::AdvancesError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// RFC-9457 Problem Details for HTTP API errors
#[derive(Debug, Serialize, ToSchema)]
pub struct Problem {
    /// A URI reference that identifies the problem type
    #[serde(rename = "type")]
    pub type_uri: String,

    /// A short, human-readable summary of the problem type
    pub title: String,

    /// The HTTP status code
    pub status: u16,

    /// A human-readable explanation specific to this occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// A URI reference that identifies the specific occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Messages per rejected input field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl Problem {
    /// Create a new Problem Details response
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            type_uri: format!("https://httpstatuses.io/{}", status.as_u16()),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
            errors: None,
        }
    }

    /// Add detail message
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Add a field-keyed error map
    pub fn with_errors(mut self, errors: BTreeMap<String, Vec<String>>) -> Self {
        self.errors = Some(errors);
        self
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

/// Map domain errors to HTTP Problem Details
pub fn map_domain_error(error: AdvancesError) -> Problem {
    match error {
        AdvancesError::NotFound { resource, id } => {
            Problem::new(StatusCode::NOT_FOUND, format!("{} Not Found", capitalize(&resource)))
                .with_detail(format!("{} with id '{}' was not found", resource, id))
        }

        AdvancesError::Validation { violations } => {
            let detail = AdvancesError::Validation {
                violations: violations.clone(),
            }
            .to_string();
            let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for violation in violations {
                errors
                    .entry(violation.field)
                    .or_default()
                    .push(violation.message);
            }
            Problem::new(StatusCode::UNPROCESSABLE_ENTITY, "Validation Error")
                .with_detail(detail)
                .with_errors(errors)
        }

        error @ AdvancesError::InvalidTransition { .. } => {
            Problem::new(StatusCode::CONFLICT, "Invalid Status Transition")
                .with_detail(error.to_string())
        }

        AdvancesError::Conflict { reason } => {
            Problem::new(StatusCode::CONFLICT, "Conflict").with_detail(reason)
        }

        AdvancesError::Forbidden { reason } => {
            Problem::new(StatusCode::FORBIDDEN, "Forbidden").with_detail(reason)
        }

        AdvancesError::Internal => {
            Problem::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
                .with_detail("An unexpected error occurred")
        }
    }
}

/// Missing or malformed caller identity
pub fn unauthorized(detail: impl Into<String>) -> Problem {
    Problem::new(StatusCode::UNAUTHORIZED, "Unauthorized").with_detail(detail)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{AdvanceStatus, FieldViolation};

    #[test]
    fn test_status_codes() {
        let cases = [
            (AdvancesError::not_found("advance", "42"), 404),
            (AdvancesError::invalid("amount", "must be greater than zero"), 422),
            (
                AdvancesError::InvalidTransition {
                    status: AdvanceStatus::Rejected,
                    action: "approve".to_string(),
                },
                409,
            ),
            (
                AdvancesError::Conflict {
                    reason: "busy".to_string(),
                },
                409,
            ),
            (
                AdvancesError::Forbidden {
                    reason: "admins only".to_string(),
                },
                403,
            ),
            (AdvancesError::Internal, 500),
        ];

        for (error, status) in cases {
            assert_eq!(map_domain_error(error).status, status);
        }
    }

    #[test]
    fn test_validation_errors_are_keyed_by_field() {
        let problem = map_domain_error(AdvancesError::Validation {
            violations: vec![
                FieldViolation::new("amount", "must be greater than zero"),
                FieldViolation::new("reason", "is required"),
                FieldViolation::new("amount", "must have at most two decimal places"),
            ],
        });

        let errors = problem.errors.unwrap();
        assert_eq!(errors["amount"].len(), 2);
        assert_eq!(errors["reason"], vec!["is required".to_string()]);
    }

    #[test]
    fn test_not_found_title() {
        let problem = map_domain_error(AdvancesError::not_found("repayment", "7"));
        assert_eq!(problem.title, "Repayment Not Found");
        assert_eq!(problem.detail.as_deref(), Some("repayment with id '7' was not found"));
    }
}
