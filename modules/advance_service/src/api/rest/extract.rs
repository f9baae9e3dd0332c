//! Request extractors whose rejections are Problem Details
//!
//! axum's `Json`, `Path` and `Query` reject with plain-text bodies. These
//! wrappers delegate to them and turn a rejection into a [`Problem`]; input that
//! fails to deserialize is a 422 keyed by the offending field.

use super::error::Problem;
use axum::{
    extract::{
        path::ErrorKind,
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, OptionalFromRequest, Path, Query, RawPathParams, Request,
    },
    http::{request::Parts, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use uuid::Uuid;

/// JSON request body
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

/// Path parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPath<T>(pub T);

/// Query string
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match <Json<T> as FromRequest<S>>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_problem(rejection)),
        }
    }
}

impl<T, S> OptionalFromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        match <Json<T> as OptionalFromRequest<S>>::from_request(req, state).await {
            Ok(value) => Ok(value.map(|Json(value)| ApiJson(value))),
            Err(rejection) => Err(json_problem(rejection)),
        }
    }
}

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let rejection = match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => return Ok(ApiPath(value)),
            Err(rejection) => rejection,
        };
        let params = RawPathParams::from_request_parts(parts, state).await.ok();
        let names: Vec<(&str, &str)> = params.as_ref().map_or_else(Vec::new, |p| p.iter().collect());
        Err(path_problem(rejection, &names))
    }
}

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(query_problem(rejection)),
        }
    }
}

fn json_problem(rejection: JsonRejection) -> Problem {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let (field, message) = split_field(&err.body_text(), "body");
            field_problem(field, message)
        }
        other => plain_problem(other.status(), other.body_text()),
    }
}

fn query_problem(rejection: QueryRejection) -> Problem {
    match rejection {
        QueryRejection::FailedToDeserializeQueryString(err) => {
            let (field, message) = split_field(&err.body_text(), "query");
            field_problem(field, message)
        }
        other => plain_problem(other.status(), other.body_text()),
    }
}

/// `params` are the raw `(name, value)` pairs of the matched route
fn path_problem(rejection: PathRejection, params: &[(&str, &str)]) -> Problem {
    let err = match rejection {
        PathRejection::FailedToDeserializePathParams(err) => err,
        other => return plain_problem(other.status(), other.body_text()),
    };

    let field = match err.kind() {
        ErrorKind::ParseErrorAtKey { key, .. } | ErrorKind::InvalidUtf8InPathParam { key } => {
            Some(key.clone())
        }
        ErrorKind::ParseErrorAtIndex { index, .. } => {
            params.get(*index).map(|(name, _)| name.to_string())
        }
        // Every route parameter is an id
        _ => params
            .iter()
            .find(|(_, value)| Uuid::parse_str(value).is_err())
            .map(|(name, _)| name.to_string()),
    };

    field_problem(
        field.unwrap_or_else(|| "path".to_string()),
        err.kind().to_string(),
    )
}

/// Split axum's `"<prefix>: <field>: <message>"` text into field and message
///
/// Text without a field path is reported under `fallback`.
fn split_field(text: &str, fallback: &str) -> (String, String) {
    let message = text.split_once(": ").map_or(text, |(_, rest)| rest);

    if let Some((field, _)) = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split_once('`'))
    {
        return (field.to_string(), "is required".to_string());
    }

    match message.split_once(": ") {
        Some((path, inner)) if is_field_path(path) => {
            let (field, inner) = match inner
                .strip_prefix("missing field `")
                .and_then(|rest| rest.split_once('`'))
            {
                Some((nested, _)) => (format!("{}.{}", path, nested), "is required".to_string()),
                None => (path.to_string(), inner.to_string()),
            };
            (field, inner)
        }
        _ => (fallback.to_string(), message.to_string()),
    }
}

fn is_field_path(path: &str) -> bool {
    !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

fn field_problem(field: String, message: String) -> Problem {
    tracing::debug!(field = %field, error = %message, "request rejected");
    let detail = format!("{}: {}", field, message);
    let mut errors = BTreeMap::new();
    errors.insert(field, vec![message]);
    Problem::new(StatusCode::UNPROCESSABLE_ENTITY, "Validation Error")
        .with_detail(detail)
        .with_errors(errors)
}

fn plain_problem(status: StatusCode, detail: String) -> Problem {
    let title = status.canonical_reason().unwrap_or("Bad Request");
    Problem::new(status, title).with_detail(detail)
}
