//! Caller identity supplied by the authentication layer in front of the API

use super::error::{unauthorized, Problem};
use crate::contract::Caller;
use axum::http::HeaderMap;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLES_HEADER: &str = "x-user-roles";

const ADMIN_ROLE: &str = "admin";

/// Read the caller from `x-user-id` and `x-user-roles`
pub fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, Problem> {
    let raw = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| unauthorized(format!("Missing {} header", USER_ID_HEADER)))?;
    let user_id = raw
        .to_str()
        .ok()
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or_else(|| unauthorized(format!("Invalid {} header", USER_ID_HEADER)))?;

    let is_admin = headers
        .get_all(USER_ROLES_HEADER)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|role| role.trim().eq_ignore_ascii_case(ADMIN_ROLE));

    Ok(Caller { user_id, is_admin })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_missing_user_is_unauthorized() {
        let problem = caller_from_headers(&HeaderMap::new()).unwrap_err();
        assert_eq!(problem.status, 401);
    }

    #[test]
    fn test_malformed_user_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert_eq!(caller_from_headers(&headers).unwrap_err().status, 401);
    }

    #[test]
    fn test_roles() {
        let user_id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_ID_HEADER,
            HeaderValue::from_str(&user_id.to_string()).unwrap(),
        );
        let caller = caller_from_headers(&headers).unwrap();
        assert_eq!(caller, Caller::user(user_id));

        headers.insert(USER_ROLES_HEADER, HeaderValue::from_static("payroll, Admin"));
        let caller = caller_from_headers(&headers).unwrap();
        assert_eq!(caller, Caller::admin(user_id));
    }
}
