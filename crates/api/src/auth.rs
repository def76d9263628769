//! Request identity extraction.
//!
//! Identity is established upstream (gateway or session layer) and
//! forwarded as trusted headers; the API only reads them. `x-user-id`
//! carries the principal's UUID and `x-user-role` the role, defaulting
//! to `customer` when absent.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{Role, UserId};

use crate::error::ApiError;

const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    /// Returns an error unless the principal is an admin.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("admin role required".to_string()))
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?;
        let user_id = uuid::Uuid::parse_str(user_id)
            .map(UserId::from_uuid)
            .map_err(|e| ApiError::Unauthorized(format!("invalid {USER_ID_HEADER}: {e}")))?;

        let role = match parts.headers.get(USER_ROLE_HEADER) {
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|s| s.parse::<Role>().ok())
                .ok_or_else(|| {
                    ApiError::Unauthorized(format!("invalid {USER_ROLE_HEADER} header"))
                })?,
            None => Role::Customer,
        };

        Ok(Principal { user_id, role })
    }
}
