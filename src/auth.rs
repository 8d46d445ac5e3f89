//! Actor identity at the interface boundary. Token verification happens in
//! the upstream gateway; by the time a request reaches this service the
//! gateway has authenticated it and stamped the actor id into `x-user-id`.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::errors::ServiceError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated actor for a request. Every mutating operation threads
/// this id into the ledger, audit, and notification records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ServiceError::Unauthorized(format!("missing {} header", USER_ID_HEADER))
            })?;

        let user_id = raw.parse::<Uuid>().map_err(|_| {
            ServiceError::Unauthorized(format!("malformed {} header", USER_ID_HEADER))
        })?;

        Ok(AuthenticatedUser { user_id })
    }
}
