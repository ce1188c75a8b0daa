//! Identity-provider headers and the [`Authenticated`] extractor.
//!
//! The upstream identity provider authenticates the request and forwards the
//! principal as two headers: `x-caller-id` (a UUID) and `x-caller-roles`
//! (comma-separated role names). Unknown roles are ignored.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use muster_core::identity::{Caller, parse_roles};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub const CALLER_ID_HEADER: &str = "x-caller-id";
pub const CALLER_ROLES_HEADER: &str = "x-caller-roles";

/// Present in a handler means the request carried a valid caller.
pub struct Authenticated(pub Caller);

/// Read the caller from request headers.
pub fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, ApiError> {
  let id = headers
    .get(CALLER_ID_HEADER)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(|| ApiError::Unauthorized(format!("missing {CALLER_ID_HEADER} header")))?;
  let id = Uuid::parse_str(id.trim())
    .map_err(|_| ApiError::Unauthorized(format!("malformed {CALLER_ID_HEADER} header")))?;

  let roles = headers
    .get(CALLER_ROLES_HEADER)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default();

  Ok(Caller::new(id, parse_roles(roles.split(','))))
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    caller_from_headers(&parts.headers).map(Authenticated)
  }
}
