//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error(transparent)]
  Core(#[from] muster_core::Error),
}

impl ApiError {
  fn status(&self) -> StatusCode {
    use muster_core::Error as E;
    match self {
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::Core(e) => match e {
        E::NotFound(_) => StatusCode::NOT_FOUND,
        E::Conflict(_) => StatusCode::CONFLICT,
        E::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
        E::Forbidden(_) => StatusCode::FORBIDDEN,
        E::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        E::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }

  fn kind(&self) -> &'static str {
    match self {
      ApiError::Unauthorized(_) => "unauthorized",
      ApiError::Core(e) => e.kind(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      ApiError::Core(muster_core::Error::Store(e)) => {
        tracing::error!(error = %e, "store failure");
        "internal server error".to_string()
      }
      ApiError::Core(e) => e.to_string(),
      ApiError::Unauthorized(m) => m.clone(),
    };
    (status, Json(json!({ "error": message, "kind": self.kind() }))).into_response()
  }
}
