//! Error types for `muster-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("precondition failed: {0}")]
  PreconditionFailed(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("invalid input: {0}")]
  Validation(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error. Used as `.map_err(Error::store)`.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// Short, stable, machine-readable name for the error class.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::NotFound(_) => "not_found",
      Self::Conflict(_) => "conflict",
      Self::PreconditionFailed(_) => "precondition_failed",
      Self::Forbidden(_) => "forbidden",
      Self::Validation(_) => "validation",
      Self::Store(_) => "internal",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
