//! JSON REST API for muster.
//!
//! Exposes an axum [`Router`] backed by any [`FieldStore`]. Authentication is
//! the identity provider's job: it forwards the caller in request headers
//! (see [`caller`]). TLS and transport concerns are the binary's.

pub mod caller;
pub mod error;
pub mod identities;
pub mod meetings;
pub mod voters;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use muster_core::{code::CodeGenerator, store::FieldStore};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Settings the handlers need at request time.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Prefix of public registration links, `{base_url}/meetings/{code}`.
  pub base_url: String,
}

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub codes:  Arc<dyn CodeGenerator>,
  pub config: Arc<ApiConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  self.store.clone(),
      codes:  self.codes.clone(),
      config: self.config.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: FieldStore + 'static,
{
  Router::new()
    // Meetings
    .route(
      "/meetings",
      get(meetings::list::<S>)
        .post(meetings::create::<S>)
        .delete(meetings::delete_many::<S>),
    )
    .route("/meetings/unique", get(meetings::unique::<S>))
    .route("/meetings/register", post(meetings::register::<S>))
    .route(
      "/meetings/{key}",
      get(meetings::by_code::<S>)
        .put(meetings::update::<S>)
        .delete(meetings::delete_one::<S>),
    )
    .route("/meetings/{key}/attendees", get(meetings::attendees::<S>))
    // Voters
    .route("/voters", get(voters::list::<S>).post(voters::create::<S>))
    .route("/voters/import", post(voters::import::<S>))
    .route(
      "/voters/{id}",
      get(voters::get_one::<S>)
        .put(voters::update::<S>)
        .delete(voters::delete_one::<S>),
    )
    // Identities
    .route("/identities", post(identities::upsert::<S>))
    .route("/identities/consolidate", post(identities::consolidate::<S>))
    .route("/identities/{id}/manager", put(identities::set_manager::<S>))
    .with_state(state)
}
