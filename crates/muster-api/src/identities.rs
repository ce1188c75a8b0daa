//! Handlers for `/identities` endpoints. All require `god` or `admin`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/identities` | Upsert an identity mirrored from the identity provider |
//! | `PUT`  | `/identities/{id}/manager` | Body `{"manager_id": <uuid or null>}` |
//! | `POST` | `/identities/consolidate` | Run the consolidation pass now |

use axum::{
  Json,
  extract::{Path, State},
};
use muster_core::{
  consolidate::ConsolidationReport,
  directory::{self, IdentityInput},
  identity::Identity,
  store::FieldStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, caller::Authenticated, error::ApiError};

/// `POST /identities`
pub async fn upsert<S: FieldStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(input): Json<IdentityInput>,
) -> Result<Json<Identity>, ApiError> {
  Ok(Json(directory::upsert_identity(&*state.store, &caller, input).await?))
}

#[derive(Debug, Deserialize)]
pub struct ManagerBody {
  pub manager_id: Option<Uuid>,
}

/// `PUT /identities/{id}/manager`
pub async fn set_manager<S: FieldStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<ManagerBody>,
) -> Result<Json<Identity>, ApiError> {
  Ok(Json(directory::set_manager(&*state.store, &caller, id, body.manager_id).await?))
}

/// `POST /identities/consolidate`
pub async fn consolidate<S: FieldStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<ConsolidationReport>, ApiError> {
  Ok(Json(directory::run_consolidation(&*state.store, &caller).await?))
}
