//! Handlers for `/voters` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/voters` | Manual entry; optional `leader_id` acts for another leader |
//! | `GET`    | `/voters` | Own roster, or `?leader=` in scope; `?search=` matches name/surname/document |
//! | `POST`   | `/voters/import` | Body `{"attendee_ids":[...], "leader_id":...}` |
//! | `GET`    | `/voters/{id}` | 404 if unknown or out of scope |
//! | `PUT`    | `/voters/{id}` | 409 if the new document is already in the roster |
//! | `DELETE` | `/voters/{id}` | |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use muster_core::{
  roster,
  store::FieldStore,
  voter::{VoterDetails, VoterRecord},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, caller::Authenticated, error::ApiError};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub leader_id: Option<Uuid>,
  #[serde(flatten)]
  pub details:   VoterDetails,
}

/// `POST /voters`
pub async fn create<S: FieldStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<VoterRecord>), ApiError> {
  let owner = body.leader_id.unwrap_or(caller.id);
  let voter = roster::create_voter(&*state.store, &caller, owner, body.details).await?;
  Ok((StatusCode::CREATED, Json(voter)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub leader: Option<Uuid>,
  pub search: Option<String>,
}

/// `GET /voters[?leader=<id>][&search=<text>]`
pub async fn list<S: FieldStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<VoterRecord>>, ApiError> {
  let voters = roster::list_voters(&*state.store, &caller, params.leader, params.search).await?;
  Ok(Json(voters))
}

// ─── Import ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ImportBody {
  pub attendee_ids: Vec<Uuid>,
  #[serde(default)]
  pub leader_id:    Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct Imported {
  /// Entries created by this call; documents already on the roster are
  /// skipped.
  pub created: usize,
  pub voters:  Vec<VoterRecord>,
}

/// `POST /voters/import`
pub async fn import<S: FieldStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<ImportBody>,
) -> Result<Json<Imported>, ApiError> {
  let owner = body.leader_id.unwrap_or(caller.id);
  let voters = roster::import(&*state.store, &caller, body.attendee_ids, owner).await?;
  Ok(Json(Imported { created: voters.len(), voters }))
}

// ─── One entry ───────────────────────────────────────────────────────────────

/// `GET /voters/{id}`
pub async fn get_one<S: FieldStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<VoterRecord>, ApiError> {
  Ok(Json(roster::get_voter(&*state.store, &caller, id).await?))
}

/// `PUT /voters/{id}`
pub async fn update<S: FieldStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(details): Json<VoterDetails>,
) -> Result<Json<VoterRecord>, ApiError> {
  Ok(Json(roster::update_voter(&*state.store, &caller, id, details).await?))
}

/// `DELETE /voters/{id}`
pub async fn delete_one<S: FieldStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  roster::delete_voter(&*state.store, &caller, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
