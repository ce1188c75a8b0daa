//! Handlers for `/meetings` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/meetings` | Create; optional `leader_id` acts for another leader |
//! | `GET`    | `/meetings` | Scoped list; `?leader=&dateStart=&dateEnd=&location=&region=&locality=&meetingId=` |
//! | `DELETE` | `/meetings` | Bulk delete; body `{"ids":[...]}` |
//! | `GET`    | `/meetings/unique` | Unique-person view, same filters as the list |
//! | `POST`   | `/meetings/register` | Public sign-up; body carries the meeting `code` |
//! | `GET`    | `/meetings/{code}` | Public lookup by code |
//! | `PUT`    | `/meetings/{id}` | Replace name, schedule and location |
//! | `DELETE` | `/meetings/{id}` | 404 if unknown or out of scope |
//! | `GET`    | `/meetings/{id}/attendees` | Attendees of one meeting |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use muster_core::{
  attendee::{Attendee, NewAttendee, Sighting},
  ledger,
  meeting::{Meeting, MeetingDetails, MeetingFilter, NewMeeting},
  registry,
  roster,
  store::FieldStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, caller::Authenticated, error::ApiError};

/// A meeting as returned to clients, with its public registration link.
#[derive(Debug, Serialize)]
pub struct MeetingView {
  #[serde(flatten)]
  pub meeting:          Meeting,
  pub registration_url: String,
}

impl MeetingView {
  fn new(meeting: Meeting, base_url: &str) -> Self {
    let registration_url = meeting.registration_url(base_url);
    Self { meeting, registration_url }
  }
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  /// Owning leader; defaults to the caller.
  #[serde(default)]
  pub leader_id: Option<Uuid>,
  #[serde(flatten)]
  pub meeting:   NewMeeting,
}

/// `POST /meetings`
pub async fn create<S: FieldStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let owner = body.leader_id.unwrap_or(caller.id);
  let meeting =
    registry::create_meeting(&*state.store, &*state.codes, &caller, owner, body.meeting).await?;
  Ok((StatusCode::CREATED, Json(MeetingView::new(meeting, &state.config.base_url))))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub leader:     Option<Uuid>,
  pub date_start: Option<NaiveDate>,
  pub date_end:   Option<NaiveDate>,
  pub location:   Option<String>,
  pub region:     Option<String>,
  pub locality:   Option<String>,
  pub meeting_id: Option<Uuid>,
}

impl ListParams {
  fn split(self) -> (MeetingFilter, Option<Uuid>) {
    let filter = MeetingFilter {
      date_start: self.date_start,
      date_end:   self.date_end,
      location:   self.location,
      region:     self.region,
      locality:   self.locality,
      meeting_id: self.meeting_id,
      leader_ids: None,
    };
    (filter, self.leader)
  }
}

/// `GET /meetings`
pub async fn list<S: FieldStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<MeetingView>>, ApiError> {
  let (filter, leader) = params.split();
  let meetings = registry::list(&*state.store, &caller, filter, leader).await?;
  let base_url = &state.config.base_url;
  Ok(Json(meetings.into_iter().map(|m| MeetingView::new(m, base_url)).collect()))
}

/// `GET /meetings/unique`
pub async fn unique<S: FieldStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Sighting>>, ApiError> {
  let (filter, leader) = params.split();
  Ok(Json(roster::list_unique(&*state.store, &caller, filter, leader).await?))
}

// ─── Public ──────────────────────────────────────────────────────────────────

/// `GET /meetings/{code}`; no caller required.
pub async fn by_code<S: FieldStore>(
  State(state): State<AppState<S>>,
  Path(code): Path<String>,
) -> Result<Json<MeetingView>, ApiError> {
  let meeting = registry::find_by_code(&*state.store, &code).await?;
  Ok(Json(MeetingView::new(meeting, &state.config.base_url)))
}

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub code:     String,
  #[serde(flatten)]
  pub attendee: NewAttendee,
}

/// `POST /meetings/register`; no caller required.
pub async fn register<S: FieldStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<Attendee>), ApiError> {
  let attendee = ledger::register(&*state.store, &body.code, body.attendee).await?;
  Ok((StatusCode::CREATED, Json(attendee)))
}

// ─── One meeting ─────────────────────────────────────────────────────────────

/// `PUT /meetings/{id}`
pub async fn update<S: FieldStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
  Json(details): Json<MeetingDetails>,
) -> Result<Json<MeetingView>, ApiError> {
  let meeting = registry::update_details(&*state.store, &caller, id, details).await?;
  Ok(Json(MeetingView::new(meeting, &state.config.base_url)))
}

/// `GET /meetings/{id}/attendees`
pub async fn attendees<S: FieldStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Attendee>>, ApiError> {
  Ok(Json(ledger::list_for_meeting(&*state.store, &caller, id).await?))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /meetings/{id}`
pub async fn delete_one<S: FieldStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  registry::delete_one(&*state.store, &caller, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteBody {
  pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
  pub deleted: usize,
}

/// `DELETE /meetings`; body `{"ids":[...]}`
pub async fn delete_many<S: FieldStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<BulkDeleteBody>,
) -> Result<Json<Deleted>, ApiError> {
  let deleted = registry::delete_many(&*state.store, &caller, body.ids).await?;
  Ok(Json(Deleted { deleted }))
}
