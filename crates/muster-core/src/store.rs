//! The `FieldStore` trait and its write outcome type.
//!
//! The trait is implemented by storage backends (e.g. `muster-store-sqlite`).
//! The store is the single source of truth: every uniqueness rule of the
//! subsystem (meeting code, attendee per meeting, voter per leader) is a
//! constraint inside the backend, and a write that would break one reports
//! [`Unique::Duplicate`] instead of failing.

use std::future::Future;

use uuid::Uuid;

use crate::{
  attendee::{Attendee, Sighting},
  identity::Identity,
  meeting::{Meeting, MeetingFilter},
  voter::{VoterFilter, VoterRecord},
};

// ─── Write outcome ───────────────────────────────────────────────────────────

/// Result of a write guarded by a uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unique<T> {
  Written(T),
  /// The backend rejected the write; nothing was persisted.
  Duplicate,
}

impl<T> Unique<T> {
  pub fn written(self) -> Option<T> {
    match self {
      Self::Written(t) => Some(t),
      Self::Duplicate => None,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a muster storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`). Implementations
/// must not cache meeting, attendee or voter state between calls.
pub trait FieldStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Identities ────────────────────────────────────────────────────────

  /// Insert or replace an identity row, keyed by `identity_id`.
  fn put_identity(
    &self,
    identity: Identity,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  fn get_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  /// All identities, oldest first.
  fn list_identities(
    &self,
  ) -> impl Future<Output = Result<Vec<Identity>, Self::Error>> + Send + '_;

  /// Ids of the identities whose `manager_id` is `manager_id`.
  fn managed_identity_ids(
    &self,
    manager_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  /// Set or clear an identity's manager. Returns `false` if the identity does
  /// not exist.
  fn set_manager(
    &self,
    id: Uuid,
    manager_id: Option<Uuid>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete an identity. Fails if meetings or voters still reference it.
  fn delete_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Meetings ──────────────────────────────────────────────────────────

  fn meeting_code_exists<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Insert a meeting. `Duplicate` if its code is already taken.
  fn insert_meeting(
    &self,
    meeting: Meeting,
  ) -> impl Future<Output = Result<Unique<Meeting>, Self::Error>> + Send + '_;

  fn get_meeting(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Meeting>, Self::Error>> + Send + '_;

  fn get_meeting_by_code<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Option<Meeting>, Self::Error>> + Send + 'a;

  /// Persist a meeting's details, owner and owner snapshot. The code is never
  /// rewritten. Returns `false` if the meeting does not exist.
  fn save_meeting<'a>(
    &'a self,
    meeting: &'a Meeting,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Meetings matching `filter`, latest scheduled first.
  fn list_meetings<'a>(
    &'a self,
    filter: &'a MeetingFilter,
  ) -> impl Future<Output = Result<Vec<Meeting>, Self::Error>> + Send + 'a;

  /// Delete meetings (and, by cascade, their attendees). When `leader_ids` is
  /// set, only meetings owned by those leaders are touched. Returns the
  /// number of meetings removed.
  fn delete_meetings(
    &self,
    ids: Vec<Uuid>,
    leader_ids: Option<Vec<Uuid>>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Attendees ─────────────────────────────────────────────────────────

  fn attendee_exists<'a>(
    &'a self,
    meeting_id: Uuid,
    document: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Insert an attendee. `Duplicate` if the document already signed up to
  /// the meeting.
  fn insert_attendee(
    &self,
    attendee: Attendee,
  ) -> impl Future<Output = Result<Unique<Attendee>, Self::Error>> + Send + '_;

  /// Attendees of one meeting, in sign-up order.
  fn list_attendees(
    &self,
    meeting_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Attendee>, Self::Error>> + Send + '_;

  /// The given attendees joined with their meetings. Unknown ids are
  /// omitted.
  fn get_sightings(
    &self,
    attendee_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<Sighting>, Self::Error>> + Send + '_;

  /// One sighting per distinct document among the attendees of meetings
  /// matching `filter`. The representative is the attendee whose meeting is
  /// scheduled latest; ties go to the latest sign-up, then the greatest
  /// attendee id.
  fn list_unique<'a>(
    &'a self,
    filter: &'a MeetingFilter,
  ) -> impl Future<Output = Result<Vec<Sighting>, Self::Error>> + Send + 'a;

  // ── Voters ────────────────────────────────────────────────────────────

  fn voter_exists<'a>(
    &'a self,
    leader_id: Uuid,
    document: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Insert a roster entry. `Duplicate` if the leader's roster already holds
  /// the document.
  fn insert_voter(
    &self,
    voter: VoterRecord,
  ) -> impl Future<Output = Result<Unique<VoterRecord>, Self::Error>> + Send + '_;

  fn get_voter(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<VoterRecord>, Self::Error>> + Send + '_;

  /// Persist every field of an existing roster entry, including its owner.
  /// `Written(false)` if the entry does not exist; `Duplicate` if the new
  /// `(leader_id, document)` is taken by another entry.
  fn save_voter<'a>(
    &'a self,
    voter: &'a VoterRecord,
  ) -> impl Future<Output = Result<Unique<bool>, Self::Error>> + Send + 'a;

  /// Roster entries matching `filter`, ordered by surname then name.
  fn list_voters<'a>(
    &'a self,
    filter: &'a VoterFilter,
  ) -> impl Future<Output = Result<Vec<VoterRecord>, Self::Error>> + Send + 'a;

  fn delete_voter(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
