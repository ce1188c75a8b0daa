//! Tests for `SqliteStore` and the core operations, against an in-memory
//! database.

mod meetings;

use std::{collections::VecDeque, sync::Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use muster_core::{
  attendee::{Attendee, NewAttendee, Sighting},
  code::{CodeGenerator, RandomCodes},
  identity::{Caller, Identity, Role},
  meeting::{Meeting, MeetingDetails, MeetingFilter, NewMeeting},
  registry,
  store::{FieldStore, Unique},
  voter::{VoterFilter, VoterRecord},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
}

fn new_identity(roles: &[Role], document: Option<&str>) -> Identity {
  Identity {
    identity_id:  Uuid::new_v4(),
    document:     document.map(str::to_owned),
    display_name: "Test Person".into(),
    phone:        Some("3005550000".into()),
    roles:        roles.to_vec(),
    manager_id:   None,
    is_seed:      false,
    created_at:   Utc::now(),
  }
}

/// Persist an identity with the given roles and document.
async fn identity(s: &SqliteStore, roles: &[Role], document: Option<&str>) -> Identity {
  s.put_identity(new_identity(roles, document)).await.unwrap()
}

/// Persist a leader managed by `manager`.
async fn managed_leader(s: &SqliteStore, manager: Uuid, document: &str) -> Identity {
  let mut leader = new_identity(&[Role::Leader], Some(document));
  leader.manager_id = Some(manager);
  s.put_identity(leader).await.unwrap()
}

fn caller(identity: &Identity) -> Caller {
  Caller::new(identity.identity_id, identity.roles.iter().copied())
}

fn details(name: &str, scheduled_at: DateTime<Utc>) -> MeetingDetails {
  MeetingDetails {
    name: name.into(),
    scheduled_at,
    region: Some("Antioquia".into()),
    locality: Some("Medellin".into()),
    district: Some("Comuna 10".into()),
    neighborhood: Some("La Candelaria".into()),
  }
}

fn new_meeting(name: &str, scheduled_at: DateTime<Utc>) -> NewMeeting {
  NewMeeting { details: details(name, scheduled_at), leader: None }
}

/// Create a meeting owned by (and created by) `leader`.
async fn meeting(s: &SqliteStore, leader: &Identity, name: &str, scheduled_at: DateTime<Utc>) -> Meeting {
  registry::create_meeting(
    s,
    &RandomCodes::default(),
    &caller(leader),
    leader.identity_id,
    new_meeting(name, scheduled_at),
  )
  .await
  .unwrap()
}

fn attendee(document: &str) -> NewAttendee {
  NewAttendee {
    name:      "Ana".into(),
    surname:   "Torres".into(),
    document:  document.into(),
    phone:     "3005551234".into(),
    email:     None,
    address:   Some("Calle 10 # 4-20".into()),
    consent:   true,
    signature: None,
  }
}

/// Hands out a fixed sequence of codes, then falls back to random ones.
struct ScriptedCodes(Mutex<VecDeque<&'static str>>);

impl ScriptedCodes {
  fn new(codes: &[&'static str]) -> Self { Self(Mutex::new(codes.iter().copied().collect())) }
}

impl CodeGenerator for ScriptedCodes {
  fn generate(&self) -> String {
    match self.0.lock().unwrap().pop_front() {
      Some(code) => code.to_owned(),
      None => RandomCodes::default().generate(),
    }
  }
}

fn days(n: i64) -> Duration { Duration::days(n) }

/// Delegates to a real store, with two faults that can be switched on.
struct RiggedStore {
  inner:         SqliteStore,
  /// Never report a code as taken, so every collision has to be caught by
  /// the unique constraint.
  blind_codes:   bool,
  /// Fail every roster save that would land in this leader's roster.
  broken_roster: Option<Uuid>,
}

impl RiggedStore {
  fn blind(inner: SqliteStore) -> Self {
    Self { inner, blind_codes: true, broken_roster: None }
  }

  fn breaking_roster_of(inner: SqliteStore, leader_id: Uuid) -> Self {
    Self { inner, blind_codes: false, broken_roster: Some(leader_id) }
  }
}

impl FieldStore for RiggedStore {
  type Error = crate::Error;

  async fn put_identity(&self, identity: Identity) -> crate::Result<Identity> {
    self.inner.put_identity(identity).await
  }
  async fn get_identity(&self, id: Uuid) -> crate::Result<Option<Identity>> {
    self.inner.get_identity(id).await
  }
  async fn list_identities(&self) -> crate::Result<Vec<Identity>> { self.inner.list_identities().await }
  async fn managed_identity_ids(&self, manager_id: Uuid) -> crate::Result<Vec<Uuid>> {
    self.inner.managed_identity_ids(manager_id).await
  }
  async fn set_manager(&self, id: Uuid, manager_id: Option<Uuid>) -> crate::Result<bool> {
    self.inner.set_manager(id, manager_id).await
  }
  async fn delete_identity(&self, id: Uuid) -> crate::Result<bool> { self.inner.delete_identity(id).await }
  async fn meeting_code_exists(&self, code: &str) -> crate::Result<bool> {
    if self.blind_codes {
      return Ok(false);
    }
    self.inner.meeting_code_exists(code).await
  }
  async fn insert_meeting(&self, meeting: Meeting) -> crate::Result<Unique<Meeting>> {
    self.inner.insert_meeting(meeting).await
  }
  async fn get_meeting(&self, id: Uuid) -> crate::Result<Option<Meeting>> { self.inner.get_meeting(id).await }
  async fn get_meeting_by_code(&self, code: &str) -> crate::Result<Option<Meeting>> {
    self.inner.get_meeting_by_code(code).await
  }
  async fn save_meeting(&self, meeting: &Meeting) -> crate::Result<bool> {
    self.inner.save_meeting(meeting).await
  }
  async fn list_meetings(&self, filter: &MeetingFilter) -> crate::Result<Vec<Meeting>> {
    self.inner.list_meetings(filter).await
  }
  async fn delete_meetings(&self, ids: Vec<Uuid>, leader_ids: Option<Vec<Uuid>>) -> crate::Result<usize> {
    self.inner.delete_meetings(ids, leader_ids).await
  }
  async fn attendee_exists(&self, meeting_id: Uuid, document: &str) -> crate::Result<bool> {
    self.inner.attendee_exists(meeting_id, document).await
  }
  async fn insert_attendee(&self, attendee: Attendee) -> crate::Result<Unique<Attendee>> {
    self.inner.insert_attendee(attendee).await
  }
  async fn list_attendees(&self, meeting_id: Uuid) -> crate::Result<Vec<Attendee>> {
    self.inner.list_attendees(meeting_id).await
  }
  async fn get_sightings(&self, attendee_ids: Vec<Uuid>) -> crate::Result<Vec<Sighting>> {
    self.inner.get_sightings(attendee_ids).await
  }
  async fn list_unique(&self, filter: &MeetingFilter) -> crate::Result<Vec<Sighting>> {
    self.inner.list_unique(filter).await
  }
  async fn voter_exists(&self, leader_id: Uuid, document: &str) -> crate::Result<bool> {
    self.inner.voter_exists(leader_id, document).await
  }
  async fn insert_voter(&self, voter: VoterRecord) -> crate::Result<Unique<VoterRecord>> {
    self.inner.insert_voter(voter).await
  }
  async fn get_voter(&self, id: Uuid) -> crate::Result<Option<VoterRecord>> { self.inner.get_voter(id).await }
  async fn save_voter(&self, voter: &VoterRecord) -> crate::Result<Unique<bool>> {
    if self.broken_roster == Some(voter.leader_id) {
      return Err(crate::Error::Database(tokio_rusqlite::Error::ConnectionClosed));
    }
    self.inner.save_voter(voter).await
  }
  async fn list_voters(&self, filter: &VoterFilter) -> crate::Result<Vec<VoterRecord>> {
    self.inner.list_voters(filter).await
  }
  async fn delete_voter(&self, id: Uuid) -> crate::Result<bool> { self.inner.delete_voter(id).await }
}
