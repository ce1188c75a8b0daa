//! RosterAggregator and RosterImporter, plus roster maintenance.
//!
//! The unique-person view reduces attendee rows to one sighting per
//! document. Importing copies selected sightings into a leader's voter
//! roster, skipping documents the roster already holds.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::{
  Error, Result,
  attendee::Sighting,
  identity::Caller,
  meeting::MeetingFilter,
  registry::authorize_owner,
  scope,
  store::{FieldStore, Unique},
  validate,
  voter::{VoterDetails, VoterFilter, VoterRecord},
};

// ─── Unique persons ──────────────────────────────────────────────────────────

/// One row per distinct document among the attendees visible to `caller`.
pub async fn list_unique<S: FieldStore>(
  store: &S,
  caller: &Caller,
  filter: MeetingFilter,
  leader: Option<Uuid>,
) -> Result<Vec<Sighting>> {
  let scope = scope::resolve(store, caller).await?;
  let filter = scope.apply(filter, leader)?;
  store.list_unique(&filter).await.map_err(Error::store)
}

// ─── Import ──────────────────────────────────────────────────────────────────

/// Copy the selected attendees into `owner`'s roster.
///
/// Each attendee must be visible to the caller. Documents already in the
/// roster are skipped, so repeating an import creates nothing; only the
/// newly created entries are returned.
pub async fn import<S: FieldStore>(
  store: &S,
  caller: &Caller,
  attendee_ids: Vec<Uuid>,
  owner: Uuid,
) -> Result<Vec<VoterRecord>> {
  authorize_owner(store, caller, owner).await?;
  let scope = scope::resolve(store, caller).await?;

  let wanted: BTreeSet<Uuid> = attendee_ids.into_iter().collect();
  let sightings: Vec<Sighting> = store
    .get_sightings(wanted.iter().copied().collect())
    .await
    .map_err(Error::store)?
    .into_iter()
    .filter(|s| scope.permits(s.meeting.leader_id))
    .collect();

  if sightings.len() != wanted.len() {
    let found: BTreeSet<Uuid> = sightings.iter().map(|s| s.attendee.attendee_id).collect();
    let missing: Vec<String> = wanted.difference(&found).map(Uuid::to_string).collect();
    return Err(Error::NotFound(format!("attendees not found: {}", missing.join(", "))));
  }

  let mut created = Vec::new();
  let mut skipped = 0usize;
  for sighting in &sightings {
    let document = sighting.attendee.document.as_str();
    if store.voter_exists(owner, document).await.map_err(Error::store)? {
      skipped += 1;
      continue;
    }
    match store
      .insert_voter(VoterRecord::from_sighting(owner, sighting))
      .await
      .map_err(Error::store)?
    {
      Unique::Written(voter) => created.push(voter),
      Unique::Duplicate => skipped += 1,
    }
  }

  tracing::info!(
    leader_id = %owner,
    created = created.len(),
    skipped,
    "attendees imported into roster"
  );
  Ok(created)
}

// ─── Roster maintenance ──────────────────────────────────────────────────────

fn normalise(mut details: VoterDetails) -> Result<VoterDetails> {
  details.document = details.document.trim().to_owned();
  validate::voter_details(&details)?;
  Ok(details)
}

fn duplicate_voter(document: &str) -> Error {
  Error::Conflict(format!("document {document} is already in this roster"))
}

/// Add an entry to `owner`'s roster by hand.
pub async fn create_voter<S: FieldStore>(
  store: &S,
  caller: &Caller,
  owner: Uuid,
  details: VoterDetails,
) -> Result<VoterRecord> {
  let details = normalise(details)?;
  authorize_owner(store, caller, owner).await?;

  let document = details.document.clone();
  match store
    .insert_voter(VoterRecord::new(owner, details))
    .await
    .map_err(Error::store)?
  {
    Unique::Written(voter) => Ok(voter),
    Unique::Duplicate => Err(duplicate_voter(&document)),
  }
}

/// Load a roster entry the caller is allowed to manage.
pub async fn get_voter<S: FieldStore>(store: &S, caller: &Caller, voter_id: Uuid) -> Result<VoterRecord> {
  let voter = store
    .get_voter(voter_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(format!("voter {voter_id} not found")))?;

  let scope = scope::resolve(store, caller).await?;
  if !scope.permits(voter.leader_id) {
    return Err(Error::NotFound(format!("voter {voter_id} not found")));
  }
  Ok(voter)
}

pub async fn update_voter<S: FieldStore>(
  store: &S,
  caller: &Caller,
  voter_id: Uuid,
  details: VoterDetails,
) -> Result<VoterRecord> {
  let details = normalise(details)?;
  let mut voter = get_voter(store, caller, voter_id).await?;
  authorize_owner(store, caller, voter.leader_id).await?;

  voter.details = details;
  voter.updated_at = chrono::Utc::now();
  match store.save_voter(&voter).await.map_err(Error::store)? {
    Unique::Written(true) => Ok(voter),
    Unique::Written(false) => Err(Error::NotFound(format!("voter {voter_id} not found"))),
    Unique::Duplicate => Err(duplicate_voter(&voter.details.document)),
  }
}

pub async fn delete_voter<S: FieldStore>(store: &S, caller: &Caller, voter_id: Uuid) -> Result<()> {
  let voter = get_voter(store, caller, voter_id).await?;
  authorize_owner(store, caller, voter.leader_id).await?;
  if !store.delete_voter(voter_id).await.map_err(Error::store)? {
    return Err(Error::NotFound(format!("voter {voter_id} not found")));
  }
  Ok(())
}

/// The caller's own roster, or the roster of `leader` when it lies inside
/// the caller's scope.
pub async fn list_voters<S: FieldStore>(
  store: &S,
  caller: &Caller,
  leader: Option<Uuid>,
  text: Option<String>,
) -> Result<Vec<VoterRecord>> {
  let owner = leader.unwrap_or(caller.id);
  if owner != caller.id {
    scope::resolve(store, caller).await?.check(owner)?;
  }
  let filter = VoterFilter {
    leader_ids: Some(vec![owner]),
    text:       text.filter(|t| !t.trim().is_empty()),
  };
  store.list_voters(&filter).await.map_err(Error::store)
}
