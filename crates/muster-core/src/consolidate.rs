//! Merging identities that share a document number.
//!
//! For every group of identities with the same (trimmed) document, one
//! survivor is chosen and everything the others own is moved onto it, one
//! row at a time. A duplicate identity is deleted only after all of its
//! meetings, roster entries and managed identities have been moved. A
//! failing group is logged and skipped; the pass can be re-run safely.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  identity::{Identity, Role},
  meeting::{LeaderSnapshot, MeetingFilter},
  store::{FieldStore, Unique},
  voter::VoterFilter,
};

/// Outcome of one consolidation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConsolidationReport {
  /// Document numbers held by more than one identity.
  pub groups: usize,
  /// Duplicate identities merged and deleted.
  pub merged: usize,
  /// Groups abandoned after an error.
  pub failed: usize,
}

/// Survivor priority: the seed administrator, then a `god` identity, then the
/// oldest identity, then the smallest id.
pub fn pick_survivor(group: &[Identity]) -> Option<&Identity> {
  group
    .iter()
    .min_by_key(|i| (!i.is_seed, !i.has_role(Role::God), i.created_at, i.identity_id))
}

/// Identities grouped by document, keeping only groups with duplicates.
pub fn duplicate_groups(identities: Vec<Identity>) -> BTreeMap<String, Vec<Identity>> {
  let mut groups: BTreeMap<String, Vec<Identity>> = BTreeMap::new();
  for identity in identities {
    if let Some(key) = identity.document_key() {
      groups.entry(key.to_owned()).or_default().push(identity);
    }
  }
  groups.retain(|_, members| members.len() > 1);
  groups
}

/// Run one consolidation pass over every identity in the store.
pub async fn run<S: FieldStore>(store: &S) -> Result<ConsolidationReport> {
  let identities = store.list_identities().await.map_err(Error::store)?;
  let groups = duplicate_groups(identities);

  let mut report = ConsolidationReport { groups: groups.len(), ..Default::default() };
  for (document, members) in &groups {
    let Some(survivor) = pick_survivor(members) else { continue };
    tracing::info!(
      %document,
      survivor = %survivor.identity_id,
      duplicates = members.len() - 1,
      "consolidating identities"
    );

    for duplicate in members.iter().filter(|m| m.identity_id != survivor.identity_id) {
      match merge_into(store, survivor, duplicate).await {
        Ok(()) => report.merged += 1,
        Err(e) => {
          tracing::error!(
            %document,
            survivor = %survivor.identity_id,
            duplicate = %duplicate.identity_id,
            error = %e,
            "identity consolidation failed; group skipped"
          );
          report.failed += 1;
          break;
        }
      }
    }
  }

  tracing::info!(
    groups = report.groups,
    merged = report.merged,
    failed = report.failed,
    "identity consolidation finished"
  );
  Ok(report)
}

/// Move everything `duplicate` owns onto `survivor`, then delete it.
async fn merge_into<S: FieldStore>(store: &S, survivor: &Identity, duplicate: &Identity) -> Result<()> {
  let from = duplicate.identity_id;
  let to = survivor.identity_id;

  // Meetings: each row saved on its own, with the owner snapshot refreshed.
  let owned = MeetingFilter { leader_ids: Some(vec![from]), ..Default::default() };
  let meetings = store.list_meetings(&owned).await.map_err(Error::store)?;
  let snapshot = LeaderSnapshot::of(survivor);
  for mut meeting in meetings {
    meeting.leader_id = to;
    meeting.leader = snapshot.clone();
    if !store.save_meeting(&meeting).await.map_err(Error::store)? {
      tracing::debug!(meeting_id = %meeting.meeting_id, "meeting vanished during consolidation");
    }
  }

  // Roster entries: the survivor's own entry wins a document clash.
  let roster = VoterFilter { leader_ids: Some(vec![from]), text: None };
  let voters = store.list_voters(&roster).await.map_err(Error::store)?;
  for mut voter in voters {
    voter.leader_id = to;
    voter.updated_at = chrono::Utc::now();
    match store.save_voter(&voter).await.map_err(Error::store)? {
      Unique::Written(_) => {}
      Unique::Duplicate => {
        store.delete_voter(voter.voter_id).await.map_err(Error::store)?;
        tracing::debug!(voter_id = %voter.voter_id, "dropped roster entry already held by survivor");
      }
    }
  }

  // Leaders managed by the duplicate now report to the survivor.
  let managed = store.managed_identity_ids(from).await.map_err(Error::store)?;
  for id in managed {
    let manager = if id == to { None } else { Some(to) };
    store.set_manager(id, manager).await.map_err(Error::store)?;
  }

  if !store.delete_identity(from).await.map_err(Error::store)? {
    return Err(Error::NotFound(format!("identity {from} disappeared before deletion")));
  }
  tracing::info!(duplicate = %from, survivor = %to, "identity merged");
  Ok(())
}
