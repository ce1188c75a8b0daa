//! Voter roster entries, one roster per leader.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attendee::Sighting;

/// Editable fields of a roster entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterDetails {
  pub name:         String,
  pub surname:      String,
  pub document:     String,
  #[serde(default)]
  pub phone:        Option<String>,
  #[serde(default)]
  pub email:        Option<String>,
  #[serde(default)]
  pub address:      Option<String>,
  #[serde(default)]
  pub region:       Option<String>,
  #[serde(default)]
  pub locality:     Option<String>,
  #[serde(default)]
  pub district:     Option<String>,
  #[serde(default)]
  pub voting_site:  Option<String>,
  #[serde(default)]
  pub voting_table: Option<String>,
}

/// A durable roster entry. `(leader_id, document)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
  pub voter_id:   Uuid,
  pub leader_id:  Uuid,
  #[serde(flatten)]
  pub details:    VoterDetails,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl VoterRecord {
  pub fn new(leader_id: Uuid, details: VoterDetails) -> Self {
    let now = Utc::now();
    Self {
      voter_id: Uuid::new_v4(),
      leader_id,
      details,
      created_at: now,
      updated_at: now,
    }
  }

  /// Build a roster entry from an attendee sighting. Location comes from the
  /// meeting the attendee signed up to.
  pub fn from_sighting(leader_id: Uuid, sighting: &Sighting) -> Self {
    let a = &sighting.attendee;
    let m = &sighting.meeting.details;
    Self::new(leader_id, VoterDetails {
      name:         a.name.clone(),
      surname:      a.surname.clone(),
      document:     a.document.clone(),
      phone:        Some(a.phone.clone()),
      email:        a.email.clone(),
      address:      a.address.clone(),
      region:       m.region.clone(),
      locality:     m.locality.clone(),
      district:     m.district.clone(),
      voting_site:  None,
      voting_table: None,
    })
  }
}

/// Parameters for [`crate::store::FieldStore::list_voters`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoterFilter {
  /// Roster owners. `None` means every roster; an empty set matches nothing.
  pub leader_ids: Option<Vec<Uuid>>,
  /// Substring matched against name, surname or document.
  pub text:       Option<String>,
}
