//! Code-identified organizing events, each owned by one leader.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::Identity;

// ─── Owner snapshot ──────────────────────────────────────────────────────────

/// A materialised copy of the owning leader's contact details.
///
/// Taken when the meeting is created and rewritten only when the
/// consolidation pass moves the meeting to another identity. It is never a
/// live join against the identity row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderSnapshot {
  pub name:     String,
  pub document: Option<String>,
  pub phone:    Option<String>,
}

impl LeaderSnapshot {
  pub fn of(identity: &Identity) -> Self {
    Self {
      name:     identity.display_name.clone(),
      document: identity.document.clone(),
      phone:    identity.phone.clone(),
    }
  }
}

// ─── Meeting ─────────────────────────────────────────────────────────────────

/// The caller-editable part of a meeting: name, schedule and location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingDetails {
  pub name:         String,
  pub scheduled_at: DateTime<Utc>,
  #[serde(default)]
  pub region:       Option<String>,
  #[serde(default)]
  pub locality:     Option<String>,
  #[serde(default)]
  pub district:     Option<String>,
  #[serde(default)]
  pub neighborhood: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
  pub meeting_id: Uuid,
  /// Globally unique and fixed for the meeting's lifetime.
  pub code:       String,
  #[serde(flatten)]
  pub details:    MeetingDetails,
  pub leader_id:  Uuid,
  pub leader:     LeaderSnapshot,
  pub created_at: DateTime<Utc>,
}

impl Meeting {
  /// The public self-registration URL, `{base_url}/meetings/{code}`.
  pub fn registration_url(&self, base_url: &str) -> String {
    registration_url(base_url, &self.code)
  }
}

pub fn registration_url(base_url: &str, code: &str) -> String {
  format!("{}/meetings/{code}", base_url.trim_end_matches('/'))
}

/// Input to [`crate::registry::create_meeting`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMeeting {
  #[serde(flatten)]
  pub details: MeetingDetails,
  /// Snapshot supplied by the caller. Any field left empty is loaded from the
  /// owner's identity record.
  #[serde(default)]
  pub leader:  Option<LeaderSnapshot>,
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Predicates shared by meeting listing and the unique-person view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingFilter {
  /// Inclusive lower bound on the scheduled date.
  pub date_start: Option<NaiveDate>,
  /// Inclusive upper bound on the scheduled date.
  pub date_end:   Option<NaiveDate>,
  /// Substring matched against region, locality, district or neighborhood.
  pub location:   Option<String>,
  pub region:     Option<String>,
  pub locality:   Option<String>,
  pub meeting_id: Option<Uuid>,
  /// Owning leaders. `None` means no leader restriction; an empty set
  /// matches nothing.
  pub leader_ids: Option<Vec<Uuid>>,
}
