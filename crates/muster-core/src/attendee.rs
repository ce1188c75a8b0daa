//! Append-only sign-ups to a single meeting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::meeting::Meeting;

/// The contact fields collected by the public registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAttendee {
  pub name:      String,
  pub surname:   String,
  pub document:  String,
  pub phone:     String,
  #[serde(default)]
  pub email:     Option<String>,
  #[serde(default)]
  pub address:   Option<String>,
  #[serde(default)]
  pub consent:   bool,
  /// Base64-encoded signature image.
  #[serde(default)]
  pub signature: Option<String>,
}

/// A stored sign-up. `(meeting_id, document)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
  pub attendee_id: Uuid,
  pub meeting_id:  Uuid,
  pub name:        String,
  pub surname:     String,
  pub document:    String,
  pub phone:       String,
  pub email:       Option<String>,
  pub address:     Option<String>,
  pub consent:     bool,
  pub signature:   Option<String>,
  pub created_at:  DateTime<Utc>,
}

impl Attendee {
  pub fn from_input(meeting_id: Uuid, input: NewAttendee) -> Self {
    Self {
      attendee_id: Uuid::new_v4(),
      meeting_id,
      name: input.name,
      surname: input.surname,
      document: input.document,
      phone: input.phone,
      email: input.email,
      address: input.address,
      consent: input.consent,
      signature: input.signature,
      created_at: Utc::now(),
    }
  }
}

/// An attendee row joined with the meeting it signed up to.
///
/// Rows of the unique-person view are sightings: one per document, carrying
/// the representative meeting's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sighting {
  pub attendee: Attendee,
  pub meeting:  Meeting,
}
