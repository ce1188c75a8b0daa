//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that lexical order in SQL equals time order.
//! Roles are stored as a JSON array of role names. UUIDs are stored as
//! hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use muster_core::{
  attendee::{Attendee, Sighting},
  identity::{Identity, Role},
  meeting::{LeaderSnapshot, Meeting, MeetingDetails},
  voter::{VoterDetails, VoterRecord},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Midnight UTC at the start of `date`.
pub fn encode_day_start(date: NaiveDate) -> String {
  encode_dt(date.and_time(chrono::NaiveTime::MIN).and_utc())
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Roles ───────────────────────────────────────────────────────────────────

pub fn encode_roles(roles: &[Role]) -> Result<String> {
  let names: Vec<&str> = roles.iter().map(|r| r.as_ref()).collect();
  Ok(serde_json::to_string(&names)?)
}

pub fn decode_roles(s: &str) -> Result<Vec<Role>> {
  let names: Vec<String> = serde_json::from_str(s)?;
  names
    .iter()
    .map(|n| Role::from_str(n).map_err(|_| Error::UnknownRole(n.clone())))
    .collect()
}

// ─── Column lists ────────────────────────────────────────────────────────────

pub const IDENTITY_COLUMNS: &str = "identity_id, document, display_name, phone, roles, \
   manager_id, is_seed, created_at";

pub const MEETING_COLUMNS: &str = "m.meeting_id, m.code, m.name, m.scheduled_at, \
   m.region, m.locality, m.district, m.neighborhood, m.leader_id, m.leader_name, \
   m.leader_document, m.leader_phone, m.created_at";

pub const ATTENDEE_COLUMNS: &str = "a.attendee_id, a.meeting_id, a.name, a.surname, \
   a.document, a.phone, a.email, a.address, a.consent, a.signature, a.created_at";
const ATTENDEE_WIDTH: usize = 11;

pub const VOTER_COLUMNS: &str = "voter_id, leader_id, name, surname, document, phone, \
   email, address, region, locality, district, voting_site, voting_table, \
   created_at, updated_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `identities` row.
pub struct RawIdentity {
  pub identity_id:  String,
  pub document:     Option<String>,
  pub display_name: String,
  pub phone:        Option<String>,
  pub roles:        String,
  pub manager_id:   Option<String>,
  pub is_seed:      bool,
  pub created_at:   String,
}

impl RawIdentity {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      identity_id:  row.get(0)?,
      document:     row.get(1)?,
      display_name: row.get(2)?,
      phone:        row.get(3)?,
      roles:        row.get(4)?,
      manager_id:   row.get(5)?,
      is_seed:      row.get(6)?,
      created_at:   row.get(7)?,
    })
  }

  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      identity_id:  decode_uuid(&self.identity_id)?,
      document:     self.document,
      display_name: self.display_name,
      phone:        self.phone,
      roles:        decode_roles(&self.roles)?,
      manager_id:   decode_opt_uuid(self.manager_id)?,
      is_seed:      self.is_seed,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read from the [`MEETING_COLUMNS`] of a row.
pub struct RawMeeting {
  pub meeting_id:      String,
  pub code:            String,
  pub name:            String,
  pub scheduled_at:    String,
  pub region:          Option<String>,
  pub locality:        Option<String>,
  pub district:        Option<String>,
  pub neighborhood:    Option<String>,
  pub leader_id:       String,
  pub leader_name:     String,
  pub leader_document: Option<String>,
  pub leader_phone:    Option<String>,
  pub created_at:      String,
}

impl RawMeeting {
  /// Read the meeting columns starting at column `at`.
  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      meeting_id:      row.get(at)?,
      code:            row.get(at + 1)?,
      name:            row.get(at + 2)?,
      scheduled_at:    row.get(at + 3)?,
      region:          row.get(at + 4)?,
      locality:        row.get(at + 5)?,
      district:        row.get(at + 6)?,
      neighborhood:    row.get(at + 7)?,
      leader_id:       row.get(at + 8)?,
      leader_name:     row.get(at + 9)?,
      leader_document: row.get(at + 10)?,
      leader_phone:    row.get(at + 11)?,
      created_at:      row.get(at + 12)?,
    })
  }

  pub fn into_meeting(self) -> Result<Meeting> {
    Ok(Meeting {
      meeting_id: decode_uuid(&self.meeting_id)?,
      code:       self.code,
      details:    MeetingDetails {
        name:         self.name,
        scheduled_at: decode_dt(&self.scheduled_at)?,
        region:       self.region,
        locality:     self.locality,
        district:     self.district,
        neighborhood: self.neighborhood,
      },
      leader_id:  decode_uuid(&self.leader_id)?,
      leader:     LeaderSnapshot {
        name:     self.leader_name,
        document: self.leader_document,
        phone:    self.leader_phone,
      },
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read from the [`ATTENDEE_COLUMNS`] of a row.
pub struct RawAttendee {
  pub attendee_id: String,
  pub meeting_id:  String,
  pub name:        String,
  pub surname:     String,
  pub document:    String,
  pub phone:       String,
  pub email:       Option<String>,
  pub address:     Option<String>,
  pub consent:     bool,
  pub signature:   Option<String>,
  pub created_at:  String,
}

impl RawAttendee {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      attendee_id: row.get(0)?,
      meeting_id:  row.get(1)?,
      name:        row.get(2)?,
      surname:     row.get(3)?,
      document:    row.get(4)?,
      phone:       row.get(5)?,
      email:       row.get(6)?,
      address:     row.get(7)?,
      consent:     row.get(8)?,
      signature:   row.get(9)?,
      created_at:  row.get(10)?,
    })
  }

  pub fn into_attendee(self) -> Result<Attendee> {
    Ok(Attendee {
      attendee_id: decode_uuid(&self.attendee_id)?,
      meeting_id:  decode_uuid(&self.meeting_id)?,
      name:        self.name,
      surname:     self.surname,
      document:    self.document,
      phone:       self.phone,
      email:       self.email,
      address:     self.address,
      consent:     self.consent,
      signature:   self.signature,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// An attendee row followed by its meeting's columns.
pub struct RawSighting {
  pub attendee: RawAttendee,
  pub meeting:  RawMeeting,
}

impl RawSighting {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      attendee: RawAttendee::read(row)?,
      meeting:  RawMeeting::read(row, ATTENDEE_WIDTH)?,
    })
  }

  pub fn into_sighting(self) -> Result<Sighting> {
    Ok(Sighting {
      attendee: self.attendee.into_attendee()?,
      meeting:  self.meeting.into_meeting()?,
    })
  }
}

/// Raw values read directly from a `voters` row.
pub struct RawVoter {
  pub voter_id:     String,
  pub leader_id:    String,
  pub name:         String,
  pub surname:      String,
  pub document:     String,
  pub phone:        Option<String>,
  pub email:        Option<String>,
  pub address:      Option<String>,
  pub region:       Option<String>,
  pub locality:     Option<String>,
  pub district:     Option<String>,
  pub voting_site:  Option<String>,
  pub voting_table: Option<String>,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawVoter {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      voter_id:     row.get(0)?,
      leader_id:    row.get(1)?,
      name:         row.get(2)?,
      surname:      row.get(3)?,
      document:     row.get(4)?,
      phone:        row.get(5)?,
      email:        row.get(6)?,
      address:      row.get(7)?,
      region:       row.get(8)?,
      locality:     row.get(9)?,
      district:     row.get(10)?,
      voting_site:  row.get(11)?,
      voting_table: row.get(12)?,
      created_at:   row.get(13)?,
      updated_at:   row.get(14)?,
    })
  }

  pub fn into_voter(self) -> Result<VoterRecord> {
    Ok(VoterRecord {
      voter_id:   decode_uuid(&self.voter_id)?,
      leader_id:  decode_uuid(&self.leader_id)?,
      details:    VoterDetails {
        name:         self.name,
        surname:      self.surname,
        document:     self.document,
        phone:        self.phone,
        email:        self.email,
        address:      self.address,
        region:       self.region,
        locality:     self.locality,
        district:     self.district,
        voting_site:  self.voting_site,
        voting_table: self.voting_table,
      },
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
