//! The SQLite implementation of [`FieldStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, ffi, params, params_from_iter};
use uuid::Uuid;

use muster_core::{
  attendee::{Attendee, Sighting},
  identity::Identity,
  meeting::{Meeting, MeetingFilter},
  store::{FieldStore, Unique},
  voter::{VoterFilter, VoterRecord},
};

use crate::{
  Result,
  encode::{
    ATTENDEE_COLUMNS, IDENTITY_COLUMNS, MEETING_COLUMNS, RawAttendee, RawIdentity,
    RawMeeting, RawSighting, RawVoter, VOTER_COLUMNS, decode_uuid, encode_dt, encode_roles,
    encode_uuid,
  },
  query::{meeting_conditions, voter_conditions},
  schema::SCHEMA,
};

/// True when `err` is a UNIQUE or PRIMARY KEY constraint violation.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.code == rusqlite::ErrorCode::ConstraintViolation
        && (e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
          || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
  )
}

/// Run an insert or update, mapping a uniqueness violation to `Duplicate`.
fn guarded(result: rusqlite::Result<usize>) -> rusqlite::Result<Unique<usize>> {
  match result {
    Ok(n) => Ok(Unique::Written(n)),
    Err(e) if is_unique_violation(&e) => Ok(Unique::Duplicate),
    Err(e) => Err(e),
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A muster field store backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a fresh in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_meetings(&self, sql: String, params: Vec<rusqlite::types::Value>) -> Result<Vec<Meeting>> {
    let raws: Vec<RawMeeting> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(params), |row| RawMeeting::read(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMeeting::into_meeting).collect()
  }

  async fn query_sightings(&self, sql: String, params: Vec<rusqlite::types::Value>) -> Result<Vec<Sighting>> {
    let raws: Vec<RawSighting> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(params), RawSighting::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSighting::into_sighting).collect()
  }

  async fn exists(&self, sql: &'static str, params: Vec<String>) -> Result<bool> {
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(sql, params_from_iter(params), |_| Ok(()))
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(found)
  }
}

// ─── FieldStore impl ─────────────────────────────────────────────────────────

impl FieldStore for SqliteStore {
  type Error = crate::Error;

  // ── Identities ────────────────────────────────────────────────────────────

  async fn put_identity(&self, identity: Identity) -> Result<Identity> {
    let id_str      = encode_uuid(identity.identity_id);
    let document    = identity.document.clone();
    let name        = identity.display_name.clone();
    let phone       = identity.phone.clone();
    let roles_str   = encode_roles(&identity.roles)?;
    let manager_str = identity.manager_id.map(encode_uuid);
    let is_seed     = identity.is_seed;
    let at_str      = encode_dt(identity.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO identities (
             identity_id, document, display_name, phone, roles, manager_id, is_seed, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT (identity_id) DO UPDATE SET
             document     = excluded.document,
             display_name = excluded.display_name,
             phone        = excluded.phone,
             roles        = excluded.roles,
             manager_id   = excluded.manager_id,
             is_seed      = excluded.is_seed",
          params![id_str, document, name, phone, roles_str, manager_str, is_seed, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(identity)
  }

  async fn get_identity(&self, id: Uuid) -> Result<Option<Identity>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE identity_id = ?1"),
              params![id_str],
              RawIdentity::read,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIdentity::into_identity).transpose()
  }

  async fn list_identities(&self) -> Result<Vec<Identity>> {
    let raws: Vec<RawIdentity> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {IDENTITY_COLUMNS} FROM identities ORDER BY created_at, identity_id"
        ))?;
        let rows = stmt
          .query_map([], RawIdentity::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIdentity::into_identity).collect()
  }

  async fn managed_identity_ids(&self, manager_id: Uuid) -> Result<Vec<Uuid>> {
    let manager_str = encode_uuid(manager_id);

    let ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare("SELECT identity_id FROM identities WHERE manager_id = ?1 ORDER BY identity_id")?;
        let rows = stmt
          .query_map(params![manager_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    ids.iter().map(|s| decode_uuid(s)).collect()
  }

  async fn set_manager(&self, id: Uuid, manager_id: Option<Uuid>) -> Result<bool> {
    let id_str      = encode_uuid(id);
    let manager_str = manager_id.map(encode_uuid);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE identities SET manager_id = ?2 WHERE identity_id = ?1",
          params![id_str, manager_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete_identity(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM identities WHERE identity_id = ?1", params![id_str])?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Meetings ──────────────────────────────────────────────────────────────

  async fn meeting_code_exists(&self, code: &str) -> Result<bool> {
    self
      .exists("SELECT 1 FROM meetings WHERE code = ?1", vec![code.to_owned()])
      .await
  }

  async fn insert_meeting(&self, meeting: Meeting) -> Result<Unique<Meeting>> {
    let id_str       = encode_uuid(meeting.meeting_id);
    let code         = meeting.code.clone();
    let d            = meeting.details.clone();
    let scheduled    = encode_dt(d.scheduled_at);
    let leader_str   = encode_uuid(meeting.leader_id);
    let snapshot     = meeting.leader.clone();
    let created_str  = encode_dt(meeting.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        Ok(guarded(conn.execute(
          "INSERT INTO meetings (
             meeting_id, code, name, scheduled_at, region, locality, district, neighborhood,
             leader_id, leader_name, leader_document, leader_phone, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
          params![
            id_str,
            code,
            d.name,
            scheduled,
            d.region,
            d.locality,
            d.district,
            d.neighborhood,
            leader_str,
            snapshot.name,
            snapshot.document,
            snapshot.phone,
            created_str,
          ],
        ))?)
      })
      .await?;

    Ok(match outcome {
      Unique::Written(_) => Unique::Written(meeting),
      Unique::Duplicate => Unique::Duplicate,
    })
  }

  async fn get_meeting(&self, id: Uuid) -> Result<Option<Meeting>> {
    let sql = format!("SELECT {MEETING_COLUMNS} FROM meetings m WHERE m.meeting_id = ?");
    let mut found = self
      .query_meetings(sql, vec![rusqlite::types::Value::Text(encode_uuid(id))])
      .await?;
    Ok(found.pop())
  }

  async fn get_meeting_by_code(&self, code: &str) -> Result<Option<Meeting>> {
    let sql = format!("SELECT {MEETING_COLUMNS} FROM meetings m WHERE m.code = ?");
    let mut found = self
      .query_meetings(sql, vec![rusqlite::types::Value::Text(code.to_owned())])
      .await?;
    Ok(found.pop())
  }

  async fn save_meeting(&self, meeting: &Meeting) -> Result<bool> {
    let id_str     = encode_uuid(meeting.meeting_id);
    let d          = meeting.details.clone();
    let scheduled  = encode_dt(d.scheduled_at);
    let leader_str = encode_uuid(meeting.leader_id);
    let snapshot   = meeting.leader.clone();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE meetings SET
             name = ?2, scheduled_at = ?3, region = ?4, locality = ?5, district = ?6,
             neighborhood = ?7, leader_id = ?8, leader_name = ?9, leader_document = ?10,
             leader_phone = ?11
           WHERE meeting_id = ?1",
          params![
            id_str,
            d.name,
            scheduled,
            d.region,
            d.locality,
            d.district,
            d.neighborhood,
            leader_str,
            snapshot.name,
            snapshot.document,
            snapshot.phone,
          ],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn list_meetings(&self, filter: &MeetingFilter) -> Result<Vec<Meeting>> {
    let conds = meeting_conditions(filter);
    let sql = format!(
      "SELECT {MEETING_COLUMNS} FROM meetings m {}
       ORDER BY m.scheduled_at DESC, m.created_at DESC",
      conds.where_clause()
    );
    self.query_meetings(sql, conds.into_params()).await
  }

  async fn delete_meetings(&self, ids: Vec<Uuid>, leader_ids: Option<Vec<Uuid>>) -> Result<usize> {
    // One statement per id; attendees go with their meeting via ON DELETE CASCADE.
    let statements: Vec<(String, Vec<rusqlite::types::Value>)> = ids
      .into_iter()
      .map(|id| {
        let filter = MeetingFilter {
          meeting_id: Some(id),
          leader_ids: leader_ids.clone(),
          ..Default::default()
        };
        let conds = meeting_conditions(&filter);
        let sql = format!(
          "DELETE FROM meetings WHERE meeting_id IN (SELECT m.meeting_id FROM meetings m {})",
          conds.where_clause()
        );
        (sql, conds.into_params())
      })
      .collect();

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut removed = 0;
        for (sql, params) in statements {
          removed += tx.execute(&sql, params_from_iter(params))?;
        }
        tx.commit()?;
        Ok(removed)
      })
      .await?;
    Ok(removed)
  }

  // ── Attendees ─────────────────────────────────────────────────────────────

  async fn attendee_exists(&self, meeting_id: Uuid, document: &str) -> Result<bool> {
    self
      .exists(
        "SELECT 1 FROM attendees WHERE meeting_id = ?1 AND document = ?2",
        vec![encode_uuid(meeting_id), document.to_owned()],
      )
      .await
  }

  async fn insert_attendee(&self, attendee: Attendee) -> Result<Unique<Attendee>> {
    let a           = attendee.clone();
    let id_str      = encode_uuid(a.attendee_id);
    let meeting_str = encode_uuid(a.meeting_id);
    let at_str      = encode_dt(a.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        Ok(guarded(conn.execute(
          "INSERT INTO attendees (
             attendee_id, meeting_id, name, surname, document, phone,
             email, address, consent, signature, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          params![
            id_str,
            meeting_str,
            a.name,
            a.surname,
            a.document,
            a.phone,
            a.email,
            a.address,
            a.consent,
            a.signature,
            at_str,
          ],
        ))?)
      })
      .await?;

    Ok(match outcome {
      Unique::Written(_) => Unique::Written(attendee),
      Unique::Duplicate => Unique::Duplicate,
    })
  }

  async fn list_attendees(&self, meeting_id: Uuid) -> Result<Vec<Attendee>> {
    let meeting_str = encode_uuid(meeting_id);

    let raws: Vec<RawAttendee> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ATTENDEE_COLUMNS} FROM attendees a
           WHERE a.meeting_id = ?1
           ORDER BY a.created_at, a.attendee_id"
        ))?;
        let rows = stmt
          .query_map(params![meeting_str], RawAttendee::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAttendee::into_attendee).collect()
  }

  async fn get_sightings(&self, attendee_ids: Vec<Uuid>) -> Result<Vec<Sighting>> {
    if attendee_ids.is_empty() {
      return Ok(Vec::new());
    }
    let marks = vec!["?"; attendee_ids.len()].join(", ");
    let sql = format!(
      "SELECT {ATTENDEE_COLUMNS}, {MEETING_COLUMNS}
       FROM attendees a JOIN meetings m ON m.meeting_id = a.meeting_id
       WHERE a.attendee_id IN ({marks})
       ORDER BY a.created_at, a.attendee_id"
    );
    let params = attendee_ids
      .into_iter()
      .map(|id| rusqlite::types::Value::Text(encode_uuid(id)))
      .collect();
    self.query_sightings(sql, params).await
  }

  async fn list_unique(&self, filter: &MeetingFilter) -> Result<Vec<Sighting>> {
    let conds = meeting_conditions(filter);
    let sql = format!(
      "WITH ranked AS (
         SELECT a.attendee_id AS attendee_id,
                ROW_NUMBER() OVER (
                  PARTITION BY a.document
                  ORDER BY m.scheduled_at DESC, a.created_at DESC, a.attendee_id DESC
                ) AS pos
         FROM attendees a JOIN meetings m ON m.meeting_id = a.meeting_id
         {}
       )
       SELECT {ATTENDEE_COLUMNS}, {MEETING_COLUMNS}
       FROM ranked r
       JOIN attendees a ON a.attendee_id = r.attendee_id
       JOIN meetings  m ON m.meeting_id  = a.meeting_id
       WHERE r.pos = 1
       ORDER BY m.scheduled_at DESC, a.surname, a.name, a.document",
      conds.where_clause()
    );
    self.query_sightings(sql, conds.into_params()).await
  }

  // ── Voters ────────────────────────────────────────────────────────────────

  async fn voter_exists(&self, leader_id: Uuid, document: &str) -> Result<bool> {
    self
      .exists(
        "SELECT 1 FROM voters WHERE leader_id = ?1 AND document = ?2",
        vec![encode_uuid(leader_id), document.to_owned()],
      )
      .await
  }

  async fn insert_voter(&self, voter: VoterRecord) -> Result<Unique<VoterRecord>> {
    let id_str     = encode_uuid(voter.voter_id);
    let leader_str = encode_uuid(voter.leader_id);
    let d          = voter.details.clone();
    let created    = encode_dt(voter.created_at);
    let updated    = encode_dt(voter.updated_at);

    let outcome = self
      .conn
      .call(move |conn| {
        Ok(guarded(conn.execute(
          &format!(
            "INSERT INTO voters ({VOTER_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
          ),
          params![
            id_str,
            leader_str,
            d.name,
            d.surname,
            d.document,
            d.phone,
            d.email,
            d.address,
            d.region,
            d.locality,
            d.district,
            d.voting_site,
            d.voting_table,
            created,
            updated,
          ],
        ))?)
      })
      .await?;

    Ok(match outcome {
      Unique::Written(_) => Unique::Written(voter),
      Unique::Duplicate => Unique::Duplicate,
    })
  }

  async fn get_voter(&self, id: Uuid) -> Result<Option<VoterRecord>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawVoter> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {VOTER_COLUMNS} FROM voters WHERE voter_id = ?1"),
              params![id_str],
              RawVoter::read,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVoter::into_voter).transpose()
  }

  async fn save_voter(&self, voter: &VoterRecord) -> Result<Unique<bool>> {
    let id_str     = encode_uuid(voter.voter_id);
    let leader_str = encode_uuid(voter.leader_id);
    let d          = voter.details.clone();
    let updated    = encode_dt(voter.updated_at);

    let outcome = self
      .conn
      .call(move |conn| {
        Ok(guarded(conn.execute(
          "UPDATE voters SET
             leader_id = ?2, name = ?3, surname = ?4, document = ?5, phone = ?6,
             email = ?7, address = ?8, region = ?9, locality = ?10, district = ?11,
             voting_site = ?12, voting_table = ?13, updated_at = ?14
           WHERE voter_id = ?1",
          params![
            id_str,
            leader_str,
            d.name,
            d.surname,
            d.document,
            d.phone,
            d.email,
            d.address,
            d.region,
            d.locality,
            d.district,
            d.voting_site,
            d.voting_table,
            updated,
          ],
        ))?)
      })
      .await?;

    Ok(match outcome {
      Unique::Written(n) => Unique::Written(n > 0),
      Unique::Duplicate => Unique::Duplicate,
    })
  }

  async fn list_voters(&self, filter: &VoterFilter) -> Result<Vec<VoterRecord>> {
    let conds = voter_conditions(filter);
    let sql = format!(
      "SELECT {VOTER_COLUMNS} FROM voters {}
       ORDER BY surname, name, document",
      conds.where_clause()
    );
    let params = conds.into_params();

    let raws: Vec<RawVoter> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(params), RawVoter::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVoter::into_voter).collect()
  }

  async fn delete_voter(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM voters WHERE voter_id = ?1", params![id_str])?)
      })
      .await?;
    Ok(removed > 0)
  }
}
