//! Meeting creation, lookup, listing and deletion.

use uuid::Uuid;

use crate::{
  Error, Result,
  code::CodeGenerator,
  identity::Caller,
  meeting::{LeaderSnapshot, Meeting, MeetingDetails, MeetingFilter, NewMeeting},
  scope::{self, AccessScope},
  store::{FieldStore, Unique},
  validate,
};

/// Candidate codes drawn before giving up on a single creation.
pub const MAX_CODE_ATTEMPTS: usize = 16;

/// Check that `caller` may write data owned by `owner`.
///
/// Owners may always write their own data. Administrators may write anyone's;
/// coordinators only that of leaders inside their scope.
pub(crate) async fn authorize_owner<S: FieldStore>(
  store: &S,
  caller: &Caller,
  owner: Uuid,
) -> Result<()> {
  if caller.id == owner || caller.is_administrator() {
    return Ok(());
  }
  if !caller.can_act_for_others() {
    return Err(Error::Forbidden(format!(
      "cannot act on behalf of leader {owner}"
    )));
  }
  scope::resolve_writes(store, caller).await?.check(owner)
}

/// Create a meeting owned by `owner` and give it a fresh unique code.
///
/// The store's unique constraint on the code is authoritative: the
/// existence check only avoids pointless inserts, and an insert that loses a
/// race with a concurrent creation simply draws another code.
pub async fn create_meeting<S, G>(
  store: &S,
  codes: &G,
  caller: &Caller,
  owner: Uuid,
  input: NewMeeting,
) -> Result<Meeting>
where
  S: FieldStore,
  G: CodeGenerator + ?Sized,
{
  validate::meeting_details(&input.details)?;
  authorize_owner(store, caller, owner).await?;

  let identity = store
    .get_identity(owner)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(format!("leader {owner} not found")))?;

  if identity.document_key().is_none() && !caller.can_act_for_others() {
    return Err(Error::PreconditionFailed(
      "leader must have an identity document before organizing meetings".into(),
    ));
  }

  let stored = LeaderSnapshot::of(&identity);
  let leader = match input.leader {
    Some(given) => LeaderSnapshot {
      name:     if given.name.trim().is_empty() { stored.name } else { given.name },
      document: given.document.filter(|d| !d.trim().is_empty()).or(stored.document),
      phone:    given.phone.filter(|p| !p.trim().is_empty()).or(stored.phone),
    },
    None => stored,
  };

  let mut meeting = Meeting {
    meeting_id: Uuid::new_v4(),
    code: String::new(),
    details: input.details,
    leader_id: owner,
    leader,
    created_at: chrono::Utc::now(),
  };

  for attempt in 1..=MAX_CODE_ATTEMPTS {
    let code = codes.generate();
    if store.meeting_code_exists(&code).await.map_err(Error::store)? {
      tracing::debug!(%code, attempt, "meeting code already taken");
      continue;
    }

    meeting.code = code;
    match store.insert_meeting(meeting.clone()).await.map_err(Error::store)? {
      Unique::Written(created) => {
        tracing::info!(
          meeting_id = %created.meeting_id,
          code = %created.code,
          leader_id = %created.leader_id,
          "meeting created"
        );
        return Ok(created);
      }
      Unique::Duplicate => {
        tracing::warn!(code = %meeting.code, attempt, "meeting code lost a concurrent insert");
      }
    }
  }

  Err(Error::Conflict(format!(
    "no unused meeting code found after {MAX_CODE_ATTEMPTS} attempts"
  )))
}

/// Public lookup used by the self-registration page.
pub async fn find_by_code<S: FieldStore>(store: &S, code: &str) -> Result<Meeting> {
  store
    .get_meeting_by_code(code.trim())
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(format!("invalid meeting code {code:?}")))
}

/// A meeting by id, hidden as `NotFound` when it lies outside `scope`.
pub async fn get_scoped<S: FieldStore>(
  store: &S,
  scope: &AccessScope,
  meeting_id: Uuid,
) -> Result<Meeting> {
  store
    .get_meeting(meeting_id)
    .await
    .map_err(Error::store)?
    .filter(|m| scope.permits(m.leader_id))
    .ok_or_else(|| Error::NotFound(format!("meeting {meeting_id} not found")))
}

/// List meetings visible to `caller`. `leader` narrows the result to one
/// leader and must itself be in scope.
pub async fn list<S: FieldStore>(
  store: &S,
  caller: &Caller,
  filter: MeetingFilter,
  leader: Option<Uuid>,
) -> Result<Vec<Meeting>> {
  let scope = scope::resolve(store, caller).await?;
  let filter = scope.apply(filter, leader)?;
  store.list_meetings(&filter).await.map_err(Error::store)
}

/// Replace a meeting's name, schedule and location. The code and owner
/// snapshot are left untouched.
pub async fn update_details<S: FieldStore>(
  store: &S,
  caller: &Caller,
  meeting_id: Uuid,
  details: MeetingDetails,
) -> Result<Meeting> {
  validate::meeting_details(&details)?;
  let scope = scope::resolve(store, caller).await?;
  let mut meeting = get_scoped(store, &scope, meeting_id).await?;
  authorize_owner(store, caller, meeting.leader_id).await?;

  meeting.details = details;
  if !store.save_meeting(&meeting).await.map_err(Error::store)? {
    return Err(Error::NotFound(format!("meeting {meeting_id} not found")));
  }
  Ok(meeting)
}

/// Delete meetings and their attendees. Coordinators may only delete inside
/// their scope; ids outside it are left alone. Returns the number deleted.
pub async fn delete_many<S: FieldStore>(
  store: &S,
  caller: &Caller,
  ids: Vec<Uuid>,
) -> Result<usize> {
  if !caller.can_delete_meetings() {
    return Err(Error::Forbidden("deleting meetings requires an administrative role".into()));
  }
  let within = scope::resolve_writes(store, caller).await?.leader_ids();

  let deleted = store.delete_meetings(ids, within).await.map_err(Error::store)?;
  tracing::info!(caller = %caller.id, deleted, "meetings deleted");
  Ok(deleted)
}

/// Delete one meeting; `NotFound` if nothing visible was removed.
pub async fn delete_one<S: FieldStore>(store: &S, caller: &Caller, meeting_id: Uuid) -> Result<()> {
  match delete_many(store, caller, vec![meeting_id]).await? {
    0 => Err(Error::NotFound(format!("meeting {meeting_id} not found"))),
    _ => Ok(()),
  }
}
