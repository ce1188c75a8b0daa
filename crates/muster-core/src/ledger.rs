//! Public sign-ups and scoped attendee listings.

use uuid::Uuid;

use crate::{
  Error, Result,
  attendee::{Attendee, NewAttendee},
  identity::Caller,
  registry,
  scope,
  store::{FieldStore, Unique},
  validate,
};

pub const ALREADY_REGISTERED: &str = "already registered";

/// Sign an attendee up to the meeting with `code`. Unauthenticated.
///
/// Fails with `NotFound` for an unknown code and with `Conflict` when the
/// document already signed up to that meeting, whether the duplicate is seen
/// by the pre-check or rejected by the store.
pub async fn register<S: FieldStore>(
  store: &S,
  code: &str,
  mut input: NewAttendee,
) -> Result<Attendee> {
  input.document = input.document.trim().to_owned();
  validate::new_attendee(&input)?;

  let meeting = registry::find_by_code(store, code).await?;

  if store
    .attendee_exists(meeting.meeting_id, &input.document)
    .await
    .map_err(Error::store)?
  {
    return Err(Error::Conflict(ALREADY_REGISTERED.into()));
  }

  let attendee = Attendee::from_input(meeting.meeting_id, input);
  match store.insert_attendee(attendee).await.map_err(Error::store)? {
    Unique::Written(attendee) => {
      tracing::info!(
        meeting_id = %attendee.meeting_id,
        attendee_id = %attendee.attendee_id,
        "attendee registered"
      );
      Ok(attendee)
    }
    Unique::Duplicate => Err(Error::Conflict(ALREADY_REGISTERED.into())),
  }
}

/// Attendees of a meeting the caller can see.
pub async fn list_for_meeting<S: FieldStore>(
  store: &S,
  caller: &Caller,
  meeting_id: Uuid,
) -> Result<Vec<Attendee>> {
  let scope = scope::resolve(store, caller).await?;
  let meeting = registry::get_scoped(store, &scope, meeting_id).await?;
  store
    .list_attendees(meeting.meeting_id)
    .await
    .map_err(Error::store)
}
