//! Which leaders' data a caller may see.
//!
//! Every read of meetings, attendees, unique persons and rosters goes through
//! an [`AccessScope`] before touching the store. Writes use
//! [`resolve_writes`], where the view-all permission grants nothing.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::{
  Error, Result,
  identity::{Caller, Role},
  meeting::MeetingFilter,
  store::FieldStore,
};

/// The set of leader ids visible to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
  /// Elevated callers: no leader restriction.
  Unrestricted,
  /// A coordinator: themselves plus the leaders they manage directly.
  Managed {
    coordinator: Uuid,
    leaders:     BTreeSet<Uuid>,
  },
  /// Everyone else: only their own data.
  SelfOnly(Uuid),
}

impl AccessScope {
  /// Compute the scope from roles alone. `managed` is consulted only for
  /// coordinators without an elevated role.
  pub fn for_caller(caller: &Caller, managed: impl IntoIterator<Item = Uuid>) -> Self {
    if caller.can_view_all() {
      Self::Unrestricted
    } else if caller.has_role(Role::Coordinator) {
      Self::Managed {
        coordinator: caller.id,
        leaders:     managed.into_iter().filter(|id| *id != caller.id).collect(),
      }
    } else {
      Self::SelfOnly(caller.id)
    }
  }

  pub fn permits(&self, leader_id: Uuid) -> bool {
    match self {
      Self::Unrestricted => true,
      Self::Managed { coordinator, leaders } => {
        *coordinator == leader_id || leaders.contains(&leader_id)
      }
      Self::SelfOnly(id) => *id == leader_id,
    }
  }

  /// The visible leader ids, or `None` when unrestricted.
  pub fn leader_ids(&self) -> Option<Vec<Uuid>> {
    match self {
      Self::Unrestricted => None,
      Self::Managed { coordinator, leaders } => {
        let mut ids = Vec::with_capacity(leaders.len() + 1);
        ids.push(*coordinator);
        ids.extend(leaders.iter().copied());
        Some(ids)
      }
      Self::SelfOnly(id) => Some(vec![*id]),
    }
  }

  /// Fail with `Forbidden` unless `leader_id` is visible.
  pub fn check(&self, leader_id: Uuid) -> Result<()> {
    if self.permits(leader_id) {
      Ok(())
    } else {
      Err(Error::Forbidden(format!(
        "leader {leader_id} is outside the caller's scope"
      )))
    }
  }

  /// Restrict `filter` to this scope. An explicitly requested leader is
  /// checked first, so an out-of-scope request fails before any lookup.
  pub fn apply(&self, mut filter: MeetingFilter, requested: Option<Uuid>) -> Result<MeetingFilter> {
    filter.leader_ids = match requested {
      Some(leader_id) => {
        self.check(leader_id)?;
        Some(vec![leader_id])
      }
      None => self.leader_ids(),
    };
    Ok(filter)
  }
}

/// Resolve the caller's scope, loading a coordinator's managed leaders from
/// the store.
pub async fn resolve<S: FieldStore>(store: &S, caller: &Caller) -> Result<AccessScope> {
  if !caller.can_view_all() && caller.has_role(Role::Coordinator) {
    let managed = store
      .managed_identity_ids(caller.id)
      .await
      .map_err(Error::store)?;
    Ok(AccessScope::for_caller(caller, managed))
  } else {
    Ok(AccessScope::for_caller(caller, []))
  }
}

/// Resolve the leaders whose data the caller may change. Only administrators
/// are unrestricted; a coordinator is limited to the leaders they manage even
/// when they may read everyone's data.
pub async fn resolve_writes<S: FieldStore>(store: &S, caller: &Caller) -> Result<AccessScope> {
  if caller.is_administrator() {
    return Ok(AccessScope::Unrestricted);
  }
  if !caller.has_role(Role::Coordinator) {
    return Ok(AccessScope::SelfOnly(caller.id));
  }
  let managed = store
    .managed_identity_ids(caller.id)
    .await
    .map_err(Error::store)?;
  Ok(AccessScope::Managed {
    coordinator: caller.id,
    leaders:     managed.into_iter().filter(|id| *id != caller.id).collect(),
  })
}
