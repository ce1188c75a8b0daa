//! Identity mirror maintenance: the records the identity provider hands us,
//! the manager links that drive coordinator scope, and on-demand
//! consolidation.

use serde::Deserialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  consolidate::{self, ConsolidationReport},
  identity::{Caller, Identity, Role, parse_roles},
  store::FieldStore,
  validate,
};

/// An identity as supplied by the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityInput {
  pub identity_id:  Uuid,
  #[serde(default)]
  pub document:     Option<String>,
  pub display_name: String,
  #[serde(default)]
  pub phone:        Option<String>,
  /// Role names; unknown names are dropped.
  #[serde(default)]
  pub roles:        Vec<String>,
  #[serde(default)]
  pub manager_id:   Option<Uuid>,
  #[serde(default)]
  pub is_seed:      bool,
}

fn require_administrator(caller: &Caller) -> Result<()> {
  if caller.is_administrator() {
    Ok(())
  } else {
    Err(Error::Forbidden("identity maintenance requires god or admin".into()))
  }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

/// Check that `manager_id` names an existing coordinator other than `id`.
async fn check_manager<S: FieldStore>(store: &S, id: Uuid, manager_id: Uuid) -> Result<()> {
  if manager_id == id {
    return Err(Error::Validation("an identity cannot manage itself".into()));
  }
  let manager = store
    .get_identity(manager_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(format!("manager {manager_id} not found")))?;
  if !manager.has_role(Role::Coordinator) {
    return Err(Error::Validation(format!(
      "manager {manager_id} does not hold the coordinator role"
    )));
  }
  Ok(())
}

/// Insert or replace an identity. The original `created_at` of an existing
/// record is kept.
pub async fn upsert_identity<S: FieldStore>(
  store: &S,
  caller: &Caller,
  input: IdentityInput,
) -> Result<Identity> {
  require_administrator(caller)?;
  validate::required_text("display_name", &input.display_name)?;
  let document = blank_to_none(input.document);
  if let Some(d) = &document {
    validate::document(d)?;
  }
  let phone = blank_to_none(input.phone);
  if let Some(p) = &phone {
    validate::phone(p)?;
  }
  if let Some(manager_id) = input.manager_id {
    check_manager(store, input.identity_id, manager_id).await?;
  }

  let created_at = store
    .get_identity(input.identity_id)
    .await
    .map_err(Error::store)?
    .map_or_else(chrono::Utc::now, |existing| existing.created_at);

  let identity = Identity {
    identity_id: input.identity_id,
    document,
    display_name: input.display_name.trim().to_owned(),
    phone,
    roles: parse_roles(input.roles.iter().map(String::as_str)),
    manager_id: input.manager_id,
    is_seed: input.is_seed,
    created_at,
  };
  let saved = store.put_identity(identity).await.map_err(Error::store)?;
  tracing::info!(identity_id = %saved.identity_id, roles = ?saved.roles, "identity mirrored");
  Ok(saved)
}

/// Set or clear the coordinator administering `id`.
pub async fn set_manager<S: FieldStore>(
  store: &S,
  caller: &Caller,
  id: Uuid,
  manager_id: Option<Uuid>,
) -> Result<Identity> {
  require_administrator(caller)?;
  if let Some(manager_id) = manager_id {
    check_manager(store, id, manager_id).await?;
  }
  if !store.set_manager(id, manager_id).await.map_err(Error::store)? {
    return Err(Error::NotFound(format!("identity {id} not found")));
  }
  store
    .get_identity(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(format!("identity {id} not found")))
}

/// Run a consolidation pass on behalf of an administrator.
pub async fn run_consolidation<S: FieldStore>(store: &S, caller: &Caller) -> Result<ConsolidationReport> {
  require_administrator(caller)?;
  tracing::info!(caller = %caller.id, "consolidation requested");
  consolidate::run(store).await
}
