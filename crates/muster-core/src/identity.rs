//! Identities, roles, and the authenticated caller.
//!
//! Identities are mirrored from the external identity provider. The only
//! fields this subsystem relies on are the document number (used for
//! consolidation and for the meeting owner snapshot), the role set, and the
//! single-level `manager_id` link from a leader to its coordinator.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

// ─── Roles ───────────────────────────────────────────────────────────────────

/// A role granted by the identity provider.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  EnumString,
  Display,
  AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Role {
  God,
  Admin,
  Coordinator,
  Leader,
  CanViewAllAttendees,
  User,
}

/// Parse a list of role names, dropping any the subsystem does not know.
pub fn parse_roles<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<Role> {
  let mut roles: Vec<Role> = names
    .into_iter()
    .map(str::trim)
    .filter(|n| !n.is_empty())
    .filter_map(|n| match Role::from_str(n) {
      Ok(role) => Some(role),
      Err(_) => {
        tracing::debug!(role = n, "ignoring unknown role");
        None
      }
    })
    .collect();
  roles.sort();
  roles.dedup();
  roles
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// A person with system access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub identity_id:  Uuid,
  pub document:     Option<String>,
  pub display_name: String,
  pub phone:        Option<String>,
  pub roles:        Vec<Role>,
  /// The coordinator administering this identity. Only meaningful for
  /// leaders; always one level deep.
  pub manager_id:   Option<Uuid>,
  /// Marks the system's seed administrator, which always survives
  /// consolidation.
  pub is_seed:      bool,
  pub created_at:   DateTime<Utc>,
}

impl Identity {
  pub fn has_role(&self, role: Role) -> bool { self.roles.contains(&role) }

  /// The trimmed document number, if one is on file.
  pub fn document_key(&self) -> Option<&str> {
    self
      .document
      .as_deref()
      .map(str::trim)
      .filter(|d| !d.is_empty())
  }
}

// ─── Caller ──────────────────────────────────────────────────────────────────

/// The authenticated principal of a request, as supplied by the identity
/// provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
  pub id:    Uuid,
  pub roles: Vec<Role>,
}

impl Caller {
  pub fn new(id: Uuid, roles: impl IntoIterator<Item = Role>) -> Self {
    let mut roles: Vec<Role> = roles.into_iter().collect();
    roles.sort();
    roles.dedup();
    Self { id, roles }
  }

  pub fn has_role(&self, role: Role) -> bool { self.roles.contains(&role) }

  fn has_any(&self, roles: &[Role]) -> bool {
    roles.iter().any(|r| self.has_role(*r))
  }

  /// May read every leader's meetings and attendees.
  pub fn can_view_all(&self) -> bool {
    self.has_any(&[Role::God, Role::Admin, Role::CanViewAllAttendees])
  }

  /// Full administrative rights over every leader's data.
  pub fn is_administrator(&self) -> bool {
    self.has_any(&[Role::God, Role::Admin])
  }

  /// May create or edit records on behalf of another leader. Coordinators are
  /// further restricted to leaders inside their access scope.
  pub fn can_act_for_others(&self) -> bool {
    self.has_any(&[Role::God, Role::Admin, Role::Coordinator])
  }

  pub fn can_delete_meetings(&self) -> bool {
    self.has_any(&[Role::God, Role::Admin, Role::Coordinator])
  }
}
