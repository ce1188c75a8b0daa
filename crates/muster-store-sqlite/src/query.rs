//! Dynamic `WHERE` clauses for meeting and roster filters.

use muster_core::{meeting::MeetingFilter, voter::VoterFilter};
use rusqlite::types::Value;
use uuid::Uuid;

use crate::encode::{encode_day_start, encode_uuid};

/// A list of SQL conditions joined with `AND`, with positional `?` params.
#[derive(Default)]
pub struct Conditions {
  clauses: Vec<String>,
  params:  Vec<Value>,
}

impl Conditions {
  fn push(&mut self, clause: impl Into<String>, params: impl IntoIterator<Item = Value>) {
    self.clauses.push(clause.into());
    self.params.extend(params);
  }

  /// `column IN (...)`; an empty set matches nothing.
  fn push_ids(&mut self, column: &str, ids: &[Uuid]) {
    if ids.is_empty() {
      self.push("0 = 1", []);
      return;
    }
    let marks = vec!["?"; ids.len()].join(", ");
    self.push(
      format!("{column} IN ({marks})"),
      ids.iter().map(|id| Value::Text(encode_uuid(*id))),
    );
  }

  /// The clause text, including the leading `WHERE`, or empty.
  pub fn where_clause(&self) -> String {
    if self.clauses.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", self.clauses.join(" AND "))
    }
  }

  pub fn into_params(self) -> Vec<Value> { self.params }
}

fn text(s: &str) -> Value { Value::Text(s.to_owned()) }

/// A substring pattern for `LIKE ? ESCAPE '\'`, with wildcards in `s`
/// matched literally.
fn like(s: &str) -> Value {
  let mut pattern = String::with_capacity(s.len() + 2);
  pattern.push('%');
  for ch in s.trim().chars() {
    if matches!(ch, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(ch);
  }
  pattern.push('%');
  Value::Text(pattern)
}

fn non_blank(s: &Option<String>) -> Option<&str> {
  s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Conditions over the meetings table aliased as `m`.
pub fn meeting_conditions(filter: &MeetingFilter) -> Conditions {
  let mut c = Conditions::default();

  if let Some(start) = filter.date_start {
    c.push("m.scheduled_at >= ?", [text(&encode_day_start(start))]);
  }
  if let Some(next_day) = filter.date_end.and_then(|end| end.succ_opt()) {
    c.push("m.scheduled_at < ?", [text(&encode_day_start(next_day))]);
  }
  if let Some(location) = non_blank(&filter.location) {
    let pattern = like(location);
    c.push(
      "(m.region LIKE ? ESCAPE '\\' OR m.locality LIKE ? ESCAPE '\\' \
       OR m.district LIKE ? ESCAPE '\\' OR m.neighborhood LIKE ? ESCAPE '\\')",
      std::iter::repeat_n(pattern, 4),
    );
  }
  if let Some(region) = non_blank(&filter.region) {
    c.push("m.region = ?", [text(region)]);
  }
  if let Some(locality) = non_blank(&filter.locality) {
    c.push("m.locality = ?", [text(locality)]);
  }
  if let Some(id) = filter.meeting_id {
    c.push("m.meeting_id = ?", [Value::Text(encode_uuid(id))]);
  }
  if let Some(ids) = &filter.leader_ids {
    c.push_ids("m.leader_id", ids);
  }

  c
}

/// Conditions over the voters table (unaliased).
pub fn voter_conditions(filter: &VoterFilter) -> Conditions {
  let mut c = Conditions::default();

  if let Some(ids) = &filter.leader_ids {
    c.push_ids("leader_id", ids);
  }
  if let Some(t) = non_blank(&filter.text) {
    let pattern = like(t);
    c.push(
      "(name LIKE ? ESCAPE '\\' OR surname LIKE ? ESCAPE '\\' \
       OR document LIKE ? ESCAPE '\\')",
      std::iter::repeat_n(pattern, 3),
    );
  }

  c
}
