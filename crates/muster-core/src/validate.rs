//! Field validation for caller-supplied input.

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};

use crate::{
  Error, Result,
  attendee::NewAttendee,
  meeting::MeetingDetails,
  voter::VoterDetails,
};

const MAX_TEXT: usize = 200;

fn invalid(msg: impl Into<String>) -> Error { Error::Validation(msg.into()) }

pub fn required_text(field: &str, value: &str) -> Result<()> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(invalid(format!("{field} is required")));
  }
  if trimmed.chars().count() > MAX_TEXT {
    return Err(invalid(format!("{field} is longer than {MAX_TEXT} characters")));
  }
  Ok(())
}

/// Identity documents: 5–20 characters of ASCII letters, digits, `.` or `-`.
pub fn document(value: &str) -> Result<()> {
  let value = value.trim();
  let len_ok = (5..=20).contains(&value.len());
  let chars_ok = value
    .chars()
    .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
  if len_ok && chars_ok {
    Ok(())
  } else {
    Err(invalid(format!("invalid document number {value:?}")))
  }
}

/// Phone numbers: 7–20 digits, optionally with a leading `+`, spaces or
/// dashes.
pub fn phone(value: &str) -> Result<()> {
  let value = value.trim();
  let body = value.strip_prefix('+').unwrap_or(value);
  let digits = body.chars().filter(char::is_ascii_digit).count();
  let chars_ok = body
    .chars()
    .all(|c| c.is_ascii_digit() || c == ' ' || c == '-');
  if chars_ok && (7..=20).contains(&digits) {
    Ok(())
  } else {
    Err(invalid(format!("invalid phone number {value:?}")))
  }
}

pub fn email(value: &str) -> Result<()> {
  let value = value.trim();
  match value.split_once('@') {
    Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
    _ => Err(invalid(format!("invalid email address {value:?}"))),
  }
}

pub fn signature(value: &str) -> Result<()> {
  B64
    .decode(value.trim())
    .map(|_| ())
    .map_err(|e| invalid(format!("signature is not valid base64: {e}")))
}

fn optional(value: Option<&str>, check: fn(&str) -> Result<()>) -> Result<()> {
  match value.map(str::trim).filter(|v| !v.is_empty()) {
    Some(v) => check(v),
    None => Ok(()),
  }
}

pub fn meeting_details(details: &MeetingDetails) -> Result<()> {
  required_text("name", &details.name)
}

/// Public registration form. Consent is mandatory.
pub fn new_attendee(input: &NewAttendee) -> Result<()> {
  required_text("name", &input.name)?;
  required_text("surname", &input.surname)?;
  document(&input.document)?;
  phone(&input.phone)?;
  optional(input.email.as_deref(), email)?;
  optional(input.signature.as_deref(), signature)?;
  if !input.consent {
    return Err(invalid("consent is required to register"));
  }
  Ok(())
}

pub fn voter_details(details: &VoterDetails) -> Result<()> {
  required_text("name", &details.name)?;
  required_text("surname", &details.surname)?;
  document(&details.document)?;
  optional(details.phone.as_deref(), phone)?;
  optional(details.email.as_deref(), email)
}
