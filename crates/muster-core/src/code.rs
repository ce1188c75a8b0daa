//! Short numeric meeting codes.
//!
//! Generators only draw candidates. Uniqueness is decided by the store's
//! constraint on `meetings.code`; see [`crate::registry::create_meeting`].

use rand_core::{OsRng, RngCore};

use crate::{Error, Result};

pub const DEFAULT_CODE_DIGITS: u32 = 6;
const MIN_CODE_DIGITS: u32 = 4;
const MAX_CODE_DIGITS: u32 = 9;

/// Source of candidate meeting codes.
pub trait CodeGenerator: Send + Sync {
  fn generate(&self) -> String;
}

/// Fixed-length decimal codes drawn uniformly from
/// `10^(digits-1) ..= 10^digits - 1`, so no code has a leading zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomCodes {
  low:  u32,
  span: u32,
}

impl RandomCodes {
  pub fn new(digits: u32) -> Result<Self> {
    if !(MIN_CODE_DIGITS..=MAX_CODE_DIGITS).contains(&digits) {
      return Err(Error::Validation(format!(
        "code length must be between {MIN_CODE_DIGITS} and {MAX_CODE_DIGITS} digits, got {digits}"
      )));
    }
    let low = 10u32.pow(digits - 1);
    Ok(Self { low, span: low * 9 })
  }

  /// Draw an offset in `0..span` by rejection sampling to avoid modulo bias.
  fn draw(&self, rng: &mut impl RngCore) -> u32 {
    let zone = u32::MAX - (u32::MAX % self.span);
    loop {
      let x = rng.next_u32();
      if x < zone {
        return x % self.span;
      }
    }
  }
}

impl Default for RandomCodes {
  fn default() -> Self {
    let low = 10u32.pow(DEFAULT_CODE_DIGITS - 1);
    Self { low, span: low * 9 }
  }
}

impl CodeGenerator for RandomCodes {
  fn generate(&self) -> String { (self.low + self.draw(&mut OsRng)).to_string() }
}
