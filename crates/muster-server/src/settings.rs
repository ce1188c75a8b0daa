//! Layered server configuration: an optional TOML file under `MUSTER_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use muster_core::code::DEFAULT_CODE_DIGITS;
use serde::Deserialize;

/// Runtime server configuration, deserialised from `muster.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  /// Prefix of public registration links.
  pub base_url:             String,
  pub store_path:           PathBuf,
  /// Length of generated meeting codes.
  pub code_digits:          u32,
  pub consolidate_on_start: bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                 "127.0.0.1".to_string(),
      port:                 8080,
      base_url:             "http://localhost:8080".to_string(),
      store_path:           PathBuf::from("muster.db"),
      code_digits:          DEFAULT_CODE_DIGITS,
      consolidate_on_start: true,
    }
  }
}

impl ServerConfig {
  /// Read `path` (if it exists), then apply `MUSTER_*` overrides.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("MUSTER"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: ServerConfig = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
