/* src/server/core/rust/src/config/loader.rs */

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use super::TrellisConfig;

pub const CONFIG_FILE: &str = "trellis.toml";

/// Walk upward from `start` to find `trellis.toml`, like Cargo.toml discovery
pub fn find_trellis_config(start: &Path) -> Result<PathBuf> {
  let mut dir =
    start.canonicalize().with_context(|| format!("failed to canonicalize {}", start.display()))?;
  loop {
    let candidate = dir.join(CONFIG_FILE);
    if candidate.is_file() {
      return Ok(candidate);
    }
    if !dir.pop() {
      bail!("{CONFIG_FILE} not found (searched upward from {})", start.display());
    }
  }
}

/// Read, parse and validate a config file, then apply environment overrides.
pub fn load_trellis_config(path: &Path) -> Result<TrellisConfig> {
  let content =
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
  let mut config: TrellisConfig =
    toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))?;
  config.validate().with_context(|| format!("invalid {}", path.display()))?;
  config.apply_env();
  Ok(config)
}
