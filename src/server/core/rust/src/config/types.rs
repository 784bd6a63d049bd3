/* src/server/core/rust/src/config/types.rs */

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrellisConfig {
  #[serde(default)]
  pub app: AppSection,
  #[serde(default)]
  pub routes: RoutesConfig,
  #[serde(default)]
  pub dev: DevSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
  #[serde(default = "default_root")]
  pub root: PathBuf,
}

impl Default for AppSection {
  fn default() -> Self {
    Self { root: default_root() }
  }
}

fn default_root() -> PathBuf {
  PathBuf::from(".")
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutesConfig {
  /// Routes root, relative to the application root.
  #[serde(default = "default_routes_dir")]
  pub dir: PathBuf,
  /// API subtree, relative to the routes root.
  #[serde(default = "default_api_dir")]
  pub api_dir: PathBuf,
  #[serde(default = "default_extensions")]
  pub extensions: Vec<String>,
}

impl Default for RoutesConfig {
  fn default() -> Self {
    Self { dir: default_routes_dir(), api_dir: default_api_dir(), extensions: default_extensions() }
  }
}

fn default_routes_dir() -> PathBuf {
  PathBuf::from("pages")
}

fn default_api_dir() -> PathBuf {
  PathBuf::from("api")
}

fn default_extensions() -> Vec<String> {
  vec!["rs".to_string()]
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevSection {
  #[serde(default)]
  pub enabled: bool,
  #[serde(default = "default_debounce_ms")]
  pub debounce_ms: u64,
}

impl Default for DevSection {
  fn default() -> Self {
    Self { enabled: false, debounce_ms: default_debounce_ms() }
  }
}

fn default_debounce_ms() -> u64 {
  300
}

impl TrellisConfig {
  pub fn validate(&self) -> Result<()> {
    if self.routes.extensions.is_empty() {
      bail!("routes.extensions must not be empty");
    }
    if let Some(ext) = self.routes.extensions.iter().find(|e| e.is_empty() || e.starts_with('.')) {
      bail!("routes.extensions entry \"{ext}\" must be a bare extension such as \"rs\"");
    }
    if self.routes.api_dir.is_absolute() || self.routes.dir.is_absolute() {
      bail!("routes.dir and routes.api_dir must be relative paths");
    }
    Ok(())
  }

  /// Application root resolved against the directory holding the config file.
  pub fn app_root(&self, base_dir: &Path) -> PathBuf {
    base_dir.join(&self.app.root)
  }

  /// Apply `TRELLIS_DEV` from the environment (`1`/`true` enables dev mode).
  pub fn apply_env(&mut self) {
    if let Ok(value) = std::env::var("TRELLIS_DEV") {
      self.dev.enabled = matches!(value.as_str(), "1" | "true");
    }
  }
}
