/* src/server/core/rust/src/config/tests.rs */

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::*;

// Tests that read or write TRELLIS_DEV hold this lock.
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn parse_empty_config_uses_defaults() {
  let config: TrellisConfig = toml::from_str("").unwrap();
  assert_eq!(config.app.root, PathBuf::from("."));
  assert_eq!(config.routes.dir, PathBuf::from("pages"));
  assert_eq!(config.routes.api_dir, PathBuf::from("api"));
  assert_eq!(config.routes.extensions, vec!["rs"]);
  assert!(!config.dev.enabled);
  assert_eq!(config.dev.debounce_ms, 300);
}

#[test]
fn parse_full_config() {
  let toml_str = r#"
[app]
root = "site"

[routes]
dir = "routes"
api_dir = "server/api"
extensions = ["rs", "toml"]

[dev]
enabled = true
debounce_ms = 50
"#;
  let config: TrellisConfig = toml::from_str(toml_str).unwrap();
  config.validate().unwrap();
  assert_eq!(config.app_root(Path::new("/work")), PathBuf::from("/work/site"));
  assert_eq!(config.routes.dir, PathBuf::from("routes"));
  assert_eq!(config.routes.api_dir, PathBuf::from("server/api"));
  assert_eq!(config.routes.extensions, vec!["rs", "toml"]);
  assert!(config.dev.enabled);
  assert_eq!(config.dev.debounce_ms, 50);
}

#[test]
fn validate_rejects_empty_extensions() {
  let config: TrellisConfig = toml::from_str("[routes]\nextensions = []\n").unwrap();
  let err = config.validate().unwrap_err();
  assert!(err.to_string().contains("must not be empty"), "{err}");
}

#[test]
fn validate_rejects_dotted_extension() {
  let config: TrellisConfig = toml::from_str("[routes]\nextensions = [\".rs\"]\n").unwrap();
  assert!(config.validate().is_err());
}

#[test]
fn find_config_walks_upward() {
  let dir = tempfile::tempdir().unwrap();
  std::fs::write(dir.path().join(CONFIG_FILE), "").unwrap();
  let nested = dir.path().join("pages/api");
  std::fs::create_dir_all(&nested).unwrap();
  let found = find_trellis_config(&nested).unwrap();
  assert_eq!(found, dir.path().canonicalize().unwrap().join(CONFIG_FILE));
}

#[test]
fn load_reports_parse_errors_with_path() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join(CONFIG_FILE);
  std::fs::write(&path, "[routes\n").unwrap();
  let err = load_trellis_config(&path).unwrap_err();
  assert!(err.to_string().contains("failed to parse"), "{err}");
}

#[test]
fn load_reads_file() {
  let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
  unsafe { std::env::remove_var("TRELLIS_DEV") };
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join(CONFIG_FILE);
  std::fs::write(&path, "[dev]\nenabled = true\n").unwrap();
  assert!(load_trellis_config(&path).unwrap().dev.enabled);
}

#[test]
fn load_applies_dev_env_override() {
  let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join(CONFIG_FILE);
  std::fs::write(&path, "[dev]\nenabled = false\n").unwrap();

  unsafe { std::env::set_var("TRELLIS_DEV", "1") };
  let overridden = load_trellis_config(&path);
  unsafe { std::env::remove_var("TRELLIS_DEV") };
  assert!(overridden.unwrap().dev.enabled);

  assert!(!load_trellis_config(&path).unwrap().dev.enabled);
}
