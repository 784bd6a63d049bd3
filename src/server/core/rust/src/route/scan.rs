/* src/server/core/rust/src/route/scan.rs */

use std::path::{Component, Path, PathBuf};

use crate::config::RoutesConfig;
use crate::errors::TrellisError;
use crate::module::ModuleRef;

use super::RouteKind;
use super::segment::{RoutePattern, SegmentDescriptor};

/// Resolved inputs for one scan of a routes directory.
#[derive(Debug, Clone)]
pub struct ScanOptions {
  pub routes_dir: PathBuf,
  pub api_dir: PathBuf,
  pub extensions: Vec<String>,
}

impl ScanOptions {
  pub fn from_config(app_root: &Path, routes: &RoutesConfig) -> Self {
    Self {
      routes_dir: app_root.join(&routes.dir),
      api_dir: PathBuf::from(&routes.api_dir),
      extensions: routes.extensions.clone(),
    }
  }

  fn is_eligible(&self, path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
      return false;
    };
    if name.starts_with('_') || name.starts_with('.') {
      return false;
    }
    path
      .extension()
      .and_then(|e| e.to_str())
      .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
  }
}

/// Walk `dir` depth-first in file-name order, collecting eligible files.
/// Symlinked directories are not descended into; symlinked files count
/// when their target is a regular file.
pub(super) fn collect_files(
  opts: &ScanOptions,
  dir: &Path,
  out: &mut Vec<PathBuf>,
) -> Result<(), TrellisError> {
  let io_err = |source: std::io::Error| TrellisError::Io { path: dir.to_path_buf(), source };
  let mut entries = Vec::new();
  for entry in std::fs::read_dir(dir).map_err(io_err)? {
    let entry = entry.map_err(io_err)?;
    let file_type = entry.file_type().map_err(io_err)?;
    entries.push((entry.path(), file_type));
  }
  entries.sort_by(|a, b| a.0.cmp(&b.0));

  for (path, file_type) in entries {
    let hidden =
      path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with(['_', '.']));
    if file_type.is_dir() {
      if !hidden {
        collect_files(opts, &path, out)?;
      }
      continue;
    }
    let is_file = file_type.is_file()
      || (file_type.is_symlink() && std::fs::metadata(&path).is_ok_and(|m| m.is_file()));
    if is_file && opts.is_eligible(&path) {
      out.push(path);
    }
  }
  Ok(())
}

/// Derive the module reference and pattern for one discovered file.
pub(super) fn describe_file(
  opts: &ScanOptions,
  file: &Path,
) -> Result<(ModuleRef, RoutePattern), TrellisError> {
  let rel = file
    .strip_prefix(&opts.routes_dir)
    .map_err(|_| TrellisError::invalid_route(file, "file is outside the routes directory"))?;

  let mut parts: Vec<String> = Vec::new();
  for component in rel.components() {
    match component {
      Component::Normal(os) => match os.to_str() {
        Some(s) => parts.push(s.to_string()),
        None => return Err(TrellisError::invalid_route(file, "path is not valid UTF-8")),
      },
      _ => return Err(TrellisError::invalid_route(file, "unexpected path component")),
    }
  }
  let key = parts.join("/");
  let kind = if rel.starts_with(&opts.api_dir) { RouteKind::Api } else { RouteKind::Page };

  let stem = file
    .file_stem()
    .and_then(|s| s.to_str())
    .ok_or_else(|| TrellisError::invalid_route(file, "file has no name"))?;
  parts.pop();
  if stem != "index" {
    parts.push(stem.to_string());
  }

  let segments = parts
    .iter()
    .map(|p| SegmentDescriptor::parse(p))
    .collect::<Result<Vec<_>, _>>()
    .map_err(|reason| TrellisError::invalid_route(file, reason))?;
  let pattern = RoutePattern::new(segments).map_err(|reason| TrellisError::invalid_route(file, reason))?;

  Ok((ModuleRef { path: file.to_path_buf(), key, kind }, pattern))
}
