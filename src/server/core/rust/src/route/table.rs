/* src/server/core/rust/src/route/table.rs */

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::RoutesConfig;
use crate::errors::TrellisError;
use crate::matcher::{MatchResult, match_pattern, normalize_path};

use super::scan::{ScanOptions, collect_files, describe_file};
use super::segment::RoutePattern;
use super::RouteDefinition;

/// Total precedence order between patterns, most specific first.
///
/// Segments are compared left to right by rank (static, then dynamic, then
/// catch-all); the first differing rank decides. When one pattern's ranks
/// are a prefix of the other's, the longer pattern comes first. Remaining
/// ties fall back to the display string so the order never depends on
/// discovery order.
pub fn compare_precedence(a: &RoutePattern, b: &RoutePattern) -> Ordering {
  for (sa, sb) in a.segments().iter().zip(b.segments()) {
    match sa.rank().cmp(&sb.rank()) {
      Ordering::Equal => {}
      other => return other,
    }
  }
  b.segments().len().cmp(&a.segments().len()).then_with(|| a.to_string().cmp(&b.to_string()))
}

/// Result of a table build: the routes that parsed, plus one error per
/// file that did not. A bad file never aborts the rest of the build.
#[derive(Debug)]
pub struct BuildReport {
  pub table: RouteTable,
  pub errors: Vec<TrellisError>,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
  app_root: PathBuf,
  routes: Vec<Arc<RouteDefinition>>,
}

impl RouteTable {
  /// Scan `<app_root>/<routes.dir>` and build the ordered table.
  pub fn build(app_root: &Path, routes: &RoutesConfig) -> Result<BuildReport, TrellisError> {
    let app_root = app_root
      .canonicalize()
      .map_err(|source| TrellisError::Io { path: app_root.to_path_buf(), source })?;
    let opts = ScanOptions::from_config(&app_root, routes);

    let mut files = Vec::new();
    collect_files(&opts, &opts.routes_dir, &mut files)?;

    let mut definitions = Vec::with_capacity(files.len());
    let mut errors = Vec::new();
    let mut seen: HashMap<RoutePattern, String> = HashMap::new();
    for file in &files {
      match describe_file(&opts, file) {
        Ok((module, pattern)) => {
          if let Some(existing) = seen.get(&pattern) {
            errors.push(TrellisError::invalid_route(
              file,
              format!("pattern {pattern} is already defined by {existing}"),
            ));
            continue;
          }
          seen.insert(pattern.clone(), module.key.clone());
          definitions.push(RouteDefinition::new(pattern, module));
        }
        Err(err) => errors.push(err),
      }
    }

    Ok(BuildReport { table: Self::from_routes(app_root, definitions), errors })
  }

  /// Assemble a table from already-built definitions, ordering them by precedence.
  pub fn from_routes(app_root: impl Into<PathBuf>, routes: Vec<RouteDefinition>) -> Self {
    let mut routes: Vec<Arc<RouteDefinition>> = routes.into_iter().map(Arc::new).collect();
    routes.sort_by(|a, b| compare_precedence(a.pattern(), b.pattern()));
    Self { app_root: app_root.into(), routes }
  }

  pub fn app_root(&self) -> &Path {
    &self.app_root
  }

  pub fn routes(&self) -> &[Arc<RouteDefinition>] {
    &self.routes
  }

  pub fn len(&self) -> usize {
    self.routes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.routes.is_empty()
  }

  /// Match a raw request path. `None` means no route matched.
  pub fn find(&self, path: &str) -> Option<MatchResult> {
    let segments = normalize_path(path);
    self.routes.iter().find_map(|route| {
      match_pattern(route.pattern(), &segments)
        .map(|params| MatchResult { route: Arc::clone(route), params })
    })
  }

  /// Patterns and module files in table order; equal signatures mean the
  /// same discovered route set.
  pub fn signature(&self) -> Vec<(String, PathBuf)> {
    self.routes.iter().map(|r| (r.pattern().to_string(), r.module_path().to_path_buf())).collect()
  }
}
