/* src/server/core/rust/src/route/mod.rs */

// File-based route discovery: directory layout -> ordered route table.
// `[name]` is a dynamic segment, `[...name]` a catch-all, anything else
// a static segment. Files under the API subtree become API routes.

mod scan;
mod segment;
mod table;


use std::fmt;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::Serialize;

use crate::errors::TrellisError;
use crate::module::{LoadedModule, ModuleCache, ModuleRef};

pub use scan::ScanOptions;
pub use segment::{RoutePattern, SegmentDescriptor};
pub use table::{BuildReport, RouteTable, compare_precedence};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
  Api,
  Page,
}

pub struct RouteDefinition {
  pattern: RoutePattern,
  kind: RouteKind,
  module: ModuleRef,
  exports: ArcSwapOption<LoadedModule>,
}

impl RouteDefinition {
  pub fn new(pattern: RoutePattern, module: ModuleRef) -> Self {
    Self { pattern, kind: module.kind, module, exports: ArcSwapOption::empty() }
  }

  pub fn pattern(&self) -> &RoutePattern {
    &self.pattern
  }

  pub fn kind(&self) -> RouteKind {
    self.kind
  }

  pub fn module(&self) -> &ModuleRef {
    &self.module
  }

  pub fn module_path(&self) -> &Path {
    &self.module.path
  }

  /// Resolve the loaded exports, reloading when the cache no longer
  /// considers the held version current. The slot is swapped, never mutated.
  pub fn exports(&self, cache: &ModuleCache) -> Result<Arc<LoadedModule>, TrellisError> {
    let current = cache.current_version(&self.module.path);
    if let Some(loaded) = self.exports.load_full()
      && Some(loaded.version) == current
    {
      return Ok(loaded);
    }
    let loaded = Arc::new(cache.load(&self.module)?);
    self.exports.store(Some(Arc::clone(&loaded)));
    Ok(loaded)
  }

  /// Version of the exports currently held, if any were loaded.
  pub fn loaded_version(&self) -> Option<u64> {
    self.exports.load().as_ref().map(|m| m.version)
  }
}

impl fmt::Debug for RouteDefinition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RouteDefinition")
      .field("pattern", &self.pattern.to_string())
      .field("kind", &self.kind)
      .field("module", &self.module.key)
      .field("loaded_version", &self.loaded_version())
      .finish()
  }
}
