/* src/server/core/rust/src/dev.rs */

// Development-time reload. Invalidation only flips cache entries; the next
// request through a route reloads its module. The watcher additionally
// rebuilds the route table so added or removed files take effect.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use notify::event::{MetadataKind, ModifyKind};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::RoutesConfig;
use crate::errors::TrellisError;
use crate::fields;
use crate::log::Logger;
use crate::module::ModuleCache;
use crate::route::RouteTable;
use crate::server::TrellisApp;

/// Invalidate every cached module nested under `app_root`.
/// Returns the number of modules that moved from clean to invalidated.
pub fn invalidate_app(cache: &ModuleCache, app_root: &Path, logger: &dyn Logger) -> usize {
  let count = cache.invalidate_under(app_root);
  logger.info("dev.invalidated", fields! { "root" => app_root.display().to_string(), "count" => count });
  count
}

/// Outcome of one invalidate-and-rescan pass.
#[derive(Debug)]
pub struct Refresh {
  pub invalidated: usize,
  /// Whether a new table replaced the old one.
  pub swapped: bool,
  /// Files that failed to parse during the rescan.
  pub errors: Vec<TrellisError>,
}

/// Invalidate the app's modules, rescan its routes, and swap the table in
/// when the discovered route set differs from the live one.
pub(crate) fn refresh(
  table: &ArcSwap<RouteTable>,
  cache: &ModuleCache,
  routes: &RoutesConfig,
  logger: &dyn Logger,
) -> Result<Refresh, TrellisError> {
  let current = table.load_full();
  let invalidated = invalidate_app(cache, current.app_root(), logger);

  let report = RouteTable::build(current.app_root(), routes)?;
  for err in &report.errors {
    logger.error("route.invalid", fields! { "code" => err.code(), "error" => err.to_string() });
  }

  let swapped = report.table.signature() != current.signature();
  if swapped {
    logger.info(
      "dev.table.swapped",
      fields! { "before" => current.len(), "after" => report.table.len() },
    );
    table.store(Arc::new(report.table));
  }
  Ok(Refresh { invalidated, swapped, errors: report.errors })
}

/// Whether an event can change what a route module or the route set looks
/// like. Reads and atime updates are ignored: serving a request or
/// rescanning the tree produces them.
fn is_edit(kind: &EventKind) -> bool {
  match kind {
    EventKind::Create(_) | EventKind::Remove(_) => true,
    EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => false,
    EventKind::Modify(_) => true,
    _ => false,
  }
}

/// Filesystem watcher that refreshes an app after each burst of changes.
/// The background task stops when the watcher is dropped.
pub struct DevWatcher {
  _watcher: RecommendedWatcher,
  task: JoinHandle<()>,
}

impl DevWatcher {
  /// Start watching the app root. Must be called from within a tokio runtime.
  pub fn spawn(app: TrellisApp, debounce: Duration) -> Result<Self, TrellisError> {
    let root = app.table().app_root().to_path_buf();
    let (tx, mut rx) = mpsc::channel::<()>(16);
    let mut watcher = RecommendedWatcher::new(
      move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
          && is_edit(&event.kind)
        {
          let _ = tx.blocking_send(());
        }
      },
      notify::Config::default(),
    )
    .map_err(|source| TrellisError::Watch { path: root.clone(), source })?;
    watcher
      .watch(&root, RecursiveMode::Recursive)
      .map_err(|source| TrellisError::Watch { path: root.clone(), source })?;

    let task = tokio::spawn(async move {
      while rx.recv().await.is_some() {
        // Coalesce the rest of the burst into one refresh
        tokio::time::sleep(debounce).await;
        while rx.try_recv().is_ok() {}
        if let Err(err) = app.refresh() {
          app.logger().error("dev.refresh.failed", fields! { "error" => err.to_string() });
        }
      }
    });

    Ok(Self { _watcher: watcher, task })
  }
}

impl Drop for DevWatcher {
  fn drop(&mut self) {
    self.task.abort();
  }
}
