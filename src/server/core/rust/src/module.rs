/* src/server/core/rust/src/module.rs */

// Route module exports and the version-stamped module cache.
// A module is loaded through a `ModuleLoader`; the cache records which
// version of each module path is current so invalidation can force a
// fresh load on the next access without touching route definitions.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use http::Method;

use crate::context::{Outcome, RequestContext};
use crate::errors::{BoxError, TrellisError};
use crate::route::RouteKind;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

pub type HandlerFn =
  Arc<dyn Fn(RequestContext) -> BoxFuture<Result<Outcome, BoxError>> + Send + Sync>;

pub type LoaderFn = HandlerFn;

/// Wrap an async closure as a `HandlerFn`.
pub fn handler<F, Fut>(f: F) -> HandlerFn
where
  F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<Outcome, BoxError>> + Send + 'static,
{
  Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// What a route module exposes once loaded.
#[derive(Clone, Default)]
pub struct RouteExports {
  pub handlers: HashMap<Method, HandlerFn>,
  pub loader: Option<LoaderFn>,
}

impl RouteExports {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn method<F, Fut>(mut self, method: Method, f: F) -> Self
  where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Outcome, BoxError>> + Send + 'static,
  {
    self.handlers.insert(method, handler(f));
    self
  }

  pub fn get<F, Fut>(self, f: F) -> Self
  where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Outcome, BoxError>> + Send + 'static,
  {
    self.method(Method::GET, f)
  }

  pub fn post<F, Fut>(self, f: F) -> Self
  where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Outcome, BoxError>> + Send + 'static,
  {
    self.method(Method::POST, f)
  }

  pub fn loader<F, Fut>(mut self, f: F) -> Self
  where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Outcome, BoxError>> + Send + 'static,
  {
    self.loader = Some(handler(f));
    self
  }

  /// Methods with a registered handler, sorted for stable error output.
  pub fn allowed_methods(&self) -> Vec<Method> {
    let mut methods: Vec<Method> = self.handlers.keys().cloned().collect();
    methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    methods
  }
}

/// Identifies a route module on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleRef {
  /// Absolute path of the source file.
  pub path: PathBuf,
  /// Path relative to the routes root, `/`-separated, e.g. `api/posts/[id].rs`.
  pub key: String,
  pub kind: RouteKind,
}

pub trait ModuleLoader: Send + Sync {
  fn load(&self, module: &ModuleRef) -> Result<RouteExports, BoxError>;
}

pub type ModuleFactory = Arc<dyn Fn(&ModuleRef) -> Result<RouteExports, BoxError> + Send + Sync>;

/// Loader backed by factories registered per module key.
/// Factories run again on every reload, so they may read companion files.
#[derive(Default, Clone)]
pub struct RegistryLoader {
  factories: HashMap<String, ModuleFactory>,
}

impl RegistryLoader {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn module<F>(mut self, key: impl Into<String>, factory: F) -> Self
  where
    F: Fn(&ModuleRef) -> Result<RouteExports, BoxError> + Send + Sync + 'static,
  {
    self.factories.insert(key.into(), Arc::new(factory));
    self
  }

  pub fn contains(&self, key: &str) -> bool {
    self.factories.contains_key(key)
  }
}

impl ModuleLoader for RegistryLoader {
  fn load(&self, module: &ModuleRef) -> Result<RouteExports, BoxError> {
    let factory = self
      .factories
      .get(&module.key)
      .ok_or_else(|| format!("no module registered for `{}`", module.key))?;
    factory(module)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
  Clean,
  Invalidated,
}

#[derive(Clone, Copy)]
struct ModuleEntry {
  version: u64,
  state: ModuleState,
}

pub struct LoadedModule {
  pub version: u64,
  pub exports: RouteExports,
}

pub struct ModuleCache {
  loader: Arc<dyn ModuleLoader>,
  entries: DashMap<PathBuf, ModuleEntry>,
  next_version: AtomicU64,
  /// Bumped by every invalidation, so a load can tell whether one ran
  /// while its loader was executing.
  epoch: AtomicU64,
}

impl ModuleCache {
  pub fn new(loader: Arc<dyn ModuleLoader>) -> Self {
    Self {
      loader,
      entries: DashMap::new(),
      next_version: AtomicU64::new(1),
      epoch: AtomicU64::new(0),
    }
  }

  /// Version of the module at `path` if it is loaded and still clean.
  pub fn current_version(&self, path: &Path) -> Option<u64> {
    self
      .entries
      .get(path)
      .filter(|e| e.state == ModuleState::Clean)
      .map(|e| e.version)
  }

  pub fn state(&self, path: &Path) -> Option<ModuleState> {
    self.entries.get(path).map(|e| e.state)
  }

  /// Run the loader and record the result as the current version.
  /// If an invalidation lands while the loader runs, the result is still
  /// returned but recorded as invalidated, so the next access reloads.
  pub fn load(&self, module: &ModuleRef) -> Result<LoadedModule, TrellisError> {
    let epoch = self.epoch.load(Ordering::SeqCst);
    let exports = self
      .loader
      .load(module)
      .map_err(|source| TrellisError::ModuleLoad { path: module.path.clone(), source })?;
    let version = self.next_version.fetch_add(1, Ordering::Relaxed);
    // The shard lock held by `entry` orders this check against `invalidate_under`.
    let slot = self.entries.entry(module.path.clone());
    let state = if self.epoch.load(Ordering::SeqCst) == epoch {
      ModuleState::Clean
    } else {
      ModuleState::Invalidated
    };
    slot.insert(ModuleEntry { version, state });
    Ok(LoadedModule { version, exports })
  }

  /// Mark every clean module nested under `root` as invalidated.
  /// Returns how many entries changed state; a second call is a no-op.
  pub fn invalidate_under(&self, root: &Path) -> usize {
    self.epoch.fetch_add(1, Ordering::SeqCst);
    let mut count = 0;
    for mut entry in self.entries.iter_mut() {
      if entry.key().starts_with(root) && entry.state == ModuleState::Clean {
        entry.state = ModuleState::Invalidated;
        count += 1;
      }
    }
    count
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicUsize;
  use std::sync::{OnceLock, Weak};

  use super::*;

  fn module(path: &str, key: &str) -> ModuleRef {
    ModuleRef { path: PathBuf::from(path), key: key.to_string(), kind: RouteKind::Page }
  }

  fn counting_loader(counter: Arc<AtomicUsize>) -> RegistryLoader {
    let factory = move |_: &ModuleRef| {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(RouteExports::new())
    };
    RegistryLoader::new().module("index.rs", factory.clone()).module("about.rs", factory)
  }

  #[test]
  fn load_marks_clean_and_stamps_version() {
    let cache = ModuleCache::new(Arc::new(counting_loader(Arc::default())));
    let m = module("/app/pages/index.rs", "index.rs");
    let first = cache.load(&m).unwrap();
    assert_eq!(cache.current_version(&m.path), Some(first.version));
    let second = cache.load(&m).unwrap();
    assert!(second.version > first.version);
  }

  #[test]
  fn invalidate_only_touches_modules_under_root() {
    let cache = ModuleCache::new(Arc::new(counting_loader(Arc::default())));
    let inside = module("/apps/blog/pages/index.rs", "index.rs");
    let outside = module("/apps/shop/pages/about.rs", "about.rs");
    cache.load(&inside).unwrap();
    cache.load(&outside).unwrap();

    assert_eq!(cache.invalidate_under(Path::new("/apps/blog")), 1);
    assert_eq!(cache.state(&inside.path), Some(ModuleState::Invalidated));
    assert_eq!(cache.state(&outside.path), Some(ModuleState::Clean));
    assert_eq!(cache.current_version(&inside.path), None);
  }

  #[test]
  fn invalidate_is_idempotent() {
    let cache = ModuleCache::new(Arc::new(counting_loader(Arc::default())));
    assert_eq!(cache.invalidate_under(Path::new("/apps/blog")), 0);
    cache.load(&module("/apps/blog/pages/index.rs", "index.rs")).unwrap();
    assert_eq!(cache.invalidate_under(Path::new("/apps/blog")), 1);
    assert_eq!(cache.invalidate_under(Path::new("/apps/blog")), 0);
  }

  #[test]
  fn sibling_prefix_is_not_nested() {
    let cache = ModuleCache::new(Arc::new(counting_loader(Arc::default())));
    cache.load(&module("/apps/blog2/pages/index.rs", "index.rs")).unwrap();
    assert_eq!(cache.invalidate_under(Path::new("/apps/blog")), 0);
  }

  #[test]
  fn invalidation_during_load_is_not_lost() {
    let handle: Arc<OnceLock<Weak<ModuleCache>>> = Arc::default();
    let seen = Arc::clone(&handle);
    let loader = RegistryLoader::new().module("index.rs", move |_| {
      if let Some(cache) = seen.get().and_then(Weak::upgrade) {
        cache.invalidate_under(Path::new("/apps/blog"));
      }
      Ok(RouteExports::new())
    });
    let cache = Arc::new(ModuleCache::new(Arc::new(loader)));
    handle.set(Arc::downgrade(&cache)).unwrap();

    let m = module("/apps/blog/pages/index.rs", "index.rs");
    cache.load(&m).unwrap();
    assert_eq!(cache.state(&m.path), Some(ModuleState::Invalidated));
    assert_eq!(cache.current_version(&m.path), None);
  }

  #[test]
  fn unknown_module_is_load_error() {
    let cache = ModuleCache::new(Arc::new(RegistryLoader::new()));
    let err = cache.load(&module("/app/pages/missing.rs", "missing.rs")).err().unwrap();
    assert_eq!(err.code(), "MODULE_LOAD_ERROR");
    assert!(err.to_string().contains("missing.rs"));
  }

  #[test]
  fn allowed_methods_sorted() {
    let exports = RouteExports::new()
      .post(|ctx| async move { Ok(ctx.response(serde_json::json!({}), 201)) })
      .get(|ctx| async move { Ok(ctx.response(serde_json::json!({}), 200)) });
    assert_eq!(exports.allowed_methods(), vec![Method::GET, Method::POST]);
  }
}
