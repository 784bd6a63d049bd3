/* src/server/core/rust/src/server.rs */

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

use crate::config::{RoutesConfig, TrellisConfig};
use crate::context::{Outcome, RawRequest, Redirect, RequestContext, Response};
use crate::dev::{self, DevWatcher, Refresh};
use crate::errors::{BoxError, TrellisError};
use crate::fields;
use crate::invoke::invoke;
use crate::log::{Logger, TracingLogger};
use crate::matcher::MatchResult;
use crate::module::{ModuleCache, ModuleLoader, RegistryLoader};
use crate::page::{Assembled, InitialData, assemble};
use crate::route::RouteTable;

type InitHook = Box<dyn FnOnce(&ServerContext) -> Result<(), BoxError> + Send>;

/// What the init hook gets to see about the app it is starting.
pub struct ServerContext {
  pub app_root: PathBuf,
  pub dev: bool,
  pub route_count: usize,
  pub logger: Arc<dyn Logger>,
}

/// Terminal result of one request, handed to the transport layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
  Response(Response),
  Redirect(Redirect),
  Page(InitialData),
}

/// Builder for a Trellis app. `start` scans the routes and runs the init hook.
pub struct TrellisServer {
  app_root: PathBuf,
  routes: RoutesConfig,
  dev: bool,
  debounce: Duration,
  loader: Arc<dyn ModuleLoader>,
  logger: Arc<dyn Logger>,
  init: Option<InitHook>,
}

impl TrellisServer {
  pub fn new(app_root: impl Into<PathBuf>) -> Self {
    Self {
      app_root: app_root.into(),
      routes: RoutesConfig::default(),
      dev: false,
      debounce: Duration::from_millis(300),
      loader: Arc::new(RegistryLoader::new()),
      logger: Arc::new(TracingLogger),
      init: None,
    }
  }

  /// Builder seeded from a parsed `trellis.toml`; `base_dir` is the
  /// directory the config file lives in.
  pub fn from_config(config: &TrellisConfig, base_dir: &Path) -> Self {
    Self::new(config.app_root(base_dir))
      .routes(config.routes.clone())
      .dev(config.dev.enabled)
      .debounce(Duration::from_millis(config.dev.debounce_ms))
  }

  pub fn routes(mut self, routes: RoutesConfig) -> Self {
    self.routes = routes;
    self
  }

  pub fn dev(mut self, enabled: bool) -> Self {
    self.dev = enabled;
    self
  }

  pub fn debounce(mut self, debounce: Duration) -> Self {
    self.debounce = debounce;
    self
  }

  pub fn loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
    self.loader = Arc::new(loader);
    self
  }

  pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
    self.logger = logger;
    self
  }

  /// Register the hook that runs once, before any request is served.
  pub fn init<F>(mut self, hook: F) -> Self
  where
    F: FnOnce(&ServerContext) -> Result<(), BoxError> + Send + 'static,
  {
    self.init = Some(Box::new(hook));
    self
  }

  /// Build the route table, log per-file failures, and run the init hook.
  /// Invalid route files are skipped; an unreadable routes root or a
  /// failing init hook aborts startup.
  pub fn start(self) -> Result<TrellisApp, TrellisError> {
    let report = RouteTable::build(&self.app_root, &self.routes)?;
    for err in &report.errors {
      self.logger.error("route.invalid", fields! { "code" => err.code(), "error" => err.to_string() });
    }
    let table = report.table;
    self.logger.info(
      "route.table.built",
      fields! {
        "root" => table.app_root().display().to_string(),
        "routes" => table.len(),
        "invalid" => report.errors.len(),
      },
    );

    let context = ServerContext {
      app_root: table.app_root().to_path_buf(),
      dev: self.dev,
      route_count: table.len(),
      logger: Arc::clone(&self.logger),
    };
    if let Some(hook) = self.init {
      hook(&context).map_err(|source| TrellisError::Init { source })?;
      self.logger.info("server.init", fields! { "root" => context.app_root.display().to_string() });
    }

    Ok(TrellisApp {
      inner: Arc::new(Inner {
        table: ArcSwap::from_pointee(table),
        cache: ModuleCache::new(self.loader),
        routes: self.routes,
        debounce: self.debounce,
        context,
      }),
    })
  }
}

struct Inner {
  table: ArcSwap<RouteTable>,
  cache: ModuleCache,
  routes: RoutesConfig,
  debounce: Duration,
  context: ServerContext,
}

/// A started app. Cheap to clone; all clones share one table and cache.
#[derive(Clone)]
pub struct TrellisApp {
  inner: Arc<Inner>,
}

impl TrellisApp {
  /// Run one request through match, invoke and assemble.
  /// `Ok(None)` means no route matched the path.
  pub async fn handle(&self, request: RawRequest) -> Result<Option<Dispatch>, TrellisError> {
    let table = self.inner.table.load_full();
    let pathname = request.uri.path().to_string();
    let Some(MatchResult { route, params }) = table.find(&pathname) else {
      return Ok(None);
    };
    let logger = &self.inner.context.logger;
    logger.info(
      "request.matched",
      fields! {
        "method" => request.method.as_str(),
        "path" => pathname.as_str(),
        "route" => route.pattern().to_string(),
        "kind" => route.kind(),
      },
    );

    let ctx = RequestContext::new(request, params.clone());
    let outcome = match invoke(&self.inner.cache, &route, ctx).await {
      Ok(outcome) => outcome,
      Err(err) => {
        logger.error(
          "request.failed",
          fields! {
            "route" => route.pattern().to_string(),
            "code" => err.code(),
            "error" => err.to_string(),
          },
        );
        return Err(err);
      }
    };

    Ok(Some(match outcome {
      Outcome::Response(response) => Dispatch::Response(response),
      Outcome::Redirect(redirect) => Dispatch::Redirect(redirect),
      Outcome::Loaded(result) => match assemble(result, &pathname, params) {
        Assembled::Page(data) => Dispatch::Page(data),
        Assembled::Redirect(redirect) => Dispatch::Redirect(redirect),
      },
    }))
  }

  /// Snapshot of the live route table.
  pub fn table(&self) -> Arc<RouteTable> {
    self.inner.table.load_full()
  }

  pub fn cache(&self) -> &ModuleCache {
    &self.inner.cache
  }

  pub fn context(&self) -> &ServerContext {
    &self.inner.context
  }

  pub fn logger(&self) -> &dyn Logger {
    self.inner.context.logger.as_ref()
  }

  /// Invalidate all modules under the app root; the next request reloads them.
  pub fn invalidate(&self) -> usize {
    dev::invalidate_app(&self.inner.cache, &self.inner.context.app_root, self.logger())
  }

  /// Invalidate, rescan, and swap in the new table if routes were added or removed.
  pub fn refresh(&self) -> Result<Refresh, TrellisError> {
    dev::refresh(&self.inner.table, &self.inner.cache, &self.inner.routes, self.logger())
  }

  /// Watch the app root and refresh on change, using the configured debounce.
  pub fn watch(&self) -> Result<DevWatcher, TrellisError> {
    DevWatcher::spawn(self.clone(), self.inner.debounce)
  }
}
