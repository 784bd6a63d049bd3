/* src/server/core/rust/src/lib.rs */

pub mod config;
pub mod context;
pub mod dev;
pub mod errors;
pub mod invoke;
pub mod log;
pub mod matcher;
pub mod module;
pub mod page;
pub mod route;
pub mod server;

// Re-exports for ergonomic use
pub use config::{CONFIG_FILE, RoutesConfig, TrellisConfig, find_trellis_config, load_trellis_config};
pub use context::{Outcome, RawRequest, Redirect, RequestContext, Response};
pub use dev::{DevWatcher, Refresh, invalidate_app};
pub use errors::{BoxError, TrellisError};
pub use log::{Fields, Level, Logger, TracingLogger};
pub use matcher::{MatchResult, Params, normalize_path};
pub use module::{
  HandlerFn, LoaderFn, ModuleCache, ModuleLoader, ModuleRef, ModuleState, RegistryLoader,
  RouteExports, handler,
};
pub use page::{Assembled, InitialData, LoaderResult, assemble};
pub use route::{
  BuildReport, RouteDefinition, RouteKind, RoutePattern, RouteTable, SegmentDescriptor,
};
pub use server::{Dispatch, ServerContext, TrellisApp, TrellisServer};
