/* src/server/core/rust/src/errors.rs */

use std::path::PathBuf;

use http::Method;

/// Error type carried by user handlers and loaders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum TrellisError {
  #[error("invalid route definition {}: {reason}", .path.display())]
  InvalidRouteDefinition { path: PathBuf, reason: String },

  #[error("handler for {route} broke its contract: {detail}")]
  HandlerContractViolation { route: String, detail: String },

  #[error("handler for {route} failed: {source}")]
  HandlerExecution {
    route: String,
    #[source]
    source: BoxError,
  },

  #[error("{method} is not allowed on {route}")]
  MethodNotAllowed { route: String, method: Method, allowed: Vec<Method> },

  #[error("failed to load module {}: {source}", .path.display())]
  ModuleLoad {
    path: PathBuf,
    #[source]
    source: BoxError,
  },

  #[error("failed to read {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("init hook failed: {source}")]
  Init {
    #[source]
    source: BoxError,
  },

  #[error("failed to watch {}: {source}", .path.display())]
  Watch {
    path: PathBuf,
    #[source]
    source: notify::Error,
  },
}

impl TrellisError {
  pub fn invalid_route(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
    Self::InvalidRouteDefinition { path: path.into(), reason: reason.into() }
  }

  pub fn contract(route: impl Into<String>, detail: impl Into<String>) -> Self {
    Self::HandlerContractViolation { route: route.into(), detail: detail.into() }
  }

  pub fn code(&self) -> &'static str {
    match self {
      Self::InvalidRouteDefinition { .. } => "INVALID_ROUTE_DEFINITION",
      Self::HandlerContractViolation { .. } => "HANDLER_CONTRACT_VIOLATION",
      Self::HandlerExecution { .. } => "HANDLER_EXECUTION_ERROR",
      Self::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
      Self::ModuleLoad { .. } => "MODULE_LOAD_ERROR",
      Self::Io { .. } => "IO_ERROR",
      Self::Init { .. } => "INIT_ERROR",
      Self::Watch { .. } => "WATCH_ERROR",
    }
  }

  /// HTTP status the transport layer should answer with.
  pub fn status(&self) -> u16 {
    match self {
      Self::MethodNotAllowed { .. } => 405,
      _ => 500,
    }
  }
}

#[cfg(test)]
mod tests {
  use std::error::Error;

  use super::*;

  #[test]
  fn request_errors_map_to_server_failure() {
    let err = TrellisError::contract("/api/x", "returned page props");
    assert_eq!(err.status(), 500);
    assert_eq!(err.code(), "HANDLER_CONTRACT_VIOLATION");
  }

  #[test]
  fn method_not_allowed_is_405() {
    let err = TrellisError::MethodNotAllowed {
      route: "/api/posts".into(),
      method: Method::DELETE,
      allowed: vec![Method::GET],
    };
    assert_eq!(err.status(), 405);
    assert_eq!(err.to_string(), "DELETE is not allowed on /api/posts");
  }

  #[test]
  fn execution_error_preserves_cause() {
    let cause: BoxError = "database down".into();
    let err = TrellisError::HandlerExecution { route: "/".into(), source: cause };
    assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("database down"));
    assert_eq!(err.to_string(), "handler for / failed: database down");
  }

  #[test]
  fn invalid_route_display() {
    let err = TrellisError::invalid_route("pages/[...a]/x.rs", "catch-all must be last");
    assert_eq!(err.to_string(), "invalid route definition pages/[...a]/x.rs: catch-all must be last");
  }
}
