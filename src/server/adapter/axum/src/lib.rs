/* src/server/adapter/axum/src/lib.rs */

mod error;
mod handler;
mod render;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use trellis_server::TrellisApp;

pub use render::{JsonRenderer, PageRenderer};
/// Re-export trellis-server core for convenience
pub use trellis_server;

/// Extension trait that converts a started `TrellisApp` into an Axum router.
pub trait IntoAxumRouter {
  fn into_axum_router(self) -> axum::Router;
  fn into_axum_router_with(self, renderer: impl PageRenderer + 'static) -> axum::Router;
  fn serve(
    self,
    addr: &str,
  ) -> impl std::future::Future<Output = Result<(), Box<dyn std::error::Error>>> + Send;
}

impl IntoAxumRouter for TrellisApp {
  fn into_axum_router(self) -> axum::Router {
    self.into_axum_router_with(JsonRenderer)
  }

  fn into_axum_router_with(self, renderer: impl PageRenderer + 'static) -> axum::Router {
    handler::build_router(self, Arc::new(renderer))
  }

  /// Bind and serve. In dev mode the app root is watched for the lifetime
  /// of the server.
  async fn serve(self, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let _watcher = if self.context().dev { Some(self.watch()?) } else { None };
    let router = self.into_axum_router();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(target: "trellis", port = local_addr.port(), "listening");
    axum::serve(listener, router).await?;
    Ok(())
  }
}
