/* src/server/adapter/axum/src/render.rs */

use axum::response::{IntoResponse, Response};
use trellis_server::InitialData;

/// Rendering boundary: turns assembled page data into an HTTP response.
pub trait PageRenderer: Send + Sync {
  fn render(&self, data: InitialData) -> Response;
}

/// Answers page requests with the initial data as a JSON document.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

impl PageRenderer for JsonRenderer {
  fn render(&self, data: InitialData) -> Response {
    axum::Json(data).into_response()
  }
}

impl<F> PageRenderer for F
where
  F: Fn(InitialData) -> Response + Send + Sync,
{
  fn render(&self, data: InitialData) -> Response {
    self(data)
  }
}
