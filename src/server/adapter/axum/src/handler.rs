/* src/server/adapter/axum/src/handler.rs */

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::Router;
use trellis_server::{Dispatch, RawRequest, TrellisApp, TrellisError};

use crate::error::{AxumError, error_response};
use crate::render::PageRenderer;

pub(crate) struct AppState {
  pub app: TrellisApp,
  pub renderer: Arc<dyn PageRenderer>,
}

pub(crate) fn build_router(app: TrellisApp, renderer: Arc<dyn PageRenderer>) -> Router {
  // Every path goes through the core's own matcher, so the whole app is a fallback.
  Router::new().fallback(dispatch).with_state(Arc::new(AppState { app, renderer }))
}

async fn dispatch(
  State(state): State<Arc<AppState>>,
  method: Method,
  uri: Uri,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Response, AxumError> {
  let path = uri.path().to_string();
  let request = RawRequest { method, uri, headers, body };

  let Some(dispatch) = state.app.handle(request).await? else {
    return Ok(error_response(StatusCode::NOT_FOUND, "NOT_FOUND", &format!("no route matches {path}")));
  };

  Ok(match dispatch {
    Dispatch::Response(response) => {
      let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
      (status, axum::Json(response.body)).into_response()
    }
    Dispatch::Redirect(redirect) => {
      let status = StatusCode::from_u16(redirect.status_code()).unwrap_or(StatusCode::FOUND);
      let location = HeaderValue::from_str(&redirect.location).map_err(|_| {
        TrellisError::contract(path, format!("redirect location {:?} is not a valid header", redirect.location))
      })?;
      (status, [(header::LOCATION, location)]).into_response()
    }
    Dispatch::Page(data) => state.renderer.render(data),
  })
}
