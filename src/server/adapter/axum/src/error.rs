/* src/server/adapter/axum/src/error.rs */

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use trellis_server::TrellisError;

/// Newtype wrapper to implement `IntoResponse` for `TrellisError`.
/// Required because Rust's orphan rule prevents `impl IntoResponse for TrellisError`
/// when both types are foreign to this crate.
pub(crate) struct AxumError(pub TrellisError);

impl IntoResponse for AxumError {
  fn into_response(self) -> Response {
    let err = self.0;
    let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = error_response(status, err.code(), &err.to_string());
    if let TrellisError::MethodNotAllowed { allowed, .. } = &err {
      let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
      if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(header::ALLOW, value);
      }
    }
    response
  }
}

impl From<TrellisError> for AxumError {
  fn from(err: TrellisError) -> Self {
    Self(err)
  }
}

/// JSON error envelope shared by core errors and unmatched paths.
pub(crate) fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
  let body = serde_json::json!({
    "ok": false,
    "error": {
      "code": code,
      "message": message,
      "transient": false,
    }
  });
  (status, axum::Json(body)).into_response()
}
