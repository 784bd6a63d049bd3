/* src/server/core/rust/src/context.rs */

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::matcher::Params;
use crate::page::LoaderResult;

/// Inbound request as handed over by the transport layer.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
  pub method: Method,
  pub uri: Uri,
  pub headers: HeaderMap,
  pub body: Bytes,
}

impl RawRequest {
  pub fn new(method: Method, uri: Uri) -> Self {
    Self { method, uri, headers: HeaderMap::new(), body: Bytes::new() }
  }

  #[cfg(test)]
  pub(crate) fn get(uri: &'static str) -> Self {
    Self::new(Method::GET, Uri::from_static(uri))
  }
}

/// Terminal JSON response produced by an API handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
  pub body: serde_json::Value,
  pub status_code: u16,
}

impl Response {
  pub fn new(body: serde_json::Value, status_code: u16) -> Self {
    Self { body, status_code }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
  pub location: String,
  #[serde(default)]
  pub permanent: bool,
}

impl Redirect {
  pub fn new(location: impl Into<String>, permanent: bool) -> Self {
    Self { location: location.into(), permanent }
  }

  /// 302 redirect.
  pub fn to(location: impl Into<String>) -> Self {
    Self::new(location, false)
  }

  pub fn status_code(&self) -> u16 {
    if self.permanent { 301 } else { 302 }
  }
}

/// Value returned by a handler or loader.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
  Response(Response),
  Redirect(Redirect),
  Loaded(LoaderResult),
}

impl From<Response> for Outcome {
  fn from(r: Response) -> Self {
    Self::Response(r)
  }
}

impl From<Redirect> for Outcome {
  fn from(r: Redirect) -> Self {
    Self::Redirect(r)
  }
}

impl From<LoaderResult> for Outcome {
  fn from(r: LoaderResult) -> Self {
    Self::Loaded(r)
  }
}

/// Per-request view handed to handlers and loaders.
/// Built once before invocation; exposes read-only accessors only.
#[derive(Debug)]
pub struct RequestContext {
  request: RawRequest,
  params: Params,
}

impl RequestContext {
  pub fn new(request: RawRequest, params: Params) -> Self {
    Self { request, params }
  }

  pub fn method(&self) -> &Method {
    &self.request.method
  }

  /// Original URL including the query string.
  pub fn url(&self) -> String {
    self.request.uri.to_string()
  }

  pub fn path(&self) -> &str {
    self.request.uri.path()
  }

  pub fn headers(&self) -> &HeaderMap {
    &self.request.headers
  }

  pub fn header(&self, name: &str) -> Option<&str> {
    self.request.headers.get(name).and_then(|v| v.to_str().ok())
  }

  pub fn body(&self) -> &Bytes {
    &self.request.body
  }

  pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
    serde_json::from_slice(&self.request.body)
  }

  pub fn params(&self) -> &Params {
    &self.params
  }

  pub fn param(&self, name: &str) -> Option<&str> {
    self.params.get(name)
  }

  /// Decoded query pairs in request order.
  pub fn query(&self) -> Vec<(String, String)> {
    let Some(query) = self.request.uri.query() else {
      return Vec::new();
    };
    query
      .split('&')
      .filter(|pair| !pair.is_empty())
      .map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        (decode_query(k), decode_query(v))
      })
      .collect()
  }

  pub fn response(&self, body: serde_json::Value, status_code: u16) -> Outcome {
    Outcome::Response(Response::new(body, status_code))
  }

  pub fn redirect(&self, location: impl Into<String>, permanent: bool) -> Outcome {
    Outcome::Redirect(Redirect::new(location, permanent))
  }
}

fn decode_query(raw: &str) -> String {
  let spaced = raw.replace('+', " ");
  percent_encoding::percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
