/* src/server/core/rust/src/matcher.rs */

use std::sync::Arc;

use percent_encoding::percent_decode_str;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::route::{RouteDefinition, RoutePattern, SegmentDescriptor};

/// Extracted path parameters in pattern declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    let value = value.into();
    match self.0.iter_mut().find(|(k, _)| *k == name) {
      Some(slot) => slot.1 = value,
      None => self.0.push((name, value)),
    }
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut params = Self::new();
    for (k, v) in iter {
      params.insert(k, v);
    }
    params
  }
}

impl Serialize for Params {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.0.len()))?;
    for (k, v) in &self.0 {
      map.serialize_entry(k, v)?;
    }
    map.end()
  }
}

#[derive(Debug, Clone)]
pub struct MatchResult {
  pub route: Arc<RouteDefinition>,
  pub params: Params,
}

/// Split a request path into decoded segments, dropping the query string,
/// the fragment, and empty segments.
pub fn normalize_path(path: &str) -> Vec<String> {
  let path = path.split(['?', '#']).next().unwrap_or_default();
  path
    .split('/')
    .filter(|s| !s.is_empty())
    .map(|s| match percent_decode_str(s).decode_utf8() {
      Ok(decoded) => decoded.into_owned(),
      Err(_) => s.to_string(),
    })
    .collect()
}

/// Match normalized segments against one pattern.
pub fn match_pattern(pattern: &RoutePattern, segments: &[String]) -> Option<Params> {
  let mut params = Params::new();
  let mut idx = 0;
  for descriptor in pattern.segments() {
    match descriptor {
      SegmentDescriptor::Static(literal) => {
        if segments.get(idx)? != literal {
          return None;
        }
        idx += 1;
      }
      SegmentDescriptor::Dynamic(name) => {
        params.insert(name.as_str(), segments.get(idx)?.as_str());
        idx += 1;
      }
      SegmentDescriptor::CatchAll(name) => {
        let rest = segments.get(idx..).filter(|rest| !rest.is_empty())?;
        params.insert(name.as_str(), rest.join("/"));
        idx = segments.len();
      }
    }
  }
  (idx == segments.len()).then_some(params)
}
