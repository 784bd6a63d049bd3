/* src/server/core/rust/src/page.rs */

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::Redirect;
use crate::matcher::Params;

/// Data produced by a page's server loader. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderResult {
  #[serde(default)]
  pub props: Option<Map<String, Value>>,
  #[serde(default)]
  pub metadata: Option<Map<String, Value>>,
  #[serde(default)]
  pub redirect: Option<Redirect>,
  #[serde(default)]
  pub class_name: Option<String>,
}

impl LoaderResult {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn props(mut self, props: Map<String, Value>) -> Self {
    self.props = Some(props);
    self
  }

  pub fn prop(mut self, key: impl Into<String>, value: Value) -> Self {
    self.props.get_or_insert_with(Map::new).insert(key.into(), value);
    self
  }

  pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
    self.metadata = Some(metadata);
    self
  }

  pub fn meta(mut self, key: impl Into<String>, value: Value) -> Self {
    self.metadata.get_or_insert_with(Map::new).insert(key.into(), value);
    self
  }

  pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
    self.class_name = Some(class_name.into());
    self
  }
}

/// Normalized payload handed to the rendering boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialData {
  pub pathname: String,
  pub params: Params,
  pub props: Map<String, Value>,
  pub metadata: Option<Map<String, Value>>,
  pub class_name: String,
}

/// Either the assembled page data or a redirect that bypassed assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum Assembled {
  Page(InitialData),
  Redirect(Redirect),
}

/// Fill defaults into a loader result. A redirect short-circuits and is
/// forwarded untouched.
pub fn assemble(result: LoaderResult, pathname: &str, params: Params) -> Assembled {
  if let Some(redirect) = result.redirect {
    return Assembled::Redirect(redirect);
  }
  Assembled::Page(InitialData {
    pathname: pathname.to_string(),
    params,
    props: result.props.unwrap_or_default(),
    metadata: result.metadata,
    class_name: result.class_name.unwrap_or_default(),
  })
}
