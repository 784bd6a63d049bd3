/* src/server/core/rust/src/log.rs */

// Structured log events emitted by the routing core. The sink is injected;
// `TracingLogger` is the default and forwards to the `tracing` facade.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
  Info,
  Error,
}

pub type Fields = Map<String, Value>;

pub trait Logger: Send + Sync {
  fn log(&self, level: Level, event: &str, fields: Fields);

  fn info(&self, event: &str, fields: Fields) {
    self.log(Level::Info, event, fields);
  }

  fn error(&self, event: &str, fields: Fields) {
    self.log(Level::Error, event, fields);
  }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
  fn log(&self, level: Level, event: &str, fields: Fields) {
    let fields = Value::Object(fields);
    match level {
      Level::Info => tracing::info!(target: "trellis", event, %fields),
      Level::Error => tracing::error!(target: "trellis", event, %fields),
    }
  }
}

/// Build a `Fields` map from `key => value` pairs.
#[macro_export]
macro_rules! fields {
  () => { $crate::log::Fields::new() };
  ($($key:literal => $value:expr),+ $(,)?) => {{
    let mut map = $crate::log::Fields::new();
    $( map.insert($key.to_string(), ::serde_json::json!($value)); )+
    map
  }};
}
