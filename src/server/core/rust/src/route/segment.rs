/* src/server/core/rust/src/route/segment.rs */

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static PARAM_NAME: LazyLock<Regex> = LazyLock::new(|| {
  #[allow(clippy::unwrap_used)]
  Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SegmentDescriptor {
  Static(String),
  Dynamic(String),
  CatchAll(String),
}

impl SegmentDescriptor {
  /// Parse one directory or file-stem component.
  pub fn parse(raw: &str) -> Result<Self, String> {
    if raw.is_empty() {
      return Err("empty path segment".to_string());
    }
    let Some(inner) = raw.strip_prefix('[') else {
      if raw.contains(['[', ']']) {
        return Err(format!("unbalanced brackets in `{raw}`"));
      }
      return Ok(Self::Static(raw.to_string()));
    };
    let Some(inner) = inner.strip_suffix(']') else {
      return Err(format!("unbalanced brackets in `{raw}`"));
    };
    let (name, catch_all) = match inner.strip_prefix("...") {
      Some(name) => (name, true),
      None => (inner, false),
    };
    if !PARAM_NAME.is_match(name) {
      return Err(format!("invalid parameter name in `{raw}`"));
    }
    Ok(if catch_all { Self::CatchAll(name.to_string()) } else { Self::Dynamic(name.to_string()) })
  }

  /// Specificity rank used for precedence: lower is more specific.
  pub fn rank(&self) -> u8 {
    match self {
      Self::Static(_) => 0,
      Self::Dynamic(_) => 1,
      Self::CatchAll(_) => 2,
    }
  }

  pub fn param_name(&self) -> Option<&str> {
    match self {
      Self::Static(_) => None,
      Self::Dynamic(name) | Self::CatchAll(name) => Some(name),
    }
  }
}

impl fmt::Display for SegmentDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Static(lit) => f.write_str(lit),
      Self::Dynamic(name) => write!(f, "[{name}]"),
      Self::CatchAll(name) => write!(f, "[...{name}]"),
    }
  }
}

/// Ordered segment list of one route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RoutePattern {
  segments: Vec<SegmentDescriptor>,
}

impl RoutePattern {
  /// Build a pattern, enforcing the catch-all and unique-name invariants.
  pub fn new(segments: Vec<SegmentDescriptor>) -> Result<Self, String> {
    let catch_alls = segments.iter().filter(|s| matches!(s, SegmentDescriptor::CatchAll(_))).count();
    if catch_alls > 1 {
      return Err("more than one catch-all segment".to_string());
    }
    if let Some(pos) = segments.iter().position(|s| matches!(s, SegmentDescriptor::CatchAll(_)))
      && pos + 1 != segments.len()
    {
      return Err("catch-all segment must be the last segment".to_string());
    }
    let mut seen = std::collections::HashSet::new();
    for name in segments.iter().filter_map(SegmentDescriptor::param_name) {
      if !seen.insert(name) {
        return Err(format!("duplicate parameter `{name}`"));
      }
    }
    Ok(Self { segments })
  }

  /// Parse a display pattern such as `/api/posts/[id]`.
  pub fn parse(pattern: &str) -> Result<Self, String> {
    let segments = pattern
      .split('/')
      .filter(|s| !s.is_empty())
      .map(SegmentDescriptor::parse)
      .collect::<Result<Vec<_>, _>>()?;
    Self::new(segments)
  }

  pub fn segments(&self) -> &[SegmentDescriptor] {
    &self.segments
  }

  pub fn static_count(&self) -> usize {
    self.segments.iter().filter(|s| matches!(s, SegmentDescriptor::Static(_))).count()
  }

  pub fn has_catch_all(&self) -> bool {
    matches!(self.segments.last(), Some(SegmentDescriptor::CatchAll(_)))
  }
}

impl fmt::Display for RoutePattern {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.segments.is_empty() {
      return f.write_str("/");
    }
    for seg in &self.segments {
      write!(f, "/{seg}")?;
    }
    Ok(())
  }
}
