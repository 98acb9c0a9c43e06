//! Error types and the error collector
//!
//! Parsing and resolution are best-effort: an invalid declaration never
//! aborts the rest of its block, and a failed property resolution never
//! aborts sibling properties. Failures are surfaced through the
//! [`ErrorCollector`] rather than by propagating up the call stack; the
//! `Result`-returning APIs exist for callers that want a single property's
//! outcome directly.
//!
//! All errors use the `thiserror` crate for minimal boilerplate and proper
//! error trait implementations.

use crate::dom::ElementId;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Result type alias for faststyle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
  /// Declaration or selector parsing error
  #[error("Parse error: {0}")]
  Parse(#[from] ParseError),

  /// Computed-value resolution error
  #[error("Resolve error: {0}")]
  Resolve(#[from] ResolveError),

  /// Generic error for miscellaneous issues
  #[error("{0}")]
  Other(String),
}

/// Errors rejecting a declaration at parse/set time.
///
/// These never escape the set-operation boundary as failures of the block;
/// the offending declaration is dropped and the error recorded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
  /// Property name contains NUL, interior whitespace, or other garbage
  #[error("Invalid property name: {name:?}")]
  InvalidPropertyName { name: String },

  /// Value does not parse under the property's grammar
  #[error("Invalid value for property '{property}': {value}")]
  InvalidPropertyValue { property: String, value: String },

  /// Selector text could not be parsed
  #[error("Invalid selector '{selector}': {message}")]
  InvalidSelector { selector: String, message: String },

  /// Recognized compatibility marker present but its flag is disabled
  #[error("Declaration '{property}' dropped: quirk marker '{marker}' is not enabled")]
  QuirkNotEnabled { property: String, marker: &'static str },
}

/// Errors arising while resolving a computed value.
///
/// Each maps to the guaranteed-invalid outcome for the affected property:
/// the resolver substitutes the inherited value (inherited properties) or
/// the initial value (otherwise) and records the error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
  /// var() reference to a custom property with no value, no registered
  /// initial, and no usable fallback
  #[error("Unresolved reference '{name}' while resolving '{property}'")]
  UnresolvedReference { property: String, name: String },

  /// Substitution cycle through var()/attr()
  #[error("Circular reference through '{name}' while resolving '{property}'")]
  CircularReference { property: String, name: String },

  /// attr() on a missing attribute with no fallback
  #[error("Missing attribute '{attribute}' while resolving '{property}'")]
  MissingAttribute { property: String, attribute: String },

  /// attr() value does not parse under the requested type
  #[error("Attribute '{attribute}' does not match type '{expected}' while resolving '{property}'")]
  AttributeTypeMismatch {
    property: String,
    attribute: String,
    expected: String,
  },

  /// env() name unknown to the device context and no fallback given
  #[error("Unknown environment value '{name}' while resolving '{property}'")]
  UnknownEnvironmentValue { property: String, name: String },

  /// Viewport-relative unit used without a viewport in the device context
  #[error("Cannot resolve '{unit}' in '{property}': no viewport dimensions available")]
  ViewportContextRequired { property: String, unit: String },

  /// Arithmetic expression that cannot be evaluated (bad operands, mixed
  /// incompatible units, division by zero)
  #[error("Invalid arithmetic in '{property}': {reason}")]
  InvalidArithmetic { property: String, reason: String },

  /// Substitution succeeded but the resulting value does not parse under
  /// the property's grammar
  #[error("Substituted value {value:?} is invalid for '{property}'")]
  InvalidSubstitutionResult { property: String, value: String },

  /// Property unknown to the property database
  #[error("Unknown property '{property}'")]
  UnknownProperty { property: String },
}

/// Issue severity recorded by the collector.
///
/// Disabled-but-recognized quirk markers record warnings; everything else
/// that fails records an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  Warning,
  Error,
}

/// One recorded issue, optionally attributed to an element.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
  pub severity: Severity,
  pub element: Option<ElementId>,
  pub error: Error,
}

/// Accumulates parse/cascade/resolution issues.
///
/// Supports per-element sets plus a document-wide aggregate, and reset
/// scoped to one element or the whole document. Mutated during cascade
/// application and computed-value resolution; never consulted by the engine
/// itself.
#[derive(Debug, Clone, Default)]
pub struct ErrorCollector {
  issues: Vec<Issue>,
}

impl ErrorCollector {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record an error against the whole document.
  pub fn error(&mut self, error: impl Into<Error>) {
    self.push(Severity::Error, None, error.into());
  }

  /// Record an error attributed to an element.
  pub fn element_error(&mut self, element: ElementId, error: impl Into<Error>) {
    self.push(Severity::Error, Some(element), error.into());
  }

  /// Record a warning against the whole document.
  pub fn warning(&mut self, error: impl Into<Error>) {
    self.push(Severity::Warning, None, error.into());
  }

  /// Record a warning attributed to an element.
  pub fn element_warning(&mut self, element: ElementId, error: impl Into<Error>) {
    self.push(Severity::Warning, Some(element), error.into());
  }

  fn push(&mut self, severity: Severity, element: Option<ElementId>, error: Error) {
    log::debug!("style issue ({severity:?}): {error}");
    self.issues.push(Issue {
      severity,
      element,
      error,
    });
  }

  /// All recorded issues, in recording order.
  pub fn issues(&self) -> &[Issue] {
    &self.issues
  }

  /// Issues attributed to a specific element.
  pub fn issues_for(&self, element: ElementId) -> impl Iterator<Item = &Issue> {
    self.issues.iter().filter(move |i| i.element == Some(element))
  }

  pub fn error_count(&self) -> usize {
    self.issues.iter().filter(|i| i.severity == Severity::Error).count()
  }

  pub fn warning_count(&self) -> usize {
    self.issues.iter().filter(|i| i.severity == Severity::Warning).count()
  }

  pub fn is_empty(&self) -> bool {
    self.issues.is_empty()
  }

  /// Errors grouped per element, for diagnostics surfaces.
  pub fn by_element(&self) -> FxHashMap<ElementId, Vec<&Issue>> {
    let mut map: FxHashMap<ElementId, Vec<&Issue>> = FxHashMap::default();
    for issue in &self.issues {
      if let Some(el) = issue.element {
        map.entry(el).or_default().push(issue);
      }
    }
    map
  }

  /// Drop all issues attributed to one element.
  pub fn reset_element(&mut self, element: ElementId) {
    self.issues.retain(|i| i.element != Some(element));
  }

  /// Drop everything.
  pub fn reset(&mut self) {
    self.issues.clear();
  }
}
