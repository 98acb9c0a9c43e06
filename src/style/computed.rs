//! Computed-value resolution
//!
//! Resolves a property's final computed value for an element: cascade
//! lookup, custom-property/attr()/env() substitution, arithmetic
//! evaluation, unit conversion, and inheritance. Queries are pure functions
//! of (element, rule set, device context) at call time — nothing is cached,
//! so callers re-query after any mutation.
//!
//! Error policy: a resolution failure (unresolvable substitution, cycle,
//! out-of-context viewport unit, bad arithmetic) is recorded once per
//! top-level property resolution, and the property falls back to its
//! inherited value (inherited properties) or initial value (otherwise).
//! Sibling properties are unaffected.

use crate::config::EngineConfig;
use crate::css::lexical::LexicalValue;
use crate::css::selectors::PseudoElement;
use crate::dom::{Document, ElementId, ElementStateProvider, NoState, VisitedOracle};
use crate::error::{ErrorCollector, ResolveError, Result};
use crate::style::calc::{CalcError, CalcKind};
use crate::style::cascade::{Cascade, CascadedStyle, CascadedValue, RuleSet};
use crate::style::custom_properties::{CustomPropertyRegistry, CustomPropertyStore};
use crate::style::device::DeviceContext;
use crate::style::matcher::MatchContext;
use crate::style::properties::{
  all_longhands, expand_shorthand, initial_value, is_inherited, parse_value_tokens, property_info,
};
use crate::style::values::{Length, UnitContext, UnitError, Value};
use crate::style::var_resolution::{substitute, SubstitutionError, SubstitutionScope};
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;

/// The `medium` absolute font size, basis of the keyword scale.
const MEDIUM_FONT_SIZE: f32 = 16.0;

/// Factor between adjacent entries of the font-size keyword scale, also
/// used by `smaller`/`larger`.
const FONT_SIZE_SCALE_STEP: f32 = 1.2;

/// The `normal` line-height factor.
const NORMAL_LINE_HEIGHT: f32 = 1.2;

const NO_STATE: &NoState = &NoState;

/// The per-query snapshot a computed style was resolved from.
///
/// Owns nothing mutable; creating one is free. Dropping and re-creating it
/// after a mutation is the intended invalidation model.
pub struct StyleResolver<'a> {
  pub document: &'a Document,
  pub rules: &'a RuleSet,
  pub device: &'a DeviceContext,
  pub registry: &'a CustomPropertyRegistry,
  pub config: &'a EngineConfig,
  state: &'a dyn ElementStateProvider,
  visited_links: &'a dyn VisitedOracle,
}

impl<'a> StyleResolver<'a> {
  pub fn new(
    document: &'a Document,
    rules: &'a RuleSet,
    device: &'a DeviceContext,
    registry: &'a CustomPropertyRegistry,
    config: &'a EngineConfig,
  ) -> Self {
    Self {
      document,
      rules,
      device,
      registry,
      config,
      state: NO_STATE,
      visited_links: NO_STATE,
    }
  }

  pub fn with_state_provider(mut self, state: &'a dyn ElementStateProvider) -> Self {
    self.state = state;
    self
  }

  pub fn with_visited_oracle(mut self, visited: &'a dyn VisitedOracle) -> Self {
    self.visited_links = visited;
    self
  }

  fn match_ctx(&self) -> MatchContext<'a> {
    MatchContext::new(self.document, self.config)
      .with_state_provider(self.state)
      .with_visited_oracle(self.visited_links)
  }

  /// The element's cascaded (pre-resolution) style.
  pub fn cascaded_style(
    &self,
    element: ElementId,
    pseudo: Option<PseudoElement>,
    collector: &mut ErrorCollector,
  ) -> CascadedStyle {
    Cascade::new(self.rules, self.config).cascaded_style(element, pseudo, &self.match_ctx(), collector)
  }

  /// Resolve one property to its computed value.
  ///
  /// Resolution-time failures are recorded against the element and the
  /// property falls back to its inherited/initial value; only an unknown
  /// property name is a caller error.
  pub fn computed_value(&self, element: ElementId, property: &str, collector: &mut ErrorCollector) -> Result<Value> {
    if property.starts_with("--") {
      return Ok(self.computed_custom_property(element, property, collector));
    }

    let info = property_info(property).ok_or_else(|| ResolveError::UnknownProperty {
      property: property.to_string(),
    })?;
    if info.is_shorthand() {
      return Err(
        ResolveError::UnknownProperty {
          property: property.to_string(),
        }
        .into(),
      );
    }

    let cascaded = self.cascaded_style(element, None, collector).get(property).cloned();
    let Some(cascaded) = cascaded else {
      return self.inherited_or_initial(element, property, collector);
    };

    match self.resolve_cascaded(element, property, &cascaded) {
      Ok(value) => Ok(value),
      Err(error) => {
        // One error per top-level property resolution, then the
        // guaranteed-invalid fallback.
        collector.element_error(element, error);
        self.inherited_or_initial(element, property, collector)
      }
    }
  }

  /// Resolve every known longhand plus all visible custom properties.
  pub fn computed_style(&self, element: ElementId, collector: &mut ErrorCollector) -> ComputedStyle {
    let mut values = FxHashMap::default();
    for property in all_longhands() {
      if let Ok(value) = self.computed_value(element, property, collector) {
        values.insert(property.to_string(), value);
      }
    }

    let mut custom = CustomPropertyStore::new();
    for name in self.visible_custom_properties(element) {
      let value = self.computed_custom_property(element, &name, collector);
      if let Value::Lexical(lexical) = value {
        custom.insert(name, lexical);
      }
    }

    ComputedStyle { values, custom }
  }

  /// Custom property names reaching this element (own cascade plus
  /// inheriting ancestors plus registered initials).
  fn visible_custom_properties(&self, element: ElementId) -> Vec<String> {
    let mut scratch = ErrorCollector::new();
    let mut names = FxHashSet::default();
    let mut chain = vec![element];
    chain.extend(self.document.ancestors(element));
    for (depth, el) in chain.into_iter().enumerate() {
      let style = self.cascaded_style(el, None, &mut scratch);
      for name in style.property_names() {
        if name.starts_with("--") && (depth == 0 || self.registry.inherits(name)) {
          names.insert(name.clone());
        }
      }
    }
    for (name, _) in self.registry.iter() {
      names.insert(name.clone());
    }
    let mut out: Vec<String> = names.into_iter().collect();
    out.sort();
    out
  }

  fn computed_custom_property(&self, element: ElementId, name: &str, collector: &mut ErrorCollector) -> Value {
    let Some(lexical) = self.custom_property_value(element, name) else {
      return Value::Lexical(LexicalValue::default());
    };
    if !lexical.has_references() {
      return Value::Lexical(lexical);
    }
    let scope = ElementScope {
      resolver: self,
      element,
    };
    match substitute(&lexical, &scope) {
      Ok(resolved) => Value::Lexical(resolved),
      Err(error) => {
        collector.element_error(element, self.substitution_error(name, error));
        Value::Lexical(LexicalValue::default())
      }
    }
  }

  /// Lexical value of a custom property per the lookup order: the
  /// element's cascade, then ancestors (when the property inherits, the
  /// default for unregistered names), then the registered initial value.
  pub fn custom_property_value(&self, element: ElementId, name: &str) -> Option<LexicalValue> {
    let mut scratch = ErrorCollector::new();
    let cascade = Cascade::new(self.rules, self.config);
    let ctx = self.match_ctx();
    if let Some(value) = cascade.cascaded_custom_property(element, name, &ctx, &mut scratch) {
      return Some(value);
    }
    if self.registry.inherits(name) {
      let mut current = self.document.parent_element(element);
      while let Some(ancestor) = current {
        if let Some(value) = cascade.cascaded_custom_property(ancestor, name, &ctx, &mut scratch) {
          return Some(value);
        }
        current = self.document.parent_element(ancestor);
      }
    }
    self.registry.initial_value(name).cloned()
  }

  // ==========================================================================
  // Resolution internals
  // ==========================================================================

  fn resolve_cascaded(
    &self,
    element: ElementId,
    property: &str,
    cascaded: &CascadedValue,
  ) -> std::result::Result<Value, ResolveError> {
    let mut value = cascaded.value.clone();

    if let Value::Lexical(lexical) = &value {
      let scope = ElementScope {
        resolver: self,
        element,
      };
      let resolved = substitute(lexical, &scope).map_err(|e| self.substitution_error(property, e))?;
      let tokens = resolved.into_tokens();

      // A pending shorthand expands only after substitution; then the
      // requested longhand is picked out of the expansion.
      value = match &cascaded.origin {
        Some(shorthand) => expand_shorthand(shorthand, &tokens)
          .ok()
          .and_then(|assignments| {
            assignments
              .into_iter()
              .find(|(longhand, _)| *longhand == property)
          })
          .and_then(|(longhand, longhand_tokens)| parse_value_tokens(longhand, &longhand_tokens).ok())
          .ok_or_else(|| ResolveError::InvalidSubstitutionResult {
            property: property.to_string(),
            value: crate::css::lexical::serialize(&tokens),
          })?,
        None => parse_value_tokens(property, &tokens).map_err(|()| ResolveError::InvalidSubstitutionResult {
          property: property.to_string(),
          value: crate::css::lexical::serialize(&tokens),
        })?,
      };
    }

    // CSS-wide keywords (possibly only visible after substitution).
    if let Some(word) = value.as_keyword() {
      match word {
        "inherit" => return self.parent_computed(element, property),
        "initial" => return self.initial_computed(element, property),
        "unset" | "revert" => {
          return if is_inherited(property) {
            self.parent_computed(element, property)
          } else {
            self.initial_computed(element, property)
          };
        }
        _ => {}
      }
    }

    self.to_computed(element, property, value)
  }

  /// Convert a specified value into its computed form: relative units
  /// resolve to px, absolute units keep their reported unit, percentages
  /// stay percentages (except font-size, which resolves).
  fn to_computed(
    &self,
    element: ElementId,
    property: &str,
    value: Value,
  ) -> std::result::Result<Value, ResolveError> {
    if property == "font-size" {
      let parent_size = self.parent_font_size(element);
      return Ok(Value::Length(Length::px(self.font_size_from_value(
        &value,
        element,
        parent_size,
      )?)));
    }

    match value {
      Value::Length(length) => {
        if length.unit.is_absolute() {
          return Ok(Value::Length(length));
        }
        let ctx = self.unit_context(element);
        let px = length.resolve(&ctx).map_err(|e| self.unit_error(property, e))?;
        Ok(Value::Length(Length::px(px)))
      }
      Value::Calc(expr) => {
        let ctx = self.unit_context(element);
        let result = expr.evaluate(&ctx).map_err(|e| self.calc_error(property, e))?;
        Ok(match result.kind {
          CalcKind::Px => Value::Length(Length::px(result.value)),
          CalcKind::Number => Value::Number(result.value),
          CalcKind::Percent => Value::Percentage(result.value),
        })
      }
      Value::List(items) => {
        let resolved = items
          .into_iter()
          .map(|item| self.to_computed(element, property, item))
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Value::List(resolved))
      }
      Value::CommaList(items) => {
        let resolved = items
          .into_iter()
          .map(|item| self.to_computed(element, property, item))
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Value::CommaList(resolved))
      }
      other => Ok(other),
    }
  }

  fn inherited_or_initial(&self, element: ElementId, property: &str, collector: &mut ErrorCollector) -> Result<Value> {
    if is_inherited(property) {
      if let Some(parent) = self.document.parent_element(element) {
        return self.computed_value(parent, property, collector);
      }
    }
    self.initial_computed(element, property).map_err(Into::into)
  }

  fn parent_computed(&self, element: ElementId, property: &str) -> std::result::Result<Value, ResolveError> {
    match self.document.parent_element(element) {
      Some(parent) => {
        // Inheritance consumes the parent's computed value; parent-side
        // errors are the parent's own resolutions to report.
        let mut scratch = ErrorCollector::new();
        self
          .computed_value(parent, property, &mut scratch)
          .map_err(|_| ResolveError::UnknownProperty {
            property: property.to_string(),
          })
      }
      None => self.initial_computed(element, property),
    }
  }

  fn initial_computed(&self, element: ElementId, property: &str) -> std::result::Result<Value, ResolveError> {
    let initial = initial_value(property).ok_or_else(|| ResolveError::UnknownProperty {
      property: property.to_string(),
    })?;
    self.to_computed(element, property, initial)
  }

  // ==========================================================================
  // Font metrics chain
  // ==========================================================================

  fn parent_font_size(&self, element: ElementId) -> f32 {
    match self.document.parent_element(element) {
      Some(parent) => self.font_size_px(parent),
      None => self.device.root_font_size,
    }
  }

  /// The element's computed font size in px, walking the inheritance chain
  /// as needed. Unresolvable declarations fall back to the inherited size
  /// (reported by the owning property resolution, not here).
  pub fn font_size_px(&self, element: ElementId) -> f32 {
    let parent_size = self.parent_font_size(element);
    let mut scratch = ErrorCollector::new();
    let cascaded = self.cascaded_style(element, None, &mut scratch);
    let Some(cascaded_value) = cascaded.get("font-size") else {
      return parent_size;
    };

    let mut value = cascaded_value.value.clone();
    if let Value::Lexical(lexical) = &value {
      let scope = ElementScope {
        resolver: self,
        element,
      };
      let Ok(resolved) = substitute(lexical, &scope) else {
        return parent_size;
      };
      let Ok(parsed) = parse_value_tokens("font-size", &resolved.into_tokens()) else {
        return parent_size;
      };
      value = parsed;
    }

    self
      .font_size_from_value(&value, element, parent_size)
      .unwrap_or(parent_size)
  }

  /// Font sizes resolve against the *parent's* metrics: `em` on font-size
  /// means "times the inherited size", keywords map through the fixed
  /// non-linear scale.
  fn font_size_from_value(
    &self,
    value: &Value,
    element: ElementId,
    parent_size: f32,
  ) -> std::result::Result<f32, ResolveError> {
    let parent_line_height = match self.document.parent_element(element) {
      Some(parent) => self.line_height_px(parent),
      None => self.device.root_line_height,
    };
    let ctx = UnitContext::new(self.device, parent_size, parent_line_height).with_percentage_base(parent_size);

    match value {
      Value::Keyword(word) => Ok(match word.as_str() {
        "xx-small" => MEDIUM_FONT_SIZE * 3.0 / 5.0,
        "x-small" => MEDIUM_FONT_SIZE * 3.0 / 4.0,
        "small" => MEDIUM_FONT_SIZE * 8.0 / 9.0,
        "medium" => MEDIUM_FONT_SIZE,
        "large" => MEDIUM_FONT_SIZE * 6.0 / 5.0,
        "x-large" => MEDIUM_FONT_SIZE * 3.0 / 2.0,
        "xx-large" => MEDIUM_FONT_SIZE * 2.0,
        "smaller" => parent_size / FONT_SIZE_SCALE_STEP,
        "larger" => parent_size * FONT_SIZE_SCALE_STEP,
        "initial" => MEDIUM_FONT_SIZE,
        _ => parent_size,
      }),
      Value::Length(length) => length.resolve(&ctx).map_err(|e| self.unit_error("font-size", e)),
      Value::Percentage(p) => Ok(parent_size * p / 100.0),
      Value::Calc(expr) => {
        let result = expr.evaluate(&ctx).map_err(|e| self.calc_error("font-size", e))?;
        match result.kind {
          CalcKind::Px => Ok(result.value),
          _ => Err(ResolveError::InvalidArithmetic {
            property: "font-size".to_string(),
            reason: "font-size arithmetic must produce a length".to_string(),
          }),
        }
      }
      _ => Ok(parent_size),
    }
  }

  /// The element's used line height in px (`normal` maps to a fixed factor
  /// of the font size; numbers multiply the element's own font size).
  pub fn line_height_px(&self, element: ElementId) -> f32 {
    let font_size = self.font_size_px(element);
    match self.line_height_factor(element) {
      LineHeight::Normal => font_size * NORMAL_LINE_HEIGHT,
      LineHeight::Number(factor) => font_size * factor,
      LineHeight::Px(px) => px,
    }
  }

  fn line_height_factor(&self, element: ElementId) -> LineHeight {
    let mut scratch = ErrorCollector::new();
    let cascaded = self.cascaded_style(element, None, &mut scratch);
    let Some(cascaded_value) = cascaded.get("line-height") else {
      // line-height inherits; numbers stay numbers up the chain.
      return match self.document.parent_element(element) {
        Some(parent) => self.line_height_factor(parent),
        None => LineHeight::Normal,
      };
    };

    let mut value = cascaded_value.value.clone();
    if let Value::Lexical(lexical) = &value {
      let scope = ElementScope {
        resolver: self,
        element,
      };
      let Ok(resolved) = substitute(lexical, &scope) else {
        return LineHeight::Normal;
      };
      let Ok(parsed) = parse_value_tokens("line-height", &resolved.into_tokens()) else {
        return LineHeight::Normal;
      };
      value = parsed;
    }

    let font_size = self.font_size_px(element);
    match value {
      Value::Keyword(ref word) if word == "normal" => LineHeight::Normal,
      Value::Number(factor) => LineHeight::Number(factor),
      Value::Percentage(p) => LineHeight::Px(font_size * p / 100.0),
      Value::Length(length) => {
        let parent_line = match self.document.parent_element(element) {
          Some(parent) => self.line_height_px(parent),
          None => self.device.root_line_height,
        };
        let ctx = UnitContext::new(self.device, font_size, parent_line);
        match length.resolve(&ctx) {
          Ok(px) => LineHeight::Px(px),
          Err(_) => LineHeight::Normal,
        }
      }
      _ => LineHeight::Normal,
    }
  }

  fn unit_context(&self, element: ElementId) -> UnitContext<'a> {
    UnitContext::new(
      self.device,
      self.font_size_px(element),
      self.line_height_px(element),
    )
  }

  // ==========================================================================
  // Error mapping
  // ==========================================================================

  fn substitution_error(&self, property: &str, error: SubstitutionError) -> ResolveError {
    let property = property.to_string();
    match error {
      SubstitutionError::Cycle(name) => ResolveError::CircularReference { property, name },
      SubstitutionError::MissingVariable(name) | SubstitutionError::EmptyVariable(name) => {
        ResolveError::UnresolvedReference { property, name }
      }
      SubstitutionError::MissingAttribute(attribute) => ResolveError::MissingAttribute { property, attribute },
      SubstitutionError::AttributeTypeMismatch { attribute, expected } => ResolveError::AttributeTypeMismatch {
        property,
        attribute,
        expected,
      },
      SubstitutionError::MissingEnvironment(name) => ResolveError::UnknownEnvironmentValue { property, name },
      SubstitutionError::Malformed(text) => ResolveError::InvalidSubstitutionResult { property, value: text },
    }
  }

  fn unit_error(&self, property: &str, error: UnitError) -> ResolveError {
    match error {
      UnitError::ViewportRequired(unit) => ResolveError::ViewportContextRequired {
        property: property.to_string(),
        unit: unit.to_string(),
      },
      UnitError::PercentageBaseRequired => ResolveError::InvalidArithmetic {
        property: property.to_string(),
        reason: "percentage with no resolution base".to_string(),
      },
    }
  }

  fn calc_error(&self, property: &str, error: CalcError) -> ResolveError {
    match error {
      CalcError::Unit(unit_error) => self.unit_error(property, unit_error),
      CalcError::Invalid(reason) => ResolveError::InvalidArithmetic {
        property: property.to_string(),
        reason,
      },
    }
  }
}

enum LineHeight {
  Normal,
  Number(f32),
  Px(f32),
}

/// Substitution scope backed by the resolver's cascade chain.
struct ElementScope<'r, 'a> {
  resolver: &'r StyleResolver<'a>,
  element: ElementId,
}

impl SubstitutionScope for ElementScope<'_, '_> {
  fn custom_property(&self, name: &str) -> Option<LexicalValue> {
    self.resolver.custom_property_value(self.element, name)
  }

  fn attribute(&self, name: &str) -> Option<String> {
    self
      .resolver
      .document
      .attribute(self.element, name)
      .map(str::to_string)
  }

  fn env_value(&self, name: &str) -> Option<String> {
    self.resolver.device.env_value(name).map(str::to_string)
  }
}

/// Final computed property map for one element, owned by the caller.
#[derive(Debug, Clone, Default)]
pub struct ComputedStyle {
  values: FxHashMap<String, Value>,
  custom: CustomPropertyStore,
}

impl ComputedStyle {
  pub fn get(&self, property: &str) -> Option<&Value> {
    if property.starts_with("--") {
      return None;
    }
    self.values.get(property)
  }

  /// Serialized computed value text, empty for unknown properties.
  pub fn value_text(&self, property: &str) -> String {
    if property.starts_with("--") {
      return self
        .custom
        .get(property)
        .map(|v| v.css_text())
        .unwrap_or_default();
    }
    self
      .values
      .get(property)
      .map(Value::to_css_string)
      .unwrap_or_default()
  }

  pub fn custom_properties(&self) -> &CustomPropertyStore {
    &self.custom
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}
