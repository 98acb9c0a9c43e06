//! The cascade
//!
//! Collects the declarations applying to an element, orders them by
//! priority tier, quirk-marker rank, selector specificity and source order,
//! and produces the winning `(value, priority)` per longhand. Inline
//! (`style` attribute) declarations participate with a specificity above
//! any selector.
//!
//! Reference: CSS Cascading and Inheritance Level 4
//! <https://www.w3.org/TR/css-cascade-4/>

use crate::config::EngineConfig;
use crate::css::lexical::LexicalValue;
use crate::css::parser::Priority;
use crate::css::selectors::{NamespaceMap, PseudoElement, SelectorList};
use crate::dom::{Document, ElementId};
use crate::error::{ErrorCollector, ParseError};
use crate::style::custom_properties::CustomPropertyStore;
use crate::style::declaration::StyleDeclaration;
use crate::style::matcher::{self, MatchContext};
use crate::style::specificity::Specificity;
use crate::style::values::Value;
use rustc_hash::FxHashMap;

/// One style rule: a selector list and its declaration block.
#[derive(Debug, Clone)]
pub struct StyleRule {
  pub selectors: SelectorList,
  pub declarations: StyleDeclaration,
}

/// An ordered collection of style rules. Position is source order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
  pub rules: Vec<StyleRule>,
}

impl RuleSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Parse and append one rule. An unparsable selector drops the whole
  /// rule (reported, not fatal); invalid declarations inside the block are
  /// dropped individually.
  pub fn push_rule(
    &mut self,
    selector_text: &str,
    declaration_text: &str,
    config: &EngineConfig,
    collector: &mut ErrorCollector,
  ) -> bool {
    self.push_rule_with_namespaces(selector_text, declaration_text, &NamespaceMap::default(), config, collector)
  }

  pub fn push_rule_with_namespaces(
    &mut self,
    selector_text: &str,
    declaration_text: &str,
    namespaces: &NamespaceMap,
    config: &EngineConfig,
    collector: &mut ErrorCollector,
  ) -> bool {
    match SelectorList::parse_with_namespaces(selector_text, namespaces) {
      Ok(selectors) => {
        let declarations = StyleDeclaration::parse(declaration_text, config, collector);
        self.rules.push(StyleRule { selectors, declarations });
        true
      }
      Err(message) => {
        collector.error(ParseError::InvalidSelector {
          selector: selector_text.to_string(),
          message,
        });
        false
      }
    }
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }
}

/// The winning declaration for one property after the cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadedValue {
  pub value: Value,
  pub priority: Priority,
  pub specificity: Specificity,
  /// The shorthand this value was expanded from, when it is still awaiting
  /// substitution as a whole.
  pub origin: Option<String>,
}

/// Per-element, per-longhand winners.
#[derive(Debug, Clone, Default)]
pub struct CascadedStyle {
  properties: FxHashMap<String, CascadedValue>,
}

impl CascadedStyle {
  pub fn get(&self, name: &str) -> Option<&CascadedValue> {
    self.properties.get(name)
  }

  pub fn is_empty(&self) -> bool {
    self.properties.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &CascadedValue)> {
    self.properties.iter()
  }

  pub fn property_names(&self) -> impl Iterator<Item = &String> {
    self.properties.keys()
  }

  /// The custom properties set on this element by the cascade, lexically.
  pub fn custom_properties(&self) -> CustomPropertyStore {
    let mut store = CustomPropertyStore::new();
    for (name, cascaded) in &self.properties {
      if !name.starts_with("--") {
        continue;
      }
      if let Value::Lexical(lexical) = &cascaded.value {
        store.insert(name.clone(), lexical.clone());
      }
    }
    store
  }

  fn apply(
    &mut self,
    name: &str,
    value: &Value,
    priority: Priority,
    specificity: Specificity,
    origin: Option<&str>,
  ) {
    let candidate_rank = (priority.rank(), specificity);
    match self.properties.get(name) {
      // Applied in (specificity, source order): a later candidate wins the
      // tie, so `>=` on the priority/specificity key is the full test.
      Some(existing) if candidate_rank < (existing.priority.rank(), existing.specificity) => {}
      _ => {
        self.properties.insert(
          name.to_string(),
          CascadedValue {
            value: value.clone(),
            priority,
            specificity,
            origin: origin.map(str::to_string),
          },
        );
      }
    }
  }
}

/// Cascade driver bound to a rule set and configuration.
pub struct Cascade<'a> {
  pub rules: &'a RuleSet,
  pub config: &'a EngineConfig,
}

impl<'a> Cascade<'a> {
  pub fn new(rules: &'a RuleSet, config: &'a EngineConfig) -> Self {
    Self { rules, config }
  }

  /// Rules matching an element, as `(rule index, specificity)` pairs in
  /// source order. Exposed for rule indexing and diagnostics.
  pub fn matching_rules(&self, element: ElementId, ctx: &MatchContext) -> Vec<(usize, Specificity)> {
    let mut out = Vec::new();
    for (index, rule) in self.rules.rules.iter().enumerate() {
      let matched = matcher::match_all(element, &rule.selectors, ctx);
      if let Some(best) = matched.into_iter().map(|(_, spec)| spec).max() {
        out.push((index, best));
      }
    }
    out
  }

  /// Produce the winning declaration set for an element (optionally for a
  /// pseudo-element context). The element's `style` attribute participates
  /// at inline specificity, except in pseudo-element contexts where it does
  /// not apply.
  pub fn cascaded_style(
    &self,
    element: ElementId,
    pseudo: Option<PseudoElement>,
    ctx: &MatchContext,
    collector: &mut ErrorCollector,
  ) -> CascadedStyle {
    let ctx = ctx.for_pseudo_element(pseudo);
    let mut cascaded = CascadedStyle::default();

    // Rules apply in (specificity, source order); collect then sort keeps
    // source order stable for equal specificity.
    let mut applicable: Vec<(Specificity, usize)> = Vec::new();
    for (index, rule) in self.rules.rules.iter().enumerate() {
      let matched = matcher::match_all(element, &rule.selectors, &ctx);
      if let Some(best) = matched.into_iter().map(|(_, spec)| spec).max() {
        applicable.push((best, index));
      }
    }
    applicable.sort_by_key(|&(spec, index)| (spec, index));

    for (specificity, index) in applicable {
      let rule = &self.rules.rules[index];
      for (name, value, priority) in rule.declarations.iter_winners() {
        let origin = rule.declarations.winner_origin(name);
        cascaded.apply(name, value, priority, specificity, origin);
      }
    }

    // Inline style wins over any selector at the same priority tier.
    if pseudo.is_none() {
      if let Some(style_attr) = ctx.document.attribute(element, "style") {
        let inline = StyleDeclaration::parse(style_attr, self.config, collector);
        for (name, value, priority) in inline.iter_winners() {
          let origin = inline.winner_origin(name);
          cascaded.apply(name, value, priority, Specificity::INLINE, origin);
        }
      }
    }

    cascaded
  }

  /// Convenience: the winning lexical value of one custom property on an
  /// element, straight from the cascade.
  pub fn cascaded_custom_property(
    &self,
    element: ElementId,
    name: &str,
    ctx: &MatchContext,
    collector: &mut ErrorCollector,
  ) -> Option<LexicalValue> {
    let style = self.cascaded_style(element, None, ctx, collector);
    match style.get(name) {
      Some(CascadedValue {
        value: Value::Lexical(lexical),
        ..
      }) => Some(lexical.clone()),
      _ => None,
    }
  }
}

/// Convenience wrapper when no rule set is involved: cascade a lone
/// document element's inline style.
pub fn inline_style(
  document: &Document,
  element: ElementId,
  config: &EngineConfig,
  collector: &mut ErrorCollector,
) -> StyleDeclaration {
  match document.attribute(element, "style") {
    Some(text) => StyleDeclaration::parse(text, config, collector),
    None => StyleDeclaration::new(),
  }
}
