// Custom-property substitution through the full resolver: fallbacks,
// inheritance, registered properties, cycles, attr() and env().

use faststyle::error::ResolveError;
use faststyle::style::custom_properties::CustomPropertySyntax;
use faststyle::{
  CustomPropertyRegistry, DeviceContext, Document, EngineConfig, Error, ErrorCollector, PropertyRule,
  RuleSet, StyleResolver, Value,
};

struct Engine {
  document: Document,
  rules: RuleSet,
  device: DeviceContext,
  registry: CustomPropertyRegistry,
  config: EngineConfig,
}

impl Engine {
  fn new() -> Self {
    let _ = env_logger::builder().is_test(true).try_init();
    Self {
      document: Document::new(),
      rules: RuleSet::new(),
      device: DeviceContext::new(),
      registry: CustomPropertyRegistry::new(),
      config: EngineConfig::default(),
    }
  }

  fn rule(&mut self, selector: &str, block: &str) {
    let mut collector = ErrorCollector::new();
    assert!(self.rules.push_rule(selector, block, &self.config, &mut collector));
  }

  fn resolve(&self, element: faststyle::ElementId, property: &str) -> (Value, ErrorCollector) {
    let mut collector = ErrorCollector::new();
    let resolver = StyleResolver::new(&self.document, &self.rules, &self.device, &self.registry, &self.config);
    let value = resolver
      .computed_value(element, property, &mut collector)
      .expect("known property");
    (value, collector)
  }
}

#[test]
fn fallback_unused_when_variable_is_set() {
  // margin-left: var(--foo, 1vb) with --foo: 8pt computes to 8pt even
  // without a viewport: the fallback is never evaluated.
  let mut engine = Engine::new();
  let el = engine.document.append_element(None, "div");
  engine.rule("div", "margin-left: var(--foo, 1vb); --foo: 8pt");

  let (value, collector) = engine.resolve(el, "margin-left");
  assert_eq!(value.to_css_string(), "8pt");
  assert!(collector.is_empty());
}

#[test]
fn fallback_viewport_unit_fails_without_device_viewport() {
  let mut engine = Engine::new();
  let el = engine.document.append_element(None, "div");
  engine.rule("div", "margin-left: var(--foo, 1vb)");

  let (value, collector) = engine.resolve(el, "margin-left");
  // Guaranteed-invalid: falls back to margin-left's initial value.
  assert_eq!(value.to_css_string(), "0px");
  assert_eq!(collector.error_count(), 1);
  assert!(matches!(
    collector.issues()[0].error,
    Error::Resolve(ResolveError::ViewportContextRequired { .. })
  ));
}

#[test]
fn fallback_viewport_unit_resolves_with_viewport() {
  let mut engine = Engine::new();
  engine.device = engine.device.with_viewport(1000.0, 500.0);
  let el = engine.document.append_element(None, "div");
  engine.rule("div", "margin-left: var(--foo, 10vb)");

  let (value, collector) = engine.resolve(el, "margin-left");
  assert_eq!(value.to_css_string(), "50px");
  assert!(collector.is_empty());
}

#[test]
fn custom_properties_inherit_by_default() {
  let mut engine = Engine::new();
  let root = engine.document.append_element(None, "html");
  let mid = engine.document.append_element(Some(root), "main");
  let leaf = engine.document.append_element(Some(mid), "p");
  engine.rule("html", "--indent: 2em");
  engine.rule("p", "text-indent: var(--indent)");

  let (value, collector) = engine.resolve(leaf, "text-indent");
  // 2em against the default 16px font size.
  assert_eq!(value.to_css_string(), "32px");
  assert!(collector.is_empty());
}

#[test]
fn nearest_ancestor_value_wins() {
  let mut engine = Engine::new();
  let root = engine.document.append_element(None, "html");
  let mid = engine.document.append_element(Some(root), "main");
  let leaf = engine.document.append_element(Some(mid), "p");
  engine.rule("html", "--w: 1px");
  engine.rule("main", "--w: 2px");
  engine.rule("p", "width: var(--w)");

  let (value, _) = engine.resolve(leaf, "width");
  assert_eq!(value.to_css_string(), "2px");
}

#[test]
fn registered_initial_value_used_when_unset() {
  let mut engine = Engine::new();
  let el = engine.document.append_element(None, "div");
  engine
    .registry
    .register(PropertyRule {
      name: "--pad".to_string(),
      syntax: CustomPropertySyntax::Length,
      inherits: true,
      initial_value: Some(faststyle::css::lexical::LexicalValue::parse("6px")),
    })
    .expect("registration");
  engine.rule("div", "padding-left: var(--pad)");

  let (value, collector) = engine.resolve(el, "padding-left");
  assert_eq!(value.to_css_string(), "6px");
  assert!(collector.is_empty());
}

#[test]
fn self_reference_records_one_error_and_falls_back() {
  let mut engine = Engine::new();
  let root = engine.document.append_element(None, "html");
  let el = engine.document.append_element(Some(root), "div");
  engine.rule("html", "color: #00ff00");
  engine.rule("div", "--c: var(--c); color: var(--c)");

  let (value, collector) = engine.resolve(el, "color");
  // color inherits, so the inherited value substitutes.
  assert_eq!(value.to_css_string(), "#00ff00");
  assert_eq!(collector.error_count(), 1, "exactly one error per top-level resolution");
}

#[test]
fn cycle_with_fallback_prefers_fallback() {
  let mut engine = Engine::new();
  let el = engine.document.append_element(None, "div");
  engine.rule("div", "--a: var(--b); --b: var(--a); width: var(--a, 11px)");

  let (value, collector) = engine.resolve(el, "width");
  assert_eq!(value.to_css_string(), "11px");
  assert!(collector.is_empty());
}

#[test]
fn empty_custom_property_is_guaranteed_invalid_without_fallback() {
  let mut engine = Engine::new();
  let el = engine.document.append_element(None, "div");
  engine.rule("div", "--empty:; width: var(--empty)");

  let (value, collector) = engine.resolve(el, "width");
  assert_eq!(value, Value::keyword("auto"));
  assert_eq!(collector.error_count(), 1);
}

#[test]
fn substitution_is_idempotent_without_cycles() {
  let mut engine = Engine::new();
  let el = engine.document.append_element(None, "div");
  engine.rule("div", "--size: 18px; width: var(--size)");

  let (first, _) = engine.resolve(el, "width");
  let (second, _) = engine.resolve(el, "width");
  assert_eq!(first, second);
  assert_eq!(first.to_css_string(), "18px");
}

#[test]
fn attr_and_env_substitution() {
  let mut engine = Engine::new();
  engine.device.set_env("safe-area-inset-left", "12px");
  let el = engine.document.append_element(None, "div");
  engine.document.set_attribute(el, "data-pad", "3");
  engine.rule("div", "padding-left: attr(data-pad px); margin-left: env(safe-area-inset-left)");

  let (value, _) = engine.resolve(el, "padding-left");
  assert_eq!(value.to_css_string(), "3px");
  let (value, _) = engine.resolve(el, "margin-left");
  assert_eq!(value.to_css_string(), "12px");
}

#[test]
fn nested_references_through_attr() {
  let mut engine = Engine::new();
  let el = engine.document.append_element(None, "div");
  engine.document.set_attribute(el, "data-w", "var(--w)");
  engine.rule("div", "--w: 40px; width: attr(data-w length)");

  let (value, collector) = engine.resolve(el, "width");
  assert_eq!(value.to_css_string(), "40px");
  assert!(collector.is_empty());
}

#[test]
fn calc_over_substituted_values() {
  let mut engine = Engine::new();
  let el = engine.document.append_element(None, "div");
  engine.rule("div", "--a: 10px; --b: 4; width: calc(var(--a)*var(--b) + 2px)");

  let (value, collector) = engine.resolve(el, "width");
  assert_eq!(value.to_css_string(), "42px");
  assert!(collector.is_empty());
}
