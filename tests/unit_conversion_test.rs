// Unit conversion through the resolver: absolute ratios, font-relative
// units against the inheritance chain, viewport units, and numeric
// serialization stability.

use faststyle::{
  DeviceContext, Document, EngineConfig, ErrorCollector, RuleSet, StyleResolver, Value,
};
use faststyle::style::custom_properties::CustomPropertyRegistry;
use faststyle::style::values::serialize_number;

fn single_element_engine(block: &str) -> (Document, RuleSet, EngineConfig, faststyle::ElementId) {
  let _ = env_logger::builder().is_test(true).try_init();
  let mut document = Document::new();
  let root = document.append_element(None, "html");
  let el = document.append_element(Some(root), "div");
  let config = EngineConfig::default();
  let mut rules = RuleSet::new();
  let mut collector = ErrorCollector::new();
  assert!(rules.push_rule("div", block, &config, &mut collector));
  (document, rules, config, el)
}

fn resolve_px(
  document: &Document,
  rules: &RuleSet,
  config: &EngineConfig,
  device: &DeviceContext,
  element: faststyle::ElementId,
  property: &str,
) -> f32 {
  let registry = CustomPropertyRegistry::new();
  let mut collector = ErrorCollector::new();
  let resolver = StyleResolver::new(document, rules, device, &registry, config);
  match resolver
    .computed_value(element, property, &mut collector)
    .expect("known property")
  {
    Value::Length(l) => l.to_px(),
    other => panic!("expected a length for {property}, got {other:?}"),
  }
}

#[test]
fn absolute_units_convert_by_fixed_ratio() {
  let (document, rules, config, el) = single_element_engine(
    "margin-top: 1in; margin-right: 72pt; margin-bottom: 2.54cm; margin-left: 25.4mm",
  );
  let device = DeviceContext::new();
  for property in ["margin-top", "margin-right", "margin-bottom", "margin-left"] {
    let px = resolve_px(&document, &rules, &config, &device, el, property);
    assert!((px - 96.0).abs() < 0.1, "{property} should be ~96px, got {px}");
  }
}

#[test]
fn font_relative_units_use_the_font_chain() {
  let mut document = Document::new();
  let mut rules = RuleSet::new();
  let config = EngineConfig::default();
  let root = document.append_element(None, "html");
  let el = document.append_element(Some(root), "div");
  let mut collector = ErrorCollector::new();
  rules.push_rule("html", "font-size: 20px", &config, &mut collector);
  rules.push_rule(
    "div",
    "width: 2em; height: 3rem; margin-left: 4ex; margin-right: 2ch",
    &config,
    &mut collector,
  );

  let device = DeviceContext::new().with_root_font_size(10.0);
  assert_eq!(resolve_px(&document, &rules, &config, &device, el, "width"), 40.0);
  assert_eq!(resolve_px(&document, &rules, &config, &device, el, "height"), 30.0);
  // ex/ch default to half the font size without real metrics.
  assert_eq!(resolve_px(&document, &rules, &config, &device, el, "margin-left"), 40.0);
  assert_eq!(resolve_px(&document, &rules, &config, &device, el, "margin-right"), 20.0);
}

#[test]
fn root_line_height_units_are_proportional() {
  // font-size: 1.08rlh and margin-left: 0.6rlh both scale with the root
  // line height, independently verifiable.
  let (document, rules, config, el) = single_element_engine("font-size: 1.08rlh; margin-left: 0.6rlh");
  for root_line_height in [20.0_f32, 25.0, 31.25] {
    let device = DeviceContext::new().with_root_line_height(root_line_height);
    let font_size = resolve_px(&document, &rules, &config, &device, el, "font-size");
    let margin = resolve_px(&document, &rules, &config, &device, el, "margin-left");
    assert!(
      (font_size - 1.08 * root_line_height).abs() < 0.01,
      "font-size at rlh={root_line_height}"
    );
    assert!(
      (margin - 0.6 * root_line_height).abs() < 0.01,
      "margin-left at rlh={root_line_height}"
    );
  }
}

#[test]
fn lh_resolves_against_element_line_height() {
  let (document, rules, config, el) =
    single_element_engine("font-size: 10px; line-height: 2; width: 3lh");
  let device = DeviceContext::new();
  // line-height 2 * font-size 10px = 20px; 3lh = 60px.
  assert_eq!(resolve_px(&document, &rules, &config, &device, el, "width"), 60.0);
}

#[test]
fn viewport_units_with_writing_mode() {
  use faststyle::style::device::WritingMode;

  let (document, rules, config, el) = single_element_engine("width: 10vi; height: 10vb");
  let device = DeviceContext::new().with_viewport(800.0, 600.0);
  assert!((resolve_px(&document, &rules, &config, &device, el, "width") - 80.0).abs() < 0.01);
  assert!((resolve_px(&document, &rules, &config, &device, el, "height") - 60.0).abs() < 0.01);

  let device = device.with_writing_mode(WritingMode::VerticalRl);
  assert!((resolve_px(&document, &rules, &config, &device, el, "width") - 60.0).abs() < 0.01);
  assert!((resolve_px(&document, &rules, &config, &device, el, "height") - 80.0).abs() < 0.01);
}

#[test]
fn smaller_and_larger_walk_the_scale() {
  let mut document = Document::new();
  let root = document.append_element(None, "html");
  let child = document.append_element(Some(root), "div");
  let grandchild = document.append_element(Some(child), "span");
  let config = EngineConfig::default();
  let mut rules = RuleSet::new();
  let mut collector = ErrorCollector::new();
  rules.push_rule("html", "font-size: 20px", &config, &mut collector);
  rules.push_rule("div", "font-size: larger", &config, &mut collector);
  rules.push_rule("span", "font-size: smaller", &config, &mut collector);

  let device = DeviceContext::new();
  let registry = CustomPropertyRegistry::new();
  let resolver = StyleResolver::new(&document, &rules, &device, &registry, &config);
  assert!((resolver.font_size_px(child) - 24.0).abs() < 0.01);
  // smaller undoes larger at the next level down.
  assert!((resolver.font_size_px(grandchild) - 20.0).abs() < 0.01);
}

#[test]
fn numeric_serialization_rounds_small_magnitudes() {
  assert_eq!(serialize_number(0.00019999), "0.0002");
  assert_eq!(serialize_number(0.00020001), "0.0002");
  assert_eq!(serialize_number(10.0), "10");
  assert_eq!(serialize_number(1.5), "1.5");

  // Two inputs rounding to the same text serialize identically.
  let a = serialize_number(0.000234564);
  let b = serialize_number(0.000234559);
  assert_eq!(a, b);
}

#[test]
fn computed_lengths_serialize_with_reported_units() {
  let (document, rules, config, el) = single_element_engine("margin-left: 0.0002cm; margin-top: 8pt");
  let device = DeviceContext::new();
  let registry = CustomPropertyRegistry::new();
  let mut collector = ErrorCollector::new();
  let resolver = StyleResolver::new(&document, &rules, &device, &registry, &config);

  let value = resolver
    .computed_value(el, "margin-left", &mut collector)
    .expect("margin-left");
  assert_eq!(value.to_css_string(), "0.0002cm");

  let value = resolver
    .computed_value(el, "margin-top", &mut collector)
    .expect("margin-top");
  assert_eq!(value.to_css_string(), "8pt");
}
