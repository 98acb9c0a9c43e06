// Shorthand expansion/composition and declaration-block round-trip
// stability.

use faststyle::{EngineConfig, ErrorCollector, StyleDeclaration};

fn parse(text: &str) -> StyleDeclaration {
  let config = EngineConfig::default();
  let mut collector = ErrorCollector::new();
  StyleDeclaration::parse(text, &config, &mut collector)
}

#[test]
fn setting_shorthand_then_reading_longhands() {
  let decl = parse("margin: 1px 2px 3px");
  assert_eq!(decl.get_property_value("margin-top"), "1px");
  assert_eq!(decl.get_property_value("margin-right"), "2px");
  assert_eq!(decl.get_property_value("margin-bottom"), "3px");
  assert_eq!(decl.get_property_value("margin-left"), "2px");
}

#[test]
fn setting_longhands_then_reading_shorthand() {
  let decl = parse("margin-top: 1px; margin-right: 2px; margin-bottom: 3px; margin-left: 2px");
  assert_eq!(decl.get_property_value("margin"), "1px 2px 3px");

  let decl = parse("margin-top: 4px; margin-right: 4px; margin-bottom: 4px; margin-left: 4px");
  assert_eq!(decl.get_property_value("margin"), "4px");
}

#[test]
fn omitted_shorthand_components_reset_to_initial() {
  let decl = parse("border-top: solid");
  assert_eq!(decl.get_property_value("border-top-width"), "medium");
  assert_eq!(decl.get_property_value("border-top-style"), "solid");
  assert_eq!(decl.get_property_value("border-top-color"), "currentcolor");

  // font resets line-height to normal when the slash part is absent.
  let decl = parse("font: 12px serif");
  assert_eq!(decl.get_property_value("line-height"), "normal");
  assert_eq!(decl.get_property_value("font-style"), "normal");
}

#[test]
fn border_composes_only_when_edges_agree() {
  let decl = parse("border: 1px solid red");
  assert_eq!(decl.get_property_value("border"), "1px solid #ff0000");

  let decl = parse("border: 1px solid red; border-left-width: 9px");
  assert_eq!(decl.get_property_value("border"), "");
  // The channel shorthands still answer where they can.
  assert_eq!(decl.get_property_value("border-style"), "solid");
  assert_eq!(decl.get_property_value("border-width"), "1px 1px 1px 9px");
}

#[test]
fn flex_expansion_and_composition() {
  let decl = parse("flex: none");
  assert_eq!(decl.get_property_value("flex-grow"), "0");
  assert_eq!(decl.get_property_value("flex-shrink"), "0");
  assert_eq!(decl.get_property_value("flex-basis"), "auto");
  assert_eq!(decl.get_property_value("flex"), "0 0 auto");

  let decl = parse("flex: 2 1 0");
  assert_eq!(decl.get_property_value("flex"), "2 1 0px");
}

#[test]
fn font_round_trips_through_expansion() {
  let decl = parse("font: italic bold 12px/30px serif");
  assert_eq!(decl.get_property_value("font-size"), "12px");
  assert_eq!(decl.get_property_value("font-family"), "serif");
  assert_eq!(decl.get_property_value("font"), "italic bold 12px/30px serif");
}

#[test]
fn mixed_priority_longhands_do_not_compose() {
  let decl = parse("margin-top: 1px !important; margin-right: 1px; margin-bottom: 1px; margin-left: 1px");
  assert_eq!(decl.get_property_value("margin"), "");
}

#[test]
fn declaration_round_trip_is_stable() {
  let cases = [
    "display: block;",
    "margin: 10px 20px; color: red;",
    "border: 2px dashed blue;",
    "font: small-caps bold 14px/1.5 Helvetica, serif;",
    "width: 100px !important; height: 50%;",
    "--accent: #aabbcc; outline-color: var(--accent);",
    "background: url(hero.png) no-repeat fixed;",
    "list-style: square inside;",
    "text-decoration: underline wavy red;",
  ];
  for text in cases {
    let first = parse(text);
    let serialized = first.css_text();
    let second = parse(&serialized);
    assert_eq!(first, second, "round trip of {text:?} via {serialized:?}");
    // And a second round trip is a fixed point.
    assert_eq!(second.css_text(), serialized, "fixed point of {text:?}");
  }
}

#[test]
fn minified_round_trip_parses_back() {
  let first = parse("margin: 10px; color: red !important");
  let minified = first.minified_css_text();
  let second = parse(&minified);
  assert_eq!(first, second, "minified round trip via {minified:?}");
}

#[test]
fn overflow_and_gap_two_value_forms() {
  let decl = parse("overflow: hidden scroll; gap: 2px 4px");
  assert_eq!(decl.get_property_value("overflow-x"), "hidden");
  assert_eq!(decl.get_property_value("overflow-y"), "scroll");
  assert_eq!(decl.get_property_value("overflow"), "hidden scroll");
  assert_eq!(decl.get_property_value("row-gap"), "2px");
  assert_eq!(decl.get_property_value("column-gap"), "4px");
  assert_eq!(decl.get_property_value("gap"), "2px 4px");

  let decl = parse("overflow: auto");
  assert_eq!(decl.get_property_value("overflow"), "auto");
}
