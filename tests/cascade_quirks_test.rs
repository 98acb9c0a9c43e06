// Compatibility-quirk cascade behavior: recognized markers are dropped
// (with warnings) when their flag is disabled, and rank below plain
// declarations of the same tier when enabled.

use faststyle::{
  CompatConfig, EngineConfig, ErrorCollector, QuirkMarker, StyleDeclaration, Tier,
};

const BLOCK: &str = "margin:10px; margin:10px!ie; width:590px; width:600px!ie;";

#[test]
fn disabled_flag_drops_marked_redeclarations() {
  let config = EngineConfig::default();
  let mut collector = ErrorCollector::new();
  let decl = StyleDeclaration::parse(BLOCK, &config, &mut collector);

  assert_eq!(decl.get_property_value("margin"), "10px");
  assert_eq!(decl.get_property_value("width"), "590px");
  // The drops are warnings, not errors.
  assert_eq!(collector.warning_count(), 2);
  assert_eq!(collector.error_count(), 0);
}

#[test]
fn enabled_flag_keeps_quirks_but_plain_still_wins() {
  let config = EngineConfig::default().with_compat(CompatConfig::PERMISSIVE);
  let mut collector = ErrorCollector::new();
  let decl = StyleDeclaration::parse(BLOCK, &config, &mut collector);

  // Both pairs are retained in the cascade history, but the recognized
  // quirks rank below the plain declarations at the same tier.
  assert_eq!(decl.get_property_value("margin"), "10px");
  assert_eq!(decl.get_property_value("width"), "590px");
  assert!(collector.is_empty());
}

#[test]
fn quirk_applies_when_it_is_the_only_declaration() {
  let config = EngineConfig::default().with_compat(CompatConfig::PERMISSIVE);
  let mut collector = ErrorCollector::new();
  let decl = StyleDeclaration::parse("width:600px!ie;", &config, &mut collector);
  assert_eq!(decl.get_property_value("width"), "600px");
  assert_eq!(decl.get_property_priority("width"), "!ie");
}

#[test]
fn marker_precedence_plain_backslash_bang() {
  let config = EngineConfig::default().with_compat(CompatConfig::PERMISSIVE);
  let mut collector = ErrorCollector::new();

  // bang then backslash: backslash ranks higher.
  let decl = StyleDeclaration::parse("width:1px!ie; width:2px\\9;", &config, &mut collector);
  assert_eq!(decl.get_property_value("width"), "2px");

  // backslash then plain: plain ranks higher regardless of order.
  let decl = StyleDeclaration::parse("width:2px\\9; width:3px;", &config, &mut collector);
  assert_eq!(decl.get_property_value("width"), "3px");

  // important beats any normal-tier marker.
  let decl = StyleDeclaration::parse("width:4px !important; width:5px\\9;", &config, &mut collector);
  assert_eq!(decl.get_property_value("width"), "4px");
}

#[test]
fn important_and_normal_marker_tiers_are_independent() {
  let config = EngineConfig::default().with_compat(CompatConfig::PERMISSIVE);
  let mut collector = ErrorCollector::new();

  // A quirk-marked important declaration still outranks a plain normal one.
  let decl = StyleDeclaration::parse("width:1px; width:2px !important\\9;", &config, &mut collector);
  assert_eq!(decl.get_property_value("width"), "2px");
  assert_eq!(decl.get_property_priority("width"), "important \\9");
}

#[test]
fn double_important_is_a_bang_class_marker() {
  let config = EngineConfig::default().with_compat(CompatConfig::PERMISSIVE);
  let mut collector = ErrorCollector::new();
  let decl = StyleDeclaration::parse("color: red !important!;", &config, &mut collector);
  assert_eq!(decl.get_property_value("color"), "#ff0000");

  // Against a plain !important of the same tier, the marked one loses.
  let decl = StyleDeclaration::parse(
    "color: red !important!; color: blue !important;",
    &config,
    &mut collector,
  );
  assert_eq!(decl.get_property_value("color"), "#0000ff");
}

#[test]
fn unrecognized_noise_is_silently_ignored() {
  let config = EngineConfig::default();
  let mut collector = ErrorCollector::new();
  let decl = StyleDeclaration::parse("width: 1px !webkit; width: 2px;", &config, &mut collector);
  assert_eq!(decl.get_property_value("width"), "2px");
  assert!(collector.is_empty());
}

#[test]
fn marker_enum_round_trip_metadata() {
  assert_eq!(QuirkMarker::IeBang.as_str(), "!ie");
  assert_eq!(QuirkMarker::BackslashNine.as_str(), "\\9");
  assert!(matches!(Tier::default(), Tier::Normal));
}
