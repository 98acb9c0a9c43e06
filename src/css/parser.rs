//! Declaration-block parsing
//!
//! Turns a textual declaration block (`"prop: value; prop2: v !important"`)
//! into `(name, value text, priority)` triples. Values are captured as raw
//! slices (the external tokenizer re-tokenizes them later) so that legacy
//! quirk markers — `!ie`, a trailing `\9`, the doubled `!important!` — can
//! be recognized before CSS escape processing would eat them.
//!
//! Parsing is forward-compatible: an invalid declaration is dropped and
//! reported, never fatal to the rest of the block. A declaration carrying a
//! recognized-but-disabled quirk marker is dropped with a warning; one
//! carrying unrecognized `!` noise is dropped silently.

use crate::config::{CompatConfig, EngineConfig};
use crate::css::lexical::{tokenize, CToken};
use crate::error::{ErrorCollector, ParseError};
use cssparser::{ParseError as CssParseError, Parser, ParserInput, Token};
use std::fmt;

/// Priority tier: `!important` outranks normal, always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tier {
  #[default]
  Normal,
  Important,
}

/// Recognized legacy quirk marker on a declaration.
///
/// Within a tier the precedence is plain > backslash > bang-class; `!ie`
/// and the doubled `!important!` share the bang rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuirkMarker {
  #[default]
  None,
  /// Trailing `\9`
  BackslashNine,
  /// `!ie`
  IeBang,
  /// `!important!`
  DoubleImportant,
}

impl QuirkMarker {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::None => "",
      Self::BackslashNine => "\\9",
      Self::IeBang => "!ie",
      Self::DoubleImportant => "!important!",
    }
  }

  fn rank(self) -> u8 {
    match self {
      Self::None => 2,
      Self::BackslashNine => 1,
      Self::IeBang | Self::DoubleImportant => 0,
    }
  }

  pub fn enabled_in(self, compat: &CompatConfig) -> bool {
    match self {
      Self::None => true,
      Self::BackslashNine => compat.allow_backslash_hack,
      Self::IeBang => compat.allow_ie_bang,
      Self::DoubleImportant => compat.allow_double_important,
    }
  }
}

/// Declaration priority: tier plus optional quirk marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Priority {
  pub tier: Tier,
  pub marker: QuirkMarker,
}

impl Priority {
  pub const NORMAL: Self = Self {
    tier: Tier::Normal,
    marker: QuirkMarker::None,
  };

  pub const IMPORTANT: Self = Self {
    tier: Tier::Important,
    marker: QuirkMarker::None,
  };

  pub fn important(self) -> bool {
    self.tier == Tier::Important
  }

  /// Comparison key: tier dominates, then marker rank. Specificity and
  /// source order break the remaining ties elsewhere.
  pub fn rank(self) -> (u8, u8) {
    let tier = match self.tier {
      Tier::Normal => 0,
      Tier::Important => 1,
    };
    (tier, self.marker.rank())
  }

  /// The serialization suffix appended after the value text.
  pub fn suffix(self) -> String {
    match (self.tier, self.marker) {
      (Tier::Normal, QuirkMarker::None) => String::new(),
      (Tier::Important, QuirkMarker::None) => " !important".to_string(),
      (Tier::Important, QuirkMarker::DoubleImportant) | (Tier::Normal, QuirkMarker::DoubleImportant) => {
        " !important!".to_string()
      }
      (Tier::Normal, QuirkMarker::IeBang) => " !ie".to_string(),
      (Tier::Important, QuirkMarker::IeBang) => " !important !ie".to_string(),
      (Tier::Normal, QuirkMarker::BackslashNine) => "\\9".to_string(),
      (Tier::Important, QuirkMarker::BackslashNine) => " !important\\9".to_string(),
    }
  }

  /// CSSOM-style priority text: `""`, `"important"`, or the quirk marker.
  pub fn css_text(self) -> String {
    match (self.tier, self.marker) {
      (Tier::Normal, QuirkMarker::None) => String::new(),
      (Tier::Important, QuirkMarker::None) => "important".to_string(),
      (Tier::Normal, marker) => marker.as_str().to_string(),
      (Tier::Important, marker) => format!("important {}", marker.as_str()),
    }
  }
}

impl PartialOrd for Priority {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Priority {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    self.rank().cmp(&other.rank())
  }
}

impl fmt::Display for Priority {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.css_text())
  }
}

/// One accepted declaration from a block.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDeclaration {
  /// Lowercased for standard properties; case-preserved for `--custom`.
  pub name: String,
  /// Raw value text with priority/quirk suffixes stripped.
  pub value: String,
  pub priority: Priority,
}

/// Parse a declaration block into accepted declarations.
///
/// Order is preserved. Rejected declarations are reported through the
/// collector (or silently skipped, for unrecognized `!` noise) and do not
/// appear in the output.
pub fn parse_declaration_block(
  text: &str,
  config: &EngineConfig,
  collector: &mut ErrorCollector,
) -> Vec<ParsedDeclaration> {
  let mut input = ParserInput::new(text);
  let mut parser = Parser::new(&mut input);
  let mut declarations = Vec::new();

  loop {
    parser.skip_whitespace();
    if parser.is_exhausted() {
      break;
    }

    // Stray semicolons between declarations are fine.
    if parser.try_parse(|p| p.expect_semicolon()).is_ok() {
      continue;
    }

    let name = match parser.next().map(Token::clone) {
      Ok(Token::Ident(name)) => name.as_ref().to_string(),
      Ok(other) => {
        collector.error(ParseError::InvalidPropertyName {
          name: token_text(&other),
        });
        skip_to_semicolon(&mut parser);
        continue;
      }
      Err(_) => break,
    };

    // NUL bytes arrive as U+FFFD after tokenizer cleanup; either way the
    // name is garbage. A name "followed by additional tokens" before the
    // colon is caught by the colon check below.
    if name.contains('\u{FFFD}') || name.contains('\u{0}') || name.chars().any(char::is_whitespace) {
      collector.error(ParseError::InvalidPropertyName { name });
      skip_to_semicolon(&mut parser);
      continue;
    }

    if parser.expect_colon().is_err() {
      collector.error(ParseError::InvalidPropertyName { name });
      skip_to_semicolon(&mut parser);
      continue;
    }

    let value_start = parser.position();
    consume_declaration_value(&mut parser);
    let raw_value = parser
      .slice_from(value_start)
      .trim()
      .trim_end_matches(';')
      .trim_end();

    let name = if name.starts_with("--") {
      name
    } else {
      name.to_ascii_lowercase()
    };

    match strip_priority(raw_value) {
      Ok((value_text, priority)) => {
        if !priority.marker.enabled_in(&config.compat) {
          // Recognized marker, disabled flag: drop with a warning.
          collector.warning(ParseError::QuirkNotEnabled {
            property: name,
            marker: priority.marker.as_str(),
          });
          continue;
        }
        if value_text.is_empty() && !name.starts_with("--") {
          collector.error(ParseError::InvalidPropertyValue {
            property: name.clone(),
            value: String::new(),
          });
          continue;
        }
        declarations.push(ParsedDeclaration {
          name,
          value: value_text,
          priority,
        });
      }
      Err(()) => {
        // Unrecognized `!` noise: forward-compatible silent drop.
        log::trace!("dropping declaration '{name}' with unrecognized priority noise");
      }
    }
  }

  declarations
}

/// Consume value tokens up to (and including) the next top-level `;`.
fn consume_declaration_value(parser: &mut Parser) {
  loop {
    match parser.next_including_whitespace() {
      Ok(Token::Semicolon) | Err(_) => break,
      Ok(Token::Function(_))
      | Ok(Token::ParenthesisBlock)
      | Ok(Token::SquareBracketBlock)
      | Ok(Token::CurlyBracketBlock) => {
        let _ = parser.parse_nested_block(|nested| {
          while nested.next_including_whitespace().is_ok() {}
          Ok::<_, CssParseError<()>>(())
        });
      }
      Ok(_) => {}
    }
  }
}

fn skip_to_semicolon(parser: &mut Parser) {
  consume_declaration_value(parser);
}

/// Strip trailing priority/quirk suffixes from raw value text.
///
/// Returns the remaining value text and the parsed priority, or `Err(())`
/// when the value carries unrecognized `!` noise.
fn strip_priority(raw: &str) -> Result<(String, Priority), ()> {
  let mut rest = raw.trim_end();
  let mut tier = Tier::Normal;
  let mut marker = QuirkMarker::None;

  loop {
    let lower = rest.to_ascii_lowercase();
    if lower.ends_with("!important!") {
      tier = Tier::Important;
      marker = QuirkMarker::DoubleImportant;
      rest = rest[..rest.len() - "!important!".len()].trim_end();
    } else if lower.ends_with("!ie") {
      marker = QuirkMarker::IeBang;
      rest = rest[..rest.len() - "!ie".len()].trim_end();
    } else if lower.ends_with("!important") {
      tier = Tier::Important;
      rest = rest[..rest.len() - "!important".len()].trim_end();
    } else if lower.ends_with("\\9") {
      if marker == QuirkMarker::None {
        marker = QuirkMarker::BackslashNine;
      }
      rest = rest[..rest.len() - "\\9".len()].trim_end();
    } else {
      break;
    }
  }

  // Any remaining top-level `!` is unrecognized noise (e.g. `red !foo`).
  if tokens_contain_bang(&tokenize(rest)) {
    return Err(());
  }

  Ok((rest.to_string(), Priority { tier, marker }))
}

fn tokens_contain_bang(tokens: &[CToken]) -> bool {
  tokens.iter().any(|token| match token {
    CToken::Delim('!') => true,
    CToken::Function(_, children)
    | CToken::Paren(children)
    | CToken::Bracket(children)
    | CToken::Brace(children) => tokens_contain_bang(children),
    _ => false,
  })
}

fn token_text(token: &Token) -> String {
  match token {
    Token::Ident(name) => name.as_ref().to_string(),
    other => format!("{other:?}"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{CompatConfig, EngineConfig};

  fn parse(text: &str) -> (Vec<ParsedDeclaration>, ErrorCollector) {
    parse_with(text, EngineConfig::default())
  }

  fn parse_with(text: &str, config: EngineConfig) -> (Vec<ParsedDeclaration>, ErrorCollector) {
    let mut collector = ErrorCollector::new();
    let declarations = parse_declaration_block(text, &config, &mut collector);
    (declarations, collector)
  }

  #[test]
  fn parses_simple_declarations() {
    let (decls, collector) = parse("color: red; margin: 10px 20px;");
    assert!(collector.is_empty());
    assert_eq!(decls.len(), 2);
    assert_eq!(decls[0].name, "color");
    assert_eq!(decls[0].value, "red");
    assert_eq!(decls[0].priority, Priority::NORMAL);
    assert_eq!(decls[1].value, "10px 20px");
  }

  #[test]
  fn parses_important() {
    let (decls, _) = parse("width: 100px !important");
    assert_eq!(decls[0].value, "100px");
    assert_eq!(decls[0].priority, Priority::IMPORTANT);

    let (decls, _) = parse("width: 100px !IMPORTANT;");
    assert_eq!(decls[0].priority, Priority::IMPORTANT);
  }

  #[test]
  fn property_names_lowercase_but_custom_names_do_not() {
    let (decls, _) = parse("COLOR: red; --Theme-Color: blue;");
    assert_eq!(decls[0].name, "color");
    assert_eq!(decls[1].name, "--Theme-Color");
  }

  #[test]
  fn empty_custom_property_value_is_kept() {
    let (decls, collector) = parse("--x:;color:red");
    assert!(collector.is_empty());
    assert_eq!(decls.len(), 2);
    assert_eq!(decls[0].name, "--x");
    assert_eq!(decls[0].value, "");
  }

  #[test]
  fn empty_standard_value_is_an_error() {
    let (decls, collector) = parse("color:;display:block");
    assert_eq!(decls.len(), 1);
    assert_eq!(decls[0].name, "display");
    assert_eq!(collector.error_count(), 1);
  }

  #[test]
  fn bad_name_invalidates_whole_declaration() {
    let (decls, collector) = parse("bad name: red; color: blue;");
    assert_eq!(decls.len(), 1);
    assert_eq!(decls[0].name, "color");
    assert_eq!(collector.error_count(), 1);
  }

  #[test]
  fn ie_bang_dropped_with_warning_when_disabled() {
    let (decls, collector) = parse("margin:10px; margin:10px!ie; width:590px; width:600px!ie;");
    assert_eq!(decls.len(), 2);
    assert_eq!(decls[0].value, "10px");
    assert_eq!(decls[1].value, "590px");
    assert_eq!(collector.warning_count(), 2);
    assert_eq!(collector.error_count(), 0);
  }

  #[test]
  fn ie_bang_kept_when_enabled() {
    let config = EngineConfig::default().with_compat(CompatConfig::PERMISSIVE);
    let (decls, collector) = parse_with("margin:10px; margin:10px!ie;", config);
    assert_eq!(decls.len(), 2);
    assert_eq!(decls[1].priority.marker, QuirkMarker::IeBang);
    assert!(collector.is_empty());
  }

  #[test]
  fn backslash_nine_marker() {
    let config = EngineConfig::default().with_compat(CompatConfig::PERMISSIVE);
    let (decls, _) = parse_with("width: 200px\\9;", config);
    assert_eq!(decls[0].value, "200px");
    assert_eq!(decls[0].priority.marker, QuirkMarker::BackslashNine);
    assert_eq!(decls[0].priority.tier, Tier::Normal);

    let (decls, _) = parse_with("width: 200px !important\\9;", config);
    assert_eq!(decls[0].priority.marker, QuirkMarker::BackslashNine);
    assert_eq!(decls[0].priority.tier, Tier::Important);
  }

  #[test]
  fn double_important_marker() {
    let config = EngineConfig::default().with_compat(CompatConfig::PERMISSIVE);
    let (decls, _) = parse_with("color: red !important!;", config);
    assert_eq!(decls[0].value, "red");
    assert_eq!(decls[0].priority.marker, QuirkMarker::DoubleImportant);
    assert!(decls[0].priority.important());
  }

  #[test]
  fn unrecognized_bang_noise_dropped_silently() {
    let (decls, collector) = parse("color: red !foo; display: block;");
    assert_eq!(decls.len(), 1);
    assert_eq!(decls[0].name, "display");
    // Neither error nor warning per forward-compatible parsing.
    assert!(collector.is_empty());
  }

  #[test]
  fn functions_with_semicolon_free_commas_survive() {
    let (decls, _) = parse("background-image: url(a.png); font-family: Helvetica, serif");
    assert_eq!(decls.len(), 2);
    assert_eq!(decls[1].value, "Helvetica, serif");
  }

  #[test]
  fn var_reference_values_pass_through_raw() {
    let (decls, _) = parse("margin-left: var(--foo, 1vb)");
    assert_eq!(decls[0].value, "var(--foo, 1vb)");
  }

  #[test]
  fn priority_ordering_tiers_then_markers() {
    let plain = Priority::NORMAL;
    let important = Priority::IMPORTANT;
    let ie = Priority {
      tier: Tier::Normal,
      marker: QuirkMarker::IeBang,
    };
    let backslash = Priority {
      tier: Tier::Normal,
      marker: QuirkMarker::BackslashNine,
    };
    let important_ie = Priority {
      tier: Tier::Important,
      marker: QuirkMarker::IeBang,
    };
    assert!(important > plain);
    assert!(plain > backslash);
    assert!(backslash > ie);
    assert!(important_ie > plain);
    assert!(important > important_ie);
  }

  #[test]
  fn priority_suffix_round_trips() {
    let cases = [
      Priority::NORMAL,
      Priority::IMPORTANT,
      Priority {
        tier: Tier::Normal,
        marker: QuirkMarker::IeBang,
      },
      Priority {
        tier: Tier::Important,
        marker: QuirkMarker::BackslashNine,
      },
      Priority {
        tier: Tier::Important,
        marker: QuirkMarker::DoubleImportant,
      },
    ];
    let config = EngineConfig::default().with_compat(CompatConfig::PERMISSIVE);
    for priority in cases {
      let text = format!("width: 10px{};", priority.suffix());
      let (decls, _) = parse_with(&text, config);
      assert_eq!(decls.len(), 1, "no declaration for {text:?}");
      assert_eq!(decls[0].priority, priority, "round trip of {text:?}");
      assert_eq!(decls[0].value, "10px");
    }
  }
}
