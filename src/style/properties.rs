//! Property database and value parsing
//!
//! Static knowledge about every supported property: whether it is a
//! shorthand (and its longhand set), its initial value, whether it
//! inherits, and how its values parse. Longhands are the unit of storage
//! everywhere else in the engine; shorthands exist only as expansion
//! (write) and composition (read) views implemented here.
//!
//! Reference: CSS Cascading and Inheritance Level 4
//! <https://www.w3.org/TR/css-cascade-4/>

use crate::css::lexical::{tokens_have_references, CToken, LexicalValue};
use crate::style::calc::{is_math_function, parse_math_function};
use crate::style::values::{Color, Length, LengthUnit, Value};
use rustc_hash::FxHashMap;
use std::sync::LazyLock;

/// Static description of one property.
#[derive(Debug, Clone, Copy)]
pub struct PropertyInfo {
  pub name: &'static str,
  pub inherited: bool,
  pub initial: &'static str,
  /// Empty for longhands; the expansion set for shorthands.
  pub longhands: &'static [&'static str],
}

impl PropertyInfo {
  pub fn is_shorthand(&self) -> bool {
    !self.longhands.is_empty()
  }
}

macro_rules! longhand {
  ($name:literal, $inherited:literal, $initial:literal) => {
    PropertyInfo {
      name: $name,
      inherited: $inherited,
      initial: $initial,
      longhands: &[],
    }
  };
}

macro_rules! shorthand {
  ($name:literal, $longhands:expr) => {
    PropertyInfo {
      name: $name,
      inherited: false,
      initial: "",
      longhands: $longhands,
    }
  };
}

#[rustfmt::skip]
static PROPERTIES: &[PropertyInfo] = &[
  // Box model
  longhand!("margin-top", false, "0"),
  longhand!("margin-right", false, "0"),
  longhand!("margin-bottom", false, "0"),
  longhand!("margin-left", false, "0"),
  longhand!("padding-top", false, "0"),
  longhand!("padding-right", false, "0"),
  longhand!("padding-bottom", false, "0"),
  longhand!("padding-left", false, "0"),
  longhand!("top", false, "auto"),
  longhand!("right", false, "auto"),
  longhand!("bottom", false, "auto"),
  longhand!("left", false, "auto"),
  longhand!("width", false, "auto"),
  longhand!("height", false, "auto"),
  longhand!("min-width", false, "auto"),
  longhand!("min-height", false, "auto"),
  longhand!("max-width", false, "none"),
  longhand!("max-height", false, "none"),
  longhand!("box-sizing", false, "content-box"),
  // Borders and outline
  longhand!("border-top-width", false, "medium"),
  longhand!("border-right-width", false, "medium"),
  longhand!("border-bottom-width", false, "medium"),
  longhand!("border-left-width", false, "medium"),
  longhand!("border-top-style", false, "none"),
  longhand!("border-right-style", false, "none"),
  longhand!("border-bottom-style", false, "none"),
  longhand!("border-left-style", false, "none"),
  longhand!("border-top-color", false, "currentcolor"),
  longhand!("border-right-color", false, "currentcolor"),
  longhand!("border-bottom-color", false, "currentcolor"),
  longhand!("border-left-color", false, "currentcolor"),
  longhand!("outline-width", false, "medium"),
  longhand!("outline-style", false, "none"),
  longhand!("outline-color", false, "currentcolor"),
  // Display and positioning
  longhand!("display", false, "inline"),
  longhand!("position", false, "static"),
  longhand!("float", false, "none"),
  longhand!("clear", false, "none"),
  longhand!("z-index", false, "auto"),
  longhand!("overflow-x", false, "visible"),
  longhand!("overflow-y", false, "visible"),
  longhand!("vertical-align", false, "baseline"),
  longhand!("opacity", false, "1"),
  longhand!("content", false, "normal"),
  // Flex and gaps
  longhand!("flex-grow", false, "0"),
  longhand!("flex-shrink", false, "1"),
  longhand!("flex-basis", false, "auto"),
  longhand!("flex-direction", false, "row"),
  longhand!("flex-wrap", false, "nowrap"),
  longhand!("justify-content", false, "normal"),
  longhand!("align-items", false, "normal"),
  longhand!("align-self", false, "auto"),
  longhand!("row-gap", false, "normal"),
  longhand!("column-gap", false, "normal"),
  // Typography (inherited)
  longhand!("color", true, "black"),
  longhand!("font-family", true, "serif"),
  longhand!("font-size", true, "medium"),
  longhand!("font-style", true, "normal"),
  longhand!("font-variant", true, "normal"),
  longhand!("font-weight", true, "normal"),
  longhand!("line-height", true, "normal"),
  longhand!("text-align", true, "start"),
  longhand!("text-indent", true, "0"),
  longhand!("text-transform", true, "none"),
  longhand!("letter-spacing", true, "normal"),
  longhand!("word-spacing", true, "normal"),
  longhand!("white-space", true, "normal"),
  longhand!("direction", true, "ltr"),
  longhand!("visibility", true, "visible"),
  longhand!("cursor", true, "auto"),
  longhand!("list-style-type", true, "disc"),
  longhand!("list-style-position", true, "outside"),
  longhand!("list-style-image", true, "none"),
  // Text decoration (not inherited)
  longhand!("text-decoration-line", false, "none"),
  longhand!("text-decoration-style", false, "solid"),
  longhand!("text-decoration-color", false, "currentcolor"),
  // Background
  longhand!("background-color", false, "transparent"),
  longhand!("background-image", false, "none"),
  longhand!("background-repeat", false, "repeat"),
  longhand!("background-attachment", false, "scroll"),
  longhand!("background-position", false, "0% 0%"),
  // Shorthands
  shorthand!("margin", &["margin-top", "margin-right", "margin-bottom", "margin-left"]),
  shorthand!("padding", &["padding-top", "padding-right", "padding-bottom", "padding-left"]),
  shorthand!("inset", &["top", "right", "bottom", "left"]),
  shorthand!("border-width", &["border-top-width", "border-right-width", "border-bottom-width", "border-left-width"]),
  shorthand!("border-style", &["border-top-style", "border-right-style", "border-bottom-style", "border-left-style"]),
  shorthand!("border-color", &["border-top-color", "border-right-color", "border-bottom-color", "border-left-color"]),
  shorthand!("border-top", &["border-top-width", "border-top-style", "border-top-color"]),
  shorthand!("border-right", &["border-right-width", "border-right-style", "border-right-color"]),
  shorthand!("border-bottom", &["border-bottom-width", "border-bottom-style", "border-bottom-color"]),
  shorthand!("border-left", &["border-left-width", "border-left-style", "border-left-color"]),
  shorthand!("border", &[
    "border-top-width", "border-right-width", "border-bottom-width", "border-left-width",
    "border-top-style", "border-right-style", "border-bottom-style", "border-left-style",
    "border-top-color", "border-right-color", "border-bottom-color", "border-left-color",
  ]),
  shorthand!("outline", &["outline-width", "outline-style", "outline-color"]),
  shorthand!("overflow", &["overflow-x", "overflow-y"]),
  shorthand!("gap", &["row-gap", "column-gap"]),
  shorthand!("flex", &["flex-grow", "flex-shrink", "flex-basis"]),
  shorthand!("font", &["font-style", "font-variant", "font-weight", "font-size", "line-height", "font-family"]),
  shorthand!("background", &[
    "background-color", "background-image", "background-repeat", "background-attachment", "background-position",
  ]),
  shorthand!("list-style", &["list-style-type", "list-style-position", "list-style-image"]),
  shorthand!("text-decoration", &["text-decoration-line", "text-decoration-style", "text-decoration-color"]),
];

static PROPERTY_INDEX: LazyLock<FxHashMap<&'static str, &'static PropertyInfo>> = LazyLock::new(|| {
  PROPERTIES.iter().map(|info| (info.name, info)).collect()
});

/// Look up a property by (lowercased) name.
pub fn property_info(name: &str) -> Option<&'static PropertyInfo> {
  PROPERTY_INDEX.get(name).copied()
}

pub fn is_shorthand(name: &str) -> bool {
  property_info(name).is_some_and(PropertyInfo::is_shorthand)
}

pub fn is_inherited(name: &str) -> bool {
  property_info(name).is_some_and(|info| info.inherited)
}

/// All longhand property names known to the database.
pub fn all_longhands() -> impl Iterator<Item = &'static str> {
  PROPERTIES.iter().filter(|info| !info.is_shorthand()).map(|info| info.name)
}

/// A property's initial value, parsed.
pub fn initial_value(name: &str) -> Option<Value> {
  let info = property_info(name)?;
  if info.is_shorthand() {
    return None;
  }
  parse_value_tokens(name, &crate::css::lexical::tokenize(info.initial)).ok()
}

// ============================================================================
// Value parsing
// ============================================================================

/// Non-whitespace top-level terms of a token slice.
fn terms(tokens: &[CToken]) -> Vec<&CToken> {
  tokens.iter().filter(|t| !t.is_whitespace()).collect()
}

fn split_commas(tokens: &[CToken]) -> Vec<Vec<CToken>> {
  let mut groups = vec![Vec::new()];
  for token in tokens {
    if matches!(token, CToken::Comma) {
      groups.push(Vec::new());
    } else {
      groups.last_mut().expect("non-empty groups").push(token.clone());
    }
  }
  groups
}

/// Parse a declaration value for a longhand property.
///
/// Values still carrying substitution references come back as
/// [`Value::Lexical`]; CSS-wide keywords are valid for every property but
/// only as the entire value (`flex: unset unset` is invalid). Returns
/// `Err(())` on any grammar violation — callers report and drop.
pub fn parse_value_tokens(property: &str, tokens: &[CToken]) -> Result<Value, ()> {
  if tokens_have_references(tokens) {
    return Ok(Value::Lexical(LexicalValue::from_tokens(tokens.to_vec())));
  }
  let terms = terms(tokens);
  if terms.is_empty() {
    return Err(());
  }
  // CSS-wide keywords stand alone.
  if let Some(word) = terms[0].as_ident() {
    if matches!(word, "initial" | "inherit" | "unset" | "revert") {
      return if terms.len() == 1 {
        Ok(Value::keyword(word))
      } else {
        Err(())
      };
    }
  }
  parse_longhand(property, &terms, tokens)
}

fn parse_longhand(property: &str, terms: &[&CToken], tokens: &[CToken]) -> Result<Value, ()> {
  match property {
    "margin-top" | "margin-right" | "margin-bottom" | "margin-left" | "top" | "right" | "bottom"
    | "left" => single(terms).and_then(|t| length_percent_or(t, &["auto"])),
    "flex-basis" => single(terms).and_then(|t| {
      length_percent_or(t, &["auto", "content", "min-content", "max-content", "fit-content"])
    }),
    "vertical-align" => single(terms).and_then(|t| {
      length_percent_or(
        t,
        &["baseline", "sub", "super", "text-top", "text-bottom", "middle", "top", "bottom"],
      )
    }),
    "padding-top" | "padding-right" | "padding-bottom" | "padding-left" | "text-indent" => {
      single(terms).and_then(|t| length_percent_or(t, &[]))
    }
    "width" | "height" | "min-width" | "min-height" | "max-width" | "max-height" => single(terms)
      .and_then(|t| length_percent_or(t, &["auto", "none", "min-content", "max-content", "fit-content"])),
    "border-top-width" | "border-right-width" | "border-bottom-width" | "border-left-width"
    | "outline-width" => single(terms).and_then(|t| length_percent_or(t, &["thin", "medium", "thick"])),
    "letter-spacing" | "word-spacing" => single(terms).and_then(|t| length_percent_or(t, &["normal"])),
    "row-gap" | "column-gap" => single(terms).and_then(|t| length_percent_or(t, &["normal"])),
    "font-size" => single(terms).and_then(|t| {
      length_percent_or(
        t,
        &["xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "smaller", "larger"],
      )
    }),
    "line-height" => single(terms).and_then(|t| match t {
      CToken::Number { value, .. } => Ok(Value::Number(*value)),
      other => length_percent_or(other, &["normal"]),
    }),
    "z-index" => single(terms).and_then(|t| match t {
      CToken::Ident(word) if word == "auto" => Ok(Value::keyword("auto")),
      CToken::Number {
        int_value: Some(int), ..
      } => Ok(Value::Integer(*int)),
      CToken::Function(name, args) if is_math_function(name) => {
        parse_math_function(name, args).map(Value::Calc).ok_or(())
      }
      _ => Err(()),
    }),
    "opacity" | "flex-grow" | "flex-shrink" => single(terms).and_then(|t| match t {
      CToken::Number { value, .. } => Ok(Value::Number(*value)),
      CToken::Percentage(value) => Ok(Value::Percentage(*value)),
      CToken::Function(name, args) if is_math_function(name) => {
        parse_math_function(name, args).map(Value::Calc).ok_or(())
      }
      _ => Err(()),
    }),
    "font-weight" => single(terms).and_then(|t| match t {
      CToken::Ident(word) if matches!(word.as_str(), "normal" | "bold" | "bolder" | "lighter") => {
        Ok(Value::keyword(word))
      }
      CToken::Number { value, .. } if (1.0..=1000.0).contains(value) => Ok(Value::Number(*value)),
      _ => Err(()),
    }),
    "color" | "background-color" | "border-top-color" | "border-right-color"
    | "border-bottom-color" | "border-left-color" | "outline-color" | "text-decoration-color" => {
      single(terms).and_then(parse_color_term)
    }
    "background-image" | "list-style-image" => single(terms).and_then(|t| match t {
      CToken::Ident(word) if word == "none" => Ok(Value::keyword("none")),
      CToken::Url(url) => Ok(Value::Url(url.clone())),
      CToken::Function(name, args) if name.eq_ignore_ascii_case("url") => match terms_of(args).as_slice() {
        [CToken::QuotedString(s)] => Ok(Value::Url(s.clone())),
        _ => Err(()),
      },
      _ => Err(()),
    }),
    "background-position" => {
      if terms.len() > 2 || terms.is_empty() {
        return Err(());
      }
      let mut items = Vec::new();
      for t in terms {
        items.push(length_percent_or(t, &["left", "center", "right", "top", "bottom"])?);
      }
      Ok(if items.len() == 1 {
        items.pop().expect("one item")
      } else {
        Value::List(items)
      })
    }
    "font-family" => {
      let groups = split_commas(tokens);
      let mut families = Vec::new();
      for group in &groups {
        let group_terms = terms_of(group);
        match group_terms.as_slice() {
          [CToken::QuotedString(s)] => families.push(Value::Str(s.clone())),
          names if !names.is_empty() && names.iter().all(|t| t.as_ident().is_some()) => {
            let joined = names
              .iter()
              .filter_map(|t| t.as_ident())
              .collect::<Vec<_>>()
              .join(" ");
            families.push(Value::Keyword(joined));
          }
          _ => return Err(()),
        }
      }
      Ok(if families.len() == 1 {
        families.pop().expect("one family")
      } else {
        Value::CommaList(families)
      })
    }
    "content" => single(terms).and_then(|t| match t {
      CToken::Ident(word) if matches!(word.as_str(), "normal" | "none") => Ok(Value::keyword(word)),
      CToken::QuotedString(s) => Ok(Value::Str(s.clone())),
      _ => Err(()),
    }),
    "text-decoration-line" => {
      let mut lines = Vec::new();
      for t in terms {
        match t.as_ident() {
          Some("none") if terms.len() == 1 => return Ok(Value::keyword("none")),
          Some(word @ ("underline" | "overline" | "line-through" | "blink")) => {
            lines.push(Value::keyword(word))
          }
          _ => return Err(()),
        }
      }
      Ok(if lines.len() == 1 {
        lines.pop().expect("one line")
      } else {
        Value::List(lines)
      })
    }
    "cursor" => single(terms).and_then(|t| t.as_ident().map(Value::keyword).ok_or(())),
    _ => {
      // Keyword-set properties.
      let allowed = keyword_set(property).ok_or(())?;
      let t = single(terms)?;
      match t.as_ident() {
        Some(word) if allowed.contains(&word) => Ok(Value::keyword(word)),
        _ => Err(()),
      }
    }
  }
}

fn terms_of(tokens: &[CToken]) -> Vec<CToken> {
  tokens.iter().filter(|t| !t.is_whitespace()).cloned().collect()
}

fn single<'t>(terms: &[&'t CToken]) -> Result<&'t CToken, ()> {
  match terms {
    [one] => Ok(one),
    _ => Err(()),
  }
}

/// length | percentage | calc | zero number | listed keywords
fn length_percent_or(token: &CToken, keywords: &[&str]) -> Result<Value, ()> {
  match token {
    CToken::Dimension { value, unit, .. } => LengthUnit::parse(unit)
      .map(|u| Value::Length(Length::new(*value, u)))
      .ok_or(()),
    CToken::Percentage(value) => Ok(Value::Percentage(*value)),
    CToken::Number { value, .. } if *value == 0.0 => Ok(Value::Length(Length::px(0.0))),
    CToken::Function(name, args) if is_math_function(name) => {
      parse_math_function(name, args).map(Value::Calc).ok_or(())
    }
    CToken::Ident(word) if keywords.iter().any(|k| word.eq_ignore_ascii_case(k)) => {
      Ok(Value::Keyword(word.to_ascii_lowercase()))
    }
    _ => Err(()),
  }
}

pub(crate) fn parse_color_term(token: &CToken) -> Result<Value, ()> {
  match token {
    CToken::Hash(hex) | CToken::IdHash(hex) => Color::parse_hex(hex).map(Value::Color).ok_or(()),
    CToken::Ident(word) if word.eq_ignore_ascii_case("currentcolor") => {
      Ok(Value::keyword("currentcolor"))
    }
    CToken::Ident(word) => Color::parse_named(word).map(Value::Color).ok_or(()),
    CToken::Function(name, args)
      if name.eq_ignore_ascii_case("rgb") || name.eq_ignore_ascii_case("rgba") =>
    {
      parse_rgb_function(args).map(Value::Color).ok_or(())
    }
    _ => Err(()),
  }
}

fn parse_rgb_function(args: &[CToken]) -> Option<Color> {
  let channels: Vec<CToken> = args
    .iter()
    .filter(|t| !t.is_whitespace() && !matches!(t, CToken::Comma | CToken::Delim('/')))
    .cloned()
    .collect();
  if channels.len() != 3 && channels.len() != 4 {
    return None;
  }
  let channel = |t: &CToken| -> Option<u8> {
    match t {
      CToken::Number { value, .. } => Some(value.clamp(0.0, 255.0).round() as u8),
      CToken::Percentage(p) => Some(((p / 100.0).clamp(0.0, 1.0) * 255.0).round() as u8),
      _ => None,
    }
  };
  let r = channel(&channels[0])?;
  let g = channel(&channels[1])?;
  let b = channel(&channels[2])?;
  let a = match channels.get(3) {
    None => 255,
    Some(CToken::Number { value, .. }) => (value.clamp(0.0, 1.0) * 255.0).round() as u8,
    Some(CToken::Percentage(p)) => ((p / 100.0).clamp(0.0, 1.0) * 255.0).round() as u8,
    Some(_) => return None,
  };
  Some(Color { r, g, b, a })
}

fn keyword_set(property: &str) -> Option<&'static [&'static str]> {
  Some(match property {
    "display" => &[
      "none", "block", "inline", "inline-block", "flex", "inline-flex", "grid", "inline-grid",
      "flow-root", "list-item", "table", "table-row", "table-cell", "contents",
    ],
    "position" => &["static", "relative", "absolute", "fixed", "sticky"],
    "float" => &["none", "left", "right", "inline-start", "inline-end"],
    "clear" => &["none", "left", "right", "both", "inline-start", "inline-end"],
    "overflow-x" | "overflow-y" => &["visible", "hidden", "clip", "scroll", "auto"],
    "visibility" => &["visible", "hidden", "collapse"],
    "box-sizing" => &["content-box", "border-box"],
    "text-align" => &["start", "end", "left", "right", "center", "justify", "match-parent"],
    "text-transform" => &["none", "capitalize", "uppercase", "lowercase", "full-width"],
    "white-space" => &["normal", "pre", "nowrap", "pre-wrap", "pre-line", "break-spaces"],
    "direction" => &["ltr", "rtl"],
    "font-style" => &["normal", "italic", "oblique"],
    "font-variant" => &["normal", "small-caps"],
    "flex-direction" => &["row", "row-reverse", "column", "column-reverse"],
    "flex-wrap" => &["nowrap", "wrap", "wrap-reverse"],
    "justify-content" => &[
      "normal", "flex-start", "flex-end", "center", "start", "end", "left", "right",
      "space-between", "space-around", "space-evenly", "stretch",
    ],
    "align-items" => &[
      "normal", "stretch", "flex-start", "flex-end", "center", "start", "end", "baseline",
      "self-start", "self-end",
    ],
    "align-self" => &[
      "auto", "normal", "stretch", "flex-start", "flex-end", "center", "start", "end", "baseline",
    ],
    "border-top-style" | "border-right-style" | "border-bottom-style" | "border-left-style" => {
      BORDER_STYLES
    }
    "outline-style" => &[
      "auto", "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset",
      "outset",
    ],
    "text-decoration-style" => &["solid", "double", "dotted", "dashed", "wavy"],
    "list-style-type" => &[
      "disc", "circle", "square", "decimal", "decimal-leading-zero", "lower-roman", "upper-roman",
      "lower-alpha", "upper-alpha", "lower-latin", "upper-latin", "none",
    ],
    "list-style-position" => &["inside", "outside"],
    "background-repeat" => &["repeat", "repeat-x", "repeat-y", "no-repeat", "space", "round"],
    "background-attachment" => &["scroll", "fixed", "local"],
    _ => return None,
  })
}

const BORDER_STYLES: &[&str] = &[
  "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

// ============================================================================
// Shorthand expansion
// ============================================================================

/// Expand a shorthand into `(longhand, value tokens)` pairs.
///
/// Every longhand of the shorthand appears in the output: omitted sub-values
/// reset to the longhand's initial value. A value still carrying
/// substitution references cannot be decomposed yet; each longhand receives
/// the full lexical text and is resolved at computed-value time.
pub fn expand_shorthand(shorthand: &str, tokens: &[CToken]) -> Result<Vec<(&'static str, Vec<CToken>)>, ()> {
  let info = property_info(shorthand).ok_or(())?;
  if !info.is_shorthand() {
    return Err(());
  }

  if tokens_have_references(tokens) {
    return Ok(
      info
        .longhands
        .iter()
        .map(|&longhand| (longhand, tokens.to_vec()))
        .collect(),
    );
  }

  let term_list = terms(tokens);
  if term_list.is_empty() {
    return Err(());
  }

  // A CSS-wide keyword applies to every longhand, but only alone.
  if let Some(word) = term_list[0].as_ident() {
    if matches!(word, "initial" | "inherit" | "unset" | "revert") {
      if term_list.len() != 1 {
        return Err(());
      }
      let token = CToken::Ident(word.to_string());
      return Ok(
        info
          .longhands
          .iter()
          .map(|&longhand| (longhand, vec![token.clone()]))
          .collect(),
      );
    }
  }

  let assignments: Vec<(&'static str, Vec<CToken>)> = match shorthand {
    "margin" | "padding" | "inset" | "border-width" | "border-style" | "border-color" => {
      expand_box_edges(info.longhands, &term_list)?
    }
    "border" => {
      let side = expand_border_side(&term_list)?;
      let mut out = Vec::new();
      for (channel, tokens) in [("width", side.0), ("style", side.1), ("color", side.2)] {
        for edge in ["top", "right", "bottom", "left"] {
          let longhand = info
            .longhands
            .iter()
            .copied()
            .find(|l| *l == format!("border-{edge}-{channel}"))
            .ok_or(())?;
          out.push((longhand, tokens.clone()));
        }
      }
      out
    }
    "border-top" | "border-right" | "border-bottom" | "border-left" => {
      let side = expand_border_side(&term_list)?;
      vec![
        (info.longhands[0], side.0),
        (info.longhands[1], side.1),
        (info.longhands[2], side.2),
      ]
    }
    "outline" => {
      let side = expand_outline(&term_list)?;
      vec![
        (info.longhands[0], side.0),
        (info.longhands[1], side.1),
        (info.longhands[2], side.2),
      ]
    }
    "overflow" | "gap" => {
      let (first, second) = match term_list.as_slice() {
        [one] => ((*one).clone(), (*one).clone()),
        [a, b] => ((*a).clone(), (*b).clone()),
        _ => return Err(()),
      };
      vec![(info.longhands[0], vec![first]), (info.longhands[1], vec![second])]
    }
    "flex" => expand_flex(info.longhands, &term_list)?,
    "font" => expand_font(info.longhands, &term_list)?,
    "background" => expand_background(info.longhands, &term_list)?,
    "list-style" => expand_list_style(info.longhands, &term_list)?,
    "text-decoration" => expand_text_decoration(info.longhands, &term_list)?,
    _ => return Err(()),
  };

  // Validate each assignment under the longhand grammar so an invalid
  // sub-value rejects the whole shorthand without mutating state.
  for (longhand, value_tokens) in &assignments {
    parse_value_tokens(longhand, value_tokens)?;
  }
  Ok(assignments)
}

fn expand_box_edges(
  longhands: &'static [&'static str],
  terms: &[&CToken],
) -> Result<Vec<(&'static str, Vec<CToken>)>, ()> {
  let values: Vec<CToken> = terms.iter().map(|t| (*t).clone()).collect();
  let (top, right, bottom, left) = match values.as_slice() {
    [a] => (a.clone(), a.clone(), a.clone(), a.clone()),
    [a, b] => (a.clone(), b.clone(), a.clone(), b.clone()),
    [a, b, c] => (a.clone(), b.clone(), c.clone(), b.clone()),
    [a, b, c, d] => (a.clone(), b.clone(), c.clone(), d.clone()),
    _ => return Err(()),
  };
  Ok(vec![
    (longhands[0], vec![top]),
    (longhands[1], vec![right]),
    (longhands[2], vec![bottom]),
    (longhands[3], vec![left]),
  ])
}

type SideTokens = (Vec<CToken>, Vec<CToken>, Vec<CToken>);

fn is_border_width_term(token: &CToken) -> bool {
  matches!(token, CToken::Dimension { .. })
    || matches!(token, CToken::Number { value, .. } if *value == 0.0)
    || token
      .as_ident()
      .is_some_and(|w| matches!(w, "thin" | "medium" | "thick"))
    || matches!(token, CToken::Function(name, _) if is_math_function(name))
}

fn is_border_style_term(token: &CToken) -> bool {
  token.as_ident().is_some_and(|w| BORDER_STYLES.contains(&w))
}

fn is_color_term(token: &CToken) -> bool {
  parse_color_term(token).is_ok()
}

/// `<width> || <style> || <color>` with omitted channels reset to initial.
fn expand_border_side(terms: &[&CToken]) -> Result<SideTokens, ()> {
  if terms.len() > 3 {
    return Err(());
  }
  let mut width = None;
  let mut style = None;
  let mut color = None;
  for t in terms {
    if width.is_none() && is_border_width_term(t) {
      width = Some((*t).clone());
    } else if style.is_none() && is_border_style_term(t) {
      style = Some((*t).clone());
    } else if color.is_none() && is_color_term(t) {
      color = Some((*t).clone());
    } else {
      return Err(());
    }
  }
  Ok((
    vec![width.unwrap_or(CToken::Ident("medium".to_string()))],
    vec![style.unwrap_or(CToken::Ident("none".to_string()))],
    vec![color.unwrap_or(CToken::Ident("currentcolor".to_string()))],
  ))
}

fn expand_outline(terms: &[&CToken]) -> Result<SideTokens, ()> {
  if terms.len() > 3 {
    return Err(());
  }
  let outline_style = |t: &CToken| {
    t.as_ident()
      .is_some_and(|w| w == "auto" || BORDER_STYLES.contains(&w))
  };
  let mut width = None;
  let mut style = None;
  let mut color = None;
  for t in terms {
    if style.is_none() && outline_style(t) {
      style = Some((*t).clone());
    } else if width.is_none() && is_border_width_term(t) {
      width = Some((*t).clone());
    } else if color.is_none() && is_color_term(t) {
      color = Some((*t).clone());
    } else {
      return Err(());
    }
  }
  Ok((
    vec![width.unwrap_or(CToken::Ident("medium".to_string()))],
    vec![style.unwrap_or(CToken::Ident("none".to_string()))],
    vec![color.unwrap_or(CToken::Ident("currentcolor".to_string()))],
  ))
}

/// `none | [ <grow> <shrink>? || <basis> ]`, with the single-value forms
/// `flex: <number>` and `flex: <basis>`.
fn expand_flex(
  longhands: &'static [&'static str],
  terms: &[&CToken],
) -> Result<Vec<(&'static str, Vec<CToken>)>, ()> {
  let number = |v: f32| CToken::Number {
    value: v,
    int_value: if v.fract() == 0.0 { Some(v as i32) } else { None },
    has_sign: false,
  };
  if let [one] = terms {
    if let Some(word) = one.as_ident() {
      return match word {
        "none" => Ok(vec![
          (longhands[0], vec![number(0.0)]),
          (longhands[1], vec![number(0.0)]),
          (longhands[2], vec![CToken::Ident("auto".to_string())]),
        ]),
        "auto" => Ok(vec![
          (longhands[0], vec![number(1.0)]),
          (longhands[1], vec![number(1.0)]),
          (longhands[2], vec![CToken::Ident("auto".to_string())]),
        ]),
        _ => Err(()),
      };
    }
  }

  let mut grow = None;
  let mut shrink = None;
  let mut basis = None;
  for t in terms {
    match t {
      CToken::Number { value, .. }
        if *value >= 0.0 && (grow.is_none() || shrink.is_none()) =>
      {
        if grow.is_none() {
          grow = Some((*t).clone());
        } else {
          shrink = Some((*t).clone());
        }
      }
      _ if basis.is_none() && length_percent_or(t, &["auto", "content"]).is_ok() => {
        basis = Some((*t).clone());
      }
      _ => return Err(()),
    }
  }
  if grow.is_none() && basis.is_none() {
    return Err(());
  }
  // `flex: <basis>` and `flex: <grow>` both default the others to 1/1/0.
  let default_basis = if grow.is_some() {
    CToken::Number {
      value: 0.0,
      int_value: Some(0),
      has_sign: false,
    }
  } else {
    CToken::Ident("auto".to_string())
  };
  Ok(vec![
    (longhands[0], vec![grow.unwrap_or(number(1.0))]),
    (longhands[1], vec![shrink.unwrap_or(number(1.0))]),
    (longhands[2], vec![basis.unwrap_or(default_basis)]),
  ])
}

/// `[ <style> || <variant> || <weight> ]? <size> [ / <line-height> ]? <family>+`
fn expand_font(
  longhands: &'static [&'static str],
  terms: &[&CToken],
) -> Result<Vec<(&'static str, Vec<CToken>)>, ()> {
  let mut style = None;
  let mut variant = None;
  let mut weight = None;
  let mut index = 0;

  while index < terms.len() {
    let t = terms[index];
    match t.as_ident() {
      Some("normal") => {} // ambiguous reset; leave all three at initial
      Some(word @ ("italic" | "oblique")) if style.is_none() => {
        style = Some(CToken::Ident(word.to_string()));
      }
      Some("small-caps") if variant.is_none() => {
        variant = Some(CToken::Ident("small-caps".to_string()));
      }
      Some(word @ ("bold" | "bolder" | "lighter")) if weight.is_none() => {
        weight = Some(CToken::Ident(word.to_string()));
      }
      Some(_) | None => break,
    }
    index += 1;
  }

  // Font size is mandatory.
  let size = terms.get(index).ok_or(())?;
  if parse_value_tokens("font-size", &[(*size).clone()]).is_err() {
    return Err(());
  }
  index += 1;

  // Optional /line-height.
  let mut line_height = None;
  if matches!(terms.get(index), Some(CToken::Delim('/'))) {
    index += 1;
    let lh = terms.get(index).ok_or(())?;
    line_height = Some((*lh).clone());
    index += 1;
  }

  // Family list is mandatory; keep its raw tokens (commas included).
  if index >= terms.len() {
    return Err(());
  }
  let mut family_tokens = Vec::new();
  for (i, t) in terms[index..].iter().enumerate() {
    if i > 0 {
      family_tokens.push(CToken::Whitespace);
    }
    family_tokens.push((*t).clone());
  }

  Ok(vec![
    (longhands[0], vec![style.unwrap_or(CToken::Ident("normal".to_string()))]),
    (longhands[1], vec![variant.unwrap_or(CToken::Ident("normal".to_string()))]),
    (longhands[2], vec![weight.unwrap_or(CToken::Ident("normal".to_string()))]),
    (longhands[3], vec![(*size).clone()]),
    (
      longhands[4],
      vec![line_height.unwrap_or(CToken::Ident("normal".to_string()))],
    ),
    (longhands[5], family_tokens),
  ])
}

fn expand_background(
  longhands: &'static [&'static str],
  terms: &[&CToken],
) -> Result<Vec<(&'static str, Vec<CToken>)>, ()> {
  let mut color = None;
  let mut image = None;
  let mut repeat = None;
  let mut attachment = None;
  let mut position: Vec<CToken> = Vec::new();

  let is_position_term = |t: &CToken| {
    matches!(t, CToken::Dimension { .. } | CToken::Percentage(_))
      || matches!(t, CToken::Number { value, .. } if *value == 0.0)
      || t
        .as_ident()
        .is_some_and(|w| matches!(w, "left" | "center" | "right" | "top" | "bottom"))
  };

  for t in terms {
    if image.is_none()
      && (matches!(t, CToken::Url(_)) || t.as_ident().is_some_and(|w| w == "none"))
    {
      image = Some((*t).clone());
    } else if repeat.is_none()
      && t
        .as_ident()
        .is_some_and(|w| matches!(w, "repeat" | "repeat-x" | "repeat-y" | "no-repeat"))
    {
      repeat = Some((*t).clone());
    } else if attachment.is_none()
      && t.as_ident().is_some_and(|w| matches!(w, "scroll" | "fixed" | "local"))
    {
      attachment = Some((*t).clone());
    } else if position.len() < 2 && is_position_term(t) {
      if !position.is_empty() {
        position.push(CToken::Whitespace);
      }
      position.push((*t).clone());
    } else if color.is_none() && is_color_term(t) {
      color = Some((*t).clone());
    } else {
      return Err(());
    }
  }

  Ok(vec![
    (longhands[0], vec![color.unwrap_or(CToken::Ident("transparent".to_string()))]),
    (longhands[1], vec![image.unwrap_or(CToken::Ident("none".to_string()))]),
    (longhands[2], vec![repeat.unwrap_or(CToken::Ident("repeat".to_string()))]),
    (longhands[3], vec![attachment.unwrap_or(CToken::Ident("scroll".to_string()))]),
    (
      longhands[4],
      if position.is_empty() {
        vec![
          CToken::Percentage(0.0),
          CToken::Whitespace,
          CToken::Percentage(0.0),
        ]
      } else {
        position
      },
    ),
  ])
}

fn expand_list_style(
  longhands: &'static [&'static str],
  terms: &[&CToken],
) -> Result<Vec<(&'static str, Vec<CToken>)>, ()> {
  let type_keywords = keyword_set("list-style-type").expect("list-style-type keywords");
  let mut style_type = None;
  let mut position = None;
  let mut image = None;
  let mut none_count = 0usize;

  for t in terms {
    match t.as_ident() {
      Some("none") => none_count += 1,
      Some(word @ ("inside" | "outside")) if position.is_none() => {
        position = Some(CToken::Ident(word.to_string()));
      }
      Some(word) if style_type.is_none() && type_keywords.contains(&word) => {
        style_type = Some(CToken::Ident(word.to_string()));
      }
      _ if image.is_none() && matches!(t, CToken::Url(_)) => {
        image = Some((*t).clone());
      }
      _ => return Err(()),
    }
  }
  // `none` fills type and/or image, whichever is still open.
  for _ in 0..none_count {
    if style_type.is_none() {
      style_type = Some(CToken::Ident("none".to_string()));
    } else if image.is_none() {
      image = Some(CToken::Ident("none".to_string()));
    } else {
      return Err(());
    }
  }

  Ok(vec![
    (longhands[0], vec![style_type.unwrap_or(CToken::Ident("disc".to_string()))]),
    (longhands[1], vec![position.unwrap_or(CToken::Ident("outside".to_string()))]),
    (longhands[2], vec![image.unwrap_or(CToken::Ident("none".to_string()))]),
  ])
}

fn expand_text_decoration(
  longhands: &'static [&'static str],
  terms: &[&CToken],
) -> Result<Vec<(&'static str, Vec<CToken>)>, ()> {
  let mut lines: Vec<CToken> = Vec::new();
  let mut style = None;
  let mut color = None;

  for t in terms {
    match t.as_ident() {
      Some(word @ ("underline" | "overline" | "line-through" | "blink" | "none")) => {
        if !lines.is_empty() {
          lines.push(CToken::Whitespace);
        }
        lines.push(CToken::Ident(word.to_string()));
      }
      Some(word @ ("solid" | "double" | "dotted" | "dashed" | "wavy")) if style.is_none() => {
        style = Some(CToken::Ident(word.to_string()));
      }
      _ if color.is_none() && is_color_term(t) => {
        color = Some((*t).clone());
      }
      _ => return Err(()),
    }
  }

  Ok(vec![
    (
      longhands[0],
      if lines.is_empty() {
        vec![CToken::Ident("none".to_string())]
      } else {
        lines
      },
    ),
    (longhands[1], vec![style.unwrap_or(CToken::Ident("solid".to_string()))]),
    (longhands[2], vec![color.unwrap_or(CToken::Ident("currentcolor".to_string()))]),
  ])
}

// ============================================================================
// Shorthand composition (read-back)
// ============================================================================

/// Compose a shorthand's canonical text from its longhands.
///
/// Returns `None` when the shorthand is not expressible: a longhand is
/// missing, priorities disagree (checked by the caller), or the stored
/// values have no joint shorthand syntax. This is the read half of the
/// write-expands/read-composes asymmetry.
pub fn compose_shorthand(shorthand: &str, get: &dyn Fn(&str) -> Option<String>) -> Option<String> {
  let info = property_info(shorthand)?;
  let mut values = Vec::with_capacity(info.longhands.len());
  for longhand in info.longhands {
    values.push(get(longhand)?);
  }

  match shorthand {
    "margin" | "padding" | "inset" | "border-width" | "border-style" | "border-color" => {
      Some(compose_box_edges(&values))
    }
    "border" => {
      // All four edges must agree per channel.
      let width = all_equal(&values[0..4])?;
      let style = all_equal(&values[4..8])?;
      let color = all_equal(&values[8..12])?;
      Some(compose_side(width, style, color, "medium", "none", "currentcolor"))
    }
    "border-top" | "border-right" | "border-bottom" | "border-left" | "outline" => {
      Some(compose_side(&values[0], &values[1], &values[2], "medium", "none", "currentcolor"))
    }
    "overflow" | "gap" => Some(if values[0] == values[1] {
      values[0].clone()
    } else {
      format!("{} {}", values[0], values[1])
    }),
    "flex" => Some(format!("{} {} {}", values[0], values[1], values[2])),
    "font" => {
      let mut parts = Vec::new();
      for (value, initial) in values[0..3].iter().zip(["normal", "normal", "normal"]) {
        if value != initial {
          parts.push(value.clone());
        }
      }
      let size = if values[4] == "normal" {
        values[3].clone()
      } else {
        format!("{}/{}", values[3], values[4])
      };
      parts.push(size);
      parts.push(values[5].clone());
      Some(parts.join(" "))
    }
    "background" => {
      let initials = ["transparent", "none", "repeat", "scroll", "0% 0%"];
      let parts: Vec<String> = values
        .iter()
        .zip(initials)
        .filter(|(value, initial)| value.as_str() != *initial)
        .map(|(value, _)| value.clone())
        .collect();
      Some(if parts.is_empty() { "none".to_string() } else { parts.join(" ") })
    }
    "list-style" => {
      let initials = ["disc", "outside", "none"];
      let parts: Vec<String> = values
        .iter()
        .zip(initials)
        .filter(|(value, initial)| value.as_str() != *initial)
        .map(|(value, _)| value.clone())
        .collect();
      Some(if parts.is_empty() { values[0].clone() } else { parts.join(" ") })
    }
    "text-decoration" => {
      let initials = ["none", "solid", "currentcolor"];
      let parts: Vec<String> = values
        .iter()
        .zip(initials)
        .filter(|(value, initial)| value.as_str() != *initial)
        .map(|(value, _)| value.clone())
        .collect();
      Some(if parts.is_empty() { "none".to_string() } else { parts.join(" ") })
    }
    _ => None,
  }
}

fn all_equal(values: &[String]) -> Option<&String> {
  let first = values.first()?;
  values.iter().all(|v| v == first).then_some(first)
}

fn compose_box_edges(values: &[String]) -> String {
  let (top, right, bottom, left) = (&values[0], &values[1], &values[2], &values[3]);
  if left == right {
    if top == bottom {
      if top == right {
        top.clone()
      } else {
        format!("{top} {right}")
      }
    } else {
      format!("{top} {right} {bottom}")
    }
  } else {
    format!("{top} {right} {bottom} {left}")
  }
}

fn compose_side(
  width: &str,
  style: &str,
  color: &str,
  initial_width: &str,
  initial_style: &str,
  initial_color: &str,
) -> String {
  let mut parts = Vec::new();
  if width != initial_width {
    parts.push(width);
  }
  if style != initial_style {
    parts.push(style);
  }
  if color != initial_color {
    parts.push(color);
  }
  if parts.is_empty() {
    // Everything at initial still composes to the canonical style keyword.
    parts.push(initial_style);
  }
  parts.join(" ")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::css::lexical::{serialize, tokenize};

  fn parse(property: &str, text: &str) -> Result<Value, ()> {
    parse_value_tokens(property, &tokenize(text))
  }

  fn expand(shorthand: &str, text: &str) -> Result<Vec<(&'static str, String)>, ()> {
    expand_shorthand(shorthand, &tokenize(text))
      .map(|pairs| pairs.into_iter().map(|(name, tokens)| (name, serialize(&tokens))).collect())
  }

  #[test]
  fn database_classifies_properties() {
    assert!(is_shorthand("margin"));
    assert!(!is_shorthand("margin-top"));
    assert!(is_inherited("color"));
    assert!(!is_inherited("margin-top"));
    assert!(property_info("not-a-property").is_none());
  }

  #[test]
  fn initial_values_parse() {
    assert_eq!(initial_value("margin-top"), Some(Value::Length(Length::px(0.0))));
    assert_eq!(initial_value("display"), Some(Value::keyword("inline")));
    assert_eq!(initial_value("margin"), None); // shorthands have no initial
  }

  #[test]
  fn lengths_and_keywords_parse() {
    assert_eq!(
      parse("margin-left", "10px"),
      Ok(Value::Length(Length::px(10.0)))
    );
    assert_eq!(parse("margin-left", "auto"), Ok(Value::keyword("auto")));
    assert_eq!(parse("margin-left", "50%"), Ok(Value::Percentage(50.0)));
    assert!(parse("margin-left", "10px 20px").is_err());
    assert!(parse("margin-left", "solid").is_err());
  }

  #[test]
  fn css_wide_keywords_must_stand_alone() {
    assert_eq!(parse("display", "inherit"), Ok(Value::keyword("inherit")));
    assert!(parse("flex-grow", "unset unset").is_err());
  }

  #[test]
  fn keyword_sets_reject_unknown_words() {
    assert_eq!(parse("display", "block"), Ok(Value::keyword("block")));
    assert!(parse("display", "bloc").is_err());
    assert!(parse("position", "10px").is_err());
  }

  #[test]
  fn numeric_properties() {
    assert_eq!(parse("z-index", "3"), Ok(Value::Integer(3)));
    assert!(parse("z-index", "3.5").is_err());
    assert_eq!(parse("opacity", "0.5"), Ok(Value::Number(0.5)));
    assert_eq!(parse("font-weight", "700"), Ok(Value::Number(700.0)));
    assert!(parse("font-weight", "7000").is_err());
  }

  #[test]
  fn colors_parse() {
    assert_eq!(
      parse("color", "#ff0000"),
      Ok(Value::Color(Color::rgb(255, 0, 0)))
    );
    assert_eq!(
      parse("background-color", "rgb(1, 2, 3)"),
      Ok(Value::Color(Color::rgb(1, 2, 3)))
    );
    assert_eq!(parse("color", "currentcolor"), Ok(Value::keyword("currentcolor")));
    assert!(parse("color", "#zzz").is_err());
  }

  #[test]
  fn values_with_references_stay_lexical() {
    let value = parse("margin-left", "var(--m, 1vb)").expect("lexical value accepted");
    assert!(value.is_lexical());
  }

  #[test]
  fn box_shorthand_expansion() {
    let pairs = expand("margin", "10px").expect("expansion");
    assert_eq!(pairs.len(), 4);
    assert!(pairs.iter().all(|(_, v)| v == "10px"));

    let pairs = expand("margin", "1px 2px").expect("expansion");
    assert_eq!(pairs[0], ("margin-top", "1px".to_string()));
    assert_eq!(pairs[1], ("margin-right", "2px".to_string()));
    assert_eq!(pairs[2], ("margin-bottom", "1px".to_string()));
    assert_eq!(pairs[3], ("margin-left", "2px".to_string()));

    let pairs = expand("margin", "1px 2px 3px 4px").expect("expansion");
    assert_eq!(pairs[3], ("margin-left", "4px".to_string()));

    assert!(expand("margin", "1px 2px 3px 4px 5px").is_err());
  }

  #[test]
  fn border_shorthand_expands_all_channels() {
    let pairs = expand("border", "1px solid red").expect("expansion");
    assert_eq!(pairs.len(), 12);
    assert!(pairs.iter().any(|(n, v)| *n == "border-left-width" && v == "1px"));
    assert!(pairs.iter().any(|(n, v)| *n == "border-top-style" && v == "solid"));
    assert!(pairs.iter().any(|(n, v)| *n == "border-bottom-color" && v == "red"));
  }

  #[test]
  fn border_side_omitted_channels_reset() {
    let pairs = expand("border-top", "solid").expect("expansion");
    assert_eq!(pairs[0], ("border-top-width", "medium".to_string()));
    assert_eq!(pairs[1], ("border-top-style", "solid".to_string()));
    assert_eq!(pairs[2], ("border-top-color", "currentcolor".to_string()));
  }

  #[test]
  fn flex_shorthand_forms() {
    let pairs = expand("flex", "none").expect("expansion");
    assert_eq!(pairs[0].1, "0");
    assert_eq!(pairs[2].1, "auto");

    let pairs = expand("flex", "2").expect("expansion");
    assert_eq!(pairs[0].1, "2");
    assert_eq!(pairs[1].1, "1");
    assert_eq!(pairs[2].1, "0");

    let pairs = expand("flex", "2 3 10%").expect("expansion");
    assert_eq!(pairs[0].1, "2");
    assert_eq!(pairs[1].1, "3");
    assert_eq!(pairs[2].1, "10%");
  }

  #[test]
  fn flex_unset_unset_is_invalid() {
    assert!(expand("flex", "unset unset").is_err());
    assert!(expand("flex", "unset").is_ok());
  }

  #[test]
  fn font_shorthand_requires_size_and_family() {
    let pairs = expand("font", "italic bold 12px/30px serif").expect("expansion");
    assert_eq!(pairs[0], ("font-style", "italic".to_string()));
    assert_eq!(pairs[2], ("font-weight", "bold".to_string()));
    assert_eq!(pairs[3], ("font-size", "12px".to_string()));
    assert_eq!(pairs[4], ("line-height", "30px".to_string()));
    assert_eq!(pairs[5], ("font-family", "serif".to_string()));

    assert!(expand("font", "italic bold").is_err());
    assert!(expand("font", "12px").is_err());
  }

  #[test]
  fn background_shorthand_order_free() {
    let pairs = expand("background", "no-repeat red url(bg.png)").expect("expansion");
    assert!(pairs.iter().any(|(n, v)| *n == "background-color" && v == "red"));
    assert!(pairs.iter().any(|(n, v)| *n == "background-image" && v == "url(bg.png)"));
    assert!(pairs.iter().any(|(n, v)| *n == "background-repeat" && v == "no-repeat"));
    assert!(pairs.iter().any(|(n, v)| *n == "background-attachment" && v == "scroll"));
  }

  #[test]
  fn list_style_none_fills_open_slots() {
    let pairs = expand("list-style", "none").expect("expansion");
    assert_eq!(pairs[0].1, "none"); // type
    assert_eq!(pairs[2].1, "none"); // image stays at initial none

    let pairs = expand("list-style", "square none").expect("expansion");
    assert_eq!(pairs[0].1, "square");
    assert_eq!(pairs[2].1, "none");
  }

  #[test]
  fn shorthand_with_references_assigns_pending_text() {
    let pairs = expand("margin", "var(--m)").expect("pending expansion");
    assert_eq!(pairs.len(), 4);
    assert!(pairs.iter().all(|(_, v)| v == "var(--m)"));
  }

  #[test]
  fn compose_box_minimizes() {
    let values = |v: &[&str]| {
      let owned: Vec<String> = v.iter().map(|s| s.to_string()).collect();
      owned
    };
    assert_eq!(compose_box_edges(&values(&["1px", "1px", "1px", "1px"])), "1px");
    assert_eq!(compose_box_edges(&values(&["1px", "2px", "1px", "2px"])), "1px 2px");
    assert_eq!(compose_box_edges(&values(&["1px", "2px", "3px", "2px"])), "1px 2px 3px");
    assert_eq!(
      compose_box_edges(&values(&["1px", "2px", "3px", "4px"])),
      "1px 2px 3px 4px"
    );
  }

  #[test]
  fn compose_border_requires_uniform_edges() {
    let uniform = |name: &str| -> Option<String> {
      Some(match name {
        n if n.ends_with("width") => "1px".to_string(),
        n if n.ends_with("style") => "solid".to_string(),
        _ => "red".to_string(),
      })
    };
    assert_eq!(compose_shorthand("border", &uniform), Some("1px solid red".to_string()));

    let mixed = |name: &str| -> Option<String> {
      Some(match name {
        "border-top-width" => "2px".to_string(),
        n if n.ends_with("width") => "1px".to_string(),
        n if n.ends_with("style") => "solid".to_string(),
        _ => "red".to_string(),
      })
    };
    assert_eq!(compose_shorthand("border", &mixed), None);
  }

  #[test]
  fn compose_fails_on_missing_longhand() {
    let partial = |name: &str| -> Option<String> {
      (name == "margin-top").then(|| "1px".to_string())
    };
    assert_eq!(compose_shorthand("margin", &partial), None);
  }
}
