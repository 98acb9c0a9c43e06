//! CSS value types and unit conversion
//!
//! Values are represented in their parsed form where possible, and kept
//! lexical while they still carry substitution references. Length units are
//! categorized as:
//! - **Absolute**: px, pt, pc, in, cm, mm, q — fixed conversion ratios
//! - **Font-relative**: em, rem, ex, rex, ch, rch, ic, ric, cap, lh, rlh
//! - **Viewport-relative**: vw, vh, vi, vb, vmin, vmax
//! - **Percentages**: relative to a caller-supplied base
//!
//! Reference: CSS Values and Units Module Level 4
//! <https://www.w3.org/TR/css-values-4/>

use crate::css::lexical::LexicalValue;
use crate::style::calc::CalcExpr;
use crate::style::device::{DeviceContext, WritingMode};
use std::fmt;

/// CSS length units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
  // Absolute
  Px,
  Pt,
  Pc,
  In,
  Cm,
  Mm,
  Q,
  // Font-relative
  Em,
  Rem,
  Ex,
  Rex,
  Ch,
  Rch,
  Ic,
  Ric,
  Cap,
  Lh,
  Rlh,
  // Viewport-relative
  Vw,
  Vh,
  Vi,
  Vb,
  Vmin,
  Vmax,
  /// Percentage; resolution needs a caller-supplied base.
  Percent,
}

impl LengthUnit {
  /// Parse a unit identifier (case-insensitive). `%` is handled by the
  /// tokenizer as a percentage token, not here.
  pub fn parse(unit: &str) -> Option<Self> {
    Some(match unit.to_ascii_lowercase().as_str() {
      "px" => Self::Px,
      "pt" => Self::Pt,
      "pc" => Self::Pc,
      "in" => Self::In,
      "cm" => Self::Cm,
      "mm" => Self::Mm,
      "q" => Self::Q,
      "em" => Self::Em,
      "rem" => Self::Rem,
      "ex" => Self::Ex,
      "rex" => Self::Rex,
      "ch" => Self::Ch,
      "rch" => Self::Rch,
      "ic" => Self::Ic,
      "ric" => Self::Ric,
      "cap" => Self::Cap,
      "lh" => Self::Lh,
      "rlh" => Self::Rlh,
      "vw" => Self::Vw,
      "vh" => Self::Vh,
      "vi" => Self::Vi,
      "vb" => Self::Vb,
      "vmin" => Self::Vmin,
      "vmax" => Self::Vmax,
      _ => return None,
    })
  }

  pub fn is_absolute(self) -> bool {
    matches!(
      self,
      Self::Px | Self::Pt | Self::Pc | Self::In | Self::Cm | Self::Mm | Self::Q
    )
  }

  pub fn is_font_relative(self) -> bool {
    matches!(
      self,
      Self::Em
        | Self::Rem
        | Self::Ex
        | Self::Rex
        | Self::Ch
        | Self::Rch
        | Self::Ic
        | Self::Ric
        | Self::Cap
        | Self::Lh
        | Self::Rlh
    )
  }

  pub fn is_viewport_relative(self) -> bool {
    matches!(
      self,
      Self::Vw | Self::Vh | Self::Vi | Self::Vb | Self::Vmin | Self::Vmax
    )
  }

  pub fn is_percentage(self) -> bool {
    matches!(self, Self::Percent)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Px => "px",
      Self::Pt => "pt",
      Self::Pc => "pc",
      Self::In => "in",
      Self::Cm => "cm",
      Self::Mm => "mm",
      Self::Q => "q",
      Self::Em => "em",
      Self::Rem => "rem",
      Self::Ex => "ex",
      Self::Rex => "rex",
      Self::Ch => "ch",
      Self::Rch => "rch",
      Self::Ic => "ic",
      Self::Ric => "ric",
      Self::Cap => "cap",
      Self::Lh => "lh",
      Self::Rlh => "rlh",
      Self::Vw => "vw",
      Self::Vh => "vh",
      Self::Vi => "vi",
      Self::Vb => "vb",
      Self::Vmin => "vmin",
      Self::Vmax => "vmax",
      Self::Percent => "%",
    }
  }
}

impl fmt::Display for LengthUnit {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Why a length could not be resolved in the current context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
  /// Viewport-relative unit with no viewport dimensions available.
  ViewportRequired(&'static str),
  /// Percentage with no base supplied.
  PercentageBaseRequired,
}

/// Context for resolving relative units into pixels.
///
/// Built per element by the resolver: font sizes and line heights come from
/// the inheritance chain, viewport and metrics from the device context.
#[derive(Debug, Clone, Copy)]
pub struct UnitContext<'a> {
  pub device: &'a DeviceContext,
  /// The element's own computed font size, in px.
  pub font_size: f32,
  /// The element's own computed line height, in px.
  pub line_height: f32,
  /// Base for percentage resolution, when the property has one.
  pub percentage_base: Option<f32>,
}

impl<'a> UnitContext<'a> {
  pub fn new(device: &'a DeviceContext, font_size: f32, line_height: f32) -> Self {
    Self {
      device,
      font_size,
      line_height,
      percentage_base: None,
    }
  }

  pub fn with_percentage_base(mut self, base: f32) -> Self {
    self.percentage_base = Some(base);
    self
  }
}

/// A CSS length value with a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
  pub value: f32,
  pub unit: LengthUnit,
}

impl Length {
  pub const fn new(value: f32, unit: LengthUnit) -> Self {
    Self { value, unit }
  }

  pub const fn px(value: f32) -> Self {
    Self::new(value, LengthUnit::Px)
  }

  pub const fn pt(value: f32) -> Self {
    Self::new(value, LengthUnit::Pt)
  }

  pub const fn em(value: f32) -> Self {
    Self::new(value, LengthUnit::Em)
  }

  pub const fn rem(value: f32) -> Self {
    Self::new(value, LengthUnit::Rem)
  }

  pub const fn percent(value: f32) -> Self {
    Self::new(value, LengthUnit::Percent)
  }

  pub fn is_zero(self) -> bool {
    self.value == 0.0
  }

  /// Convert an absolute length to px. Callers must not pass relative units;
  /// use [`Length::resolve`] for those.
  pub fn to_px(self) -> f32 {
    match self.unit {
      LengthUnit::Px => self.value,
      LengthUnit::Pt => self.value * (96.0 / 72.0),
      LengthUnit::Pc => self.value * 16.0,
      LengthUnit::In => self.value * 96.0,
      LengthUnit::Cm => self.value * (96.0 / 2.54),
      LengthUnit::Mm => self.value * (96.0 / 25.4),
      LengthUnit::Q => self.value * (96.0 / 101.6),
      _ => self.value,
    }
  }

  /// Resolve to px with full context.
  ///
  /// Absolute units convert by ratio; font-relative units resolve against
  /// the context's font size/line height (root variants against the device's
  /// root values); viewport units require viewport dimensions and map
  /// `vi`/`vb` through the writing mode.
  pub fn resolve(self, ctx: &UnitContext) -> Result<f32, UnitError> {
    let metrics = ctx.device.metrics;
    let root_font = ctx.device.root_font_size;
    match self.unit {
      u if u.is_absolute() => Ok(self.to_px()),
      LengthUnit::Em => Ok(self.value * ctx.font_size),
      LengthUnit::Rem => Ok(self.value * root_font),
      LengthUnit::Ex => Ok(self.value * ctx.font_size * metrics.ex_ratio),
      LengthUnit::Rex => Ok(self.value * root_font * metrics.ex_ratio),
      LengthUnit::Ch => Ok(self.value * ctx.font_size * metrics.ch_ratio),
      LengthUnit::Rch => Ok(self.value * root_font * metrics.ch_ratio),
      LengthUnit::Ic => Ok(self.value * ctx.font_size * metrics.ic_ratio),
      LengthUnit::Ric => Ok(self.value * root_font * metrics.ic_ratio),
      LengthUnit::Cap => Ok(self.value * ctx.font_size * metrics.cap_ratio),
      LengthUnit::Lh => Ok(self.value * ctx.line_height),
      LengthUnit::Rlh => Ok(self.value * ctx.device.root_line_height),
      u if u.is_viewport_relative() => {
        let viewport = ctx
          .device
          .viewport
          .ok_or(UnitError::ViewportRequired(self.unit.as_str()))?;
        let (vw, vh) = (viewport.width, viewport.height);
        let basis = match u {
          LengthUnit::Vw => vw,
          LengthUnit::Vh => vh,
          LengthUnit::Vi => {
            if ctx.device.writing_mode.is_vertical() {
              vh
            } else {
              vw
            }
          }
          LengthUnit::Vb => {
            if ctx.device.writing_mode == WritingMode::HorizontalTb {
              vh
            } else {
              vw
            }
          }
          LengthUnit::Vmin => vw.min(vh),
          LengthUnit::Vmax => vw.max(vh),
          _ => unreachable!(),
        };
        Ok((self.value / 100.0) * basis)
      }
      LengthUnit::Percent => ctx
        .percentage_base
        .map(|base| (self.value / 100.0) * base)
        .ok_or(UnitError::PercentageBaseRequired),
      _ => unreachable!(),
    }
  }
}

impl fmt::Display for Length {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}", serialize_number(self.value), self.unit)
  }
}

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  /// Alpha scaled to 0..=255.
  pub a: u8,
}

impl Color {
  pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
    Self { r, g, b, a: 255 }
  }

  pub const TRANSPARENT: Self = Self { r: 0, g: 0, b: 0, a: 0 };

  /// Parse a hex color body (the part after `#`): 3, 4, 6 or 8 digits.
  pub fn parse_hex(hex: &str) -> Option<Self> {
    fn nibble(b: u8) -> Option<u8> {
      (b as char).to_digit(16).map(|d| d as u8)
    }
    let bytes = hex.as_bytes();
    match bytes.len() {
      3 | 4 => {
        let r = nibble(bytes[0])?;
        let g = nibble(bytes[1])?;
        let b = nibble(bytes[2])?;
        let a = if bytes.len() == 4 { nibble(bytes[3])? } else { 15 };
        Some(Self {
          r: r * 17,
          g: g * 17,
          b: b * 17,
          a: a * 17,
        })
      }
      6 | 8 => {
        let r = nibble(bytes[0])? * 16 + nibble(bytes[1])?;
        let g = nibble(bytes[2])? * 16 + nibble(bytes[3])?;
        let b = nibble(bytes[4])? * 16 + nibble(bytes[5])?;
        let a = if bytes.len() == 8 {
          nibble(bytes[6])? * 16 + nibble(bytes[7])?
        } else {
          255
        };
        Some(Self { r, g, b, a })
      }
      _ => None,
    }
  }

  /// Named colors (a pragmatic subset) plus `transparent`.
  pub fn parse_named(name: &str) -> Option<Self> {
    let rgb = |r, g, b| Some(Self::rgb(r, g, b));
    match name.to_ascii_lowercase().as_str() {
      "transparent" => Some(Self::TRANSPARENT),
      "black" => rgb(0, 0, 0),
      "silver" => rgb(192, 192, 192),
      "gray" | "grey" => rgb(128, 128, 128),
      "white" => rgb(255, 255, 255),
      "maroon" => rgb(128, 0, 0),
      "red" => rgb(255, 0, 0),
      "purple" => rgb(128, 0, 128),
      "fuchsia" | "magenta" => rgb(255, 0, 255),
      "green" => rgb(0, 128, 0),
      "lime" => rgb(0, 255, 0),
      "olive" => rgb(128, 128, 0),
      "yellow" => rgb(255, 255, 0),
      "navy" => rgb(0, 0, 128),
      "blue" => rgb(0, 0, 255),
      "teal" => rgb(0, 128, 128),
      "aqua" | "cyan" => rgb(0, 255, 255),
      "orange" => rgb(255, 165, 0),
      "pink" => rgb(255, 192, 203),
      "brown" => rgb(165, 42, 42),
      "gold" => rgb(255, 215, 0),
      "indigo" => rgb(75, 0, 130),
      "violet" => rgb(238, 130, 238),
      _ => None,
    }
  }
}

impl fmt::Display for Color {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.a == 255 {
      write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    } else {
      write!(
        f,
        "rgba({}, {}, {}, {})",
        self.r,
        self.g,
        self.b,
        serialize_number(self.a as f32 / 255.0)
      )
    }
  }
}

/// A parsed (or still-lexical) property value.
///
/// The tagged-union design is deliberate: selector conditions and value
/// primitives dispatch by exhaustive matching, not downcasting.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  /// Identifier keyword (`block`, `auto`, `inherit`, ...)
  Keyword(String),
  Length(Length),
  Number(f32),
  Integer(i32),
  /// Percentage as written (50 for `50%`)
  Percentage(f32),
  Color(Color),
  Str(String),
  Url(String),
  /// Unevaluated arithmetic expression
  Calc(CalcExpr),
  /// Whitespace-separated list
  List(Vec<Value>),
  /// Comma-separated list (items may themselves be `List`s)
  CommaList(Vec<Value>),
  /// Unresolved value still carrying var()/attr()/env() references
  Lexical(LexicalValue),
}

impl Value {
  pub fn keyword(word: &str) -> Self {
    Value::Keyword(word.to_string())
  }

  /// The keyword text, if this is a keyword.
  pub fn as_keyword(&self) -> Option<&str> {
    match self {
      Value::Keyword(word) => Some(word),
      _ => None,
    }
  }

  /// True for the CSS-wide keywords, which are valid for every property but
  /// only as the whole value.
  pub fn is_css_wide_keyword(&self) -> bool {
    self
      .as_keyword()
      .is_some_and(|word| matches!(word, "initial" | "inherit" | "unset" | "revert"))
  }

  pub fn is_lexical(&self) -> bool {
    matches!(self, Value::Lexical(_))
  }

  /// Canonical serialization.
  pub fn to_css_string(&self) -> String {
    match self {
      Value::Keyword(word) => word.clone(),
      Value::Length(length) => length.to_string(),
      Value::Number(n) => serialize_number(*n),
      Value::Integer(i) => i.to_string(),
      Value::Percentage(p) => format!("{}%", serialize_number(*p)),
      Value::Color(color) => color.to_string(),
      Value::Str(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
      Value::Url(url) => format!("url({})", url),
      Value::Calc(expr) => expr.to_css_string(),
      Value::List(items) => items
        .iter()
        .map(Value::to_css_string)
        .collect::<Vec<_>>()
        .join(" "),
      Value::CommaList(items) => items
        .iter()
        .map(Value::to_css_string)
        .collect::<Vec<_>>()
        .join(", "),
      Value::Lexical(lexical) => lexical.css_text(),
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_css_string())
  }
}

/// Serialize a numeric magnitude per the engine's rounding rules: values
/// below 1 round to 4 significant digits, larger values to 4 decimal
/// places; trailing zeros are stripped. Two inputs that round to the same
/// text serialize identically, keeping round-trips stable.
pub fn serialize_number(value: f32) -> String {
  if value == 0.0 || !value.is_finite() {
    return "0".to_string();
  }
  let decimals = if value.abs() < 1.0 {
    let exponent = value.abs().log10().floor() as i32;
    ((3 - exponent).max(4) as usize).min(10)
  } else {
    4
  };
  let mut text = format!("{:.*}", decimals, value);
  if text.contains('.') {
    while text.ends_with('0') {
      text.pop();
    }
    if text.ends_with('.') {
      text.pop();
    }
  }
  if text == "-0" {
    text = "0".to_string();
  }
  text
}
