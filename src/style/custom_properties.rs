//! Custom property registry and per-element store
//!
//! Custom properties (`--name`) are carried lexically until substitution.
//! An `@property`-style registration can constrain a property's syntax,
//! its inheritance behavior, and give it an initial value used when neither
//! the cascade nor any ancestor provides one.
//!
//! Reference: CSS Properties and Values API Level 1
//! <https://www.w3.org/TR/css-properties-values-api-1/>

use crate::css::lexical::{CToken, LexicalValue};
use crate::style::properties::parse_color_term;
use crate::style::values::LengthUnit;
use rustc_hash::FxHashMap;

/// Registered syntax constraint for a custom property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CustomPropertySyntax {
  /// `*` — any token sequence
  #[default]
  Universal,
  Length,
  Number,
  Integer,
  Percentage,
  LengthPercentage,
  Color,
  CustomIdent,
}

impl CustomPropertySyntax {
  /// Parse an `@property` syntax descriptor string.
  pub fn parse(descriptor: &str) -> Option<Self> {
    Some(match descriptor.trim() {
      "*" => Self::Universal,
      "<length>" => Self::Length,
      "<number>" => Self::Number,
      "<integer>" => Self::Integer,
      "<percentage>" => Self::Percentage,
      "<length-percentage>" => Self::LengthPercentage,
      "<color>" => Self::Color,
      "<custom-ident>" => Self::CustomIdent,
      _ => return None,
    })
  }

  /// Whether a lexical value conforms to this syntax. Values containing
  /// substitution references always pass; they are re-checked after
  /// substitution.
  pub fn allows(self, value: &LexicalValue) -> bool {
    if self == Self::Universal || value.has_references() {
      return true;
    }
    let terms: Vec<&CToken> = value.tokens().iter().filter(|t| !t.is_whitespace()).collect();
    let [term] = terms.as_slice() else {
      return false;
    };
    match self {
      Self::Universal => true,
      Self::Length => match term {
        CToken::Dimension { unit, .. } => LengthUnit::parse(unit).is_some(),
        CToken::Number { value, .. } => *value == 0.0,
        _ => false,
      },
      Self::Number => matches!(term, CToken::Number { .. }),
      Self::Integer => matches!(
        term,
        CToken::Number {
          int_value: Some(_),
          ..
        }
      ),
      Self::Percentage => matches!(term, CToken::Percentage(_)),
      Self::LengthPercentage => {
        matches!(term, CToken::Percentage(_))
          || matches!(term, CToken::Dimension { unit, .. } if LengthUnit::parse(unit).is_some())
          || matches!(term, CToken::Number { value, .. } if *value == 0.0)
      }
      Self::Color => parse_color_term(term).is_ok(),
      Self::CustomIdent => matches!(term, CToken::Ident(_)),
    }
  }
}

/// Definition of a registered custom property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRule {
  pub name: String,
  pub syntax: CustomPropertySyntax,
  pub inherits: bool,
  pub initial_value: Option<LexicalValue>,
}

/// Registry of custom property registrations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomPropertyRegistry {
  definitions: FxHashMap<String, PropertyRule>,
}

impl CustomPropertyRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register (or replace) a custom property definition. Rejects a
  /// definition whose initial value does not conform to its own syntax.
  pub fn register(&mut self, rule: PropertyRule) -> Result<(), ()> {
    if let Some(initial) = &rule.initial_value {
      if !rule.syntax.allows(initial) || initial.has_references() {
        return Err(());
      }
    }
    self.definitions.insert(rule.name.clone(), rule);
    Ok(())
  }

  pub fn get(&self, name: &str) -> Option<&PropertyRule> {
    self.definitions.get(name)
  }

  /// `inherits` flag for a property: registered value, or the unregistered
  /// default of `true`.
  pub fn inherits(&self, name: &str) -> bool {
    self.definitions.get(name).map_or(true, |rule| rule.inherits)
  }

  /// The registered initial value, when one exists.
  pub fn initial_value(&self, name: &str) -> Option<&LexicalValue> {
    self.definitions.get(name)?.initial_value.as_ref()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyRule)> {
    self.definitions.iter()
  }
}

/// Per-element custom property values, keyed by full `--name`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomPropertyStore {
  values: FxHashMap<String, LexicalValue>,
}

impl CustomPropertyStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, name: String, value: LexicalValue) {
    self.values.insert(name, value);
  }

  pub fn get(&self, name: &str) -> Option<&LexicalValue> {
    self.values.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.values.contains_key(name)
  }

  pub fn remove(&mut self, name: &str) -> Option<LexicalValue> {
    self.values.remove(name)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &LexicalValue)> {
    self.values.iter()
  }

  /// Merge `other`'s values, overwriting on collision.
  pub fn merge(&mut self, other: &CustomPropertyStore) {
    for (name, value) in &other.values {
      self.values.insert(name.clone(), value.clone());
    }
  }
}
