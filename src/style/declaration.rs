//! Style declarations
//!
//! A [`StyleDeclaration`] is an ordered mapping from longhand (or custom)
//! property names to `(value, priority)` pairs. Shorthands are views:
//! writing one always expands into its longhands; reading one back composes
//! only when every longhand is explicitly set, expressible, and shares a
//! single priority — otherwise the shorthand serializes as the empty
//! string, matching CSSOM serialization rules.
//!
//! All accepted declarations are kept in source order (the cascade
//! history); the *winning* entry per property is selected by priority tier,
//! then quirk-marker rank, then position. A later declaration with a
//! recognized quirk marker therefore never overrides an earlier unmarked
//! one of the same tier.

use crate::config::EngineConfig;
use crate::css::lexical::{is_custom_property_name, tokenize, LexicalValue};
use crate::css::parser::{parse_declaration_block, Priority};
use crate::error::{ErrorCollector, ParseError};
use crate::style::properties::{compose_shorthand, expand_shorthand, parse_value_tokens, property_info};
use crate::style::values::Value;
use rustc_hash::FxHashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
struct DeclEntry {
  name: String,
  value: Value,
  priority: Priority,
  /// The shorthand this entry was expanded from, when any. Entries owned by
  /// a shorthand refuse direct value-object mutation.
  origin: Option<String>,
}

/// An ordered set of property declarations.
#[derive(Debug, Clone, Default)]
pub struct StyleDeclaration {
  entries: Vec<DeclEntry>,
}

impl StyleDeclaration {
  pub fn new() -> Self {
    Self::default()
  }

  /// Parse a textual declaration block under the given configuration.
  /// Invalid declarations are reported through the collector and skipped.
  pub fn parse(text: &str, config: &EngineConfig, collector: &mut ErrorCollector) -> Self {
    let mut declaration = Self::new();
    for parsed in parse_declaration_block(text, config, collector) {
      declaration.set_property(&parsed.name, &parsed.value, parsed.priority, collector);
    }
    declaration
  }

  /// Parse and store one property. Returns whether anything was stored;
  /// failures are reported and leave the declaration unchanged.
  pub fn set_property(
    &mut self,
    name: &str,
    value_text: &str,
    priority: Priority,
    collector: &mut ErrorCollector,
  ) -> bool {
    if name.starts_with("--") {
      if !is_custom_property_name(name) {
        collector.error(ParseError::InvalidPropertyName {
          name: name.to_string(),
        });
        return false;
      }
      // Custom properties are stored lexically, empty values included.
      self.push_entry(DeclEntry {
        name: name.to_string(),
        value: Value::Lexical(LexicalValue::parse(value_text)),
        priority,
        origin: None,
      });
      return true;
    }

    let name = name.to_ascii_lowercase();
    let Some(info) = property_info(&name) else {
      collector.error(ParseError::InvalidPropertyValue {
        property: name,
        value: value_text.to_string(),
      });
      return false;
    };

    let tokens = tokenize(value_text);
    if info.is_shorthand() {
      match expand_shorthand(&name, &tokens) {
        Ok(assignments) => {
          for (longhand, longhand_tokens) in assignments {
            let value = parse_value_tokens(longhand, &longhand_tokens)
              .expect("expansion produced an invalid longhand value");
            self.push_entry(DeclEntry {
              name: longhand.to_string(),
              value,
              priority,
              origin: Some(name.clone()),
            });
          }
          true
        }
        Err(()) => {
          collector.error(ParseError::InvalidPropertyValue {
            property: name,
            value: value_text.to_string(),
          });
          false
        }
      }
    } else {
      match parse_value_tokens(&name, &tokens) {
        Ok(value) => {
          self.push_entry(DeclEntry {
            name,
            value,
            priority,
            origin: None,
          });
          true
        }
        Err(()) => {
          collector.error(ParseError::InvalidPropertyValue {
            property: name,
            value: value_text.to_string(),
          });
          false
        }
      }
    }
  }

  fn push_entry(&mut self, entry: DeclEntry) {
    self.entries.push(entry);
  }

  /// Winning entry index for a property: max by (tier, marker rank), then
  /// source position.
  fn winner_index(&self, name: &str) -> Option<usize> {
    self
      .entries
      .iter()
      .enumerate()
      .filter(|(_, e)| e.name == name)
      .max_by_key(|(index, e)| (e.priority.rank(), *index))
      .map(|(index, _)| index)
  }

  fn winner(&self, name: &str) -> Option<&DeclEntry> {
    self.winner_index(name).map(|i| &self.entries[i])
  }

  /// Distinct stored property names in first-declaration order.
  fn names_in_order(&self) -> Vec<&str> {
    let mut seen = FxHashSet::default();
    let mut names = Vec::new();
    for entry in &self.entries {
      if seen.insert(entry.name.as_str()) {
        names.push(entry.name.as_str());
      }
    }
    names
  }

  /// Number of distinct properties stored (longhands and custom).
  pub fn len(&self) -> usize {
    self.names_in_order().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// The i-th distinct property name, CSSOM-style.
  pub fn item(&self, index: usize) -> Option<String> {
    self.names_in_order().get(index).map(|n| n.to_string())
  }

  /// Serialized value text for a property; composes shorthands.
  pub fn get_property_value(&self, name: &str) -> String {
    if name.starts_with("--") {
      return self
        .winner(name)
        .map(|e| e.value.to_css_string())
        .unwrap_or_default();
    }
    let name = name.to_ascii_lowercase();
    match property_info(&name) {
      Some(info) if info.is_shorthand() => self.compose(&name).unwrap_or_default(),
      _ => self
        .winner(&name)
        .map(|e| e.value.to_css_string())
        .unwrap_or_default(),
    }
  }

  /// The structured winning value for a longhand or custom property.
  pub fn get_property_css_value(&self, name: &str) -> Option<&Value> {
    self.winner(name).map(|e| &e.value)
  }

  /// Priority text for a property (`""`, `"important"`, or quirk marker).
  /// A shorthand reports a priority only when its longhands agree.
  pub fn get_property_priority(&self, name: &str) -> String {
    let name_lower;
    let name = if name.starts_with("--") {
      name
    } else {
      name_lower = name.to_ascii_lowercase();
      &name_lower
    };
    if let Some(info) = property_info(name) {
      if info.is_shorthand() {
        let mut priorities = info.longhands.iter().map(|l| self.winner(l).map(|e| e.priority));
        let first = priorities.next().flatten();
        let Some(first) = first else {
          return String::new();
        };
        return if priorities.all(|p| p == Some(first)) {
          first.css_text()
        } else {
          String::new()
        };
      }
    }
    self
      .winner(name)
      .map(|e| e.priority.css_text())
      .unwrap_or_default()
  }

  /// Remove a property (all history entries). For a shorthand, removes all
  /// of its longhands. Returns the previously serialized value.
  pub fn remove_property(&mut self, name: &str) -> String {
    let previous = self.get_property_value(name);
    if let Some(info) = property_info(&name.to_ascii_lowercase()) {
      if info.is_shorthand() {
        self.entries.retain(|e| !info.longhands.contains(&e.name.as_str()));
        return previous;
      }
    }
    self.entries.retain(|e| e.name != name);
    previous
  }

  /// Replace the winning value object for a longhand directly.
  ///
  /// # Panics
  ///
  /// Panics when the longhand is owned by a shorthand container — that is
  /// an API contract violation, not a data error.
  pub fn set_css_value(&mut self, name: &str, value: Value) {
    let Some(index) = self.winner_index(name) else {
      self.push_entry(DeclEntry {
        name: name.to_string(),
        value,
        priority: Priority::NORMAL,
        origin: None,
      });
      return;
    };
    let entry = &mut self.entries[index];
    if let Some(shorthand) = &entry.origin {
      panic!("cannot set '{name}' directly: value is owned by shorthand '{shorthand}'");
    }
    entry.value = value;
  }

  /// Whether a property (by name) has any stored entry.
  pub fn contains(&self, name: &str) -> bool {
    self.entries.iter().any(|e| e.name == name)
  }

  /// All custom property names stored here.
  pub fn custom_property_names(&self) -> Vec<&str> {
    self
      .names_in_order()
      .into_iter()
      .filter(|n| n.starts_with("--"))
      .collect()
  }

  /// Iterate winning `(name, value, priority)` triples in declaration
  /// order.
  pub fn iter_winners(&self) -> impl Iterator<Item = (&str, &Value, Priority)> {
    self.names_in_order().into_iter().filter_map(move |name| {
      self.winner(name).map(|e| (name, &e.value, e.priority))
    })
  }

  /// The shorthand that produced the winning entry for `name`, when any.
  pub fn winner_origin(&self, name: &str) -> Option<&str> {
    self.winner(name).and_then(|e| e.origin.as_deref())
  }

  /// Merge another declaration's properties into this one, overwriting on
  /// name collision. Only `other`'s winning entries move over; merge-time
  /// errors are not surfaced for cleanly overwritten properties.
  pub fn add_style(&mut self, other: &StyleDeclaration) {
    for name in other.names_in_order() {
      let Some(entry) = other.winner(name) else {
        continue;
      };
      self.entries.retain(|e| e.name != name);
      self.push_entry(entry.clone());
    }
  }

  /// Try composing a shorthand from its longhands' winning entries.
  fn compose(&self, shorthand: &str) -> Option<String> {
    let info = property_info(shorthand)?;

    // A pending-substitution group (set via `margin: var(--m)`) composes
    // back to its original lexical text.
    if let Some(text) = self.compose_pending(shorthand) {
      return Some(text);
    }

    // All longhands must be present, non-lexical, and share one priority.
    let mut priority = None;
    for longhand in info.longhands {
      let entry = self.winner(longhand)?;
      if entry.value.is_lexical() {
        return None;
      }
      match priority {
        None => priority = Some(entry.priority),
        Some(p) if p == entry.priority => {}
        Some(_) => return None,
      }
    }

    compose_shorthand(shorthand, &|longhand: &str| {
      self.winner(longhand).map(|e| e.value.to_css_string())
    })
  }

  fn compose_pending(&self, shorthand: &str) -> Option<String> {
    let info = property_info(shorthand)?;
    let mut text: Option<(&LexicalValue, Priority)> = None;
    for longhand in info.longhands {
      let entry = self.winner(longhand)?;
      if entry.origin.as_deref() != Some(shorthand) {
        return None;
      }
      let Value::Lexical(lexical) = &entry.value else {
        return None;
      };
      match &text {
        None => text = Some((lexical, entry.priority)),
        Some((existing, priority)) if *existing == lexical && *priority == entry.priority => {}
        Some(_) => return None,
      }
    }
    text.map(|(lexical, _)| lexical.css_text())
  }

  /// Canonical serialization: `name: value;` pairs separated by spaces.
  /// Round-trip parseable (modulo whitespace and marker normalization).
  pub fn css_text(&self) -> String {
    self.serialize(false)
  }

  /// Compact serialization: `name:value` pairs joined with `;`.
  pub fn minified_css_text(&self) -> String {
    self.serialize(true)
  }

  fn serialize(&self, minified: bool) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut emitted: FxHashSet<&str> = FxHashSet::default();

    for name in self.names_in_order() {
      if emitted.contains(name) {
        continue;
      }
      let Some(entry) = self.winner(name) else {
        continue;
      };

      // Pending-substitution longhand groups re-serialize as their
      // shorthand, since the lexical text cannot be decomposed.
      if let Some(shorthand) = entry.origin.as_deref() {
        if entry.value.is_lexical() {
          if let Some(text) = self.compose_pending(shorthand) {
            let info = property_info(shorthand).expect("origin is a known shorthand");
            for longhand in info.longhands.iter().copied() {
              emitted.insert(longhand);
            }
            parts.push(render(shorthand, &text, entry.priority, minified));
            continue;
          }
        }
      }

      emitted.insert(name);
      parts.push(render(name, &entry.value.to_css_string(), entry.priority, minified));
    }

    if minified {
      parts.join(";")
    } else {
      parts.join(" ")
    }
  }
}

fn render(name: &str, value: &str, priority: Priority, minified: bool) -> String {
  if minified {
    let suffix = priority.suffix();
    let suffix = suffix.trim_start();
    format!("{name}:{value}{suffix}")
  } else {
    format!("{name}: {value}{};", priority.suffix())
  }
}

/// Declarations compare by their winning `(name, value, priority)` maps;
/// cascade history and shorthand origins are not observable.
impl PartialEq for StyleDeclaration {
  fn eq(&self, other: &Self) -> bool {
    let mut mine: Vec<(&str, &Value, Priority)> = self.iter_winners().collect();
    let mut theirs: Vec<(&str, &Value, Priority)> = other.iter_winners().collect();
    mine.sort_by_key(|(name, ..)| *name);
    theirs.sort_by_key(|(name, ..)| *name);
    mine.len() == theirs.len()
      && mine
        .iter()
        .zip(&theirs)
        .all(|(a, b)| a.0 == b.0 && a.1 == b.1 && a.2 == b.2)
  }
}

impl fmt::Display for StyleDeclaration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.css_text())
  }
}
