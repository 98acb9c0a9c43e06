//! Substitution of var(), attr() and env() references
//!
//! Token-based resolution over lexical component values, so that nested
//! functions, fallbacks containing commas, and repeated substitutions are
//! handled correctly. Resolution is recursive left-to-right; every
//! substitution failure maps to the guaranteed-invalid outcome for the
//! declaration that contained the reference.
//!
//! Cycle detection uses an explicit resolution stack passed down by the
//! caller, keyed by custom-property name (attributes use an `attr:` key).
//! The stack is scoped to one top-level resolution call and never shared
//! across sibling resolutions.

use crate::css::lexical::{is_custom_property_name, serialize, tokenize, CToken, LexicalValue};
use crate::style::properties::parse_color_term;
use crate::style::values::LengthUnit;
use rustc_hash::FxHashSet;

/// Why a substitution failed. Carries enough context for the resolver to
/// produce a property-keyed error.
#[derive(Debug, Clone, PartialEq)]
pub enum SubstitutionError {
  /// Direct or transitive self-reference with no usable fallback.
  Cycle(String),
  /// Unknown custom property (and no fallback, no registered initial).
  MissingVariable(String),
  /// The referenced custom property exists but is empty, and there is no
  /// fallback to use instead.
  EmptyVariable(String),
  /// attr() on an absent attribute with no fallback.
  MissingAttribute(String),
  /// attr() value failed to parse under the requested type.
  AttributeTypeMismatch { attribute: String, expected: String },
  /// env() name unknown to the device context, no fallback.
  MissingEnvironment(String),
  /// Structurally broken reference (e.g. `var(nonsense)`).
  Malformed(String),
}

/// Value sources consulted during substitution. The computed-value resolver
/// implements this over the element's cascade chain; tests implement it
/// over plain maps.
pub trait SubstitutionScope {
  /// Custom property lookup following the inheritance rules: the element's
  /// own cascade, then ancestors (per the registered `inherits` flag), then
  /// the registered initial value.
  fn custom_property(&self, name: &str) -> Option<LexicalValue>;

  /// Attribute lookup on the element being resolved.
  fn attribute(&self, name: &str) -> Option<String>;

  /// Environment value lookup from the device context.
  fn env_value(&self, name: &str) -> Option<String>;
}

/// Substitute all references in a lexical value. This is the top of one
/// resolution call: the cycle-detection stack is created fresh here.
pub fn substitute(value: &LexicalValue, scope: &dyn SubstitutionScope) -> Result<LexicalValue, SubstitutionError> {
  let mut stack = FxHashSet::default();
  substitute_tokens(value.tokens(), scope, &mut stack).map(LexicalValue::from_tokens)
}

/// Substitute references within a token slice, threading the resolution
/// stack through nested lookups.
pub fn substitute_tokens(
  tokens: &[CToken],
  scope: &dyn SubstitutionScope,
  stack: &mut FxHashSet<String>,
) -> Result<Vec<CToken>, SubstitutionError> {
  let mut out = Vec::with_capacity(tokens.len());
  for token in tokens {
    match token {
      CToken::Function(name, args) if name.eq_ignore_ascii_case("var") => {
        out.extend(substitute_var(args, scope, stack)?);
      }
      CToken::Function(name, args) if name.eq_ignore_ascii_case("attr") => {
        out.extend(substitute_attr(args, scope, stack)?);
      }
      CToken::Function(name, args) if name.eq_ignore_ascii_case("env") => {
        out.extend(substitute_env(args, scope, stack)?);
      }
      CToken::Function(name, args) => {
        out.push(CToken::Function(name.clone(), substitute_tokens(args, scope, stack)?));
      }
      CToken::Paren(children) => {
        out.push(CToken::Paren(substitute_tokens(children, scope, stack)?));
      }
      CToken::Bracket(children) => {
        out.push(CToken::Bracket(substitute_tokens(children, scope, stack)?));
      }
      CToken::Brace(children) => {
        out.push(CToken::Brace(substitute_tokens(children, scope, stack)?));
      }
      other => out.push(other.clone()),
    }
  }
  Ok(out)
}

/// Split function arguments at the first top-level comma. The fallback is
/// `Some` whenever a comma is present, even if nothing follows it —
/// `var(--x,)` has an empty fallback, which is a valid substitution.
fn split_fallback(args: &[CToken]) -> (Vec<CToken>, Option<Vec<CToken>>) {
  if let Some(position) = args.iter().position(|t| matches!(t, CToken::Comma)) {
    (args[..position].to_vec(), Some(args[position + 1..].to_vec()))
  } else {
    (args.to_vec(), None)
  }
}

fn substitute_var(
  args: &[CToken],
  scope: &dyn SubstitutionScope,
  stack: &mut FxHashSet<String>,
) -> Result<Vec<CToken>, SubstitutionError> {
  let (head, fallback) = split_fallback(args);
  let name = match head.iter().find(|t| !t.is_whitespace()) {
    Some(CToken::Ident(name)) if is_custom_property_name(name) => name.clone(),
    _ => return Err(SubstitutionError::Malformed(serialize(args))),
  };

  let use_fallback = |stack: &mut FxHashSet<String>, error: SubstitutionError| match &fallback {
    Some(tokens) => substitute_tokens(tokens, scope, stack),
    None => Err(error),
  };

  // A name already on the stack is a cycle; the fallback is consulted
  // before failing.
  if stack.contains(&name) {
    return use_fallback(stack, SubstitutionError::Cycle(name.clone()));
  }

  match scope.custom_property(&name) {
    Some(value) => {
      if value.is_empty() {
        // Empty-but-present is distinct from unset but still cannot
        // substitute without a fallback.
        return use_fallback(stack, SubstitutionError::EmptyVariable(name.clone()));
      }
      stack.insert(name.clone());
      let result = substitute_tokens(value.tokens(), scope, stack);
      stack.remove(&name);
      match result {
        Ok(tokens) => Ok(tokens),
        // A cycle below this reference can still be papered over by this
        // reference's own fallback.
        Err(SubstitutionError::Cycle(inner)) => use_fallback(stack, SubstitutionError::Cycle(inner)),
        Err(other) => Err(other),
      }
    }
    None => use_fallback(stack, SubstitutionError::MissingVariable(name.clone())),
  }
}

/// attr() type keywords plus bare unit suffixes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrType {
  RawString,
  StringType,
  Length,
  Percentage,
  Integer,
  Number,
  Ident,
  Color,
  Url,
  Unit(LengthUnit),
}

impl AttrType {
  fn parse(word: &str) -> Option<Self> {
    Some(match word.to_ascii_lowercase().as_str() {
      "string" => Self::StringType,
      "length" => Self::Length,
      "percentage" => Self::Percentage,
      "integer" => Self::Integer,
      "number" => Self::Number,
      "ident" | "custom-ident" => Self::Ident,
      "color" => Self::Color,
      "url" => Self::Url,
      unit => Self::Unit(LengthUnit::parse(unit)?),
    })
  }

  fn expected(&self) -> &'static str {
    match self {
      Self::RawString | Self::StringType => "<string>",
      Self::Length => "<length>",
      Self::Percentage => "<percentage>",
      Self::Integer => "<integer>",
      Self::Number => "<number>",
      Self::Ident => "<custom-ident>",
      Self::Color => "<color>",
      Self::Url => "<url>",
      Self::Unit(_) => "<number with unit suffix>",
    }
  }
}

fn substitute_attr(
  args: &[CToken],
  scope: &dyn SubstitutionScope,
  stack: &mut FxHashSet<String>,
) -> Result<Vec<CToken>, SubstitutionError> {
  let (head, fallback) = split_fallback(args);
  let head_terms: Vec<&CToken> = head.iter().filter(|t| !t.is_whitespace()).collect();

  let (name, attr_type) = match head_terms.as_slice() {
    [CToken::Ident(name)] => (name.clone(), AttrType::RawString),
    [CToken::Ident(name), CToken::Ident(type_word)] => match AttrType::parse(type_word) {
      Some(attr_type) => (name.clone(), attr_type),
      None => return Err(SubstitutionError::Malformed(serialize(args))),
    },
    _ => return Err(SubstitutionError::Malformed(serialize(args))),
  };

  let use_fallback = |stack: &mut FxHashSet<String>, error: SubstitutionError| match &fallback {
    Some(tokens) => substitute_tokens(tokens, scope, stack),
    None => Err(error),
  };

  let stack_key = format!("attr:{name}");
  if stack.contains(&stack_key) {
    return use_fallback(stack, SubstitutionError::Cycle(stack_key.clone()));
  }

  let Some(raw) = scope.attribute(&name) else {
    return use_fallback(stack, SubstitutionError::MissingAttribute(name.clone()));
  };

  // Attribute values may themselves contain references, including
  // self-referential ones; they share the same resolution stack.
  stack.insert(stack_key.clone());
  let substituted = substitute_tokens(&tokenize(&raw), scope, stack);
  stack.remove(&stack_key);
  let tokens = match substituted {
    Ok(tokens) => tokens,
    Err(SubstitutionError::Cycle(inner)) => return use_fallback(stack, SubstitutionError::Cycle(inner)),
    Err(other) => return Err(other),
  };

  match convert_attr_tokens(&name, &attr_type, tokens, &raw) {
    Ok(converted) => Ok(converted),
    Err(error) => use_fallback(stack, error),
  }
}

/// Validate and convert a substituted attribute value under the requested
/// type.
fn convert_attr_tokens(
  attribute: &str,
  attr_type: &AttrType,
  tokens: Vec<CToken>,
  raw: &str,
) -> Result<Vec<CToken>, SubstitutionError> {
  let mismatch = || SubstitutionError::AttributeTypeMismatch {
    attribute: attribute.to_string(),
    expected: attr_type.expected().to_string(),
  };
  let terms: Vec<&CToken> = tokens.iter().filter(|t| !t.is_whitespace()).collect();

  match attr_type {
    AttrType::RawString | AttrType::StringType => Ok(vec![CToken::QuotedString(serialize(&tokens))]),
    AttrType::Length => match terms.as_slice() {
      [CToken::Dimension { unit, .. }] if LengthUnit::parse(unit).is_some() => {
        Ok(vec![terms[0].clone()])
      }
      [CToken::Number { value, .. }] if *value == 0.0 => Ok(vec![terms[0].clone()]),
      _ => Err(mismatch()),
    },
    AttrType::Percentage => match terms.as_slice() {
      [CToken::Percentage(_)] => Ok(vec![terms[0].clone()]),
      _ => Err(mismatch()),
    },
    AttrType::Integer => match terms.as_slice() {
      [CToken::Number {
        int_value: Some(_), ..
      }] => Ok(vec![terms[0].clone()]),
      _ => Err(mismatch()),
    },
    AttrType::Number => match terms.as_slice() {
      [CToken::Number { .. }] => Ok(vec![terms[0].clone()]),
      _ => Err(mismatch()),
    },
    AttrType::Ident => match terms.as_slice() {
      [CToken::Ident(_)] => Ok(vec![terms[0].clone()]),
      _ => Err(mismatch()),
    },
    AttrType::Color => match terms.as_slice() {
      [term] if parse_color_term(term).is_ok() => Ok(vec![(*term).clone()]),
      _ => Err(mismatch()),
    },
    AttrType::Url => Ok(vec![CToken::Url(raw.trim().to_string())]),
    AttrType::Unit(unit) => match terms.as_slice() {
      [CToken::Number { value, int_value, .. }] => Ok(vec![CToken::Dimension {
        value: *value,
        int_value: *int_value,
        unit: unit.as_str().to_string(),
      }]),
      _ => Err(mismatch()),
    },
  }
}

fn substitute_env(
  args: &[CToken],
  scope: &dyn SubstitutionScope,
  stack: &mut FxHashSet<String>,
) -> Result<Vec<CToken>, SubstitutionError> {
  let (head, fallback) = split_fallback(args);
  let name = match head.iter().find(|t| !t.is_whitespace()) {
    Some(CToken::Ident(name)) => name.clone(),
    _ => return Err(SubstitutionError::Malformed(serialize(args))),
  };

  match scope.env_value(&name) {
    Some(text) => Ok(tokenize(&text)),
    None => match &fallback {
      Some(tokens) => substitute_tokens(tokens, scope, stack),
      None => Err(SubstitutionError::MissingEnvironment(name)),
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rustc_hash::FxHashMap;

  #[derive(Default)]
  struct MapScope {
    vars: FxHashMap<String, LexicalValue>,
    attrs: FxHashMap<String, String>,
    env: FxHashMap<String, String>,
  }

  impl MapScope {
    fn with_vars(pairs: &[(&str, &str)]) -> Self {
      let mut scope = Self::default();
      for (name, value) in pairs {
        scope.vars.insert(name.to_string(), LexicalValue::parse(value));
      }
      scope
    }

    fn with_attr(mut self, name: &str, value: &str) -> Self {
      self.attrs.insert(name.to_string(), value.to_string());
      self
    }

    fn with_env(mut self, name: &str, value: &str) -> Self {
      self.env.insert(name.to_string(), value.to_string());
      self
    }
  }

  impl SubstitutionScope for MapScope {
    fn custom_property(&self, name: &str) -> Option<LexicalValue> {
      self.vars.get(name).cloned()
    }

    fn attribute(&self, name: &str) -> Option<String> {
      self.attrs.get(name).cloned()
    }

    fn env_value(&self, name: &str) -> Option<String> {
      self.env.get(name).cloned()
    }
  }

  fn resolve(scope: &MapScope, text: &str) -> Result<String, SubstitutionError> {
    substitute(&LexicalValue::parse(text), scope).map(|v| v.css_text())
  }

  #[test]
  fn simple_var_resolution() {
    let scope = MapScope::with_vars(&[("--color", "#ff0000")]);
    assert_eq!(resolve(&scope, "var(--color)"), Ok("#ff0000".to_string()));
  }

  #[test]
  fn fallback_unused_when_variable_resolves() {
    let scope = MapScope::with_vars(&[("--foo", "8pt")]);
    assert_eq!(resolve(&scope, "var(--foo, 1vb)"), Ok("8pt".to_string()));
  }

  #[test]
  fn fallback_used_when_variable_missing() {
    let scope = MapScope::default();
    assert_eq!(resolve(&scope, "var(--missing, red)"), Ok("red".to_string()));
  }

  #[test]
  fn missing_variable_without_fallback_fails() {
    let scope = MapScope::default();
    assert_eq!(
      resolve(&scope, "var(--missing)"),
      Err(SubstitutionError::MissingVariable("--missing".to_string()))
    );
  }

  #[test]
  fn chained_variables_resolve_through() {
    let scope = MapScope::with_vars(&[("--primary", "var(--base)"), ("--base", "#0000ff")]);
    assert_eq!(resolve(&scope, "var(--primary)"), Ok("#0000ff".to_string()));
  }

  #[test]
  fn nested_var_in_fallback() {
    let scope = MapScope::with_vars(&[("--fallback-color", "green")]);
    assert_eq!(
      resolve(&scope, "var(--color, var(--fallback-color))"),
      Ok("green".to_string())
    );
  }

  #[test]
  fn empty_fallback_substitutes_to_nothing() {
    let scope = MapScope::default();
    let result = substitute(&LexicalValue::parse("var(--tw-x,)translate(1px)"), &scope)
      .expect("empty fallback is valid");
    assert_eq!(result.css_text(), "translate(1px)");
  }

  #[test]
  fn empty_variable_without_fallback_is_invalid() {
    let scope = MapScope::with_vars(&[("--empty", "")]);
    assert_eq!(
      resolve(&scope, "var(--empty)"),
      Err(SubstitutionError::EmptyVariable("--empty".to_string()))
    );
    // With a fallback, the fallback applies.
    assert_eq!(resolve(&scope, "var(--empty, 1px)"), Ok("1px".to_string()));
  }

  #[test]
  fn substitution_inside_calc_and_lists() {
    let scope = MapScope::with_vars(&[("--size", "10px"), ("--blur", "2px")]);
    assert_eq!(
      resolve(&scope, "calc(var(--size) + 5px)"),
      Ok("calc(10px + 5px)".to_string())
    );
    assert_eq!(
      resolve(&scope, "0 0 var(--blur) black"),
      Ok("0 0 2px black".to_string())
    );
  }

  #[test]
  fn direct_cycle_fails() {
    let scope = MapScope::with_vars(&[("--a", "var(--a)")]);
    assert!(matches!(
      resolve(&scope, "var(--a)"),
      Err(SubstitutionError::Cycle(_))
    ));
  }

  #[test]
  fn transitive_cycle_fails() {
    let scope = MapScope::with_vars(&[("--a", "var(--b)"), ("--b", "var(--c)"), ("--c", "var(--a)")]);
    assert!(matches!(
      resolve(&scope, "var(--a)"),
      Err(SubstitutionError::Cycle(_))
    ));
  }

  #[test]
  fn cycle_with_fallback_uses_fallback() {
    let scope = MapScope::with_vars(&[("--a", "var(--b)"), ("--b", "var(--a)")]);
    assert_eq!(resolve(&scope, "var(--a, 4px)"), Ok("4px".to_string()));
  }

  #[test]
  fn diamond_references_are_not_cycles() {
    // --d is referenced twice through different paths; that is sharing,
    // not circularity.
    let scope = MapScope::with_vars(&[
      ("--left", "var(--d)"),
      ("--right", "var(--d)"),
      ("--d", "7px"),
    ]);
    assert_eq!(
      resolve(&scope, "var(--left) var(--right)"),
      Ok("7px 7px".to_string())
    );
  }

  #[test]
  fn malformed_var_fails() {
    let scope = MapScope::default();
    assert!(matches!(
      resolve(&scope, "var(nonsense)"),
      Err(SubstitutionError::Malformed(_))
    ));
  }

  #[test]
  fn attr_untyped_becomes_string() {
    let scope = MapScope::default().with_attr("data-label", "hello world");
    assert_eq!(resolve(&scope, "attr(data-label)"), Ok("\"hello world\"".to_string()));
  }

  #[test]
  fn attr_typed_length() {
    let scope = MapScope::default().with_attr("data-width", "12px");
    assert_eq!(resolve(&scope, "attr(data-width length)"), Ok("12px".to_string()));
  }

  #[test]
  fn attr_unit_suffix_builds_dimension() {
    let scope = MapScope::default().with_attr("data-size", "42");
    assert_eq!(resolve(&scope, "attr(data-size px)"), Ok("42px".to_string()));
  }

  #[test]
  fn attr_type_mismatch_uses_fallback_or_fails() {
    let scope = MapScope::default().with_attr("data-width", "banana");
    assert_eq!(
      resolve(&scope, "attr(data-width length, 5px)"),
      Ok("5px".to_string())
    );
    assert!(matches!(
      resolve(&scope, "attr(data-width length)"),
      Err(SubstitutionError::AttributeTypeMismatch { .. })
    ));
  }

  #[test]
  fn attr_missing_uses_fallback_or_fails() {
    let scope = MapScope::default();
    assert_eq!(resolve(&scope, "attr(data-x, 1px)"), Ok("1px".to_string()));
    assert_eq!(
      resolve(&scope, "attr(data-x)"),
      Err(SubstitutionError::MissingAttribute("data-x".to_string()))
    );
  }

  #[test]
  fn attr_values_may_reference_vars() {
    let scope = MapScope::with_vars(&[("--w", "30px")]).with_attr("data-width", "var(--w)");
    assert_eq!(resolve(&scope, "attr(data-width length)"), Ok("30px".to_string()));
  }

  #[test]
  fn self_referential_attr_is_a_cycle() {
    let scope = MapScope::default().with_attr("data-w", "attr(data-w)");
    assert!(matches!(
      resolve(&scope, "attr(data-w length)"),
      Err(SubstitutionError::Cycle(_))
    ));
    // And with a fallback, the fallback applies.
    assert_eq!(resolve(&scope, "attr(data-w length, 9px)"), Ok("9px".to_string()));
  }

  #[test]
  fn env_resolution_and_fallback() {
    let scope = MapScope::default().with_env("safe-area-inset-top", "24px");
    assert_eq!(resolve(&scope, "env(safe-area-inset-top)"), Ok("24px".to_string()));
    assert_eq!(resolve(&scope, "env(unknown-thing, 3px)"), Ok("3px".to_string()));
    assert_eq!(
      resolve(&scope, "env(unknown-thing)"),
      Err(SubstitutionError::MissingEnvironment("unknown-thing".to_string()))
    );
  }

  #[test]
  fn substitution_is_idempotent_without_cycles() {
    let scope = MapScope::with_vars(&[("--m", "10px 20px")]);
    let first = resolve(&scope, "var(--m)").expect("resolves");
    let second = substitute(&LexicalValue::parse(&first), &scope)
      .expect("stable")
      .css_text();
    assert_eq!(first, second);
  }
}
