//! Selector data model and parser
//!
//! Selectors are parsed from `cssparser` token streams into an immutable
//! tagged-union AST. Matching lives in [`crate::style::matcher`];
//! specificity in [`crate::style::specificity`]. Selector conditions are
//! enum variants with exhaustive matching throughout — there is no
//! class-hierarchy dispatch and no downcasting.
//!
//! Namespaces are resolved against a [`NamespaceMap`] at parse time. A
//! prefix that was never declared makes the selector fail-closed: it parses
//! but can never match.

use crate::css::lexical::{tokenize, CToken};
use rustc_hash::FxHashMap;
use std::fmt;
use std::fmt::Write as _;

/// Declared namespace prefixes for selector resolution.
#[derive(Debug, Clone, Default)]
pub struct NamespaceMap {
  /// Default namespace (`@namespace url(...)`) applied to unprefixed type
  /// selectors.
  pub default: Option<String>,
  prefixes: FxHashMap<String, String>,
}

impl NamespaceMap {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn declare(&mut self, prefix: &str, url: &str) {
    self.prefixes.insert(prefix.to_string(), url.to_string());
  }

  pub fn set_default(&mut self, url: &str) {
    self.default = Some(url.to_string());
  }

  pub fn lookup(&self, prefix: &str) -> Option<&str> {
    self.prefixes.get(prefix).map(String::as_str)
  }
}

/// Resolved namespace constraint on a type or attribute selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceConstraint {
  /// `*|name` — any namespace, including none
  Any,
  /// `|name` — no namespace
  None,
  /// `ns|name` with a declared prefix, or an unprefixed type selector under
  /// a default namespace
  Url(String),
  /// Prefix was never declared; the selector never matches.
  Undeclared(String),
}

/// Combinators between compound selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
  /// Whitespace
  Descendant,
  /// `>`
  Child,
  /// `+`
  NextSibling,
  /// `~`
  SubsequentSibling,
}

impl Combinator {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Descendant => " ",
      Self::Child => " > ",
      Self::NextSibling => " + ",
      Self::SubsequentSibling => " ~ ",
    }
  }
}

/// `An+B` argument, optionally restricted by an `of S` selector list.
#[derive(Debug, Clone, PartialEq)]
pub struct Nth {
  pub a: i32,
  pub b: i32,
  pub of: Option<SelectorList>,
}

impl Nth {
  /// Whether a 1-based sibling index satisfies `An+B` for some n >= 0.
  pub fn matches_index(&self, index: i32) -> bool {
    if self.a == 0 {
      index == self.b
    } else {
      let delta = index - self.b;
      delta % self.a == 0 && delta / self.a >= 0
    }
  }
}

/// Attribute comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
  /// `[attr]`
  Exists,
  /// `[attr=v]`
  Equals,
  /// `[attr~=v]` whitespace-token match
  Includes,
  /// `[attr|=v]` exact or hyphen-prefix match
  DashMatch,
  /// `[attr^=v]`
  Prefix,
  /// `[attr$=v]`
  Suffix,
  /// `[attr*=v]`
  Substring,
}

/// Attribute selector with optional case-insensitivity override.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrSelector {
  pub namespace: NamespaceConstraint,
  pub name: String,
  pub op: AttrOp,
  pub value: String,
  /// The trailing `i` flag, overriding the document's case handling.
  pub case_insensitive: bool,
}

/// Non-functional and functional pseudo-classes.
#[derive(Debug, Clone, PartialEq)]
pub enum PseudoClass {
  Root,
  Empty,
  Blank,
  FirstChild,
  LastChild,
  OnlyChild,
  FirstOfType,
  LastOfType,
  OnlyOfType,
  NthChild(Nth),
  NthLastChild(Nth),
  NthOfType(Nth),
  NthLastOfType(Nth),
  Not(SelectorList),
  Is(SelectorList),
  Where(SelectorList),
  Has(SelectorList),
  /// BCP-47 language ranges (comma-separated alternatives).
  Lang(Vec<String>),
  AnyLink,
  Link,
  Visited,
  Target,
  Checked,
  Indeterminate,
  Default,
  Enabled,
  Disabled,
  ReadOnly,
  ReadWrite,
  PlaceholderShown,
  /// Externally supplied dynamic state (`:hover`, `:focus`, ...).
  Dynamic(String),
}

/// Pseudo-elements the matcher can be contexted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoElement {
  Before,
  After,
  FirstLine,
  FirstLetter,
  Marker,
  Placeholder,
  Selection,
}

impl PseudoElement {
  pub fn parse(name: &str) -> Option<Self> {
    Some(match name.to_ascii_lowercase().as_str() {
      "before" => Self::Before,
      "after" => Self::After,
      "first-line" => Self::FirstLine,
      "first-letter" => Self::FirstLetter,
      "marker" => Self::Marker,
      "placeholder" => Self::Placeholder,
      "selection" => Self::Selection,
      _ => return None,
    })
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Before => "before",
      Self::After => "after",
      Self::FirstLine => "first-line",
      Self::FirstLetter => "first-letter",
      Self::Marker => "marker",
      Self::Placeholder => "placeholder",
      Self::Selection => "selection",
    }
  }
}

/// One simple selector within a compound.
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleSelector {
  Id(String),
  Class(String),
  Attribute(AttrSelector),
  PseudoClass(PseudoClass),
}

/// Type selector: optional namespace + tag name or universal.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSelector {
  pub namespace: NamespaceConstraint,
  /// `None` is the universal selector `*`.
  pub name: Option<String>,
}

/// A compound selector: everything between two combinators.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundSelector {
  pub type_selector: Option<TypeSelector>,
  pub simples: Vec<SimpleSelector>,
  pub pseudo_element: Option<PseudoElement>,
}

impl CompoundSelector {
  fn is_empty(&self) -> bool {
    self.type_selector.is_none() && self.simples.is_empty() && self.pseudo_element.is_none()
  }
}

/// A complex selector: compounds joined by combinators.
///
/// `compounds.len() == combinators.len() + 1`. `leading` is only present in
/// relative selectors (`:has()` arguments) and defaults to descendant.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
  pub leading: Option<Combinator>,
  pub compounds: Vec<CompoundSelector>,
  pub combinators: Vec<Combinator>,
}

impl ComplexSelector {
  /// The rightmost compound (the subject).
  pub fn subject(&self) -> &CompoundSelector {
    self.compounds.last().expect("complex selector has at least one compound")
  }

  pub fn pseudo_element(&self) -> Option<PseudoElement> {
    self.subject().pseudo_element
  }
}

/// An ordered list of complex selectors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectorList {
  pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
  pub fn len(&self) -> usize {
    self.selectors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.selectors.is_empty()
  }

  /// Parse a selector list from text with no declared namespaces.
  pub fn parse(text: &str) -> Result<Self, String> {
    Self::parse_with_namespaces(text, &NamespaceMap::default())
  }

  pub fn parse_with_namespaces(text: &str, namespaces: &NamespaceMap) -> Result<Self, String> {
    let tokens = tokenize(text);
    parse_selector_list(&tokens, namespaces, false)
  }
}

// ============================================================================
// Parsing
// ============================================================================

struct Cursor<'a> {
  tokens: &'a [CToken],
  pos: usize,
}

impl<'a> Cursor<'a> {
  fn new(tokens: &'a [CToken]) -> Self {
    Self { tokens, pos: 0 }
  }

  fn peek(&self) -> Option<&'a CToken> {
    self.tokens.get(self.pos)
  }

  fn bump(&mut self) -> Option<&'a CToken> {
    let token = self.tokens.get(self.pos);
    if token.is_some() {
      self.pos += 1;
    }
    token
  }

  fn skip_ws(&mut self) -> bool {
    let mut skipped = false;
    while matches!(self.peek(), Some(CToken::Whitespace)) {
      self.pos += 1;
      skipped = true;
    }
    skipped
  }

  fn at_end(&self) -> bool {
    self.tokens[self.pos..].iter().all(CToken::is_whitespace)
  }
}

/// Parse a full selector list. `relative` permits a leading combinator
/// (`:has(> img)`); absent one, relative selectors default to descendant.
pub fn parse_selector_list(
  tokens: &[CToken],
  namespaces: &NamespaceMap,
  relative: bool,
) -> Result<SelectorList, String> {
  let mut cursor = Cursor::new(tokens);
  let mut selectors = Vec::new();
  loop {
    let complex = parse_complex(&mut cursor, namespaces, relative)?;
    selectors.push(complex);
    cursor.skip_ws();
    match cursor.peek() {
      None => break,
      Some(CToken::Comma) => {
        cursor.bump();
      }
      Some(other) => return Err(format!("unexpected token {other:?} after selector")),
    }
  }
  Ok(SelectorList { selectors })
}

fn parse_combinator_token(token: &CToken) -> Option<Combinator> {
  match token {
    CToken::Delim('>') => Some(Combinator::Child),
    CToken::Delim('+') => Some(Combinator::NextSibling),
    CToken::Delim('~') => Some(Combinator::SubsequentSibling),
    _ => None,
  }
}

fn parse_complex(
  cursor: &mut Cursor,
  namespaces: &NamespaceMap,
  relative: bool,
) -> Result<ComplexSelector, String> {
  cursor.skip_ws();

  let mut leading = None;
  if relative {
    if let Some(comb) = cursor.peek().and_then(parse_combinator_token) {
      leading = Some(comb);
      cursor.bump();
      cursor.skip_ws();
    } else {
      leading = Some(Combinator::Descendant);
    }
  }

  let mut compounds = vec![parse_compound(cursor, namespaces)?];
  let mut combinators = Vec::new();

  loop {
    let had_ws = cursor.skip_ws();
    let explicit = cursor.peek().and_then(parse_combinator_token);
    let combinator = match explicit {
      Some(comb) => {
        cursor.bump();
        cursor.skip_ws();
        comb
      }
      None => {
        // Descendant combinator only exists when whitespace separates two
        // compounds; otherwise the complex selector is done.
        let next_starts_compound = matches!(
          cursor.peek(),
          Some(
            CToken::Ident(_)
              | CToken::IdHash(_)
              | CToken::Hash(_)
              | CToken::Colon
              | CToken::Bracket(_)
              | CToken::Function(..)
              | CToken::Delim('.' | '*' | '|')
          )
        );
        if !had_ws || !next_starts_compound {
          break;
        }
        Combinator::Descendant
      }
    };
    compounds.push(parse_compound(cursor, namespaces)?);
    combinators.push(combinator);
  }

  // Pseudo-elements may only appear on the subject compound.
  for compound in &compounds[..compounds.len() - 1] {
    if compound.pseudo_element.is_some() {
      return Err("pseudo-element before a combinator".to_string());
    }
  }

  Ok(ComplexSelector {
    leading,
    compounds,
    combinators,
  })
}

fn parse_compound(cursor: &mut Cursor, namespaces: &NamespaceMap) -> Result<CompoundSelector, String> {
  let mut compound = CompoundSelector::default();

  // Optional leading type selector (with optional namespace prefix).
  if let Some(type_selector) = try_parse_type_selector(cursor, namespaces)? {
    compound.type_selector = Some(type_selector);
  }

  loop {
    if compound.pseudo_element.is_some() {
      // Nothing may follow a pseudo-element within the compound.
      match cursor.peek() {
        None | Some(CToken::Whitespace | CToken::Comma) => break,
        Some(other) => return Err(format!("unexpected {other:?} after pseudo-element")),
      }
    }
    match cursor.peek() {
      Some(CToken::IdHash(id)) => {
        compound.simples.push(SimpleSelector::Id(id.clone()));
        cursor.bump();
      }
      Some(CToken::Hash(value)) => {
        return Err(format!("'#{value}' is not a valid id selector"));
      }
      Some(CToken::Delim('.')) => {
        cursor.bump();
        match cursor.bump() {
          Some(CToken::Ident(name)) => compound.simples.push(SimpleSelector::Class(name.clone())),
          other => return Err(format!("expected class name, found {other:?}")),
        }
      }
      Some(CToken::Bracket(inner)) => {
        compound
          .simples
          .push(SimpleSelector::Attribute(parse_attribute(inner, namespaces)?));
        cursor.bump();
      }
      Some(CToken::Colon) => {
        cursor.bump();
        let double = matches!(cursor.peek(), Some(CToken::Colon));
        if double {
          cursor.bump();
        }
        match cursor.bump() {
          Some(CToken::Ident(name)) => {
            if double {
              compound.pseudo_element =
                Some(PseudoElement::parse(name).ok_or_else(|| format!("unknown pseudo-element ::{name}"))?);
            } else if let Some(pseudo) = legacy_pseudo_element(name) {
              compound.pseudo_element = Some(pseudo);
            } else {
              compound
                .simples
                .push(SimpleSelector::PseudoClass(parse_pseudo_class(name)?));
            }
          }
          Some(CToken::Function(name, args)) => {
            if double {
              return Err(format!("unknown pseudo-element ::{name}()"));
            }
            compound
              .simples
              .push(SimpleSelector::PseudoClass(parse_functional_pseudo_class(
                name, args, namespaces,
              )?));
          }
          other => return Err(format!("expected pseudo-class name, found {other:?}")),
        }
      }
      _ => break,
    }
  }

  if compound.is_empty() {
    return Err("expected selector".to_string());
  }
  Ok(compound)
}

/// Try to parse `ns|name`, `|name`, `*|name`, `name`, `*`, `ns|*`, ...
fn try_parse_type_selector(
  cursor: &mut Cursor,
  namespaces: &NamespaceMap,
) -> Result<Option<TypeSelector>, String> {
  // Lookahead classification of the first one/two tokens.
  let first = cursor.peek();
  let (prefix, consumed_prefix): (Option<String>, usize) = match first {
    Some(CToken::Ident(name)) if matches!(cursor.tokens.get(cursor.pos + 1), Some(CToken::Delim('|')))
      && !matches!(cursor.tokens.get(cursor.pos + 2), Some(CToken::Delim('='))) =>
    {
      (Some(name.clone()), 2)
    }
    Some(CToken::Delim('*')) if matches!(cursor.tokens.get(cursor.pos + 1), Some(CToken::Delim('|')))
      && !matches!(cursor.tokens.get(cursor.pos + 2), Some(CToken::Delim('='))) =>
    {
      (Some("*".to_string()), 2)
    }
    Some(CToken::Delim('|')) => (Some(String::new()), 1),
    _ => (None, 0),
  };

  let namespace = match prefix.as_deref() {
    None => match &namespaces.default {
      Some(url) => NamespaceConstraint::Url(url.clone()),
      None => NamespaceConstraint::Any,
    },
    Some("") => NamespaceConstraint::None,
    Some("*") => NamespaceConstraint::Any,
    Some(p) => match namespaces.lookup(p) {
      Some(url) => NamespaceConstraint::Url(url.to_string()),
      None => NamespaceConstraint::Undeclared(p.to_string()),
    },
  };
  cursor.pos += consumed_prefix;

  match cursor.peek() {
    Some(CToken::Ident(name)) => {
      let name = name.clone();
      cursor.bump();
      Ok(Some(TypeSelector {
        namespace,
        name: Some(name),
      }))
    }
    Some(CToken::Delim('*')) => {
      cursor.bump();
      Ok(Some(TypeSelector { namespace, name: None }))
    }
    _ if consumed_prefix > 0 => Err("expected element name after namespace prefix".to_string()),
    _ => Ok(None),
  }
}

fn parse_attribute(tokens: &[CToken], namespaces: &NamespaceMap) -> Result<AttrSelector, String> {
  let mut cursor = Cursor::new(tokens);
  cursor.skip_ws();

  // Optional namespace prefix on the attribute name. Unprefixed attribute
  // selectors are in no namespace, regardless of the default namespace.
  let (namespace, name) = {
    let prefix_ahead = matches!(
      (cursor.peek(), cursor.tokens.get(cursor.pos + 1)),
      (Some(CToken::Ident(_) | CToken::Delim('*')), Some(CToken::Delim('|')))
    ) && !matches!(cursor.tokens.get(cursor.pos + 2), Some(CToken::Delim('=')));
    if prefix_ahead {
      let prefix = match cursor.bump() {
        Some(CToken::Ident(p)) => Some(p.clone()),
        Some(CToken::Delim('*')) => None,
        _ => unreachable!(),
      };
      cursor.bump(); // '|'
      let namespace = match prefix {
        None => NamespaceConstraint::Any,
        Some(p) => match namespaces.lookup(&p) {
          Some(url) => NamespaceConstraint::Url(url.to_string()),
          None => NamespaceConstraint::Undeclared(p),
        },
      };
      match cursor.bump() {
        Some(CToken::Ident(name)) => (namespace, name.clone()),
        other => return Err(format!("expected attribute name, found {other:?}")),
      }
    } else {
      match cursor.bump() {
        Some(CToken::Ident(name)) => (NamespaceConstraint::None, name.clone()),
        other => return Err(format!("expected attribute name, found {other:?}")),
      }
    }
  };

  cursor.skip_ws();
  let op = match cursor.peek() {
    None => {
      return Ok(AttrSelector {
        namespace,
        name,
        op: AttrOp::Exists,
        value: String::new(),
        case_insensitive: false,
      });
    }
    Some(CToken::Delim('=')) => AttrOp::Equals,
    Some(CToken::IncludeMatch) => AttrOp::Includes,
    Some(CToken::DashMatch) => AttrOp::DashMatch,
    Some(CToken::PrefixMatch) => AttrOp::Prefix,
    Some(CToken::SuffixMatch) => AttrOp::Suffix,
    Some(CToken::SubstringMatch) => AttrOp::Substring,
    Some(other) => return Err(format!("unexpected {other:?} in attribute selector")),
  };
  cursor.bump();
  cursor.skip_ws();

  let value = match cursor.bump() {
    Some(CToken::Ident(v)) => v.clone(),
    Some(CToken::QuotedString(v)) => v.clone(),
    other => return Err(format!("expected attribute value, found {other:?}")),
  };

  cursor.skip_ws();
  let case_insensitive = match cursor.bump() {
    None => false,
    Some(CToken::Ident(flag)) if flag.eq_ignore_ascii_case("i") => true,
    // `s` forces case sensitivity, which is already the default here.
    Some(CToken::Ident(flag)) if flag.eq_ignore_ascii_case("s") => false,
    Some(other) => return Err(format!("unexpected {other:?} after attribute value")),
  };
  if !cursor.at_end() {
    return Err("trailing tokens in attribute selector".to_string());
  }

  Ok(AttrSelector {
    namespace,
    name,
    op,
    value,
    case_insensitive,
  })
}

fn legacy_pseudo_element(name: &str) -> Option<PseudoElement> {
  match name.to_ascii_lowercase().as_str() {
    "before" => Some(PseudoElement::Before),
    "after" => Some(PseudoElement::After),
    "first-line" => Some(PseudoElement::FirstLine),
    "first-letter" => Some(PseudoElement::FirstLetter),
    _ => None,
  }
}

fn parse_pseudo_class(name: &str) -> Result<PseudoClass, String> {
  Ok(match name.to_ascii_lowercase().as_str() {
    "root" => PseudoClass::Root,
    "empty" => PseudoClass::Empty,
    "blank" => PseudoClass::Blank,
    "first-child" => PseudoClass::FirstChild,
    "last-child" => PseudoClass::LastChild,
    "only-child" => PseudoClass::OnlyChild,
    "first-of-type" => PseudoClass::FirstOfType,
    "last-of-type" => PseudoClass::LastOfType,
    "only-of-type" => PseudoClass::OnlyOfType,
    "any-link" => PseudoClass::AnyLink,
    "link" => PseudoClass::Link,
    "visited" => PseudoClass::Visited,
    "target" => PseudoClass::Target,
    "checked" => PseudoClass::Checked,
    "indeterminate" => PseudoClass::Indeterminate,
    "default" => PseudoClass::Default,
    "enabled" => PseudoClass::Enabled,
    "disabled" => PseudoClass::Disabled,
    "read-only" => PseudoClass::ReadOnly,
    "read-write" => PseudoClass::ReadWrite,
    "placeholder-shown" => PseudoClass::PlaceholderShown,
    "hover" | "active" | "focus" | "focus-within" | "focus-visible" => {
      PseudoClass::Dynamic(name.to_ascii_lowercase())
    }
    other => return Err(format!("unknown pseudo-class :{other}")),
  })
}

fn parse_functional_pseudo_class(
  name: &str,
  args: &[CToken],
  namespaces: &NamespaceMap,
) -> Result<PseudoClass, String> {
  match name.to_ascii_lowercase().as_str() {
    "not" => Ok(PseudoClass::Not(parse_selector_list(args, namespaces, false)?)),
    "is" => Ok(PseudoClass::Is(parse_selector_list(args, namespaces, false)?)),
    "where" => Ok(PseudoClass::Where(parse_selector_list(args, namespaces, false)?)),
    "has" => Ok(PseudoClass::Has(parse_selector_list(args, namespaces, true)?)),
    "lang" => parse_lang_arguments(args),
    "nth-child" => Ok(PseudoClass::NthChild(parse_nth(args, namespaces, true)?)),
    "nth-last-child" => Ok(PseudoClass::NthLastChild(parse_nth(args, namespaces, true)?)),
    "nth-of-type" => Ok(PseudoClass::NthOfType(parse_nth(args, namespaces, false)?)),
    "nth-last-of-type" => Ok(PseudoClass::NthLastOfType(parse_nth(args, namespaces, false)?)),
    other => Err(format!("unknown functional pseudo-class :{other}()")),
  }
}

fn parse_lang_arguments(args: &[CToken]) -> Result<PseudoClass, String> {
  let mut ranges = Vec::new();
  let mut expect_value = true;
  for token in args.iter().filter(|t| !t.is_whitespace()) {
    match token {
      CToken::Ident(range) | CToken::QuotedString(range) if expect_value => {
        ranges.push(range.clone());
        expect_value = false;
      }
      // `*-Latn` tokenizes as Delim('*') Ident("-Latn"); rejoin it.
      CToken::Delim('*') if expect_value => {
        ranges.push("*".to_string());
        expect_value = false;
      }
      CToken::Ident(rest) if !expect_value && rest.starts_with('-') && ranges.last().is_some_and(|r| r == "*") => {
        let last = ranges.last_mut().expect("checked non-empty");
        last.push_str(rest);
      }
      CToken::Comma if !expect_value => expect_value = true,
      other => return Err(format!("unexpected {other:?} in :lang()")),
    }
  }
  if ranges.is_empty() || expect_value {
    return Err(":lang() requires at least one language range".to_string());
  }
  Ok(PseudoClass::Lang(ranges))
}

/// Parse `An+B` with the optional `of S` clause.
fn parse_nth(args: &[CToken], namespaces: &NamespaceMap, allow_of: bool) -> Result<Nth, String> {
  let mut cursor = Cursor::new(args);
  cursor.skip_ws();

  let (a, b) = parse_an_plus_b(&mut cursor)?;

  cursor.skip_ws();
  let of = match cursor.peek() {
    Some(CToken::Ident(word)) if word.eq_ignore_ascii_case("of") => {
      if !allow_of {
        return Err("'of' clause is only valid in :nth-child()/:nth-last-child()".to_string());
      }
      cursor.bump();
      let rest = &cursor.tokens[cursor.pos..];
      Some(parse_selector_list(rest, namespaces, false)?)
    }
    None => None,
    Some(other) => return Err(format!("unexpected {other:?} in An+B")),
  };

  Ok(Nth { a, b, of })
}

fn parse_an_plus_b(cursor: &mut Cursor) -> Result<(i32, i32), String> {
  // Handles: odd | even | <integer> | <n-dimension> ['+'|'-' <integer>]?
  // | n | -n | n-<digits> | '+' n ... — per css-syntax §6.
  let token = cursor.bump().ok_or_else(|| "empty An+B".to_string())?;
  match token {
    CToken::Ident(word) => match word.to_ascii_lowercase().as_str() {
      "odd" => Ok((2, 1)),
      "even" => Ok((2, 0)),
      other => parse_n_ident(other, 1, cursor),
    },
    CToken::Number {
      int_value: Some(b), ..
    } => Ok((0, *b)),
    CToken::Dimension {
      int_value: Some(a),
      unit,
      ..
    } => parse_n_ident(&unit.to_ascii_lowercase(), *a, cursor),
    CToken::Delim('+') => match cursor.bump() {
      Some(CToken::Ident(word)) => parse_n_ident(&word.to_ascii_lowercase(), 1, cursor),
      other => Err(format!("unexpected {other:?} in An+B")),
    },
    other => Err(format!("unexpected {other:?} in An+B")),
  }
}

/// Parse the `n`-bearing identifier tail: `n`, `-n`, `n-3`, `-n-3`, and the
/// split forms `n + 3` / `n - 3`.
fn parse_n_ident(word: &str, coefficient: i32, cursor: &mut Cursor) -> Result<(i32, i32), String> {
  let (a, rest) = if let Some(rest) = word.strip_prefix("-n") {
    (-coefficient, rest)
  } else if let Some(rest) = word.strip_prefix('n') {
    (coefficient, rest)
  } else {
    return Err(format!("expected 'n' in An+B, found '{word}'"));
  };

  if !rest.is_empty() {
    // `n-3` form: the b part is glued into the identifier.
    let b: i32 = rest
      .parse()
      .map_err(|_| format!("invalid An+B tail '{rest}'"))?;
    if !rest.starts_with('-') {
      return Err(format!("invalid An+B tail '{rest}'"));
    }
    return Ok((a, b));
  }

  // Optional `+ <int>` / `- <int>` / signed number.
  cursor.skip_ws();
  match cursor.peek() {
    Some(CToken::Delim(sign @ ('+' | '-'))) => {
      let sign = if *sign == '-' { -1 } else { 1 };
      cursor.bump();
      cursor.skip_ws();
      match cursor.bump() {
        Some(CToken::Number {
          int_value: Some(b),
          has_sign: false,
          ..
        }) => Ok((a, sign * b)),
        other => Err(format!("expected integer after sign in An+B, found {other:?}")),
      }
    }
    Some(CToken::Number {
      int_value: Some(b),
      has_sign: true,
      ..
    }) => {
      let b = *b;
      cursor.bump();
      Ok((a, b))
    }
    _ => Ok((a, 0)),
  }
}

// ============================================================================
// Serialization
// ============================================================================

impl fmt::Display for SelectorList {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for selector in &self.selectors {
      if !first {
        f.write_str(", ")?;
      }
      first = false;
      write!(f, "{selector}")?;
    }
    Ok(())
  }
}

impl fmt::Display for ComplexSelector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(leading) = self.leading {
      if leading != Combinator::Descendant {
        write!(f, "{}", leading.as_str().trim_start())?;
      }
    }
    for (i, compound) in self.compounds.iter().enumerate() {
      if i > 0 {
        f.write_str(self.combinators[i - 1].as_str())?;
      }
      write!(f, "{compound}")?;
    }
    Ok(())
  }
}

impl fmt::Display for CompoundSelector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(type_selector) = &self.type_selector {
      match &type_selector.namespace {
        NamespaceConstraint::Any => {
          // Only print `*|` when it disambiguates from the default.
        }
        NamespaceConstraint::None => f.write_str("|")?,
        NamespaceConstraint::Url(_) => {}
        NamespaceConstraint::Undeclared(prefix) => write!(f, "{prefix}|")?,
      }
      match &type_selector.name {
        Some(name) => f.write_str(name)?,
        None => f.write_str("*")?,
      }
    }
    for simple in &self.simples {
      write!(f, "{simple}")?;
    }
    if let Some(pseudo) = self.pseudo_element {
      write!(f, "::{}", pseudo.as_str())?;
    }
    Ok(())
  }
}

impl fmt::Display for SimpleSelector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SimpleSelector::Id(id) => write!(f, "#{id}"),
      SimpleSelector::Class(class) => write!(f, ".{class}"),
      SimpleSelector::Attribute(attr) => write!(f, "{attr}"),
      SimpleSelector::PseudoClass(pseudo) => write!(f, "{pseudo}"),
    }
  }
}

impl fmt::Display for AttrSelector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_char('[')?;
    if let NamespaceConstraint::Undeclared(prefix) = &self.namespace {
      write!(f, "{prefix}|")?;
    }
    f.write_str(&self.name)?;
    let op = match self.op {
      AttrOp::Exists => None,
      AttrOp::Equals => Some("="),
      AttrOp::Includes => Some("~="),
      AttrOp::DashMatch => Some("|="),
      AttrOp::Prefix => Some("^="),
      AttrOp::Suffix => Some("$="),
      AttrOp::Substring => Some("*="),
    };
    if let Some(op) = op {
      write!(f, "{op}\"{}\"", self.value)?;
      if self.case_insensitive {
        f.write_str(" i")?;
      }
    }
    f.write_char(']')
  }
}

impl fmt::Display for PseudoClass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PseudoClass::Root => f.write_str(":root"),
      PseudoClass::Empty => f.write_str(":empty"),
      PseudoClass::Blank => f.write_str(":blank"),
      PseudoClass::FirstChild => f.write_str(":first-child"),
      PseudoClass::LastChild => f.write_str(":last-child"),
      PseudoClass::OnlyChild => f.write_str(":only-child"),
      PseudoClass::FirstOfType => f.write_str(":first-of-type"),
      PseudoClass::LastOfType => f.write_str(":last-of-type"),
      PseudoClass::OnlyOfType => f.write_str(":only-of-type"),
      PseudoClass::NthChild(nth) => write_nth(f, "nth-child", nth),
      PseudoClass::NthLastChild(nth) => write_nth(f, "nth-last-child", nth),
      PseudoClass::NthOfType(nth) => write_nth(f, "nth-of-type", nth),
      PseudoClass::NthLastOfType(nth) => write_nth(f, "nth-last-of-type", nth),
      PseudoClass::Not(list) => write!(f, ":not({list})"),
      PseudoClass::Is(list) => write!(f, ":is({list})"),
      PseudoClass::Where(list) => write!(f, ":where({list})"),
      PseudoClass::Has(list) => write!(f, ":has({list})"),
      PseudoClass::Lang(ranges) => write!(f, ":lang({})", ranges.join(", ")),
      PseudoClass::AnyLink => f.write_str(":any-link"),
      PseudoClass::Link => f.write_str(":link"),
      PseudoClass::Visited => f.write_str(":visited"),
      PseudoClass::Target => f.write_str(":target"),
      PseudoClass::Checked => f.write_str(":checked"),
      PseudoClass::Indeterminate => f.write_str(":indeterminate"),
      PseudoClass::Default => f.write_str(":default"),
      PseudoClass::Enabled => f.write_str(":enabled"),
      PseudoClass::Disabled => f.write_str(":disabled"),
      PseudoClass::ReadOnly => f.write_str(":read-only"),
      PseudoClass::ReadWrite => f.write_str(":read-write"),
      PseudoClass::PlaceholderShown => f.write_str(":placeholder-shown"),
      PseudoClass::Dynamic(state) => write!(f, ":{state}"),
    }
  }
}

fn write_nth(f: &mut fmt::Formatter<'_>, name: &str, nth: &Nth) -> fmt::Result {
  write!(f, ":{name}(")?;
  match (nth.a, nth.b) {
    (0, b) => write!(f, "{b}")?,
    (2, 1) => f.write_str("odd")?,
    (2, 0) => f.write_str("even")?,
    (a, 0) => write!(f, "{a}n")?,
    (a, b) if b < 0 => write!(f, "{a}n{b}")?,
    (a, b) => write!(f, "{a}n+{b}")?,
  }
  if let Some(of) = &nth.of {
    write!(f, " of {of}")?;
  }
  f.write_char(')')
}
