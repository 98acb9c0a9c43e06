//! Lexical component values
//!
//! Declaration values that still carry `var()`, `attr()` or `env()`
//! references cannot be parsed under their property grammar until
//! resolution time. They are stored here as trees of component tokens,
//! produced by `cssparser` (the external tokenizer) and serialized back to
//! text after substitution. Nested blocks and functions keep their token
//! children so substitution can rewrite payloads without re-scanning text.

use cssparser::{Parser, ParserInput, Token};
use std::fmt;
use std::fmt::Write as _;

/// One component token, with nested blocks recursively tokenized.
#[derive(Debug, Clone, PartialEq)]
pub enum CToken {
  Ident(String),
  /// Function name plus its argument tokens (`calc(...)`, `var(...)`).
  Function(String, Vec<CToken>),
  AtKeyword(String),
  /// `#foo` where the value is not a valid identifier.
  Hash(String),
  /// `#foo` usable as an ID selector.
  IdHash(String),
  QuotedString(String),
  Url(String),
  Number {
    value: f32,
    int_value: Option<i32>,
    has_sign: bool,
  },
  /// Percentage; `value` is the written number (50 for `50%`).
  Percentage(f32),
  Dimension {
    value: f32,
    int_value: Option<i32>,
    unit: String,
  },
  Whitespace,
  Colon,
  Semicolon,
  Comma,
  Delim(char),
  /// `~=`
  IncludeMatch,
  /// `|=`
  DashMatch,
  /// `^=`
  PrefixMatch,
  /// `$=`
  SuffixMatch,
  /// `*=`
  SubstringMatch,
  Paren(Vec<CToken>),
  Bracket(Vec<CToken>),
  Brace(Vec<CToken>),
}

impl CToken {
  pub fn is_whitespace(&self) -> bool {
    matches!(self, CToken::Whitespace)
  }

  /// The identifier text, if this token is an ident.
  pub fn as_ident(&self) -> Option<&str> {
    match self {
      CToken::Ident(name) => Some(name),
      _ => None,
    }
  }
}

/// Tokenize a value string into component tokens.
///
/// Never fails: bad-string/bad-url tokens simply terminate their branch,
/// matching forward-compatible parsing.
pub fn tokenize(text: &str) -> Vec<CToken> {
  let mut input = ParserInput::new(text);
  let mut parser = Parser::new(&mut input);
  tokenize_stream(&mut parser)
}

fn tokenize_stream<'i>(parser: &mut Parser<'i, '_>) -> Vec<CToken> {
  let mut out = Vec::new();
  while let Ok(token) = parser.next_including_whitespace().map(Token::clone) {
    match token {
      Token::Function(name) => {
        let name = name.as_ref().to_string();
        let children = parser
          .parse_nested_block(|nested| Ok::<_, cssparser::ParseError<'i, ()>>(tokenize_stream(nested)))
          .unwrap_or_default();
        out.push(CToken::Function(name, children));
      }
      Token::ParenthesisBlock => {
        let children = parser
          .parse_nested_block(|nested| Ok::<_, cssparser::ParseError<'i, ()>>(tokenize_stream(nested)))
          .unwrap_or_default();
        out.push(CToken::Paren(children));
      }
      Token::SquareBracketBlock => {
        let children = parser
          .parse_nested_block(|nested| Ok::<_, cssparser::ParseError<'i, ()>>(tokenize_stream(nested)))
          .unwrap_or_default();
        out.push(CToken::Bracket(children));
      }
      Token::CurlyBracketBlock => {
        let children = parser
          .parse_nested_block(|nested| Ok::<_, cssparser::ParseError<'i, ()>>(tokenize_stream(nested)))
          .unwrap_or_default();
        out.push(CToken::Brace(children));
      }
      Token::Ident(name) => out.push(CToken::Ident(name.as_ref().to_string())),
      Token::AtKeyword(name) => out.push(CToken::AtKeyword(name.as_ref().to_string())),
      Token::Hash(value) => out.push(CToken::Hash(value.as_ref().to_string())),
      Token::IDHash(value) => out.push(CToken::IdHash(value.as_ref().to_string())),
      Token::QuotedString(value) => out.push(CToken::QuotedString(value.as_ref().to_string())),
      Token::UnquotedUrl(value) => out.push(CToken::Url(value.as_ref().to_string())),
      Token::Number {
        value,
        int_value,
        has_sign,
      } => out.push(CToken::Number {
        value,
        int_value,
        has_sign,
      }),
      Token::Percentage { unit_value, .. } => out.push(CToken::Percentage(unit_value * 100.0)),
      Token::Dimension {
        value,
        int_value,
        unit,
        ..
      } => out.push(CToken::Dimension {
        value,
        int_value,
        unit: unit.as_ref().to_string(),
      }),
      Token::WhiteSpace(_) => {
        // Collapse runs; one space is enough to preserve token boundaries.
        if !matches!(out.last(), Some(CToken::Whitespace)) {
          out.push(CToken::Whitespace);
        }
      }
      Token::Comment(_) => {}
      Token::Colon => out.push(CToken::Colon),
      Token::Semicolon => out.push(CToken::Semicolon),
      Token::Comma => out.push(CToken::Comma),
      Token::Delim(ch) => out.push(CToken::Delim(ch)),
      Token::IncludeMatch => out.push(CToken::IncludeMatch),
      Token::DashMatch => out.push(CToken::DashMatch),
      Token::PrefixMatch => out.push(CToken::PrefixMatch),
      Token::SuffixMatch => out.push(CToken::SuffixMatch),
      Token::SubstringMatch => out.push(CToken::SubstringMatch),
      // Stray closers and bad tokens terminate forward-compatibly.
      _ => {}
    }
  }
  out
}

/// Serialize tokens back to CSS text.
///
/// Token boundaries are preserved: adjacent word-like tokens get a
/// separating space even when no whitespace token sits between them, so
/// substitution output re-tokenizes identically.
pub fn serialize(tokens: &[CToken]) -> String {
  let mut out = String::new();
  let mut prev_wordlike = false;
  for token in tokens {
    let wordlike = matches!(
      token,
      CToken::Ident(_)
        | CToken::Number { .. }
        | CToken::Dimension { .. }
        | CToken::Percentage(_)
        | CToken::Hash(_)
        | CToken::IdHash(_)
        | CToken::Function(..)
        | CToken::Url(_)
        | CToken::AtKeyword(_)
        // A paren block after an ident would re-tokenize as a function.
        | CToken::Paren(_)
    );
    if wordlike && prev_wordlike {
      out.push(' ');
    }
    write_token(&mut out, token);
    prev_wordlike = wordlike && !matches!(token, CToken::Function(..) | CToken::Paren(_));
  }
  out
}

fn write_token(out: &mut String, token: &CToken) {
  match token {
    CToken::Ident(name) => out.push_str(name),
    CToken::Function(name, args) => {
      out.push_str(name);
      out.push('(');
      out.push_str(&serialize(args));
      out.push(')');
    }
    CToken::AtKeyword(name) => {
      out.push('@');
      out.push_str(name);
    }
    CToken::Hash(value) | CToken::IdHash(value) => {
      out.push('#');
      out.push_str(value);
    }
    CToken::QuotedString(value) => {
      out.push('"');
      for ch in value.chars() {
        if ch == '"' || ch == '\\' {
          out.push('\\');
        }
        out.push(ch);
      }
      out.push('"');
    }
    CToken::Url(value) => {
      let _ = write!(out, "url({})", value);
    }
    CToken::Number { value, int_value, .. } => write_number(out, *value, *int_value),
    CToken::Percentage(value) => {
      write_number(out, *value, None);
      out.push('%');
    }
    CToken::Dimension { value, int_value, unit } => {
      write_number(out, *value, *int_value);
      out.push_str(unit);
    }
    CToken::Whitespace => out.push(' '),
    CToken::Colon => out.push(':'),
    CToken::Semicolon => out.push(';'),
    CToken::Comma => out.push(','),
    CToken::Delim(ch) => out.push(*ch),
    CToken::IncludeMatch => out.push_str("~="),
    CToken::DashMatch => out.push_str("|="),
    CToken::PrefixMatch => out.push_str("^="),
    CToken::SuffixMatch => out.push_str("$="),
    CToken::SubstringMatch => out.push_str("*="),
    CToken::Paren(children) => {
      out.push('(');
      out.push_str(&serialize(children));
      out.push(')');
    }
    CToken::Bracket(children) => {
      out.push('[');
      out.push_str(&serialize(children));
      out.push(']');
    }
    CToken::Brace(children) => {
      out.push('{');
      out.push_str(&serialize(children));
      out.push('}');
    }
  }
}

fn write_number(out: &mut String, value: f32, int_value: Option<i32>) {
  match int_value {
    Some(int) => {
      let _ = write!(out, "{}", int);
    }
    None => {
      let _ = write!(out, "{}", crate::style::values::serialize_number(value));
    }
  }
}

/// A property value kept in lexical (unresolved) form.
///
/// Custom property values are always lexical; standard property values are
/// lexical only while they contain `var()`/`attr()`/`env()` references.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LexicalValue {
  tokens: Vec<CToken>,
}

impl LexicalValue {
  pub fn from_tokens(tokens: Vec<CToken>) -> Self {
    Self { tokens }
  }

  pub fn parse(text: &str) -> Self {
    let mut tokens = tokenize(text);
    // Leading/trailing whitespace is not part of the value.
    while tokens.first().is_some_and(CToken::is_whitespace) {
      tokens.remove(0);
    }
    while tokens.last().is_some_and(CToken::is_whitespace) {
      tokens.pop();
    }
    Self { tokens }
  }

  pub fn tokens(&self) -> &[CToken] {
    &self.tokens
  }

  pub fn into_tokens(self) -> Vec<CToken> {
    self.tokens
  }

  /// True for the empty-but-present value (`--x:;`), which is distinct from
  /// an unset custom property.
  pub fn is_empty(&self) -> bool {
    self.tokens.is_empty()
  }

  /// Whether any token (at any nesting depth) is a substitution reference.
  pub fn has_references(&self) -> bool {
    tokens_have_references(&self.tokens)
  }

  pub fn css_text(&self) -> String {
    serialize(&self.tokens)
  }
}

impl fmt::Display for LexicalValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.css_text())
  }
}

/// Whether a token slice contains `var()`, `attr()` or `env()` anywhere.
pub fn tokens_have_references(tokens: &[CToken]) -> bool {
  tokens.iter().any(|token| match token {
    CToken::Function(name, args) => {
      is_reference_function(name) || tokens_have_references(args)
    }
    CToken::Paren(children) | CToken::Bracket(children) | CToken::Brace(children) => {
      tokens_have_references(children)
    }
    _ => false,
  })
}

pub fn is_reference_function(name: &str) -> bool {
  name.eq_ignore_ascii_case("var") || name.eq_ignore_ascii_case("attr") || name.eq_ignore_ascii_case("env")
}

/// Validates a custom property name: `--` followed by at least one
/// non-whitespace character.
pub fn is_custom_property_name(name: &str) -> bool {
  name.len() > 2 && name.starts_with("--") && !name[2..].chars().any(char::is_whitespace)
}

/// Custom property names referenced by `var()` within a token slice,
/// including references inside fallbacks.
pub fn referenced_custom_properties(tokens: &[CToken], out: &mut Vec<String>) {
  for token in tokens {
    match token {
      CToken::Function(name, args) => {
        if name.eq_ignore_ascii_case("var") {
          if let Some(CToken::Ident(var_name)) = args.iter().find(|t| !t.is_whitespace()) {
            out.push(var_name.clone());
          }
        }
        referenced_custom_properties(args, out);
      }
      CToken::Paren(children) | CToken::Bracket(children) | CToken::Brace(children) => {
        referenced_custom_properties(children, out);
      }
      _ => {}
    }
  }
}
