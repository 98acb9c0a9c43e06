//! CSS arithmetic expressions
//!
//! `calc()`, the comparison functions `min()`/`max()`/`clamp()`, and the
//! power/trigonometric functions are parsed into an explicit expression
//! tree and evaluated against a [`UnitContext`]. Operands are resolved
//! before combination; an operand that fails to resolve (unresolvable
//! substitution, missing viewport, bad unit mix) poisons the whole
//! expression at every nesting level — product, sum, and parenthesized
//! sub-expression alike.
//!
//! Reference: CSS Values and Units Module Level 4, §10
//! <https://www.w3.org/TR/css-values-4/#math>

use crate::css::lexical::CToken;
use crate::style::values::{serialize_number, Length, LengthUnit, UnitContext, UnitError};

/// Supported math functions beyond plain `calc()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFunction {
  Min,
  Max,
  Clamp,
  Pow,
  Sqrt,
  Sin,
  Cos,
  Tan,
}

impl MathFunction {
  fn parse(name: &str) -> Option<Self> {
    Some(match name.to_ascii_lowercase().as_str() {
      "min" => Self::Min,
      "max" => Self::Max,
      "clamp" => Self::Clamp,
      "pow" => Self::Pow,
      "sqrt" => Self::Sqrt,
      "sin" => Self::Sin,
      "cos" => Self::Cos,
      "tan" => Self::Tan,
      _ => return None,
    })
  }

  fn as_str(self) -> &'static str {
    match self {
      Self::Min => "min",
      Self::Max => "max",
      Self::Clamp => "clamp",
      Self::Pow => "pow",
      Self::Sqrt => "sqrt",
      Self::Sin => "sin",
      Self::Cos => "cos",
      Self::Tan => "tan",
    }
  }
}

/// One node of an arithmetic expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum CalcExpr {
  Number(f32),
  Length(Length),
  Percentage(f32),
  /// Terms combined with `+`; subtraction is an added [`CalcExpr::Neg`].
  Sum(Vec<CalcExpr>),
  Neg(Box<CalcExpr>),
  /// Factors combined with `*`.
  Product(Vec<CalcExpr>),
  Div(Box<CalcExpr>, Box<CalcExpr>),
  Func(MathFunction, Vec<CalcExpr>),
}

/// The dimensional kind of an evaluated expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcKind {
  Number,
  Px,
  Percent,
}

/// Evaluated result: a magnitude plus its kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalcResult {
  pub value: f32,
  pub kind: CalcKind,
}

/// Why evaluation failed. `Unit` preserves the underlying unit error so
/// callers can report missing viewport context distinctly.
#[derive(Debug, Clone, PartialEq)]
pub enum CalcError {
  Unit(UnitError),
  Invalid(String),
}

impl From<UnitError> for CalcError {
  fn from(err: UnitError) -> Self {
    CalcError::Unit(err)
  }
}

/// Is `name` one of the math function names this module owns?
pub fn is_math_function(name: &str) -> bool {
  name.eq_ignore_ascii_case("calc") || MathFunction::parse(name).is_some()
}

/// Parse a math function (by name, with its argument tokens) into an
/// expression tree. Returns `None` on any grammar violation.
pub fn parse_math_function(name: &str, args: &[CToken]) -> Option<CalcExpr> {
  if name.eq_ignore_ascii_case("calc") {
    let mut tokens = TokenCursor::new(args);
    let expr = parse_sum(&mut tokens)?;
    tokens.finished().then_some(expr)
  } else {
    let function = MathFunction::parse(name)?;
    let mut groups = Vec::new();
    for group in split_on_commas(args) {
      let mut tokens = TokenCursor::new(&group);
      let expr = parse_sum(&mut tokens)?;
      if !tokens.finished() {
        return None;
      }
      groups.push(expr);
    }
    let arity_ok = match function {
      MathFunction::Min | MathFunction::Max => !groups.is_empty(),
      MathFunction::Clamp => groups.len() == 3,
      MathFunction::Pow => groups.len() == 2,
      MathFunction::Sqrt | MathFunction::Sin | MathFunction::Cos | MathFunction::Tan => groups.len() == 1,
    };
    arity_ok.then(|| CalcExpr::Func(function, groups))
  }
}

fn split_on_commas(tokens: &[CToken]) -> Vec<Vec<CToken>> {
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

struct TokenCursor<'a> {
  tokens: &'a [CToken],
  pos: usize,
}

impl<'a> TokenCursor<'a> {
  fn new(tokens: &'a [CToken]) -> Self {
    Self { tokens, pos: 0 }
  }

  fn skip_ws(&mut self) {
    while matches!(self.tokens.get(self.pos), Some(CToken::Whitespace)) {
      self.pos += 1;
    }
  }

  fn peek(&mut self) -> Option<&'a CToken> {
    self.skip_ws();
    self.tokens.get(self.pos)
  }

  fn next(&mut self) -> Option<&'a CToken> {
    self.skip_ws();
    let token = self.tokens.get(self.pos);
    if token.is_some() {
      self.pos += 1;
    }
    token
  }

  fn finished(&mut self) -> bool {
    self.peek().is_none()
  }
}

fn parse_sum(tokens: &mut TokenCursor) -> Option<CalcExpr> {
  let mut terms = vec![parse_product(tokens)?];
  while let Some(CToken::Delim(op @ ('+' | '-'))) = tokens.peek() {
    let op = *op;
    tokens.next();
    let term = parse_product(tokens)?;
    terms.push(if op == '-' { CalcExpr::Neg(Box::new(term)) } else { term });
  }
  if terms.len() == 1 {
    terms.pop()
  } else {
    Some(CalcExpr::Sum(terms))
  }
}

fn parse_product(tokens: &mut TokenCursor) -> Option<CalcExpr> {
  let mut expr = parse_unit(tokens)?;
  while let Some(CToken::Delim(op @ ('*' | '/'))) = tokens.peek() {
    let op = *op;
    tokens.next();
    let rhs = parse_unit(tokens)?;
    expr = if op == '/' {
      CalcExpr::Div(Box::new(expr), Box::new(rhs))
    } else {
      match expr {
        CalcExpr::Product(mut factors) => {
          factors.push(rhs);
          CalcExpr::Product(factors)
        }
        other => CalcExpr::Product(vec![other, rhs]),
      }
    };
  }
  Some(expr)
}

fn parse_unit(tokens: &mut TokenCursor) -> Option<CalcExpr> {
  match tokens.next()? {
    CToken::Number { value, .. } => Some(CalcExpr::Number(*value)),
    CToken::Percentage(value) => Some(CalcExpr::Percentage(*value)),
    CToken::Dimension { value, unit, .. } => {
      let unit = LengthUnit::parse(unit)?;
      Some(CalcExpr::Length(Length::new(*value, unit)))
    }
    CToken::Paren(children) => {
      let mut inner = TokenCursor::new(children);
      let expr = parse_sum(&mut inner)?;
      inner.finished().then_some(expr)
    }
    CToken::Function(name, args) => parse_math_function(name, args),
    _ => None,
  }
}

impl CalcExpr {
  /// Evaluate the expression with full unit context.
  pub fn evaluate(&self, ctx: &UnitContext) -> Result<CalcResult, CalcError> {
    match self {
      CalcExpr::Number(n) => Ok(CalcResult {
        value: *n,
        kind: CalcKind::Number,
      }),
      CalcExpr::Length(length) => Ok(CalcResult {
        value: length.resolve(ctx)?,
        kind: CalcKind::Px,
      }),
      CalcExpr::Percentage(p) => match ctx.percentage_base {
        Some(base) => Ok(CalcResult {
          value: (p / 100.0) * base,
          kind: CalcKind::Px,
        }),
        None => Ok(CalcResult {
          value: *p,
          kind: CalcKind::Percent,
        }),
      },
      CalcExpr::Neg(inner) => {
        let result = inner.evaluate(ctx)?;
        Ok(CalcResult {
          value: -result.value,
          kind: result.kind,
        })
      }
      CalcExpr::Sum(terms) => {
        let mut iter = terms.iter();
        let first = iter.next().ok_or_else(|| CalcError::Invalid("empty sum".to_string()))?;
        let mut acc = first.evaluate(ctx)?;
        for term in iter {
          let next = term.evaluate(ctx)?;
          if next.kind != acc.kind {
            return Err(CalcError::Invalid(format!(
              "cannot add {:?} and {:?}",
              acc.kind, next.kind
            )));
          }
          acc.value += next.value;
        }
        Ok(acc)
      }
      CalcExpr::Product(factors) => {
        let mut value = 1.0;
        let mut kind = CalcKind::Number;
        for factor in factors {
          let result = factor.evaluate(ctx)?;
          if result.kind != CalcKind::Number {
            if kind != CalcKind::Number {
              return Err(CalcError::Invalid("product of two dimensions".to_string()));
            }
            kind = result.kind;
          }
          value *= result.value;
        }
        Ok(CalcResult { value, kind })
      }
      CalcExpr::Div(lhs, rhs) => {
        let numerator = lhs.evaluate(ctx)?;
        let denominator = rhs.evaluate(ctx)?;
        if denominator.kind != CalcKind::Number {
          return Err(CalcError::Invalid("division by a dimension".to_string()));
        }
        if denominator.value == 0.0 {
          return Err(CalcError::Invalid("division by zero".to_string()));
        }
        Ok(CalcResult {
          value: numerator.value / denominator.value,
          kind: numerator.kind,
        })
      }
      CalcExpr::Func(function, args) => {
        let results = args
          .iter()
          .map(|arg| arg.evaluate(ctx))
          .collect::<Result<Vec<_>, _>>()?;
        match function {
          MathFunction::Min | MathFunction::Max => {
            let kind = results[0].kind;
            if results.iter().any(|r| r.kind != kind) {
              return Err(CalcError::Invalid("mixed kinds in min()/max()".to_string()));
            }
            let value = results
              .iter()
              .map(|r| r.value)
              .fold(results[0].value, |acc, v| {
                if *function == MathFunction::Min {
                  acc.min(v)
                } else {
                  acc.max(v)
                }
              });
            Ok(CalcResult { value, kind })
          }
          MathFunction::Clamp => {
            let kind = results[0].kind;
            if results.iter().any(|r| r.kind != kind) {
              return Err(CalcError::Invalid("mixed kinds in clamp()".to_string()));
            }
            let (min, val, max) = (results[0].value, results[1].value, results[2].value);
            // clamp() with min > max resolves to min, per spec.
            Ok(CalcResult {
              value: val.max(min).min(max.max(min)),
              kind,
            })
          }
          MathFunction::Pow => {
            let (base, exp) = (results[0], results[1]);
            if base.kind != CalcKind::Number || exp.kind != CalcKind::Number {
              return Err(CalcError::Invalid("pow() requires numbers".to_string()));
            }
            Ok(CalcResult {
              value: base.value.powf(exp.value),
              kind: CalcKind::Number,
            })
          }
          MathFunction::Sqrt => {
            let arg = results[0];
            if arg.kind != CalcKind::Number || arg.value < 0.0 {
              return Err(CalcError::Invalid("sqrt() requires a non-negative number".to_string()));
            }
            Ok(CalcResult {
              value: arg.value.sqrt(),
              kind: CalcKind::Number,
            })
          }
          MathFunction::Sin | MathFunction::Cos | MathFunction::Tan => {
            let arg = results[0];
            if arg.kind != CalcKind::Number {
              return Err(CalcError::Invalid("trigonometric functions require numbers".to_string()));
            }
            let value = match function {
              MathFunction::Sin => arg.value.sin(),
              MathFunction::Cos => arg.value.cos(),
              _ => arg.value.tan(),
            };
            Ok(CalcResult {
              value,
              kind: CalcKind::Number,
            })
          }
        }
      }
    }
  }

  /// Serialize back to a parseable expression.
  pub fn to_css_string(&self) -> String {
    format!("calc({})", self.serialize_inner())
  }

  fn serialize_inner(&self) -> String {
    match self {
      CalcExpr::Number(n) => serialize_number(*n),
      CalcExpr::Length(length) => length.to_string(),
      CalcExpr::Percentage(p) => format!("{}%", serialize_number(*p)),
      CalcExpr::Neg(inner) => format!("-1*{}", inner.serialize_grouped()),
      CalcExpr::Sum(terms) => {
        let mut out = String::new();
        for (i, term) in terms.iter().enumerate() {
          if i > 0 {
            match term {
              CalcExpr::Neg(inner) => {
                out.push_str(" - ");
                out.push_str(&inner.serialize_grouped());
                continue;
              }
              _ => out.push_str(" + "),
            }
          }
          out.push_str(&term.serialize_grouped());
        }
        out
      }
      CalcExpr::Product(factors) => factors
        .iter()
        .map(CalcExpr::serialize_grouped)
        .collect::<Vec<_>>()
        .join("*"),
      CalcExpr::Div(lhs, rhs) => format!("{}/{}", lhs.serialize_grouped(), rhs.serialize_grouped()),
      CalcExpr::Func(function, args) => format!(
        "{}({})",
        function.as_str(),
        args
          .iter()
          .map(CalcExpr::serialize_inner)
          .collect::<Vec<_>>()
          .join(", ")
      ),
    }
  }

  fn serialize_grouped(&self) -> String {
    match self {
      CalcExpr::Sum(_) => format!("({})", self.serialize_inner()),
      _ => self.serialize_inner(),
    }
  }
}
