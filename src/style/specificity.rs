//! CSS specificity
//!
//! A 3-tuple `(id, class/attribute/pseudo-class, type/pseudo-element)`
//! compared lexicographically. `:where()` contributes zero regardless of its
//! arguments; `:is()`/`:has()` contribute the specificity of their most
//! specific *matching* branch (computed by the matcher at match time);
//! `:not()` contributes its argument list's most specific branch.
//!
//! Reference: Selectors Level 4, §17
//! <https://www.w3.org/TR/selectors-4/#specificity>

use crate::css::selectors::{ComplexSelector, CompoundSelector, PseudoClass, SelectorList, SimpleSelector};
use std::ops::Add;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl Specificity {
  pub const ZERO: Self = Self(0, 0, 0);

  /// Style-attribute declarations outrank any selector.
  pub const INLINE: Self = Self(u32::MAX, u32::MAX, u32::MAX);

  pub const ID: Self = Self(1, 0, 0);
  pub const CLASS: Self = Self(0, 1, 0);
  pub const TYPE: Self = Self(0, 0, 1);

  /// Static specificity of a complex selector. Functional pseudo-classes
  /// with selector arguments contribute their most specific branch; this is
  /// the upper bound the matcher refines per element.
  pub fn of_complex(selector: &ComplexSelector) -> Self {
    selector
      .compounds
      .iter()
      .fold(Self::ZERO, |acc, compound| acc + Self::of_compound(compound))
  }

  pub fn of_compound(compound: &CompoundSelector) -> Self {
    let mut total = Self::ZERO;
    if compound.type_selector.as_ref().is_some_and(|t| t.name.is_some()) {
      total = total + Self::TYPE;
    }
    for simple in &compound.simples {
      total = total + Self::of_simple(simple);
    }
    if compound.pseudo_element.is_some() {
      total = total + Self::TYPE;
    }
    total
  }

  pub fn of_simple(simple: &SimpleSelector) -> Self {
    match simple {
      SimpleSelector::Id(_) => Self::ID,
      SimpleSelector::Class(_) | SimpleSelector::Attribute(_) => Self::CLASS,
      SimpleSelector::PseudoClass(pseudo) => Self::of_pseudo_class(pseudo),
    }
  }

  pub fn of_pseudo_class(pseudo: &PseudoClass) -> Self {
    match pseudo {
      PseudoClass::Where(_) => Self::ZERO,
      PseudoClass::Is(list) | PseudoClass::Not(list) | PseudoClass::Has(list) => Self::max_branch(list),
      PseudoClass::NthChild(nth) | PseudoClass::NthLastChild(nth) => {
        // The pseudo-class itself, plus its `of S` list's most specific
        // branch when present.
        let of = nth.of.as_ref().map(Self::max_branch).unwrap_or(Self::ZERO);
        Self::CLASS + of
      }
      _ => Self::CLASS,
    }
  }

  /// The most specific selector of a list (zero for an empty list).
  pub fn max_branch(list: &SelectorList) -> Self {
    list
      .selectors
      .iter()
      .map(Self::of_complex)
      .max()
      .unwrap_or(Self::ZERO)
  }
}

impl Add for Specificity {
  type Output = Self;

  fn add(self, other: Self) -> Self {
    Self(
      self.0.saturating_add(other.0),
      self.1.saturating_add(other.1),
      self.2.saturating_add(other.2),
    )
  }
}
