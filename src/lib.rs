//! faststyle — CSS selector matching, cascade, and computed-value
//! resolution.
//!
//! The engine is a library core with three coupled subsystems: the selector
//! matcher ([`style::matcher`]), the declaration/shorthand cascade
//! ([`style::declaration`], [`style::cascade`]) and the computed-value
//! resolver ([`style::computed`]), which substitutes `var()`/`attr()`/
//! `env()` references, evaluates arithmetic, and converts units. Raw CSS
//! text enters through `cssparser`; the document tree, font metrics, and
//! viewport are supplied by the caller.
//!
//! Queries are pure functions of (element, rules, device context) — the
//! engine caches nothing, so mutate-then-re-query is the invalidation
//! model.

pub mod config;
pub mod css;
pub mod dom;
pub mod error;
pub mod style;

pub use config::{CompatConfig, DocumentMode, EngineConfig};
pub use css::parser::{Priority, QuirkMarker, Tier};
pub use css::selectors::{PseudoElement, SelectorList};
pub use dom::{Document, ElementId};
pub use error::{Error, ErrorCollector, Result};
pub use style::cascade::{Cascade, RuleSet, StyleRule};
pub use style::computed::{ComputedStyle, StyleResolver};
pub use style::custom_properties::{CustomPropertyRegistry, PropertyRule};
pub use style::declaration::StyleDeclaration;
pub use style::device::DeviceContext;
pub use style::matcher::MatchContext;
pub use style::specificity::Specificity;
pub use style::values::{Color, Length, LengthUnit, Value};
