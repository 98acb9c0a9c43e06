//! Selector matching
//!
//! Evaluates selectors right-to-left against the read-only element tree.
//! Descendant and subsequent-sibling combinators backtrack over candidate
//! anchors. Specificity is computed during matching because `:is()` and
//! `:has()` contribute the specificity of their most specific *matching*
//! branch, which cannot be known statically.
//!
//! Reference: Selectors Level 4
//! <https://www.w3.org/TR/selectors-4/>

use crate::config::{DocumentMode, EngineConfig};
use crate::css::selectors::{
  AttrOp, AttrSelector, Combinator, CompoundSelector, ComplexSelector, NamespaceConstraint, Nth,
  PseudoClass, PseudoElement, SelectorList, SimpleSelector, TypeSelector,
};
use crate::dom::{Document, ElementId, ElementStateProvider, NoState, VisitedOracle};
use crate::style::specificity::Specificity;

const NO_STATE: &NoState = &NoState;

/// Everything selector evaluation needs besides the element itself.
#[derive(Clone, Copy)]
pub struct MatchContext<'a> {
  pub document: &'a Document,
  pub config: &'a EngineConfig,
  /// The pseudo-element context this matcher is evaluating for. A selector
  /// whose subject names a different pseudo-element (or none) fails.
  pub pseudo_element: Option<PseudoElement>,
  pub state: &'a dyn ElementStateProvider,
  pub visited: &'a dyn VisitedOracle,
}

impl<'a> MatchContext<'a> {
  pub fn new(document: &'a Document, config: &'a EngineConfig) -> Self {
    Self {
      document,
      config,
      pseudo_element: None,
      state: NO_STATE,
      visited: NO_STATE,
    }
  }

  pub fn for_pseudo_element(mut self, pseudo: Option<PseudoElement>) -> Self {
    self.pseudo_element = pseudo;
    self
  }

  pub fn with_state_provider(mut self, state: &'a dyn ElementStateProvider) -> Self {
    self.state = state;
    self
  }

  pub fn with_visited_oracle(mut self, visited: &'a dyn VisitedOracle) -> Self {
    self.visited = visited;
    self
  }

  /// Context for nested selector lists (`:is()`, `:not()`, `of S`), which
  /// always match in the element context, never a pseudo-element's.
  fn inner(self) -> Self {
    Self {
      pseudo_element: None,
      ..self
    }
  }
}

/// Index of the first selector in the list matching `element`, or `None`.
pub fn matches(element: ElementId, list: &SelectorList, ctx: &MatchContext) -> Option<usize> {
  list
    .selectors
    .iter()
    .position(|complex| match_complex(element, complex, ctx).is_some())
}

/// All matching selectors with their (match-time) specificity.
pub fn match_all(element: ElementId, list: &SelectorList, ctx: &MatchContext) -> Vec<(usize, Specificity)> {
  list
    .selectors
    .iter()
    .enumerate()
    .filter_map(|(index, complex)| match_complex(element, complex, ctx).map(|spec| (index, spec)))
    .collect()
}

/// Match one complex selector; returns its specificity on success.
pub fn match_complex(element: ElementId, complex: &ComplexSelector, ctx: &MatchContext) -> Option<Specificity> {
  if complex.pseudo_element() != ctx.pseudo_element {
    return None;
  }
  match_from(element, complex, complex.compounds.len() - 1, None, ctx)
}

/// Anchor constraint for relative (`:has()`) matching: the leftmost
/// compound's element must stand in `combinator` relation to the scope.
type Anchor = (ElementId, Combinator);

fn match_from(
  element: ElementId,
  complex: &ComplexSelector,
  index: usize,
  anchor: Option<Anchor>,
  ctx: &MatchContext,
) -> Option<Specificity> {
  let subject = index == complex.compounds.len() - 1;
  let spec = match_compound(element, &complex.compounds[index], subject, ctx)?;

  if index == 0 {
    if let Some((scope, combinator)) = anchor {
      if !anchor_relation_holds(element, scope, combinator, ctx.document) {
        return None;
      }
    }
    return Some(spec);
  }

  let doc = ctx.document;
  match complex.combinators[index - 1] {
    Combinator::Child => {
      let parent = doc.parent_element(element)?;
      match_from(parent, complex, index - 1, anchor, ctx).map(|s| s + spec)
    }
    Combinator::Descendant => {
      let mut current = doc.parent_element(element);
      while let Some(ancestor) = current {
        if let Some(s) = match_from(ancestor, complex, index - 1, anchor, ctx) {
          return Some(s + spec);
        }
        current = doc.parent_element(ancestor);
      }
      None
    }
    Combinator::NextSibling => {
      let prev = doc.previous_sibling_element(element)?;
      match_from(prev, complex, index - 1, anchor, ctx).map(|s| s + spec)
    }
    Combinator::SubsequentSibling => {
      for sibling in doc.preceding_sibling_elements(element) {
        if let Some(s) = match_from(sibling, complex, index - 1, anchor, ctx) {
          return Some(s + spec);
        }
      }
      None
    }
  }
}

fn anchor_relation_holds(element: ElementId, scope: ElementId, combinator: Combinator, doc: &Document) -> bool {
  match combinator {
    Combinator::Descendant => doc.is_ancestor(scope, element),
    Combinator::Child => doc.parent_element(element) == Some(scope),
    Combinator::NextSibling => doc.previous_sibling_element(element) == Some(scope),
    Combinator::SubsequentSibling => doc.preceding_sibling_elements(element).contains(&scope),
  }
}

fn match_compound(
  element: ElementId,
  compound: &CompoundSelector,
  subject: bool,
  ctx: &MatchContext,
) -> Option<Specificity> {
  // Mismatched pseudo-element context fails regardless of other conditions;
  // the list-level check handles the subject, and non-subject compounds
  // cannot carry pseudo-elements (enforced by the parser).
  if !subject && compound.pseudo_element.is_some() {
    return None;
  }

  let mut spec = Specificity::ZERO;

  if let Some(type_selector) = &compound.type_selector {
    if !type_selector_matches(element, type_selector, ctx) {
      return None;
    }
    if type_selector.name.is_some() {
      spec = spec + Specificity::TYPE;
    }
  }
  if compound.pseudo_element.is_some() {
    spec = spec + Specificity::TYPE;
  }

  for simple in &compound.simples {
    spec = spec + match_simple(element, simple, ctx)?;
  }
  Some(spec)
}

fn type_selector_matches(element: ElementId, type_selector: &TypeSelector, ctx: &MatchContext) -> bool {
  let doc = ctx.document;
  let data = doc.element(element);

  match &type_selector.namespace {
    NamespaceConstraint::Undeclared(_) => return false, // fail-closed
    NamespaceConstraint::Any => {}
    NamespaceConstraint::None => {
      if data.namespace.is_some() {
        return false;
      }
    }
    NamespaceConstraint::Url(url) => {
      if data.namespace.as_deref() != Some(url.as_str()) {
        return false;
      }
    }
  }

  match &type_selector.name {
    None => true,
    // Tag names compare case-insensitively; HTML documents are
    // case-normalized by the parser anyway.
    Some(name) => data.tag.eq_ignore_ascii_case(name),
  }
}

fn ident_matches(selector_value: &str, element_value: &str, ctx: &MatchContext) -> bool {
  match ctx.config.mode {
    DocumentMode::Quirks => selector_value.eq_ignore_ascii_case(element_value),
    DocumentMode::Standards => selector_value == element_value,
  }
}

fn match_simple(element: ElementId, simple: &SimpleSelector, ctx: &MatchContext) -> Option<Specificity> {
  let doc = ctx.document;
  match simple {
    SimpleSelector::Id(id) => {
      let element_id = doc.attribute(element, "id")?;
      ident_matches(id, element_id, ctx).then_some(Specificity::ID)
    }
    SimpleSelector::Class(class) => {
      let classes = doc.attribute(element, "class")?;
      classes
        .split_ascii_whitespace()
        .any(|c| ident_matches(class, c, ctx))
        .then_some(Specificity::CLASS)
    }
    SimpleSelector::Attribute(attr) => attribute_matches(element, attr, ctx).then_some(Specificity::CLASS),
    SimpleSelector::PseudoClass(pseudo) => match_pseudo_class(element, pseudo, ctx),
  }
}

fn attribute_matches(element: ElementId, attr: &AttrSelector, ctx: &MatchContext) -> bool {
  let doc = ctx.document;
  let value = match &attr.namespace {
    NamespaceConstraint::Undeclared(_) => return false,
    NamespaceConstraint::None => doc.attribute(element, &attr.name),
    NamespaceConstraint::Any => doc.attribute_any_ns(element, &attr.name),
    NamespaceConstraint::Url(url) => doc.attribute_ns(element, Some(url), &attr.name),
  };
  let Some(value) = value else {
    return false;
  };

  // The `i` flag overrides the document default; quirks documents compare
  // attribute values case-insensitively to begin with.
  let fold = attr.case_insensitive || ctx.config.mode == DocumentMode::Quirks;
  let eq = |a: &str, b: &str| {
    if fold {
      a.eq_ignore_ascii_case(b)
    } else {
      a == b
    }
  };

  let expected = &attr.value;
  match attr.op {
    AttrOp::Exists => true,
    AttrOp::Equals => eq(value, expected),
    AttrOp::Includes => {
      !expected.is_empty()
        && !expected.contains(char::is_whitespace)
        && value.split_ascii_whitespace().any(|token| eq(token, expected))
    }
    AttrOp::DashMatch => {
      eq(value, expected)
        || (value.len() > expected.len()
          && value.as_bytes().get(expected.len()) == Some(&b'-')
          && eq(&value[..expected.len()], expected))
    }
    AttrOp::Prefix => {
      !expected.is_empty() && value.len() >= expected.len() && eq(&value[..expected.len()], expected)
    }
    AttrOp::Suffix => {
      !expected.is_empty()
        && value.len() >= expected.len()
        && eq(&value[value.len() - expected.len()..], expected)
    }
    AttrOp::Substring => {
      if expected.is_empty() {
        return false;
      }
      if fold {
        value.to_ascii_lowercase().contains(&expected.to_ascii_lowercase())
      } else {
        value.contains(expected.as_str())
      }
    }
  }
}

fn match_pseudo_class(element: ElementId, pseudo: &PseudoClass, ctx: &MatchContext) -> Option<Specificity> {
  let doc = ctx.document;
  let class = Specificity::CLASS;
  let ok = |matched: bool| matched.then_some(class);

  match pseudo {
    PseudoClass::Root => ok(doc.is_root(element)),
    PseudoClass::Empty => ok(doc.is_empty(element)),
    PseudoClass::Blank => ok(doc.is_blank(element)),
    PseudoClass::FirstChild => ok(sibling_index(element, false, None, ctx)? == 1),
    PseudoClass::LastChild => ok(sibling_index(element, true, None, ctx)? == 1),
    PseudoClass::OnlyChild => ok(doc.sibling_elements(element).len() == 1),
    PseudoClass::FirstOfType => ok(type_index(element, false, ctx) == 1),
    PseudoClass::LastOfType => ok(type_index(element, true, ctx) == 1),
    PseudoClass::OnlyOfType => ok(same_type_siblings(element, ctx).len() == 1),
    PseudoClass::NthChild(nth) => match_nth(element, nth, false, ctx),
    PseudoClass::NthLastChild(nth) => match_nth(element, nth, true, ctx),
    PseudoClass::NthOfType(nth) => ok(nth.matches_index(type_index(element, false, ctx))),
    PseudoClass::NthLastOfType(nth) => ok(nth.matches_index(type_index(element, true, ctx))),
    PseudoClass::Not(list) => {
      let inner = ctx.inner();
      let none_match = list
        .selectors
        .iter()
        .all(|complex| match_complex(element, complex, &inner).is_none());
      none_match.then(|| Specificity::max_branch(list))
    }
    PseudoClass::Is(list) => matching_branch_specificity(element, list, ctx),
    PseudoClass::Where(list) => {
      let inner = ctx.inner();
      list
        .selectors
        .iter()
        .any(|complex| match_complex(element, complex, &inner).is_some())
        .then_some(Specificity::ZERO)
    }
    PseudoClass::Has(list) => match_has(element, list, ctx),
    PseudoClass::Lang(ranges) => {
      let language = doc.language(element)?;
      ok(ranges.iter().any(|range| lang_range_matches(range, language)))
    }
    PseudoClass::AnyLink => ok(is_link(element, ctx)),
    PseudoClass::Link => ok(is_link(element, ctx) && !is_visited(element, ctx)),
    PseudoClass::Visited => ok(is_link(element, ctx) && is_visited(element, ctx)),
    PseudoClass::Target => ok(doc.state(element).target),
    PseudoClass::Indeterminate => ok(doc.state(element).indeterminate),
    PseudoClass::Default => ok(doc.state(element).default),
    PseudoClass::Checked => ok(
      doc.attribute(element, "checked").is_some() || doc.attribute(element, "selected").is_some(),
    ),
    PseudoClass::Enabled => ok(is_form_control(element, ctx) && !is_disabled(element, ctx)),
    PseudoClass::Disabled => ok(is_form_control(element, ctx) && is_disabled(element, ctx)),
    PseudoClass::ReadWrite => ok(is_editable(element, ctx)),
    PseudoClass::ReadOnly => ok(!is_editable(element, ctx)),
    PseudoClass::PlaceholderShown => {
      let has_placeholder = doc.attribute(element, "placeholder").is_some();
      let value_empty = doc.attribute(element, "value").is_none_or(str::is_empty);
      ok(has_placeholder && value_empty)
    }
    PseudoClass::Dynamic(state) => ok(ctx.state.matches_state(element, state)),
  }
}

/// Max specificity among matching branches, `None` when no branch matches.
fn matching_branch_specificity(
  element: ElementId,
  list: &SelectorList,
  ctx: &MatchContext,
) -> Option<Specificity> {
  let inner = ctx.inner();
  list
    .selectors
    .iter()
    .filter_map(|complex| match_complex(element, complex, &inner))
    .max()
}

/// 1-based index among (possibly filtered) siblings, from the start or end.
/// Returns `None` when an `of S` filter excludes the element itself.
fn sibling_index(
  element: ElementId,
  from_end: bool,
  of: Option<&SelectorList>,
  ctx: &MatchContext,
) -> Option<i32> {
  let doc = ctx.document;
  let siblings = doc.sibling_elements(element);
  let filtered: Vec<ElementId> = match of {
    None => siblings,
    Some(list) => {
      let inner = ctx.inner();
      siblings
        .into_iter()
        .filter(|&sibling| {
          list
            .selectors
            .iter()
            .any(|complex| match_complex(sibling, complex, &inner).is_some())
        })
        .collect()
    }
  };
  let position = filtered.iter().position(|&s| s == element)?;
  Some(if from_end {
    (filtered.len() - position) as i32
  } else {
    (position + 1) as i32
  })
}

fn match_nth(element: ElementId, nth: &Nth, from_end: bool, ctx: &MatchContext) -> Option<Specificity> {
  let index = sibling_index(element, from_end, nth.of.as_ref(), ctx)?;
  if !nth.matches_index(index) {
    return None;
  }
  let of_spec = nth.of.as_ref().map(Specificity::max_branch).unwrap_or(Specificity::ZERO);
  Some(Specificity::CLASS + of_spec)
}

fn same_type_siblings(element: ElementId, ctx: &MatchContext) -> Vec<ElementId> {
  let doc = ctx.document;
  let data = doc.element(element);
  doc
    .sibling_elements(element)
    .into_iter()
    .filter(|&sibling| {
      let sibling_data = doc.element(sibling);
      sibling_data.tag.eq_ignore_ascii_case(&data.tag) && sibling_data.namespace == data.namespace
    })
    .collect()
}

fn type_index(element: ElementId, from_end: bool, ctx: &MatchContext) -> i32 {
  let siblings = same_type_siblings(element, ctx);
  let position = siblings
    .iter()
    .position(|&s| s == element)
    .expect("element is among its own siblings");
  if from_end {
    (siblings.len() - position) as i32
  } else {
    (position + 1) as i32
  }
}

/// Relative matching for `:has()`: starting from the scope element via the
/// argument's leading combinator (default descendant), does any element in
/// the searched subtree match?
fn match_has(scope: ElementId, list: &SelectorList, ctx: &MatchContext) -> Option<Specificity> {
  let doc = ctx.document;
  let inner = ctx.inner();
  let mut best: Option<Specificity> = None;

  for complex in &list.selectors {
    // Pseudo-elements are not real elements; a relative selector ending in
    // one can never find a witness.
    if complex.pseudo_element().is_some() {
      continue;
    }
    let leading = complex.leading.unwrap_or(Combinator::Descendant);
    let candidates: Vec<ElementId> = match leading {
      Combinator::Descendant | Combinator::Child => doc.descendant_elements(scope),
      Combinator::NextSibling | Combinator::SubsequentSibling => {
        let mut out = Vec::new();
        for sibling in doc.following_sibling_elements(scope) {
          out.push(sibling);
          out.extend(doc.descendant_elements(sibling));
        }
        out
      }
    };

    for candidate in candidates {
      if let Some(spec) = match_from(
        candidate,
        complex,
        complex.compounds.len() - 1,
        Some((scope, leading)),
        &inner,
      ) {
        best = Some(best.map_or(spec, |b| b.max(spec)));
        break; // one witness per branch is enough
      }
    }
  }
  best
}

/// RFC 4647 §3.3.2 extended filtering, which is what `:lang()` specifies.
fn lang_range_matches(range: &str, tag: &str) -> bool {
  let range_subtags: Vec<&str> = range.split('-').collect();
  let tag_subtags: Vec<&str> = tag.split('-').collect();
  if range_subtags.is_empty() || tag_subtags.is_empty() {
    return false;
  }

  if range_subtags[0] != "*" && !range_subtags[0].eq_ignore_ascii_case(tag_subtags[0]) {
    return false;
  }

  let mut range_index = 1;
  let mut tag_index = 1;
  while range_index < range_subtags.len() {
    let subtag = range_subtags[range_index];
    if subtag == "*" {
      range_index += 1;
      continue;
    }
    if tag_index >= tag_subtags.len() {
      return false;
    }
    if subtag.eq_ignore_ascii_case(tag_subtags[tag_index]) {
      range_index += 1;
      tag_index += 1;
      continue;
    }
    if tag_subtags[tag_index].len() == 1 {
      return false;
    }
    tag_index += 1;
  }
  true
}

fn is_link(element: ElementId, ctx: &MatchContext) -> bool {
  let doc = ctx.document;
  let tag = &doc.element(element).tag;
  (tag.eq_ignore_ascii_case("a") || tag.eq_ignore_ascii_case("area"))
    && doc.attribute(element, "href").is_some()
}

fn is_visited(element: ElementId, ctx: &MatchContext) -> bool {
  ctx
    .document
    .attribute(element, "href")
    .is_some_and(|href| ctx.visited.is_visited(href))
}

fn is_form_control(element: ElementId, ctx: &MatchContext) -> bool {
  let tag = &ctx.document.element(element).tag;
  ["input", "button", "select", "textarea", "optgroup", "option", "fieldset"]
    .iter()
    .any(|t| tag.eq_ignore_ascii_case(t))
}

fn is_disabled(element: ElementId, ctx: &MatchContext) -> bool {
  ctx.document.attribute(element, "disabled").is_some()
}

fn is_editable(element: ElementId, ctx: &MatchContext) -> bool {
  let doc = ctx.document;
  let tag = &doc.element(element).tag;
  let editable_control = tag.eq_ignore_ascii_case("input") || tag.eq_ignore_ascii_case("textarea");
  if editable_control {
    return doc.attribute(element, "readonly").is_none() && !is_disabled(element, ctx);
  }
  doc
    .attribute(element, "contenteditable")
    .is_some_and(|v| !v.eq_ignore_ascii_case("false"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::EngineConfig;
  use crate::dom::Document;

  fn parse(text: &str) -> SelectorList {
    SelectorList::parse(text).unwrap_or_else(|e| panic!("parse of {text:?} failed: {e}"))
  }

  fn check(doc: &Document, element: ElementId, selector: &str) -> bool {
    let config = EngineConfig::default();
    let ctx = MatchContext::new(doc, &config);
    matches(element, &parse(selector), &ctx).is_some()
  }

  /// <html><body><div class="box" id="one"><p>..</p><p lang..></p><span/></div></body></html>
  fn sample() -> (Document, ElementId, ElementId, ElementId, ElementId, ElementId) {
    let mut doc = Document::new();
    let html = doc.append_element(None, "html");
    let body = doc.append_element(Some(html), "body");
    let div = doc.append_element(Some(body), "div");
    doc.set_attribute(div, "class", "box outer");
    doc.set_attribute(div, "id", "one");
    let p1 = doc.append_element(Some(div), "p");
    doc.append_text(p1, "hello");
    let p2 = doc.append_element(Some(div), "p");
    doc.set_attribute(p2, "lang", "en-US");
    let span = doc.append_element(Some(div), "span");
    (doc, html, body, div, p1, span)
  }

  #[test]
  fn matches_type_class_id() {
    let (doc, _, _, div, p1, _) = sample();
    assert!(check(&doc, div, "div"));
    assert!(check(&doc, div, ".box"));
    assert!(check(&doc, div, "#one"));
    assert!(check(&doc, div, "div.box#one"));
    assert!(!check(&doc, div, "span"));
    assert!(!check(&doc, p1, ".box"));
    assert!(check(&doc, p1, "*"));
  }

  #[test]
  fn standards_mode_classes_are_case_sensitive() {
    let (doc, _, _, div, _, _) = sample();
    assert!(!check(&doc, div, ".BOX"));

    let config = EngineConfig::quirks();
    let ctx = MatchContext::new(&doc, &config);
    assert!(matches(div, &parse(".BOX"), &ctx).is_some());
    assert!(matches(div, &parse("#ONE"), &ctx).is_some());
  }

  #[test]
  fn combinators_walk_the_tree() {
    let (doc, _, _, _, p1, span) = sample();
    assert!(check(&doc, p1, "body p"));
    assert!(check(&doc, p1, "div > p"));
    assert!(!check(&doc, p1, "body > p"));
    assert!(check(&doc, span, "p + span"));
    assert!(check(&doc, span, "p ~ span"));
    assert!(!check(&doc, p1, "p + p")); // p1 has no preceding p
  }

  #[test]
  fn structural_pseudo_classes() {
    let (doc, html, _, _, p1, span) = sample();
    assert!(check(&doc, html, ":root"));
    assert!(check(&doc, p1, "p:first-child"));
    assert!(!check(&doc, p1, "p:last-child"));
    assert!(check(&doc, span, "span:last-child"));
    assert!(check(&doc, p1, "p:first-of-type"));
    assert!(check(&doc, span, "span:only-of-type"));
    assert!(!check(&doc, p1, "p:only-of-type"));
    assert!(!check(&doc, p1, ":empty")); // has text
    assert!(check(&doc, span, ":empty"));
  }

  #[test]
  fn nth_child_counts_elements() {
    let (doc, _, _, _, p1, span) = sample();
    assert!(check(&doc, p1, ":nth-child(1)"));
    assert!(check(&doc, span, ":nth-child(3)"));
    assert!(check(&doc, p1, ":nth-child(odd)"));
    assert!(check(&doc, span, ":nth-child(odd)"));
    assert!(check(&doc, span, ":nth-last-child(1)"));
    assert!(check(&doc, p1, ":nth-last-child(3)"));
  }

  #[test]
  fn nth_child_of_selector_filters_and_indexes() {
    // [p, p, p] with an interleaved span; `of p` ignores the span entirely.
    let mut doc = Document::new();
    let root = doc.append_element(None, "div");
    let p1 = doc.append_element(Some(root), "p");
    let _span = doc.append_element(Some(root), "span");
    let p2 = doc.append_element(Some(root), "p");
    let p3 = doc.append_element(Some(root), "p");

    // Example: p:nth-last-child(2 of p) selects the second-to-last p.
    assert!(!check(&doc, p1, "p:nth-last-child(2 of p)"));
    assert!(check(&doc, p2, "p:nth-last-child(2 of p)"));
    assert!(!check(&doc, p3, "p:nth-last-child(2 of p)"));

    assert!(check(&doc, p2, ":nth-child(2 of p)"));
    // The span is not in the `of p` set at all.
    assert!(!check(&doc, _span, ":nth-child(2 of p)"));
  }

  #[test]
  fn logical_pseudo_classes() {
    let (doc, _, _, div, p1, _) = sample();
    assert!(check(&doc, div, ":is(span, div)"));
    assert!(check(&doc, div, ":where(div)"));
    assert!(check(&doc, p1, ":not(span, .box)"));
    assert!(!check(&doc, p1, ":not(p)"));
    assert!(check(&doc, p1, ":is(div > p)"));
  }

  #[test]
  fn has_relative_matching() {
    let (doc, _, body, div, p1, _) = sample();
    assert!(check(&doc, div, "div:has(p)"));
    assert!(check(&doc, div, "div:has(> p)"));
    assert!(check(&doc, body, "body:has(p)"));
    assert!(!check(&doc, body, "body:has(> p)")); // p is a grandchild
    assert!(check(&doc, p1, "p:has(+ p)"));
    assert!(!check(&doc, div, "div:has(table)"));
  }

  #[test]
  fn lang_matching_uses_extended_filtering() {
    let (doc, _, _, _, _, _) = sample();
    let mut doc = doc;
    let html = ElementId(0);
    doc.set_attribute(html, "lang", "de-Latn-DE");
    let body = ElementId(1);
    assert!(check(&doc, body, ":lang(de)"));
    assert!(check(&doc, body, ":lang(\"*-Latn\")"));
    assert!(check(&doc, body, ":lang(de-DE)")); // Latn skipped per RFC 4647
    assert!(!check(&doc, body, ":lang(fr)"));
    assert!(check(&doc, body, ":lang(fr, de)"));
  }

  #[test]
  fn lang_matches_element_own_attribute() {
    let (doc, _, _, _, _, _) = sample();
    let p2 = ElementId(5); // p with lang="en-US" (after p1's text node)
    assert!(check(&doc, p2, ":lang(en)"));
    assert!(check(&doc, p2, ":lang(en-US)"));
    assert!(!check(&doc, p2, ":lang(en-GB)"));
  }

  #[test]
  fn attribute_operator_matching() {
    let mut doc = Document::new();
    let el = doc.append_element(None, "a");
    doc.set_attribute(el, "href", "https://example.com/doc.pdf");
    doc.set_attribute(el, "class", "alpha beta");
    doc.set_attribute(el, "hreflang", "en-US");

    assert!(check(&doc, el, "[href]"));
    assert!(check(&doc, el, "[class~=\"beta\"]"));
    assert!(!check(&doc, el, "[class~=\"bet\"]"));
    assert!(check(&doc, el, "[hreflang|=\"en\"]"));
    assert!(check(&doc, el, "[href^=\"https\"]"));
    assert!(check(&doc, el, "[href$=\".pdf\"]"));
    assert!(check(&doc, el, "[href*=\"example\"]"));
    assert!(!check(&doc, el, "[href^=\"HTTPS\"]"));
    assert!(check(&doc, el, "[href^=\"HTTPS\" i]"));
  }

  #[test]
  fn undeclared_namespace_never_matches() {
    let (doc, _, _, div, _, _) = sample();
    assert!(!check(&doc, div, "nope|div"));
    // The sample elements are in the HTML namespace, so `|div` (no
    // namespace) must not match either.
    assert!(!check(&doc, div, "|div"));
  }

  #[test]
  fn link_state_pseudo_classes() {
    struct Oracle;
    impl VisitedOracle for Oracle {
      fn is_visited(&self, href: &str) -> bool {
        href.contains("seen")
      }
    }

    let mut doc = Document::new();
    let root = doc.append_element(None, "body");
    let fresh = doc.append_element(Some(root), "a");
    doc.set_attribute(fresh, "href", "https://example.com/new");
    let seen = doc.append_element(Some(root), "a");
    doc.set_attribute(seen, "href", "https://example.com/seen");
    let anchor = doc.append_element(Some(root), "a"); // no href

    let config = EngineConfig::default();
    let ctx = MatchContext::new(&doc, &config).with_visited_oracle(&Oracle);
    assert!(matches(fresh, &parse(":any-link"), &ctx).is_some());
    assert!(matches(fresh, &parse(":link"), &ctx).is_some());
    assert!(matches(fresh, &parse(":visited"), &ctx).is_none());
    assert!(matches(seen, &parse(":visited"), &ctx).is_some());
    assert!(matches(seen, &parse(":link"), &ctx).is_none());
    assert!(matches(anchor, &parse(":any-link"), &ctx).is_none());
  }

  #[test]
  fn dynamic_states_come_from_the_provider() {
    struct Hovered(ElementId);
    impl ElementStateProvider for Hovered {
      fn matches_state(&self, element: ElementId, state: &str) -> bool {
        element == self.0 && state == "hover"
      }
    }

    let (doc, _, _, div, p1, _) = sample();
    let config = EngineConfig::default();
    let provider = Hovered(div);
    let ctx = MatchContext::new(&doc, &config).with_state_provider(&provider);
    assert!(matches(div, &parse("div:hover"), &ctx).is_some());
    assert!(matches(p1, &parse("p:hover"), &ctx).is_none());
    assert!(matches(div, &parse("div:focus"), &ctx).is_none());
  }

  #[test]
  fn form_state_pseudo_classes() {
    let mut doc = Document::new();
    let form = doc.append_element(None, "form");
    let enabled = doc.append_element(Some(form), "input");
    let disabled = doc.append_element(Some(form), "input");
    doc.set_attribute(disabled, "disabled", "");
    let checked = doc.append_element(Some(form), "input");
    doc.set_attribute(checked, "checked", "");
    let readonly = doc.append_element(Some(form), "input");
    doc.set_attribute(readonly, "readonly", "");
    let placeholder = doc.append_element(Some(form), "input");
    doc.set_attribute(placeholder, "placeholder", "Search");

    assert!(check(&doc, enabled, ":enabled"));
    assert!(!check(&doc, enabled, ":disabled"));
    assert!(check(&doc, disabled, ":disabled"));
    assert!(check(&doc, checked, ":checked"));
    assert!(check(&doc, enabled, ":read-write"));
    assert!(check(&doc, readonly, ":read-only"));
    assert!(check(&doc, placeholder, ":placeholder-shown"));
    // Forms themselves are not editable controls.
    assert!(check(&doc, form, ":read-only"));
  }

  #[test]
  fn pseudo_element_context_must_match_exactly() {
    let (doc, _, _, div, _, _) = sample();
    let config = EngineConfig::default();

    let element_ctx = MatchContext::new(&doc, &config);
    assert!(matches(div, &parse("div::before"), &element_ctx).is_none());

    let before_ctx = MatchContext::new(&doc, &config).for_pseudo_element(Some(PseudoElement::Before));
    assert!(matches(div, &parse("div::before"), &before_ctx).is_some());
    assert!(matches(div, &parse("div"), &before_ctx).is_none());
    assert!(matches(div, &parse("div::after"), &before_ctx).is_none());
  }

  #[test]
  fn first_match_index_and_match_all_specificity() {
    let (doc, _, _, div, _, _) = sample();
    let config = EngineConfig::default();
    let ctx = MatchContext::new(&doc, &config);

    let list = parse("span, .box, #one");
    assert_eq!(matches(div, &list, &ctx), Some(1));

    let all = match_all(div, &list, &ctx);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0], (1, Specificity(0, 1, 0)));
    assert_eq!(all[1], (2, Specificity(1, 0, 0)));
  }

  #[test]
  fn is_contributes_matching_branch_specificity() {
    let (doc, _, _, div, _, _) = sample();
    let config = EngineConfig::default();
    let ctx = MatchContext::new(&doc, &config);

    // #one matches, span#nope does not: contribution is (1,0,0) not (1,0,1).
    let list = parse(":is(#one, span#nope.x)");
    let all = match_all(div, &list, &ctx);
    assert_eq!(all, vec![(0, Specificity(1, 0, 0))]);

    // :where always contributes zero.
    let list = parse(":where(#one, span#nope.x)");
    let all = match_all(div, &list, &ctx);
    assert_eq!(all, vec![(0, Specificity(0, 0, 0))]);
  }

  #[test]
  fn blank_matches_whitespace_only_elements() {
    let mut doc = Document::new();
    let root = doc.append_element(None, "div");
    let ws = doc.append_element(Some(root), "p");
    doc.append_text(ws, "  \n ");
    assert!(check(&doc, ws, ":blank"));
    assert!(!check(&doc, ws, ":empty"));
  }
}
