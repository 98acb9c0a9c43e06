//! Read-only document/element abstraction
//!
//! The engine does not own a DOM; it consumes one. [`Document`] is a minimal
//! arena tree providing exactly what the matcher and resolver need: ordered
//! ancestor/sibling/child navigation, namespace-aware attribute lookup, tag
//! names, and element state flags. Dynamic state pseudo-classes (`:hover`,
//! `:focus`, ...) and `:visited` are answered by external providers keyed by
//! element identity; the engine never computes them from tree structure.

pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Opaque element identity within one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

/// A namespace-qualified attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
  /// Namespace URI; `None` for attributes in no namespace (the common case).
  pub namespace: Option<String>,
  pub name: String,
  pub value: String,
}

/// Boolean state flags an embedder can set per element.
///
/// These back the link/state pseudo-classes that are not derivable from
/// attributes alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElementState {
  /// Element is the target of the document's fragment URL (`:target`).
  pub target: bool,
  /// Checkbox in the indeterminate state (`:indeterminate`).
  pub indeterminate: bool,
  /// Default control among a group (`:default`).
  pub default: bool,
}

#[derive(Debug, Clone)]
enum NodeData {
  Element(ElementData),
  Text(String),
}

#[derive(Debug, Clone)]
pub struct ElementData {
  pub tag: String,
  /// Namespace URI of the element itself.
  pub namespace: Option<String>,
  pub attributes: Vec<Attribute>,
  pub state: ElementState,
}

#[derive(Debug, Clone)]
struct Node {
  parent: Option<usize>,
  children: Vec<usize>,
  data: NodeData,
}

/// A minimal arena-backed document tree.
///
/// Nodes are appended in document order; element ids are stable for the
/// lifetime of the document. The engine treats the tree as immutable during
/// a query; callers that mutate it must re-query (computed styles are never
/// cached internally).
#[derive(Debug, Clone, Default)]
pub struct Document {
  nodes: Vec<Node>,
}

impl Document {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append an element under `parent` (or as a root when `None`).
  pub fn append_element(&mut self, parent: Option<ElementId>, tag: &str) -> ElementId {
    self.append_element_ns(parent, tag, Some(HTML_NAMESPACE))
  }

  /// Append an element with an explicit namespace URI.
  pub fn append_element_ns(
    &mut self,
    parent: Option<ElementId>,
    tag: &str,
    namespace: Option<&str>,
  ) -> ElementId {
    let id = self.nodes.len();
    self.nodes.push(Node {
      parent: parent.map(|p| p.0),
      children: Vec::new(),
      data: NodeData::Element(ElementData {
        tag: tag.to_string(),
        namespace: namespace.map(str::to_string),
        attributes: Vec::new(),
        state: ElementState::default(),
      }),
    });
    if let Some(p) = parent {
      self.nodes[p.0].children.push(id);
    }
    ElementId(id)
  }

  /// Append a text node under `parent`.
  pub fn append_text(&mut self, parent: ElementId, text: &str) {
    let id = self.nodes.len();
    self.nodes.push(Node {
      parent: Some(parent.0),
      children: Vec::new(),
      data: NodeData::Text(text.to_string()),
    });
    self.nodes[parent.0].children.push(id);
  }

  pub fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
    self.set_attribute_ns(element, None, name, value);
  }

  pub fn set_attribute_ns(
    &mut self,
    element: ElementId,
    namespace: Option<&str>,
    name: &str,
    value: &str,
  ) {
    if let NodeData::Element(data) = &mut self.nodes[element.0].data {
      if let Some(attr) = data
        .attributes
        .iter_mut()
        .find(|a| a.name == name && a.namespace.as_deref() == namespace)
      {
        attr.value = value.to_string();
        return;
      }
      data.attributes.push(Attribute {
        namespace: namespace.map(str::to_string),
        name: name.to_string(),
        value: value.to_string(),
      });
    }
  }

  pub fn remove_attribute(&mut self, element: ElementId, name: &str) {
    if let NodeData::Element(data) = &mut self.nodes[element.0].data {
      data.attributes.retain(|a| a.name != name);
    }
  }

  pub fn set_state(&mut self, element: ElementId, state: ElementState) {
    if let NodeData::Element(data) = &mut self.nodes[element.0].data {
      data.state = state;
    }
  }

  // Accessors

  pub fn element(&self, id: ElementId) -> &ElementData {
    match &self.nodes[id.0].data {
      NodeData::Element(data) => data,
      NodeData::Text(_) => panic!("node {} is not an element", id.0),
    }
  }

  pub fn is_element(&self, id: ElementId) -> bool {
    matches!(self.nodes[id.0].data, NodeData::Element(_))
  }

  pub fn tag_name(&self, id: ElementId) -> &str {
    &self.element(id).tag
  }

  /// Attribute lookup in no namespace.
  pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
    self
      .element(id)
      .attributes
      .iter()
      .find(|a| a.namespace.is_none() && a.name == name)
      .map(|a| a.value.as_str())
  }

  /// Attribute lookup constrained to a namespace URI (`None` = no namespace).
  pub fn attribute_ns(&self, id: ElementId, namespace: Option<&str>, name: &str) -> Option<&str> {
    self
      .element(id)
      .attributes
      .iter()
      .find(|a| a.namespace.as_deref() == namespace && a.name == name)
      .map(|a| a.value.as_str())
  }

  /// Attribute lookup in any namespace.
  pub fn attribute_any_ns(&self, id: ElementId, name: &str) -> Option<&str> {
    self
      .element(id)
      .attributes
      .iter()
      .find(|a| a.name == name)
      .map(|a| a.value.as_str())
  }

  pub fn parent_element(&self, id: ElementId) -> Option<ElementId> {
    let parent = self.nodes[id.0].parent?;
    match self.nodes[parent].data {
      NodeData::Element(_) => Some(ElementId(parent)),
      NodeData::Text(_) => None,
    }
  }

  /// Ancestor elements, nearest first.
  pub fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
    let mut out = Vec::new();
    let mut current = id;
    while let Some(parent) = self.parent_element(current) {
      out.push(parent);
      current = parent;
    }
    out
  }

  /// True when `ancestor` is a proper ancestor of `id`.
  pub fn is_ancestor(&self, ancestor: ElementId, id: ElementId) -> bool {
    let mut current = id;
    while let Some(parent) = self.parent_element(current) {
      if parent == ancestor {
        return true;
      }
      current = parent;
    }
    false
  }

  /// Child elements in document order (text nodes skipped).
  pub fn child_elements(&self, id: ElementId) -> Vec<ElementId> {
    self.nodes[id.0]
      .children
      .iter()
      .copied()
      .filter(|&c| matches!(self.nodes[c].data, NodeData::Element(_)))
      .map(ElementId)
      .collect()
  }

  /// Element siblings (including `id` itself) in document order, or a
  /// single-element list for a root.
  pub fn sibling_elements(&self, id: ElementId) -> Vec<ElementId> {
    match self.parent_element(id) {
      Some(parent) => self.child_elements(parent),
      None => vec![id],
    }
  }

  /// The nearest preceding element sibling.
  pub fn previous_sibling_element(&self, id: ElementId) -> Option<ElementId> {
    let siblings = self.sibling_elements(id);
    let pos = siblings.iter().position(|&s| s == id)?;
    pos.checked_sub(1).map(|p| siblings[p])
  }

  /// All preceding element siblings, nearest first.
  pub fn preceding_sibling_elements(&self, id: ElementId) -> Vec<ElementId> {
    let siblings = self.sibling_elements(id);
    let pos = siblings.iter().position(|&s| s == id).unwrap_or(0);
    siblings[..pos].iter().rev().copied().collect()
  }

  /// All following element siblings in document order.
  pub fn following_sibling_elements(&self, id: ElementId) -> Vec<ElementId> {
    let siblings = self.sibling_elements(id);
    match siblings.iter().position(|&s| s == id) {
      Some(pos) => siblings[pos + 1..].to_vec(),
      None => Vec::new(),
    }
  }

  /// Strict descendants of `id` in document order.
  pub fn descendant_elements(&self, id: ElementId) -> Vec<ElementId> {
    let mut out = Vec::new();
    let mut stack: Vec<usize> = self.nodes[id.0].children.iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
      if matches!(self.nodes[node].data, NodeData::Element(_)) {
        out.push(ElementId(node));
      }
      for child in self.nodes[node].children.iter().rev() {
        stack.push(*child);
      }
    }
    out
  }

  /// True when the element has no children at all (no elements, no text).
  pub fn is_empty(&self, id: ElementId) -> bool {
    self.nodes[id.0].children.is_empty()
  }

  /// True when children are at most whitespace-only text nodes.
  pub fn is_blank(&self, id: ElementId) -> bool {
    self.nodes[id.0].children.iter().all(|&c| match &self.nodes[c].data {
      NodeData::Element(_) => false,
      NodeData::Text(text) => text.chars().all(char::is_whitespace),
    })
  }

  /// True when the element has no parent element (document root).
  pub fn is_root(&self, id: ElementId) -> bool {
    self.parent_element(id).is_none()
  }

  /// The language of an element: nearest `lang`/`xml:lang` attribute on the
  /// element or its ancestors.
  pub fn language(&self, id: ElementId) -> Option<&str> {
    let mut current = Some(id);
    while let Some(el) = current {
      if let Some(lang) = self
        .attribute(el, "lang")
        .or_else(|| self.attribute_any_ns(el, "xml:lang"))
      {
        if !lang.is_empty() {
          return Some(lang);
        }
      }
      current = self.parent_element(el);
    }
    None
  }

  /// All elements in document order.
  pub fn all_elements(&self) -> Vec<ElementId> {
    (0..self.nodes.len())
      .filter(|&i| matches!(self.nodes[i].data, NodeData::Element(_)))
      .map(ElementId)
      .collect()
  }

  pub fn state(&self, id: ElementId) -> ElementState {
    self.element(id).state
  }
}

/// Answers dynamic state pseudo-class queries (`:hover`, `:active`,
/// `:focus`, ...). The matcher treats these as externally supplied boolean
/// predicates, never derived from tree structure.
pub trait ElementStateProvider {
  fn matches_state(&self, element: ElementId, state: &str) -> bool;
}

/// Answers `:visited` for link elements, keyed by the link's href.
pub trait VisitedOracle {
  fn is_visited(&self, href: &str) -> bool;
}

/// Default providers: no dynamic state matches, no URL is visited.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoState;

impl ElementStateProvider for NoState {
  fn matches_state(&self, _element: ElementId, _state: &str) -> bool {
    false
  }
}

impl VisitedOracle for NoState {
  fn is_visited(&self, _href: &str) -> bool {
    false
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> (Document, ElementId, ElementId, ElementId, ElementId) {
    let mut doc = Document::new();
    let root = doc.append_element(None, "html");
    let body = doc.append_element(Some(root), "body");
    let p1 = doc.append_element(Some(body), "p");
    let p2 = doc.append_element(Some(body), "p");
    (doc, root, body, p1, p2)
  }

  #[test]
  fn navigation_basics() {
    let (doc, root, body, p1, p2) = sample();
    assert_eq!(doc.parent_element(p1), Some(body));
    assert_eq!(doc.ancestors(p2), vec![body, root]);
    assert_eq!(doc.child_elements(body), vec![p1, p2]);
    assert_eq!(doc.previous_sibling_element(p2), Some(p1));
    assert_eq!(doc.previous_sibling_element(p1), None);
    assert!(doc.is_root(root));
    assert!(!doc.is_root(body));
  }

  #[test]
  fn empty_and_blank_distinguish_whitespace_text() {
    let mut doc = Document::new();
    let root = doc.append_element(None, "div");
    let a = doc.append_element(Some(root), "span");
    let b = doc.append_element(Some(root), "span");
    doc.append_text(b, "   \n  ");
    let c = doc.append_element(Some(root), "span");
    doc.append_text(c, "text");

    assert!(doc.is_empty(a) && doc.is_blank(a));
    assert!(!doc.is_empty(b) && doc.is_blank(b));
    assert!(!doc.is_empty(c) && !doc.is_blank(c));
  }

  #[test]
  fn language_walks_ancestors() {
    let mut doc = Document::new();
    let root = doc.append_element(None, "html");
    doc.set_attribute(root, "lang", "en-US");
    let body = doc.append_element(Some(root), "body");
    let p = doc.append_element(Some(body), "p");
    assert_eq!(doc.language(p), Some("en-US"));
    doc.set_attribute(body, "lang", "de");
    assert_eq!(doc.language(p), Some("de"));
  }

  #[test]
  fn namespaced_attribute_lookup() {
    let mut doc = Document::new();
    let el = doc.append_element(None, "svg");
    doc.set_attribute_ns(el, Some("http://example.com/ns"), "data", "1");
    assert_eq!(doc.attribute(el, "data"), None);
    assert_eq!(doc.attribute_ns(el, Some("http://example.com/ns"), "data"), Some("1"));
    assert_eq!(doc.attribute_any_ns(el, "data"), Some("1"));
  }
}
