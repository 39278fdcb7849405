use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity token for one element.
///
/// Tokens are unique within a document and survive serialize→parse round
/// trips when the markup is emitted with `keep_uuid`. They are independent
/// of any author-visible `id` attribute and are never written to exported
/// markup by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Creates a fresh token, unique for all practical purposes
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a token from its serialized marker form
    pub fn parse_str(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shape classification derived from the tag name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Rect,
    Circle,
    Ellipse,
    Line,
    Group,
    Text,
    /// Any tag the editor has no special handling for, including the root
    Other,
}

impl ElementKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "rect" => ElementKind::Rect,
            "circle" => ElementKind::Circle,
            "ellipse" => ElementKind::Ellipse,
            "line" => ElementKind::Line,
            "g" => ElementKind::Group,
            "text" => ElementKind::Text,
            _ => ElementKind::Other,
        }
    }

    /// Tag name used for elements created by drawing tools
    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Rect => "rect",
            ElementKind::Circle => "circle",
            ElementKind::Ellipse => "ellipse",
            ElementKind::Line => "line",
            ElementKind::Group => "g",
            ElementKind::Text => "text",
            ElementKind::Other => "g",
        }
    }
}

/// A single `name="value"` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Order-preserving attribute map.
///
/// Serialization must reproduce attributes in their insertion order so
/// repeated round trips reach a fixed point, which rules out a hash map.
/// Elements carry few attributes, so linear scans are fine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributeList {
    entries: Vec<Attribute>,
}

impl AttributeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Updates in place when the attribute exists, appends otherwise
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value,
            None => self.entries.push(Attribute { name, value }),
        }
    }

    /// Removes an attribute, preserving the order of the rest
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.entries.iter().position(|a| a.name == name)?;
        Some(self.entries.remove(index).value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|a| a.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One element of the working tree.
///
/// The node owns its children exclusively. `internal_id` is the synthesized
/// addressing id (unique within the document, deterministic in document
/// order); `original_id` mirrors the author's `id` attribute, which stays
/// untouched in `attributes` so exports never diverge from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: ElementKind,
    pub tag_name: String,
    pub token: NodeId,
    pub internal_id: String,
    pub original_id: Option<String>,
    pub attributes: AttributeList,
    /// Trimmed character data, present on text-bearing elements
    pub text: Option<String>,
    pub children: Vec<ElementNode>,
}

impl ElementNode {
    pub fn new(tag_name: impl Into<String>) -> Self {
        let tag_name = tag_name.into();
        Self {
            kind: ElementKind::from_tag(&tag_name),
            tag_name,
            token: NodeId::new(),
            internal_id: String::new(),
            original_id: None,
            attributes: AttributeList::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn find_by_token(&self, token: NodeId) -> Option<&ElementNode> {
        if self.token == token {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find_by_token(token))
    }

    pub fn find_by_token_mut(&mut self, token: NodeId) -> Option<&mut ElementNode> {
        if self.token == token {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_by_token_mut(token))
    }

    /// Detaches the direct or indirect descendant carrying `token`.
    /// Returns `None` when the token is absent or names this node itself.
    pub fn remove_descendant(&mut self, token: NodeId) -> Option<ElementNode> {
        if let Some(index) = self.children.iter().position(|c| c.token == token) {
            return Some(self.children.remove(index));
        }
        self.children
            .iter_mut()
            .find_map(|child| child.remove_descendant(token))
    }

    /// Total number of elements in this subtree, including self
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(ElementNode::subtree_len)
            .sum::<usize>()
    }
}

/// The working document: owned tree plus its raw-text mirror.
///
/// Replaced wholesale on every accepted parse; the store stamps
/// `generation` when it takes ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub root: ElementNode,
    pub raw: String,
    pub generation: u64,
}

impl Document {
    pub fn new(root: ElementNode, raw: impl Into<String>) -> Self {
        Self {
            root,
            raw: raw.into(),
            generation: 0,
        }
    }

    pub fn find_by_token(&self, token: NodeId) -> Option<&ElementNode> {
        self.root.find_by_token(token)
    }

    pub fn find_by_token_mut(&mut self, token: NodeId) -> Option<&mut ElementNode> {
        self.root.find_by_token_mut(token)
    }

    pub fn element_count(&self) -> usize {
        self.root.subtree_len()
    }
}

/// Display-only outline of the document, rebuilt on every replacement
/// rather than patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub id: String,
    pub tag: String,
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn from_element(element: &ElementNode) -> Self {
        Self {
            id: element.internal_id.clone(),
            tag: element.tag_name.clone(),
            children: element
                .children
                .iter()
                .map(HierarchyNode::from_element)
                .collect(),
        }
    }
}
