use crate::ast::{ElementNode, NodeId};
use std::collections::{HashMap, HashSet};

/// Attribute name carrying the identity token across internal round trips.
/// Never present in exported markup.
pub const UUID_ATTR: &str = "data-uuid";

/// Stamps identity onto a freshly parsed tree.
///
/// Elements that arrived with a `data-uuid` marker (a re-serialized working
/// copy) keep their token; everything else gets a fresh one. Every element
/// also receives a deterministic `{tag}-{n}` internal id, assigned in
/// document order and guaranteed not to collide with any author-supplied
/// id in the document. Author ids themselves are left in place and only
/// mirrored into the `original_id` slot. There is no failure mode here:
/// malformed markers and duplicate ids are resolved, never rejected.
pub struct IdentityAssigner {
    counters: HashMap<String, u32>,
    seen_tokens: HashSet<NodeId>,
    author_ids: HashSet<String>,
}

impl IdentityAssigner {
    pub fn new() -> Self {
        Self {
            counters: HashMap::new(),
            seen_tokens: HashSet::new(),
            author_ids: HashSet::new(),
        }
    }

    /// Walks the tree once to learn author ids, then stamps every element
    /// in document order.
    pub fn assign_document(&mut self, root: &mut ElementNode) {
        self.collect_author_ids(root);
        self.stamp(root);
    }

    fn collect_author_ids(&mut self, node: &ElementNode) {
        if let Some(id) = node.attributes.get("id") {
            self.author_ids.insert(id.to_string());
        }
        for child in &node.children {
            self.collect_author_ids(child);
        }
    }

    fn stamp(&mut self, node: &mut ElementNode) {
        // A marker from a previous serialization wins over the placeholder
        // token the parser created, unless another element claimed it first.
        if let Some(raw) = node.attributes.remove(UUID_ATTR) {
            if let Some(token) = NodeId::parse_str(&raw) {
                if !self.seen_tokens.contains(&token) {
                    node.token = token;
                }
            }
        }
        self.seen_tokens.insert(node.token);

        node.original_id = node.attributes.get("id").map(str::to_string);
        node.internal_id = self.next_internal_id(&node.tag_name);

        for child in &mut node.children {
            self.stamp(child);
        }
    }

    fn next_internal_id(&mut self, tag: &str) -> String {
        let counter = self.counters.entry(tag.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{}-{}", tag, counter);
            if !self.author_ids.contains(&candidate) {
                return candidate;
            }
        }
    }
}

impl Default for IdentityAssigner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ElementNode;

    fn tree(tags: &[&str]) -> ElementNode {
        let mut root = ElementNode::new("svg");
        for tag in tags {
            root.children.push(ElementNode::new(*tag));
        }
        root
    }

    #[test]
    fn test_internal_ids_are_deterministic() {
        let mut root = tree(&["rect", "rect", "circle"]);
        IdentityAssigner::new().assign_document(&mut root);

        assert_eq!(root.internal_id, "svg-1");
        assert_eq!(root.children[0].internal_id, "rect-1");
        assert_eq!(root.children[1].internal_id, "rect-2");
        assert_eq!(root.children[2].internal_id, "circle-1");
    }

    #[test]
    fn test_author_id_moves_to_original_slot() {
        let mut root = tree(&["rect"]);
        root.children[0].attributes.set("id", "hero");
        IdentityAssigner::new().assign_document(&mut root);

        let rect = &root.children[0];
        assert_eq!(rect.original_id.as_deref(), Some("hero"));
        // The attribute itself stays as authored
        assert_eq!(rect.attributes.get("id"), Some("hero"));
        assert_eq!(rect.internal_id, "rect-1");
    }

    #[test]
    fn test_marker_attribute_is_consumed() {
        let mut root = tree(&["rect"]);
        let token = NodeId::new();
        root.children[0].attributes.set(UUID_ATTR, token.to_string());
        IdentityAssigner::new().assign_document(&mut root);

        assert_eq!(root.children[0].token, token);
        assert!(!root.children[0].attributes.contains(UUID_ATTR));
    }

    #[test]
    fn test_duplicate_marker_gets_fresh_token() {
        let mut root = tree(&["rect", "rect"]);
        let token = NodeId::new();
        root.children[0].attributes.set(UUID_ATTR, token.to_string());
        root.children[1].attributes.set(UUID_ATTR, token.to_string());
        IdentityAssigner::new().assign_document(&mut root);

        assert_eq!(root.children[0].token, token);
        assert_ne!(root.children[1].token, token);
    }

    #[test]
    fn test_invalid_marker_is_ignored() {
        let mut root = tree(&["rect"]);
        root.children[0].attributes.set(UUID_ATTR, "not-a-uuid");
        let before = root.children[0].token;
        IdentityAssigner::new().assign_document(&mut root);

        assert_eq!(root.children[0].token, before);
        assert!(!root.children[0].attributes.contains(UUID_ATTR));
    }

    #[test]
    fn test_internal_id_skips_author_collision() {
        let mut root = tree(&["rect", "rect"]);
        root.children[0].attributes.set("id", "rect-1");
        IdentityAssigner::new().assign_document(&mut root);

        // rect-1 is claimed by the author, so synthesis jumps past it
        assert_eq!(root.children[0].internal_id, "rect-2");
        assert_eq!(root.children[1].internal_id, "rect-3");
    }
}
