use marker_common::{walk_element, Visitor};
use marker_parser::ast::{Document, ElementNode, NodeId};
use std::collections::HashMap;

/// Index from identity token to live node, rebuilt wholesale every time
/// the store accepts a new document.
///
/// Nodes are addressed by their child-index path from the root, which
/// stays valid for the lifetime of one document generation: live gestures
/// mutate attributes only, never structure. Ids resolve both the
/// synthesized internal id and the author id of every element; duplicate
/// author ids get deterministic `-2`, `-3`… aliases in document order,
/// first seen wins the plain name.
#[derive(Debug, Default)]
pub struct ElementRegistry {
    paths: HashMap<NodeId, Vec<usize>>,
    ids: HashMap<String, NodeId>,
}

impl ElementRegistry {
    pub fn build(root: &ElementNode) -> Self {
        let mut builder = RegistryBuilder {
            registry: ElementRegistry::default(),
            path: Vec::new(),
        };
        builder.visit_element(root);
        builder.registry
    }

    pub fn contains(&self, token: NodeId) -> bool {
        self.paths.contains_key(&token)
    }

    pub fn resolve_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    pub fn element<'doc>(&self, document: &'doc Document, token: NodeId) -> Option<&'doc ElementNode> {
        let path = self.paths.get(&token)?;
        let mut node = &document.root;
        for &index in path {
            node = node.children.get(index)?;
        }
        (node.token == token).then_some(node)
    }

    pub fn element_mut<'doc>(
        &self,
        document: &'doc mut Document,
        token: NodeId,
    ) -> Option<&'doc mut ElementNode> {
        let path = self.paths.get(&token)?;
        let mut node = &mut document.root;
        for &index in path {
            node = node.children.get_mut(index)?;
        }
        (node.token == token).then_some(node)
    }

    pub fn tokens(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.paths.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn insert(&mut self, element: &ElementNode, path: &[usize]) {
        self.paths.insert(element.token, path.to_vec());
        self.ids.insert(element.internal_id.clone(), element.token);

        if let Some(original) = &element.original_id {
            if !self.ids.contains_key(original) {
                self.ids.insert(original.clone(), element.token);
            } else {
                let mut suffix = 2;
                loop {
                    let alias = format!("{}-{}", original, suffix);
                    if !self.ids.contains_key(&alias) {
                        self.ids.insert(alias, element.token);
                        break;
                    }
                    suffix += 1;
                }
            }
        }
    }
}

/// Document-order walk that threads the child-index path.
///
/// On entry `path` addresses the node being visited; the trailing slot is
/// the child cursor its parent is advancing.
struct RegistryBuilder {
    registry: ElementRegistry,
    path: Vec<usize>,
}

impl Visitor for RegistryBuilder {
    fn visit_element(&mut self, element: &ElementNode) {
        self.registry.insert(element, &self.path);
        self.path.push(0);
        walk_element(self, element);
        self.path.pop();
        if let Some(cursor) = self.path.last_mut() {
            *cursor += 1;
        }
    }
}
