use marker_parser::ast::ElementNode;

/// Visitor pattern for traversing the working tree immutably
///
/// The default implementation walks the entire tree in document order.
/// Override `visit_element` to act on nodes, calling `walk_element` to
/// keep descending.
pub trait Visitor: Sized {
    fn visit_element(&mut self, element: &ElementNode) {
        walk_element(self, element);
    }
}

/// Mutable companion of [`Visitor`] for in-place transformations
pub trait VisitorMut: Sized {
    fn visit_element_mut(&mut self, element: &mut ElementNode) {
        walk_element_mut(self, element);
    }
}

pub fn walk_element<V: Visitor>(visitor: &mut V, element: &ElementNode) {
    for child in &element.children {
        visitor.visit_element(child);
    }
}

pub fn walk_element_mut<V: VisitorMut>(visitor: &mut V, element: &mut ElementNode) {
    for child in &mut element.children {
        visitor.visit_element_mut(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_parser::parse;

    struct TagCollector {
        tags: Vec<String>,
    }

    impl Visitor for TagCollector {
        fn visit_element(&mut self, element: &ElementNode) {
            self.tags.push(element.tag_name.clone());
            walk_element(self, element);
        }
    }

    struct FillPainter;

    impl VisitorMut for FillPainter {
        fn visit_element_mut(&mut self, element: &mut ElementNode) {
            element.attributes.set("fill", "black");
            walk_element_mut(self, element);
        }
    }

    #[test]
    fn test_visitor_walks_in_document_order() {
        let doc = parse("<svg><g><rect/></g><circle/></svg>").document.unwrap();
        let mut collector = TagCollector { tags: Vec::new() };
        collector.visit_element(&doc.root);
        assert_eq!(collector.tags, vec!["svg", "g", "rect", "circle"]);
    }

    #[test]
    fn test_visitor_mut_reaches_every_node() {
        let mut doc = parse("<svg><g><rect/></g></svg>").document.unwrap();
        FillPainter.visit_element_mut(&mut doc.root);
        assert_eq!(doc.root.children[0].children[0].attributes.get("fill"), Some("black"));
    }
}
