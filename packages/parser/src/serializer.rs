use crate::ast::{Document, ElementNode};
use crate::identity::UUID_ATTR;

/// Controls what the serializer emits alongside plain markup.
///
/// The default strips identity markers, which is what file export wants:
/// persisted markup stays pure. Internal round trips across the gesture
/// and history boundary set `keep_uuid` so tokens survive the reparse.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializeOptions {
    pub keep_uuid: bool,
}

/// Serializes a document back to markup text.
pub fn serialize(document: &Document, options: SerializeOptions) -> String {
    Serializer::new(options).serialize(&document.root)
}

/// Converts the working tree back to markup.
///
/// Attribute insertion order and child order are reproduced exactly, so a
/// document that has been through one round trip serializes to the same
/// bytes every time after.
pub struct Serializer {
    indent_string: String,
    keep_uuid: bool,
}

impl Serializer {
    pub fn new(options: SerializeOptions) -> Self {
        Self {
            indent_string: "  ".to_string(),
            keep_uuid: options.keep_uuid,
        }
    }

    pub fn with_indent(indent: &str, options: SerializeOptions) -> Self {
        Self {
            indent_string: indent.to_string(),
            keep_uuid: options.keep_uuid,
        }
    }

    pub fn serialize(&self, root: &ElementNode) -> String {
        let mut output = String::new();
        self.serialize_element(root, 0, &mut output);
        output.push('\n');
        output
    }

    fn serialize_element(&self, node: &ElementNode, depth: usize, output: &mut String) {
        for _ in 0..depth {
            output.push_str(&self.indent_string);
        }

        output.push('<');
        output.push_str(&node.tag_name);

        // The marker leads the attribute list so a kept-uuid round trip
        // reproduces itself byte for byte.
        if self.keep_uuid {
            output.push(' ');
            output.push_str(UUID_ATTR);
            output.push_str("=\"");
            output.push_str(&node.token.to_string());
            output.push('"');
        }

        for attr in node.attributes.iter() {
            output.push(' ');
            output.push_str(&attr.name);
            output.push_str("=\"");
            output.push_str(&escape_attribute(&attr.value));
            output.push('"');
        }

        if node.children.is_empty() && node.text.is_none() {
            output.push_str("/>");
            return self.terminate_line(depth, output);
        }

        output.push('>');

        if let Some(text) = &node.text {
            output.push_str(&escape_text(text));
            if node.children.is_empty() {
                output.push_str("</");
                output.push_str(&node.tag_name);
                output.push('>');
                return self.terminate_line(depth, output);
            }
        }

        output.push('\n');
        for child in &node.children {
            self.serialize_element(child, depth + 1, output);
        }

        for _ in 0..depth {
            output.push_str(&self.indent_string);
        }
        output.push_str("</");
        output.push_str(&node.tag_name);
        output.push('>');
        self.terminate_line(depth, output);
    }

    fn terminate_line(&self, depth: usize, output: &mut String) {
        // The root's newline is added by serialize()
        if depth > 0 {
            output.push('\n');
        }
    }
}

fn escape_attribute(value: &str) -> String {
    escape(value, true)
}

fn escape_text(value: &str) -> String {
    escape(value, false)
}

fn escape(value: &str, quotes: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quotes => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn roundtrip_source() -> &'static str {
        r#"<svg width="100" height="50"><g id="layer"><rect id="a" x="1" y="2" width="3" height="4"/><text x="5" y="6">Tom &amp; Jerry</text></g></svg>"#
    }

    #[test]
    fn test_export_has_no_marker_attribute() {
        let doc = parse(roundtrip_source()).document.unwrap();
        let exported = serialize(&doc, SerializeOptions::default());
        assert!(!exported.contains(UUID_ATTR));
        assert!(exported.contains(r#"<rect id="a" x="1" y="2" width="3" height="4"/>"#));
    }

    #[test]
    fn test_keep_uuid_roundtrip_preserves_tokens() {
        let doc = parse(roundtrip_source()).document.unwrap();
        let internal = serialize(&doc, SerializeOptions { keep_uuid: true });

        let reparsed = parse(&internal).document.unwrap();
        assert_eq!(doc.root.token, reparsed.root.token);

        let old_rect = doc.root.children[0].children[0].token;
        let new_rect = reparsed.root.children[0].children[0].token;
        assert_eq!(old_rect, new_rect);
        assert_eq!(doc.root.children[0].children[0].attributes, reparsed.root.children[0].children[0].attributes);
    }

    #[test]
    fn test_serialize_reaches_fixed_point() {
        let doc = parse(roundtrip_source()).document.unwrap();
        let once = serialize(&doc, SerializeOptions { keep_uuid: true });
        let again = serialize(
            &parse(&once).document.unwrap(),
            SerializeOptions { keep_uuid: true },
        );
        assert_eq!(once, again);

        let exported_once = serialize(&parse(&once).document.unwrap(), SerializeOptions::default());
        let exported_again = serialize(
            &parse(&exported_once).document.unwrap(),
            SerializeOptions::default(),
        );
        assert_eq!(exported_once, exported_again);
    }

    #[test]
    fn test_attribute_escaping() {
        let doc = parse(r#"<svg><text font-family="A &amp; B">x &lt; y</text></svg>"#)
            .document
            .unwrap();
        let out = serialize(&doc, SerializeOptions::default());
        assert!(out.contains(r#"font-family="A &amp; B""#));
        assert!(out.contains("x &lt; y"));
    }

    #[test]
    fn test_child_order_is_preserved() {
        let doc = parse("<svg><rect/><circle/><line/></svg>").document.unwrap();
        let out = serialize(&doc, SerializeOptions::default());
        let rect = out.find("<rect").unwrap();
        let circle = out.find("<circle").unwrap();
        let line = out.find("<line").unwrap();
        assert!(rect < circle && circle < line);
    }
}
