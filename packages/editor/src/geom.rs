//! Geometry helpers for moving elements.
//!
//! Position-bearing attributes are shifted directly (`x`/`y`, `cx`/`cy`,
//! endpoint pairs for lines); anything else gets a `translate(…)` prepended
//! to its `transform`, merging with an existing leading translate.

use marker_parser::ast::{AttributeList, ElementKind, ElementNode};

/// Applies a translation to whatever positioning scheme the element uses
pub fn translate_element(node: &mut ElementNode, dx: f64, dy: f64) {
    match node.kind {
        ElementKind::Rect | ElementKind::Text => {
            shift_attr(&mut node.attributes, "x", dx);
            shift_attr(&mut node.attributes, "y", dy);
        }
        ElementKind::Circle | ElementKind::Ellipse => {
            shift_attr(&mut node.attributes, "cx", dx);
            shift_attr(&mut node.attributes, "cy", dy);
        }
        ElementKind::Line => {
            shift_attr(&mut node.attributes, "x1", dx);
            shift_attr(&mut node.attributes, "y1", dy);
            shift_attr(&mut node.attributes, "x2", dx);
            shift_attr(&mut node.attributes, "y2", dy);
        }
        ElementKind::Group | ElementKind::Other => {
            merge_translate(&mut node.attributes, dx, dy);
        }
    }
}

fn shift_attr(attributes: &mut AttributeList, name: &str, delta: f64) {
    if delta == 0.0 {
        return;
    }
    let current = attributes
        .get(name)
        .and_then(|value| value.parse::<f64>().ok())
        .unwrap_or(0.0);
    attributes.set(name, format_number(current + delta));
}

fn merge_translate(attributes: &mut AttributeList, dx: f64, dy: f64) {
    if dx == 0.0 && dy == 0.0 {
        return;
    }
    let existing = attributes.get("transform").unwrap_or("").to_string();
    let value = match parse_leading_translate(&existing) {
        Some((tx, ty, rest)) => {
            let translate = translate_text(tx + dx, ty + dy);
            if rest.is_empty() {
                translate
            } else {
                format!("{} {}", translate, rest)
            }
        }
        None => {
            let translate = translate_text(dx, dy);
            if existing.is_empty() {
                translate
            } else {
                format!("{} {}", translate, existing)
            }
        }
    };
    attributes.set("transform", value);
}

fn translate_text(tx: f64, ty: f64) -> String {
    format!("translate({}, {})", format_number(tx), format_number(ty))
}

/// Splits a leading `translate(tx[, ty])` off a transform list
fn parse_leading_translate(transform: &str) -> Option<(f64, f64, &str)> {
    let trimmed = transform.trim_start();
    let inner = trimmed.strip_prefix("translate(")?;
    let close = inner.find(')')?;
    let args = &inner[..close];
    let rest = inner[close + 1..].trim_start();

    let mut parts = args.split(|c: char| c == ',' || c.is_whitespace()).filter(|p| !p.is_empty());
    let tx = parts.next()?.parse::<f64>().ok()?;
    let ty = match parts.next() {
        Some(part) => part.parse::<f64>().ok()?,
        None => 0.0,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((tx, ty, rest))
}

/// Shortest decimal form, whole numbers without a trailing `.0`
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with(tag: &str, attrs: &[(&str, &str)]) -> ElementNode {
        let mut node = ElementNode::new(tag);
        for (name, value) in attrs {
            node.attributes.set(*name, *value);
        }
        node
    }

    #[test]
    fn test_rect_moves_by_xy() {
        let mut rect = node_with("rect", &[("x", "10"), ("y", "5.5")]);
        translate_element(&mut rect, 3.0, -2.5);
        assert_eq!(rect.attributes.get("x"), Some("13"));
        assert_eq!(rect.attributes.get("y"), Some("3"));
    }

    #[test]
    fn test_missing_position_defaults_to_zero() {
        let mut circle = node_with("circle", &[("r", "4")]);
        translate_element(&mut circle, 7.0, 1.0);
        assert_eq!(circle.attributes.get("cx"), Some("7"));
        assert_eq!(circle.attributes.get("cy"), Some("1"));
        assert_eq!(circle.attributes.get("r"), Some("4"));
    }

    #[test]
    fn test_line_moves_both_endpoints() {
        let mut line = node_with("line", &[("x1", "0"), ("y1", "0"), ("x2", "10"), ("y2", "10")]);
        translate_element(&mut line, 5.0, 5.0);
        assert_eq!(line.attributes.get("x1"), Some("5"));
        assert_eq!(line.attributes.get("x2"), Some("15"));
    }

    #[test]
    fn test_group_gets_translate_transform() {
        let mut group = node_with("g", &[]);
        translate_element(&mut group, 4.0, 6.0);
        assert_eq!(group.attributes.get("transform"), Some("translate(4, 6)"));
    }

    #[test]
    fn test_existing_translate_is_merged() {
        let mut group = node_with("g", &[("transform", "translate(1, 2) rotate(45)")]);
        translate_element(&mut group, 4.0, 6.0);
        assert_eq!(
            group.attributes.get("transform"),
            Some("translate(5, 8) rotate(45)")
        );
    }

    #[test]
    fn test_other_transform_is_prepended() {
        let mut group = node_with("g", &[("transform", "rotate(45)")]);
        translate_element(&mut group, 1.0, 1.0);
        assert_eq!(
            group.attributes.get("transform"),
            Some("translate(1, 1) rotate(45)")
        );
    }

    #[test]
    fn test_single_argument_translate() {
        assert_eq!(parse_leading_translate("translate(5)"), Some((5.0, 0.0, "")));
        assert_eq!(parse_leading_translate("scale(2)"), None);
    }

    #[test]
    fn test_zero_delta_leaves_attributes_untouched() {
        let mut rect = node_with("rect", &[("x", "1.0")]);
        translate_element(&mut rect, 0.0, 0.0);
        // The stored text is not even reformatted
        assert_eq!(rect.attributes.get("x"), Some("1.0"));
        assert!(rect.attributes.get("y").is_none());
    }
}
