//! Attribute value validation.
//!
//! A rejected value surfaces at the editing field and never reaches the
//! document; attributes outside the known rule sets pass through
//! untouched.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttributeValidationError {
    #[error("{name} expects a number or length, got {value:?}")]
    NotANumber { name: String, value: String },

    #[error("{name} must not be negative, got {value:?}")]
    Negative { name: String, value: String },

    #[error("{name} must be between 0 and 1, got {value:?}")]
    OutOfUnitRange { name: String, value: String },

    #[error("{name} is not a recognized color: {value:?}")]
    InvalidColor { name: String, value: String },

    #[error("{name} must be one of {allowed:?}, got {value:?}")]
    InvalidKeyword {
        name: String,
        value: String,
        allowed: &'static [&'static str],
    },
}

const COORDINATES: &[&str] = &["x", "y", "cx", "cy", "x1", "y1", "x2", "y2", "dx", "dy"];
const SIZES: &[&str] = &["width", "height", "r", "rx", "ry", "stroke-width", "font-size"];
const OPACITIES: &[&str] = &["opacity", "fill-opacity", "stroke-opacity"];
const COLORS: &[&str] = &["fill", "stroke", "color", "stop-color"];
// "rem" must precede "em" so suffix stripping stays unambiguous
const UNITS: &[&str] = &["px", "pt", "mm", "cm", "in", "rem", "em", "%"];

const LINECAPS: &[&str] = &["butt", "round", "square"];
const LINEJOINS: &[&str] = &["miter", "round", "bevel"];
const FILL_RULES: &[&str] = &["nonzero", "evenodd"];
const TEXT_ANCHORS: &[&str] = &["start", "middle", "end"];

const NAMED_COLORS: &[&str] = &[
    "black", "silver", "gray", "grey", "white", "maroon", "red", "purple", "fuchsia", "green",
    "lime", "olive", "yellow", "navy", "blue", "teal", "aqua", "orange", "pink", "brown", "cyan",
    "magenta", "gold",
];

/// Checks a proposed attribute value against the field's rules
pub fn validate_attribute(name: &str, value: &str) -> Result<(), AttributeValidationError> {
    if COORDINATES.contains(&name) {
        return match parse_length(value) {
            Some(_) => Ok(()),
            None => Err(AttributeValidationError::NotANumber {
                name: name.to_string(),
                value: value.to_string(),
            }),
        };
    }

    if SIZES.contains(&name) {
        return match parse_length(value) {
            Some(number) if number >= 0.0 => Ok(()),
            Some(_) => Err(AttributeValidationError::Negative {
                name: name.to_string(),
                value: value.to_string(),
            }),
            None => Err(AttributeValidationError::NotANumber {
                name: name.to_string(),
                value: value.to_string(),
            }),
        };
    }

    if OPACITIES.contains(&name) {
        return match value.parse::<f64>() {
            Ok(number) if (0.0..=1.0).contains(&number) => Ok(()),
            Ok(_) => Err(AttributeValidationError::OutOfUnitRange {
                name: name.to_string(),
                value: value.to_string(),
            }),
            Err(_) => Err(AttributeValidationError::NotANumber {
                name: name.to_string(),
                value: value.to_string(),
            }),
        };
    }

    if COLORS.contains(&name) {
        return if is_color(value) {
            Ok(())
        } else {
            Err(AttributeValidationError::InvalidColor {
                name: name.to_string(),
                value: value.to_string(),
            })
        };
    }

    let keyword_rule = match name {
        "stroke-linecap" => Some(LINECAPS),
        "stroke-linejoin" => Some(LINEJOINS),
        "fill-rule" => Some(FILL_RULES),
        "text-anchor" => Some(TEXT_ANCHORS),
        _ => None,
    };
    if let Some(allowed) = keyword_rule {
        return if allowed.contains(&value) {
            Ok(())
        } else {
            Err(AttributeValidationError::InvalidKeyword {
                name: name.to_string(),
                value: value.to_string(),
                allowed,
            })
        };
    }

    Ok(())
}

/// Numeric value of a plain number or a number with a known unit suffix
fn parse_length(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let numeric = UNITS
        .iter()
        .find_map(|unit| trimmed.strip_suffix(unit))
        .unwrap_or(trimmed);
    numeric.parse::<f64>().ok()
}

fn is_color(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }
    if matches!(value, "none" | "transparent" | "currentColor") {
        return true;
    }
    if let Some(hex) = value.strip_prefix('#') {
        return matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if (value.starts_with("rgb(") || value.starts_with("rgba(")) && value.ends_with(')') {
        return true;
    }
    NAMED_COLORS.contains(&value)
}
