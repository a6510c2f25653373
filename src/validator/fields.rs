//! Field type checks for registry-managed sections

use serde_json::Value;

use super::ValidationError;
use crate::model::{Document, Node, StyleValue};
use crate::placeholder;
use crate::registry::{FieldDef, FieldType, Registry};

const NAMED_COLORS: &[&str] = &[
    "black", "white", "red", "green", "blue", "yellow", "orange", "purple", "pink", "gray",
    "grey", "brown", "cyan", "magenta", "navy", "teal", "olive", "maroon", "silver", "gold",
    "indigo", "violet", "lime", "aqua", "coral", "salmon", "beige", "ivory", "khaki",
];

const LENGTH_UNITS: &[&str] = &["px", "rem", "em", "%", "vh", "vw"];

pub(crate) fn check(doc: &Document, registry: &Registry, errors: &mut Vec<ValidationError>) {
    doc.component.visit(&mut |node, _, _| {
        if let Some(def) = node.section_type.as_deref().and_then(|s| registry.get(s)) {
            check_section(node, &def.editable_props, &def.style_props, errors);
        }
    });
}

fn check_section(
    node: &Node,
    editable_props: &std::collections::BTreeMap<String, FieldDef>,
    style_props: &std::collections::BTreeMap<String, FieldDef>,
    errors: &mut Vec<ValidationError>,
) {
    for (name, value) in &node.props.attributes {
        if let Some(field) = editable_props.get(name) {
            if let Err(message) = check_value(field, value) {
                errors.push(ValidationError::field_type(&node.id, name, message));
            }
        }
    }
    for (property, value) in &node.props.style {
        if let Some(field) = style_props.get(property) {
            let value = match value {
                StyleValue::Text(s) => Value::String(s.clone()),
                StyleValue::Number(n) => serde_json::json!(n),
                StyleValue::Group(_) => continue,
            };
            if let Err(message) = check_value(field, &value) {
                errors.push(ValidationError::field_type(
                    &node.id,
                    format!("style.{}", property),
                    message,
                ));
            }
        }
    }
}

/// Check one value against its field schema
///
/// Strings carrying placeholders or `var()` calls are accepted here; their
/// syntax is checked separately.
pub fn check_value(field: &FieldDef, value: &Value) -> Result<(), String> {
    if let Value::String(s) = value {
        if placeholder::has_tokens(s) {
            return Ok(());
        }
    }
    let constraints = field.constraints();

    match field.kind {
        FieldType::Text | FieldType::Textarea => {
            let s = expect_str(field, value)?;
            if let Some(max) = constraints.max_length {
                let len = s.chars().count();
                if len > max {
                    return Err(format!("text is {} characters, maximum is {}", len, max));
                }
            }
            Ok(())
        }
        FieldType::Select => {
            let s = expect_str(field, value)?;
            match &constraints.options {
                Some(options) if !options.iter().any(|o| o == s) => Err(format!(
                    "'{}' is not one of: {}",
                    s,
                    options.join(", ")
                )),
                _ => Ok(()),
            }
        }
        FieldType::Boolean => match value {
            Value::Bool(_) => Ok(()),
            other => Err(format!("expected a boolean, got {}", other)),
        },
        FieldType::Number | FieldType::Slider => {
            let n = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }
            .ok_or_else(|| format!("expected a number, got {}", value))?;
            if let Some(min) = constraints.min {
                if n < min {
                    return Err(format!("{} is below the minimum {}", n, min));
                }
            }
            if let Some(max) = constraints.max {
                if n > max {
                    return Err(format!("{} is above the maximum {}", n, max));
                }
            }
            if let Some(step) = constraints.step.filter(|s| *s > 0.0) {
                let steps = (n - constraints.min.unwrap_or(0.0)) / step;
                if (steps - steps.round()).abs() > 1e-9 {
                    return Err(format!("{} is not a multiple of the step {}", n, step));
                }
            }
            Ok(())
        }
        FieldType::Color => {
            let s = expect_str(field, value)?;
            if is_color(s) {
                Ok(())
            } else {
                Err(format!("'{}' is not a valid color", s))
            }
        }
        FieldType::Spacing => match value {
            Value::Number(_) => Ok(()),
            Value::String(s) if is_spacing(s) => Ok(()),
            other => Err(format!("{} is not a valid spacing", other)),
        },
    }
}

fn expect_str<'a>(field: &FieldDef, value: &'a Value) -> Result<&'a str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("expected {} text, got {}", field.kind, value))
}

/// Hex, functional, named, `transparent` or `currentColor`
pub fn is_color(s: &str) -> bool {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    let lower = s.to_ascii_lowercase();
    for func in ["rgba(", "rgb(", "hsla(", "hsl("] {
        if let Some(args) = lower.strip_prefix(func) {
            return args.strip_suffix(')').is_some_and(|args| {
                !args.trim().is_empty()
                    && args.chars().all(|c| {
                        c.is_ascii_digit() || matches!(c, '.' | ',' | '%' | ' ' | '/' | '-')
                    })
            });
        }
    }
    lower == "transparent" || lower == "currentcolor" || NAMED_COLORS.contains(&lower.as_str())
}

/// One to four CSS lengths, or a bare number
pub fn is_spacing(s: &str) -> bool {
    let s = s.trim();
    if s.parse::<f64>().is_ok() {
        return true;
    }
    let parts: Vec<&str> = s.split_whitespace().collect();
    (1..=4).contains(&parts.len()) && parts.iter().all(|p| is_length(p))
}

fn is_length(s: &str) -> bool {
    if s == "0" {
        return true;
    }
    LENGTH_UNITS.iter().any(|unit| {
        s.strip_suffix(unit)
            .is_some_and(|n| !n.is_empty() && n.parse::<f64>().is_ok())
    })
}
