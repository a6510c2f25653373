//! Structural and safety checks, on typed documents and on raw JSON

use std::collections::HashSet;

use serde_json::Value;

use super::{Limits, ValidationError};
use crate::model::{Child, Document, Node, StyleValue};
use crate::placeholder;

/// Elements that can run code or rewrite the page head
pub const UNSAFE_ELEMENTS: &[&str] = &[
    "script", "iframe", "object", "embed", "frame", "frameset", "base", "meta", "link", "style",
];

/// Attributes that inject markup or documents directly
const UNSAFE_ATTRIBUTES: &[&str] = &["dangerouslySetInnerHTML", "srcdoc"];

pub(crate) const URL_ATTRIBUTES: &[&str] = &["href", "src", "action", "formaction", "xlink:href"];

pub(crate) fn check_document(doc: &Document, limits: &Limits, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    let mut count = 0usize;
    let mut depth_reported = false;
    let templates = directive_template_ids(&doc.component);
    check_node(
        &doc.component,
        "component",
        0,
        limits,
        &templates,
        &mut seen,
        &mut count,
        &mut depth_reported,
        errors,
    );
    if count > limits.max_nodes {
        errors.push(ValidationError::schema(
            "component",
            format!("document has {} nodes, limit is {}", count, limits.max_nodes),
        ));
    }
}

#[allow(clippy::too_many_arguments)]
fn check_node<'a>(
    node: &'a Node,
    location: &str,
    depth: usize,
    limits: &Limits,
    templates: &HashSet<&str>,
    seen: &mut HashSet<&'a str>,
    count: &mut usize,
    depth_reported: &mut bool,
    errors: &mut Vec<ValidationError>,
) {
    *count += 1;
    if depth > limits.max_depth && !*depth_reported {
        *depth_reported = true;
        errors.push(ValidationError::schema(
            location,
            format!("tree is deeper than {} levels", limits.max_depth),
        ));
    }

    check_id(node, location, seen, errors);
    if let Some(template) = clone_stem(&node.id, templates) {
        errors.push(ValidationError::schema(
            format!("{}.id", location),
            format!(
                "id '{}' is reserved for clones of directive template '{}'",
                node.id, template
            ),
        ));
    }
    check_kind(&node.kind, location, errors);

    for (name, value) in &node.props.attributes {
        check_attribute(name, value, &format!("{}.props.{}", location, name), errors);
    }
    for (property, value) in &node.props.style {
        if let StyleValue::Group(_) = value {
            errors.push(ValidationError::schema(
                format!("{}.props.style.{}", location, property),
                "inline style values must be strings or numbers",
            ));
        }
    }

    for (i, child) in node.children.iter().enumerate() {
        let child_location = format!("{}.children[{}]", location, i);
        match child {
            Child::Text(text) => {
                if placeholder::as_directive(text).is_some()
                    && !matches!(node.children.get(i + 1), Some(Child::Node(_)))
                {
                    errors.push(ValidationError::schema(
                        child_location,
                        format!("directive '{}' must be followed by a node template", text),
                    ));
                }
            }
            Child::Node(child) => check_node(
                child,
                &child_location,
                depth + 1,
                limits,
                templates,
                seen,
                count,
                depth_reported,
                errors,
            ),
        }
    }
}

/// Ids inside directive item templates; their clones are named `<id>-<i>`
fn directive_template_ids(root: &Node) -> HashSet<&str> {
    let mut ids = HashSet::new();
    root.visit(&mut |node, _, _| {
        for pair in node.children.windows(2) {
            if let [Child::Text(text), Child::Node(template)] = pair {
                if placeholder::as_directive(text).is_some() {
                    ids.extend(template.ids());
                }
            }
        }
    });
    ids
}

/// The template id `id` would collide with as a clone, e.g. `card` for `card-0-1`
fn clone_stem<'t>(id: &str, templates: &HashSet<&'t str>) -> Option<&'t str> {
    let mut rest = id;
    while let Some((head, index)) = rest.rsplit_once('-') {
        if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if let Some(template) = templates.get(head) {
            return Some(*template);
        }
        rest = head;
    }
    None
}

fn check_id<'a>(
    node: &'a Node,
    location: &str,
    seen: &mut HashSet<&'a str>,
    errors: &mut Vec<ValidationError>,
) {
    if node.id.is_empty() {
        errors.push(ValidationError::schema(
            format!("{}.id", location),
            "node id must not be empty",
        ));
        return;
    }
    if node.id.chars().any(char::is_whitespace) {
        errors.push(ValidationError::schema(
            format!("{}.id", location),
            format!("node id '{}' contains whitespace", node.id),
        ));
    }
    if !seen.insert(node.id.as_str()) {
        errors.push(ValidationError::schema(
            format!("{}.id", location),
            format!("duplicate id '{}'", node.id),
        ));
    }
}

fn check_kind(kind: &str, location: &str, errors: &mut Vec<ValidationError>) {
    let well_formed = kind
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase())
        && kind
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !well_formed {
        errors.push(ValidationError::schema(
            format!("{}.type", location),
            format!("'{}' is not a lowercase element name", kind),
        ));
    } else if UNSAFE_ELEMENTS.contains(&kind) {
        errors.push(ValidationError::schema(
            format!("{}.type", location),
            format!("element '{}' is not allowed", kind),
        ));
    }
}

fn check_attribute(name: &str, value: &Value, location: &str, errors: &mut Vec<ValidationError>) {
    if is_event_handler(name) {
        errors.push(ValidationError::schema(
            location,
            format!("event handler attribute '{}' is not allowed", name),
        ));
        return;
    }
    if UNSAFE_ATTRIBUTES.contains(&name) {
        errors.push(ValidationError::schema(
            location,
            format!("attribute '{}' is not allowed", name),
        ));
        return;
    }
    match value {
        Value::Array(_) | Value::Object(_) => errors.push(ValidationError::schema(
            location,
            format!("attribute '{}' must be a scalar", name),
        )),
        Value::String(url) if URL_ATTRIBUTES.contains(&name) && is_script_url(url) => {
            errors.push(ValidationError::schema(
                location,
                format!("'{}' must not use a javascript: URL", name),
            ))
        }
        _ => {}
    }
}

fn is_event_handler(name: &str) -> bool {
    name.len() > 2 && name.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("on"))
}

pub(crate) fn is_script_url(url: &str) -> bool {
    // browsers ignore embedded whitespace and control characters in the scheme
    let scheme: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .take(11)
        .collect();
    scheme.to_ascii_lowercase().starts_with("javascript:")
}

// ── Raw JSON shape ────────────────────────────────────────────────

/// Check the shape of an untyped document before deserializing it
pub(crate) fn check_json_document(value: &Value, errors: &mut Vec<ValidationError>) {
    let Some(obj) = value.as_object() else {
        errors.push(ValidationError::schema("$", "document must be an object"));
        return;
    };

    if let Some(metadata) = obj.get("metadata") {
        check_json_metadata(metadata, "$.metadata", errors);
    }
    if let Some(vars) = obj.get("styleVariables") {
        check_json_style_variables(vars, "$.styleVariables", errors);
    }
    if let Some(animations) = obj.get("animations") {
        check_json_animations(animations, "$.animations", errors);
    }
    match obj.get("component") {
        Some(component) => check_json_node(component, "$.component", errors),
        None => errors.push(ValidationError::schema("$.component", "missing root component")),
    }
}

pub(crate) fn check_json_metadata(value: &Value, location: &str, errors: &mut Vec<ValidationError>) {
    let Some(obj) = value.as_object() else {
        errors.push(ValidationError::schema(location, "expected an object"));
        return;
    };
    for (key, field) in obj {
        let field_location = format!("{}.{}", location, key);
        match key.as_str() {
            "features" => check_string_array(field, &field_location, errors),
            _ => expect_string(field, &field_location, errors),
        }
    }
}

pub(crate) fn check_json_style_variables(
    value: &Value,
    location: &str,
    errors: &mut Vec<ValidationError>,
) {
    let Some(obj) = value.as_object() else {
        errors.push(ValidationError::schema(location, "expected an object"));
        return;
    };
    for (token, v) in obj {
        let token_location = format!("{}.{}", location, token);
        match v {
            Value::String(_) | Value::Number(_) => {}
            Value::Object(_) => check_json_style_variables(v, &token_location, errors),
            _ => errors.push(ValidationError::schema(
                token_location,
                "style variable must be a string, number or group",
            )),
        }
    }
}

pub(crate) fn check_json_animations(value: &Value, location: &str, errors: &mut Vec<ValidationError>) {
    let Some(obj) = value.as_object() else {
        errors.push(ValidationError::schema(location, "expected an object"));
        return;
    };
    for (name, animation) in obj {
        let anim_location = format!("{}.{}", location, name);
        let Some(fields) = animation.as_object() else {
            errors.push(ValidationError::schema(anim_location, "expected an object"));
            continue;
        };
        for (key, field) in fields {
            let field_location = format!("{}.{}", anim_location, key);
            match key.as_str() {
                "keyframes" if !field.is_object() => {
                    errors.push(ValidationError::schema(field_location, "expected an object"))
                }
                "duration" | "easing" => expect_string(field, &field_location, errors),
                _ => {}
            }
        }
    }
}

/// Check the shape of an untyped node and its descendants
pub(crate) fn check_json_node(value: &Value, location: &str, errors: &mut Vec<ValidationError>) {
    let Some(obj) = value.as_object() else {
        errors.push(ValidationError::schema(location, "node must be an object"));
        return;
    };

    for key in ["id", "type"] {
        match obj.get(key) {
            Some(Value::String(_)) => {}
            Some(_) => errors.push(ValidationError::schema(
                format!("{}.{}", location, key),
                "expected a string",
            )),
            None => errors.push(ValidationError::schema(
                format!("{}.{}", location, key),
                "missing required field",
            )),
        }
    }
    if let Some(section) = obj.get("sectionType") {
        expect_string(section, &format!("{}.sectionType", location), errors);
    }

    if let Some(editable) = obj.get("editable") {
        let editable_location = format!("{}.editable", location);
        match editable.as_object() {
            Some(flags) => {
                for (flag, v) in flags {
                    if !v.is_boolean() {
                        errors.push(ValidationError::schema(
                            format!("{}.{}", editable_location, flag),
                            "expected a boolean",
                        ));
                    }
                }
            }
            None => errors.push(ValidationError::schema(editable_location, "expected an object")),
        }
    }

    if let Some(meta) = obj.get("editingMeta") {
        check_json_metadata(meta, &format!("{}.editingMeta", location), errors);
    }

    if let Some(props) = obj.get("props") {
        check_json_props(props, &format!("{}.props", location), errors);
    }

    match obj.get("children") {
        None | Some(Value::String(_)) => {}
        Some(Value::Array(children)) => {
            for (i, child) in children.iter().enumerate() {
                let child_location = format!("{}.children[{}]", location, i);
                match child {
                    Value::String(_) => {}
                    Value::Object(_) => check_json_node(child, &child_location, errors),
                    _ => errors.push(ValidationError::schema(
                        child_location,
                        "child must be a string or a node",
                    )),
                }
            }
        }
        Some(_) => errors.push(ValidationError::schema(
            format!("{}.children", location),
            "children must be an array or a string",
        )),
    }
}

fn check_json_props(value: &Value, location: &str, errors: &mut Vec<ValidationError>) {
    let Some(props) = value.as_object() else {
        errors.push(ValidationError::schema(location, "expected an object"));
        return;
    };
    if let Some(class_name) = props.get("className") {
        expect_string(class_name, &format!("{}.className", location), errors);
    }
    if let Some(style) = props.get("style") {
        let style_location = format!("{}.style", location);
        match style.as_object() {
            Some(entries) => {
                for (property, v) in entries {
                    if !(v.is_string() || v.is_number()) {
                        errors.push(ValidationError::schema(
                            format!("{}.{}", style_location, property),
                            "inline style values must be strings or numbers",
                        ));
                    }
                }
            }
            None => errors.push(ValidationError::schema(style_location, "expected an object")),
        }
    }
}

fn expect_string(value: &Value, location: &str, errors: &mut Vec<ValidationError>) {
    if !value.is_string() {
        errors.push(ValidationError::schema(location, "expected a string"));
    }
}

fn check_string_array(value: &Value, location: &str, errors: &mut Vec<ValidationError>) {
    match value.as_array() {
        Some(items) => {
            for (i, item) in items.iter().enumerate() {
                expect_string(item, &format!("{}[{}]", location, i), errors);
            }
        }
        None => errors.push(ValidationError::schema(location, "expected an array of strings")),
    }
}
