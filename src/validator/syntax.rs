//! Placeholder syntax checks over every string leaf

use serde_json::Value;

use super::ValidationError;
use crate::error::PlaceholderError;
use crate::model::{Child, Document, Node, StyleValue};
use crate::placeholder::{self, css_var, Segment};

pub(crate) fn check(doc: &Document, errors: &mut Vec<ValidationError>) {
    doc.component.visit(&mut |node, _, _| check_node(node, errors));
}

fn check_node(node: &Node, errors: &mut Vec<ValidationError>) {
    for (i, child) in node.children.iter().enumerate() {
        if let Child::Text(text) = child {
            let location = format!("children[{}]", i);
            match placeholder::segments(text) {
                Ok(segments) => {
                    let has_directive = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Directive { .. }));
                    if has_directive && segments.len() > 1 {
                        errors.push(ValidationError::placeholder(
                            &node.id,
                            location,
                            text,
                            PlaceholderError::syntax(
                                0..text.len(),
                                "a '.map' directive must be the whole child value",
                            ),
                        ));
                    }
                }
                Err(e) => errors.push(ValidationError::placeholder(&node.id, location, text, e)),
            }
        }
    }

    if let Some(class_name) = &node.props.class_name {
        check_leaf(node, "props.className", class_name, errors);
    }
    for (name, value) in &node.props.attributes {
        if let Value::String(s) = value {
            check_leaf(node, &format!("props.{}", name), s, errors);
        }
    }
    for (property, value) in &node.props.style {
        if let StyleValue::Text(s) = value {
            let location = format!("props.style.{}", property);
            check_leaf(node, &location, s, errors);
            if let Err(e) = css_var::check(s) {
                errors.push(ValidationError::placeholder(&node.id, location, s, e));
            }
        }
    }
}

/// A string outside the children list; directives are not allowed here
fn check_leaf(node: &Node, location: &str, text: &str, errors: &mut Vec<ValidationError>) {
    match placeholder::segments(text) {
        Ok(segments) => {
            for segment in segments {
                if let Segment::Directive { span, .. } = segment {
                    errors.push(ValidationError::placeholder(
                        &node.id,
                        location,
                        text,
                        PlaceholderError::syntax(span, "'.map' directives are only allowed as children"),
                    ));
                }
            }
        }
        Err(e) => errors.push(ValidationError::placeholder(&node.id, location, text, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn messages(node: Node) -> Vec<String> {
        let mut errors = Vec::new();
        check(&Document::new(node), &mut errors);
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_valid_leaves() {
        let node = Node::new("hero", "section")
            .with_style("color", "var(--text-color, #0f172a)")
            .with_attribute("alt", "{{content.basics.name || 'Product'}}")
            .with_child("{{content.basics.tagline}}");
        assert!(messages(node).is_empty());
    }

    #[test]
    fn test_unclosed_text() {
        let node = Node::new("title", "h1").with_child("{{content.basics.name");
        assert_eq!(
            messages(node),
            vec!["title children[0]: unclosed placeholder, missing '}}'"]
        );
    }

    #[test]
    fn test_js_array_method() {
        let node = Node::new("list", "ul").with_child("{{content.features.filter}}");
        assert_eq!(
            messages(node),
            vec!["list children[0]: unknown directive '.filter', only '.map' is supported"]
        );
    }

    #[test]
    fn test_directive_in_attribute() {
        let node = Node::new("img", "img").with_attribute("src", "{{images.map}}");
        assert_eq!(
            messages(node),
            vec!["img props.src: '.map' directives are only allowed as children"]
        );
    }

    #[test]
    fn test_directive_mixed_with_text() {
        let node = Node::new("list", "ul")
            .with_child("Items: {{content.items.map}}")
            .with_child(Node::new("item", "li"));
        assert_eq!(messages(node).len(), 1);
    }

    #[test]
    fn test_broken_var() {
        let node = Node::new("box", "div").with_style("color", "var(--primary-color, #fff");
        assert_eq!(
            messages(node),
            vec!["box props.style.color: unbalanced parentheses in var()"]
        );
    }
}
