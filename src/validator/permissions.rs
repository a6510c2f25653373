//! Lock-flag checks against the previously committed document

use super::ValidationError;
use crate::model::{Document, Node};

pub(crate) fn check(candidate: &Document, prior: &Document, errors: &mut Vec<ValidationError>) {
    for before in prior.walk() {
        let node = before.node;
        let flags = node.flags();

        let Some(after) = candidate.find(&node.id) else {
            if !flags.removeable {
                errors.push(ValidationError::permission(
                    &node.id,
                    format!("'{}' cannot be removed", node.id),
                ));
            }
            continue;
        };

        if !flags.content_editable && subtree_text(node) != subtree_text(after) {
            errors.push(ValidationError::permission(
                &node.id,
                format!("text of '{}' is not editable", node.id),
            ));
        }
        if !flags.style_editable && node.props.style != after.props.style {
            errors.push(ValidationError::permission(
                &node.id,
                format!("style of '{}' is not editable", node.id),
            ));
        }
        if !flags.moveable && before.parent_id != candidate.parent_of(&node.id) {
            errors.push(ValidationError::permission(
                &node.id,
                format!("'{}' cannot be moved", node.id),
            ));
        }

        let relaxed = flags.relaxed_in(&after.flags());
        if !relaxed.is_empty() {
            errors.push(ValidationError::permission(
                &node.id,
                format!(
                    "lock flags of '{}' cannot be relaxed: {}",
                    node.id,
                    relaxed.join(", ")
                ),
            ));
        }
    }
}

/// Text children of every node under and including `node`, keyed by id
fn subtree_text(node: &Node) -> Vec<(&str, Vec<&str>)> {
    let mut texts = Vec::new();
    node.visit(&mut |n, _, _| texts.push((n.id.as_str(), n.text_children())));
    texts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Editable, Node};
    use pretty_assertions::assert_eq;

    fn locked_legal() -> Node {
        Node::new("legal", "small")
            .with_editable(Editable {
                content_editable: false,
                removeable: false,
                moveable: false,
                style_editable: false,
                ..Editable::default()
            })
            .with_child("© Store")
    }

    fn prior() -> Document {
        Document::new(
            Node::new("page", "main")
                .with_child(Node::new("footer", "footer").with_child(locked_legal()))
                .with_child(Node::new("aside", "aside")),
        )
    }

    fn messages(candidate: &Document) -> Vec<String> {
        let mut errors = Vec::new();
        check(candidate, &prior(), &mut errors);
        errors.iter().map(|e| e.message().to_string()).collect()
    }

    #[test]
    fn test_unchanged_is_clean() {
        assert!(messages(&prior()).is_empty());
    }

    #[test]
    fn test_removing_parent_of_locked_node() {
        let candidate = Document::new(Node::new("page", "main").with_child(Node::new("aside", "aside")));
        assert_eq!(messages(&candidate), vec!["'legal' cannot be removed"]);
    }

    #[test]
    fn test_text_and_style_edits() {
        let mut edited = locked_legal();
        edited.children = vec!["© Someone else".into()];
        edited.props.style.insert("color".into(), "red".into());
        let candidate = Document::new(
            Node::new("page", "main")
                .with_child(Node::new("footer", "footer").with_child(edited))
                .with_child(Node::new("aside", "aside")),
        );
        assert_eq!(
            messages(&candidate),
            vec!["text of 'legal' is not editable", "style of 'legal' is not editable"]
        );
    }

    #[test]
    fn test_text_inside_locked_wrapper() {
        let notice = |text: &str| {
            Node::new("notice", "div")
                .with_editable(Editable {
                    content_editable: false,
                    ..Editable::default()
                })
                .with_child(Node::new("notice-text", "span").with_child(text))
        };
        let prior = Document::new(
            Node::new("page", "main").with_child(notice("Returns accepted within 30 days")),
        );
        let candidate = Document::new(Node::new("page", "main").with_child(notice("No returns")));

        let mut errors = Vec::new();
        check(&candidate, &prior, &mut errors);
        let messages: Vec<_> = errors.iter().map(|e| e.message()).collect();
        assert_eq!(messages, vec!["text of 'notice' is not editable"]);
    }

    #[test]
    fn test_reparent_and_relax() {
        let mut relaxed = locked_legal();
        relaxed.editable = None;
        let candidate = Document::new(
            Node::new("page", "main")
                .with_child(Node::new("footer", "footer"))
                .with_child(Node::new("aside", "aside").with_child(relaxed)),
        );
        assert_eq!(
            messages(&candidate),
            vec![
                "'legal' cannot be moved",
                "lock flags of 'legal' cannot be relaxed: moveable, removeable, styleEditable, contentEditable",
            ]
        );
    }
}
