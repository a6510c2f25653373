//! Pure structural operations on documents
//!
//! Each operation clones its input and returns the edited copy. None of them
//! check registry constraints; that is the validator's job.

use std::collections::HashSet;

use thiserror::Error;

use super::{Child, Document, MetadataPatch, Node, StyleValue};
use crate::validator::ErrorKind;

/// Errors from structural operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error("parent not found: {0}")]
    ParentNotFound(String),

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("duplicate id: {0}")]
    DuplicateId(String),

    #[error("node '{id}' is locked: {reason}")]
    Locked { id: String, reason: String },

    #[error("the root node cannot be {0}")]
    RootNode(&'static str),

    #[error("cannot move '{id}' into its own subtree")]
    Cycle { id: String },

    #[error("unknown section type: {0}")]
    UnknownSection(String),
}

impl DocumentError {
    pub fn locked(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Locked {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Validation category this failure corresponds to, if any
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::DuplicateId(_) => Some(ErrorKind::Schema),
            Self::Locked { .. } => Some(ErrorKind::Permission),
            _ => None,
        }
    }
}

fn check_collisions(existing: &HashSet<&str>, incoming: &Node) -> Result<(), DocumentError> {
    let mut seen = HashSet::new();
    for id in incoming.ids() {
        if existing.contains(id) || !seen.insert(id) {
            return Err(DocumentError::DuplicateId(id.to_string()));
        }
    }
    Ok(())
}

fn insert_child(parent: &mut Node, node: Node, index: usize) {
    // index counts node children only; text children keep their positions
    let mut seen = 0;
    let mut at = parent.children.len();
    for (pos, child) in parent.children.iter().enumerate() {
        if matches!(child, Child::Node(_)) {
            if seen == index {
                at = pos;
                break;
            }
            seen += 1;
        }
    }
    parent.children.insert(at, Child::Node(node));
}

/// Insert `node` as the `index`-th node child of `parent_id`
///
/// An index past the end appends.
pub fn insert_node(
    doc: &Document,
    parent_id: &str,
    node: Node,
    index: usize,
) -> Result<Document, DocumentError> {
    if !doc.contains(parent_id) {
        return Err(DocumentError::ParentNotFound(parent_id.to_string()));
    }
    let existing: HashSet<&str> = doc.ids().into_iter().collect();
    check_collisions(&existing, &node)?;

    let mut next = doc.clone();
    let parent = next
        .component
        .find_mut(parent_id)
        .ok_or_else(|| DocumentError::ParentNotFound(parent_id.to_string()))?;
    insert_child(parent, node, index);
    Ok(next)
}

/// Remove a node and its subtree
///
/// Only the target's own `removeable` flag is consulted.
pub fn remove_node(doc: &Document, id: &str) -> Result<Document, DocumentError> {
    if doc.component.id == id {
        return Err(DocumentError::RootNode("removed"));
    }
    let target = doc
        .find(id)
        .ok_or_else(|| DocumentError::NodeNotFound(id.to_string()))?;
    if !target.flags().removeable {
        return Err(DocumentError::locked(id, "removeable is false"));
    }

    let mut next = doc.clone();
    next.component
        .detach(id)
        .ok_or_else(|| DocumentError::NodeNotFound(id.to_string()))?;
    Ok(next)
}

/// Replace the subtree rooted at `id` with `node`
pub fn replace_subtree(doc: &Document, id: &str, node: Node) -> Result<Document, DocumentError> {
    let target = doc
        .find(id)
        .ok_or_else(|| DocumentError::NodeNotFound(id.to_string()))?;
    let replaced: HashSet<&str> = target.ids().into_iter().collect();
    let outside: HashSet<&str> = doc
        .ids()
        .into_iter()
        .filter(|i| !replaced.contains(i))
        .collect();
    check_collisions(&outside, &node)?;

    let mut next = doc.clone();
    if next.component.id == id {
        next.component = node;
        return Ok(next);
    }
    let slot = next
        .component
        .find_mut(id)
        .ok_or_else(|| DocumentError::NodeNotFound(id.to_string()))?;
    *slot = node;
    Ok(next)
}

pub fn set_style_variable(doc: &Document, token: &str, value: impl Into<StyleValue>) -> Document {
    let mut next = doc.clone();
    next.style_variables.insert(token.to_string(), value.into());
    next
}

pub fn set_metadata(doc: &Document, patch: &MetadataPatch) -> Document {
    let mut next = doc.clone();
    next.metadata = doc.metadata.merged(patch);
    next
}

/// Move a node under a new parent at `index`
pub fn move_node(
    doc: &Document,
    id: &str,
    new_parent_id: &str,
    index: usize,
) -> Result<Document, DocumentError> {
    if doc.component.id == id {
        return Err(DocumentError::RootNode("moved"));
    }
    let target = doc
        .find(id)
        .ok_or_else(|| DocumentError::NodeNotFound(id.to_string()))?;
    if !target.flags().moveable {
        return Err(DocumentError::locked(id, "moveable is false"));
    }
    if target.find(new_parent_id).is_some() {
        return Err(DocumentError::Cycle { id: id.to_string() });
    }
    if !doc.contains(new_parent_id) {
        return Err(DocumentError::ParentNotFound(new_parent_id.to_string()));
    }

    let mut next = doc.clone();
    let (node, _, _) = next
        .component
        .detach(id)
        .ok_or_else(|| DocumentError::NodeNotFound(id.to_string()))?;
    let parent = next
        .component
        .find_mut(new_parent_id)
        .ok_or_else(|| DocumentError::ParentNotFound(new_parent_id.to_string()))?;
    insert_child(parent, node, index);
    Ok(next)
}

/// Insert a fresh-id copy of a node right after it
///
/// Returns the new document and the id of the copy's root.
pub fn duplicate_node(doc: &Document, id: &str) -> Result<(Document, String), DocumentError> {
    if doc.component.id == id {
        return Err(DocumentError::RootNode("duplicated"));
    }
    let target = doc
        .find(id)
        .ok_or_else(|| DocumentError::NodeNotFound(id.to_string()))?;
    if !target.flags().duplicatable {
        return Err(DocumentError::locked(id, "duplicatable is false"));
    }

    let mut copy = target.clone();
    copy.assign_fresh_ids();
    let existing: HashSet<&str> = doc.ids().into_iter().collect();
    check_collisions(&existing, &copy)?;
    let copy_id = copy.id.clone();

    let mut next = doc.clone();
    let parent_id = doc
        .parent_of(id)
        .ok_or_else(|| DocumentError::NodeNotFound(id.to_string()))?;
    let parent = next
        .component
        .find_mut(parent_id)
        .ok_or_else(|| DocumentError::ParentNotFound(parent_id.to_string()))?;
    let pos = parent
        .children
        .iter()
        .position(|c| matches!(c, Child::Node(n) if n.id == id))
        .ok_or_else(|| DocumentError::NodeNotFound(id.to_string()))?;
    parent.children.insert(pos + 1, Child::Node(copy));
    Ok((next, copy_id))
}

/// Set one inline style property on a node
pub fn set_style_property(
    doc: &Document,
    id: &str,
    property: &str,
    value: impl Into<StyleValue>,
) -> Result<Document, DocumentError> {
    let target = doc
        .find(id)
        .ok_or_else(|| DocumentError::NodeNotFound(id.to_string()))?;
    if !target.flags().style_editable {
        return Err(DocumentError::locked(id, "styleEditable is false"));
    }
    let mut next = doc.clone();
    let node = next
        .component
        .find_mut(id)
        .ok_or_else(|| DocumentError::NodeNotFound(id.to_string()))?;
    node.props.style.insert(property.to_string(), value.into());
    Ok(next)
}
