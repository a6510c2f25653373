//! Template document model
//!
//! A [`Document`] is the serializable representation of one page: metadata,
//! style variables, animations, and a tree of [`Node`]s. Documents are never
//! edited in place; every operation in [`ops`] returns a new value.

pub mod node;
pub mod ops;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use node::{fresh_id, Child, EditingMeta, Editable, Node, Props};
pub use ops::{
    duplicate_node, insert_node, move_node, remove_node, replace_subtree, set_metadata,
    set_style_property, set_style_variable, DocumentError,
};

/// A style variable or inline style value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Text(String),
    Number(f64),
    /// Cascading token group, e.g. `{"color": "...", "blur": "..."}`
    Group(BTreeMap<String, StyleValue>),
}

impl StyleValue {
    /// CSS text for scalar values; `None` for groups
    pub fn as_css(&self) -> Option<String> {
        match self {
            StyleValue::Text(s) => Some(s.clone()),
            StyleValue::Number(n) => Some(n.to_string()),
            StyleValue::Group(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StyleValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&StyleValue> {
        match self {
            StyleValue::Group(group) => group.get(key),
            _ => None,
        }
    }
}

impl From<&str> for StyleValue {
    fn from(s: &str) -> Self {
        StyleValue::Text(s.to_string())
    }
}

impl From<String> for StyleValue {
    fn from(s: String) -> Self {
        StyleValue::Text(s)
    }
}

impl From<f64> for StyleValue {
    fn from(n: f64) -> Self {
        StyleValue::Number(n)
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleValue::Text(s) => write!(f, "{}", s),
            StyleValue::Number(n) => write!(f, "{}", n),
            StyleValue::Group(group) => {
                write!(f, "{{")?;
                for (i, (k, v)) in group.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Style variables keyed by token name
pub type StyleVariables = BTreeMap<String, StyleValue>;

/// Page-level metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub name: String,
    pub description: String,
    pub template: String,
    pub version: String,
    pub features: Vec<String>,
}

/// Partial metadata update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

impl Metadata {
    /// Shallow merge of a patch
    pub fn merged(&self, patch: &MetadataPatch) -> Metadata {
        Metadata {
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            description: patch
                .description
                .clone()
                .unwrap_or_else(|| self.description.clone()),
            template: patch
                .template
                .clone()
                .unwrap_or_else(|| self.template.clone()),
            version: patch.version.clone().unwrap_or_else(|| self.version.clone()),
            features: patch
                .features
                .clone()
                .unwrap_or_else(|| self.features.clone()),
        }
    }
}

/// A named CSS animation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Animation {
    pub keyframes: BTreeMap<String, Value>,
    pub duration: String,
    pub easing: String,
}

/// A complete page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub style_variables: StyleVariables,
    #[serde(default)]
    pub animations: BTreeMap<String, Animation>,
    pub component: Node,
}

impl Document {
    pub fn new(component: Node) -> Self {
        Self {
            metadata: Metadata::default(),
            style_variables: StyleVariables::new(),
            animations: BTreeMap::new(),
            component,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_style_variable(mut self, token: impl Into<String>, value: impl Into<StyleValue>) -> Self {
        self.style_variables.insert(token.into(), value.into());
        self
    }

    /// Deserialize without validation; see [`crate::validator::validate_json`]
    /// for the checked boundary
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        self.component.find(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Id of the node containing `id`; `None` for the root or unknown ids
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.component.parent_of(id)
    }

    /// Number of nodes whose `sectionType` is `section_type`
    pub fn count_section(&self, section_type: &str) -> usize {
        let mut count = 0;
        self.component.visit(&mut |n, _, _| {
            if n.section_type.as_deref() == Some(section_type) {
                count += 1;
            }
        });
        count
    }

    /// Every node with its parent and depth, pre-order
    pub fn walk(&self) -> Vec<NodeRef<'_>> {
        let mut refs = Vec::new();
        self.component.visit(&mut |node, parent, depth| {
            refs.push(NodeRef {
                node,
                parent_id: parent.map(|p| p.id.as_str()),
                depth,
            })
        });
        refs
    }

    pub fn ids(&self) -> Vec<&str> {
        self.component.ids()
    }

    /// Section types in document order
    pub fn sections(&self) -> Vec<&str> {
        let mut sections = Vec::new();
        self.component.visit(&mut |n, _, _| {
            if let Some(s) = n.section_type.as_deref() {
                sections.push(s);
            }
        });
        sections
    }
}

/// A node seen during [`Document::walk`]
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    pub node: &'a Node,
    pub parent_id: Option<&'a str>,
    pub depth: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r##"{
        "metadata": {"name": "Lamp", "description": "", "template": "modern", "version": "1.0", "features": ["hero"]},
        "styleVariables": {"primaryColor": "#3b82f6", "shadowLg": {"color": "rgba(0,0,0,0.2)", "blur": 24}},
        "animations": {"fadeIn": {"keyframes": {"from": {"opacity": 0}, "to": {"opacity": 1}}, "duration": "0.3s", "easing": "ease-out"}},
        "component": {
            "id": "page", "type": "main",
            "children": [
                {"id": "hero", "type": "section", "sectionType": "hero", "children": ["{{content.basics.name}}"]},
                {"id": "footer", "type": "footer", "sectionType": "footer"}
            ]
        }
    }"##;

    #[test]
    fn test_parse_document() {
        let doc = Document::from_json(PAGE).unwrap();
        assert_eq!(doc.metadata.name, "Lamp");
        assert_eq!(doc.count_section("hero"), 1);
        assert_eq!(doc.count_section("gallery"), 0);
        assert_eq!(doc.ids(), vec!["page", "hero", "footer"]);
        assert_eq!(
            doc.style_variables["shadowLg"].get("blur"),
            Some(&StyleValue::Number(24.0))
        );
    }

    #[test]
    fn test_roundtrip_is_stable() {
        let doc = Document::from_json(PAGE).unwrap();
        let once = serde_json::to_string(&doc).unwrap();
        let twice = serde_json::to_string(&Document::from_json(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_walk_reports_parents() {
        let doc = Document::from_json(PAGE).unwrap();
        let walked: Vec<_> = doc
            .walk()
            .iter()
            .map(|r| (r.node.id.as_str(), r.parent_id, r.depth))
            .collect();
        assert_eq!(
            walked,
            vec![
                ("page", None, 0),
                ("hero", Some("page"), 1),
                ("footer", Some("page"), 1)
            ]
        );
    }

    #[test]
    fn test_metadata_patch_is_shallow() {
        let meta = Metadata {
            name: "Lamp".into(),
            version: "1.0".into(),
            ..Metadata::default()
        };
        let merged = meta.merged(&MetadataPatch {
            name: Some("Desk Lamp".into()),
            ..MetadataPatch::default()
        });
        assert_eq!(merged.name, "Desk Lamp");
        assert_eq!(merged.version, "1.0");
    }

    #[test]
    fn test_number_style_value_renders_without_fraction() {
        assert_eq!(StyleValue::Number(16.0).as_css().as_deref(), Some("16"));
        assert_eq!(StyleValue::Number(0.5).as_css().as_deref(), Some("0.5"));
    }
}
