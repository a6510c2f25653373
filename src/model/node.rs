//! Node tree types

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::StyleValue;

/// Editing permissions carried by a node
///
/// Every flag defaults to `true` when omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Editable {
    pub moveable: bool,
    pub removeable: bool,
    pub duplicatable: bool,
    pub style_editable: bool,
    pub content_editable: bool,
}

impl Default for Editable {
    fn default() -> Self {
        Self {
            moveable: true,
            removeable: true,
            duplicatable: true,
            style_editable: true,
            content_editable: true,
        }
    }
}

impl Editable {
    /// Fully locked: nothing may be changed
    pub fn locked() -> Self {
        Self {
            moveable: false,
            removeable: false,
            duplicatable: false,
            style_editable: false,
            content_editable: false,
        }
    }

    /// Names of flags that are `false` here but `true` in `other`
    pub fn relaxed_in(&self, other: &Editable) -> Vec<&'static str> {
        let pairs = [
            ("moveable", self.moveable, other.moveable),
            ("removeable", self.removeable, other.removeable),
            ("duplicatable", self.duplicatable, other.duplicatable),
            ("styleEditable", self.style_editable, other.style_editable),
            ("contentEditable", self.content_editable, other.content_editable),
        ];
        pairs
            .into_iter()
            .filter(|(_, before, after)| !before && *after)
            .map(|(name, _, _)| name)
            .collect()
    }
}

/// Labels shown by the visual editor for a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditingMeta {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub category: String,
}

/// Element properties: class, inline style, and free-form attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Props {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, StyleValue>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl Props {
    pub fn is_empty(&self) -> bool {
        self.class_name.is_none() && self.style.is_empty() && self.attributes.is_empty()
    }
}

/// One entry of a node's children sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Child {
    /// Literal text, a placeholder string, or a `.map` directive
    Text(String),
    Node(Node),
}

impl Child {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Child::Node(n) => Some(n),
            Child::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Child::Text(s) => Some(s.as_str()),
            Child::Node(_) => None,
        }
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Node(node)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

/// A page element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable: Option<Editable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editing_meta: Option<EditingMeta>,
    #[serde(default, skip_serializing_if = "Props::is_empty")]
    pub props: Props,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_children"
    )]
    pub children: Vec<Child>,
}

/// `children` may be a single string in JSON
#[derive(Deserialize)]
#[serde(untagged)]
enum ChildrenRepr {
    Many(Vec<Child>),
    One(String),
}

fn deserialize_children<'de, D>(deserializer: D) -> Result<Vec<Child>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match ChildrenRepr::deserialize(deserializer)? {
        ChildrenRepr::Many(children) => children,
        ChildrenRepr::One(text) => vec![Child::Text(text)],
    })
}

impl Node {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            section_type: None,
            editable: None,
            editing_meta: None,
            props: Props::default(),
            children: Vec::new(),
        }
    }

    pub fn with_section(mut self, section_type: impl Into<String>) -> Self {
        self.section_type = Some(section_type.into());
        self
    }

    pub fn with_editable(mut self, editable: Editable) -> Self {
        self.editable = Some(editable);
        self
    }

    pub fn with_child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<StyleValue>) -> Self {
        self.props.style.insert(property.into(), value.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.attributes.insert(name.into(), value.into());
        self
    }

    /// Effective editing flags
    pub fn flags(&self) -> Editable {
        self.editable.unwrap_or_default()
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(Child::as_node)
    }

    /// Literal string children in order
    pub fn text_children(&self) -> Vec<&str> {
        self.children.iter().filter_map(Child::as_text).collect()
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.child_nodes().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| match c {
            Child::Node(n) => n.find_mut(id),
            Child::Text(_) => None,
        })
    }

    /// Id of the node directly containing `id`
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        for child in self.child_nodes() {
            if child.id == id {
                return Some(self.id.as_str());
            }
            if let Some(parent) = child.parent_of(id) {
                return Some(parent);
            }
        }
        None
    }

    /// Detach the descendant `id`, returning it with its former position
    pub(crate) fn detach(&mut self, id: &str) -> Option<(Node, String, usize)> {
        if let Some(pos) = self
            .children
            .iter()
            .position(|c| matches!(c, Child::Node(n) if n.id == id))
        {
            if let Child::Node(node) = self.children.remove(pos) {
                return Some((node, self.id.clone(), pos));
            }
        }
        self.children.iter_mut().find_map(|c| match c {
            Child::Node(n) => n.detach(id),
            Child::Text(_) => None,
        })
    }

    /// Visit this node and all descendants in pre-order
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Node, Option<&'a Node>, usize)) {
        fn go<'a>(
            node: &'a Node,
            parent: Option<&'a Node>,
            depth: usize,
            f: &mut impl FnMut(&'a Node, Option<&'a Node>, usize),
        ) {
            f(node, parent, depth);
            for child in node.child_nodes() {
                go(child, Some(node), depth + 1, f);
            }
        }
        go(self, None, 0, f);
    }

    /// All ids in this subtree, pre-order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.visit(&mut |n, _, _| ids.push(n.id.as_str()));
        ids
    }

    /// Rewrite every id in this subtree
    pub fn rename_ids(&mut self, f: &mut impl FnMut(&str) -> String) {
        self.id = f(&self.id);
        for child in self.children.iter_mut() {
            if let Child::Node(n) = child {
                n.rename_ids(f);
            }
        }
    }

    /// Give every node in this subtree a fresh random id derived from its current one
    pub fn assign_fresh_ids(&mut self) {
        self.rename_ids(&mut |id| fresh_id(id));
    }

    /// Copy with ids blanked, for comparing structure
    pub fn without_ids(&self) -> Node {
        let mut copy = self.clone();
        copy.rename_ids(&mut |_| String::new());
        copy
    }
}

const FRESH_SUFFIX_LEN: usize = 8;

/// `<base>-<8 hex>`; a previous fresh suffix on `base` is replaced, not stacked
pub fn fresh_id(base: &str) -> String {
    let stem = strip_fresh_suffix(base);
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}-{}", stem, &uuid[..FRESH_SUFFIX_LEN])
}

fn strip_fresh_suffix(id: &str) -> &str {
    if let Some((stem, suffix)) = id.rsplit_once('-') {
        if !stem.is_empty()
            && suffix.len() == FRESH_SUFFIX_LEN
            && suffix.chars().all(|c| c.is_ascii_hexdigit())
        {
            return stem;
        }
    }
    id
}
