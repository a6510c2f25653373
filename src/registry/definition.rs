//! Component and page template definitions

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Node, StyleVariables};

/// Editor control type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Select,
    Boolean,
    Number,
    Slider,
    Color,
    Spacing,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::Boolean => "boolean",
            FieldType::Number => "number",
            FieldType::Slider => "slider",
            FieldType::Color => "color",
            FieldType::Spacing => "spacing",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// Schema of one editable or style field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<FieldConstraints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldDef {
    pub fn constraints(&self) -> FieldConstraints {
        self.constraints.clone().unwrap_or_default()
    }
}

/// A section type the editor may place on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub icon: String,
    /// `None` means unbounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<usize>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub editable_props: BTreeMap<String, FieldDef>,
    #[serde(default)]
    pub style_props: BTreeMap<String, FieldDef>,
    /// Canonical fragment, copied by [`super::Registry::instantiate`]
    pub template: Node,
}

impl ComponentDefinition {
    /// Default of the style field `name`, as CSS text
    pub fn style_default(&self, name: &str) -> Option<String> {
        match self.style_props.get(name)?.default.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Ordered list of sections a new page starts from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub sections: Vec<String>,
    #[serde(default)]
    pub style_variables: StyleVariables,
    #[serde(default)]
    pub features: Vec<String>,
}

/// On-disk catalog layout
#[derive(Debug, Deserialize)]
pub(crate) struct Catalog {
    pub components: Vec<ComponentDefinition>,
    #[serde(default)]
    pub pages: Vec<PageTemplate>,
}
