//! Structural validator
//!
//! The single gate every document passes before it is committed. Checks run
//! in five stages:
//!
//! 1. schema: ids, element types, unsafe markup, limits (stops here on failure)
//! 2. constraint: per-section `maxCount` / `required`
//! 3. permission: lock flags, against the prior document when there is one
//! 4. field type: registry field schemas on section roots
//! 5. placeholder syntax: every string leaf
//!
//! Warnings never affect validity.

mod fields;
mod issue;
mod permissions;
mod schema;
mod syntax;

use serde::{Deserialize, Serialize};

pub use fields::{check_value, is_color, is_spacing};
pub use issue::{ErrorKind, ValidationError, ValidationReport, ValidationWarning, WarningCategory};
pub use schema::UNSAFE_ELEMENTS;

pub(crate) use schema::{
    check_json_animations, check_json_metadata, check_json_style_variables, is_script_url,
    URL_ATTRIBUTES,
};

use crate::model::{Document, Node};
use crate::registry::Registry;

/// Size limits on a document tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_nodes: 2000,
        }
    }
}

/// Validator bound to a registry
#[derive(Debug, Clone, Copy)]
pub struct Validator<'r> {
    registry: &'r Registry,
    limits: Limits,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            limits: Limits::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Run every stage; `prior` enables the permission stage
    pub fn validate(&self, doc: &Document, prior: Option<&Document>) -> ValidationReport {
        let warnings = self.warnings(doc);
        let mut errors = Vec::new();

        schema::check_document(doc, &self.limits, &mut errors);
        if !errors.is_empty() {
            return ValidationReport::new(errors, warnings);
        }

        self.check_constraints(doc, &mut errors);
        if let Some(prior) = prior {
            permissions::check(doc, prior, &mut errors);
        }
        fields::check(doc, self.registry, &mut errors);
        syntax::check(doc, &mut errors);

        ValidationReport::new(errors, warnings)
    }

    /// Shape-check raw JSON, deserialize it, then validate
    pub fn validate_json(&self, json: &str, prior: Option<&Document>) -> (Option<Document>, ValidationReport) {
        match parse_document(json) {
            Ok(doc) => {
                let report = self.validate(&doc, prior);
                (Some(doc), report)
            }
            Err(errors) => (None, ValidationReport::new(errors, Vec::new())),
        }
    }

    fn check_constraints(&self, doc: &Document, errors: &mut Vec<ValidationError>) {
        for def in self.registry.list(None) {
            let count = doc.count_section(&def.id);
            if let Some(max) = def.max_count {
                if count > max {
                    errors.push(ValidationError::constraint(
                        &def.id,
                        format!("Maximum {} {} sections allowed", max, def.name),
                    ));
                }
            }
            if def.required && count == 0 {
                errors.push(ValidationError::constraint(
                    &def.id,
                    format!("At least one {} section is required", def.name),
                ));
            }
        }
    }

    fn warnings(&self, doc: &Document) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        if doc.metadata.name.trim().is_empty() {
            warnings.push(ValidationWarning {
                category: WarningCategory::Metadata,
                node_id: None,
                message: "metadata.name is empty".to_string(),
            });
        }
        doc.component.visit(&mut |node, _, _| {
            if let Some(section) = node.section_type.as_deref() {
                if !self.registry.contains(section) {
                    warnings.push(ValidationWarning {
                        category: WarningCategory::UnknownSection,
                        node_id: Some(node.id.clone()),
                        message: format!("unknown section type '{}' on '{}'", section, node.id),
                    });
                }
            }
            if node.kind == "img" && !has_alt(node) {
                warnings.push(ValidationWarning {
                    category: WarningCategory::Accessibility,
                    node_id: Some(node.id.clone()),
                    message: format!("image '{}' has no alt text", node.id),
                });
            }
        });
        warnings
    }
}

fn has_alt(node: &Node) -> bool {
    match node.props.attributes.get("alt") {
        Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
        Some(serde_json::Value::Null) | None => false,
        Some(_) => true,
    }
}

/// Validate a standalone document
pub fn validate(doc: &Document, registry: &Registry) -> ValidationReport {
    Validator::new(registry).validate(doc, None)
}

/// Validate a candidate against the committed document it would replace
pub fn validate_against(doc: &Document, prior: &Document, registry: &Registry) -> ValidationReport {
    Validator::new(registry).validate(doc, Some(prior))
}

/// Validate raw JSON; malformed input yields schema errors instead of a parse failure
pub fn validate_json(json: &str, registry: &Registry) -> ValidationReport {
    Validator::new(registry).validate_json(json, None).1
}

/// Deserialize a document, reporting shape problems as schema errors
pub fn parse_document(json: &str) -> Result<Document, Vec<ValidationError>> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| vec![ValidationError::schema("$", format!("invalid JSON: {}", e))])?;
    let mut errors = Vec::new();
    schema::check_json_document(&value, &mut errors);
    if !errors.is_empty() {
        return Err(errors);
    }
    serde_json::from_value(value).map_err(|e| vec![ValidationError::schema("$", e.to_string())])
}

/// Deserialize a single node, reporting shape problems as schema errors
pub fn parse_node(value: &serde_json::Value, location: &str) -> Result<Node, Vec<ValidationError>> {
    let mut errors = Vec::new();
    schema::check_json_node(value, location, &mut errors);
    if !errors.is_empty() {
        return Err(errors);
    }
    serde_json::from_value(value.clone())
        .map_err(|e| vec![ValidationError::schema(location, e.to_string())])
}
