//! Modification merge engine
//!
//! A [`Modification`] is a partial document proposed by an editor or a
//! generative service. It is merged onto the committed document to build a
//! candidate, the candidate is validated against the committed document, and
//! it is either accepted whole or rejected whole.

mod session;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub use session::{EditSession, Preview};

use crate::model::{Animation, Document, MetadataPatch, Node, StyleVariables};
use crate::registry::Registry;
use crate::validator::{
    self, ValidationError, ValidationReport, ValidationWarning, Validator,
};

/// Who produced a modification; only used for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Origin {
    Interactive,
    #[default]
    Automated,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Interactive => write!(f, "interactive"),
            Origin::Automated => write!(f, "automated"),
        }
    }
}

/// Partial document update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Modification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_variables: Option<StyleVariables>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animations: Option<BTreeMap<String, Animation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<Node>,
    #[serde(skip)]
    pub origin: Origin,
    /// Set by [`Modification::replace_with`]: the candidate is exactly this document
    #[serde(skip)]
    replacement: Option<Box<Document>>,
}

impl Modification {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style_variables(mut self, vars: StyleVariables) -> Self {
        self.style_variables = Some(vars);
        self
    }

    pub fn with_metadata(mut self, patch: MetadataPatch) -> Self {
        self.metadata = Some(patch);
        self
    }

    pub fn with_animations(mut self, animations: BTreeMap<String, Animation>) -> Self {
        self.animations = Some(animations);
        self
    }

    pub fn with_component(mut self, component: Node) -> Self {
        self.component = Some(component);
        self
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Wrap the result of an interactive edit so it goes through the same gate
    pub fn replace_with(doc: &Document) -> Self {
        Self {
            style_variables: Some(doc.style_variables.clone()),
            metadata: None,
            animations: Some(doc.animations.clone()),
            component: Some(doc.component.clone()),
            origin: Origin::Interactive,
            replacement: Some(Box::new(doc.clone())),
        }
    }

    /// Parse a generated reply; shape problems come back as schema errors
    pub fn from_json(json: &str) -> Result<Self, Vec<ValidationError>> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| vec![ValidationError::schema("$", format!("invalid JSON: {}", e))])?;
        let Some(obj) = value.as_object() else {
            return Err(vec![ValidationError::schema("$", "modification must be an object")]);
        };

        let mut errors = Vec::new();
        if let Some(vars) = obj.get("styleVariables") {
            validator::check_json_style_variables(vars, "$.styleVariables", &mut errors);
        }
        if let Some(metadata) = obj.get("metadata") {
            validator::check_json_metadata(metadata, "$.metadata", &mut errors);
        }
        if let Some(animations) = obj.get("animations") {
            validator::check_json_animations(animations, "$.animations", &mut errors);
        }
        let component = match obj.get("component") {
            Some(component) => match validator::parse_node(component, "$.component") {
                Ok(node) => Some(node),
                Err(node_errors) => {
                    errors.extend(node_errors);
                    None
                }
            },
            None => None,
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        let parse = |key: &str| obj.get(key).cloned().unwrap_or(Value::Null);
        let field_error =
            |key: &str, e: serde_json::Error| vec![ValidationError::schema(format!("$.{}", key), e.to_string())];
        Ok(Self {
            style_variables: serde_json::from_value(parse("styleVariables"))
                .map_err(|e| field_error("styleVariables", e))?,
            metadata: serde_json::from_value(parse("metadata"))
                .map_err(|e| field_error("metadata", e))?,
            animations: serde_json::from_value(parse("animations"))
                .map_err(|e| field_error("animations", e))?,
            component,
            origin: Origin::Automated,
            replacement: None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.replacement.is_none()
            && self.style_variables.is_none()
            && self.metadata.is_none()
            && self.animations.is_none()
            && self.component.is_none()
    }
}

/// A modification that failed validation; the committed document is unchanged
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("modification rejected with {} error(s)", .errors.len())]
pub struct Rejection {
    #[serde(skip)]
    pub committed: Document,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl Rejection {
    pub fn new(committed: &Document, report: ValidationReport) -> Self {
        Self {
            committed: committed.clone(),
            errors: report.errors,
            warnings: report.warnings,
        }
    }

    pub fn from_errors(committed: &Document, errors: Vec<ValidationError>) -> Self {
        Self::new(committed, ValidationReport::new(errors, Vec::new()))
    }
}

/// Merge a modification onto a document without validating
///
/// Style variables, metadata and animations are merged key by key; a
/// component replaces the whole tree.
pub fn build_candidate(doc: &Document, modification: &Modification) -> Document {
    if let Some(replacement) = &modification.replacement {
        return (**replacement).clone();
    }

    let mut candidate = doc.clone();
    if let Some(vars) = &modification.style_variables {
        candidate
            .style_variables
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    if let Some(patch) = &modification.metadata {
        candidate.metadata = candidate.metadata.merged(patch);
    }
    if let Some(animations) = &modification.animations {
        candidate
            .animations
            .extend(animations.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    if let Some(component) = &modification.component {
        candidate.component = component.clone();
    }
    candidate
}

/// Build and validate a candidate
pub(crate) fn evaluate(
    validator: &Validator<'_>,
    committed: &Document,
    modification: &Modification,
) -> Result<(Document, Vec<ValidationWarning>), Rejection> {
    let candidate = build_candidate(committed, modification);
    let report = validator.validate(&candidate, Some(committed));
    if report.valid {
        debug!(
            origin = %modification.origin,
            sections = candidate.sections().len(),
            warnings = report.warnings.len(),
            "modification accepted"
        );
        Ok((candidate, report.warnings))
    } else {
        warn!(
            origin = %modification.origin,
            errors = report.errors.len(),
            first = %report.errors[0],
            "modification rejected"
        );
        Err(Rejection::new(committed, report))
    }
}

/// Validate and commit in one step, without a preview
pub fn apply(
    doc: &Document,
    modification: &Modification,
    registry: &Registry,
) -> Result<Document, Rejection> {
    evaluate(&Validator::new(registry), doc, modification).map(|(committed, _)| committed)
}

/// [`apply`] for a raw JSON reply
pub fn apply_json(doc: &Document, json: &str, registry: &Registry) -> Result<Document, Rejection> {
    let modification = Modification::from_json(json).map_err(|errors| {
        warn!(errors = errors.len(), "malformed modification");
        Rejection::from_errors(doc, errors)
    })?;
    apply(doc, &modification, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{insert_node, remove_node, StyleValue};
    use crate::validator::ErrorKind;
    use pretty_assertions::assert_eq;

    fn committed() -> Document {
        Registry::builtin().new_document("product-minimal").unwrap()
    }

    fn section_id(doc: &Document, section: &str) -> String {
        doc.walk()
            .into_iter()
            .find(|r| r.node.section_type.as_deref() == Some(section))
            .map(|r| r.node.id.clone())
            .unwrap()
    }

    #[test]
    fn test_style_variables_merge_shallowly() {
        let doc = committed();
        let mut vars = StyleVariables::new();
        vars.insert("primaryColor".into(), "#ff0000".into());
        let candidate = build_candidate(&doc, &Modification::new().with_style_variables(vars));
        assert_eq!(candidate.style_variables["primaryColor"], StyleValue::from("#ff0000"));
        assert_eq!(candidate.style_variables["radius"], doc.style_variables["radius"]);
        assert_eq!(candidate.component, doc.component);
    }

    #[test]
    fn test_animations_merge_by_name() {
        let fade = |duration: &str| Animation {
            duration: duration.to_string(),
            easing: "ease-out".to_string(),
            ..Animation::default()
        };
        let mut doc = committed();
        doc.animations.insert("fadeIn".into(), fade("200ms"));
        doc.animations.insert("slideUp".into(), fade("400ms"));

        let mut animations = BTreeMap::new();
        animations.insert("fadeIn".to_string(), fade("300ms"));
        let modification = Modification::new()
            .with_animations(animations)
            .with_origin(Origin::Interactive);
        let next = apply(&doc, &modification, Registry::builtin()).unwrap();
        assert_eq!(next.animations["fadeIn"].duration, "300ms");
        assert_eq!(next.animations["slideUp"].duration, "400ms");
        assert_eq!(modification.origin.to_string(), "interactive");
    }

    #[test]
    fn test_rejection_leaves_committed_untouched() {
        let registry = Registry::builtin();
        let doc = committed();
        let hero = registry.instantiate("hero").unwrap();
        let with_two_heroes = insert_node(&doc, "page", hero, 1).unwrap();

        let modification = Modification::new()
            .with_component(with_two_heroes.component.clone())
            .with_metadata(MetadataPatch {
                name: Some("Changed".into()),
                ..MetadataPatch::default()
            });
        let rejection = apply(&doc, &modification, registry).unwrap_err();
        assert_eq!(rejection.committed, doc);
        assert_eq!(rejection.errors.len(), 1);
        assert_eq!(
            rejection.errors[0].message(),
            "Maximum 1 Hero Section sections allowed"
        );
    }

    #[test]
    fn test_interactive_and_automated_rejected_alike() {
        let registry = Registry::builtin();
        let doc = committed();
        let header = section_id(&doc, "header");
        // bypass the op-level lock check to build the candidate directly
        let mut edited = doc.clone();
        edited.component.children.retain(|c| c.as_node().map_or(true, |n| n.id != header));
        assert!(matches!(remove_node(&doc, &header), Err(_)));

        let interactive = apply(&doc, &Modification::replace_with(&edited), registry).unwrap_err();
        let automated = apply(
            &doc,
            &Modification::new().with_component(edited.component.clone()),
            registry,
        )
        .unwrap_err();
        assert_eq!(interactive.errors, automated.errors);
        assert!(interactive
            .errors
            .iter()
            .any(|e| e.kind() == ErrorKind::Permission));
    }

    #[test]
    fn test_valid_modification_commits() {
        let registry = Registry::builtin();
        let doc = committed();
        let cta = section_id(&doc, "cta");
        let edited = remove_node(&doc, &cta).unwrap();
        let next = apply(&doc, &Modification::replace_with(&edited), registry).unwrap();
        assert_eq!(next.count_section("cta"), 0);
    }

    #[test]
    fn test_from_json_reports_malformed_component() {
        let errors = Modification::from_json(
            r#"{"component": {"id": "page", "type": "main", "children": [42]}, "styleVariables": {"a": true}}"#,
        )
        .unwrap_err();
        let shown: Vec<_> = errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            shown,
            vec![
                "$.styleVariables.a: style variable must be a string, number or group",
                "$.component.children[0]: child must be a string or a node",
            ]
        );
    }

    #[test]
    fn test_from_json_partial() {
        let m = Modification::from_json(r##"{"styleVariables": {"primaryColor": "#000"}, "note": "ignored"}"##)
            .unwrap();
        assert!(m.component.is_none());
        assert_eq!(m.origin, Origin::Automated);
        assert!(!m.is_empty());
    }

    #[test]
    fn test_apply_json_invalid_json() {
        let doc = committed();
        let rejection = apply_json(&doc, "{oops", Registry::builtin()).unwrap_err();
        assert_eq!(rejection.errors[0].kind(), ErrorKind::Schema);
        assert_eq!(rejection.committed, doc);
    }
}
