//! Component registry: the catalog of section types a page may contain
//!
//! Each [`ComponentDefinition`] carries the section's editor metadata, its
//! cardinality limits, the schemas of its editable and style fields, and a
//! canonical node fragment. [`PageTemplate`]s list the sections a new page
//! starts from.

mod definition;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

pub use definition::{ComponentDefinition, FieldConstraints, FieldDef, FieldType, PageTemplate};

use crate::model::{Document, DocumentError, Editable, Metadata, Node, StyleVariables};
use definition::Catalog;

/// Catalog compiled into the crate
pub const BUILTIN_CATALOG: &str = include_str!("catalog.json");

/// Errors that can occur while loading a catalog
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate component definition: {id}")]
    DuplicateComponent { id: String },

    #[error("duplicate page template: {id}")]
    DuplicatePage { id: String },

    #[error("template of '{id}' must have sectionType '{id}' on its root")]
    TemplateMismatch { id: String },

    #[error("template of '{component}' repeats node id '{node_id}'")]
    DuplicateNodeId { component: String, node_id: String },

    #[error("page template '{page}' references unknown section '{section}'")]
    UnknownSection { page: String, section: String },

    #[error("page template not found: {id}")]
    PageNotFound { id: String },
}

/// Whether a section may be added or removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintCheck {
    pub valid: bool,
    pub reason: Option<String>,
}

impl ConstraintCheck {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn denied(reason: String) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Read-only catalog of components and page templates
#[derive(Debug, Clone)]
pub struct Registry {
    components: Vec<ComponentDefinition>,
    index: HashMap<String, usize>,
    pages: Vec<PageTemplate>,
}

static BUILTIN: OnceLock<Registry> = OnceLock::new();

impl Registry {
    /// The catalog shipped with the crate, parsed on first use
    pub fn builtin() -> &'static Registry {
        BUILTIN.get_or_init(|| {
            Registry::from_json(BUILTIN_CATALOG).expect("Built-in catalog should be valid")
        })
    }

    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        Self::from_catalog(catalog)
    }

    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_json(&json)?;
        tracing::debug!(
            path = %path.display(),
            components = registry.components.len(),
            pages = registry.pages.len(),
            "loaded catalog"
        );
        Ok(registry)
    }

    fn from_catalog(catalog: Catalog) -> Result<Self, RegistryError> {
        let mut index = HashMap::new();
        for (i, def) in catalog.components.iter().enumerate() {
            if index.insert(def.id.clone(), i).is_some() {
                return Err(RegistryError::DuplicateComponent { id: def.id.clone() });
            }
            check_template(def)?;
        }

        let mut page_ids = HashSet::new();
        for page in &catalog.pages {
            if !page_ids.insert(page.id.as_str()) {
                return Err(RegistryError::DuplicatePage {
                    id: page.id.clone(),
                });
            }
            if let Some(section) = page.sections.iter().find(|s| !index.contains_key(*s)) {
                return Err(RegistryError::UnknownSection {
                    page: page.id.clone(),
                    section: section.clone(),
                });
            }
        }

        Ok(Self {
            components: catalog.components,
            index,
            pages: catalog.pages,
        })
    }

    pub fn get(&self, section_type: &str) -> Option<&ComponentDefinition> {
        self.index.get(section_type).map(|&i| &self.components[i])
    }

    pub fn contains(&self, section_type: &str) -> bool {
        self.index.contains_key(section_type)
    }

    /// Components in catalog order, optionally filtered by category
    pub fn list(&self, category: Option<&str>) -> Vec<&ComponentDefinition> {
        self.components
            .iter()
            .filter(|c| category.map_or(true, |cat| c.category == cat))
            .collect()
    }

    /// Distinct categories in order of first appearance
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.components
            .iter()
            .map(|c| c.category.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }

    pub fn pages(&self) -> &[PageTemplate] {
        &self.pages
    }

    pub fn page(&self, id: &str) -> Option<&PageTemplate> {
        self.pages.iter().find(|p| p.id == id)
    }

    /// Would adding or removing one `section_type` section keep `doc` within limits?
    pub fn check_constraint(
        &self,
        doc: &Document,
        section_type: &str,
        op: ConstraintOp,
    ) -> ConstraintCheck {
        let Some(def) = self.get(section_type) else {
            return ConstraintCheck::denied(format!("Unknown section type '{}'", section_type));
        };
        let count = doc.count_section(section_type);

        match op {
            ConstraintOp::Add => match def.max_count {
                Some(max) if count >= max => ConstraintCheck::denied(format!(
                    "Maximum {} {} sections allowed",
                    max, def.name
                )),
                _ => ConstraintCheck::ok(),
            },
            ConstraintOp::Remove => {
                if def.required && count <= 1 {
                    ConstraintCheck::denied(format!(
                        "At least one {} section is required",
                        def.name
                    ))
                } else {
                    ConstraintCheck::ok()
                }
            }
        }
    }

    /// Fresh copy of a section's canonical fragment
    ///
    /// Every id in the copy is new; placeholders are left untouched.
    pub fn instantiate(&self, section_type: &str) -> Result<Node, DocumentError> {
        let def = self
            .get(section_type)
            .ok_or_else(|| DocumentError::UnknownSection(section_type.to_string()))?;
        let mut node = def.template.clone();
        node.assign_fresh_ids();
        Ok(node)
    }

    /// Build a page from a page template
    pub fn new_document(&self, page_id: &str) -> Result<Document, RegistryError> {
        self.new_document_with_theme(page_id, &StyleVariables::new())
    }

    /// Build a page, seeding style variables from `theme` before the page's own
    pub fn new_document_with_theme(
        &self,
        page_id: &str,
        theme: &StyleVariables,
    ) -> Result<Document, RegistryError> {
        let page = self.page(page_id).ok_or_else(|| RegistryError::PageNotFound {
            id: page_id.to_string(),
        })?;

        let mut root = Node::new("page", "main").with_editable(Editable {
            moveable: false,
            removeable: false,
            duplicatable: false,
            ..Editable::default()
        });
        for section in &page.sections {
            let node = self
                .instantiate(section)
                .map_err(|_| RegistryError::UnknownSection {
                    page: page.id.clone(),
                    section: section.clone(),
                })?;
            root = root.with_child(node);
        }

        let mut style_variables = theme.clone();
        style_variables.extend(page.style_variables.clone());

        tracing::debug!(page = page_id, sections = page.sections.len(), "new document");
        Ok(Document {
            metadata: Metadata {
                name: page.name.clone(),
                description: page.description.clone(),
                template: page.id.clone(),
                version: "1.0".to_string(),
                features: page.features.clone(),
            },
            style_variables,
            animations: Default::default(),
            component: root,
        })
    }
}

fn check_template(def: &ComponentDefinition) -> Result<(), RegistryError> {
    if def.template.section_type.as_deref() != Some(def.id.as_str()) {
        return Err(RegistryError::TemplateMismatch { id: def.id.clone() });
    }
    let mut seen = HashSet::new();
    for id in def.template.ids() {
        if !seen.insert(id) {
            return Err(RegistryError::DuplicateNodeId {
                component: def.id.clone(),
                node_id: id.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::insert_node;
    use pretty_assertions::assert_eq;

    fn page_with_hero() -> Document {
        Document::new(
            Node::new("page", "main")
                .with_child(Node::new("header", "header").with_section("header"))
                .with_child(Node::new("hero", "section").with_section("hero"))
                .with_child(Node::new("footer", "footer").with_section("footer")),
        )
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let registry = Registry::builtin();
        assert!(registry.contains("hero"));
        assert_eq!(registry.get("hero").unwrap().name, "Hero Section");
        assert_eq!(registry.list(None).first().unwrap().id, "header");
    }

    #[test]
    fn test_list_by_category_keeps_order() {
        let ids: Vec<_> = Registry::builtin()
            .list(Some("conversion"))
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["pricing", "cta"]);
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            Registry::builtin().categories(),
            vec!["navigation", "content", "media", "social-proof", "conversion"]
        );
    }

    #[test]
    fn test_second_hero_is_rejected() {
        let check = Registry::builtin().check_constraint(&page_with_hero(), "hero", ConstraintOp::Add);
        assert_eq!(
            check,
            ConstraintCheck {
                valid: false,
                reason: Some("Maximum 1 Hero Section sections allowed".to_string()),
            }
        );
    }

    #[test]
    fn test_remove_last_required() {
        let registry = Registry::builtin();
        let doc = page_with_hero();
        let check = registry.check_constraint(&doc, "footer", ConstraintOp::Remove);
        assert_eq!(
            check.reason.as_deref(),
            Some("At least one Footer section is required")
        );
        assert!(registry.check_constraint(&doc, "hero", ConstraintOp::Remove).valid);
        assert!(registry.check_constraint(&doc, "cta", ConstraintOp::Add).valid);
    }

    #[test]
    fn test_unknown_section_type() {
        let check = Registry::builtin().check_constraint(&page_with_hero(), "marquee", ConstraintOp::Add);
        assert!(!check.valid);
        assert_eq!(check.reason.as_deref(), Some("Unknown section type 'marquee'"));
    }

    #[test]
    fn test_instantiate_twice_has_disjoint_ids() {
        let registry = Registry::builtin();
        let a = registry.instantiate("features").unwrap();
        let b = registry.instantiate("features").unwrap();
        let a_ids: HashSet<_> = a.ids().into_iter().collect();
        assert!(b.ids().iter().all(|id| !a_ids.contains(id)));
        assert_eq!(a.without_ids(), b.without_ids());
        assert_eq!(a.section_type.as_deref(), Some("features"));

        let doc = insert_node(&page_with_hero(), "page", a, 2).unwrap();
        assert!(insert_node(&doc, "page", b, 3).is_ok());
    }

    #[test]
    fn test_instantiate_unknown() {
        assert_eq!(
            Registry::builtin().instantiate("marquee").unwrap_err(),
            DocumentError::UnknownSection("marquee".to_string())
        );
    }

    #[test]
    fn test_new_document_from_page() {
        let doc = Registry::builtin().new_document("product-minimal").unwrap();
        assert_eq!(doc.metadata.template, "product-minimal");
        assert_eq!(
            doc.sections(),
            vec!["header", "hero", "specifications", "cta", "footer"]
        );
        assert_eq!(doc.style_variables["primaryColor"].as_str(), Some("#111827"));
    }

    #[test]
    fn test_theme_is_overridden_by_page() {
        let mut theme = StyleVariables::new();
        theme.insert("primaryColor".into(), "#000000".into());
        theme.insert("fontFamily".into(), "Inter, sans-serif".into());
        let doc = Registry::builtin()
            .new_document_with_theme("product-minimal", &theme)
            .unwrap();
        assert_eq!(doc.style_variables["primaryColor"].as_str(), Some("#111827"));
        assert_eq!(doc.style_variables["fontFamily"].as_str(), Some("Inter, sans-serif"));
    }

    #[test]
    fn test_catalog_rejects_mismatched_template() {
        let json = r#"{"components": [
            {"id": "hero", "name": "Hero", "template": {"id": "x", "type": "section", "sectionType": "banner"}}
        ]}"#;
        assert!(matches!(
            Registry::from_json(json),
            Err(RegistryError::TemplateMismatch { .. })
        ));
    }

    #[test]
    fn test_catalog_rejects_unknown_page_section() {
        let json = r#"{
            "components": [{"id": "hero", "name": "Hero", "template": {"id": "hero", "type": "section", "sectionType": "hero"}}],
            "pages": [{"id": "p", "name": "P", "sections": ["hero", "gallery"]}]
        }"#;
        let err = Registry::from_json(json).unwrap_err();
        assert_eq!(
            err.to_string(),
            "page template 'p' references unknown section 'gallery'"
        );
    }

    #[test]
    fn test_unbounded_max_count() {
        let json = r#"{"components": [
            {"id": "note", "name": "Note", "template": {"id": "note", "type": "aside", "sectionType": "note"}}
        ]}"#;
        let registry = Registry::from_json(json).unwrap();
        let doc = Document::new(Node::new("page", "main"));
        assert!(registry.check_constraint(&doc, "note", ConstraintOp::Add).valid);
    }
}
