//! Storefront Templates - section-based page documents for product storefronts
//!
//! This library provides the document model, section registry, placeholder
//! resolver, validator and modification merge engine behind a storefront page
//! editor. Every change, whether made by a person in the editor or proposed by
//! a generative service, goes through the same validator before it is
//! committed.
//!
//! # Example
//!
//! ```rust
//! use storefront_templates::{resolve, ContentContext, Registry};
//!
//! let registry = Registry::builtin();
//! let doc = registry.new_document("product-minimal").unwrap();
//! let ctx = ContentContext::new(serde_json::json!({"basics": {"name": "Desk Lamp"}}));
//! let tree = resolve(&doc, &ctx, registry);
//! assert!(tree.to_json_pretty().contains("Desk Lamp"));
//! ```

pub mod config;
pub mod error;
pub mod merge;
pub mod model;
pub mod placeholder;
pub mod registry;
pub mod resolver;
pub mod validator;

pub use config::{ConfigError, EngineConfig};
pub use error::PlaceholderError;
pub use merge::{apply, apply_json, EditSession, Modification, Origin, Preview, Rejection};
pub use model::{Document, DocumentError, Metadata, Node, StyleValue, StyleVariables};
pub use registry::{ComponentDefinition, Registry, RegistryError};
pub use resolver::{resolve, ContentContext, ResolvedNode, ResolvedTree, Resolver};
pub use validator::{validate, ErrorKind, Limits, ValidationError, ValidationReport, Validator};

use thiserror::Error;

/// Errors that can occur while setting up an [`Engine`]
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("catalog error: {0}")]
    Registry(#[from] RegistryError),
}

/// A configured registry, validator and resolver
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    /// Catalog loaded from the config; the built-in one otherwise
    catalog: Option<Registry>,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            catalog: None,
        }
    }
}

impl Engine {
    /// Create an engine, loading the configured catalog if there is one
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let catalog = config.load_registry()?;
        Ok(Self { config, catalog })
    }

    /// Use this registry instead of the configured one
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.catalog = Some(registry);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        self.catalog.as_ref().unwrap_or_else(|| Registry::builtin())
    }

    pub fn validator(&self) -> Validator<'_> {
        Validator::new(self.registry()).with_limits(self.config.limits)
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.registry())
            .with_keep_unresolved_vars(self.config.resolver.keep_unresolved_vars)
    }

    /// New page from a page template, seeded with the configured theme
    pub fn new_document(&self, page_id: &str) -> Result<Document, RegistryError> {
        self.registry()
            .new_document_with_theme(page_id, &self.config.theme)
    }

    pub fn session(&self, committed: Document, content: ContentContext) -> EditSession<'_> {
        EditSession::new(self.registry(), committed, content)
            .with_limits(self.config.limits)
            .with_keep_unresolved_vars(self.config.resolver.keep_unresolved_vars)
    }

    /// Validate a modification and resolve the candidate without committing it
    pub fn preview(
        &self,
        doc: &Document,
        modification: Modification,
        ctx: &ContentContext,
    ) -> Result<Preview, Rejection> {
        let mut session = self.session(doc.clone(), ctx.clone());
        session.propose(modification)?;
        // propose just stored the preview
        session.discard().ok_or_else(|| Rejection::from_errors(doc, Vec::new()))
    }
}

/// Validate a modification and resolve the candidate with default settings
///
/// # Example
///
/// ```rust
/// use storefront_templates::{preview, ContentContext, Modification, Registry};
///
/// let registry = Registry::builtin();
/// let doc = registry.new_document("product-minimal").unwrap();
/// let modification = Modification::from_json(r##"{"styleVariables": {"primaryColor": "#111111"}}"##)
///     .unwrap();
/// let preview = preview(&doc, modification, &ContentContext::default(), registry).unwrap();
/// assert_eq!(preview.document.style_variables["primaryColor"].as_str(), Some("#111111"));
/// ```
pub fn preview(
    doc: &Document,
    modification: Modification,
    ctx: &ContentContext,
    registry: &Registry,
) -> Result<Preview, Rejection> {
    let mut session = EditSession::new(registry, doc.clone(), ctx.clone());
    session.propose(modification)?;
    session
        .discard()
        .ok_or_else(|| Rejection::from_errors(doc, Vec::new()))
}
