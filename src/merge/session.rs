//! # Edit Session
//!
//! One editor's view of a page: the committed document, the content it is
//! previewed with, and at most one pending preview.
//!
//! A proposal that passes validation becomes the preview. Nothing reaches the
//! committed document until [`EditSession::apply`] promotes it. A new
//! proposal replaces any unapplied preview; previews are never combined.

use tracing::{debug, info};

use super::{evaluate, Modification, Rejection};
use crate::model::Document;
use crate::registry::Registry;
use crate::resolver::{ContentContext, ResolvedTree, Resolver};
use crate::validator::{Limits, ValidationWarning, Validator};

/// A validated candidate awaiting apply
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub document: Document,
    pub resolved: ResolvedTree,
    pub warnings: Vec<ValidationWarning>,
}

/// Editing state for a single page
#[derive(Debug, Clone)]
pub struct EditSession<'r> {
    validator: Validator<'r>,
    resolver: Resolver<'r>,
    content: ContentContext,
    committed: Document,
    preview: Option<Preview>,
}

impl<'r> EditSession<'r> {
    pub fn new(registry: &'r Registry, committed: Document, content: ContentContext) -> Self {
        Self {
            validator: Validator::new(registry),
            resolver: Resolver::new(registry),
            content,
            committed,
            preview: None,
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.validator = self.validator.with_limits(limits);
        self
    }

    pub fn with_keep_unresolved_vars(mut self, keep: bool) -> Self {
        self.resolver = self.resolver.with_keep_unresolved_vars(keep);
        self
    }

    pub fn committed(&self) -> &Document {
        &self.committed
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn content(&self) -> &ContentContext {
        &self.content
    }

    /// Swap the content context; a pending preview is re-resolved
    pub fn set_content(&mut self, content: ContentContext) {
        self.content = content;
        if let Some(preview) = &mut self.preview {
            preview.resolved = self.resolver.resolve(&preview.document, &self.content);
        }
    }

    /// Resolve the committed document
    pub fn render(&self) -> ResolvedTree {
        self.resolver.resolve(&self.committed, &self.content)
    }

    /// Validate a modification and make it the pending preview
    ///
    /// Any earlier unapplied preview is dropped first, whether or not this
    /// proposal is accepted.
    pub fn propose(&mut self, modification: Modification) -> Result<&Preview, Rejection> {
        if self.preview.take().is_some() {
            debug!("discarding unapplied preview");
        }

        let (document, warnings) = evaluate(&self.validator, &self.committed, &modification)?;
        let resolved = self.resolver.resolve(&document, &self.content);
        debug!(origin = %modification.origin, "preview ready");
        Ok(self.preview.insert(Preview {
            document,
            resolved,
            warnings,
        }))
    }

    /// [`propose`](Self::propose) for a raw JSON reply
    pub fn propose_json(&mut self, json: &str) -> Result<&Preview, Rejection> {
        self.preview = None;
        let modification = Modification::from_json(json)
            .map_err(|errors| Rejection::from_errors(&self.committed, errors))?;
        self.propose(modification)
    }

    /// Promote the preview to committed; `None` when there is nothing to apply
    pub fn apply(&mut self) -> Option<&Document> {
        let preview = self.preview.take()?;
        info!(
            template = %preview.document.metadata.template,
            sections = preview.document.sections().len(),
            "committed preview"
        );
        self.committed = preview.document;
        Some(&self.committed)
    }

    /// Drop the pending preview
    pub fn discard(&mut self) -> Option<Preview> {
        let dropped = self.preview.take();
        if dropped.is_some() {
            debug!("preview discarded");
        }
        dropped
    }
}
