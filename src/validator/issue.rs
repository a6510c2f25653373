//! Validation findings

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::error::PlaceholderError;

/// Category of a validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Schema,
    Constraint,
    Permission,
    FieldType,
    PlaceholderSyntax,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Schema => write!(f, "schema"),
            ErrorKind::Constraint => write!(f, "constraint"),
            ErrorKind::Permission => write!(f, "permission"),
            ErrorKind::FieldType => write!(f, "field-type"),
            ErrorKind::PlaceholderSyntax => write!(f, "placeholder-syntax"),
        }
    }
}

/// A reason a document cannot be committed
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationError {
    #[error("{location}: {message}")]
    Schema { location: String, message: String },

    #[error("{section_type}: {message}")]
    Constraint {
        #[serde(rename = "sectionType")]
        section_type: String,
        message: String,
    },

    #[error("{node_id}: {message}")]
    Permission {
        #[serde(rename = "nodeId")]
        node_id: String,
        message: String,
    },

    #[error("{node_id}.{field}: {message}")]
    FieldType {
        #[serde(rename = "nodeId")]
        node_id: String,
        field: String,
        message: String,
    },

    #[error("{node_id} {location}: {message}")]
    PlaceholderSyntax {
        #[serde(rename = "nodeId")]
        node_id: String,
        location: String,
        message: String,
        /// The offending string
        text: String,
        #[serde(skip)]
        error: PlaceholderError,
    },
}

impl ValidationError {
    pub fn schema(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn constraint(section_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Constraint {
            section_type: section_type.into(),
            message: message.into(),
        }
    }

    pub fn permission(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Permission {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    pub fn field_type(
        node_id: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::FieldType {
            node_id: node_id.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn placeholder(
        node_id: impl Into<String>,
        location: impl Into<String>,
        text: impl Into<String>,
        error: PlaceholderError,
    ) -> Self {
        Self::PlaceholderSyntax {
            node_id: node_id.into(),
            location: location.into(),
            message: error.message(),
            text: text.into(),
            error,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Schema { .. } => ErrorKind::Schema,
            Self::Constraint { .. } => ErrorKind::Constraint,
            Self::Permission { .. } => ErrorKind::Permission,
            Self::FieldType { .. } => ErrorKind::FieldType,
            Self::PlaceholderSyntax { .. } => ErrorKind::PlaceholderSyntax,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Schema { message, .. }
            | Self::Constraint { message, .. }
            | Self::Permission { message, .. }
            | Self::FieldType { message, .. }
            | Self::PlaceholderSyntax { message, .. } => message,
        }
    }

    /// Source report for placeholder errors
    pub fn report(&self) -> Option<String> {
        match self {
            Self::PlaceholderSyntax {
                node_id,
                location,
                text,
                error,
                ..
            } => Some(error.format(text, &format!("{}/{}", node_id, location))),
            _ => None,
        }
    }
}

/// Category of a non-blocking finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningCategory {
    UnknownSection,
    Metadata,
    Accessibility,
}

impl fmt::Display for WarningCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningCategory::UnknownSection => write!(f, "unknown-section"),
            WarningCategory::Metadata => write!(f, "metadata"),
            WarningCategory::Accessibility => write!(f, "accessibility"),
        }
    }
}

/// A finding that does not block a commit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationWarning {
    pub category: WarningCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub message: String,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

/// Everything the validator found
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn new(errors: Vec<ValidationError>, warnings: Vec<ValidationWarning>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn errors_of(&self, kind: ErrorKind) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.kind() == kind)
    }

    pub fn has(&self, kind: ErrorKind) -> bool {
        self.errors_of(kind).next().is_some()
    }
}
