//! Error model for operations that can genuinely fail.
//!
//! Template validation itself never fails: it reports problems through
//! [`TemplateErrors`]. `FormsError` covers everything around it - parsing,
//! config loading, saving an invalid template, and workflow transitions.

use crate::template::TemplateErrors;
use crate::workflow::WorkflowState;
use crate::SystemRole;

pub type FormsResult<T> = Result<T, FormsError>;

#[derive(Debug, thiserror::Error)]
pub enum FormsError {
    /// Input could not be deserialized.
    #[error("Failed to parse {format}: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Save was blocked by a non-empty validation result.
    #[error("Template is not valid: {0}")]
    InvalidTemplate(TemplateErrors),

    /// Submission blocked by record validation.
    #[error("Record is not valid: {0}")]
    InvalidRecord(TemplateErrors),

    #[error("Transition '{action}' is not enabled for this template")]
    TransitionNotEnabled { action: String },

    #[error("Transition '{action}' cannot start from state '{from}'")]
    TransitionNotAllowed { action: String, from: WorkflowState },

    #[error("Role {role} may not perform '{action}'")]
    Unauthorized { action: String, role: SystemRole },

    #[error("Template not found: {slug}{}", version.map(|v| format!(" v{v}")).unwrap_or_default())]
    TemplateNotFound { slug: String, version: Option<u32> },

    /// Operation conflicts with the stored template's state (e.g. retired).
    #[error("Template {slug}: {reason}")]
    TemplateState { slug: String, reason: String },

    /// A builder operation does not apply to this template type.
    #[error("Operation '{operation}' is not available for {template_type} templates")]
    WrongTemplateType {
        operation: &'static str,
        template_type: &'static str,
    },

    /// File, signature and photo have no tabular form.
    #[error("ROWS columns cannot be of kind '{kind}'")]
    KindNotAllowedInColumns { kind: &'static str },

    #[error("No entry at index {index} (template has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Storage backend failure (e.g. a poisoned lock).
    #[error("Template store error: {0}")]
    Store(String),
}

impl FormsError {
    pub(crate) fn json(err: serde_json::Error) -> Self {
        Self::Parse {
            format: "JSON",
            message: err.to_string(),
        }
    }

    pub(crate) fn yaml(err: serde_yaml::Error) -> Self {
        Self::Parse {
            format: "YAML",
            message: err.to_string(),
        }
    }

    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
