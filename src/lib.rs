//! Hemo Forms - dynamic form templates for blood-bank records
//!
//! Administrators design forms as templates; staff fill them in as
//! submissions that move through an approval workflow.
//!
//! ## Flow
//! Builder edits -> validate_template -> TemplateStore::save (new version)
//! -> Submission::new -> validate_record -> submit -> start_review -> approve | reject
//!
//! ## Quick Start
//!
//! ```rust
//! use hemo_forms::template::{validate_template, TemplateBuilder, TemplateType, KindName};
//! use hemo_forms::config::BuilderConfig;
//!
//! let mut builder = TemplateBuilder::new(TemplateType::Check, BuilderConfig::default());
//! builder.set_meta("Pre-transfusion check", "pre_transfusion");
//! builder.add_field(KindName::Text).unwrap();
//! assert!(validate_template(builder.template()).is_empty());
//! ```

// Core error handling
pub mod error;

// Builder defaults (YAML)
pub mod config;

// Template model, validator, builder operations
pub mod template;

// Approval workflow and role checks
pub mod permissions;
pub mod workflow;

// Filled records
pub mod records;
pub mod submission;

// Versioned storage and assignments
pub mod registry;

pub use error::{FormsError, FormsResult};
pub use permissions::SystemRole;
pub use template::{validate_template, FormTemplate, TemplateErrors};
pub use workflow::{Workflow, WorkflowState};

pub mod prelude {
    pub use crate::config::BuilderConfig;
    pub use crate::error::{FormsError, FormsResult};
    pub use crate::permissions::{PermissionKind, SystemRole, TemplatePermissions};
    pub use crate::records::{validate_record, RecordErrors, RecordValues};
    pub use crate::registry::{FormAssignment, MemoryTemplateStore, TemplateStore};
    pub use crate::submission::{StateTransition, Submission};
    pub use crate::template::{
        empty_check, empty_rows, unique_key, validate_template, FormTemplate, TemplateBuilder,
        TemplateErrors, TemplateType,
    };
    pub use crate::workflow::{Workflow, WorkflowState};
}
