//! Form Template Model
//!
//! Templates come in two shapes:
//! - `CHECK` - a flat checklist of named fields
//! - `ROWS` - a repeatable table of columns bounded by min/max rows
//!
//! ## Key Components
//!
//! - [`FormTemplate`] - the template document and its wire format
//! - [`validate_template`] - pre-save validation into a flat error map
//! - [`TemplateBuilder`] - edit operations of the form builder
//! - [`unique_key`] - collision-free key generation for new entries

pub mod builder;
pub mod codec;
pub mod factory;
pub mod keys;
pub mod types;
pub mod validate;

// Re-exports for convenience
pub use builder::TemplateBuilder;
pub use codec::{
    load_template_file, parse_template_json, parse_template_yaml, template_to_json,
    TemplateFormat,
};
pub use factory::{
    empty_check, empty_check_with, empty_of, empty_rows, empty_rows_with, NEW_TEMPLATE_ID,
};
pub use keys::{is_valid_key, unique_key, KEY_PATTERN};
pub use types::{
    CheckField, CheckValidRule, ColumnKind, FieldKind, FormTemplate, KindName, OptionValue,
    RowColumn, RowSchema, RuleCondition, RuleEffect, TemplateBody, TemplateType,
    TemplateValidations, VisibleIf,
};
pub use validate::{validate_template, TemplateErrors, FATAL};
