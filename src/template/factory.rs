//! Empty, valid templates of each type.

use super::types::{FormTemplate, RowSchema, TemplateBody, TemplateType, TemplateValidations};
use crate::config::BuilderConfig;
use crate::workflow::Workflow;

/// Placeholder id carried until the persistence layer assigns one.
pub const NEW_TEMPLATE_ID: &str = "new";

/// Empty CHECK template with the default workflow and permissions.
pub fn empty_check() -> FormTemplate {
    empty_check_with(&BuilderConfig::default())
}

/// Empty ROWS template: 1..=1000 rows, no columns yet.
pub fn empty_rows() -> FormTemplate {
    empty_rows_with(&BuilderConfig::default())
}

pub fn empty_check_with(config: &BuilderConfig) -> FormTemplate {
    base(config, TemplateBody::Check { fields: Vec::new() })
}

pub fn empty_rows_with(config: &BuilderConfig) -> FormTemplate {
    base(
        config,
        TemplateBody::Rows {
            row_schema: RowSchema {
                min_rows: Some(i64::from(config.rows.min_rows)),
                max_rows: Some(i64::from(config.rows.max_rows)),
                columns: Vec::new(),
            },
        },
    )
}

/// Empty template of the requested type.
pub fn empty_of(template_type: TemplateType, config: &BuilderConfig) -> FormTemplate {
    match template_type {
        TemplateType::Check => empty_check_with(config),
        TemplateType::Rows => empty_rows_with(config),
    }
}

fn base(config: &BuilderConfig, body: TemplateBody) -> FormTemplate {
    FormTemplate {
        id: NEW_TEMPLATE_ID.to_string(),
        slug: String::new(),
        name: String::new(),
        version: 1,
        workflow: Workflow::default(),
        permissions: Some(config.permissions.clone()),
        validations: TemplateValidations::default(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{PermissionKind, SystemRole};

    #[test]
    fn test_empty_check_shape() {
        let t = empty_check();
        assert_eq!(t.id, "new");
        assert_eq!(t.version, 1);
        assert_eq!(t.template_type(), TemplateType::Check);
        assert!(t.entry_keys().is_empty());
        assert!(t.rules().is_empty());
        assert_eq!(t.workflow.transitions.len(), 4);
        let perms = t.permissions.as_ref().unwrap();
        assert_eq!(perms.roles(PermissionKind::CanSubmit), &[SystemRole::User]);
    }

    #[test]
    fn test_empty_rows_shape() {
        let t = empty_rows();
        let TemplateBody::Rows { row_schema } = &t.body else {
            panic!("expected ROWS body");
        };
        assert_eq!(row_schema.min_rows, Some(1));
        assert_eq!(row_schema.max_rows, Some(1000));
        assert!(row_schema.columns.is_empty());
        assert_eq!(t.workflow, empty_check().workflow);
    }

    #[test]
    fn test_config_row_bounds_used() {
        let mut cfg = BuilderConfig::default();
        cfg.rows.min_rows = 2;
        cfg.rows.max_rows = 24;
        let t = empty_of(TemplateType::Rows, &cfg);
        let TemplateBody::Rows { row_schema } = &t.body else {
            panic!("expected ROWS body");
        };
        assert_eq!((row_schema.min_rows, row_schema.max_rows), (Some(2), Some(24)));
    }
}
