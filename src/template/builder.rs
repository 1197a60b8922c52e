//! Template Builder
//!
//! In-memory edit operations performed by the form builder: adding and removing
//! fields or columns, wiring if/then rules, toggling workflow transitions and
//! permission roles. Every operation is a plain mutation of the wrapped
//! template; `errors()` re-derives the validation result after each edit.

use super::factory::empty_of;
use super::keys::unique_key;
use super::types::*;
use super::validate::{validate_template, TemplateErrors};
use crate::config::BuilderConfig;
use crate::error::{FormsError, FormsResult};
use crate::permissions::{PermissionKind, SystemRole, TemplatePermissions};

pub struct TemplateBuilder {
    template: FormTemplate,
    config: BuilderConfig,
}

impl TemplateBuilder {
    /// Start from an empty template of the given type.
    pub fn new(template_type: TemplateType, config: BuilderConfig) -> Self {
        Self {
            template: empty_of(template_type, &config),
            config,
        }
    }

    /// Continue editing an existing template.
    pub fn from_template(template: FormTemplate, config: BuilderConfig) -> Self {
        Self { template, config }
    }

    pub fn template(&self) -> &FormTemplate {
        &self.template
    }

    pub fn into_template(self) -> FormTemplate {
        self.template
    }

    pub fn errors(&self) -> TemplateErrors {
        validate_template(&self.template)
    }

    /// Save is allowed only when the template validates cleanly.
    pub fn can_save(&self) -> bool {
        self.errors().is_empty()
    }

    pub fn set_meta(&mut self, name: impl Into<String>, slug: impl Into<String>) {
        self.template.name = name.into();
        self.template.slug = slug.into();
    }

    /// Switch template type. The builder resets to an empty template of the
    /// new type; choosing the current type is a no-op.
    pub fn change_type(&mut self, template_type: TemplateType) {
        if self.template.template_type() == template_type {
            return;
        }
        tracing::debug!(
            from = %self.template.template_type(),
            to = %template_type,
            "Resetting template on type change"
        );
        self.template = empty_of(template_type, &self.config);
    }

    // ── Fields / columns ──

    /// Append a CHECK field of `kind` with a fresh key and kind defaults.
    /// Returns the generated key.
    pub fn add_field(&mut self, kind: KindName) -> FormsResult<String> {
        let defaults = &self.config.defaults;
        let TemplateBody::Check { fields } = &mut self.template.body else {
            return Err(FormsError::WrongTemplateType {
                operation: "add_field",
                template_type: "ROWS",
            });
        };

        let keys: Vec<&str> = fields.iter().map(|f| f.key.as_str()).collect();
        let key = unique_key(&keys, &format!("{}_1", kind));

        let kind = match kind {
            KindName::Boolean => FieldKind::Boolean { na: false },
            KindName::Text => FieldKind::Text {
                max_length: None,
                pattern: None,
            },
            KindName::Number => FieldKind::Number {
                min: None,
                max: None,
            },
            KindName::Date => FieldKind::Date {
                min_date: None,
                max_date: None,
            },
            KindName::Select => FieldKind::Select {
                options: defaults.select_options.clone(),
            },
            KindName::File => FieldKind::File {
                mime: defaults.file_mime.clone(),
                max_size_mb: Some(defaults.file_max_size_mb),
            },
            KindName::Signature => FieldKind::Signature,
            KindName::Photo => FieldKind::Photo,
            KindName::Computed => FieldKind::Computed {
                formula: defaults.formula.clone(),
            },
        };

        fields.push(CheckField {
            key: key.clone(),
            label: key.clone(),
            required: false,
            visible_if: None,
            kind,
        });
        Ok(key)
    }

    /// Append a ROWS column of `kind`. File, signature and photo are refused.
    pub fn add_column(&mut self, kind: KindName) -> FormsResult<String> {
        let defaults = &self.config.defaults;
        let TemplateBody::Rows { row_schema } = &mut self.template.body else {
            return Err(FormsError::WrongTemplateType {
                operation: "add_column",
                template_type: "CHECK",
            });
        };

        let kind = match kind {
            KindName::Boolean => ColumnKind::Boolean,
            KindName::Text => ColumnKind::Text {
                max_length: None,
                pattern: None,
            },
            KindName::Number => ColumnKind::Number {
                min: None,
                max: None,
            },
            KindName::Date => ColumnKind::Date,
            KindName::Select => ColumnKind::Select {
                options: defaults.column_select_options.clone(),
            },
            KindName::Computed => ColumnKind::Computed {
                formula: defaults.formula.clone(),
            },
            KindName::File | KindName::Signature | KindName::Photo => {
                return Err(FormsError::KindNotAllowedInColumns {
                    kind: kind.as_str(),
                });
            }
        };

        let keys: Vec<&str> = row_schema.columns.iter().map(|c| c.key.as_str()).collect();
        let key = unique_key(&keys, &format!("{}_1", kind.name()));

        row_schema.columns.push(RowColumn {
            key: key.clone(),
            label: key.clone(),
            required: false,
            visible_if: None,
            default: None,
            kind,
        });
        Ok(key)
    }

    /// Remove the field or column at `index`.
    pub fn remove_entry(&mut self, index: usize) -> FormsResult<()> {
        let len = match &mut self.template.body {
            TemplateBody::Check { fields } => {
                if index < fields.len() {
                    fields.remove(index);
                    return Ok(());
                }
                fields.len()
            }
            TemplateBody::Rows { row_schema } => {
                if index < row_schema.columns.len() {
                    row_schema.columns.remove(index);
                    return Ok(());
                }
                row_schema.columns.len()
            }
        };
        Err(FormsError::IndexOutOfRange { index, len })
    }

    /// Mutable access to a CHECK field, for label/required/attribute edits.
    pub fn field_mut(&mut self, index: usize) -> FormsResult<&mut CheckField> {
        match &mut self.template.body {
            TemplateBody::Check { fields } => {
                let len = fields.len();
                fields
                    .get_mut(index)
                    .ok_or(FormsError::IndexOutOfRange { index, len })
            }
            TemplateBody::Rows { .. } => Err(FormsError::WrongTemplateType {
                operation: "field_mut",
                template_type: "ROWS",
            }),
        }
    }

    pub fn column_mut(&mut self, index: usize) -> FormsResult<&mut RowColumn> {
        match &mut self.template.body {
            TemplateBody::Rows { row_schema } => {
                let len = row_schema.columns.len();
                row_schema
                    .columns
                    .get_mut(index)
                    .ok_or(FormsError::IndexOutOfRange { index, len })
            }
            TemplateBody::Check { .. } => Err(FormsError::WrongTemplateType {
                operation: "column_mut",
                template_type: "CHECK",
            }),
        }
    }

    /// Set row bounds; inverted bounds are accepted and left to the validator.
    pub fn set_row_bounds(&mut self, min_rows: Option<i64>, max_rows: Option<i64>) -> FormsResult<()> {
        match &mut self.template.body {
            TemplateBody::Rows { row_schema } => {
                row_schema.min_rows = min_rows;
                row_schema.max_rows = max_rows;
                Ok(())
            }
            TemplateBody::Check { .. } => Err(FormsError::WrongTemplateType {
                operation: "set_row_bounds",
                template_type: "CHECK",
            }),
        }
    }

    // ── Rules ──

    /// Keys a rule can refer to.
    pub fn rule_targets(&self) -> Vec<String> {
        self.template
            .entry_keys()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Append `if <first key> == "" then <first key> required`.
    pub fn add_rule(&mut self) -> usize {
        let first = self.rule_targets().into_iter().next().unwrap_or_default();
        self.template.validations.rules.push(CheckValidRule {
            when: RuleCondition {
                field: first.clone(),
                equals: serde_json::Value::String(String::new()),
            },
            then: RuleEffect {
                field: first,
                required: Some(true),
                min: None,
                max: None,
                pattern: None,
            },
        });
        self.template.validations.rules.len() - 1
    }

    pub fn rule_mut(&mut self, index: usize) -> FormsResult<&mut CheckValidRule> {
        let len = self.template.validations.rules.len();
        self.template
            .validations
            .rules
            .get_mut(index)
            .ok_or(FormsError::IndexOutOfRange { index, len })
    }

    pub fn remove_rule(&mut self, index: usize) -> FormsResult<()> {
        let rules = &mut self.template.validations.rules;
        if index >= rules.len() {
            return Err(FormsError::IndexOutOfRange {
                index,
                len: rules.len(),
            });
        }
        rules.remove(index);
        Ok(())
    }

    // ── Workflow / permissions ──

    /// Enable a canonical transition. Returns false for unknown action names.
    pub fn enable_transition(&mut self, action: &str) -> bool {
        self.template.workflow.enable(action)
    }

    pub fn disable_transition(&mut self, action: &str) -> bool {
        self.template.workflow.disable(action)
    }

    /// Toggle `role` in a permission set. Returns whether it is now granted.
    pub fn toggle_role(&mut self, kind: PermissionKind, role: SystemRole) -> bool {
        self.template
            .permissions
            .get_or_insert_with(TemplatePermissions::default)
            .toggle(kind, role)
    }
}
