use crate::permissions::TemplatePermissions;
use crate::workflow::Workflow;
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Helper defaults for serde ──

fn is_false(v: &bool) -> bool {
    !v
}

// ── Top-level template ──

/// A dynamic form template. The `type` tag (`CHECK` / `ROWS`) selects the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormTemplate {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub version: u32,
    pub workflow: Workflow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<TemplatePermissions>,
    #[serde(default)]
    pub validations: TemplateValidations,
    #[serde(flatten)]
    pub body: TemplateBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TemplateBody {
    #[serde(rename = "CHECK")]
    Check { fields: Vec<CheckField> },
    #[serde(rename = "ROWS")]
    Rows {
        #[serde(rename = "rowSchema")]
        row_schema: RowSchema,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateType {
    #[serde(rename = "CHECK")]
    Check,
    #[serde(rename = "ROWS")]
    Rows,
}

impl TemplateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Check => "CHECK",
            Self::Rows => "ROWS",
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FormTemplate {
    pub fn template_type(&self) -> TemplateType {
        match self.body {
            TemplateBody::Check { .. } => TemplateType::Check,
            TemplateBody::Rows { .. } => TemplateType::Rows,
        }
    }

    /// Keys of all fields or columns, in order.
    pub fn entry_keys(&self) -> Vec<&str> {
        match &self.body {
            TemplateBody::Check { fields } => fields.iter().map(|f| f.key.as_str()).collect(),
            TemplateBody::Rows { row_schema } => row_schema
                .columns
                .iter()
                .map(|c| c.key.as_str())
                .collect(),
        }
    }

    pub fn rules(&self) -> &[CheckValidRule] {
        &self.validations.rules
    }
}

// ── CHECK fields ──

/// Conditional visibility: show only when `field` currently equals `equals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleIf {
    pub field: String,
    pub equals: serde_json::Value,
}

/// A select option; the builder accepts both strings and numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl OptionValue {
    /// Whether a submitted JSON value selects this option.
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match (self, value) {
            (Self::Text(s), serde_json::Value::String(v)) => s == v,
            (Self::Int(i), serde_json::Value::Number(n)) => n.as_i64() == Some(*i),
            (Self::Float(f), serde_json::Value::Number(n)) => n.as_f64() == Some(*f),
            // Form inputs often post numbers as strings
            (Self::Int(i), serde_json::Value::String(v)) => v.parse::<i64>().ok() == Some(*i),
            (Self::Float(f), serde_json::Value::String(v)) => v.parse::<f64>().ok() == Some(*f),
            _ => false,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckField {
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_if: Option<VisibleIf>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// Field kind with its kind-specific attributes.
///
/// `options` and `formula` default to empty so a half-edited field still
/// deserializes; the validator reports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldKind {
    Boolean {
        #[serde(default, skip_serializing_if = "is_false")]
        na: bool,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    Date {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_date: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_date: Option<String>,
    },
    Select {
        #[serde(default)]
        options: Vec<OptionValue>,
    },
    File {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        mime: Vec<String>,
        #[serde(
            rename = "maxSizeMB",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        max_size_mb: Option<f64>,
    },
    Signature,
    Photo,
    Computed {
        #[serde(default)]
        formula: String,
    },
}

/// Kind names without attributes, used by builder operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindName {
    Boolean,
    Text,
    Number,
    Date,
    Select,
    File,
    Signature,
    Photo,
    Computed,
}

impl KindName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Select => "select",
            Self::File => "file",
            Self::Signature => "signature",
            Self::Photo => "photo",
            Self::Computed => "computed",
        }
    }

    /// Kinds a ROWS column may take.
    pub fn allowed_in_rows(&self) -> bool {
        !matches!(self, Self::File | Self::Signature | Self::Photo)
    }
}

impl fmt::Display for KindName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FieldKind {
    pub fn name(&self) -> KindName {
        match self {
            Self::Boolean { .. } => KindName::Boolean,
            Self::Text { .. } => KindName::Text,
            Self::Number { .. } => KindName::Number,
            Self::Date { .. } => KindName::Date,
            Self::Select { .. } => KindName::Select,
            Self::File { .. } => KindName::File,
            Self::Signature => KindName::Signature,
            Self::Photo => KindName::Photo,
            Self::Computed { .. } => KindName::Computed,
        }
    }
}

// ── ROWS columns ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rows: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<i64>,
    pub columns: Vec<RowColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowColumn {
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_if: Option<VisibleIf>,
    /// Value used for a cell the user left empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(flatten)]
    pub kind: ColumnKind,
}

/// Column kinds: the field kinds minus file, signature and photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColumnKind {
    Boolean,
    #[serde(rename_all = "camelCase")]
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Date,
    Select {
        #[serde(default)]
        options: Vec<OptionValue>,
    },
    Computed {
        #[serde(default)]
        formula: String,
    },
}

impl ColumnKind {
    pub fn name(&self) -> KindName {
        match self {
            Self::Boolean => KindName::Boolean,
            Self::Text { .. } => KindName::Text,
            Self::Number { .. } => KindName::Number,
            Self::Date => KindName::Date,
            Self::Select { .. } => KindName::Select,
            Self::Computed { .. } => KindName::Computed,
        }
    }
}

// ── Rules ──

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TemplateValidations {
    #[serde(default)]
    pub rules: Vec<CheckValidRule>,
}

/// `if values[when.field] == when.equals then apply constraint to then.field`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckValidRule {
    #[serde(rename = "if")]
    pub when: RuleCondition,
    pub then: RuleEffect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    pub field: String,
    pub equals: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEffect {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}
