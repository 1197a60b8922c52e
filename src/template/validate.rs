use super::keys::is_valid_key;
use super::types::*;
use crate::workflow::Workflow;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Reserved key for errors that block saving outright.
pub const FATAL: &str = "_fatal";

/// Validation result: error id → human-readable message. Empty means valid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateErrors(BTreeMap<String, String>);

impl TemplateErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }

    pub fn fatal(&self) -> Option<&str> {
        self.get(FATAL)
    }

    pub fn is_fatal(&self) -> bool {
        self.0.contains_key(FATAL)
    }

    /// Set (or overwrite) an error.
    pub fn set(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.0.insert(key.into(), message.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl fmt::Display for TemplateErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Validate a template before it is saved.
///
/// Each category short-circuits on its first structural violation, but
/// categories are independent: `name`, `slug`, `_fatal`, `rules` and `workflow`
/// may all be set at once. Never fails and never mutates the template.
pub fn validate_template(t: &FormTemplate) -> TemplateErrors {
    let mut errs = TemplateErrors::new();

    if t.name.trim().is_empty() {
        errs.set("name", "Name is required");
    }
    // A whitespace-only slug is reported as invalid, not missing
    if t.slug.is_empty() {
        errs.set("slug", "Slug is required");
    } else if !is_valid_key(&t.slug) {
        errs.set("slug", "Slug is invalid");
    }

    match &t.body {
        TemplateBody::Check { fields } => {
            let entries = fields.iter().map(Entry::from);
            if let Some(msg) = first_entry_violation(entries, "fields", "field") {
                errs.set(FATAL, msg);
            }
        }
        TemplateBody::Rows { row_schema } => {
            if row_schema.min_rows.unwrap_or(0) > row_schema.max_rows.unwrap_or(0) {
                errs.set(FATAL, "minRows > maxRows");
            }
            let entries = row_schema.columns.iter().map(Entry::from);
            if let Some(msg) = first_entry_violation(entries, "columns", "column") {
                errs.set(FATAL, msg);
            }
            if row_schema.columns.is_empty() {
                errs.set(FATAL, "At least one column is required");
            }
        }
    }

    if let Some(msg) = first_rule_violation(t) {
        errs.set("rules", msg);
    }

    if let Some(msg) = first_workflow_violation(&t.workflow) {
        errs.set("workflow", msg);
    }

    tracing::debug!(
        slug = %t.slug,
        template_type = %t.template_type(),
        error_count = errs.len(),
        "Validated template"
    );

    errs
}

/// The per-entry view shared by fields and columns.
struct Entry<'a> {
    key: &'a str,
    label: &'a str,
    kind: KindName,
    has_options: bool,
    has_formula: bool,
}

impl<'a> From<&'a CheckField> for Entry<'a> {
    fn from(f: &'a CheckField) -> Self {
        let (has_options, has_formula) = match &f.kind {
            FieldKind::Select { options } => (!options.is_empty(), false),
            FieldKind::Computed { formula } => (false, !formula.is_empty()),
            FieldKind::Boolean { .. }
            | FieldKind::Text { .. }
            | FieldKind::Number { .. }
            | FieldKind::Date { .. }
            | FieldKind::File { .. }
            | FieldKind::Signature
            | FieldKind::Photo => (false, false),
        };
        Entry {
            key: &f.key,
            label: &f.label,
            kind: f.kind.name(),
            has_options,
            has_formula,
        }
    }
}

impl<'a> From<&'a RowColumn> for Entry<'a> {
    fn from(c: &'a RowColumn) -> Self {
        let (has_options, has_formula) = match &c.kind {
            ColumnKind::Select { options } => (!options.is_empty(), false),
            ColumnKind::Computed { formula } => (false, !formula.is_empty()),
            ColumnKind::Boolean
            | ColumnKind::Text { .. }
            | ColumnKind::Number { .. }
            | ColumnKind::Date => (false, false),
        };
        Entry {
            key: &c.key,
            label: &c.label,
            kind: c.kind.name(),
            has_options,
            has_formula,
        }
    }
}

/// Walk entries in order and report the first structural violation.
fn first_entry_violation<'a>(
    entries: impl Iterator<Item = Entry<'a>>,
    plural: &str,
    singular: &str,
) -> Option<String> {
    let mut seen: HashSet<&str> = HashSet::new();

    for e in entries {
        if e.key.is_empty() || !is_valid_key(e.key) {
            return Some(format!("Invalid keys in {plural}"));
        }
        if !seen.insert(e.key) {
            return Some(format!("Duplicate keys in {plural}"));
        }
        if e.label.trim().is_empty() {
            return Some(format!("Empty labels in {plural}"));
        }
        match e.kind {
            KindName::Select if !e.has_options => {
                return Some(format!("The {singular} {} requires options", e.key));
            }
            KindName::Computed if !e.has_formula => {
                return Some(format!("The {singular} {} requires a formula", e.key));
            }
            _ => {}
        }
    }

    None
}

/// Rules must reference fields or columns that exist.
fn first_rule_violation(t: &FormTemplate) -> Option<String> {
    let keys: HashSet<&str> = t.entry_keys().into_iter().collect();

    for (idx, rule) in t.rules().iter().enumerate() {
        if !keys.contains(rule.when.field.as_str()) {
            return Some(format!(
                "Rule {} condition references unknown field '{}'",
                idx + 1,
                rule.when.field
            ));
        }
        if !keys.contains(rule.then.field.as_str()) {
            return Some(format!(
                "Rule {} target references unknown field '{}'",
                idx + 1,
                rule.then.field
            ));
        }
        if let Some(pattern) = &rule.then.pattern {
            if let Err(e) = regex::Regex::new(pattern) {
                return Some(format!("Rule {} pattern is invalid: {}", idx + 1, e));
            }
        }
        if let (Some(min), Some(max)) = (rule.then.min, rule.then.max) {
            if min > max {
                return Some(format!("Rule {} has min > max", idx + 1));
            }
        }
    }

    None
}

fn first_workflow_violation(workflow: &Workflow) -> Option<String> {
    workflow
        .check_structure()
        .into_iter()
        .next()
        .map(|issue| issue.to_string())
}
