//! Record Validation
//!
//! Checks a filled record against its template before it is submitted.
//! CHECK records are a flat `key → value` map. ROWS records carry their rows
//! under `"rows"`; cell errors are keyed `"{row_index}.{key}"` and row-count
//! errors under [`ROWS_KEY`].

use crate::template::{
    CheckField, ColumnKind, FieldKind, FormTemplate, OptionValue, RowColumn, RowSchema,
    TemplateBody, TemplateErrors, VisibleIf,
};
use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};

/// Submitted values, keyed by field key.
pub type RecordValues = Map<String, Value>;

/// Record errors share the template error map shape: key → message.
pub type RecordErrors = TemplateErrors;

/// Error key for row-count violations.
pub const ROWS_KEY: &str = "_rows";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_record(template: &FormTemplate, values: &RecordValues) -> RecordErrors {
    let mut errs = RecordErrors::new();

    match &template.body {
        TemplateBody::Check { fields } => {
            let slots: Vec<Slot> = fields.iter().map(Slot::from).collect();
            let rule_patterns = compile_rule_patterns(template);
            check_slots(&slots, values, "", &mut errs);
            apply_rules(template, &rule_patterns, &slots, values, "", &mut errs);
        }
        TemplateBody::Rows { row_schema } => {
            validate_rows(template, row_schema, values, &mut errs);
        }
    }

    tracing::debug!(
        slug = %template.slug,
        error_count = errs.len(),
        "Validated record"
    );

    errs
}

fn validate_rows(
    template: &FormTemplate,
    schema: &RowSchema,
    values: &RecordValues,
    errs: &mut RecordErrors,
) {
    let rows = match values.get("rows") {
        None | Some(Value::Null) => &[][..],
        Some(Value::Array(rows)) => rows.as_slice(),
        Some(_) => {
            errs.set(ROWS_KEY, "Rows must be a list");
            return;
        }
    };

    let count = rows.len() as i64;
    let min = schema.min_rows.unwrap_or(0);
    if count < min {
        errs.set(ROWS_KEY, format!("At least {min} rows are required"));
    }
    if let Some(max) = schema.max_rows {
        if count > max {
            errs.set(ROWS_KEY, format!("At most {max} rows are allowed"));
        }
    }

    // Patterns are compiled once and shared by every row
    let slots: Vec<Slot> = schema.columns.iter().map(Slot::from).collect();
    let rule_patterns = compile_rule_patterns(template);

    for (idx, row) in rows.iter().enumerate() {
        let Value::Object(cells) = row else {
            errs.set(idx.to_string(), format!("Row {idx} is not an object"));
            continue;
        };
        let cells = with_column_defaults(&schema.columns, cells);
        let prefix = format!("{idx}.");
        check_slots(&slots, &cells, &prefix, errs);
        apply_rules(template, &rule_patterns, &slots, &cells, &prefix, errs);
    }
}

/// Fill blank cells from the column `default`.
fn with_column_defaults(columns: &[RowColumn], cells: &RecordValues) -> RecordValues {
    let mut filled = cells.clone();
    for col in columns {
        if let Some(default) = &col.default {
            if is_blank(filled.get(&col.key)) {
                filled.insert(col.key.clone(), default.clone());
            }
        }
    }
    filled
}

// ── Per-entry checks ──

/// Value constraints of one field or column kind.
enum Constraint<'a> {
    /// File, signature, photo: any non-blank value.
    Present,
    Boolean { na: bool },
    Text {
        max_length: Option<u32>,
        pattern: Option<Regex>,
    },
    Number { min: Option<f64>, max: Option<f64> },
    Date {
        min: Option<&'a str>,
        max: Option<&'a str>,
    },
    Select(&'a [OptionValue]),
    /// Derived by the form; never entered by the user.
    Computed,
}

struct Slot<'a> {
    key: &'a str,
    label: &'a str,
    required: bool,
    visible_if: Option<&'a VisibleIf>,
    constraint: Constraint<'a>,
}

impl<'a> From<&'a CheckField> for Slot<'a> {
    fn from(f: &'a CheckField) -> Self {
        let constraint = match &f.kind {
            FieldKind::Boolean { na } => Constraint::Boolean { na: *na },
            FieldKind::Text {
                max_length,
                pattern,
            } => Constraint::Text {
                max_length: *max_length,
                pattern: pattern.as_deref().and_then(compile_pattern),
            },
            FieldKind::Number { min, max } => Constraint::Number {
                min: *min,
                max: *max,
            },
            FieldKind::Date { min_date, max_date } => Constraint::Date {
                min: min_date.as_deref(),
                max: max_date.as_deref(),
            },
            FieldKind::Select { options } => Constraint::Select(options),
            FieldKind::File { .. } | FieldKind::Signature | FieldKind::Photo => {
                Constraint::Present
            }
            FieldKind::Computed { .. } => Constraint::Computed,
        };
        Slot {
            key: &f.key,
            label: &f.label,
            required: f.required,
            visible_if: f.visible_if.as_ref(),
            constraint,
        }
    }
}

impl<'a> From<&'a RowColumn> for Slot<'a> {
    fn from(c: &'a RowColumn) -> Self {
        let constraint = match &c.kind {
            ColumnKind::Boolean => Constraint::Boolean { na: false },
            ColumnKind::Text {
                max_length,
                pattern,
            } => Constraint::Text {
                max_length: *max_length,
                pattern: pattern.as_deref().and_then(compile_pattern),
            },
            ColumnKind::Number { min, max } => Constraint::Number {
                min: *min,
                max: *max,
            },
            ColumnKind::Date => Constraint::Date {
                min: None,
                max: None,
            },
            ColumnKind::Select { options } => Constraint::Select(options),
            ColumnKind::Computed { .. } => Constraint::Computed,
        };
        Slot {
            key: &c.key,
            label: &c.label,
            required: c.required,
            visible_if: c.visible_if.as_ref(),
            constraint,
        }
    }
}

fn check_slots(slots: &[Slot], values: &RecordValues, prefix: &str, errs: &mut RecordErrors) {
    for slot in slots {
        if matches!(slot.constraint, Constraint::Computed) || is_hidden(slot, values) {
            continue;
        }
        let value = values.get(slot.key);
        let message = if is_blank(value) {
            slot.required.then(|| format!("{} is required", slot.label))
        } else {
            value.and_then(|v| check_value(slot, v))
        };
        if let Some(message) = message {
            errs.set(format!("{prefix}{}", slot.key), message);
        }
    }
}

fn check_value(slot: &Slot, value: &Value) -> Option<String> {
    let label = slot.label;
    match &slot.constraint {
        Constraint::Present | Constraint::Computed => None,
        Constraint::Boolean { na } => match value {
            Value::Bool(_) => None,
            Value::String(s) if *na && s == "NA" => None,
            _ => Some(format!("{label} must be yes or no")),
        },
        Constraint::Text {
            max_length,
            pattern,
        } => {
            let Some(text) = value.as_str() else {
                return Some(format!("{label} must be text"));
            };
            if let Some(max) = max_length {
                if text.chars().count() > *max as usize {
                    return Some(format!("{label} must be at most {max} characters"));
                }
            }
            pattern.as_ref().and_then(|re| check_pattern(label, re, text))
        }
        Constraint::Number { min, max } => {
            let Some(n) = as_number(value) else {
                return Some(format!("{label} must be a number"));
            };
            check_range(label, n, *min, *max)
        }
        Constraint::Date { min, max } => {
            let Some(date) = value.as_str().and_then(parse_date) else {
                return Some(format!("{label} must be a date (YYYY-MM-DD)"));
            };
            if let Some(lo) = min.and_then(parse_date) {
                if date < lo {
                    return Some(format!("{label} must be on or after {lo}"));
                }
            }
            if let Some(hi) = max.and_then(parse_date) {
                if date > hi {
                    return Some(format!("{label} must be on or before {hi}"));
                }
            }
            None
        }
        Constraint::Select(options) => {
            if options.iter().any(|o| o.matches(value)) {
                None
            } else {
                Some(format!("{label} is not one of the options"))
            }
        }
    }
}

// ── Rules ──

/// Compiled `then.pattern` of each rule, by rule index.
fn compile_rule_patterns(template: &FormTemplate) -> Vec<Option<Regex>> {
    template
        .rules()
        .iter()
        .map(|rule| rule.then.pattern.as_deref().and_then(compile_pattern))
        .collect()
}

fn apply_rules(
    template: &FormTemplate,
    rule_patterns: &[Option<Regex>],
    slots: &[Slot],
    values: &RecordValues,
    prefix: &str,
    errs: &mut RecordErrors,
) {
    for (rule, pattern) in template.rules().iter().zip(rule_patterns) {
        if !condition_holds(values.get(&rule.when.field), &rule.when.equals) {
            continue;
        }
        let Some(target) = slots.iter().find(|s| s.key == rule.then.field) else {
            continue;
        };
        if is_hidden(target, values) {
            continue;
        }

        let key = format!("{prefix}{}", target.key);
        // A field keeps its first error.
        if errs.get(&key).is_some() {
            continue;
        }

        let value = values.get(target.key);
        let label = target.label;
        let effect = &rule.then;

        let message = if is_blank(value) {
            (effect.required == Some(true)).then(|| format!("{label} is required"))
        } else if effect.min.is_some() || effect.max.is_some() {
            match value.and_then(as_number) {
                Some(n) => check_range(label, n, effect.min, effect.max),
                None => Some(format!("{label} must be a number")),
            }
        } else {
            None
        };

        let message = message.or_else(|| {
            let re = pattern.as_ref()?;
            let text = value?.as_str()?;
            check_pattern(label, re, text)
        });

        if let Some(message) = message {
            errs.set(key, message);
        }
    }
}

/// Blank values match an empty-string condition, so `equals: ""` reads as "is empty".
fn condition_holds(value: Option<&Value>, equals: &Value) -> bool {
    match value {
        Some(v) if v == equals => true,
        _ => is_blank(value) && is_blank(Some(equals)),
    }
}

// ── Helpers ──

fn is_hidden(slot: &Slot, values: &RecordValues) -> bool {
    match slot.visible_if {
        Some(cond) => values.get(&cond.field) != Some(&cond.equals),
        None => false,
    }
}

/// Missing, null and empty string all count as "not filled in".
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

fn check_range(label: &str, n: f64, min: Option<f64>, max: Option<f64>) -> Option<String> {
    if let Some(min) = min {
        if n < min {
            return Some(format!("{label} must be at least {min}"));
        }
    }
    if let Some(max) = max {
        if n > max {
            return Some(format!("{label} must be at most {max}"));
        }
    }
    None
}

/// Uncompilable patterns are logged and skipped.
fn compile_pattern(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .inspect_err(|e| {
            tracing::warn!(pattern, error = %e, "Skipping uncompilable field pattern");
        })
        .ok()
}

fn check_pattern(label: &str, re: &Regex, text: &str) -> Option<String> {
    if re.is_match(text) {
        None
    } else {
        Some(format!("{label} has an invalid format"))
    }
}
