use super::types::FormTemplate;
use crate::error::{FormsError, FormsResult};
use std::path::Path;

/// Parse a template from JSON.
///
/// Validation is NOT performed here - call `validate_template()` on the result
/// before trusting it.
pub fn parse_template_json(json: &str) -> FormsResult<FormTemplate> {
    serde_json::from_str(json).map_err(FormsError::json)
}

/// Parse a template from YAML. Same contract as [`parse_template_json`].
pub fn parse_template_yaml(yaml: &str) -> FormsResult<FormTemplate> {
    serde_yaml::from_str(yaml).map_err(FormsError::yaml)
}

pub fn template_to_json(t: &FormTemplate) -> FormsResult<String> {
    serde_json::to_string_pretty(t).map_err(FormsError::json)
}

/// Input format for [`load_template_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFormat {
    Json,
    Yaml,
    /// Pick by file extension: `.yaml`/`.yml` → YAML, anything else → JSON.
    Auto,
}

pub fn load_template_file(path: &Path, format: TemplateFormat) -> FormsResult<FormTemplate> {
    let content = std::fs::read_to_string(path).map_err(|e| FormsError::io(path, e))?;

    let format = match format {
        TemplateFormat::Auto => match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => TemplateFormat::Yaml,
            _ => TemplateFormat::Json,
        },
        other => other,
    };

    match format {
        TemplateFormat::Yaml => parse_template_yaml(&content),
        _ => parse_template_json(&content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::types::*;
    use crate::template::validate::validate_template;
    use std::io::Write;

    const CHECK_JSON: &str = r#"{
        "id": "tpl-1",
        "slug": "pre_transfusion",
        "name": "Pre-transfusion checklist",
        "type": "CHECK",
        "version": 2,
        "workflow": {
            "states": ["draft", "submitted", "under_review", "approved", "rejected"],
            "transitions": {
                "submit": { "from": ["draft"], "to": "submitted" },
                "approve": { "from": ["submitted"], "to": "approved" }
            }
        },
        "fields": [
            { "key": "patient_id", "label": "Patient ID", "kind": "text", "required": true },
            { "key": "abo", "label": "ABO", "kind": "select", "options": ["A", "B", "AB", "O"] },
            { "key": "consent", "label": "Consent", "kind": "boolean", "na": true },
            { "key": "hb", "label": "Hemoglobin", "kind": "number", "min": 0, "max": 25,
              "visibleIf": { "field": "consent", "equals": true } }
        ],
        "validations": { "rules": [] },
        "permissions": { "canSubmit": ["USER"], "canReview": ["ADMIN"] }
    }"#;

    #[test]
    fn test_parse_check_json() {
        let t = parse_template_json(CHECK_JSON).unwrap();
        assert_eq!(t.template_type(), TemplateType::Check);
        assert_eq!(t.version, 2);
        assert_eq!(t.entry_keys(), vec!["patient_id", "abo", "consent", "hb"]);
        assert_eq!(t.workflow.transitions.len(), 2);
        assert!(validate_template(&t).is_empty());
    }

    #[test]
    fn test_json_round_trip_stays_valid() {
        let t = parse_template_json(CHECK_JSON).unwrap();
        let json = template_to_json(&t).unwrap();
        let back = parse_template_json(&json).unwrap();
        assert_eq!(back, t);
        assert!(validate_template(&back).is_empty());
    }

    #[test]
    fn test_parse_rows_yaml() {
        let yaml = r#"
id: new
slug: fridge_log
name: Fridge temperature log
type: ROWS
version: 1
workflow:
  states: [draft, submitted, under_review, approved, rejected]
  transitions:
    submit: { from: [draft], to: submitted }
rowSchema:
  minRows: 1
  maxRows: 31
  columns:
    - key: day
      label: Day
      kind: date
      required: true
    - key: temp
      label: Temperature
      kind: number
      min: 2
      max: 6
      default: 4
"#;
        let t = parse_template_yaml(yaml).unwrap();
        let TemplateBody::Rows { row_schema } = &t.body else {
            panic!("expected ROWS body");
        };
        assert_eq!(row_schema.max_rows, Some(31));
        assert_eq!(row_schema.columns[1].default, Some(serde_json::json!(4)));
        assert_eq!(
            row_schema.columns[1].kind,
            ColumnKind::Number {
                min: Some(2.0),
                max: Some(6.0)
            }
        );
        assert!(t.permissions.is_none());
        assert!(validate_template(&t).is_empty());
    }

    #[test]
    fn test_unknown_type_fails() {
        let json = CHECK_JSON.replace("\"CHECK\"", "\"GRID\"");
        let err = parse_template_json(&json).unwrap_err();
        assert!(matches!(err, FormsError::Parse { format: "JSON", .. }));
    }

    #[test]
    fn test_load_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{}", CHECK_JSON).unwrap();
        let t = load_template_file(file.path(), TemplateFormat::Auto).unwrap();
        assert_eq!(t.slug, "pre_transfusion");
    }
}
