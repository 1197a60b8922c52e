//! Builder Configuration
//!
//! Defaults applied when templates are created or entries are added through the
//! builder. Loaded from YAML; every key is optional and falls back to the values
//! the builder has always used.
//!
//! ```yaml
//! rows:
//!   min_rows: 1
//!   max_rows: 500
//! defaults:
//!   select_options: ["Positivo", "Negativo"]
//!   file_max_size_mb: 5
//! permissions:
//!   canReview: [ADMIN, SUPERADMIN]
//! ```

use crate::error::{FormsError, FormsResult};
use crate::permissions::TemplatePermissions;
use crate::template::OptionValue;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderConfig {
    #[serde(default)]
    pub rows: RowDefaults,
    #[serde(default)]
    pub defaults: EntryDefaults,
    #[serde(default = "TemplatePermissions::builder_defaults")]
    pub permissions: TemplatePermissions,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            rows: RowDefaults::default(),
            defaults: EntryDefaults::default(),
            permissions: TemplatePermissions::builder_defaults(),
        }
    }
}

/// Row bounds given to new ROWS templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowDefaults {
    #[serde(default = "default_min_rows")]
    pub min_rows: u32,
    #[serde(default = "default_max_rows")]
    pub max_rows: u32,
}

fn default_min_rows() -> u32 {
    1
}

fn default_max_rows() -> u32 {
    1000
}

impl Default for RowDefaults {
    fn default() -> Self {
        Self {
            min_rows: default_min_rows(),
            max_rows: default_max_rows(),
        }
    }
}

/// Kind-specific attributes pre-filled on newly added fields and columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDefaults {
    #[serde(default = "default_select_options")]
    pub select_options: Vec<OptionValue>,
    #[serde(default = "default_column_select_options")]
    pub column_select_options: Vec<OptionValue>,
    #[serde(default = "default_file_mime")]
    pub file_mime: Vec<String>,
    #[serde(default = "default_file_max_size_mb")]
    pub file_max_size_mb: f64,
    #[serde(default = "default_formula")]
    pub formula: String,
}

fn default_select_options() -> Vec<OptionValue> {
    vec![
        OptionValue::Text("Option A".to_string()),
        OptionValue::Text("Option B".to_string()),
    ]
}

fn default_column_select_options() -> Vec<OptionValue> {
    vec![
        OptionValue::Text("A".to_string()),
        OptionValue::Text("B".to_string()),
    ]
}

fn default_file_mime() -> Vec<String> {
    vec!["image/*".to_string()]
}

fn default_file_max_size_mb() -> f64 {
    10.0
}

fn default_formula() -> String {
    "MAX(0, 100)".to_string()
}

impl Default for EntryDefaults {
    fn default() -> Self {
        Self {
            select_options: default_select_options(),
            column_select_options: default_column_select_options(),
            file_mime: default_file_mime(),
            file_max_size_mb: default_file_max_size_mb(),
            formula: default_formula(),
        }
    }
}

impl BuilderConfig {
    /// Load from a YAML file and validate.
    pub fn load_from_file(path: &Path) -> FormsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FormsError::io(path, e))?;
        Self::load_from_str(&content)
    }

    /// Load from a YAML string and validate.
    pub fn load_from_str(yaml: &str) -> FormsResult<Self> {
        let cfg: Self = serde_yaml::from_str(yaml).map_err(FormsError::yaml)?;
        cfg.validate()?;
        tracing::debug!(
            min_rows = cfg.rows.min_rows,
            max_rows = cfg.rows.max_rows,
            "Loaded builder config"
        );
        Ok(cfg)
    }

    pub fn validate(&self) -> FormsResult<()> {
        if self.rows.min_rows > self.rows.max_rows {
            return Err(FormsError::Config(format!(
                "rows.min_rows ({}) must not exceed rows.max_rows ({})",
                self.rows.min_rows, self.rows.max_rows
            )));
        }
        if self.defaults.formula.trim().is_empty() {
            return Err(FormsError::Config(
                "defaults.formula must not be empty".to_string(),
            ));
        }
        if self.defaults.select_options.is_empty() || self.defaults.column_select_options.is_empty()
        {
            return Err(FormsError::Config(
                "default select options must not be empty".to_string(),
            ));
        }
        if self.defaults.file_max_size_mb <= 0.0 {
            return Err(FormsError::Config(
                "defaults.file_max_size_mb must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{PermissionKind, SystemRole};
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        BuilderConfig::default().validate().unwrap();
    }

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let cfg = BuilderConfig::load_from_str("{}").unwrap();
        assert_eq!(cfg, BuilderConfig::default());
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = r#"
rows:
  max_rows: 50
defaults:
  select_options: ["Positivo", "Negativo"]
permissions:
  canReview: [ADMIN, SUPERADMIN]
"#;
        let cfg = BuilderConfig::load_from_str(yaml).unwrap();
        assert_eq!(cfg.rows.min_rows, 1);
        assert_eq!(cfg.rows.max_rows, 50);
        assert_eq!(
            cfg.defaults.select_options[0],
            OptionValue::Text("Positivo".into())
        );
        assert_eq!(cfg.defaults.formula, "MAX(0, 100)");
        assert_eq!(
            cfg.permissions.roles(PermissionKind::CanReview),
            &[SystemRole::Admin, SystemRole::Superadmin]
        );
        assert!(cfg.permissions.can_submit.is_none());
    }

    #[test]
    fn test_inverted_rows_rejected() {
        let err = BuilderConfig::load_from_str("rows: {min_rows: 10, max_rows: 2}").unwrap_err();
        assert!(matches!(err, FormsError::Config(_)));
    }

    #[test]
    fn test_blank_formula_rejected() {
        let err = BuilderConfig::load_from_str("defaults: {formula: '  '}").unwrap_err();
        assert!(matches!(err, FormsError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rows:\n  min_rows: 3").unwrap();
        let cfg = BuilderConfig::load_from_file(file.path()).unwrap();
        assert_eq!(cfg.rows.min_rows, 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = BuilderConfig::load_from_file(Path::new("/nonexistent/builder.yaml")).unwrap_err();
        assert!(matches!(err, FormsError::Io { .. }));
    }
}
