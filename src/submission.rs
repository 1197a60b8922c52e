//! Submission Lifecycle
//!
//! A submission is one filled record moving through its template's workflow.
//! Every transition is authorized against the template permissions, resolved
//! through the template's transition table and appended to the history.

use crate::error::{FormsError, FormsResult};
use crate::permissions::{authorize, SystemRole};
use crate::records::{validate_record, RecordValues};
use crate::template::FormTemplate;
use crate::workflow::{WorkflowState, SUBMIT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A filled record and its position in the workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    /// Template slug (e.g., "pre_transfusion")
    pub template_slug: String,
    /// Template version the record was filled against
    pub template_version: u32,

    pub state: WorkflowState,
    pub state_entered_at: DateTime<Utc>,

    #[serde(default)]
    pub values: RecordValues,

    pub history: Vec<StateTransition>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<String>,
}

/// Record of a state transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub action: String,
    pub from: WorkflowState,
    pub to: WorkflowState,
    pub at: DateTime<Utc>,
    /// User who fired the action
    pub by: String,
}

impl Submission {
    /// Start a draft against `template`.
    pub fn new(template: &FormTemplate, created_by: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            template_slug: template.slug.clone(),
            template_version: template.version,
            state: WorkflowState::Draft,
            state_entered_at: now,
            values: RecordValues::new(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
            created_by,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Set one value. Only drafts are editable.
    pub fn set_value(&mut self, key: impl Into<String>, value: serde_json::Value) -> FormsResult<()> {
        if self.state != WorkflowState::Draft {
            return Err(FormsError::TemplateState {
                slug: self.template_slug.clone(),
                reason: format!("submission {} is {} and can no longer be edited", self.id, self.state),
            });
        }
        self.values.insert(key.into(), value);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Actions `role` could fire right now.
    pub fn available_actions<'t>(&self, template: &'t FormTemplate, role: SystemRole) -> Vec<&'t str> {
        template
            .workflow
            .available_actions(self.state)
            .into_iter()
            .filter(|action| authorize(template.permissions.as_ref(), action, role).is_ok())
            .collect()
    }

    /// Authorize, apply and record `action`. Returns the new state.
    pub fn perform(
        &mut self,
        template: &FormTemplate,
        action: &str,
        role: SystemRole,
        by: &str,
    ) -> FormsResult<WorkflowState> {
        if template.slug != self.template_slug {
            return Err(FormsError::TemplateState {
                slug: template.slug.clone(),
                reason: format!("submission {} belongs to '{}'", self.id, self.template_slug),
            });
        }
        if template.version != self.template_version {
            return Err(FormsError::TemplateState {
                slug: template.slug.clone(),
                reason: format!(
                    "submission {} was filled against v{}, not v{}",
                    self.id, self.template_version, template.version
                ),
            });
        }

        if let Err(e) = authorize(template.permissions.as_ref(), action, role) {
            tracing::warn!(submission = %self.id, action, role = %role, "Transition refused");
            return Err(e);
        }

        let to = template.workflow.apply(action, self.state).inspect_err(|e| {
            tracing::warn!(submission = %self.id, action, error = %e, "Transition refused");
        })?;

        if action == SUBMIT {
            let errs = validate_record(template, &self.values);
            if !errs.is_empty() {
                tracing::warn!(
                    submission = %self.id,
                    error_count = errs.len(),
                    "Submit blocked by record errors"
                );
                return Err(FormsError::InvalidRecord(errs));
            }
        }

        self.transition_to(action, to, by);
        Ok(to)
    }

    fn transition_to(&mut self, action: &str, to: WorkflowState, by: &str) {
        let from = std::mem::replace(&mut self.state, to);
        let now = Utc::now();

        self.history.push(StateTransition {
            action: action.to_string(),
            from,
            to,
            at: now,
            by: by.to_string(),
        });

        self.state_entered_at = now;
        self.updated_at = now;

        tracing::info!(
            submission = %self.id,
            template = %self.template_slug,
            action,
            from = %from,
            to = %to,
            by,
            "Submission transitioned"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{empty_check, CheckField, FieldKind, TemplateBody};
    use serde_json::json;

    fn checklist() -> FormTemplate {
        let mut t = empty_check();
        t.name = "Bedside check".into();
        t.slug = "bedside_check".into();
        t.body = TemplateBody::Check {
            fields: vec![CheckField {
                key: "bag_id".into(),
                label: "Bag ID".into(),
                required: true,
                visible_if: None,
                kind: FieldKind::Text {
                    max_length: None,
                    pattern: None,
                },
            }],
        };
        t
    }

    #[test]
    fn test_full_approval_path() {
        let t = checklist();
        let mut s = Submission::new(&t, Some("nurse1".into()));
        s.set_value("bag_id", json!("BAG-001")).unwrap();

        s.perform(&t, "submit", SystemRole::User, "nurse1").unwrap();
        s.perform(&t, "start_review", SystemRole::Admin, "dr_lee").unwrap();
        let state = s.perform(&t, "approve", SystemRole::Admin, "dr_lee").unwrap();

        assert_eq!(state, WorkflowState::Approved);
        assert!(s.is_terminal());
        assert_eq!(s.history.len(), 3);
        assert_eq!(s.history[0].from, WorkflowState::Draft);
        assert_eq!(s.history[2].action, "approve");
        assert_eq!(s.history[2].by, "dr_lee");
    }

    #[test]
    fn test_submit_requires_valid_record() {
        let t = checklist();
        let mut s = Submission::new(&t, None);
        let err = s.perform(&t, "submit", SystemRole::User, "nurse1").unwrap_err();
        let FormsError::InvalidRecord(errs) = err else {
            panic!("expected InvalidRecord, got {err:?}");
        };
        assert_eq!(errs.get("bag_id"), Some("Bag ID is required"));
        assert_eq!(s.state, WorkflowState::Draft);
        assert!(s.history.is_empty());
    }

    #[test]
    fn test_role_checks() {
        let t = checklist();
        let mut s = Submission::new(&t, None);
        s.set_value("bag_id", json!("BAG-001")).unwrap();

        assert!(matches!(
            s.perform(&t, "submit", SystemRole::Admin, "admin1"),
            Err(FormsError::Unauthorized { .. })
        ));
        s.perform(&t, "submit", SystemRole::User, "nurse1").unwrap();
        assert!(matches!(
            s.perform(&t, "start_review", SystemRole::User, "nurse1"),
            Err(FormsError::Unauthorized { .. })
        ));
        s.perform(&t, "start_review", SystemRole::Superadmin, "root").unwrap();
        assert_eq!(s.state, WorkflowState::UnderReview);
    }

    #[test]
    fn test_wrong_state_and_disabled_actions() {
        let mut t = checklist();
        let mut s = Submission::new(&t, None);
        assert!(matches!(
            s.perform(&t, "approve", SystemRole::Admin, "dr_lee"),
            Err(FormsError::TransitionNotAllowed { .. })
        ));

        t.workflow.disable("submit");
        assert!(matches!(
            s.perform(&t, "submit", SystemRole::User, "nurse1"),
            Err(FormsError::TransitionNotEnabled { .. })
        ));
    }

    #[test]
    fn test_values_frozen_after_submit() {
        let t = checklist();
        let mut s = Submission::new(&t, None);
        s.set_value("bag_id", json!("BAG-001")).unwrap();
        s.perform(&t, "submit", SystemRole::User, "nurse1").unwrap();
        assert!(s.set_value("bag_id", json!("BAG-002")).is_err());
    }

    #[test]
    fn test_available_actions_by_role() {
        let t = checklist();
        let mut s = Submission::new(&t, None);
        assert_eq!(s.available_actions(&t, SystemRole::User), vec!["submit"]);
        assert!(s.available_actions(&t, SystemRole::Admin).is_empty());

        s.set_value("bag_id", json!("BAG-001")).unwrap();
        s.perform(&t, "submit", SystemRole::User, "nurse1").unwrap();
        s.perform(&t, "start_review", SystemRole::Admin, "dr_lee").unwrap();
        assert_eq!(
            s.available_actions(&t, SystemRole::Admin),
            vec!["approve", "reject"]
        );
    }

    #[test]
    fn test_other_version_refused() {
        let v1 = checklist();
        let mut v2 = checklist();
        v2.version = 2;
        if let TemplateBody::Check { fields } = &mut v2.body {
            fields[0].required = false;
        }

        let mut s = Submission::new(&v1, None);
        let err = s.perform(&v2, "submit", SystemRole::User, "nurse1").unwrap_err();
        assert!(matches!(err, FormsError::TemplateState { .. }));
        assert!(err.to_string().contains("v1, not v2"));
        assert_eq!(s.state, WorkflowState::Draft);

        assert!(matches!(
            s.perform(&v1, "submit", SystemRole::User, "nurse1"),
            Err(FormsError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_other_template_refused() {
        let t = checklist();
        let mut s = Submission::new(&t, None);
        let mut other = checklist();
        other.slug = "other_check".into();
        assert!(matches!(
            s.perform(&other, "submit", SystemRole::User, "nurse1"),
            Err(FormsError::TemplateState { .. })
        ));
    }
}
