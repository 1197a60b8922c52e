//! Approval workflow attached to every template.
//!
//! The state set is fixed (`draft → submitted → under_review → approved | rejected`);
//! what varies per template is which named transitions are enabled. The canonical
//! table lives in [`CANONICAL_TRANSITIONS`] and is the only place the default
//! transitions are spelled out - the factory and the builder's enable/disable
//! toggles both read from it.

use crate::error::{FormsError, FormsResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl WorkflowState {
    pub const ALL: [WorkflowState; 5] = [
        WorkflowState::Draft,
        WorkflowState::Submitted,
        WorkflowState::UnderReview,
        WorkflowState::Approved,
        WorkflowState::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named transition: allowed source states and the target state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDef {
    pub from: Vec<WorkflowState>,
    pub to: WorkflowState,
}

pub const SUBMIT: &str = "submit";
pub const START_REVIEW: &str = "start_review";
pub const APPROVE: &str = "approve";
pub const REJECT: &str = "reject";

/// Canonical transitions as `(action, from, to)`.
pub const CANONICAL_TRANSITIONS: [(&str, WorkflowState, WorkflowState); 4] = [
    (SUBMIT, WorkflowState::Draft, WorkflowState::Submitted),
    (START_REVIEW, WorkflowState::Submitted, WorkflowState::UnderReview),
    (APPROVE, WorkflowState::UnderReview, WorkflowState::Approved),
    (REJECT, WorkflowState::UnderReview, WorkflowState::Rejected),
];

/// Canonical definition of a transition, if `action` is one of the four.
pub fn canonical_transition(action: &str) -> Option<TransitionDef> {
    CANONICAL_TRANSITIONS
        .iter()
        .find(|(name, _, _)| *name == action)
        .map(|(_, from, to)| TransitionDef {
            from: vec![*from],
            to: *to,
        })
}

/// A structural defect in a workflow definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowIssue {
    pub action: String,
    pub message: String,
}

impl fmt::Display for WorkflowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action, self.message)
    }
}

/// State set plus the enabled transition table.
///
/// Transitions are kept in a `BTreeMap` so serialization and
/// `available_actions` are ordered by action name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub states: Vec<WorkflowState>,
    pub transitions: BTreeMap<String, TransitionDef>,
}

impl Default for Workflow {
    fn default() -> Self {
        let transitions = CANONICAL_TRANSITIONS
            .iter()
            .map(|(name, from, to)| {
                (
                    name.to_string(),
                    TransitionDef {
                        from: vec![*from],
                        to: *to,
                    },
                )
            })
            .collect();

        Self {
            states: WorkflowState::ALL.to_vec(),
            transitions,
        }
    }
}

impl Workflow {
    pub fn is_enabled(&self, action: &str) -> bool {
        self.transitions.contains_key(action)
    }

    /// Enable a canonical transition. Returns false for unknown action names.
    pub fn enable(&mut self, action: &str) -> bool {
        match canonical_transition(action) {
            Some(def) => {
                self.transitions.insert(action.to_string(), def);
                true
            }
            None => false,
        }
    }

    /// Disable a transition. Returns whether it was enabled.
    pub fn disable(&mut self, action: &str) -> bool {
        self.transitions.remove(action).is_some()
    }

    /// Check that every transition only references states in `states`.
    pub fn check_structure(&self) -> Vec<WorkflowIssue> {
        let mut issues = Vec::new();

        if self.states.is_empty() {
            issues.push(WorkflowIssue {
                action: "states".to_string(),
                message: "workflow declares no states".to_string(),
            });
        }

        for (action, def) in &self.transitions {
            if def.from.is_empty() {
                issues.push(WorkflowIssue {
                    action: action.clone(),
                    message: "transition has no source state".to_string(),
                });
            }
            for from in &def.from {
                if !self.states.contains(from) {
                    issues.push(WorkflowIssue {
                        action: action.clone(),
                        message: format!("source state '{}' is not declared", from),
                    });
                }
            }
            if !self.states.contains(&def.to) {
                issues.push(WorkflowIssue {
                    action: action.clone(),
                    message: format!("target state '{}' is not declared", def.to),
                });
            }
        }

        issues
    }

    /// Actions that can fire from `state`, ordered by name.
    pub fn available_actions(&self, state: WorkflowState) -> Vec<&str> {
        self.transitions
            .iter()
            .filter(|(_, def)| def.from.contains(&state))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Resolve the target state of `action` fired from `current`.
    pub fn apply(&self, action: &str, current: WorkflowState) -> FormsResult<WorkflowState> {
        let def = self
            .transitions
            .get(action)
            .ok_or_else(|| FormsError::TransitionNotEnabled {
                action: action.to_string(),
            })?;

        if !def.from.contains(&current) {
            return Err(FormsError::TransitionNotAllowed {
                action: action.to_string(),
                from: current,
            });
        }

        Ok(def.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_workflow_is_structurally_valid() {
        let wf = Workflow::default();
        assert_eq!(wf.states.len(), 5);
        assert_eq!(wf.transitions.len(), 4);
        assert!(wf.check_structure().is_empty());
    }

    #[test]
    fn test_undeclared_target_is_reported() {
        let mut wf = Workflow::default();
        wf.states.retain(|s| *s != WorkflowState::Rejected);
        let issues = wf.check_structure();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].action, "reject");
        assert!(issues[0].message.contains("rejected"));
    }

    #[test]
    fn test_undeclared_source_is_reported() {
        let mut wf = Workflow::default();
        wf.states.retain(|s| *s != WorkflowState::Draft);
        let issues = wf.check_structure();
        assert!(issues.iter().any(|i| i.action == "submit"));
    }

    #[test]
    fn test_apply_follows_table() {
        let wf = Workflow::default();
        assert_eq!(
            wf.apply("submit", WorkflowState::Draft).unwrap(),
            WorkflowState::Submitted
        );
        assert_eq!(
            wf.apply("reject", WorkflowState::UnderReview).unwrap(),
            WorkflowState::Rejected
        );
    }

    #[test]
    fn test_apply_rejects_wrong_source() {
        let wf = Workflow::default();
        let err = wf.apply("approve", WorkflowState::Draft).unwrap_err();
        assert!(matches!(err, FormsError::TransitionNotAllowed { .. }));
    }

    #[test]
    fn test_disabled_transition_cannot_fire() {
        let mut wf = Workflow::default();
        assert!(wf.disable("start_review"));
        assert!(!wf.disable("start_review"));
        let err = wf.apply("start_review", WorkflowState::Submitted).unwrap_err();
        assert!(matches!(err, FormsError::TransitionNotEnabled { .. }));

        assert!(wf.enable("start_review"));
        assert_eq!(wf, Workflow::default());
    }

    #[test]
    fn test_enable_unknown_action_is_refused() {
        let mut wf = Workflow::default();
        assert!(!wf.enable("archive"));
        assert!(!wf.is_enabled("archive"));
    }

    #[test]
    fn test_available_actions_sorted() {
        let wf = Workflow::default();
        assert_eq!(
            wf.available_actions(WorkflowState::UnderReview),
            vec!["approve", "reject"]
        );
        assert!(wf.available_actions(WorkflowState::Approved).is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Workflow::default()).unwrap();
        assert_eq!(json["states"][2], "under_review");
        assert_eq!(json["transitions"]["start_review"]["from"][0], "submitted");
        assert_eq!(json["transitions"]["start_review"]["to"], "under_review");
    }
}
