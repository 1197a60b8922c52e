//! Role sets per template action.

use crate::error::{FormsError, FormsResult};
use crate::workflow::SUBMIT;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemRole {
    Superadmin,
    Admin,
    User,
}

impl SystemRole {
    pub const ALL: [SystemRole; 3] = [SystemRole::Superadmin, SystemRole::Admin, SystemRole::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Superadmin => "SUPERADMIN",
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }
}

impl fmt::Display for SystemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which permission set governs an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionKind {
    CanSubmit,
    CanReview,
    CanManageTemplate,
}

impl PermissionKind {
    /// Permission required to fire a workflow action. Everything past
    /// `submit` is a review action.
    pub fn for_action(action: &str) -> Self {
        if action == SUBMIT {
            Self::CanSubmit
        } else {
            Self::CanReview
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePermissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_submit: Option<Vec<SystemRole>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_review: Option<Vec<SystemRole>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_manage_template: Option<Vec<SystemRole>>,
}

impl TemplatePermissions {
    /// Factory defaults: users submit, admins review, admins and superadmins manage.
    pub fn builder_defaults() -> Self {
        Self {
            can_submit: Some(vec![SystemRole::User]),
            can_review: Some(vec![SystemRole::Admin]),
            can_manage_template: Some(vec![SystemRole::Superadmin, SystemRole::Admin]),
        }
    }

    pub fn roles(&self, kind: PermissionKind) -> &[SystemRole] {
        let set = match kind {
            PermissionKind::CanSubmit => &self.can_submit,
            PermissionKind::CanReview => &self.can_review,
            PermissionKind::CanManageTemplate => &self.can_manage_template,
        };
        set.as_deref().unwrap_or(&[])
    }

    fn roles_mut(&mut self, kind: PermissionKind) -> &mut Vec<SystemRole> {
        let set = match kind {
            PermissionKind::CanSubmit => &mut self.can_submit,
            PermissionKind::CanReview => &mut self.can_review,
            PermissionKind::CanManageTemplate => &mut self.can_manage_template,
        };
        set.get_or_insert_with(Vec::new)
    }

    /// Add the role if absent, remove it if present. Returns whether it is now granted.
    pub fn toggle(&mut self, kind: PermissionKind, role: SystemRole) -> bool {
        let roles = self.roles_mut(kind);
        if let Some(pos) = roles.iter().position(|r| *r == role) {
            roles.remove(pos);
            false
        } else {
            roles.push(role);
            true
        }
    }

    /// SUPERADMIN always passes; other roles must be listed.
    pub fn allows(&self, kind: PermissionKind, role: SystemRole) -> bool {
        role == SystemRole::Superadmin || self.roles(kind).contains(&role)
    }
}

/// Authorize `role` to fire `action` under optional template permissions.
pub fn authorize(
    permissions: Option<&TemplatePermissions>,
    action: &str,
    role: SystemRole,
) -> FormsResult<()> {
    let kind = PermissionKind::for_action(action);
    let allowed = match permissions {
        Some(p) => p.allows(kind, role),
        None => role == SystemRole::Superadmin,
    };

    if allowed {
        Ok(())
    } else {
        Err(FormsError::Unauthorized {
            action: action.to_string(),
            role,
        })
    }
}
