//! Template Registry
//!
//! Versioned template storage. Each save of a slug produces a new immutable
//! version; the template id is assigned on first save and kept for life.

use crate::error::{FormsError, FormsResult};
use crate::template::{validate_template, FormTemplate, NEW_TEMPLATE_ID};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use uuid::Uuid;

/// Persistence trait for form templates.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Validate and store as the next version of its slug. Returns what was stored.
    async fn save(&self, template: FormTemplate) -> FormsResult<FormTemplate>;
    async fn load(&self, slug: &str, version: u32) -> FormsResult<Option<FormTemplate>>;
    async fn latest(&self, slug: &str) -> FormsResult<Option<FormTemplate>>;
    /// `version: None` loads the latest version.
    async fn load_by_id(&self, id: &str, version: Option<u32>)
        -> FormsResult<Option<FormTemplate>>;
    /// Latest version of every active slug.
    async fn list(&self) -> FormsResult<Vec<FormTemplate>>;
    async fn retire(&self, slug: &str) -> FormsResult<()>;
    async fn is_retired(&self, slug: &str) -> FormsResult<bool>;
}

/// Which template version a user fills in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormAssignment {
    pub user_id: String,
    #[serde(rename = "formTemplateId")]
    pub template_id: String,
    #[serde(default)]
    pub pin_version: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_version: Option<u32>,
}

/// Resolve the template an assignment points at.
pub async fn resolve_assignment(
    store: &dyn TemplateStore,
    assignment: &FormAssignment,
) -> FormsResult<FormTemplate> {
    let version = if assignment.pin_version {
        assignment.assigned_version
    } else {
        None
    };

    let template = store
        .load_by_id(&assignment.template_id, version)
        .await?
        .ok_or_else(|| FormsError::TemplateNotFound {
            slug: assignment.template_id.clone(),
            version,
        })?;

    if store.is_retired(&template.slug).await? {
        return Err(FormsError::TemplateState {
            slug: template.slug,
            reason: "template is retired".to_string(),
        });
    }

    Ok(template)
}

// ── MemoryTemplateStore ──

#[derive(Default)]
struct SlugEntry {
    versions: BTreeMap<u32, FormTemplate>,
    retired: bool,
}

impl SlugEntry {
    fn latest(&self) -> Option<&FormTemplate> {
        self.versions.values().next_back()
    }
}

#[derive(Default)]
struct StoreInner {
    slugs: HashMap<String, SlugEntry>,
    /// Template id -> owning slug
    ids: HashMap<String, String>,
}

/// In-memory TemplateStore for tests and single-process use.
#[derive(Default)]
pub struct MemoryTemplateStore {
    inner: RwLock<StoreInner>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_err(e: impl std::fmt::Display) -> FormsError {
    FormsError::Store(format!("Lock: {}", e))
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn save(&self, mut template: FormTemplate) -> FormsResult<FormTemplate> {
        let errs = validate_template(&template);
        if !errs.is_empty() {
            tracing::warn!(slug = %template.slug, errors = %errs, "Refusing to save invalid template");
            return Err(FormsError::InvalidTemplate(errs));
        }

        let mut guard = self.inner.write().map_err(lock_err)?;
        let StoreInner { slugs, ids } = &mut *guard;

        let fresh_id = template.id.is_empty() || template.id == NEW_TEMPLATE_ID;
        if !fresh_id {
            if let Some(owner) = ids.get(&template.id).filter(|o| **o != template.slug) {
                tracing::warn!(slug = %template.slug, id = %template.id, owner = %owner, "Refusing id owned by another slug");
                return Err(FormsError::TemplateState {
                    reason: format!("id {} already belongs to '{}'", template.id, owner),
                    slug: template.slug,
                });
            }
        }

        let entry = slugs.entry(template.slug.clone()).or_default();

        if entry.retired {
            return Err(FormsError::TemplateState {
                slug: template.slug,
                reason: "template is retired".to_string(),
            });
        }

        match entry.latest() {
            Some(prev) => {
                template.id = prev.id.clone();
                template.version = prev.version + 1;
            }
            None => {
                if fresh_id {
                    template.id = Uuid::new_v4().to_string();
                }
                template.version = 1;
                ids.insert(template.id.clone(), template.slug.clone());
            }
        }

        entry.versions.insert(template.version, template.clone());

        tracing::info!(
            slug = %template.slug,
            id = %template.id,
            version = template.version,
            "Saved template"
        );
        Ok(template)
    }

    async fn load(&self, slug: &str, version: u32) -> FormsResult<Option<FormTemplate>> {
        let store = self.inner.read().map_err(lock_err)?;
        Ok(store
            .slugs
            .get(slug)
            .and_then(|e| e.versions.get(&version))
            .cloned())
    }

    async fn latest(&self, slug: &str) -> FormsResult<Option<FormTemplate>> {
        let store = self.inner.read().map_err(lock_err)?;
        Ok(store.slugs.get(slug).and_then(SlugEntry::latest).cloned())
    }

    async fn load_by_id(
        &self,
        id: &str,
        version: Option<u32>,
    ) -> FormsResult<Option<FormTemplate>> {
        let store = self.inner.read().map_err(lock_err)?;
        let Some(entry) = store.ids.get(id).and_then(|slug| store.slugs.get(slug)) else {
            return Ok(None);
        };

        Ok(match version {
            Some(v) => entry.versions.get(&v).cloned(),
            None => entry.latest().cloned(),
        })
    }

    async fn list(&self) -> FormsResult<Vec<FormTemplate>> {
        let store = self.inner.read().map_err(lock_err)?;
        let mut results: Vec<FormTemplate> = store
            .slugs
            .values()
            .filter(|e| !e.retired)
            .filter_map(SlugEntry::latest)
            .cloned()
            .collect();
        results.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(results)
    }

    async fn retire(&self, slug: &str) -> FormsResult<()> {
        let mut store = self.inner.write().map_err(lock_err)?;
        let entry = store
            .slugs
            .get_mut(slug)
            .filter(|e| !e.versions.is_empty())
            .ok_or_else(|| FormsError::TemplateNotFound {
                slug: slug.to_string(),
                version: None,
            })?;

        entry.retired = true;
        tracing::info!(slug, "Retired template");
        Ok(())
    }

    async fn is_retired(&self, slug: &str) -> FormsResult<bool> {
        let store = self.inner.read().map_err(lock_err)?;
        Ok(store.slugs.get(slug).is_some_and(|e| e.retired))
    }
}
