use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use crate::DemographicSelection;

/// A saved audience selection plus the summary figures computed for it.
/// The store never recomputes these; callers run the estimator first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudienceGroup {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub personas: Vec<String>,
    pub demographics: DemographicSelection,
    pub total_audience: u64,
    pub unduplicated: u64,
    pub overlap_factor: f64,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct AudienceGroupDraft {
    pub name: Option<String>,
    pub personas: Vec<String>,
    pub demographics: DemographicSelection,
    pub total_audience: u64,
    pub unduplicated: u64,
    pub overlap_factor: f64,
}

#[derive(Debug, Clone, Default)]
pub struct AudienceGroupPatch {
    pub name: Option<String>,
    pub personas: Option<Vec<String>>,
    pub demographics: Option<DemographicSelection>,
    pub total_audience: Option<u64>,
    pub unduplicated: Option<u64>,
    pub overlap_factor: Option<f64>,
}

/// Durable audience-group storage, one JSON file holding every user's
/// groups. All operations are scoped by a caller-supplied opaque user id.
pub struct AudienceGroupStore {
    path: PathBuf,
    groups: RwLock<HashMap<String, Vec<AudienceGroup>>>,
}

static GROUP_COUNTER: AtomicUsize = AtomicUsize::new(0);

impl AudienceGroupStore {
    pub async fn load(path: PathBuf) -> Result<Self, String> {
        let groups = if path.exists() {
            let data = tokio::fs::read_to_string(&path)
                .await
                .map_err(|err| format!("failed to read audience groups: {}", err))?;
            if data.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&data)
                    .map_err(|err| format!("failed to parse audience groups: {}", err))?
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            groups: RwLock::new(groups),
        })
    }

    pub async fn list(&self, user_id: &str) -> Vec<AudienceGroup> {
        let guard = self.groups.read().await;
        guard.get(user_id).cloned().unwrap_or_default()
    }

    pub async fn get(&self, user_id: &str, group_id: &str) -> Option<AudienceGroup> {
        let guard = self.groups.read().await;
        guard
            .get(user_id)
            .and_then(|groups| groups.iter().find(|group| group.id == group_id))
            .cloned()
    }

    /// Mints a fresh id and timestamps. An omitted name falls back to the
    /// next sequential label for this user.
    pub async fn create(
        &self,
        user_id: &str,
        draft: AudienceGroupDraft,
    ) -> Result<AudienceGroup, String> {
        let mut guard = self.groups.write().await;
        let user_groups = guard.entry(user_id.to_string()).or_default();

        let name = match draft.name.filter(|name| !name.trim().is_empty()) {
            Some(name) => name,
            None => next_default_name(user_groups),
        };

        let now = now_ms();
        let group = AudienceGroup {
            id: mint_group_id(user_id),
            user_id: user_id.to_string(),
            name,
            personas: draft.personas,
            demographics: draft.demographics,
            total_audience: draft.total_audience,
            unduplicated: draft.unduplicated,
            overlap_factor: draft.overlap_factor,
            created_at_ms: now,
            updated_at_ms: now,
        };

        user_groups.push(group.clone());
        self.persist(&guard).await?;
        tracing::info!(user = user_id, group = %group.id, "audience group created");
        Ok(group)
    }

    /// Applies a partial update in one write. `Ok(None)` when the id does
    /// not belong to this user.
    pub async fn update(
        &self,
        user_id: &str,
        group_id: &str,
        patch: AudienceGroupPatch,
    ) -> Result<Option<AudienceGroup>, String> {
        let mut guard = self.groups.write().await;
        let Some(group) = guard
            .get_mut(user_id)
            .and_then(|groups| groups.iter_mut().find(|group| group.id == group_id))
        else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            group.name = name;
        }
        if let Some(personas) = patch.personas {
            group.personas = personas;
        }
        if let Some(demographics) = patch.demographics {
            group.demographics = demographics;
        }
        if let Some(total_audience) = patch.total_audience {
            group.total_audience = total_audience;
        }
        if let Some(unduplicated) = patch.unduplicated {
            group.unduplicated = unduplicated;
        }
        if let Some(overlap_factor) = patch.overlap_factor {
            group.overlap_factor = overlap_factor;
        }
        group.updated_at_ms = now_ms();

        let updated = group.clone();
        self.persist(&guard).await?;
        Ok(Some(updated))
    }

    /// `Ok(false)` when the id does not belong to this user.
    pub async fn delete(&self, user_id: &str, group_id: &str) -> Result<bool, String> {
        let mut guard = self.groups.write().await;
        let Some(user_groups) = guard.get_mut(user_id) else {
            return Ok(false);
        };

        let before = user_groups.len();
        user_groups.retain(|group| group.id != group_id);
        let removed = user_groups.len() != before;
        if removed {
            self.persist(&guard).await?;
        }
        Ok(removed)
    }

    /// Removes every group for the user; returns how many were deleted.
    pub async fn clear(&self, user_id: &str) -> Result<usize, String> {
        let mut guard = self.groups.write().await;
        let deleted = guard
            .get_mut(user_id)
            .map(|groups| std::mem::take(groups).len())
            .unwrap_or(0);
        if deleted > 0 {
            self.persist(&guard).await?;
        }
        Ok(deleted)
    }

    async fn persist(&self, groups: &HashMap<String, Vec<AudienceGroup>>) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent).await?;
        }
        let payload = serde_json::to_string_pretty(groups)
            .map_err(|err| format!("failed to serialize audience groups: {}", err))?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, payload)
            .await
            .map_err(|err| format!("failed to write audience groups: {}", err))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|err| format!("failed to finalize audience groups: {}", err))?;
        Ok(())
    }
}

/// Next sequential default label. Counting from the highest existing suffix
/// rather than the group count keeps labels unique after deletions.
fn next_default_name(groups: &[AudienceGroup]) -> String {
    let highest = groups
        .iter()
        .filter_map(|group| group.name.strip_prefix("Audience Group #"))
        .filter_map(|suffix| suffix.trim().parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("Audience Group #{}", highest + 1)
}

fn mint_group_id(user_id: &str) -> String {
    use sha2::{Digest, Sha256};

    let counter = GROUP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let payload = format!("{}:{}:{}", user_id, now_ms(), counter);
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    format!("grp_{:x}", u64::from_be_bytes(bytes))
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

async fn ensure_dir(path: &Path) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|err| format!("failed to create store dir: {}", err))
}
