use serde::Serialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::error::{AuthzError, AuthzResult};
use super::locator::{locate_by_id, parse_id, ResourceKind};
use super::visibility::{locate_visible_comment_by_id, locate_visible_video_by_id};
use super::principal::Principal;
use crate::database::models::{EdgeKey, TargetKind, User};
use crate::database::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleState {
    Active,
    Inactive,
}

impl ToggleState {
    pub fn is_active(self) -> bool {
        matches!(self, ToggleState::Active)
    }
}

impl From<TargetKind> for ResourceKind {
    fn from(kind: TargetKind) -> Self {
        match kind {
            TargetKind::Video => ResourceKind::Video,
            TargetKind::Comment => ResourceKind::Comment,
            TargetKind::Channel => ResourceKind::Channel,
        }
    }
}

/// Fails `NotFound` when the toggle target does not exist or is a draft
/// (or a comment on a draft) the principal does not own.
async fn ensure_target_exists(store: &dyn Store, principal: &Principal, kind: TargetKind, id: Uuid) -> AuthzResult<()> {
    match kind {
        TargetKind::Video => locate_visible_video_by_id(store, Some(principal), id).await.map(drop),
        TargetKind::Comment => locate_visible_comment_by_id(store, Some(principal), id).await.map(drop),
        TargetKind::Channel => locate_by_id::<User>(store, id).await.map(drop),
    }
}

/// Flip the principal's like or subscription on a target.
///
/// Absent edge: insert it and report `Active`. Present edge: delete it by its
/// own id and report `Inactive`. Two identical calls restore the original
/// state. The storage uniqueness constraint settles concurrent toggles: a
/// rejected duplicate insert means another request activated the edge first,
/// and a delete that finds nothing means another request already removed it.
pub async fn toggle(
    store: &dyn Store,
    principal: &Principal,
    kind: TargetKind,
    raw_target: &str,
) -> AuthzResult<ToggleState> {
    let target_id = parse_id(kind.into(), raw_target)?;
    ensure_target_exists(store, principal, kind, target_id).await?;

    if kind == TargetKind::Channel && target_id == principal.id {
        return Err(AuthzError::validation("You cannot subscribe to your own channel"));
    }

    let key = EdgeKey::new(principal.id, kind, target_id);
    match store.find_edge(&key).await? {
        Some(edge) => {
            if !store.delete_edge(edge.id).await? {
                tracing::debug!("Edge {} was already removed by a concurrent toggle", edge.id);
            }
            Ok(ToggleState::Inactive)
        }
        None => match store.insert_edge(&key).await {
            Ok(_) => Ok(ToggleState::Active),
            Err(StoreError::Conflict(_)) => {
                tracing::debug!(
                    "Concurrent toggle already created {} edge for {} on {}",
                    key.relation,
                    principal.id,
                    target_id
                );
                Ok(ToggleState::Active)
            }
            Err(e) => Err(e.into()),
        },
    }
}

/// Number of active edges pointing at a target, recomputed from storage.
pub async fn count_active(store: &dyn Store, kind: TargetKind, target_id: Uuid) -> AuthzResult<u64> {
    Ok(store.count_edges_to(kind, target_id, kind.relation()).await?)
}

/// Active edge counts for a batch of targets. Targets without edges are absent.
pub async fn count_active_many(store: &dyn Store, kind: TargetKind, target_ids: &[Uuid]) -> AuthzResult<HashMap<Uuid, u64>> {
    if target_ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(store.count_edges_to_many(kind, target_ids, kind.relation()).await?)
}

/// The subset of `target_ids` the principal has an edge on.
pub async fn active_among(
    store: &dyn Store,
    principal_id: Uuid,
    kind: TargetKind,
    target_ids: &[Uuid],
) -> AuthzResult<HashSet<Uuid>> {
    if target_ids.is_empty() {
        return Ok(HashSet::new());
    }
    Ok(store
        .find_edge_targets(principal_id, kind, target_ids, kind.relation())
        .await?)
}

/// Whether the principal currently has an edge on the target.
pub async fn is_active(store: &dyn Store, principal_id: Uuid, kind: TargetKind, target_id: Uuid) -> AuthzResult<bool> {
    Ok(store
        .find_edge(&EdgeKey::new(principal_id, kind, target_id))
        .await?
        .is_some())
}
