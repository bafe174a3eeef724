use axum::extract::{Path, State};
use axum::Extension;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::api::format::{owner_map, OwnerSummary};
use crate::authz::{count_active, locate, parse_id, toggle, Principal, ToggleState};
use crate::database::models::{Relation, TargetKind, User};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SubscriptionToggled {
    pub channel_id: Uuid,
    pub state: ToggleState,
    pub is_subscribed: bool,
    pub subscribers: u64,
}

#[derive(Debug, Serialize)]
pub struct SubscriberCount {
    pub channel_id: Uuid,
    pub subscribers: u64,
}

/// POST /api/v1/subscriptions/channels/:channel_id/toggle - Subscribe or unsubscribe
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn toggle_subscription(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(channel_id): Path<String>,
) -> ApiResult<SubscriptionToggled> {
    let store = state.store.as_ref();
    let outcome = toggle(store, &principal, TargetKind::Channel, &channel_id).await?;
    let channel_id = parse_id(TargetKind::Channel.into(), &channel_id)?;
    let subscribers = count_active(store, TargetKind::Channel, channel_id).await?;

    let message = if outcome.is_active() { "Subscribed" } else { "Unsubscribed" };
    Ok(ApiResponse::success(SubscriptionToggled {
        channel_id,
        state: outcome,
        is_subscribed: outcome.is_active(),
        subscribers,
    })
    .message(message))
}

/// GET /api/v1/subscriptions/channels/:channel_id/count
#[instrument(skip(state))]
pub async fn subscriber_count(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> ApiResult<SubscriberCount> {
    let store = state.store.as_ref();
    let channel = locate::<User>(store, &channel_id).await?;
    let subscribers = count_active(store, TargetKind::Channel, channel.id).await?;
    Ok(ApiResponse::success(SubscriberCount { channel_id: channel.id, subscribers }))
}

/// GET /api/v1/subscriptions/me - Channels the principal is subscribed to
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn my_subscriptions(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Vec<OwnerSummary>> {
    let store = state.store.as_ref();
    let edges = store
        .list_edges_from(principal.id, TargetKind::Channel, Relation::Subscribe)
        .await?;
    let mut channels = owner_map(store, edges.iter().map(|e| e.target_id)).await?;
    let subscribed: Vec<OwnerSummary> = edges.iter().filter_map(|e| channels.remove(&e.target_id)).collect();

    Ok(ApiResponse::success(subscribed).message("Subscribed channels fetched successfully"))
}
