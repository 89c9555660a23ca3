//! Group pages and notifications for logged-in members.

use super::group_details;
use crate::api::{
    AppState,
    auth::CurrentUser,
    types::{ActionResponse, ApiError, GroupDetailsResponse, NotificationQuery},
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use schoolhouse_core::{Group, Notification, NotificationId, Notifications};

/// A group as seen by one of its members, or by any manager.
pub async fn group_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<GroupDetailsResponse>, ApiError> {
    let school = state.school.read().await;
    let group = school.require::<Group>(id)?;
    if !current.user.role.is_manager() && !group.has_member(current.user.id) {
        tracing::warn!(user = %current.user.id, group = %group.id, "group page denied to non-member");
        return Err(ApiError::Forbidden);
    }
    Ok(Json(group_details(&school, group)?))
}

/// The user's notifications, newest first. `?unread=true` hides read ones.
pub async fn notifications_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let school = state.school.read().await;
    Ok(Json(Notifications::list_for(
        &school,
        current.user.id,
        query.unread,
    )?))
}

pub async fn mark_read_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<Notification>, ApiError> {
    let mut school = state.school.write().await;
    Ok(Json(Notifications::mark_read(
        &mut school,
        current.user.id,
        NotificationId(id),
    )?))
}

pub async fn read_all_handler(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<ActionResponse>, ApiError> {
    let mut school = state.school.write().await;
    let changed = Notifications::mark_all_read(&mut school, current.user.id)?;
    Ok(Json(ActionResponse::success(format!(
        "{} notification(s) marked as read.",
        changed
    ))))
}

pub async fn delete_notification_handler(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<ActionResponse>, ApiError> {
    let mut school = state.school.write().await;
    Notifications::delete(&mut school, current.user.id, NotificationId(id))?;
    Ok(Json(ActionResponse::success("Notification deleted.")))
}
