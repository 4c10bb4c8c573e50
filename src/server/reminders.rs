use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireIdentity;
use crate::server::AppState;
use crate::server::dto::{CreateReminderRequest, ListRemindersParams, UpdateReminderRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_reminder_message;
use crate::types::Reminder;

pub async fn list_reminders(
    auth: RequireIdentity,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListRemindersParams>,
) -> impl IntoResponse {
    let identity = &auth.0;
    let store = state.store.as_ref();

    let pending_only = params.pending.unwrap_or(false);
    let reminders = store
        .list_reminders(&identity.id, pending_only)
        .api_err("Failed to list reminders")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(reminders)))
}

pub async fn create_reminder(
    auth: RequireIdentity,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateReminderRequest>,
) -> impl IntoResponse {
    let identity = &auth.0;
    let store = state.store.as_ref();

    // The client id is stored as given, without checking it against
    // the clients table; reminders are free-standing tasks.
    let client_id = req
        .client_id
        .ok_or_else(|| ApiError::bad_request("clientId is required"))?;
    let due_date = req
        .due_date
        .ok_or_else(|| ApiError::bad_request("dueDate is required"))?;
    let message = req
        .message
        .ok_or_else(|| ApiError::bad_request("message is required"))?;
    validate_reminder_message(&message)?;

    let now = Utc::now();
    let reminder = Reminder {
        id: Uuid::new_v4().to_string(),
        client_id,
        owner_id: identity.id.clone(),
        due_date,
        message,
        done: false,
        created_at: now,
        updated_at: now,
    };

    store
        .create_reminder(&reminder)
        .api_err("Failed to create reminder")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(reminder))))
}

pub async fn update_reminder(
    auth: RequireIdentity,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateReminderRequest>,
) -> impl IntoResponse {
    let identity = &auth.0;
    let store = state.store.as_ref();

    let mut reminder = store
        .get_reminder(&identity.id, &id)
        .api_err("Failed to get reminder")?
        .or_not_found("Reminder not found")?;

    if let Some(client_id) = req.client_id {
        reminder.client_id = client_id;
    }
    if let Some(due_date) = req.due_date {
        reminder.due_date = due_date;
    }
    if let Some(message) = req.message {
        validate_reminder_message(&message)?;
        reminder.message = message;
    }
    if let Some(done) = req.done {
        reminder.done = done;
    }
    reminder.updated_at = Utc::now();

    store
        .update_reminder(&reminder)
        .api_err("Reminder not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(reminder)))
}

pub async fn delete_reminder(
    auth: RequireIdentity,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let identity = &auth.0;
    let store = state.store.as_ref();

    let deleted = store
        .delete_reminder(&identity.id, &id)
        .api_err("Failed to delete reminder")?;

    if !deleted {
        return Err(ApiError::not_found("Reminder not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
