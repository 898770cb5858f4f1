//! Follow-up task API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{ApiResult, AppJson, MessageResponse};
use crate::errors::AppError;
use crate::models::{
    CreateFollowUpTaskRequest, FollowUpTask, FollowUpTaskWithRefs, UpdateFollowUpTaskRequest,
};
use crate::AppState;

/// POST /api/followups - Create a follow-up task. Must reference at least
/// one of an existing lead or customer.
pub async fn create_followup(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateFollowUpTaskRequest>,
) -> ApiResult<(StatusCode, Json<FollowUpTask>)> {
    if request.title.trim().is_empty()
        || request.assigned_to.trim().is_empty()
        || request.due_date.trim().is_empty()
    {
        return Err(AppError::Validation(
            "Title, assignedTo, and dueDate are required.".to_string(),
        ));
    }
    if request.lead_id.is_none() && request.customer_id.is_none() {
        return Err(AppError::Validation(
            "Follow-up task must be associated with either a Lead or a Customer.".to_string(),
        ));
    }

    let task = state.repo.create_task(&request).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/followups - List all follow-up tasks with resolved references.
pub async fn list_followups(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<FollowUpTaskWithRefs>>> {
    let tasks = state.repo.list_tasks().await?;
    Ok(Json(tasks))
}

/// GET /api/followups/:id - Get a follow-up task with resolved references.
pub async fn get_followup(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<FollowUpTaskWithRefs>> {
    let task = state
        .repo
        .get_task_with_refs(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Follow-up task not found".to_string()))?;
    Ok(Json(task))
}

/// PUT /api/followups/:id - Update a follow-up task. A status move to
/// Completed stamps completedAt; a move away from it clears the stamp.
pub async fn update_followup(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateFollowUpTaskRequest>,
) -> ApiResult<Json<FollowUpTask>> {
    let task = state.repo.update_task(&id, &request).await?;
    Ok(Json(task))
}

/// DELETE /api/followups/:id - Delete a follow-up task.
pub async fn delete_followup(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.repo.delete_task(&id).await?;
    Ok(Json(MessageResponse::new(
        "Follow-up task deleted successfully",
    )))
}

/// GET /api/followups/lead/:leadId - List tasks for a specific lead.
pub async fn list_followups_for_lead(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
) -> ApiResult<Json<Vec<FollowUpTaskWithRefs>>> {
    let tasks = state.repo.list_tasks_for_lead(&lead_id).await?;
    Ok(Json(tasks))
}

/// GET /api/followups/customer/:customerId - List tasks for a specific
/// customer.
pub async fn list_followups_for_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> ApiResult<Json<Vec<FollowUpTaskWithRefs>>> {
    let tasks = state.repo.list_tasks_for_customer(&customer_id).await?;
    Ok(Json(tasks))
}
