//! Lead API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use super::{ApiResult, AppJson, MessageResponse};
use crate::errors::AppError;
use crate::models::{
    CreateLeadRequest, Customer, Lead, LeadPriority, LeadStatus, UpdateLeadPriorityRequest,
    UpdateLeadRequest, UpdateLeadStatusRequest,
};
use crate::AppState;

/// Response body for the status/priority transition routes.
#[derive(Debug, Serialize)]
pub struct LeadTransitionResponse {
    pub message: String,
    pub lead: Lead,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
}

/// POST /api/leads - Create a new lead.
pub async fn create_lead(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateLeadRequest>,
) -> ApiResult<(StatusCode, Json<Lead>)> {
    if request.first_name.trim().is_empty()
        || request.last_name.trim().is_empty()
        || request.email.trim().is_empty()
    {
        return Err(AppError::Validation(
            "firstName, lastName, and email are required".to_string(),
        ));
    }

    let lead = state.repo.create_lead(&request).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

/// GET /api/leads - List all leads.
pub async fn list_leads(State(state): State<AppState>) -> ApiResult<Json<Vec<Lead>>> {
    let leads = state.repo.list_leads().await?;
    Ok(Json(leads))
}

/// GET /api/leads/:id - Get a single lead.
pub async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Lead>> {
    let lead = state
        .repo
        .get_lead(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;
    Ok(Json(lead))
}

/// PUT /api/leads/:id - Update a lead. Setting `status` here performs no
/// conversion side effect; only the PATCH status route converts.
pub async fn update_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateLeadRequest>,
) -> ApiResult<Json<Lead>> {
    let lead = state.repo.update_lead(&id, &request).await?;
    Ok(Json(lead))
}

/// DELETE /api/leads/:id - Delete a lead.
pub async fn delete_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.repo.delete_lead(&id).await?;
    Ok(Json(MessageResponse::new("Lead deleted successfully")))
}

/// PATCH /api/leads/:id/status - Transition a lead's status. A transition
/// to Converted ensures exactly one customer references the lead.
pub async fn update_lead_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateLeadStatusRequest>,
) -> ApiResult<Json<LeadTransitionResponse>> {
    // Existence is checked before the status string, so an unknown lead is
    // 404 even when the payload is also invalid.
    state
        .repo
        .get_lead(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;

    let Some(status) = LeadStatus::from_str(&request.status) else {
        return Err(AppError::Validation("Invalid status provided".to_string()));
    };

    let converting = status == LeadStatus::Converted;
    let (lead, customer) = state.repo.update_lead_status(&id, status).await?;

    let message = if converting {
        if customer.is_some() {
            "Lead converted and customer created successfully"
        } else {
            "Lead status updated to Converted, customer already exists"
        }
    } else {
        "Lead status updated successfully"
    };

    Ok(Json(LeadTransitionResponse {
        message: message.to_string(),
        lead,
        customer,
    }))
}

/// PATCH /api/leads/:id/priority - Transition a lead's priority.
pub async fn update_lead_priority(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateLeadPriorityRequest>,
) -> ApiResult<Json<LeadTransitionResponse>> {
    state
        .repo
        .get_lead(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;

    let Some(priority) = LeadPriority::from_str(&request.priority) else {
        return Err(AppError::Validation(
            "Invalid priority provided".to_string(),
        ));
    };

    let lead = state.repo.update_lead_priority(&id, priority).await?;

    Ok(Json(LeadTransitionResponse {
        message: "Lead priority updated successfully".to_string(),
        lead,
        customer: None,
    }))
}
