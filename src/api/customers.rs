//! Customer API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{ApiResult, AppJson, MessageResponse};
use crate::errors::AppError;
use crate::models::{
    AddCommunicationRequest, AddDocumentRequest, AddProjectRequest, CreateCustomerRequest,
    Customer, CustomerWithLead, CustomerWithLeadSummary, UpdateCustomerRequest,
};
use crate::AppState;

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().map_or(true, |s| s.trim().is_empty())
}

/// POST /api/customers - Create a customer, either converted from a lead
/// (optional `leadId` in the body) or standalone.
pub async fn create_customer(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateCustomerRequest>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    // With a lead reference the contact fields are copied from the lead;
    // without one they must be supplied here.
    if request.lead_id.is_none()
        && (is_blank(&request.first_name)
            || is_blank(&request.last_name)
            || is_blank(&request.email))
    {
        return Err(AppError::Validation(
            "firstName, lastName, and email are required".to_string(),
        ));
    }

    let customer = state.repo.create_customer(&request).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /api/customers - List all customers with lead summaries attached.
pub async fn list_customers(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<CustomerWithLeadSummary>>> {
    let customers = state.repo.list_customers().await?;
    Ok(Json(customers))
}

/// GET /api/customers/:id - Get a customer with its full lead resolved.
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CustomerWithLead>> {
    let customer = state
        .repo
        .get_customer_with_lead(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;
    Ok(Json(customer))
}

/// PUT /api/customers/:id - Update a customer's contact fields.
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateCustomerRequest>,
) -> ApiResult<Json<Customer>> {
    let customer = state.repo.update_customer(&id, &request).await?;
    Ok(Json(customer))
}

/// DELETE /api/customers/:id - Delete a customer. Follow-up tasks that
/// reference it are left in place with an unresolved reference.
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.repo.delete_customer(&id).await?;
    Ok(Json(MessageResponse::new("Customer deleted successfully")))
}

/// POST /api/customers/:id/communication - Append a communication log entry.
pub async fn add_communication_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<AddCommunicationRequest>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.repo.append_communication(&id, &request).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// POST /api/customers/:id/document - Record an attached document
/// reference. The file itself is hosted elsewhere; only the URL is stored.
pub async fn add_attached_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<AddDocumentRequest>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.repo.append_document(&id, &request).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// POST /api/customers/:id/project - Append a project history entry.
pub async fn add_project_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<AddProjectRequest>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.repo.append_project(&id, &request).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}
