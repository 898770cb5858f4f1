//! Integration stub endpoints.
//!
//! Placeholders for external lead sources. None of these perform any work;
//! a real integration would normalize its records and go through the lead
//! creation path like any other client.

use axum::Json;

use super::MessageResponse;

/// POST /api/integrations/import-leads-from-csv
pub async fn import_leads_from_csv() -> Json<MessageResponse> {
    Json(MessageResponse::new(
        "Leads imported from CSV (placeholder).",
    ))
}

/// POST /api/integrations/google-ads/authenticate
pub async fn google_ads_authenticate() -> Json<MessageResponse> {
    Json(MessageResponse::new(
        "Initiating Google Ads authentication (placeholder).",
    ))
}

/// POST /api/integrations/google-ads/import-leads
pub async fn google_ads_import_leads() -> Json<MessageResponse> {
    Json(MessageResponse::new(
        "Importing leads from Google Ads (placeholder).",
    ))
}

/// POST /api/integrations/meta-ads/authenticate
pub async fn meta_ads_authenticate() -> Json<MessageResponse> {
    Json(MessageResponse::new(
        "Initiating Meta Ads authentication (placeholder).",
    ))
}

/// POST /api/integrations/meta-ads/import-leads
pub async fn meta_ads_import_leads() -> Json<MessageResponse> {
    Json(MessageResponse::new(
        "Importing leads from Meta Ads (placeholder).",
    ))
}

/// POST /api/integrations/email/connect
pub async fn email_connect() -> Json<MessageResponse> {
    Json(MessageResponse::new(
        "Connecting to Email service (placeholder).",
    ))
}
