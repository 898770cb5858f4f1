//! Lead model: a prospective customer captured before any commercial
//! relationship exists.

use serde::{Deserialize, Serialize};

/// Where a lead entered the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LeadSource {
    WebsiteForm,
    Manual,
    EmailInquiry,
    AdCampaign,
    Other,
}

impl Default for LeadSource {
    fn default() -> Self {
        LeadSource::Manual
    }
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::WebsiteForm => "WebsiteForm",
            LeadSource::Manual => "Manual",
            LeadSource::EmailInquiry => "EmailInquiry",
            LeadSource::AdCampaign => "AdCampaign",
            LeadSource::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "WebsiteForm" => Some(LeadSource::WebsiteForm),
            "Manual" => Some(LeadSource::Manual),
            "EmailInquiry" => Some(LeadSource::EmailInquiry),
            "AdCampaign" => Some(LeadSource::AdCampaign),
            "Other" => Some(LeadSource::Other),
            _ => None,
        }
    }
}

/// Sales pipeline status of a lead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LeadStatus {
    New,
    Contacted,
    ProposalSent,
    Negotiation,
    Converted,
    Lost,
}

impl Default for LeadStatus {
    fn default() -> Self {
        LeadStatus::New
    }
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::ProposalSent => "ProposalSent",
            LeadStatus::Negotiation => "Negotiation",
            LeadStatus::Converted => "Converted",
            LeadStatus::Lost => "Lost",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "New" => Some(LeadStatus::New),
            "Contacted" => Some(LeadStatus::Contacted),
            "ProposalSent" => Some(LeadStatus::ProposalSent),
            "Negotiation" => Some(LeadStatus::Negotiation),
            "Converted" => Some(LeadStatus::Converted),
            "Lost" => Some(LeadStatus::Lost),
            _ => None,
        }
    }
}

/// How warm a lead is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LeadPriority {
    Hot,
    Warm,
    Cold,
}

impl Default for LeadPriority {
    fn default() -> Self {
        LeadPriority::Cold
    }
}

impl LeadPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadPriority::Hot => "Hot",
            LeadPriority::Warm => "Warm",
            LeadPriority::Cold => "Cold",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Hot" => Some(LeadPriority::Hot),
            "Warm" => Some(LeadPriority::Warm),
            "Cold" => Some(LeadPriority::Cold),
            _ => None,
        }
    }
}

/// A sales lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub priority: LeadPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Lightweight lead projection attached to customer listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub status: LeadStatus,
}

/// Request body for creating a new lead.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub source: Option<LeadSource>,
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub priority: Option<LeadPriority>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for updating an existing lead.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub source: Option<LeadSource>,
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub priority: Option<LeadPriority>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for PATCH /api/leads/:id/status.
///
/// The status arrives as a raw string so an unlisted value can be rejected
/// with the advisory "Invalid status provided" message instead of a
/// deserialization error.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLeadStatusRequest {
    #[serde(default)]
    pub status: String,
}

/// Request body for PATCH /api/leads/:id/priority.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLeadPriorityRequest {
    #[serde(default)]
    pub priority: String,
}
