//! Follow-up task model: an actionable reminder attached to a lead and/or
//! a customer.

use serde::{Deserialize, Serialize};

/// Status of a follow-up task. Any value may follow any other; only
/// Completed carries the completedAt side effect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Completed,
    Canceled,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Completed => "Completed",
            TaskStatus::Canceled => "Canceled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(TaskStatus::Pending),
            "Completed" => Some(TaskStatus::Completed),
            "Canceled" => Some(TaskStatus::Canceled),
            _ => None,
        }
    }
}

/// Priority of a follow-up task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::High => "High",
            TaskPriority::Medium => "Medium",
            TaskPriority::Low => "Low",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "High" => Some(TaskPriority::High),
            "Medium" => Some(TaskPriority::Medium),
            "Low" => Some(TaskPriority::Low),
            _ => None,
        }
    }
}

/// A follow-up task. At least one of `lead_id`/`customer_id` is always set
/// (validated before persistence); `completed_at` is derived from status
/// transitions and serialized even when null.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpTask {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub assigned_to: String,
    pub due_date: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

/// Lightweight contact projection for a task's lead/customer references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Task read view with references resolved. Orphaned references keep their
/// raw id; the projection is simply absent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpTaskWithRefs {
    #[serde(flatten)]
    pub task: FollowUpTask,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead: Option<ContactSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<ContactSummary>,
}

/// Request body for creating a follow-up task.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFollowUpTaskRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub lead_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

/// Request body for updating a follow-up task.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFollowUpTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub lead_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
}
