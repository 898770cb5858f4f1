//! Database repository for CRUD operations.
//!
//! Holds all persistence and cross-entity logic: the lead-to-customer
//! conversion side effect, reference existence checks before task creation,
//! and the read-time reference resolution joins. Uniqueness invariants are
//! enforced by explicit pre-checks (mapped to validation errors) and
//! backstopped by UNIQUE columns; the check-then-act sequences are
//! deliberately not transactional.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    AddCommunicationRequest, AddDocumentRequest, AddProjectRequest, AttachedDocument,
    CommunicationLogEntry, ContactSummary, CreateCustomerRequest, CreateFollowUpTaskRequest,
    CreateLeadRequest, Customer, CustomerWithLead, CustomerWithLeadSummary, FollowUpTask,
    FollowUpTaskWithRefs, Lead, LeadPriority, LeadSource, LeadStatus, LeadSummary,
    ProjectHistoryEntry, TaskPriority, TaskStatus, UpdateCustomerRequest,
    UpdateFollowUpTaskRequest, UpdateLeadRequest,
};

const LEAD_COLUMNS: &str = "id, first_name, last_name, email, phone, company, source, status, priority, notes, created_at, updated_at";
const CUSTOMER_COLUMNS: &str = "id, lead_id, first_name, last_name, email, phone, company, address, industry, project_history, communication_log, attached_documents, created_at, updated_at";
const TASK_COLUMNS: &str = "id, title, description, assigned_to, due_date, status, priority, lead_id, customer_id, created_at, completed_at";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== LEAD OPERATIONS ====================

    /// List all leads in creation order.
    pub async fn list_leads(&self) -> Result<Vec<Lead>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(lead_from_row).collect())
    }

    /// Get a lead by ID.
    pub async fn get_lead(&self, id: &str) -> Result<Option<Lead>, AppError> {
        let row = sqlx::query(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(lead_from_row))
    }

    async fn find_lead_by_email(&self, email: &str) -> Result<Option<Lead>, AppError> {
        let row = sqlx::query(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(lead_from_row))
    }

    /// Create a new lead, applying defaults for source/status/priority.
    pub async fn create_lead(&self, request: &CreateLeadRequest) -> Result<Lead, AppError> {
        if self.find_lead_by_email(&request.email).await?.is_some() {
            return Err(AppError::Validation(
                "A lead with this email already exists".to_string(),
            ));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let lead = Lead {
            id,
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            company: request.company.clone(),
            source: request.source.clone().unwrap_or_default(),
            status: request.status.clone().unwrap_or_default(),
            priority: request.priority.clone().unwrap_or_default(),
            notes: request.notes.clone(),
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(&format!(
            "INSERT INTO leads ({LEAD_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&lead.id)
        .bind(&lead.first_name)
        .bind(&lead.last_name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.company)
        .bind(lead.source.as_str())
        .bind(lead.status.as_str())
        .bind(lead.priority.as_str())
        .bind(&lead.notes)
        .bind(&lead.created_at)
        .bind(&lead.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(lead)
    }

    /// Update a lead by merging the provided fields. Absent fields keep
    /// their stored values.
    pub async fn update_lead(&self, id: &str, request: &UpdateLeadRequest) -> Result<Lead, AppError> {
        let existing = self
            .get_lead(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;

        if let Some(email) = &request.email {
            if email != &existing.email && self.find_lead_by_email(email).await?.is_some() {
                return Err(AppError::Validation(
                    "A lead with this email already exists".to_string(),
                ));
            }
        }

        let now = Utc::now().to_rfc3339();
        let lead = Lead {
            id: existing.id.clone(),
            first_name: request.first_name.clone().unwrap_or(existing.first_name),
            last_name: request.last_name.clone().unwrap_or(existing.last_name),
            email: request.email.clone().unwrap_or(existing.email),
            phone: request.phone.clone().or(existing.phone),
            company: request.company.clone().or(existing.company),
            source: request.source.clone().unwrap_or(existing.source),
            status: request.status.clone().unwrap_or(existing.status),
            priority: request.priority.clone().unwrap_or(existing.priority),
            notes: request.notes.clone().or(existing.notes),
            created_at: existing.created_at,
            updated_at: now,
        };

        sqlx::query(
            "UPDATE leads SET first_name = ?, last_name = ?, email = ?, phone = ?, company = ?, source = ?, status = ?, priority = ?, notes = ?, updated_at = ? WHERE id = ?"
        )
        .bind(&lead.first_name)
        .bind(&lead.last_name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.company)
        .bind(lead.source.as_str())
        .bind(lead.status.as_str())
        .bind(lead.priority.as_str())
        .bind(&lead.notes)
        .bind(&lead.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(lead)
    }

    /// Delete a lead. Never cascades to customers or tasks referencing it.
    pub async fn delete_lead(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Lead not found".to_string()));
        }

        Ok(())
    }

    /// Set a lead's status. When the new status is Converted and no customer
    /// references this lead yet, a customer is created copying the lead's
    /// contact fields; the returned option carries it. Repeating the call
    /// never creates a second customer.
    pub async fn update_lead_status(
        &self,
        id: &str,
        status: LeadStatus,
    ) -> Result<(Lead, Option<Customer>), AppError> {
        let existing = self
            .get_lead(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;

        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE leads SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        let lead = Lead {
            status: status.clone(),
            updated_at: now.clone(),
            ..existing
        };

        if status != LeadStatus::Converted {
            return Ok((lead, None));
        }

        // Idempotent conversion: only the first call creates a customer.
        if self.find_customer_by_lead(id).await?.is_some() {
            return Ok((lead, None));
        }

        // The status update above is not rolled back when the copied email
        // is already taken by a customer.
        self.check_customer_email_unique(&lead.email).await?;

        let customer = Customer {
            id: uuid::Uuid::new_v4().to_string(),
            lead_id: Some(lead.id.clone()),
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            company: lead.company.clone(),
            address: None,
            industry: None,
            project_history: Vec::new(),
            communication_log: Vec::new(),
            attached_documents: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        };
        self.insert_customer(&customer).await?;

        Ok((lead, Some(customer)))
    }

    /// Set a lead's priority.
    pub async fn update_lead_priority(
        &self,
        id: &str,
        priority: LeadPriority,
    ) -> Result<Lead, AppError> {
        let existing = self
            .get_lead(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;

        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE leads SET priority = ?, updated_at = ? WHERE id = ?")
            .bind(priority.as_str())
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(Lead {
            priority,
            updated_at: now,
            ..existing
        })
    }

    // ==================== CUSTOMER OPERATIONS ====================

    /// List all customers with their lead references resolved to summaries.
    pub async fn list_customers(&self) -> Result<Vec<CustomerWithLeadSummary>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut customers = Vec::with_capacity(rows.len());
        for row in &rows {
            let customer = customer_from_row(row);
            let lead = match &customer.lead_id {
                Some(lead_id) => self.get_lead(lead_id).await?.map(|l| LeadSummary {
                    id: l.id,
                    first_name: l.first_name,
                    last_name: l.last_name,
                    email: l.email,
                    status: l.status,
                }),
                None => None,
            };
            customers.push(CustomerWithLeadSummary { customer, lead });
        }

        Ok(customers)
    }

    /// Get a customer by ID.
    pub async fn get_customer(&self, id: &str) -> Result<Option<Customer>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(customer_from_row))
    }

    /// Get a customer with its lead reference resolved to the full record.
    pub async fn get_customer_with_lead(
        &self,
        id: &str,
    ) -> Result<Option<CustomerWithLead>, AppError> {
        let Some(customer) = self.get_customer(id).await? else {
            return Ok(None);
        };

        let lead = match &customer.lead_id {
            Some(lead_id) => self.get_lead(lead_id).await?,
            None => None,
        };

        Ok(Some(CustomerWithLead { customer, lead }))
    }

    /// Find the customer referencing a given lead, if any.
    pub async fn find_customer_by_lead(&self, lead_id: &str) -> Result<Option<Customer>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE lead_id = ?"
        ))
        .bind(lead_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(customer_from_row))
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(customer_from_row))
    }

    /// Create a customer. With a lead reference the lead's contact fields
    /// are copied, the request's fields override them, and the lead is
    /// flipped to Converted if it wasn't already. Without one the request
    /// fields are used directly.
    pub async fn create_customer(
        &self,
        request: &CreateCustomerRequest,
    ) -> Result<Customer, AppError> {
        let now = Utc::now().to_rfc3339();
        let id = uuid::Uuid::new_v4().to_string();

        let customer = if let Some(lead_id) = &request.lead_id {
            let lead = self
                .get_lead(lead_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Associated lead not found".to_string()))?;

            if self.find_customer_by_lead(lead_id).await?.is_some() {
                return Err(AppError::Validation(
                    "This lead has already been converted to a customer.".to_string(),
                ));
            }

            let customer = Customer {
                id,
                lead_id: Some(lead.id.clone()),
                first_name: request.first_name.clone().unwrap_or(lead.first_name),
                last_name: request.last_name.clone().unwrap_or(lead.last_name),
                email: request.email.clone().unwrap_or(lead.email),
                phone: request.phone.clone().or(lead.phone),
                company: request.company.clone().or(lead.company),
                address: request.address.clone(),
                industry: request.industry.clone(),
                project_history: Vec::new(),
                communication_log: Vec::new(),
                attached_documents: Vec::new(),
                created_at: now.clone(),
                updated_at: now.clone(),
            };
            self.check_customer_email_unique(&customer.email).await?;
            self.insert_customer(&customer).await?;

            // Side effect: converting via this path marks the lead Converted.
            if lead.status != LeadStatus::Converted {
                sqlx::query("UPDATE leads SET status = ?, updated_at = ? WHERE id = ?")
                    .bind(LeadStatus::Converted.as_str())
                    .bind(&now)
                    .bind(lead_id)
                    .execute(&self.pool)
                    .await?;
            }

            customer
        } else {
            let customer = Customer {
                id,
                lead_id: None,
                first_name: request.first_name.clone().unwrap_or_default(),
                last_name: request.last_name.clone().unwrap_or_default(),
                email: request.email.clone().unwrap_or_default(),
                phone: request.phone.clone(),
                company: request.company.clone(),
                address: request.address.clone(),
                industry: request.industry.clone(),
                project_history: Vec::new(),
                communication_log: Vec::new(),
                attached_documents: Vec::new(),
                created_at: now.clone(),
                updated_at: now,
            };
            self.check_customer_email_unique(&customer.email).await?;
            self.insert_customer(&customer).await?;
            customer
        };

        Ok(customer)
    }

    async fn check_customer_email_unique(&self, email: &str) -> Result<(), AppError> {
        if self.find_customer_by_email(email).await?.is_some() {
            return Err(AppError::Validation(
                "A customer with this email already exists".to_string(),
            ));
        }
        Ok(())
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<(), AppError> {
        let project_history = serde_json::to_string(&customer.project_history).unwrap_or_default();
        let communication_log =
            serde_json::to_string(&customer.communication_log).unwrap_or_default();
        let attached_documents =
            serde_json::to_string(&customer.attached_documents).unwrap_or_default();

        sqlx::query(&format!(
            "INSERT INTO customers ({CUSTOMER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&customer.id)
        .bind(&customer.lead_id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.company)
        .bind(&customer.address)
        .bind(&customer.industry)
        .bind(&project_history)
        .bind(&communication_log)
        .bind(&attached_documents)
        .bind(&customer.created_at)
        .bind(&customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Update a customer's scalar contact fields by partial merge.
    pub async fn update_customer(
        &self,
        id: &str,
        request: &UpdateCustomerRequest,
    ) -> Result<Customer, AppError> {
        let existing = self
            .get_customer(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

        if let Some(email) = &request.email {
            if email != &existing.email && self.find_customer_by_email(email).await?.is_some() {
                return Err(AppError::Validation(
                    "A customer with this email already exists".to_string(),
                ));
            }
        }

        let now = Utc::now().to_rfc3339();
        let customer = Customer {
            id: existing.id.clone(),
            lead_id: existing.lead_id,
            first_name: request.first_name.clone().unwrap_or(existing.first_name),
            last_name: request.last_name.clone().unwrap_or(existing.last_name),
            email: request.email.clone().unwrap_or(existing.email),
            phone: request.phone.clone().or(existing.phone),
            company: request.company.clone().or(existing.company),
            address: request.address.clone().or(existing.address),
            industry: request.industry.clone().or(existing.industry),
            project_history: existing.project_history,
            communication_log: existing.communication_log,
            attached_documents: existing.attached_documents,
            created_at: existing.created_at,
            updated_at: now,
        };

        sqlx::query(
            "UPDATE customers SET first_name = ?, last_name = ?, email = ?, phone = ?, company = ?, address = ?, industry = ?, updated_at = ? WHERE id = ?"
        )
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.company)
        .bind(&customer.address)
        .bind(&customer.industry)
        .bind(&customer.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Delete a customer. Tasks referencing it are left orphaned.
    pub async fn delete_customer(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Customer not found".to_string()));
        }

        Ok(())
    }

    /// Append a communication log entry with a server-assigned date.
    pub async fn append_communication(
        &self,
        id: &str,
        request: &AddCommunicationRequest,
    ) -> Result<Customer, AppError> {
        let mut customer = self
            .get_customer(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

        let now = Utc::now().to_rfc3339();
        customer.communication_log.push(CommunicationLogEntry {
            date: now.clone(),
            kind: request.kind.clone(),
            notes: request.notes.clone(),
            staff: request.staff.clone(),
        });

        let json = serde_json::to_string(&customer.communication_log).unwrap_or_default();
        sqlx::query("UPDATE customers SET communication_log = ?, updated_at = ? WHERE id = ?")
            .bind(&json)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        customer.updated_at = now;
        Ok(customer)
    }

    /// Record an attached document reference with a server-assigned
    /// upload timestamp.
    pub async fn append_document(
        &self,
        id: &str,
        request: &AddDocumentRequest,
    ) -> Result<Customer, AppError> {
        let mut customer = self
            .get_customer(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

        let now = Utc::now().to_rfc3339();
        customer.attached_documents.push(AttachedDocument {
            file_name: request.file_name.clone(),
            file_url: request.file_url.clone(),
            uploaded_at: now.clone(),
        });

        let json = serde_json::to_string(&customer.attached_documents).unwrap_or_default();
        sqlx::query("UPDATE customers SET attached_documents = ?, updated_at = ? WHERE id = ?")
            .bind(&json)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        customer.updated_at = now;
        Ok(customer)
    }

    /// Append a project history entry.
    pub async fn append_project(
        &self,
        id: &str,
        request: &AddProjectRequest,
    ) -> Result<Customer, AppError> {
        let mut customer = self
            .get_customer(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

        let now = Utc::now().to_rfc3339();
        customer.project_history.push(ProjectHistoryEntry {
            project_name: request.project_name.clone(),
            start_date: request.start_date.clone(),
            end_date: request.end_date.clone(),
            status: request.status.clone(),
            details: request.details.clone(),
        });

        let json = serde_json::to_string(&customer.project_history).unwrap_or_default();
        sqlx::query("UPDATE customers SET project_history = ?, updated_at = ? WHERE id = ?")
            .bind(&json)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        customer.updated_at = now;
        Ok(customer)
    }

    // ==================== FOLLOW-UP TASK OPERATIONS ====================

    /// List all follow-up tasks with resolved references.
    pub async fn list_tasks(&self) -> Result<Vec<FollowUpTaskWithRefs>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM followup_tasks ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.resolve_tasks(rows.iter().map(task_from_row).collect())
            .await
    }

    /// Get a follow-up task by ID.
    pub async fn get_task(&self, id: &str) -> Result<Option<FollowUpTask>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM followup_tasks WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(task_from_row))
    }

    /// Get a follow-up task with resolved references.
    pub async fn get_task_with_refs(
        &self,
        id: &str,
    ) -> Result<Option<FollowUpTaskWithRefs>, AppError> {
        let Some(task) = self.get_task(id).await? else {
            return Ok(None);
        };

        Ok(Some(self.resolve_task(task).await?))
    }

    /// Create a follow-up task. The referenced lead/customer must exist at
    /// creation time; field-level validation happens at the API boundary.
    pub async fn create_task(
        &self,
        request: &CreateFollowUpTaskRequest,
    ) -> Result<FollowUpTask, AppError> {
        if let Some(lead_id) = &request.lead_id {
            if self.get_lead(lead_id).await?.is_none() {
                return Err(AppError::NotFound("Associated lead not found.".to_string()));
            }
        }
        if let Some(customer_id) = &request.customer_id {
            if self.get_customer(customer_id).await?.is_none() {
                return Err(AppError::NotFound(
                    "Associated customer not found.".to_string(),
                ));
            }
        }

        let now = Utc::now().to_rfc3339();
        let task = FollowUpTask {
            id: uuid::Uuid::new_v4().to_string(),
            title: request.title.clone(),
            description: request.description.clone(),
            assigned_to: request.assigned_to.clone(),
            due_date: request.due_date.clone(),
            status: request.status.clone().unwrap_or_default(),
            priority: request.priority.clone().unwrap_or_default(),
            lead_id: request.lead_id.clone(),
            customer_id: request.customer_id.clone(),
            created_at: now,
            completed_at: None,
        };

        sqlx::query(&format!(
            "INSERT INTO followup_tasks ({TASK_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.assigned_to)
        .bind(&task.due_date)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(&task.lead_id)
        .bind(&task.customer_id)
        .bind(&task.created_at)
        .bind(&task.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(task)
    }

    /// Update a follow-up task by partial merge, applying the completedAt
    /// derivation: a move to Completed stamps it (unless already stamped),
    /// a move to any other status clears it.
    pub async fn update_task(
        &self,
        id: &str,
        request: &UpdateFollowUpTaskRequest,
    ) -> Result<FollowUpTask, AppError> {
        let existing = self
            .get_task(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Follow-up task not found".to_string()))?;

        let completed_at = match &request.status {
            Some(TaskStatus::Completed) => existing
                .completed_at
                .clone()
                .or_else(|| Some(Utc::now().to_rfc3339())),
            Some(_) => None,
            None => existing.completed_at.clone(),
        };

        let task = FollowUpTask {
            id: existing.id.clone(),
            title: request.title.clone().unwrap_or(existing.title),
            description: request.description.clone().or(existing.description),
            assigned_to: request.assigned_to.clone().unwrap_or(existing.assigned_to),
            due_date: request.due_date.clone().unwrap_or(existing.due_date),
            status: request.status.clone().unwrap_or(existing.status),
            priority: request.priority.clone().unwrap_or(existing.priority),
            lead_id: request.lead_id.clone().or(existing.lead_id),
            customer_id: request.customer_id.clone().or(existing.customer_id),
            created_at: existing.created_at,
            completed_at,
        };

        sqlx::query(
            "UPDATE followup_tasks SET title = ?, description = ?, assigned_to = ?, due_date = ?, status = ?, priority = ?, lead_id = ?, customer_id = ?, completed_at = ? WHERE id = ?"
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.assigned_to)
        .bind(&task.due_date)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(&task.lead_id)
        .bind(&task.customer_id)
        .bind(&task.completed_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(task)
    }

    /// Delete a follow-up task.
    pub async fn delete_task(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM followup_tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Follow-up task not found".to_string()));
        }

        Ok(())
    }

    /// List follow-up tasks referencing a given lead. No existence check on
    /// the filter id; an unknown lead simply yields an empty list.
    pub async fn list_tasks_for_lead(
        &self,
        lead_id: &str,
    ) -> Result<Vec<FollowUpTaskWithRefs>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM followup_tasks WHERE lead_id = ? ORDER BY created_at"
        ))
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await?;

        self.resolve_tasks(rows.iter().map(task_from_row).collect())
            .await
    }

    /// List follow-up tasks referencing a given customer.
    pub async fn list_tasks_for_customer(
        &self,
        customer_id: &str,
    ) -> Result<Vec<FollowUpTaskWithRefs>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM followup_tasks WHERE customer_id = ? ORDER BY created_at"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        self.resolve_tasks(rows.iter().map(task_from_row).collect())
            .await
    }

    /// Resolve a task's lead/customer references into contact summaries.
    /// A reference whose target no longer exists stays unresolved.
    async fn resolve_task(&self, task: FollowUpTask) -> Result<FollowUpTaskWithRefs, AppError> {
        let lead = match &task.lead_id {
            Some(lead_id) => self.get_lead(lead_id).await?.map(|l| ContactSummary {
                id: l.id,
                first_name: l.first_name,
                last_name: l.last_name,
                email: l.email,
            }),
            None => None,
        };

        let customer = match &task.customer_id {
            Some(customer_id) => self.get_customer(customer_id).await?.map(|c| ContactSummary {
                id: c.id,
                first_name: c.first_name,
                last_name: c.last_name,
                email: c.email,
            }),
            None => None,
        };

        Ok(FollowUpTaskWithRefs {
            task,
            lead,
            customer,
        })
    }

    async fn resolve_tasks(
        &self,
        tasks: Vec<FollowUpTask>,
    ) -> Result<Vec<FollowUpTaskWithRefs>, AppError> {
        let mut resolved = Vec::with_capacity(tasks.len());
        for task in tasks {
            resolved.push(self.resolve_task(task).await?);
        }
        Ok(resolved)
    }
}

// Helper functions for row conversion

fn lead_from_row(row: &sqlx::sqlite::SqliteRow) -> Lead {
    let source: String = row.get("source");
    let status: String = row.get("status");
    let priority: String = row.get("priority");

    Lead {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        company: row.get("company"),
        source: LeadSource::from_str(&source).unwrap_or_default(),
        status: LeadStatus::from_str(&status).unwrap_or_default(),
        priority: LeadPriority::from_str(&priority).unwrap_or_default(),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn customer_from_row(row: &sqlx::sqlite::SqliteRow) -> Customer {
    let project_history: String = row.get("project_history");
    let communication_log: String = row.get("communication_log");
    let attached_documents: String = row.get("attached_documents");

    Customer {
        id: row.get("id"),
        lead_id: row.get("lead_id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        company: row.get("company"),
        address: row.get("address"),
        industry: row.get("industry"),
        project_history: serde_json::from_str(&project_history).unwrap_or_default(),
        communication_log: serde_json::from_str(&communication_log).unwrap_or_default(),
        attached_documents: serde_json::from_str(&attached_documents).unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn task_from_row(row: &sqlx::sqlite::SqliteRow) -> FollowUpTask {
    let status: String = row.get("status");
    let priority: String = row.get("priority");

    FollowUpTask {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        assigned_to: row.get("assigned_to"),
        due_date: row.get("due_date"),
        status: TaskStatus::from_str(&status).unwrap_or_default(),
        priority: TaskPriority::from_str(&priority).unwrap_or_default(),
        lead_id: row.get("lead_id"),
        customer_id: row.get("customer_id"),
        created_at: row.get("created_at"),
        completed_at: row.get("completed_at"),
    }
}
