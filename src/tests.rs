//! Integration tests for the CRM backend.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::db::{init_database, Repository};
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        let state = AppState { repo };
        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create a lead with the given email and return the response body.
    async fn create_lead(&self, email: &str) -> Value {
        let resp = self
            .client
            .post(self.url("/api/leads"))
            .json(&json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": email,
                "phone": "555-0100",
                "company": "Analytical Engines Ltd"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        resp.json().await.unwrap()
    }

    /// Create a standalone customer and return the response body.
    async fn create_customer(&self, email: &str) -> Value {
        let resp = self
            .client
            .post(self.url("/api/customers"))
            .json(&json!({
                "firstName": "Grace",
                "lastName": "Hopper",
                "email": email
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        resp.json().await.unwrap()
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

// ==================== LEADS ====================

#[tokio::test]
async fn test_create_lead_applies_defaults() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;
    assert_eq!(lead["status"], "New");
    assert_eq!(lead["priority"], "Cold");
    assert_eq!(lead["source"], "Manual");
    assert!(lead["id"].is_string());
    assert!(lead["createdAt"].is_string());
    assert!(lead["updatedAt"].is_string());
}

#[tokio::test]
async fn test_create_lead_honors_explicit_values() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/leads"))
        .json(&json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "source": "WebsiteForm",
            "status": "Contacted",
            "priority": "Hot"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let lead: Value = resp.json().await.unwrap();
    assert_eq!(lead["source"], "WebsiteForm");
    assert_eq!(lead["status"], "Contacted");
    assert_eq!(lead["priority"], "Hot");
}

#[tokio::test]
async fn test_create_lead_missing_required_fields() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/leads"))
        .json(&json!({ "firstName": "Ada" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_create_lead_rejects_unknown_enum_value() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/leads"))
        .json(&json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "source": "ColdCall"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_create_lead_duplicate_email() {
    let fixture = TestFixture::new().await;

    fixture.create_lead("a@x.com").await;

    let resp = fixture
        .client
        .post(fixture.url("/api/leads"))
        .json(&json!({
            "firstName": "A",
            "lastName": "B",
            "email": "a@x.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_lead_crud_roundtrip() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;
    let id = lead["id"].as_str().unwrap();

    // List
    let resp = fixture
        .client
        .get(fixture.url("/api/leads"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let leads: Value = resp.json().await.unwrap();
    assert_eq!(leads.as_array().unwrap().len(), 1);

    // Get
    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/leads/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Partial update merges; absent fields persist
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/leads/{}", id)))
        .json(&json!({ "notes": "met at conference" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["notes"], "met at conference");
    assert_eq!(updated["firstName"], "Ada");
    assert_eq!(updated["email"], "ada@example.com");

    // Delete
    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/leads/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Lead deleted successfully");

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/leads/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_update_lead_to_taken_email() {
    let fixture = TestFixture::new().await;

    fixture.create_lead("first@example.com").await;
    let lead = fixture.create_lead("second@example.com").await;
    let id = lead["id"].as_str().unwrap();

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/leads/{}", id)))
        .json(&json!({ "email": "first@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // The stored email is untouched
    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/leads/{}", id)))
        .send()
        .await
        .unwrap();
    let lead: Value = resp.json().await.unwrap();
    assert_eq!(lead["email"], "second@example.com");
}

#[tokio::test]
async fn test_update_missing_lead_returns_404() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .put(fixture.url("/api/leads/no-such-id"))
        .json(&json!({ "firstName": "Nobody" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_lead_status_invalid_value_leaves_lead_unchanged() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;
    let id = lead["id"].as_str().unwrap();

    let resp = fixture
        .client
        .patch(fixture.url(&format!("/api/leads/{}/status", id)))
        .json(&json!({ "status": "Qualified" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Invalid status provided");

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/leads/{}", id)))
        .send()
        .await
        .unwrap();
    let lead: Value = resp.json().await.unwrap();
    assert_eq!(lead["status"], "New");
}

#[tokio::test]
async fn test_lead_status_missing_lead_returns_404() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .patch(fixture.url("/api/leads/no-such-id/status"))
        .json(&json!({ "status": "Contacted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_lead_status_plain_transition() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;
    let id = lead["id"].as_str().unwrap();

    let resp = fixture
        .client
        .patch(fixture.url(&format!("/api/leads/{}/status", id)))
        .json(&json!({ "status": "Negotiation" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Lead status updated successfully");
    assert_eq!(body["lead"]["status"], "Negotiation");
    assert!(body.get("customer").is_none());
}

#[tokio::test]
async fn test_lead_conversion_creates_customer() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;
    let id = lead["id"].as_str().unwrap();

    let resp = fixture
        .client
        .patch(fixture.url(&format!("/api/leads/{}/status", id)))
        .json(&json!({ "status": "Converted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Lead converted and customer created successfully"
    );
    assert_eq!(body["lead"]["status"], "Converted");

    // Contact fields are copied across
    let customer = &body["customer"];
    assert_eq!(customer["leadId"], *id);
    assert_eq!(customer["firstName"], "Ada");
    assert_eq!(customer["lastName"], "Lovelace");
    assert_eq!(customer["email"], "ada@example.com");
    assert_eq!(customer["phone"], "555-0100");
    assert_eq!(customer["company"], "Analytical Engines Ltd");
}

#[tokio::test]
async fn test_lead_conversion_is_idempotent() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;
    let id = lead["id"].as_str().unwrap();

    for _ in 0..2 {
        let resp = fixture
            .client
            .patch(fixture.url(&format!("/api/leads/{}/status", id)))
            .json(&json!({ "status": "Converted" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    // Second call reported the existing customer instead of creating one
    let resp = fixture
        .client
        .patch(fixture.url(&format!("/api/leads/{}/status", id)))
        .json(&json!({ "status": "Converted" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Lead status updated to Converted, customer already exists"
    );
    assert!(body.get("customer").is_none());

    let resp = fixture
        .client
        .get(fixture.url("/api/customers"))
        .send()
        .await
        .unwrap();
    let customers: Value = resp.json().await.unwrap();
    assert_eq!(customers.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_lead_conversion_with_taken_customer_email() {
    let fixture = TestFixture::new().await;

    // A standalone customer already owns the email the lead would copy
    fixture.create_customer("shared@example.com").await;
    let lead = fixture.create_lead("shared@example.com").await;
    let id = lead["id"].as_str().unwrap();

    let resp = fixture
        .client
        .patch(fixture.url(&format!("/api/leads/{}/status", id)))
        .json(&json!({ "status": "Converted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // The status write is not rolled back; only the customer copy failed
    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/leads/{}", id)))
        .send()
        .await
        .unwrap();
    let lead: Value = resp.json().await.unwrap();
    assert_eq!(lead["status"], "Converted");

    let resp = fixture
        .client
        .get(fixture.url("/api/customers"))
        .send()
        .await
        .unwrap();
    let customers: Value = resp.json().await.unwrap();
    assert_eq!(customers.as_array().unwrap().len(), 1);
    assert!(customers[0].get("leadId").is_none());
}

#[tokio::test]
async fn test_lead_priority_update() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;
    let id = lead["id"].as_str().unwrap();

    let resp = fixture
        .client
        .patch(fixture.url(&format!("/api/leads/{}/priority", id)))
        .json(&json!({ "priority": "Hot" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Lead priority updated successfully");
    assert_eq!(body["lead"]["priority"], "Hot");

    let resp = fixture
        .client
        .patch(fixture.url(&format!("/api/leads/{}/priority", id)))
        .json(&json!({ "priority": "Scorching" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Invalid priority provided");
}

// ==================== CUSTOMERS ====================

#[tokio::test]
async fn test_create_standalone_customer() {
    let fixture = TestFixture::new().await;

    let customer = fixture.create_customer("grace@example.com").await;
    assert!(customer["id"].is_string());
    assert!(customer.get("leadId").is_none());
    assert_eq!(customer["projectHistory"], json!([]));
    assert_eq!(customer["communicationLog"], json!([]));
    assert_eq!(customer["attachedDocuments"], json!([]));
}

#[tokio::test]
async fn test_create_customer_missing_required_fields() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/customers"))
        .json(&json!({ "firstName": "Grace" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_create_customer_duplicate_email() {
    let fixture = TestFixture::new().await;

    fixture.create_customer("grace@example.com").await;

    let resp = fixture
        .client
        .post(fixture.url("/api/customers"))
        .json(&json!({
            "firstName": "Grace",
            "lastName": "Hopper",
            "email": "grace@example.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_create_customer_from_lead_copies_and_overrides() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;
    let lead_id = lead["id"].as_str().unwrap();

    let resp = fixture
        .client
        .post(fixture.url("/api/customers"))
        .json(&json!({
            "leadId": lead_id,
            "industry": "Computing",
            "phone": "555-0199"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let customer: Value = resp.json().await.unwrap();

    // Copied from the lead
    assert_eq!(customer["firstName"], "Ada");
    assert_eq!(customer["email"], "ada@example.com");
    // Overridden by the request body
    assert_eq!(customer["phone"], "555-0199");
    assert_eq!(customer["industry"], "Computing");

    // Side effect: source lead flipped to Converted
    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/leads/{}", lead_id)))
        .send()
        .await
        .unwrap();
    let lead: Value = resp.json().await.unwrap();
    assert_eq!(lead["status"], "Converted");
}

#[tokio::test]
async fn test_create_customer_from_missing_lead() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/customers"))
        .json(&json!({ "leadId": "no-such-lead" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Associated lead not found");
}

#[tokio::test]
async fn test_create_customer_from_lead_twice_is_a_conflict() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;
    let lead_id = lead["id"].as_str().unwrap();

    let resp = fixture
        .client
        .post(fixture.url("/api/customers"))
        .json(&json!({ "leadId": lead_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = fixture
        .client
        .post(fixture.url("/api/customers"))
        .json(&json!({ "leadId": lead_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["message"],
        "This lead has already been converted to a customer."
    );
}

#[tokio::test]
async fn test_list_customers_attaches_lead_summary() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;
    let lead_id = lead["id"].as_str().unwrap();

    fixture
        .client
        .post(fixture.url("/api/customers"))
        .json(&json!({ "leadId": lead_id }))
        .send()
        .await
        .unwrap();

    let resp = fixture
        .client
        .get(fixture.url("/api/customers"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let customers: Value = resp.json().await.unwrap();
    let customer = &customers.as_array().unwrap()[0];

    assert_eq!(customer["leadId"], *lead_id);
    let summary = &customer["lead"];
    assert_eq!(summary["firstName"], "Ada");
    assert_eq!(summary["email"], "ada@example.com");
    assert_eq!(summary["status"], "Converted");
    // Summary projection only, not the full record
    assert!(summary.get("phone").is_none());
    assert!(summary.get("source").is_none());
}

#[tokio::test]
async fn test_get_customer_resolves_full_lead() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;
    let lead_id = lead["id"].as_str().unwrap();

    let resp = fixture
        .client
        .post(fixture.url("/api/customers"))
        .json(&json!({ "leadId": lead_id }))
        .send()
        .await
        .unwrap();
    let customer: Value = resp.json().await.unwrap();
    let customer_id = customer["id"].as_str().unwrap();

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/customers/{}", customer_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    // Full lead record on the detail view
    assert_eq!(body["lead"]["phone"], "555-0100");
    assert_eq!(body["lead"]["source"], "Manual");
}

#[tokio::test]
async fn test_customer_update_and_delete() {
    let fixture = TestFixture::new().await;

    let customer = fixture.create_customer("grace@example.com").await;
    let id = customer["id"].as_str().unwrap();

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/customers/{}", id)))
        .json(&json!({ "address": "1 Navy Way" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["address"], "1 Navy Way");
    assert_eq!(updated["firstName"], "Grace");

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/customers/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Customer deleted successfully");

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/customers/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_update_customer_to_taken_email() {
    let fixture = TestFixture::new().await;

    fixture.create_customer("first@example.com").await;
    let customer = fixture.create_customer("second@example.com").await;
    let id = customer["id"].as_str().unwrap();

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/customers/{}", id)))
        .json(&json!({ "email": "first@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Re-submitting a customer's own email is not a conflict
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/customers/{}", id)))
        .json(&json!({ "email": "second@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_append_communication_log() {
    let fixture = TestFixture::new().await;

    let customer = fixture.create_customer("grace@example.com").await;
    let id = customer["id"].as_str().unwrap();

    let resp = fixture
        .client
        .post(fixture.url(&format!("/api/customers/{}/communication", id)))
        .json(&json!({
            "type": "Call",
            "notes": "Discussed renewal",
            "staff": "sam"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let log = body["communicationLog"].as_array().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0]["type"], "Call");
    assert_eq!(log[0]["staff"], "sam");
    // Server-assigned timestamp
    assert!(log[0]["date"].is_string());

    // Entries accumulate in order
    let resp = fixture
        .client
        .post(fixture.url(&format!("/api/customers/{}/communication", id)))
        .json(&json!({ "type": "Email", "notes": "Sent quote" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let log = body["communicationLog"].as_array().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0]["type"], "Call");
    assert_eq!(log[1]["type"], "Email");
}

#[tokio::test]
async fn test_append_document_and_project() {
    let fixture = TestFixture::new().await;

    let customer = fixture.create_customer("grace@example.com").await;
    let id = customer["id"].as_str().unwrap();

    let resp = fixture
        .client
        .post(fixture.url(&format!("/api/customers/{}/document", id)))
        .json(&json!({
            "fileName": "contract.pdf",
            "fileURL": "https://files.example.com/contract.pdf"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let docs = body["attachedDocuments"].as_array().unwrap();
    assert_eq!(docs[0]["fileName"], "contract.pdf");
    assert!(docs[0]["uploadedAt"].is_string());

    let resp = fixture
        .client
        .post(fixture.url(&format!("/api/customers/{}/project", id)))
        .json(&json!({
            "projectName": "Compiler rewrite",
            "status": "Active",
            "details": "Phase one"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let projects = body["projectHistory"].as_array().unwrap();
    assert_eq!(projects[0]["projectName"], "Compiler rewrite");
}

#[tokio::test]
async fn test_append_to_missing_customer_creates_nothing() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/customers/no-such-id/communication"))
        .json(&json!({ "type": "Call" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .get(fixture.url("/api/customers"))
        .send()
        .await
        .unwrap();
    let customers: Value = resp.json().await.unwrap();
    assert!(customers.as_array().unwrap().is_empty());
}

// ==================== FOLLOW-UP TASKS ====================

#[tokio::test]
async fn test_followup_requires_a_reference() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/followups"))
        .json(&json!({
            "title": "Call back",
            "assignedTo": "sam",
            "dueDate": "2025-07-01"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Follow-up task must be associated with either a Lead or a Customer."
    );
}

#[tokio::test]
async fn test_followup_requires_title_assignee_due_date() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;

    let resp = fixture
        .client
        .post(fixture.url("/api/followups"))
        .json(&json!({
            "title": "Call back",
            "leadId": lead["id"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Title, assignedTo, and dueDate are required.");
}

#[tokio::test]
async fn test_followup_with_missing_lead_returns_404() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/followups"))
        .json(&json!({
            "title": "Call back",
            "assignedTo": "sam",
            "dueDate": "2025-07-01",
            "leadId": "no-such-lead"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Associated lead not found.");
}

#[tokio::test]
async fn test_followup_defaults() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;

    let resp = fixture
        .client
        .post(fixture.url("/api/followups"))
        .json(&json!({
            "title": "Call back",
            "assignedTo": "sam",
            "dueDate": "2025-07-01",
            "leadId": lead["id"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let task: Value = resp.json().await.unwrap();
    assert_eq!(task["status"], "Pending");
    assert_eq!(task["priority"], "Medium");
    assert!(task["completedAt"].is_null());
    assert!(task["createdAt"].is_string());
}

#[tokio::test]
async fn test_completed_at_stamp_and_clear() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;
    let resp = fixture
        .client
        .post(fixture.url("/api/followups"))
        .json(&json!({
            "title": "Call back",
            "assignedTo": "sam",
            "dueDate": "2025-07-01",
            "leadId": lead["id"]
        }))
        .send()
        .await
        .unwrap();
    let task: Value = resp.json().await.unwrap();
    let id = task["id"].as_str().unwrap();
    assert!(task["completedAt"].is_null());

    // Completing stamps completedAt
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/followups/{}", id)))
        .json(&json!({ "status": "Completed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let task: Value = resp.json().await.unwrap();
    assert_eq!(task["status"], "Completed");
    let stamped = task["completedAt"].as_str().unwrap().to_string();
    assert!(!stamped.is_empty());

    // Completing again keeps the original stamp
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/followups/{}", id)))
        .json(&json!({ "status": "Completed" }))
        .send()
        .await
        .unwrap();
    let task: Value = resp.json().await.unwrap();
    assert_eq!(task["completedAt"], *stamped);

    // Moving away from Completed clears it
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/followups/{}", id)))
        .json(&json!({ "status": "Pending" }))
        .send()
        .await
        .unwrap();
    let task: Value = resp.json().await.unwrap();
    assert_eq!(task["status"], "Pending");
    assert!(task["completedAt"].is_null());
}

#[tokio::test]
async fn test_followup_update_invalid_status() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;
    let resp = fixture
        .client
        .post(fixture.url("/api/followups"))
        .json(&json!({
            "title": "Call back",
            "assignedTo": "sam",
            "dueDate": "2025-07-01",
            "leadId": lead["id"]
        }))
        .send()
        .await
        .unwrap();
    let task: Value = resp.json().await.unwrap();
    let id = task["id"].as_str().unwrap();

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/followups/{}", id)))
        .json(&json!({ "status": "Done" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_followup_list_resolves_references() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;
    let customer = fixture.create_customer("grace@example.com").await;

    fixture
        .client
        .post(fixture.url("/api/followups"))
        .json(&json!({
            "title": "Call back",
            "assignedTo": "sam",
            "dueDate": "2025-07-01",
            "leadId": lead["id"],
            "customerId": customer["id"]
        }))
        .send()
        .await
        .unwrap();

    let resp = fixture
        .client
        .get(fixture.url("/api/followups"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let tasks: Value = resp.json().await.unwrap();
    let task = &tasks.as_array().unwrap()[0];
    assert_eq!(task["lead"]["firstName"], "Ada");
    assert_eq!(task["lead"]["email"], "ada@example.com");
    assert_eq!(task["customer"]["firstName"], "Grace");
    // Contact summaries carry no status field
    assert!(task["lead"].get("status").is_none());
}

#[tokio::test]
async fn test_followups_filtered_by_lead_and_customer() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;
    let customer = fixture.create_customer("grace@example.com").await;

    for (title, body_ref) in [
        ("lead task", json!({ "leadId": lead["id"] })),
        ("customer task", json!({ "customerId": customer["id"] })),
    ] {
        let mut body = json!({
            "title": title,
            "assignedTo": "sam",
            "dueDate": "2025-07-01"
        });
        body.as_object_mut()
            .unwrap()
            .extend(body_ref.as_object().unwrap().clone());
        let resp = fixture
            .client
            .post(fixture.url("/api/followups"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
    }

    let resp = fixture
        .client
        .get(fixture.url(&format!(
            "/api/followups/lead/{}",
            lead["id"].as_str().unwrap()
        )))
        .send()
        .await
        .unwrap();
    let tasks: Value = resp.json().await.unwrap();
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["title"], "lead task");

    let resp = fixture
        .client
        .get(fixture.url(&format!(
            "/api/followups/customer/{}",
            customer["id"].as_str().unwrap()
        )))
        .send()
        .await
        .unwrap();
    let tasks: Value = resp.json().await.unwrap();
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["title"], "customer task");

    // Unknown filter id yields an empty list, not an error
    let resp = fixture
        .client
        .get(fixture.url("/api/followups/lead/no-such-lead"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let tasks: Value = resp.json().await.unwrap();
    assert!(tasks.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_deleting_customer_orphans_its_tasks() {
    let fixture = TestFixture::new().await;

    let customer = fixture.create_customer("grace@example.com").await;
    let customer_id = customer["id"].as_str().unwrap();

    let resp = fixture
        .client
        .post(fixture.url("/api/followups"))
        .json(&json!({
            "title": "Check in",
            "assignedTo": "sam",
            "dueDate": "2025-07-01",
            "customerId": customer_id
        }))
        .send()
        .await
        .unwrap();
    let task: Value = resp.json().await.unwrap();
    let task_id = task["id"].as_str().unwrap();

    fixture
        .client
        .delete(fixture.url(&format!("/api/customers/{}", customer_id)))
        .send()
        .await
        .unwrap();

    // The task survives with an unresolved reference: raw id kept, no
    // projection attached
    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/followups/{}", task_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let task: Value = resp.json().await.unwrap();
    assert_eq!(task["customerId"], *customer_id);
    assert!(task.get("customer").is_none());
}

#[tokio::test]
async fn test_followup_delete() {
    let fixture = TestFixture::new().await;

    let lead = fixture.create_lead("ada@example.com").await;
    let resp = fixture
        .client
        .post(fixture.url("/api/followups"))
        .json(&json!({
            "title": "Call back",
            "assignedTo": "sam",
            "dueDate": "2025-07-01",
            "leadId": lead["id"]
        }))
        .send()
        .await
        .unwrap();
    let task: Value = resp.json().await.unwrap();
    let id = task["id"].as_str().unwrap();

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/followups/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Follow-up task deleted successfully");

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/followups/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

// ==================== INTEGRATION STUBS ====================

#[tokio::test]
async fn test_integration_stubs_return_placeholders() {
    let fixture = TestFixture::new().await;

    let paths = [
        "/api/integrations/import-leads-from-csv",
        "/api/integrations/google-ads/authenticate",
        "/api/integrations/google-ads/import-leads",
        "/api/integrations/meta-ads/authenticate",
        "/api/integrations/meta-ads/import-leads",
        "/api/integrations/email/connect",
    ];

    for path in paths {
        let resp = fixture.client.post(fixture.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), 200, "{path}");
        let body: Value = resp.json().await.unwrap();
        assert!(body["message"].as_str().unwrap().contains("placeholder"));
    }
}
