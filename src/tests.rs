#[cfg(test)]
mod integration_tests {
    use crate::handlers::automation::TriggerRunRequest;
    use crate::handlers::claims::{CreateClaimRequest, ReconciliationRequest, TransitionRequest};
    use crate::handlers::contracts::CreateContractRequest;
    use crate::handlers::residents::CreateResidentRequest;
    use crate::handlers::transactions::CreateTransactionRequest;
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::setup_test_app;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::NaiveDate;
    use common::ClaimFilters;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    /// Create a contract through the API and activate it. Returns the
    /// contract ID. The seeded test resident has ID 1.
    async fn create_active_contract(server: &TestServer, daily_cost: &str, original: &str) -> i64 {
        let create_request = CreateContractRequest {
            organization_id: 1,
            resident_id: 1,
            funding_source: "ndia".to_string(),
            original_amount: Decimal::from_str(original).unwrap(),
            drawdown_rate: "daily".to_string(),
            auto_drawdown: true,
            daily_support_item_cost: Decimal::from_str(daily_cost).unwrap(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
            parent_contract_id: None,
        };

        let response = server.post("/api/v1/contracts").json(&create_request).await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        let contract_id = body.data["id"].as_i64().unwrap();

        let activate = server
            .post(&format!("/api/v1/contracts/{}/activate", contract_id))
            .await;
        activate.assert_status(StatusCode::OK);

        contract_id
    }

    /// Record a manual draft transaction against the contract and return
    /// its ID.
    async fn create_draft_transaction(
        server: &TestServer,
        contract_id: i64,
        amount: &str,
        occurred_on: NaiveDate,
    ) -> i64 {
        let create_request = CreateTransactionRequest {
            organization_id: 1,
            resident_id: 1,
            contract_id: contract_id as i32,
            amount: Decimal::from_str(amount).unwrap(),
            occurred_at: occurred_on.and_hms_opt(10, 0, 0).unwrap(),
            service_code: "SDA_DAILY".to_string(),
        };

        let response = server
            .post("/api/v1/transactions")
            .json(&create_request)
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        body.data["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        // Setup test server
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        // Send GET request to health endpoint
        let response = server.get("/health").await;

        // Verify response
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_resident() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let create_request = CreateResidentRequest {
            organization_id: 1,
            first_name: "Priya".to_string(),
            last_name: "Sharma".to_string(),
            ndis_number: "430999888".to_string(),
        };

        let response = server.post("/api/v1/residents").json(&create_request).await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert!(body.success);
        assert_eq!(body.message, "Resident created successfully");
        assert_eq!(body.data["first_name"], "Priya");
        assert!(body.data["id"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_contract_activation_lifecycle() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        // New contracts start in draft
        let create_request = CreateContractRequest {
            organization_id: 1,
            resident_id: 1,
            funding_source: "ndia".to_string(),
            original_amount: Decimal::from_str("50000.00").unwrap(),
            drawdown_rate: "daily".to_string(),
            auto_drawdown: true,
            daily_support_item_cost: Decimal::from_str("100.00").unwrap(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
            parent_contract_id: None,
        };
        let response = server.post("/api/v1/contracts").json(&create_request).await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["status"], "draft");
        assert_eq!(body.data["current_balance"], body.data["original_amount"]);
        let contract_id = body.data["id"].as_i64().unwrap();

        // Activate it
        let activate = server
            .post(&format!("/api/v1/contracts/{}/activate", contract_id))
            .await;
        activate.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = activate.json();
        assert_eq!(body.data["status"], "active");

        // Activating twice is a conflict
        let again = server
            .post(&format!("/api/v1/contracts/{}/activate", contract_id))
            .await;
        again.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_contract_rejects_unknown_drawdown_rate() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/v1/contracts")
            .json(&serde_json::json!({
                "organization_id": 1,
                "resident_id": 1,
                "funding_source": "ndia",
                "original_amount": "1000.00",
                "drawdown_rate": "fortnightly",
                "auto_drawdown": true,
                "daily_support_item_cost": "100.00",
                "start_date": "2024-01-01",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_manual_transaction_allocates_number() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let contract_id = create_active_contract(&server, "100.00", "50000.00").await;

        let create_request = CreateTransactionRequest {
            organization_id: 1,
            resident_id: 1,
            contract_id: contract_id as i32,
            amount: Decimal::from_str("150.00").unwrap(),
            occurred_at: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            service_code: "SDA_DAILY".to_string(),
        };

        let response = server
            .post("/api/v1/transactions")
            .json(&create_request)
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["transaction_number"], "TXN-A000001");
        assert_eq!(body.data["status"], "draft");
        assert_eq!(body.data["source"], "manual");
    }

    #[tokio::test]
    async fn test_transaction_rejects_non_positive_amount() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let contract_id = create_active_contract(&server, "100.00", "50000.00").await;

        let create_request = CreateTransactionRequest {
            organization_id: 1,
            resident_id: 1,
            contract_id: contract_id as i32,
            amount: Decimal::ZERO,
            occurred_at: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            service_code: "SDA_DAILY".to_string(),
        };

        let response = server
            .post("/api/v1/transactions")
            .json(&create_request)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_package_claim_aggregates_transactions() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let contract_id = create_active_contract(&server, "100.00", "50000.00").await;

        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        create_draft_transaction(&server, contract_id, "100.00", day).await;
        create_draft_transaction(&server, contract_id, "50.00", day).await;
        create_draft_transaction(&server, contract_id, "25.00", day).await;

        let create_request = CreateClaimRequest {
            organization_id: 1,
            created_by: "ops@example.com".to_string(),
            filters: ClaimFilters::default(),
        };
        let response = server.post("/api/v1/claims").json(&create_request).await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["claim_number"], "CLM-A000001");
        assert_eq!(body.data["status"], "draft");
        assert_eq!(body.data["transaction_count"], 3);
        let total = Decimal::from_str(body.data["total_amount"].as_str().unwrap()).unwrap();
        assert_eq!(total, Decimal::from_str("175.00").unwrap());

        // Every selected transaction is now picked up and linked
        let claim_id = body.data["id"].as_i64().unwrap();
        let listed = server
            .get(&format!("/api/v1/transactions?claim_id={}", claim_id))
            .await;
        listed.assert_status(StatusCode::OK);
        let listed: ApiResponse<Vec<serde_json::Value>> = listed.json();
        assert_eq!(listed.data.len(), 3);
        assert!(listed.data.iter().all(|t| t["status"] == "picked_up"));
    }

    #[tokio::test]
    async fn test_package_claim_with_no_matches_fails() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let create_request = CreateClaimRequest {
            organization_id: 1,
            created_by: "ops@example.com".to_string(),
            filters: ClaimFilters::default(),
        };
        let response = server.post("/api/v1/claims").json(&create_request).await;

        response.assert_status(StatusCode::BAD_REQUEST);

        // The aborted packaging left no claim behind
        let listed = server.get("/api/v1/claims").await;
        let listed: ApiResponse<Vec<serde_json::Value>> = listed.json();
        assert!(listed.data.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_claim_transition_is_conflict() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let contract_id = create_active_contract(&server, "100.00", "50000.00").await;
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        create_draft_transaction(&server, contract_id, "100.00", day).await;

        let create_request = CreateClaimRequest {
            organization_id: 1,
            created_by: "ops@example.com".to_string(),
            filters: ClaimFilters::default(),
        };
        let response = server.post("/api/v1/claims").json(&create_request).await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        let claim_id = body.data["id"].as_i64().unwrap();

        // Draft claims cannot jump straight to paid
        let transition = server
            .post(&format!("/api/v1/claims/{}/status", claim_id))
            .json(&TransitionRequest {
                status: "paid".to_string(),
                actor: None,
            })
            .await;
        transition.assert_status(StatusCode::CONFLICT);

        // And an unknown status is a bad request
        let transition = server
            .post(&format!("/api/v1/claims/{}/status", claim_id))
            .json(&TransitionRequest {
                status: "approved".to_string(),
                actor: None,
            })
            .await;
        transition.assert_status(StatusCode::BAD_REQUEST);

        // The claim is untouched
        let fetched = server.get(&format!("/api/v1/claims/{}", claim_id)).await;
        let fetched: ApiResponse<serde_json::Value> = fetched.json();
        assert_eq!(fetched.data["status"], "draft");
    }

    #[tokio::test]
    async fn test_claim_submission_and_reconciliation() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let contract_id = create_active_contract(&server, "100.00", "50000.00").await;
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        create_draft_transaction(&server, contract_id, "100.00", day).await;

        let create_request = CreateClaimRequest {
            organization_id: 1,
            created_by: "ops@example.com".to_string(),
            filters: ClaimFilters::default(),
        };
        let response = server.post("/api/v1/claims").json(&create_request).await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = response.json();
        let claim_id = body.data["id"].as_i64().unwrap();

        // Submit the claim, stamping the actor
        let transition = server
            .post(&format!("/api/v1/claims/{}/status", claim_id))
            .json(&TransitionRequest {
                status: "submitted".to_string(),
                actor: Some("ops@example.com".to_string()),
            })
            .await;
        transition.assert_status(StatusCode::OK);
        let transitioned: ApiResponse<serde_json::Value> = transition.json();
        assert_eq!(transitioned.data["status"], "submitted");
        assert_eq!(transitioned.data["submitted_by"], "ops@example.com");

        // Record the regulator response, moving the claim to paid
        let reconciliation = server
            .post(&format!("/api/v1/claims/{}/reconciliations", claim_id))
            .json(&ReconciliationRequest {
                uploaded_by: "ops@example.com".to_string(),
                processed_count: 1,
                paid_count: 1,
                rejected_count: 0,
                error_count: 0,
                unmatched_count: 0,
                raw_results: None,
                resulting_status: Some("paid".to_string()),
            })
            .await;
        reconciliation.assert_status(StatusCode::CREATED);
        let reconciled: ApiResponse<serde_json::Value> = reconciliation.json();
        assert_eq!(reconciled.data["paid_count"], 1);
        assert_eq!(reconciled.data["claim"]["status"], "paid");

        // Settle the linked transactions
        let settled = server
            .post(&format!("/api/v1/claims/{}/mark-paid", claim_id))
            .await;
        settled.assert_status(StatusCode::OK);
        let settled: ApiResponse<u64> = settled.json();
        assert_eq!(settled.data, 1);

        let listed = server
            .get(&format!("/api/v1/transactions?claim_id={}", claim_id))
            .await;
        let listed: ApiResponse<Vec<serde_json::Value>> = listed.json();
        assert!(listed.data.iter().all(|t| t["status"] == "paid"));
    }

    #[tokio::test]
    async fn test_transactions_status_filter() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let contract_id = create_active_contract(&server, "100.00", "50000.00").await;
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        create_draft_transaction(&server, contract_id, "100.00", day).await;

        let listed = server.get("/api/v1/transactions?status=draft").await;
        listed.assert_status(StatusCode::OK);
        let listed: ApiResponse<Vec<serde_json::Value>> = listed.json();
        assert_eq!(listed.data.len(), 1);

        let listed = server.get("/api/v1/transactions?status=paid").await;
        listed.assert_status(StatusCode::OK);
        let listed: ApiResponse<Vec<serde_json::Value>> = listed.json();
        assert!(listed.data.is_empty());

        // Unknown status values are rejected
        let listed = server.get("/api/v1/transactions?status=pending").await;
        listed.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_forced_automation_run() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        create_active_contract(&server, "100.00", "50000.00").await;

        // Force a run outside the configured window
        let response = server
            .post("/api/v1/automation/run")
            .json(&TriggerRunRequest {
                organization_id: 1,
                force: Some(true),
            })
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["outcome"], "completed");
        assert_eq!(body.data["status"], "success");
        assert_eq!(body.data["summary"]["successful_transactions"], 1);

        // The run wrote exactly one log entry
        let runs = server.get("/api/v1/automation/runs?organization_id=1").await;
        runs.assert_status(StatusCode::OK);
        let runs: ApiResponse<Vec<serde_json::Value>> = runs.json();
        assert_eq!(runs.data.len(), 1);
        assert_eq!(runs.data[0]["status"], "success");
        assert_eq!(runs.data[0]["successful_transactions"], 1);

        // A second trigger on the same day is refused by the run guard
        let response = server
            .post("/api/v1/automation/run")
            .json(&TriggerRunRequest {
                organization_id: 1,
                force: Some(true),
            })
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data["outcome"], "already_ran");

        // And no second transaction was generated
        let listed = server.get("/api/v1/transactions?status=draft").await;
        let listed: ApiResponse<Vec<serde_json::Value>> = listed.json();
        assert_eq!(listed.data.len(), 1);
    }

    #[tokio::test]
    async fn test_automation_run_not_due_without_force() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        create_active_contract(&server, "100.00", "50000.00").await;

        // The test config runs at 02:00 Sydney; an unforced trigger only
        // matches during that minute, so outcomes other than completed are
        // expected almost always. Accept either to keep the test stable.
        let response = server
            .post("/api/v1/automation/run")
            .json(&TriggerRunRequest {
                organization_id: 1,
                force: None,
            })
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<serde_json::Value> = response.json();
        let outcome = body.data["outcome"].as_str().unwrap();
        assert!(outcome == "not_due" || outcome == "completed");
    }
}
