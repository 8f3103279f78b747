mod common;

use axum::http::{header, StatusCode};
use common::{
    admin_auth, basic_auth, get_request, json_request, sample_invoice, TestApp, ADMIN_PASSWORD,
};
use invoicing::db::UserStore;
use serde_json::json;

// =========================================================================
//  AUTHENTICATION
// =========================================================================

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.send(get_request("/api/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));
}

#[tokio::test]
async fn missing_credentials_are_rejected_with_challenge() {
    let app = TestApp::with_admin().await;
    let calls_before = app.store.calls();

    let response = app
        .send_raw(json_request("POST", "/api/invoices", None, sample_invoice(1)))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()[header::WWW_AUTHENTICATE],
        r#"Basic realm="invoicing""#
    );
    assert_eq!(app.store.calls(), calls_before);
    assert_eq!(app.store.invoice_count(), 0);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = TestApp::with_admin().await;
    let auth = basic_auth("admin", "wrong");

    let (status, body) = app.send(get_request("/api/invoices", Some(&auth))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn non_admin_accounts_are_rejected() {
    let app = TestApp::new();
    let hash = bcrypt::hash("pw", 4).unwrap();
    app.store.create_user("clerk", &hash, false).await.unwrap();
    let calls_before = app.store.calls();

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/invoices",
            Some(&basic_auth("clerk", "pw")),
            sample_invoice(1),
        ))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // Only the credential lookup reached the store.
    assert_eq!(app.store.calls(), calls_before + 1);
    assert_eq!(app.store.invoice_count(), 0);
}

#[tokio::test]
async fn duplicate_admin_username_conflicts() {
    let app = TestApp::with_admin().await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/admin/create-user",
            None,
            json!({ "username": "admin", "password": ADMIN_PASSWORD }),
        ))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username already exists");
}

#[tokio::test]
async fn create_user_requires_both_fields() {
    let app = TestApp::new();

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/admin/create-user",
            None,
            json!({ "username": "admin" }),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["password"].is_array());
}

// =========================================================================
//  INVOICES
// =========================================================================

#[tokio::test]
async fn create_invoice_derives_totals() {
    let app = TestApp::with_admin().await;

    let (status, body) = app
        .send(json_request("POST", "/api/invoices", Some(&admin_auth()), sample_invoice(1)))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_i64().unwrap() > 0);
    assert_eq!(body["total"].as_f64(), Some(86.0));
    assert_eq!(body["status"], "draft");

    let item_totals: Vec<f64> = body["line_items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["total"].as_f64().unwrap())
        .collect();
    assert_eq!(item_totals, vec![21.0, 5.0, 60.0]);
}

#[tokio::test]
async fn client_supplied_totals_are_ignored() {
    let app = TestApp::with_admin().await;
    let mut payload = sample_invoice(1);
    payload["total"] = json!(999.99);
    payload["line_items"][0]["total"] = json!(1.0);

    let (status, body) = app
        .send(json_request("POST", "/api/invoices", Some(&admin_auth()), payload))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total"].as_f64(), Some(86.0));
    assert_eq!(body["line_items"][0]["total"].as_f64(), Some(21.0));
}

#[tokio::test]
async fn empty_line_items_are_rejected_before_storage() {
    let app = TestApp::with_admin().await;
    let calls_before = app.store.calls();
    let mut payload = sample_invoice(1);
    payload["line_items"] = json!([]);

    let (status, body) = app
        .send(json_request("POST", "/api/invoices", Some(&admin_auth()), payload))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing or invalid fields");
    assert!(body["details"]["line_items"].is_array());
    // One call for the credential lookup, none for the invoice.
    assert_eq!(app.store.calls(), calls_before + 1);
    assert_eq!(app.store.invoice_count(), 0);
}

#[tokio::test]
async fn negative_quantity_is_reported_per_item() {
    let app = TestApp::with_admin().await;
    let mut payload = sample_invoice(1);
    payload["line_items"][1]["quantity"] = json!(-1);

    let (status, body) = app
        .send(json_request("POST", "/api/invoices", Some(&admin_auth()), payload))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["line_items[1].quantity"].is_array());
}

#[tokio::test]
async fn missing_customer_and_dates_are_rejected() {
    let app = TestApp::with_admin().await;
    let payload = json!({
        "line_items": [{ "description": "Item", "quantity": 1, "unit_price": 1.0 }]
    });

    let (status, body) = app
        .send(json_request("POST", "/api/invoices", Some(&admin_auth()), payload))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["customer_id"].is_array());
    assert!(body["details"]["issue_date"].is_array());
    assert!(body["details"]["due_date"].is_array());
}

#[tokio::test]
async fn overflowing_amounts_are_rejected_before_storage() {
    let app = TestApp::with_admin().await;
    let calls_before = app.store.calls();

    for line in [
        json!({ "description": "Bulk", "quantity": 2147483647, "unit_price": 1e20 }),
        json!({ "description": "Bulk", "quantity": 1, "unit_price": 20000000000u64 }),
        json!({ "description": "Bulk", "quantity": 2147483647, "unit_price": 100.0 }),
    ] {
        let mut payload = sample_invoice(1);
        payload["line_items"] = json!([line]);

        let (status, body) = app
            .send(json_request("POST", "/api/invoices", Some(&admin_auth()), payload))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    // Only the three credential lookups reached the store.
    assert_eq!(app.store.calls(), calls_before + 3);
    assert_eq!(app.store.invoice_count(), 0);
}

#[tokio::test]
async fn invoice_total_past_storage_bound_is_rejected() {
    let app = TestApp::with_admin().await;
    let mut payload = sample_invoice(1);
    payload["line_items"] = json!([
        { "description": "Half", "quantity": 1, "unit_price": 6000000000.0 },
        { "description": "Other half", "quantity": 1, "unit_price": 6000000000.0 }
    ]);

    let (status, body) = app
        .send(json_request("POST", "/api/invoices", Some(&admin_auth()), payload))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["total"].is_array());
}

#[tokio::test]
async fn malformed_json_uses_error_envelope() {
    let app = TestApp::with_admin().await;
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/invoices")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, admin_auth())
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request payload");
}

#[tokio::test]
async fn unknown_customer_is_auto_created() {
    let app = TestApp::with_admin().await;
    assert!(app.store.customer(42).is_none());

    let (status, _) = app
        .send(json_request("POST", "/api/invoices", Some(&admin_auth()), sample_invoice(42)))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .send(get_request("/api/customers/42", Some(&admin_auth())))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 42);
    assert_eq!(body["name"], "Customer #42");
}

#[tokio::test]
async fn storage_failure_returns_500_and_persists_nothing() {
    let app = TestApp::with_admin().await;
    app.store.fail_writes(true);

    let (status, body) = app
        .send(json_request("POST", "/api/invoices", Some(&admin_auth()), sample_invoice(9)))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "An unexpected error occurred");
    assert_eq!(app.store.invoice_count(), 0);
    assert!(app.store.customer(9).is_none());
}

#[tokio::test]
async fn created_invoice_reads_back_identically() {
    let app = TestApp::with_admin().await;
    let (_, created) = app
        .send(json_request("POST", "/api/invoices", Some(&admin_auth()), sample_invoice(1)))
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, fetched) = app
        .send(get_request(&format!("/api/invoices/{id}"), Some(&admin_auth())))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["customer_id"], 1);
    assert_eq!(fetched["issue_date"], "2025-12-31");
    assert_eq!(fetched["due_date"], "2026-01-14");
    assert_eq!(fetched["total"].as_f64(), Some(86.0));
    assert_eq!(fetched["line_items"].as_array().unwrap().len(), 3);
    assert_eq!(fetched["line_items"][2]["description"], "Item 3");
}

#[tokio::test]
async fn unknown_invoice_is_404() {
    let app = TestApp::with_admin().await;

    let (status, body) = app
        .send(get_request("/api/invoices/999", Some(&admin_auth())))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Invoice not found");
}

#[tokio::test]
async fn non_numeric_id_is_400() {
    let app = TestApp::with_admin().await;

    let (status, body) = app
        .send(get_request("/api/invoices/abc", Some(&admin_auth())))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid id");
}

#[tokio::test]
async fn list_paginates_newest_first() {
    let app = TestApp::with_admin().await;
    for day in 1..=20 {
        let mut payload = sample_invoice(1);
        payload["issue_date"] = json!(format!("2025-01-{day:02}"));
        let (status, _) = app
            .send(json_request("POST", "/api/invoices", Some(&admin_auth()), payload))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .send(get_request("/api/invoices?limit=10&offset=5", Some(&admin_auth())))
        .await;

    assert_eq!(status, StatusCode::OK);
    let page = body.as_array().unwrap();
    assert_eq!(page.len(), 10);
    assert_eq!(page[0]["issue_date"], "2025-01-15");
    assert_eq!(page[9]["issue_date"], "2025-01-06");
    assert!(page[0].get("line_items").is_none());
}

#[tokio::test]
async fn invalid_pagination_falls_back_to_defaults() {
    let app = TestApp::with_admin().await;
    for _ in 0..25 {
        app.send(json_request("POST", "/api/invoices", Some(&admin_auth()), sample_invoice(1)))
            .await;
    }

    let (status, body) = app
        .send(get_request("/api/invoices?limit=0&offset=-3", Some(&admin_auth())))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 20);

    let (_, body) = app
        .send(get_request("/api/invoices?limit=abc", Some(&admin_auth())))
        .await;
    assert_eq!(body.as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn unparseable_query_string_uses_default_page() {
    let app = TestApp::with_admin().await;
    for _ in 0..25 {
        app.send(json_request("POST", "/api/invoices", Some(&admin_auth()), sample_invoice(1)))
            .await;
    }

    let (status, body) = app
        .send(get_request("/api/invoices?limit=1&limit=2", Some(&admin_auth())))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn status_update_is_idempotent() {
    let app = TestApp::with_admin().await;
    let (_, created) = app
        .send(json_request("POST", "/api/invoices", Some(&admin_auth()), sample_invoice(1)))
        .await;
    let uri = format!("/api/invoices/{}", created["id"]);

    for _ in 0..2 {
        let (status, body) = app
            .send(json_request("PUT", &uri, Some(&admin_auth()), json!({ "status": "paid" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Invoice updated successfully");
    }

    let (_, fetched) = app.send(get_request(&uri, Some(&admin_auth()))).await;
    assert_eq!(fetched["status"], "paid");
    assert_eq!(fetched["total"].as_f64(), Some(86.0));
}

#[tokio::test]
async fn unknown_status_is_rejected() {
    let app = TestApp::with_admin().await;
    let (_, created) = app
        .send(json_request("POST", "/api/invoices", Some(&admin_auth()), sample_invoice(1)))
        .await;
    let uri = format!("/api/invoices/{}", created["id"]);

    let (status, _) = app
        .send(json_request("PUT", &uri, Some(&admin_auth()), json!({ "status": "archived" })))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_update_of_unknown_invoice_is_404() {
    let app = TestApp::with_admin().await;

    let (status, _) = app
        .send(json_request(
            "PUT",
            "/api/invoices/12345",
            Some(&admin_auth()),
            json!({ "status": "sent" }),
        ))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =========================================================================
//  CUSTOMERS
// =========================================================================

#[tokio::test]
async fn customers_can_be_created_and_fetched() {
    let app = TestApp::with_admin().await;

    let (status, created) = app
        .send(json_request(
            "POST",
            "/api/customers",
            Some(&admin_auth()),
            json!({ "name": "Acme Ltd.", "email": "billing@acme.test" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, fetched) = app
        .send(get_request(
            &format!("/api/customers/{}", created["id"]),
            Some(&admin_auth()),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Acme Ltd.");
    assert_eq!(fetched["address"], "");
}

#[tokio::test]
async fn unknown_customer_is_404() {
    let app = TestApp::with_admin().await;

    let (status, body) = app
        .send(get_request("/api/customers/77", Some(&admin_auth())))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Customer not found");
}
