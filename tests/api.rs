mod common;

use reqwest::StatusCode;
use serde_json::{Value, json};

use common::TestServer;

async fn create_client(server: &TestServer, token: &str, body: Value) -> (StatusCode, Value) {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/api/v1/clients", server.base_url))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("create client");
    let status = resp.status();
    let body: Value = resp.json().await.expect("parse response");
    (status, body)
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/v1/clients", server.base_url))
        .send()
        .await
        .expect("list clients");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .get(format!("{}/api/v1/clients", server.base_url))
        .bearer_auth("clientele_00000000_000000000000000000000000")
        .send()
        .await
        .expect("list clients");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_and_duplicate_email() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let token = server.register_user("Ana", "ana@example.com").await;
    assert!(token.starts_with("clientele_"));

    let resp = client
        .post(format!("{}/api/v1/auth/register", server.base_url))
        .json(&json!({"name": "Ana", "email": "ana@example.com", "password": "secret123"}))
        .send()
        .await
        .expect("register duplicate");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp: Value = client
        .post(format!("{}/api/v1/auth/login", server.base_url))
        .json(&json!({"email": "ana@example.com", "password": "secret123"}))
        .send()
        .await
        .expect("login")
        .json()
        .await
        .expect("parse login");
    assert!(resp["data"]["token"].as_str().unwrap().starts_with("clientele_"));
    assert_eq!(resp["data"]["user"]["email"], "ana@example.com");

    let resp = client
        .post(format!("{}/api/v1/auth/login", server.base_url))
        .json(&json!({"email": "ana@example.com", "password": "wrong-password"}))
        .send()
        .await
        .expect("login wrong password");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_client_crud_and_validation() {
    let server = TestServer::start().await;
    let token = server.register_user("Ana", "ana@example.com").await;
    let http = reqwest::Client::new();

    // Empty name is rejected
    let (status, _) = create_client(&server, &token, json!({"name": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown status is rejected
    let (status, body) =
        create_client(&server, &token, json!({"name": "Acme", "status": "prospect"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid status"));

    // Status defaults to lead
    let (status, body) = create_client(&server, &token, json!({"name": "Acme"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "lead");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Partial update touches only the fields present
    let resp: Value = http
        .put(format!("{}/api/v1/clients/{}", server.base_url, id))
        .bearer_auth(&token)
        .json(&json!({"status": "customer"}))
        .send()
        .await
        .expect("update client")
        .json()
        .await
        .expect("parse update");
    assert_eq!(resp["data"]["status"], "customer");
    assert_eq!(resp["data"]["name"], "Acme");

    let resp = http
        .delete(format!("{}/api/v1/clients/{}", server.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("delete client");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = http
        .get(format!("{}/api/v1/clients/{}", server.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("get deleted client");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_owner_isolation_reads_as_not_found() {
    let server = TestServer::start().await;
    let alice = server.register_user("Alice", "alice@example.com").await;
    let bob = server.register_user("Bob", "bob@example.com").await;
    let http = reqwest::Client::new();

    let (_, body) = create_client(&server, &alice, json!({"name": "Acme"})).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    for request in [
        http.get(format!("{}/api/v1/clients/{}", server.base_url, id)),
        http.put(format!("{}/api/v1/clients/{}", server.base_url, id)),
        http.delete(format!("{}/api/v1/clients/{}", server.base_url, id)),
    ] {
        let resp = request
            .bearer_auth(&bob)
            .json(&json!({"name": "Hijacked"}))
            .send()
            .await
            .expect("cross-owner request");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    // Bob's listing is empty even though Alice has data
    let resp: Value = http
        .get(format!("{}/api/v1/clients", server.base_url))
        .bearer_auth(&bob)
        .send()
        .await
        .expect("list clients")
        .json()
        .await
        .expect("parse list");
    assert_eq!(resp["data"]["total"], 0);
}

#[tokio::test]
async fn test_list_pagination_envelope() {
    let server = TestServer::start().await;
    let token = server.register_user("Ana", "ana@example.com").await;
    let http = reqwest::Client::new();

    for i in 0..5 {
        create_client(&server, &token, json!({"name": format!("Client {i}")})).await;
    }

    let resp: Value = http
        .get(format!(
            "{}/api/v1/clients?page=2&limit=2",
            server.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("list page 2")
        .json()
        .await
        .expect("parse list");
    assert_eq!(resp["data"]["total"], 5);
    assert_eq!(resp["data"]["page"], 2);
    assert_eq!(resp["data"]["limit"], 2);
    assert_eq!(resp["data"]["items"].as_array().unwrap().len(), 2);

    let resp = http
        .get(format!("{}/api/v1/clients?page=0", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("list invalid page");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // A page so deep the row offset cannot be computed is rejected,
    // not echoed back with wrapped-around contents.
    let resp = http
        .get(format!(
            "{}/api/v1/clients?page=9223372036854775807&limit=2",
            server.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("list overflowing page");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_filters_by_term_and_status() {
    let server = TestServer::start().await;
    let token = server.register_user("Ana", "ana@example.com").await;
    let http = reqwest::Client::new();

    create_client(
        &server,
        &token,
        json!({"name": "Acme", "status": "customer", "email": "hq@acme.io"}),
    )
    .await;
    create_client(&server, &token, json!({"name": "Globex", "status": "lead"})).await;

    let resp: Value = http
        .get(format!("{}/api/v1/clients?q=ACME", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("search")
        .json()
        .await
        .expect("parse search");
    assert_eq!(resp["data"]["total"], 1);
    assert_eq!(resp["data"]["items"][0]["name"], "Acme");

    let resp: Value = http
        .get(format!("{}/api/v1/clients?status=lead", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("filter by status")
        .json()
        .await
        .expect("parse filter");
    assert_eq!(resp["data"]["total"], 1);
    assert_eq!(resp["data"]["items"][0]["name"], "Globex");
}

#[tokio::test]
async fn test_crm_end_to_end_scenario() {
    let server = TestServer::start().await;
    let token = server.register_user("Ana", "ana@example.com").await;
    let http = reqwest::Client::new();

    let (_, body) = create_client(&server, &token, json!({"name": "Acme", "status": "lead"})).await;
    let client_id = body["data"]["id"].as_str().unwrap().to_string();

    // Record an interaction
    let resp = http
        .post(format!(
            "{}/api/v1/clients/{}/contacts",
            server.base_url, client_id
        ))
        .bearer_auth(&token)
        .json(&json!({"type": "phone", "note": "called"}))
        .send()
        .await
        .expect("add contact");
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Schedule a follow-up
    let resp = http
        .post(format!("{}/api/v1/reminders", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "clientId": client_id,
            "dueDate": "2025-01-10T00:00:00Z",
            "message": "follow up",
        }))
        .send()
        .await
        .expect("create reminder");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("parse reminder");
    let reminder_id = body["data"]["id"].as_str().unwrap().to_string();

    // Detail view carries the history
    let resp: Value = http
        .get(format!("{}/api/v1/clients/{}", server.base_url, client_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("get client")
        .json()
        .await
        .expect("parse detail");
    assert_eq!(resp["data"]["client"]["name"], "Acme");
    let contacts = resp["data"]["contacts"].as_array().unwrap();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0]["note"], "called");

    // Pending reminders include the follow-up
    let resp: Value = http
        .get(format!("{}/api/v1/reminders?pending=true", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("list pending")
        .json()
        .await
        .expect("parse pending");
    assert_eq!(resp["data"].as_array().unwrap().len(), 1);

    // Completed reminders drop out of the pending view
    let resp = http
        .put(format!(
            "{}/api/v1/reminders/{}",
            server.base_url, reminder_id
        ))
        .bearer_auth(&token)
        .json(&json!({"done": true}))
        .send()
        .await
        .expect("complete reminder");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp: Value = http
        .get(format!("{}/api/v1/reminders?pending=true", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("list pending after done")
        .json()
        .await
        .expect("parse pending");
    assert!(resp["data"].as_array().unwrap().is_empty());

    // Deleting the client removes its history but not the reminder
    let resp = http
        .delete(format!("{}/api/v1/clients/{}", server.base_url, client_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("delete client");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp: Value = http
        .get(format!("{}/api/v1/reminders", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("list reminders")
        .json()
        .await
        .expect("parse reminders");
    let reminders = resp["data"].as_array().unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0]["clientId"], client_id);
}

#[tokio::test]
async fn test_reminder_requires_due_date_and_message() {
    let server = TestServer::start().await;
    let token = server.register_user("Ana", "ana@example.com").await;
    let http = reqwest::Client::new();

    for body in [
        json!({"clientId": "c1", "message": "follow up"}),
        json!({"clientId": "c1", "dueDate": "2025-01-10T00:00:00Z"}),
    ] {
        let resp = http
            .post(format!("{}/api/v1/reminders", server.base_url))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .expect("create incomplete reminder");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_csv_export() {
    let server = TestServer::start().await;
    let token = server.register_user("Ana", "ana@example.com").await;
    let http = reqwest::Client::new();

    // Empty export is just the header
    let resp = http
        .get(format!("{}/api/v1/clients/export/csv", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("export empty");
    assert!(resp
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    let body = resp.text().await.expect("read csv");
    assert_eq!(
        body.trim_end(),
        "id,name,phone,email,status,createdAt,updatedAt"
    );

    create_client(
        &server,
        &token,
        json!({"name": "Acme, Inc.", "status": "customer"}),
    )
    .await;
    create_client(&server, &token, json!({"name": "Globex"})).await;

    let body = http
        .get(format!("{}/api/v1/clients/export/csv", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("export")
        .text()
        .await
        .expect("read csv");
    let lines: Vec<&str> = body.trim_end().lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(body.contains("\"Acme, Inc.\""));

    // Another account exports only its own header
    let other = server.register_user("Bob", "bob@example.com").await;
    let body = http
        .get(format!("{}/api/v1/clients/export/csv", server.base_url))
        .bearer_auth(&other)
        .send()
        .await
        .expect("export other owner")
        .text()
        .await
        .expect("read csv");
    assert_eq!(body.trim_end().lines().count(), 1);
}
