//! API Integration Tests
//!
//! These tests require:
//! - Running PostgreSQL instance
//! - Running Redis instance
//! - Environment variables: DATABASE_URL, REDIS_URL, JWT_SECRET
//!
//! Run with: cargo test -p integration-tests --test api_tests

use integration_tests::{
    assert_json, assert_status, check_test_env, fixtures::*, TestServer,
};
use reqwest::StatusCode;
use serde_json::json;

/// Create notes through the API and return their ids
async fn create_notes(server: &TestServer, token: &str, rows: Vec<serde_json::Value>) -> Vec<i64> {
    let response = server
        .post_auth(
            &format!("/api/v1/records/{NOTE_MODEL}"),
            token,
            &CreateRecordsRequest { rows },
        )
        .await
        .unwrap();
    let created: CreatedRecordsResponse = assert_json(response, StatusCode::CREATED).await.unwrap();
    created.ids
}

async fn write_notes(
    server: &TestServer,
    token: &str,
    ids: &[i64],
    values: serde_json::Value,
) -> ModifiedRecordsResponse {
    let response = server
        .patch_auth(
            &format!("/api/v1/records/{NOTE_MODEL}"),
            token,
            &WriteRecordsRequest {
                ids: ids.to_vec(),
                values,
            },
        )
        .await
        .unwrap();
    assert_json(response, StatusCode::OK).await.unwrap()
}

async fn audit_log(server: &TestServer, token: &str, query: &str) -> Vec<AuditLogEntry> {
    let response = server
        .get_auth(&format!("/api/v1/audit-log?{query}"), token)
        .await
        .unwrap();
    let page: DataResponse<Vec<AuditLogEntry>> = assert_json(response, StatusCode::OK).await.unwrap();
    page.data
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_health_ready() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health/ready").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();
}

// ============================================================================
// Auth Tests
// ============================================================================

#[tokio::test]
async fn test_missing_token_rejected() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/api/v1/audit-log").await.unwrap();
    let error: ErrorResponse = assert_json(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert!(!error.error.code.is_empty());
}

#[tokio::test]
async fn test_rule_mutation_requires_admin() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let token = server.user_token(2).unwrap();

    let response = server
        .post_auth(
            "/api/v1/notification-rules",
            &token,
            &CreateRuleRequest::watching(&["priority"]),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::FORBIDDEN).await.unwrap();
}

// ============================================================================
// Catalog Tests
// ============================================================================

#[tokio::test]
async fn test_list_models_includes_note() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let token = server.user_token(2).unwrap();

    let response = server.get_auth("/api/v1/models", &token).await.unwrap();
    let models: DataResponse<Vec<serde_json::Value>> =
        assert_json(response, StatusCode::OK).await.unwrap();

    let note = models
        .data
        .iter()
        .find(|m| m["name"] == NOTE_MODEL)
        .expect("note model registered");
    assert_eq!(note["history"], json!(true));
}

// ============================================================================
// Record Tests
// ============================================================================

#[tokio::test]
async fn test_create_and_read_record() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let token = server.user_token(2).unwrap();
    let name = unique_note_name();

    let ids = create_notes(&server, &token, vec![note(&name, "high")]).await;
    assert_eq!(ids.len(), 1);

    let response = server
        .get_auth(&format!("/api/v1/records/{NOTE_MODEL}/{}", ids[0]), &token)
        .await
        .unwrap();
    let record: RecordResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(record.model, NOTE_MODEL);
    assert_eq!(record.display_name, name);
}

#[tokio::test]
async fn test_unknown_model() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let token = server.user_token(2).unwrap();

    let response = server
        .get_auth("/api/v1/records/no.such.model/1", &token)
        .await
        .unwrap();
    assert_status(response, StatusCode::NOT_FOUND).await.unwrap();
}

#[tokio::test]
async fn test_read_deleted_record() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let token = server.user_token(2).unwrap();
    let ids = create_notes(&server, &token, vec![note(&unique_note_name(), "low")]).await;

    let response = server
        .delete_json_auth(
            &format!("/api/v1/records/{NOTE_MODEL}"),
            &token,
            &DeleteRecordsRequest { ids: ids.clone() },
        )
        .await
        .unwrap();
    let deleted: ModifiedRecordsResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(deleted.count, 1);

    let response = server
        .get_auth(&format!("/api/v1/records/{NOTE_MODEL}/{}", ids[0]), &token)
        .await
        .unwrap();
    assert_status(response, StatusCode::NOT_FOUND).await.unwrap();
}

// ============================================================================
// Audit Log Tests
// ============================================================================

#[tokio::test]
async fn test_audit_log_lists_create_write_delete() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let token = server.user_token(2).unwrap();
    let name = unique_note_name();

    let ids = create_notes(&server, &token, vec![note(&name, "high")]).await;
    write_notes(&server, &token, &ids, json!({ "priority": "low", "state": "done" })).await;
    let response = server
        .delete_json_auth(
            &format!("/api/v1/records/{NOTE_MODEL}"),
            &token,
            &DeleteRecordsRequest { ids: ids.clone() },
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let entries: Vec<AuditLogEntry> = audit_log(&server, &token, &format!("model={NOTE_MODEL}&limit=10000"))
        .await
        .into_iter()
        .filter(|e| e.record_id == ids[0])
        .collect();

    let types: Vec<&str> = entries.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(types, ["delete", "write", "create"]);
    assert!(entries.iter().all(|e| e.record_name == name));

    let write = &entries[1];
    assert!(write.history);
    assert!(write.changes.contains("Priority: high → low"));
    assert!(write.changes.contains("State: Open → Done"));
    assert!(write.key.starts_with(&format!("{NOTE_MODEL}:{}:write:", ids[0])));
}

#[tokio::test]
async fn test_audit_log_filters() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let token = server.user_token(77).unwrap();
    let marker = format!("marker-{}", unique_suffix());

    let ids = create_notes(&server, &token, vec![note(&unique_note_name(), "high")]).await;
    write_notes(&server, &token, &ids, json!({ "priority": marker })).await;

    let entries = audit_log(
        &server,
        &token,
        &format!("model={NOTE_MODEL}&type=write&user=77&q={marker}"),
    )
    .await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].record_id, ids[0]);
    assert_eq!(entries[0].user_id, Some(77));

    let response = server
        .get_auth("/api/v1/audit-log?type=explode", &token)
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();

    let response = server
        .get_auth("/api/v1/audit-log?limit=0", &token)
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}

#[tokio::test]
async fn test_audit_log_report_download() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let token = server.user_token(2).unwrap();
    create_notes(&server, &token, vec![note(&unique_note_name(), "high")]).await;

    let response = server
        .get_auth(
            &format!("/api/v1/audit-log/report?model={NOTE_MODEL}&format=pdf"),
            &token,
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/pdf"
    );
    let bytes = response.bytes().await.unwrap();
    assert!(bytes.starts_with(b"%PDF-1.4"));
}

// ============================================================================
// Notification Rule Tests
// ============================================================================

#[tokio::test]
async fn test_rule_crud() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let admin = server.admin_token().unwrap();

    let response = server
        .post_auth(
            "/api/v1/notification-rules",
            &admin,
            &CreateRuleRequest::watching(&["priority", "state"]),
        )
        .await
        .unwrap();
    let rule: RuleResponse = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(rule.targets.len(), 2);

    let response = server
        .patch_auth(
            &format!("/api/v1/notification-rules/{}", rule.id),
            &admin,
            &json!({ "name": "Renamed" }),
        )
        .await
        .unwrap();
    let updated: RuleResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.email, rule.email);

    let response = server
        .delete_auth(&format!("/api/v1/notification-rules/{}", rule.id), &admin)
        .await
        .unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();

    let response = server
        .get_auth(&format!("/api/v1/notification-rules/{}", rule.id), &admin)
        .await
        .unwrap();
    assert_status(response, StatusCode::NOT_FOUND).await.unwrap();
}

#[tokio::test]
async fn test_rule_rejects_excluded_model() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let admin = server.admin_token().unwrap();

    let mut request = CreateRuleRequest::watching(&["name"]);
    request.targets = vec![WatchedField {
        model: "res.user".to_string(),
        field: "name".to_string(),
    }];

    let response = server
        .post_auth("/api/v1/notification-rules", &admin, &request)
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}

#[tokio::test]
async fn test_watched_write_enqueues_notification() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let admin = server.admin_token().unwrap();
    let token = server.user_token(2).unwrap();

    let response = server
        .post_auth(
            "/api/v1/notification-rules",
            &admin,
            &CreateRuleRequest::watching(&["priority"]),
        )
        .await
        .unwrap();
    let rule: RuleResponse = assert_json(response, StatusCode::CREATED).await.unwrap();

    let ids = create_notes(&server, &token, vec![note(&unique_note_name(), "high")]).await;

    let unwatched = write_notes(&server, &token, &ids, json!({ "name": unique_note_name() })).await;
    assert_eq!(unwatched.notifications_enqueued, 0);

    let watched = write_notes(&server, &token, &ids, json!({ "priority": "low" })).await;
    assert!(watched.notifications_enqueued >= 1);

    let response = server
        .delete_auth(&format!("/api/v1/notification-rules/{}", rule.id), &admin)
        .await
        .unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();
}

// ============================================================================
// Mail Server Tests
// ============================================================================

#[tokio::test]
async fn test_mail_server_create_and_delete() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let admin = server.admin_token().unwrap();

    let response = server
        .post_auth("/api/v1/mail-servers", &admin, &CreateMailServerRequest::unique())
        .await
        .unwrap();
    let created: MailServerResponse = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(created.port, 587);

    let response = server.get_auth("/api/v1/mail-servers", &admin).await.unwrap();
    let listed: DataResponse<Vec<MailServerResponse>> =
        assert_json(response, StatusCode::OK).await.unwrap();
    assert!(listed.data.iter().any(|s| s.id == created.id));

    let response = server
        .delete_auth(&format!("/api/v1/mail-servers/{}", created.id), &admin)
        .await
        .unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();
}

#[tokio::test]
async fn test_mail_servers_require_admin() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let token = server.user_token(2).unwrap();

    let response = server.get_auth("/api/v1/mail-servers", &token).await.unwrap();
    assert_status(response, StatusCode::FORBIDDEN).await.unwrap();
}

// ============================================================================
// Wizard Tests
// ============================================================================

#[tokio::test]
async fn test_wizard_walk() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let token = server.user_token(2).unwrap();
    let ids = create_notes(&server, &token, vec![note(&unique_note_name(), "high")]).await;
    write_notes(&server, &token, &ids, json!({ "priority": "low" })).await;

    let response = server
        .post_auth(
            "/api/v1/wizards/audit-log",
            &token,
            &json!({ "model": NOTE_MODEL, "type": "write" }),
        )
        .await
        .unwrap();
    let session: WizardResponse = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(session.state, "start");
    assert!(session.results.is_none());

    // printing before opening is not a valid transition
    let response = server
        .post_empty_auth(&format!("/api/v1/wizards/audit-log/{}/print", session.id), &token)
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();

    let response = server
        .post_empty_auth(&format!("/api/v1/wizards/audit-log/{}/open", session.id), &token)
        .await
        .unwrap();
    let opened: WizardResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(opened.state, "open_");
    let results = opened.results.unwrap();
    assert!(results.iter().any(|e| e.record_id == ids[0]));

    let response = server
        .post_auth(
            &format!("/api/v1/wizards/audit-log/{}/print", session.id),
            &token,
            &json!({ "format": "xls" }),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains(".xls"));

    let response = server
        .get_auth(&format!("/api/v1/wizards/audit-log/{}", session.id), &token)
        .await
        .unwrap();
    assert_status(response, StatusCode::NOT_FOUND).await.unwrap();
}

#[tokio::test]
async fn test_wizard_revise() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let token = server.user_token(2).unwrap();

    let response = server
        .post_auth("/api/v1/wizards/audit-log", &token, &json!({}))
        .await
        .unwrap();
    let session: WizardResponse = assert_json(response, StatusCode::CREATED).await.unwrap();

    let response = server
        .post_empty_auth(&format!("/api/v1/wizards/audit-log/{}/open", session.id), &token)
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server
        .post_auth(
            &format!("/api/v1/wizards/audit-log/{}/start", session.id),
            &token,
            &json!({ "type": "create" }),
        )
        .await
        .unwrap();
    let revised: WizardResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(revised.state, "start");
    assert!(revised.results.is_none());
}
