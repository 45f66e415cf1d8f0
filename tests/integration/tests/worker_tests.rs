//! Notification worker integration tests
//!
//! Requires the same environment as the API tests.
//!
//! Run with: cargo test -p integration-tests --test worker_tests

use audit_worker::{create_worker, BatchReport};
use integration_tests::{
    assert_json, check_test_env, fixtures::*, test_config, TestServer,
};
use reqwest::StatusCode;

#[tokio::test]
async fn test_worker_drains_queued_notification() {
    if !check_test_env().await {
        return;
    }

    // A private queue and no relay keep the run isolated from other tests
    let mut config = test_config().unwrap();
    config.notification.queue_name = format!("it_notification_mail_{}", unique_suffix());
    config.notification.delay_seconds = 0;
    config.smtp = None;

    let server = TestServer::start_with_config(config.clone()).await.unwrap();
    let admin = server.admin_token().unwrap();

    let response = server
        .post_auth(
            "/api/v1/notification-rules",
            &admin,
            &CreateRuleRequest::watching(&["priority"]),
        )
        .await
        .unwrap();
    let rule: RuleResponse = assert_json(response, StatusCode::CREATED).await.unwrap();

    let response = server
        .post_auth(
            &format!("/api/v1/records/{NOTE_MODEL}"),
            &admin,
            &CreateRecordsRequest {
                rows: vec![note(&unique_note_name(), "high")],
            },
        )
        .await
        .unwrap();
    let created: CreatedRecordsResponse = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert!(created.notifications_enqueued >= 1);

    let worker = create_worker(&config).await.unwrap();
    let report = worker.run_once().await;
    assert!(report.total() >= 1);
    assert_eq!(report.sent, 0);
    assert_eq!(report.failed, 0);

    // the queue is drained
    assert_eq!(worker.run_once().await, BatchReport::default());

    server
        .delete_auth(&format!("/api/v1/notification-rules/{}", rule.id), &admin)
        .await
        .unwrap();
}
