//! Admin key management endpoints.

mod helpers;

use chrono::{DateTime, Duration, Utc};
use helpers::TestApp;
use http::StatusCode;
use serde_json::json;

use keyhub_core::types::LicenseKeyId;
use keyhub_entity::license::LicenseStatus;

fn parse_time(value: &serde_json::Value) -> DateTime<Utc> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .expect("timestamp")
}

#[tokio::test]
async fn test_issue_keys() {
    let app = TestApp::new();
    let token = app.admin_token();

    let resp = app
        .request(
            "POST",
            "/api/admin/keys",
            Some(json!({
                "count": 3,
                "max_downloads": 5,
                "customer_name": "  Grace Hopper ",
                "customer_email": "grace@example.com"
            })),
            Some(&token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.data()["requested"], 3);
    assert_eq!(resp.data()["failed"], 0);

    let keys = resp.data()["keys"].as_array().expect("keys array");
    assert_eq!(keys.len(), 3);
    for key in keys {
        let code = key["code"].as_str().expect("code");
        assert!(code.starts_with("SCO-"));
        assert_eq!(code.len(), "SCO-XXXX-XXXX-XXXX".len());
        assert_eq!(key["status"], "unused");
        assert_eq!(key["remaining_downloads"], 5);
        assert_eq!(key["customer_name"], "Grace Hopper");
    }
}

#[tokio::test]
async fn test_issue_requires_admin_session() {
    let app = TestApp::new();
    let technician = app.technician_token();

    let resp = app
        .request("POST", "/api/admin/keys", Some(json!({ "count": 1 })), None)
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app
        .request(
            "POST",
            "/api/admin/keys",
            Some(json!({ "count": 1 })),
            Some(&technician),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_issue_rejects_past_expiry() {
    let app = TestApp::new();
    let token = app.admin_token();

    let resp = app
        .request(
            "POST",
            "/api/admin/keys",
            Some(json!({ "expires_at": (Utc::now() - Duration::days(1)).to_rfc3339() })),
            Some(&token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_keys_with_filters() {
    let app = TestApp::new();
    let token = app.admin_token();
    app.seed_key("SCO-LIST-AAAA-0001", None, None).await;
    let revoked = app.seed_key("SCO-LIST-AAAA-0002", None, None).await;
    app.seed_key("SCO-LIST-BBBB-0003", None, None).await;
    app.request(
        "POST",
        &format!("/api/admin/keys/{}/revoke", revoked.id),
        None,
        Some(&token),
    )
    .await;

    let all = app
        .request("GET", "/api/admin/keys", None, Some(&token))
        .await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.data()["total_items"], 3);

    let by_status = app
        .request("GET", "/api/admin/keys?status=revoked", None, Some(&token))
        .await;
    assert_eq!(by_status.data()["total_items"], 1);
    assert_eq!(by_status.data()["items"][0]["code"], "SCO-LIST-AAAA-0002");

    let by_search = app
        .request("GET", "/api/admin/keys?search=list-aaaa", None, Some(&token))
        .await;
    assert_eq!(by_search.data()["total_items"], 2);

    let paged = app
        .request("GET", "/api/admin/keys?page=2&page_size=2", None, Some(&token))
        .await;
    assert_eq!(paged.data()["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(paged.data()["total_pages"], 2);
}

#[tokio::test]
async fn test_get_key() {
    let app = TestApp::new();
    let token = app.admin_token();
    let key = app.seed_key("SCO-GETK-AAAA-0001", Some(4), None).await;

    let resp = app
        .request("GET", &format!("/api/admin/keys/{}", key.id), None, Some(&token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["code"], "SCO-GETK-AAAA-0001");
    assert_eq!(resp.data()["remaining_downloads"], 4);

    let missing = app
        .request(
            "GET",
            &format!("/api/admin/keys/{}", LicenseKeyId::new()),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let bad_id = app
        .request("GET", "/api/admin/keys/not-a-uuid", None, Some(&token))
        .await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_revoke_is_idempotent() {
    let app = TestApp::new();
    let token = app.admin_token();
    let key = app.seed_key("SCO-REVK-AAAA-0001", None, None).await;
    let path = format!("/api/admin/keys/{}/revoke", key.id);

    let first = app.request("POST", &path, None, Some(&token)).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.data()["status"], "revoked");

    let second = app.request("POST", &path, None, Some(&token)).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.data()["status"], "revoked");
}

#[tokio::test]
async fn test_extend_expiry() {
    let app = TestApp::new();
    let token = app.admin_token();
    let expires = Utc::now() + Duration::days(3);
    let key = app.seed_key("SCO-EXTD-AAAA-0001", None, Some(expires)).await;

    let resp = app
        .request(
            "POST",
            &format!("/api/admin/keys/{}/extend", key.id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let extended = parse_time(&resp.data()["expires_at"]);
    let expected = expires + Duration::days(30);
    assert!((extended - expected).num_seconds().abs() <= 1);
}

#[tokio::test]
async fn test_extend_revoked_key_is_refused() {
    let app = TestApp::new();
    let token = app.admin_token();
    let key = app
        .seed_key("SCO-EXTD-AAAA-0002", None, Some(Utc::now() + Duration::days(3)))
        .await;
    app.request(
        "POST",
        &format!("/api/admin/keys/{}/revoke", key.id),
        None,
        Some(&token),
    )
    .await;

    let resp = app
        .request(
            "POST",
            &format!("/api/admin/keys/{}/extend", key.id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.error_code(), "KEY_REVOKED");
}

#[tokio::test]
async fn test_delete_key() {
    let app = TestApp::new();
    let token = app.admin_token();
    let key = app.seed_key("SCO-DELK-AAAA-0001", None, None).await;
    let path = format!("/api/admin/keys/{}", key.id);

    let resp = app.request("DELETE", &path, None, Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["message"], "License key deleted");

    let resp = app.request("GET", &path, None, Some(&token)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app.request("DELETE", &path, None, Some(&token)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleted_key_keeps_download_history() {
    let app = TestApp::new();
    let token = app.admin_token();
    let key = app.seed_key("SCO-DELK-AAAA-0002", None, None).await;

    let resp = app
        .request(
            "POST",
            "/api/downloads",
            Some(json!({ "license_key": "SCO-DELK-AAAA-0002", "platform": "linux" })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    app.request(
        "DELETE",
        &format!("/api/admin/keys/{}", key.id),
        None,
        Some(&token),
    )
    .await;

    let logs = app
        .request("GET", "/api/admin/downloads", None, Some(&token))
        .await;
    assert_eq!(logs.data()["total_items"], 1);
    assert!(logs.data()["items"][0]["license_key_id"].is_null());
}

#[tokio::test]
async fn test_bulk_extend_reports_missing_keys() {
    let app = TestApp::new();
    let token = app.admin_token();
    let soon = Utc::now() + Duration::days(5);
    let a = app.seed_key("SCO-BULK-AAAA-0001", None, Some(soon)).await;
    let b = app.seed_key("SCO-BULK-AAAA-0002", None, Some(soon)).await;
    let missing = LicenseKeyId::new();

    let resp = app
        .request(
            "POST",
            "/api/admin/keys/bulk",
            Some(json!({ "action": "extend-expiry", "ids": [a.id, b.id, missing, a.id] })),
            Some(&token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["requested"], 3);
    assert_eq!(resp.data()["succeeded"], 2);

    let failures = resp.data()["failures"].as_array().expect("failures");
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["id"], missing.to_string());
    assert_eq!(failures[0]["code"], "INVALID_KEY");

    let stored = app.reload(&a).await.expect("key exists");
    let expires = stored.expires_at.expect("expiry");
    assert!((expires - (soon + Duration::days(30))).num_seconds().abs() <= 1);
}

#[tokio::test]
async fn test_bulk_revoke() {
    let app = TestApp::new();
    let token = app.admin_token();
    let a = app.seed_key("SCO-BULK-BBBB-0001", None, None).await;
    let b = app.seed_key("SCO-BULK-BBBB-0002", None, None).await;

    let resp = app
        .request(
            "POST",
            "/api/admin/keys/bulk",
            Some(json!({ "action": "revoke", "ids": [a.id, b.id] })),
            Some(&token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["succeeded"], 2);

    for key in [&a, &b] {
        let stored = app.reload(key).await.expect("key exists");
        assert_eq!(stored.status, LicenseStatus::Revoked);
    }
}

#[tokio::test]
async fn test_bulk_requires_ids() {
    let app = TestApp::new();
    let token = app.admin_token();

    let resp = app
        .request(
            "POST",
            "/api/admin/keys/bulk",
            Some(json!({ "action": "delete", "ids": [] })),
            Some(&token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_key_stats() {
    let app = TestApp::new();
    let token = app.admin_token();
    app.seed_key("SCO-STAT-AAAA-0001", None, None).await;
    app.seed_key("SCO-STAT-AAAA-0002", Some(2), None).await;
    let revoked = app.seed_key("SCO-STAT-AAAA-0003", None, None).await;

    app.request(
        "POST",
        "/api/downloads",
        Some(json!({ "license_key": "SCO-STAT-AAAA-0002", "platform": "macos" })),
        None,
    )
    .await;
    app.request(
        "POST",
        &format!("/api/admin/keys/{}/revoke", revoked.id),
        None,
        Some(&token),
    )
    .await;

    let resp = app
        .request("GET", "/api/admin/keys/stats", None, Some(&token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["total"], 3);
    assert_eq!(resp.data()["unused"], 1);
    assert_eq!(resp.data()["active"], 1);
    assert_eq!(resp.data()["revoked"], 1);
    assert_eq!(resp.data()["expired"], 0);
    assert_eq!(resp.data()["total_downloads"], 1);
}

#[tokio::test]
async fn test_download_log_filters() {
    let app = TestApp::new();
    let token = app.admin_token();
    app.seed_key("SCO-LOGS-AAAA-0001", Some(1), None).await;

    for _ in 0..2 {
        app.request(
            "POST",
            "/api/downloads",
            Some(json!({ "license_key": "SCO-LOGS-AAAA-0001", "platform": "windows" })),
            None,
        )
        .await;
    }

    let failed = app
        .request("GET", "/api/admin/downloads?success=false", None, Some(&token))
        .await;
    assert_eq!(failed.status, StatusCode::OK);
    assert_eq!(failed.data()["total_items"], 1);
    assert_eq!(failed.data()["items"][0]["failure_reason"], "QUOTA_EXCEEDED");

    let succeeded = app
        .request("GET", "/api/admin/downloads?success=true", None, Some(&token))
        .await;
    assert_eq!(succeeded.data()["total_items"], 1);
}
