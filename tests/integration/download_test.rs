//! Public key validation, licensed downloads and technician downloads.

mod helpers;

use chrono::{Duration, Utc};
use helpers::TestApp;
use http::StatusCode;
use serde_json::json;

use keyhub_entity::license::LicenseStatus;

fn download_body(code: &str) -> serde_json::Value {
    json!({
        "license_key": code,
        "platform": "windows",
        "product_version": "3.1.0"
    })
}

#[tokio::test]
async fn test_licensed_download_activates_key() {
    let app = TestApp::new();
    let key = app.seed_key("SCO-AAAA-BBBB-CCCC", Some(3), None).await;

    let resp = app
        .request("POST", "/api/downloads", Some(download_body("SCO-AAAA-BBBB-CCCC")), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["remaining_downloads"], 2);
    assert_eq!(
        resp.data()["download_url"],
        "https://downloads.example.com/scanner/3.1.0/windows"
    );
    assert!(resp.data()["log_id"].is_string());

    let stored = app.reload(&key).await.expect("key exists");
    assert_eq!(stored.status, LicenseStatus::Active);
    assert_eq!(stored.download_count, 1);
    assert!(stored.activated_at.is_some());
}

#[tokio::test]
async fn test_code_is_normalized_before_lookup() {
    let app = TestApp::new();
    app.seed_key("SCO-AAAA-BBBB-CCCC", None, None).await;

    let resp = app
        .request(
            "POST",
            "/api/downloads",
            Some(download_body("  sco-aaaa-bbbb-cccc ")),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.data()["remaining_downloads"].is_null());
}

#[tokio::test]
async fn test_quota_exhaustion() {
    let app = TestApp::new();
    app.seed_key("SCO-AAAA-BBBB-CCCD", Some(1), None).await;

    let first = app
        .request("POST", "/api/downloads", Some(download_body("SCO-AAAA-BBBB-CCCD")), None)
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.data()["remaining_downloads"], 0);

    let second = app
        .request("POST", "/api/downloads", Some(download_body("SCO-AAAA-BBBB-CCCD")), None)
        .await;
    assert_eq!(second.status, StatusCode::FORBIDDEN);
    assert_eq!(second.error_code(), "QUOTA_EXCEEDED");
}

#[tokio::test]
async fn test_malformed_and_unknown_codes_look_the_same() {
    let app = TestApp::new();
    let oversized = format!("SCO-{}", "A".repeat(70));

    for path in ["/api/downloads", "/api/licenses/validate"] {
        let unknown = app
            .request("POST", path, Some(download_body("SCO-ZZZZ-ZZZZ-ZZZZ")), None)
            .await;
        assert_eq!(unknown.status, StatusCode::NOT_FOUND);
        assert_eq!(unknown.error_code(), "INVALID_KEY");

        for code in ["not-a-key", "", oversized.as_str()] {
            let malformed = app
                .request("POST", path, Some(download_body(code)), None)
                .await;
            assert_eq!(malformed.status, StatusCode::NOT_FOUND, "{path} with {code:?}");
            assert_eq!(malformed.body, unknown.body, "{path} with {code:?}");
        }
    }
}

#[tokio::test]
async fn test_revoked_key_is_refused() {
    let app = TestApp::new();
    let key = app.seed_key("SCO-AAAA-BBBB-CCCE", None, None).await;
    let token = app.admin_token();

    let resp = app
        .request(
            "POST",
            &format!("/api/admin/keys/{}/revoke", key.id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = app
        .request("POST", "/api/downloads", Some(download_body("SCO-AAAA-BBBB-CCCE")), None)
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.error_code(), "KEY_REVOKED");
}

#[tokio::test]
async fn test_expired_key_is_refused_and_marked() {
    let app = TestApp::new();
    let key = app
        .seed_key("SCO-AAAA-BBBB-CCCF", Some(5), Some(Utc::now() - Duration::days(1)))
        .await;

    let resp = app
        .request("POST", "/api/downloads", Some(download_body("SCO-AAAA-BBBB-CCCF")), None)
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.error_code(), "KEY_EXPIRED");

    let stored = app.reload(&key).await.expect("key exists");
    assert_eq!(stored.status, LicenseStatus::Expired);
    assert_eq!(stored.download_count, 0);
}

#[tokio::test]
async fn test_validate_does_not_consume() {
    let app = TestApp::new();
    let key = app.seed_key("SCO-AAAA-BBBB-CCCG", Some(2), None).await;

    for _ in 0..3 {
        let resp = app
            .request(
                "POST",
                "/api/licenses/validate",
                Some(json!({ "license_key": "SCO-AAAA-BBBB-CCCG" })),
                None,
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.data()["valid"], true);
        assert_eq!(resp.data()["status"], "unused");
        assert_eq!(resp.data()["remaining_downloads"], 2);
    }

    let stored = app.reload(&key).await.expect("key exists");
    assert_eq!(stored.download_count, 0);
    assert_eq!(stored.status, LicenseStatus::Unused);
}

#[tokio::test]
async fn test_validate_unknown_key() {
    let app = TestApp::new();

    let resp = app
        .request(
            "POST",
            "/api/licenses/validate",
            Some(json!({ "license_key": "SCO-ZZZZ-ZZZZ-ZZZZ" })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_code(), "INVALID_KEY");
}

#[tokio::test]
async fn test_bad_platform_is_rejected_without_consuming() {
    let app = TestApp::new();
    let key = app.seed_key("SCO-AAAA-BBBB-CCCH", Some(1), None).await;

    let resp = app
        .request(
            "POST",
            "/api/downloads",
            Some(json!({ "license_key": "SCO-AAAA-BBBB-CCCH", "platform": "win/../etc" })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let stored = app.reload(&key).await.expect("key exists");
    assert_eq!(stored.download_count, 0);
}

#[tokio::test]
async fn test_client_ip_is_taken_from_forwarded_header() {
    let app = TestApp::new();
    let key = app.seed_key("SCO-AAAA-BBBB-CCCJ", None, None).await;

    let resp = app
        .request_with_headers(
            "POST",
            "/api/downloads",
            Some(download_body("SCO-AAAA-BBBB-CCCJ")),
            &[
                ("X-Forwarded-For", "198.51.100.4, 10.0.0.1".to_string()),
                ("User-Agent", "scanner-installer/3.1".to_string()),
            ],
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let token = app.admin_token();
    let logs = app
        .request(
            "GET",
            &format!("/api/admin/downloads?license_key_id={}", key.id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(logs.status, StatusCode::OK);
    let entry = &logs.data()["items"][0];
    assert_eq!(entry["ip_address"], "198.51.100.4");
    assert_eq!(entry["user_agent"], "scanner-installer/3.1");
    assert_eq!(entry["success"], true);
}

#[tokio::test]
async fn test_technician_download_requires_session() {
    let app = TestApp::new();

    let resp = app
        .request(
            "POST",
            "/api/technician/downloads",
            Some(json!({ "platform": "windows" })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_technician_download_is_logged() {
    let app = TestApp::new();
    let token = app.technician_token();

    let resp = app
        .request(
            "POST",
            "/api/technician/downloads",
            Some(json!({ "platform": "Windows" })),
            Some(&token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.data()["download_url"],
        "https://downloads.example.com/scanner/latest/windows"
    );
    assert!(resp.data()["remaining_downloads"].is_null());

    let admin = app.admin_token();
    let logs = app
        .request("GET", "/api/admin/downloads", None, Some(&admin))
        .await;
    let entry = &logs.data()["items"][0];
    assert!(entry["license_key_id"].is_null());
    assert!(entry["technician_id"].is_string());
    assert_eq!(entry["platform"], "windows");
}
