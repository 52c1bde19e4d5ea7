//! Session handling and health endpoints.

mod helpers;

use helpers::TestApp;
use http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let resp = app.request("GET", "/api/health", None, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["status"], "ok");
    assert!(resp.data()["version"].is_string());
}

#[tokio::test]
async fn test_detailed_health_without_database() {
    let app = TestApp::new();

    let resp = app.request("GET", "/api/health/detailed", None, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["key_store"], "memory");
    assert_eq!(resp.data()["database"], "not_required");
}

#[tokio::test]
async fn test_admin_me_with_bearer_token() {
    let app = TestApp::new();
    let token = app.admin_token();

    let resp = app
        .request("GET", "/api/admin/auth/me", None, Some(&token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["email"], "admin@example.com");
    assert_eq!(resp.data()["domain"], "admin");
}

#[tokio::test]
async fn test_technician_me_with_cookie() {
    let app = TestApp::new();
    let token = app.technician_token();
    let cookie = format!("{}={token}", app.config.auth.technician.cookie_name);

    let resp = app
        .request_with_headers("GET", "/api/technician/auth/me", None, &[("Cookie", cookie)])
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["email"], "tech@example.com");
    assert_eq!(resp.data()["domain"], "technician");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();

    let resp = app.request("GET", "/api/admin/auth/me", None, None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error_code(), "UNAUTHORIZED");
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = TestApp::new();

    let resp = app
        .request("GET", "/api/admin/auth/me", None, Some("not.a.token"))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sessions_do_not_cross_domains() {
    let app = TestApp::new();
    let technician = app.technician_token();
    let admin = app.admin_token();

    let resp = app
        .request("GET", "/api/admin/auth/me", None, Some(&technician))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app
        .request("GET", "/api/admin/keys", None, Some(&technician))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app
        .request("GET", "/api/technician/auth/me", None, Some(&admin))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unauthorized_body_does_not_leak_reason() {
    let app = TestApp::new();
    let technician = app.technician_token();

    let missing = app.request("GET", "/api/admin/auth/me", None, None).await;
    let wrong_domain = app
        .request("GET", "/api/admin/auth/me", None, Some(&technician))
        .await;
    assert_eq!(missing.body, wrong_domain.body);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new();
    let token = app.admin_token();
    let cookie_name = app.config.auth.admin.cookie_name.clone();

    let resp = app
        .request_with_headers(
            "POST",
            "/api/admin/auth/logout",
            None,
            &[("Cookie", format!("{cookie_name}={token}"))],
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["message"], "Logged out");

    let set_cookie = resp
        .headers
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("logout should expire the cookie");
    assert!(set_cookie.starts_with(&format!("{cookie_name}=")));
}

#[tokio::test]
async fn test_logout_without_session_succeeds() {
    let app = TestApp::new();

    let resp = app
        .request("POST", "/api/technician/auth/logout", None, None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_rejects_invalid_email() {
    let app = TestApp::new();

    let resp = app
        .request(
            "POST",
            "/api/admin/auth/login",
            Some(json!({ "email": "not-an-email", "password": "whatever" })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_code(), "VALIDATION_ERROR");
}
