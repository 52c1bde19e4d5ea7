//! Login, logout and session introspection for both identity domains.

use axum::Json;
use axum::extract::State;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};

use keyhub_auth::Session;
use keyhub_entity::account::AccountDomain;

use crate::dto::request::LoginRequest;
use crate::dto::response::{
    AccountResponse, ApiResponse, LoginResponse, MessageResponse, SessionResponse,
};
use crate::dto::validated;
use crate::error::ApiResult;
use crate::extractors::session::cookie_name;
use crate::extractors::{AdminSession, TechnicianSession};
use crate::state::AppState;

fn session_cookie(state: &AppState, domain: AccountDomain, token: String) -> Cookie<'static> {
    Cookie::build((cookie_name(state, domain).to_string(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.auth.secure_cookies)
        .build()
}

async fn login(
    state: AppState,
    jar: CookieJar,
    domain: AccountDomain,
    req: LoginRequest,
) -> ApiResult<(CookieJar, Json<ApiResponse<LoginResponse>>)> {
    let req = validated(req)?;
    let result = state.accounts.login(domain, &req.email, &req.password).await?;

    let jar = jar.add(session_cookie(&state, domain, result.session.token.clone()));
    let body = LoginResponse {
        token: result.session.token,
        expires_at: result.session.expires_at,
        account: AccountResponse {
            id: result.account.id,
            email: result.account.email,
            display_name: result.account.display_name,
            domain,
            last_login_at: result.account.last_login_at,
        },
    };
    Ok((jar, Json(ApiResponse::ok(body))))
}

fn logout(
    state: &AppState,
    jar: CookieJar,
    domain: AccountDomain,
) -> (CookieJar, Json<ApiResponse<MessageResponse>>) {
    let jar = jar.remove(Cookie::build((cookie_name(state, domain).to_string(), "")).path("/"));
    (
        jar,
        Json(ApiResponse::ok(MessageResponse::new("Logged out"))),
    )
}

fn describe(session: Session) -> Json<ApiResponse<SessionResponse>> {
    Json(ApiResponse::ok(SessionResponse {
        account_id: session.account_id,
        email: session.email,
        domain: session.domain,
        expires_at: session.expires_at,
    }))
}

/// POST /api/admin/auth/login
pub async fn admin_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<ApiResponse<LoginResponse>>)> {
    login(state, jar, AccountDomain::Admin, req).await
}

/// POST /api/admin/auth/logout
pub async fn admin_logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<MessageResponse>>) {
    logout(&state, jar, AccountDomain::Admin)
}

/// GET /api/admin/auth/me
pub async fn admin_me(auth: AdminSession) -> Json<ApiResponse<SessionResponse>> {
    describe(auth.session)
}

/// POST /api/technician/auth/login
pub async fn technician_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<ApiResponse<LoginResponse>>)> {
    login(state, jar, AccountDomain::Technician, req).await
}

/// POST /api/technician/auth/logout
pub async fn technician_logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<MessageResponse>>) {
    logout(&state, jar, AccountDomain::Technician)
}

/// GET /api/technician/auth/me
pub async fn technician_me(auth: TechnicianSession) -> Json<ApiResponse<SessionResponse>> {
    describe(auth.session)
}
