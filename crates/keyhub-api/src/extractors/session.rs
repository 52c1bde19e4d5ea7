//! Session extractors for the admin and technician domains.
//!
//! A token is taken from `Authorization: Bearer` first, then from the
//! domain's cookie. Verification goes through the shared session guard.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::extract::CookieJar;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use keyhub_auth::Session;
use keyhub_entity::account::AccountDomain;
use keyhub_service::RequestContext;

use crate::error::ApiError;
use crate::extractors::ClientInfo;
use crate::state::AppState;

/// Cookie carrying the session token for `domain`.
pub fn cookie_name(state: &AppState, domain: AccountDomain) -> &str {
    match domain {
        AccountDomain::Admin => &state.config.auth.admin.cookie_name,
        AccountDomain::Technician => &state.config.auth.technician.cookie_name,
    }
}

async fn presented_token(
    parts: &mut Parts,
    state: &AppState,
    domain: AccountDomain,
) -> Option<String> {
    if let Ok(TypedHeader(Authorization(bearer))) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await
    {
        return Some(bearer.token().to_string());
    }
    CookieJar::from_headers(&parts.headers)
        .get(cookie_name(state, domain))
        .map(|cookie| cookie.value().to_string())
}

async fn authenticate(
    parts: &mut Parts,
    state: &AppState,
    domain: AccountDomain,
) -> Result<(Session, RequestContext), ApiError> {
    let token = presented_token(parts, state, domain).await;
    let session = state.guard.verify(domain, token.as_deref())?;
    let client = ClientInfo::from_parts(parts);
    let ctx = RequestContext::for_session(&session, client.ip_address, client.user_agent);
    Ok((session, ctx))
}

/// A verified admin console session.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub session: Session,
    pub ctx: RequestContext,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (session, ctx) = authenticate(parts, state, AccountDomain::Admin).await?;
        Ok(Self { session, ctx })
    }
}

/// A verified technician portal session.
#[derive(Debug, Clone)]
pub struct TechnicianSession {
    pub session: Session,
    pub ctx: RequestContext,
}

impl FromRequestParts<AppState> for TechnicianSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (session, ctx) = authenticate(parts, state, AccountDomain::Technician).await?;
        Ok(Self { session, ctx })
    }
}
