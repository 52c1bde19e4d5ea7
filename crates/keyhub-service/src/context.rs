//! Request context carrying the caller and client details.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keyhub_auth::Session;
use keyhub_core::types::AccountId;
use keyhub_entity::account::AccountDomain;

/// Who is performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Actor {
    /// Unauthenticated caller of a public endpoint.
    Anonymous,
    /// Holder of a verified session.
    Account {
        id: AccountId,
        email: String,
        domain: AccountDomain,
    },
    /// Local operator using the CLI.
    System,
}

/// Context passed into service methods so every operation knows who is
/// acting and from where.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    pub actor: Actor,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    pub fn anonymous(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            actor: Actor::Anonymous,
            ip_address,
            user_agent,
            request_time: Utc::now(),
        }
    }

    pub fn for_session(
        session: &Session,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            actor: Actor::Account {
                id: session.account_id,
                email: session.email.clone(),
                domain: session.domain,
            },
            ip_address,
            user_agent,
            request_time: Utc::now(),
        }
    }

    pub fn system() -> Self {
        Self {
            actor: Actor::System,
            ip_address: None,
            user_agent: None,
            request_time: Utc::now(),
        }
    }

    /// Admin sessions and the local operator may manage keys.
    pub fn is_admin(&self) -> bool {
        match &self.actor {
            Actor::System => true,
            Actor::Account { domain, .. } => *domain == AccountDomain::Admin,
            Actor::Anonymous => false,
        }
    }

    /// Account id of the caller, if any.
    pub fn account_id(&self) -> Option<AccountId> {
        match &self.actor {
            Actor::Account { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Account id when the caller is a technician.
    pub fn technician_id(&self) -> Option<AccountId> {
        match &self.actor {
            Actor::Account {
                id,
                domain: AccountDomain::Technician,
                ..
            } => Some(*id),
            _ => None,
        }
    }
}
