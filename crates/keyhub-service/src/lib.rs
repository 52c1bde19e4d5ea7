//! # keyhub-service
//!
//! License key lifecycle and the services around it. The decision logic
//! in [`license::engine`] is pure; [`LicenseService`] runs it against a
//! [`keyhub_database::KeyStore`] and retries when a concurrent request
//! wins the race for the same key.
//!
//! Services follow constructor injection with `Arc` dependencies.

pub mod account;
pub mod context;
pub mod download;
pub mod license;

pub use account::AccountService;
pub use context::{Actor, RequestContext};
pub use download::{DownloadAccounting, DownloadRequest};
pub use license::{
    BulkAction, BulkOrchestrator, BulkReport, ConsumptionOutcome, IssueReport, IssueSpec, KeyError,
    LicenseService, Remaining, ValidationOutcome,
};
