//! License key lifecycle.

pub mod bulk;
pub mod engine;
pub mod error;
pub mod generator;
pub mod service;

pub use bulk::{BulkAction, BulkFailure, BulkOrchestrator, BulkReport};
pub use engine::{Remaining, Verdict};
pub use error::KeyError;
pub use generator::CodeGenerator;
pub use service::{ConsumptionOutcome, IssueReport, IssueSpec, LicenseService, ValidationOutcome};
