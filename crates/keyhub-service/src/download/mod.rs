//! Download accounting.

pub mod accounting;

pub use accounting::{DownloadAccounting, DownloadRequest};
