//! Download log entities.

pub mod model;

pub use model::{CreateDownloadLogEntry, DownloadLogEntry};
