//! Pagination query parameters.

use serde::{Deserialize, Serialize};

use keyhub_core::types::PageRequest;

/// Query parameters for paginated endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaginationParams {
    /// Page number, 1-based.
    pub page: Option<u32>,
    /// Items per page. Also accepted as `per_page`.
    #[serde(alias = "per_page")]
    pub page_size: Option<u32>,
}

impl PaginationParams {
    pub fn into_page_request(self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.page_size.unwrap_or(defaults.page_size),
        )
    }
}
