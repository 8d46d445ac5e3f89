pub mod inventory;
pub mod locations;
pub mod notifications;
pub mod products;
pub mod purchase_orders;
pub mod sales_orders;

use serde::Deserialize;

/// Common query parameters for list endpoints. Query structs carry their own
/// `page`/`limit` fields (serde flatten does not survive URL-encoded
/// deserialization for numeric fields) and convert through this type.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

pub(crate) fn default_page() -> u64 {
    1
}

pub(crate) fn default_limit() -> u64 {
    20
}

impl PaginationParams {
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit.max(1))
    }
}
