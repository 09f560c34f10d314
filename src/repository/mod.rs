// Per-request data access over the shared PgPool. Each repository owns its
// statements; transactions never escape a single call.

mod line_items;
mod lookups;
mod orders;

pub use line_items::LineItemRepository;
pub use lookups::LookupRepository;
pub use orders::OrderRepository;
