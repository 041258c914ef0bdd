/// Order and review operations
///
/// Thin consumers of the authorization policy. Both services are generic
/// over the store so tests run them against `MemoryStore`.

mod orders;
mod reviews;

pub use orders::OrderService;
pub use reviews::ReviewService;
