pub mod file_service;
pub mod import;
pub mod occupancy;
pub mod property_cache;
pub mod retry;
pub mod single_flight;
pub mod store;

#[cfg(test)]
pub(crate) mod memory_store;

pub use occupancy::{OccupancyIndex, OccupancyKey};
pub use property_cache::PropertyCache;
pub use retry::{with_retry, RetryPolicy};
pub use single_flight::SingleFlight;
pub use store::{PgStore, ResidentStore};
