//! Cache storage adapters behind the `bunker::ports::CacheStorage` port:
//! an in-memory moka backend and a sled backend whose partitions survive
//! process restarts.

pub mod moka_store;
pub mod sled_store;

pub use moka_store::MokaStorage;
pub use sled_store::SledStorage;
