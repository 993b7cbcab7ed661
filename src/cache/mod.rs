pub mod query;
pub mod store;
pub mod sync;

pub use query::QueryCache;
pub use store::{CacheStats, CacheStore};
pub use sync::Synchronizer;
