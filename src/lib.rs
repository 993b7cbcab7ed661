//! Attendance reconciliation and caching engine.
//!
//! A relational store (MySQL in production, an in-memory store for tests)
//! holds the authoritative punch, leave, employee, department and rule
//! data. [`AttendanceService`] mirrors a lookback window of it in memory,
//! resyncs on a timer, writes through on every mutation and serves
//! reconciled day records, work-hour rollups, today-stats and punch trend
//! tables out of the mirror, memoizing the expensive aggregates with
//! per-operation TTL caches.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod service;
pub mod store;

pub use cache::{CacheStats, CacheStore, QueryCache, Synchronizer};
pub use config::EngineConfig;
pub use error::{EngineError, StoreError};
pub use service::{AttendanceService, ImportOutcome};
pub use store::{BackingStore, MemoryStore, MySqlStore};
