use moka::sync::Cache;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Cached operation families. Each family is its own moka cache so it can
/// carry its own TTL and be dropped wholesale when a mutation touches the
/// data it is derived from.
pub const OP_TODAY_STATS: &str = "today_stats";
pub const OP_WORK_HOURS: &str = "work_hours";
pub const OP_STATS: &str = "stats";

pub const REPORT_OPS: [&str; 3] = [OP_TODAY_STATS, OP_WORK_HOURS, OP_STATS];

/// Memoizes expensive aggregate results keyed by operation name plus a
/// canonical serialization of the parameters.
pub struct QueryCache {
    caches: HashMap<&'static str, Cache<String, Arc<Value>>>,
}

impl QueryCache {
    pub fn new(today_ttl: Duration, report_ttl: Duration) -> Self {
        let build = |ttl| Cache::builder().max_capacity(10_000).time_to_live(ttl).build();
        let mut caches = HashMap::new();
        caches.insert(OP_TODAY_STATS, build(today_ttl));
        caches.insert(OP_WORK_HOURS, build(report_ttl));
        caches.insert(OP_STATS, build(report_ttl));
        Self { caches }
    }

    /// Canonical parameter key: serde_json maps keep keys sorted, so two
    /// parameter sets that differ only in field order produce the same key.
    pub fn cache_key<P: Serialize>(params: &P) -> String {
        serde_json::to_value(params).map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn get(&self, op: &'static str, key: &str) -> Option<Arc<Value>> {
        self.caches.get(op).and_then(|c| c.get(key))
    }

    pub fn insert(&self, op: &'static str, key: String, value: Value) {
        if let Some(cache) = self.caches.get(op) {
            cache.insert(key, Arc::new(value));
        }
    }

    /// Drops every cached entry under the given operation prefixes.
    pub fn invalidate(&self, ops: &[&'static str]) {
        for op in ops {
            if let Some(cache) = self.caches.get(op) {
                cache.invalidate_all();
            }
        }
    }

    /// Mutations to punches, leave, rules or reference data make every
    /// derived report stale.
    pub fn invalidate_reports(&self) {
        self.invalidate(&REPORT_OPS);
    }
}
