use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Boundary hour for the night-shift heuristic: a checkin at or after this
/// hour paired with an adjacent-day checkout before it is treated as one
/// overnight shift. Punches exactly at the boundary are ambiguous, so the
/// value is configurable rather than a literal.
pub const NIGHT_SHIFT_BOUNDARY_HOUR: u32 = 12;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Interval between full resyncs from the backing store.
    pub sync_interval: Duration,
    /// How far back punches and leave coverage are mirrored.
    pub lookback_days: i64,
    /// TTL for today-stats query results.
    pub today_ttl: Duration,
    /// TTL for work-hour and report query results.
    pub report_ttl: Duration,
    /// Cap on late/early entries in the today anomaly list.
    pub anomaly_limit: usize,
    /// Cap on absent entries appended after the late/early ones.
    pub absent_limit: usize,
    pub night_shift_boundary_hour: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_secs(300),
            lookback_days: 90,
            today_ttl: Duration::from_secs(60),
            report_ttl: Duration::from_secs(300),
            anomaly_limit: 50,
            absent_limit: 100,
            night_shift_boundary_hour: NIGHT_SHIFT_BOUNDARY_HOUR,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();
        Self {
            sync_interval: Duration::from_secs(parse_env(
                "TIMECLOCK_SYNC_INTERVAL_SECS",
                defaults.sync_interval.as_secs(),
            )),
            lookback_days: parse_env("TIMECLOCK_LOOKBACK_DAYS", defaults.lookback_days),
            today_ttl: Duration::from_secs(parse_env(
                "TIMECLOCK_TODAY_TTL_SECS",
                defaults.today_ttl.as_secs(),
            )),
            report_ttl: Duration::from_secs(parse_env(
                "TIMECLOCK_REPORT_TTL_SECS",
                defaults.report_ttl.as_secs(),
            )),
            anomaly_limit: parse_env("TIMECLOCK_ANOMALY_LIMIT", defaults.anomaly_limit),
            absent_limit: parse_env("TIMECLOCK_ABSENT_LIMIT", defaults.absent_limit),
            night_shift_boundary_hour: parse_env(
                "TIMECLOCK_NIGHT_SHIFT_BOUNDARY_HOUR",
                defaults.night_shift_boundary_hour,
            ),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
