pub mod aggregate;
pub mod reconcile;
pub mod today;
pub mod trend;

pub use reconcile::{reconcile_day, DayContext};
pub use today::today_report;
pub use trend::trend_report;
