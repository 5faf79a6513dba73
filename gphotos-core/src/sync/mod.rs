//! Date-driven incremental sync.

mod planner;
mod report;

pub use planner::{Progress, SyncPlanner, plan_downloads};
pub use report::{DateOutcome, DateStatus, SyncReport, SyncTotals};
