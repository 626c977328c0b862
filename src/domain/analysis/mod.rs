//! Analysis module - pure services over job snapshots.
//!
//! - `CriticalSequenceManager` - critical paths per job and resource bottlenecks
//! - `CostEstimator` - machine and labor cost of tasks and jobs
//!
//! Nothing here performs I/O or mutates an aggregate; callers apply results
//! (for example through `Job::apply_critical_path`).

mod cost_estimator;
mod critical_sequence;

pub use cost_estimator::{CostEstimator, JobCostEstimate, TaskCost};
pub use critical_sequence::{
    Bottleneck, CriticalPathReport, CriticalSequenceManager, ResourceGrouping, ResourceKey,
    DEFAULT_BOTTLENECK_THRESHOLD_PERCENT,
};
