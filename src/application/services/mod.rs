//! Long-running application services.

mod critical_path_refresher;

pub use critical_path_refresher::{
    CriticalPathRefresher, CriticalPathRefresherConfig, RefreshSummary,
};
