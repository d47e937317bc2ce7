// Metrics hooks for the matcher crate.
//
// Callers install a global `MatchMetrics` implementation via [`set_match_metrics`];
// every search through [`Matcher`](crate::Matcher) then reports its latency
// and hit count. No metrics backend is assumed here.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::types::SearchKind;

/// Metrics observer for search operations.
pub trait MatchMetrics: Send + Sync {
    /// Record one completed search.
    ///
    /// `hit_count` is the number of results returned after any cap.
    fn record_match(&self, user_id: &str, kind: SearchKind, latency: Duration, hit_count: usize);
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn MatchMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn MatchMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn MatchMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global search metrics recorder.
pub fn set_match_metrics(recorder: Option<Arc<dyn MatchMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
