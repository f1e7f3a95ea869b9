//! Collection orchestration, one collector per sport.
//!
//! A collector owns its API client, the snapshot store and the database
//! handle, and drives fetch → normalize → snapshot → upsert for every
//! resource of its sport. Resource-level fetch failures are logged and
//! skipped so one bad endpoint never throws away the rest of a run;
//! persistence failures abort immediately.

pub mod golf;
pub mod nfl;
pub mod nhl;

pub use golf::{GolfCollector, GolfRunOptions};
pub use nfl::{NflCollector, NflRunOptions};
pub use nhl::{NhlCollector, NhlRunOptions};

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// What one collection run actually accomplished.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Per-resource stored-record counts, in collection order.
    pub counts: Vec<(String, usize)>,
    /// Resources skipped after fetch failures.
    pub skipped: Vec<String>,
}

impl RunReport {
    pub fn record(&mut self, what: &str, count: usize) {
        self.counts.push((what.to_string(), count));
    }

    pub fn skip(&mut self, what: impl Into<String>) {
        self.skipped.push(what.into());
    }

    /// Total records stored across all resources.
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    pub fn log_summary(&self, sport: &str) {
        for (what, count) in &self.counts {
            info!(sport, what, count, "Stored");
        }
        info!(
            sport,
            total = self.total(),
            skipped = self.skipped.len(),
            "Collection finished"
        );
    }
}

/// A sport's collection pipeline.
#[async_trait]
pub trait Collector {
    fn name(&self) -> &'static str;

    /// Run the full pipeline. `Err` means nothing usable happened
    /// (a failed precondition fetch or a storage failure); partial
    /// success is an `Ok` report with skips.
    async fn run(&self) -> Result<RunReport>;
}
