use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::extractor::MetricExtractor;
use crate::fetcher::SourceFetcher;
use crate::signals::ShutdownFlag;

/// Drives the fetch -> extract-all -> sleep cycle until shutdown is requested.
pub struct Scheduler {
    fetcher: SourceFetcher,
    extractors: Vec<MetricExtractor>,
    interval: Duration,
    shutdown: ShutdownFlag,
}

impl Scheduler {
    pub fn new(
        fetcher: SourceFetcher,
        extractors: Vec<MetricExtractor>,
        interval: Duration,
        shutdown: ShutdownFlag,
    ) -> Self {
        Self {
            fetcher,
            extractors,
            interval,
            shutdown,
        }
    }

    /// Run until the shutdown flag is set. An in-flight cycle completes
    /// before the loop exits; the sleep between cycles is interruptible.
    pub async fn run(&self) {
        while !self.shutdown.is_requested() {
            self.run_cycle().await;
            self.shutdown.sleep_interruptible(self.interval).await;
        }
        info!("Scheduler stopped");
    }

    /// One cycle: fetch once, evaluate every extractor against the same
    /// document. A fetch failure skips extraction entirely; a single metric's
    /// failure is logged and the remaining metrics still run.
    pub async fn run_cycle(&self) {
        let document = match self.fetcher.fetch().await {
            Ok(document) => document,
            Err(e) => {
                error!(url = self.fetcher.url(), error = %e, "Fetch failed, skipping this cycle");
                return;
            }
        };
        debug!(url = self.fetcher.url(), "Loaded JSON document");

        for extractor in &self.extractors {
            match extractor.update(&document) {
                Ok(value) => debug!(metric = extractor.name(), value, "Gauge updated"),
                Err(e) => warn!(
                    metric = extractor.name(),
                    query = extractor.query_source(),
                    error = %e,
                    "Extraction failed, gauge left unchanged"
                ),
            }
        }
    }
}
