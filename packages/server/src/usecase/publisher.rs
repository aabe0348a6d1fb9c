//! Periodic publishers
//!
//! A publisher loops generate → publish to every target → sleep until it is
//! cancelled. One bad iteration (an error or a panic) is logged and the loop
//! carries on after the normal interval. Cancellation is the only way out.

use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures_util::FutureExt;
use kairo_shared::time::Clock;
use tokio_util::sync::CancellationToken;

use crate::domain::{
    BroadcastReport, BroadcastTarget, PayloadGenerator, PublishError, SensorDataGenerator,
    SystemStatsGenerator,
};

/// Default cadence of the `system_stats` series
pub const FAST_INTERVAL: Duration = Duration::from_millis(500);
/// Default cadence of the `sensor_data` series
pub const SLOW_INTERVAL: Duration = Duration::from_secs(1);

pub struct PublisherTask {
    interval: Duration,
    generator: Box<dyn PayloadGenerator>,
    targets: Vec<Arc<dyn BroadcastTarget>>,
    clock: Arc<dyn Clock>,
}

impl PublisherTask {
    pub fn new(
        interval: Duration,
        generator: impl PayloadGenerator + 'static,
        targets: Vec<Arc<dyn BroadcastTarget>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            interval,
            generator: Box::new(generator),
            targets,
            clock,
        }
    }

    /// Fast series: synthetic system utilization
    pub fn system_stats(
        interval: Duration,
        targets: Vec<Arc<dyn BroadcastTarget>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(interval, SystemStatsGenerator::new(interval), targets, clock)
    }

    /// Slow series: synthetic environment sensors
    pub fn sensor_data(
        interval: Duration,
        targets: Vec<Arc<dyn BroadcastTarget>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(interval, SensorDataGenerator::new(interval), targets, clock)
    }

    pub fn name(&self) -> &'static str {
        self.generator.name()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One iteration: generate a message and hand it to every target.
    ///
    /// A failing target does not stop delivery to the others; the last
    /// failure is returned after all targets were tried.
    pub async fn publish_once(&self) -> Result<BroadcastReport, PublishError> {
        let message = self.generator.generate(self.clock.now())?;

        let mut report = BroadcastReport::default();
        let mut failure = None;
        for target in &self.targets {
            match target.publish(&message).await {
                Ok(delivered) => report = report.merge(delivered),
                Err(e) => failure = Some(e),
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Run until `cancel` fires.
    ///
    /// The token is observed at the sleep between iterations, so an iteration
    /// that has started always completes and nothing is emitted afterwards.
    pub async fn run(self, cancel: CancellationToken) {
        let name = self.name();
        tracing::info!("Publisher '{}' started (interval: {:?})", name, self.interval);

        let mut iterations: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                break;
            }
            iterations += 1;

            match AssertUnwindSafe(self.publish_once()).catch_unwind().await {
                Ok(Ok(report)) => tracing::trace!(
                    "Publisher '{}' delivered to {}/{} subscribers",
                    name,
                    report.delivered,
                    report.attempted
                ),
                Ok(Err(e)) => {
                    tracing::warn!("Publisher '{}' iteration {} failed: {}", name, iterations, e)
                }
                Err(_) => tracing::warn!(
                    "Publisher '{}' iteration {} panicked, continuing",
                    name,
                    iterations
                ),
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!(
            "Publisher '{}' cancelled after {} iterations",
            name,
            iterations
        );
    }
}
