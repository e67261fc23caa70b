//! One-shot and periodic map size queries.

use crate::error::{PopulatorError, QueryError};
use chrono::{DateTime, Utc};
use map_client::{ClientError, MapHandle, OperationKind, StatusEvent, StatusReporter};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Entry count of a map at one point in time.
///
/// Other writers may change the map at any moment; the reading is advisory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeReading {
    pub map: String,
    pub size: u64,
    pub observed_at: DateTime<Utc>,
}

pub struct SizePoller {
    map: MapHandle,
    reporter: Arc<dyn StatusReporter>,
}

impl SizePoller {
    pub fn new(map: MapHandle, reporter: Arc<dyn StatusReporter>) -> Self {
        Self { map, reporter }
    }

    /// Issue exactly one size query. The caller decides whether to retry.
    pub async fn query_once(&self) -> Result<SizeReading, QueryError> {
        match self.map.size().await {
            Ok(size) => {
                self.reporter.report(StatusEvent::SizeObserved(size));
                Ok(SizeReading {
                    map: self.map.name().to_string(),
                    size,
                    observed_at: Utc::now(),
                })
            }
            Err(source) => {
                if !matches!(source, ClientError::Cancelled) {
                    self.reporter.report(StatusEvent::OperationFailed {
                        kind: OperationKind::Size,
                        detail: source.to_string(),
                    });
                }
                Err(QueryError {
                    map: self.map.name().to_string(),
                    source,
                })
            }
        }
    }

    /// Query every `interval` until `cancel` fires. Failed queries are
    /// reported and polling continues; an unavailable cluster ends the run.
    ///
    /// Returns the number of successful readings.
    pub async fn poll(
        &self,
        interval: Duration,
        cancel: &CancellationToken,
    ) -> Result<u64, PopulatorError> {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut readings = 0u64;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = self.query_once() => result,
            };
            match result {
                Ok(_) => readings += 1,
                Err(QueryError {
                    source: ClientError::Cancelled,
                    ..
                }) => break,
                Err(QueryError {
                    map,
                    source: source @ ClientError::Unavailable { .. },
                }) => return Err(PopulatorError::Unavailable { map, source }),
                Err(e) => debug!("Continuing after failed poll: {}", e),
            }
        }

        debug!("Size polling of '{}' stopped after {} readings", self.map.name(), readings);
        Ok(readings)
    }
}
