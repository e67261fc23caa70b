//! Map populator for load testing.

use crate::error::PopulatorError;
use crate::metrics::PopulateMetrics;
use loadtest_generator::EntryGenerator;
use map_client::{ClientError, MapHandle, OperationKind, StatusEvent, StatusReporter};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Writes random entries into one map until cancelled.
///
/// Requests form a single sequential stream: each put (and the size query
/// that may follow it) completes before the next entry is drawn. A failed
/// put is reported and skipped, never retried for the same entry.
pub struct MapPopulator {
    map: MapHandle,
    reporter: Arc<dyn StatusReporter>,
    generator: EntryGenerator,
    size_every: u32,
    max_entries: Option<u64>,
}

enum Step<T> {
    Done(T),
    Skip,
    /// End the run; carries the error that made the cluster unusable.
    Stop(Option<ClientError>),
}

impl MapPopulator {
    pub fn new(map: MapHandle, reporter: Arc<dyn StatusReporter>) -> Self {
        Self {
            map,
            reporter,
            generator: EntryGenerator::default(),
            size_every: 1,
            max_entries: None,
        }
    }

    /// Use a reproducible entry stream.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.generator = EntryGenerator::with_seed(seed);
        self
    }

    pub fn with_generator(mut self, generator: EntryGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Query the map size after every `n`th stored entry; 0 never queries.
    pub fn with_size_every(mut self, n: u32) -> Self {
        self.size_every = n;
        self
    }

    /// Stop after submitting `max` entries.
    pub fn with_max_entries(mut self, max: Option<u64>) -> Self {
        self.max_entries = max;
        self
    }

    pub fn map(&self) -> &MapHandle {
        &self.map
    }

    /// Fill the map until `cancel` fires, `max_entries` is reached, or the
    /// connection manager reports the cluster unavailable.
    pub async fn run(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<PopulateMetrics, PopulatorError> {
        let start_time = Instant::now();
        let mut metrics = PopulateMetrics::default();

        info!(
            "Starting to fill map '{}' with random entries (size query every {} put(s))",
            self.map.name(),
            self.size_every
        );

        let outcome = loop {
            if cancel.is_cancelled() {
                break Ok(());
            }
            if self
                .max_entries
                .is_some_and(|max| metrics.entries_attempted >= max)
            {
                break Ok(());
            }

            let entry = self.generator.next_entry();
            metrics.entries_attempted += 1;

            let put = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ClientError::Cancelled),
                result = self.map.put(&entry.key, &entry.value) => result,
            };
            match self.classify(OperationKind::Put, put) {
                Step::Done(previous) => {
                    metrics.entries_stored += 1;
                    if previous.is_some() {
                        metrics.entries_overwritten += 1;
                    }
                    self.reporter
                        .report(StatusEvent::EntryStored { key: entry.key });
                }
                Step::Skip => {
                    metrics.put_failures += 1;
                    continue;
                }
                Step::Stop(source) => break self.stop_reason(source),
            }

            if self.size_every == 0 || metrics.entries_stored % u64::from(self.size_every) != 0 {
                continue;
            }

            metrics.size_queries += 1;
            let size = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ClientError::Cancelled),
                result = self.map.size() => result,
            };
            match self.classify(OperationKind::Size, size) {
                Step::Done(size) => {
                    metrics.last_size = Some(size);
                    self.reporter.report(StatusEvent::SizeObserved(size));
                }
                Step::Skip => metrics.size_failures += 1,
                Step::Stop(source) => break self.stop_reason(source),
            }
        };

        metrics.total_duration = start_time.elapsed();
        info!(
            "Fill stopped: {} of {} entries stored ({} overwrites, {} failed puts) in {:?} ({:.2} entries/sec)",
            metrics.entries_stored,
            metrics.entries_attempted,
            metrics.entries_overwritten,
            metrics.put_failures,
            metrics.total_duration,
            metrics.entries_per_second()
        );

        outcome.map(|()| metrics)
    }

    /// Report a failed step and decide whether the loop continues.
    fn classify<T>(&self, kind: OperationKind, result: Result<T, ClientError>) -> Step<T> {
        match result {
            Ok(value) => Step::Done(value),
            Err(ClientError::Cancelled) => {
                debug!("{} cancelled", kind);
                Step::Stop(None)
            }
            Err(e @ ClientError::Unavailable { .. }) => {
                self.report_failure(kind, &e);
                Step::Stop(Some(e))
            }
            Err(e) => {
                self.report_failure(kind, &e);
                Step::Skip
            }
        }
    }

    fn report_failure(&self, kind: OperationKind, e: &ClientError) {
        self.reporter.report(StatusEvent::OperationFailed {
            kind,
            detail: e.to_string(),
        });
    }

    fn stop_reason(&self, source: Option<ClientError>) -> Result<(), PopulatorError> {
        match source {
            Some(source) => Err(PopulatorError::Unavailable {
                map: self.map.name().to_string(),
                source,
            }),
            None => Ok(()),
        }
    }
}
