//! Map populator for load testing a distributed key-value map.
//!
//! This crate provides the two workloads of the load tool:
//!
//! - [`MapPopulator`] draws entries from a [`loadtest_generator::EntryGenerator`]
//!   and writes them one at a time, optionally querying the map size after
//!   each write.
//! - [`SizePoller`] issues a single size query or polls on an interval.
//!
//! Both report through a [`map_client::StatusReporter`] and survive single
//! operation failures; only cancellation or an unavailable cluster ends them.
//!
//! # Example
//!
//! ```ignore
//! use loadtest_populate_map::MapPopulator;
//!
//! let map = manager.map("persistent-map");
//! let mut populator = MapPopulator::new(map, reporter)
//!     .with_seed(42)
//!     .with_max_entries(Some(1000));
//!
//! let metrics = populator.run(&cancel).await?;
//! println!("Stored {} entries in {:?}", metrics.entries_stored, metrics.total_duration);
//! ```

mod args;
mod error;
mod metrics;
mod poller;
mod populator;


pub use args::MapPopulateArgs;
pub use error::{PopulatorError, QueryError};
pub use metrics::PopulateMetrics;
pub use poller::{SizePoller, SizeReading};
pub use populator::MapPopulator;
