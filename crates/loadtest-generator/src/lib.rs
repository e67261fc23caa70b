//! Entry generator for map load testing.
//!
//! This crate provides the [`EntryGenerator`], a lazy, infinite stream of
//! key/value pairs to write into a remote map. Each entry draws one number
//! `n` uniformly from `[0, key_space)` and renders it as `key-<n>` /
//! `value-<n>`, so the stream revisits keys and later writes overwrite
//! earlier ones.
//!
//! # Architecture
//!
//! ```text
//!  seed (optional)
//!        │
//!        ▼
//! ┌─────────────────┐
//! │ EntryGenerator  │
//! │                 │
//! │  - rng (StdRng) │
//! │  - key_space    │
//! │  - index        │
//! └────────┬────────┘
//!          │  Iterator<Item = Entry>, never ends
//!          ▼
//!    Entry { n, key: "key-<n>", value: "value-<n>" }
//! ```
//!
//! # Example
//!
//! ```rust
//! use loadtest_generator::EntryGenerator;
//!
//! let entries: Vec<_> = EntryGenerator::with_seed(42).take(3).collect();
//! for entry in &entries {
//!     assert_eq!(entry.key, format!("key-{}", entry.n));
//!     assert_eq!(entry.value, format!("value-{}", entry.n));
//! }
//! ```

pub mod entry;
pub mod generator;

pub use entry::Entry;
pub use generator::{EntryGenerator, DEFAULT_KEY_SPACE};
