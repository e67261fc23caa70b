//! Infinite random entry stream.

use crate::entry::Entry;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Numbers are drawn from `[0, DEFAULT_KEY_SPACE)`.
pub const DEFAULT_KEY_SPACE: u32 = 100_000;

/// Lazy, never-ending source of [`Entry`] values.
///
/// The stream is not restartable: every generator starts a fresh random
/// sequence. Passing a seed makes that sequence reproducible.
#[derive(Debug, Clone)]
pub struct EntryGenerator {
    rng: StdRng,
    key_space: u32,
    /// Number of entries produced so far.
    index: u64,
}

impl Default for EntryGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl EntryGenerator {
    /// Create a generator, seeded from the OS when `seed` is `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            key_space: DEFAULT_KEY_SPACE,
            index: 0,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    /// Narrow or widen the range `n` is drawn from. Zero is treated as one.
    pub fn with_key_space(mut self, key_space: u32) -> Self {
        self.key_space = key_space.max(1);
        self
    }

    pub fn key_space(&self) -> u32 {
        self.key_space
    }

    /// Entries produced so far.
    pub fn current_index(&self) -> u64 {
        self.index
    }

    pub fn next_entry(&mut self) -> Entry {
        let n = self.rng.gen_range(0..self.key_space);
        self.index += 1;
        Entry::new(n)
    }
}

impl Iterator for EntryGenerator {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        Some(self.next_entry())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}
