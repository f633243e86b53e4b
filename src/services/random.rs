use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Mutex;

/// Source of the only randomness the recommender uses: choosing between equivalent
/// reply phrasings and choosing a page for force-new requests.
pub trait RandomSource: Send + Sync {
    /// Uniform index in `0..len`. Returns 0 when `len` is 0.
    fn index(&self, len: usize) -> usize;

    /// Uniform value in `low..=high`
    fn between(&self, low: u32, high: u32) -> u32;
}

/// Picks one element of a non-empty slice
pub fn choose<'a, T>(random: &dyn RandomSource, options: &'a [T]) -> &'a T {
    &options[random.index(options.len()).min(options.len().saturating_sub(1))]
}

/// Thread-local RNG, the production default
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn index(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..len)
    }

    fn between(&self, low: u32, high: u32) -> u32 {
        rand::thread_rng().gen_range(low..=high.max(low))
    }
}

/// Seeded RNG for reproducible runs
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn index(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0..len),
            Err(poisoned) => poisoned.into_inner().gen_range(0..len),
        }
    }

    fn between(&self, low: u32, high: u32) -> u32 {
        let high = high.max(low);
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(low..=high),
            Err(poisoned) => poisoned.into_inner().gen_range(low..=high),
        }
    }
}

/// Always returns the same choices. Used to pin replies and pages in tests.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom {
    pub index: usize,
    pub value: u32,
}

#[cfg(test)]
impl FixedRandom {
    /// First phrasing, lowest page
    pub fn first() -> Self {
        Self { index: 0, value: 0 }
    }
}

#[cfg(test)]
impl RandomSource for FixedRandom {
    fn index(&self, len: usize) -> usize {
        if len == 0 {
            0
        } else {
            self.index.min(len - 1)
        }
    }

    fn between(&self, low: u32, high: u32) -> u32 {
        self.value.clamp(low, high.max(low))
    }
}
