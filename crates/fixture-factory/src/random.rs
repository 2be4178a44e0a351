//! Shared uniform random source.
//!
//! Every randomised descriptor draws from a [`RandomSource`] handed to it at
//! construction. Clones share one underlying ChaCha8 stream, so a factory and
//! all of its descriptors consume a single sequence of draws. Sources are
//! entropy-seeded unless built with [`RandomSource::seeded`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Cheaply cloneable handle to a shared random number generator.
///
/// # Example
///
/// ```
/// use fixture_factory::RandomSource;
///
/// let first = RandomSource::seeded(7);
/// let second = RandomSource::seeded(7);
///
/// assert_eq!(first.int_in_range(1, 100), second.int_in_range(1, 100));
/// ```
#[derive(Clone)]
pub struct RandomSource {
    rng: Rc<RefCell<ChaCha8Rng>>,
}

impl RandomSource {
    /// Creates a source seeded from the thread-local entropy generator.
    ///
    /// Output is not reproducible across runs.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::from_rng(ChaCha8Rng::from_rng(&mut rand::rng()))
    }

    /// Creates a deterministic source from a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(rng: ChaCha8Rng) -> Self {
        Self {
            rng: Rc::new(RefCell::new(rng)),
        }
    }

    /// Shuffles `items` in place with a uniform Fisher–Yates pass.
    pub fn shuffle<T>(&self, items: &mut [T]) {
        self.with_rng(|rng| items.shuffle(rng));
    }

    /// Draws a uniformly distributed integer in `min..=max`.
    ///
    /// Returns `min` when the bounds are equal or inverted.
    #[must_use]
    pub fn int_in_range(&self, min: usize, max: usize) -> usize {
        if min >= max {
            return min;
        }
        self.with_rng(|rng| rng.random_range(min..=max))
    }

    /// Runs `draw` with exclusive access to the underlying generator.
    ///
    /// The borrow is released before this returns, so `draw` must not call
    /// back into the same source.
    pub(crate) fn with_rng<T>(&self, draw: impl FnOnce(&mut ChaCha8Rng) -> T) -> T {
        draw(&mut self.rng.borrow_mut())
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl fmt::Debug for RandomSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomSource").finish_non_exhaustive()
    }
}
