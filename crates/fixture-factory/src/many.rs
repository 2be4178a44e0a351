//! Randomly sized collections of nested instances.

use serde_json::Value;

use crate::error::DefinitionError;
use crate::factory::Factory;
use crate::random::RandomSource;

/// Default lower bound for collection sizes.
pub const DEFAULT_MIN_ITEMS: usize = 1;

/// Default upper bound for collection sizes.
pub const DEFAULT_MAX_ITEMS: usize = 10;

/// Inclusive bounds for the size of a generated collection.
///
/// # Example
///
/// ```
/// use fixture_factory::CountRange;
///
/// let range = CountRange::new(2, 4).expect("min <= max");
/// assert_eq!((range.min(), range.max()), (2, 4));
/// assert!(CountRange::new(4, 2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountRange {
    min: usize,
    max: usize,
}

impl CountRange {
    /// Builds a range, rejecting `min > max`.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::InvalidCountRange`] when `min > max`.
    pub const fn new(min: usize, max: usize) -> Result<Self, DefinitionError> {
        if min > max {
            return Err(DefinitionError::InvalidCountRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// A range that always yields `count` items.
    #[must_use]
    pub const fn exactly(count: usize) -> Self {
        Self {
            min: count,
            max: count,
        }
    }

    /// Returns the inclusive lower bound.
    #[must_use]
    pub const fn min(&self) -> usize {
        self.min
    }

    /// Returns the inclusive upper bound.
    #[must_use]
    pub const fn max(&self) -> usize {
        self.max
    }
}

impl Default for CountRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_ITEMS,
            max: DEFAULT_MAX_ITEMS,
        }
    }
}

/// Produces an array of nested instances whose length is drawn per call.
///
/// The nested factory is built once and owned here, so every array it
/// produces shares the same descriptors, including any sequence caches.
#[derive(Debug)]
pub struct Many {
    factory: Factory,
    range: CountRange,
    random: RandomSource,
}

impl Many {
    /// Wraps `factory` with the default `1..=10` size range.
    #[must_use]
    pub fn new(factory: Factory) -> Self {
        Self {
            factory,
            range: CountRange::default(),
            random: RandomSource::default(),
        }
    }

    /// Replaces the size range.
    #[must_use]
    pub const fn with_range(mut self, range: CountRange) -> Self {
        self.range = range;
        self
    }

    /// Replaces the random source used for size draws.
    #[must_use]
    pub fn with_random_source(mut self, random: RandomSource) -> Self {
        self.random = random;
        self
    }

    /// Returns the configured size range.
    #[must_use]
    pub const fn range(&self) -> CountRange {
        self.range
    }

    /// Draws a size in the configured range and creates that many instances.
    pub fn evaluate(&mut self) -> Value {
        let count = self.random.int_in_range(self.range.min, self.range.max);
        let items = self
            .factory
            .create_many(count)
            .into_iter()
            .map(Value::Object)
            .collect();
        Value::Array(items)
    }
}
