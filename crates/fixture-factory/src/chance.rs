//! Weighted choice descriptors.
//!
//! A [`WeightedChoice`] expands `(count, value)` pairs into a flat list that is
//! shuffled exactly once, at construction. Evaluation indexes that list modulo
//! its length, so every batch whose size is a multiple of the total weight
//! sees each value exactly `count` times per multiple.

use serde_json::Value;

use crate::error::DefinitionError;
use crate::random::RandomSource;

/// Percentage used by [`WeightedChoice::or_null_default`] and
/// [`WeightedChoice::or_absent_default`], and by the registry directives when
/// no `percent` is given.
pub const DEFAULT_CHANCE_PERCENT: u32 = 80;

const PERCENT_TOTAL: u32 = 100;

/// Slot counts for [`DEFAULT_CHANCE_PERCENT`].
const DEFAULT_SPLIT: (usize, usize) = (80, 20);

/// Picks values with exact per-batch multiplicities in a shuffled order.
///
/// A slot holding `None` leaves the field absent from the instance.
///
/// # Example
///
/// ```
/// use fixture_factory::{RandomSource, WeightedChoice};
/// use serde_json::json;
///
/// let choice = WeightedChoice::with_random_source(
///     [(1, json!("admin")), (3, json!("member"))],
///     &RandomSource::seeded(1),
/// );
/// let admins = (0..4)
///     .filter(|i| choice.evaluate(*i) == Some(json!("admin")))
///     .count();
///
/// assert_eq!(admins, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedChoice {
    slots: Vec<Option<Value>>,
}

impl WeightedChoice {
    /// Expands `pairs` in order and shuffles with an entropy-seeded source.
    #[must_use]
    pub fn new<I, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (usize, V)>,
        V: Into<Value>,
    {
        Self::with_random_source(pairs, &RandomSource::default())
    }

    /// Expands `pairs` in order and shuffles them with `random`.
    #[must_use]
    pub fn with_random_source<I, V>(pairs: I, random: &RandomSource) -> Self
    where
        I: IntoIterator<Item = (usize, V)>,
        V: Into<Value>,
    {
        Self::from_slots(
            pairs
                .into_iter()
                .map(|(count, value)| (count, Some(value.into()))),
            random,
        )
    }

    /// Expands `pairs`, where `None` values leave the field absent, and
    /// shuffles them with `random`.
    #[must_use]
    pub fn from_slots<I>(pairs: I, random: &RandomSource) -> Self
    where
        I: IntoIterator<Item = (usize, Option<Value>)>,
    {
        let mut slots: Vec<Option<Value>> = pairs
            .into_iter()
            .flat_map(|(count, value)| std::iter::repeat_n(value, count))
            .collect();
        random.shuffle(&mut slots);
        Self { slots }
    }

    /// Chooses `value` in `percent` of slots and `null` in the rest.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::InvalidChancePercent`] unless `percent` is
    /// in `1..=99`.
    pub fn or_null(
        value: impl Into<Value>,
        percent: u32,
        random: &RandomSource,
    ) -> Result<Self, DefinitionError> {
        Self::two_outcomes(value.into(), percent, Some(Value::Null), random)
    }

    /// Chooses `value` in `percent` of slots and leaves the field absent in
    /// the rest.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::InvalidChancePercent`] unless `percent` is
    /// in `1..=99`.
    pub fn or_absent(
        value: impl Into<Value>,
        percent: u32,
        random: &RandomSource,
    ) -> Result<Self, DefinitionError> {
        Self::two_outcomes(value.into(), percent, None, random)
    }

    /// Chooses `value` in [`DEFAULT_CHANCE_PERCENT`] of slots and `null` in
    /// the rest, shuffled with an entropy-seeded source.
    #[must_use]
    pub fn or_null_default(value: impl Into<Value>) -> Self {
        Self::default_outcomes(value.into(), Some(Value::Null))
    }

    /// Chooses `value` in [`DEFAULT_CHANCE_PERCENT`] of slots and leaves the
    /// field absent in the rest, shuffled with an entropy-seeded source.
    #[must_use]
    pub fn or_absent_default(value: impl Into<Value>) -> Self {
        Self::default_outcomes(value.into(), None)
    }

    fn default_outcomes(primary: Value, alternate: Option<Value>) -> Self {
        let (primary_weight, alternate_weight) = DEFAULT_SPLIT;
        Self::from_slots(
            [
                (primary_weight, Some(primary)),
                (alternate_weight, alternate),
            ],
            &RandomSource::default(),
        )
    }

    fn two_outcomes(
        primary: Value,
        percent: u32,
        alternate: Option<Value>,
        random: &RandomSource,
    ) -> Result<Self, DefinitionError> {
        let (primary_weight, alternate_weight) = split_percent(percent)?;
        Ok(Self::from_slots(
            [
                (primary_weight, Some(primary)),
                (alternate_weight, alternate),
            ],
            random,
        ))
    }

    /// Returns the slot for `index`, wrapping around the flattened list.
    ///
    /// The outer `Option` is `None` for an empty choice; either way `None`
    /// leaves the field absent.
    #[must_use]
    pub fn evaluate(&self, index: usize) -> Option<Value> {
        index
            .checked_rem(self.slots.len())
            .and_then(|position| self.slots.get(position))
            .cloned()
            .flatten()
    }

    /// Returns the total weight, which is the length of one full cycle.
    #[must_use]
    pub fn total_weight(&self) -> usize {
        self.slots.len()
    }
}

/// Validates a two-outcome percentage and returns both slot counts.
pub(crate) fn split_percent(percent: u32) -> Result<(usize, usize), DefinitionError> {
    if percent == 0 || percent >= PERCENT_TOTAL {
        return Err(DefinitionError::InvalidChancePercent { percent });
    }
    let primary = usize::try_from(percent)
        .map_err(|_| DefinitionError::InvalidChancePercent { percent })?;
    let alternate = usize::try_from(PERCENT_TOTAL - percent)
        .map_err(|_| DefinitionError::InvalidChancePercent { percent })?;
    Ok((primary, alternate))
}
