//! Index-driven sequence descriptors.
//!
//! A [`Sequence`] cycles through an ordered list of items by item index. When
//! a batch is smaller than the sequence it can answer with a configured
//! fallback instead, or walk a shuffled copy of the items so that small
//! batches do not always favour the leading elements.

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value;

use crate::random::RandomSource;

type IndexFn = Rc<dyn Fn(usize) -> Value>;

/// One entry of a [`Sequence`]: a plain value or a function of the index.
#[derive(Clone)]
pub enum SequenceItem {
    /// Returned as-is.
    Value(Value),
    /// Invoked with the item index.
    Indexed(IndexFn),
}

impl SequenceItem {
    /// Wraps a function that receives the item index.
    #[must_use]
    pub fn indexed(f: impl Fn(usize) -> Value + 'static) -> Self {
        Self::Indexed(Rc::new(f))
    }

    fn resolve(&self, index: usize) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Indexed(f) => f(index),
        }
    }
}

macro_rules! sequence_item_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for SequenceItem {
                fn from(value: $ty) -> Self {
                    Self::Value(value.into())
                }
            }
        )*
    };
}

sequence_item_from_value!(Value, bool, i32, i64, u32, u64, usize, f64, &str, String);

impl fmt::Debug for SequenceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Indexed(_) => f.write_str("Indexed(..)"),
        }
    }
}

/// Behaviour of a [`Sequence`] when a batch is smaller than the sequence.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SequenceConfig {
    /// Value returned verbatim when `total < len`.
    ///
    /// Presence is what matters: `Some(Value::Null)` and `Some(json!(0))` are
    /// real fallbacks.
    #[serde(default, deserialize_with = "present")]
    pub fallback: Option<Value>,
    /// Walk a shuffled copy of the items instead of the declared order.
    #[serde(default)]
    pub randomize_if_not_enough_items: bool,
}

impl SequenceConfig {
    /// Sets the fallback value.
    #[must_use]
    pub fn with_fallback(mut self, fallback: impl Into<Value>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// Enables shuffled traversal.
    #[must_use]
    pub const fn randomized(mut self) -> Self {
        self.randomize_if_not_enough_items = true;
        self
    }
}

/// Keeps an explicit JSON `null` as `Some(Value::Null)`.
pub(crate) fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Cycles through an ordered list of items by index.
///
/// # Example
///
/// ```
/// use fixture_factory::Sequence;
/// use serde_json::json;
///
/// let mut sequence = Sequence::new([5, 0, 1]);
/// let values: Vec<_> = (0..5).filter_map(|i| sequence.evaluate(i, 5)).collect();
///
/// assert_eq!(values, [json!(5), json!(0), json!(1), json!(5), json!(0)]);
/// ```
#[derive(Debug)]
pub struct Sequence {
    items: Vec<SequenceItem>,
    config: SequenceConfig,
    random: RandomSource,
    randomized: Option<Vec<SequenceItem>>,
}

impl Sequence {
    /// Creates a sequence over `items` with the default configuration.
    #[must_use]
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SequenceItem>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            config: SequenceConfig::default(),
            random: RandomSource::default(),
            randomized: None,
        }
    }

    /// Creates a one-element sequence.
    #[must_use]
    pub fn single(item: impl Into<SequenceItem>) -> Self {
        Self::new([item.into()])
    }

    /// Creates a one-element sequence from a function of the index.
    #[must_use]
    pub fn indexed(f: impl Fn(usize) -> Value + 'static) -> Self {
        Self::single(SequenceItem::indexed(f))
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: SequenceConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the random source used for shuffled traversal.
    #[must_use]
    pub fn with_random_source(mut self, random: RandomSource) -> Self {
        self.random = random;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when the sequence has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Resolves the value for `index` within a batch of `total` items.
    ///
    /// Returns `None` only for an empty sequence without a fallback, which
    /// leaves the field absent.
    pub fn evaluate(&mut self, index: usize, total: usize) -> Option<Value> {
        let short_batch = total < self.items.len();
        if let Some(fallback) = self.config.fallback.as_ref().filter(|_| short_batch) {
            return Some(fallback.clone());
        }

        let item = if self.config.randomize_if_not_enough_items {
            self.randomized_item(index)
        } else {
            cyclic(&self.items, index)
        };

        item.map(|entry| entry.resolve(index))
    }

    fn randomized_item(&mut self, index: usize) -> Option<&SequenceItem> {
        let items = &self.items;
        let random = &self.random;
        let shuffled = self.randomized.get_or_insert_with(|| {
            let mut copy = items.clone();
            random.shuffle(&mut copy);
            copy
        });
        // Past the end of the permutation the walk wraps instead of reshuffling.
        cyclic(shuffled, index)
    }
}

fn cyclic(items: &[SequenceItem], index: usize) -> Option<&SequenceItem> {
    index
        .checked_rem(items.len())
        .and_then(|position| items.get(position))
}

impl From<Vec<SequenceItem>> for Sequence {
    fn from(items: Vec<SequenceItem>) -> Self {
        Self::new(items)
    }
}
