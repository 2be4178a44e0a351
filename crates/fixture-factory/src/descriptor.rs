//! Field descriptors and their resolution rules.
//!
//! Each field of a [`Definition`](crate::Definition) carries exactly one
//! [`FieldDescriptor`]. The variant is chosen when the definition is built, so
//! resolving a field is a single exhaustive match rather than a runtime probe
//! of what the descriptor might be.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::chance::WeightedChoice;
use crate::factory::Factory;
use crate::many::Many;
use crate::sequence::Sequence;

/// Zero-argument function producing a fresh value on every evaluation.
pub struct Producer(Box<dyn FnMut() -> Value>);

impl Producer {
    /// Wraps `f`.
    #[must_use]
    pub fn new(f: impl FnMut() -> Value + 'static) -> Self {
        Self(Box::new(f))
    }

    fn produce(&mut self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Producer(..)")
    }
}

/// Reference to another factory, rebuilt from scratch for every instance.
#[derive(Clone)]
pub struct NestedFactory(Rc<dyn Fn() -> Factory>);

impl NestedFactory {
    /// Wraps a factory constructor.
    #[must_use]
    pub fn new(build: impl Fn() -> Factory + 'static) -> Self {
        Self(Rc::new(build))
    }

    /// Builds a fresh factory and creates a single instance from it.
    fn create(&self) -> Value {
        let mut factory = (self.0)();
        Value::Object(factory.create())
    }
}

impl fmt::Debug for NestedFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NestedFactory(..)")
    }
}

/// The value or generator attached to one field.
#[derive(Debug)]
pub enum FieldDescriptor {
    /// Used as-is for every instance.
    Literal(Value),
    /// Invoked with no arguments for every instance.
    Producer(Producer),
    /// Cycles by index; the only kind that sees the batch size.
    Sequence(Sequence),
    /// Indexes a fixed shuffled multiset.
    WeightedChoice(WeightedChoice),
    /// Produces a randomly sized array of nested instances.
    Many(Many),
    /// Produces one nested instance from a freshly built factory.
    Nested(NestedFactory),
}

impl FieldDescriptor {
    /// Builds a [`FieldDescriptor::Producer`].
    #[must_use]
    pub fn producer(f: impl FnMut() -> Value + 'static) -> Self {
        Self::Producer(Producer::new(f))
    }

    /// Builds a [`FieldDescriptor::Nested`].
    #[must_use]
    pub fn nested(build: impl Fn() -> Factory + 'static) -> Self {
        Self::Nested(NestedFactory::new(build))
    }

    /// Short name of the active variant, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Literal(_) => "literal",
            Self::Producer(_) => "producer",
            Self::Sequence(_) => "sequence",
            Self::WeightedChoice(_) => "weighted_choice",
            Self::Many(_) => "many",
            Self::Nested(_) => "nested",
        }
    }

    /// Resolves the value for item `index` of a batch of `total` items.
    ///
    /// `None` means the field is left out of the instance.
    pub fn resolve(&mut self, index: usize, total: usize) -> Option<Value> {
        match self {
            Self::Sequence(sequence) => sequence.evaluate(index, total),
            Self::WeightedChoice(choice) => choice.evaluate(index),
            Self::Many(many) => Some(many.evaluate()),
            Self::Nested(nested) => Some(nested.create()),
            Self::Producer(producer) => Some(producer.produce()),
            Self::Literal(value) => Some(value.clone()),
        }
    }
}

macro_rules! literal_descriptor_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FieldDescriptor {
                fn from(value: $ty) -> Self {
                    Self::Literal(value.into())
                }
            }
        )*
    };
}

literal_descriptor_from!(Value, bool, i32, i64, u32, u64, usize, f64, &str, String);

impl From<Producer> for FieldDescriptor {
    fn from(producer: Producer) -> Self {
        Self::Producer(producer)
    }
}

impl From<Sequence> for FieldDescriptor {
    fn from(sequence: Sequence) -> Self {
        Self::Sequence(sequence)
    }
}

impl From<WeightedChoice> for FieldDescriptor {
    fn from(choice: WeightedChoice) -> Self {
        Self::WeightedChoice(choice)
    }
}

impl From<Many> for FieldDescriptor {
    fn from(many: Many) -> Self {
        Self::Many(many)
    }
}

impl From<NestedFactory> for FieldDescriptor {
    fn from(nested: NestedFactory) -> Self {
        Self::Nested(nested)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::definition::Definition;
    use crate::many::CountRange;
    use crate::random::RandomSource;

    #[test]
    fn literal_resolves_to_itself() {
        let mut descriptor = FieldDescriptor::from("Mark");
        assert_eq!(descriptor.resolve(3, 10), Some(json!("Mark")));
    }

    #[test]
    fn producer_runs_on_every_resolution() {
        let calls = Rc::new(Cell::new(0_u32));
        let counter = Rc::clone(&calls);
        let mut descriptor = FieldDescriptor::producer(move || {
            counter.set(counter.get() + 1);
            json!(counter.get())
        });

        assert_eq!(descriptor.resolve(0, 2), Some(json!(1)));
        assert_eq!(descriptor.resolve(1, 2), Some(json!(2)));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn nested_builds_a_fresh_factory_each_time() {
        let builds = Rc::new(Cell::new(0_u32));
        let counter = Rc::clone(&builds);
        let mut descriptor = FieldDescriptor::nested(move || {
            counter.set(counter.get() + 1);
            Factory::new(Definition::new().field("name", "Cooper"))
        });

        assert_eq!(descriptor.resolve(0, 1), Some(json!({ "name": "Cooper" })));
        assert_eq!(descriptor.resolve(1, 1), Some(json!({ "name": "Cooper" })));
        assert_eq!(builds.get(), 2);
    }

    #[test]
    fn nested_ignores_outer_batch_position() {
        let mut descriptor = FieldDescriptor::nested(|| {
            Factory::new(Definition::new().field("n", Sequence::new([1, 2, 3])))
        });

        assert_eq!(descriptor.resolve(2, 5), Some(json!({ "n": 1 })));
    }

    #[rstest]
    #[case(FieldDescriptor::from(1), "literal")]
    #[case(FieldDescriptor::producer(|| Value::Null), "producer")]
    #[case(FieldDescriptor::from(Sequence::new([1])), "sequence")]
    #[case(FieldDescriptor::from(WeightedChoice::new([(1, 1)])), "weighted_choice")]
    #[case(
        FieldDescriptor::from(
            Many::new(Factory::default()).with_range(CountRange::exactly(1))
        ),
        "many"
    )]
    #[case(FieldDescriptor::nested(Factory::default), "nested")]
    fn reports_its_kind(#[case] descriptor: FieldDescriptor, #[case] expected: &str) {
        assert_eq!(descriptor.kind(), expected);
    }

    #[test]
    fn sequence_sees_the_batch_size() {
        let mut descriptor = FieldDescriptor::from(
            Sequence::new([1, 2]).with_config(
                crate::sequence::SequenceConfig::default().with_fallback("short"),
            ),
        );

        assert_eq!(descriptor.resolve(0, 1), Some(json!("short")));
        assert_eq!(descriptor.resolve(1, 2), Some(json!(2)));
    }

    #[test]
    fn weighted_choice_can_leave_field_absent() {
        let mut descriptor = FieldDescriptor::from(
            WeightedChoice::or_absent("x", 1, &RandomSource::seeded(4)).expect("valid percent"),
        );
        let absent = (0..100).filter(|i| descriptor.resolve(*i, 100).is_none()).count();

        assert_eq!(absent, 99);
    }
}
