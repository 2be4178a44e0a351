//! Declarative test data factories.
//!
//! This crate builds plain data objects for tests and fixtures from a
//! [`Definition`]: an ordered mapping of field names to descriptors saying how
//! each field is produced.
//!
//! # Overview
//!
//! The crate supports:
//!
//! - Literal values repeated on every instance
//! - Producer closures called once per instance
//! - Index-aware [`Sequence`]s with fallbacks and randomised order
//! - Multiplicity-based [`WeightedChoice`]s, including or-null and or-absent
//! - Nested factories and [`Many`] collections of sub-instances
//! - Overrides, field picking and omission on a [`Factory`]
//! - JSON [`BlueprintRegistry`] files declaring factories as data
//!
//! Every random draw goes through a [`RandomSource`], so a seeded source
//! reproduces the same data run after run.
//!
//! # Example
//!
//! ```
//! use fixture_factory::{Definition, Factory, RandomSource, Sequence, WeightedChoice};
//! use serde_json::json;
//!
//! let random = RandomSource::seeded(42);
//! let mut users = Factory::new(
//!     Definition::new()
//!         .field("id", Sequence::indexed(|index| json!(index + 1)))
//!         .field("name", "Mark")
//!         .field(
//!             "nickname",
//!             WeightedChoice::or_null("Sparky", 50, &random).expect("valid percent"),
//!         ),
//! );
//!
//! let batch = users.create_many(3);
//! assert_eq!(batch.len(), 3);
//! assert_eq!(batch[2]["id"], json!(3));
//! assert!(batch.iter().all(|user| user["name"] == json!("Mark")));
//! ```

mod chance;
mod definition;
mod descriptor;
mod error;
mod factory;
mod fakes;
mod many;
mod random;
mod registry;
mod sequence;

pub use chance::{DEFAULT_CHANCE_PERCENT, WeightedChoice};
pub use definition::{Definition, Instance};
pub use descriptor::{FieldDescriptor, NestedFactory, Producer};
pub use error::{DefinitionError, GenerationError, RegistryError};
pub use factory::Factory;
pub use fakes::FakeKind;
pub use many::{CountRange, DEFAULT_MAX_ITEMS, DEFAULT_MIN_ITEMS, Many};
pub use random::RandomSource;
pub use registry::{Blueprint, BlueprintRegistry};
pub use sequence::{Sequence, SequenceConfig, SequenceItem};
