//! Faker-backed producers.
//!
//! These give blueprint registries (and callers without their own closures)
//! believable names, emails and identifiers drawn from a shared
//! [`RandomSource`], so seeded sources yield reproducible fake data.

use fake::Fake;
use fake::faker::internet::raw::SafeEmail;
use fake::faker::name::raw::{FirstName, LastName};
use fake::locales::EN;
use rand::Rng;
use serde_json::Value;
use uuid::Uuid;

use crate::descriptor::FieldDescriptor;
use crate::random::RandomSource;

/// Kinds of fake value available to producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeKind {
    /// An English first name.
    FirstName,
    /// An English last name.
    LastName,
    /// First name followed by last name.
    Name,
    /// An email address on a reserved example domain.
    SafeEmail,
    /// A UUID drawn from the random source.
    Uuid,
}

impl FakeKind {
    /// Every supported kind.
    pub const ALL: [Self; 5] = [
        Self::FirstName,
        Self::LastName,
        Self::Name,
        Self::SafeEmail,
        Self::Uuid,
    ];

    /// Looks up a kind by its registry name, e.g. `"firstName"`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Returns the registry name of this kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Name => "name",
            Self::SafeEmail => "safeEmail",
            Self::Uuid => "uuid",
        }
    }

    /// Generates one value using `random`.
    #[must_use]
    pub fn generate(self, random: &RandomSource) -> Value {
        random.with_rng(|rng| match self {
            Self::FirstName => {
                let first: String = FirstName(EN).fake_with_rng(rng);
                Value::String(first)
            }
            Self::LastName => {
                let last: String = LastName(EN).fake_with_rng(rng);
                Value::String(last)
            }
            Self::Name => {
                let first: String = FirstName(EN).fake_with_rng(rng);
                let last: String = LastName(EN).fake_with_rng(rng);
                Value::String(format!("{first} {last}"))
            }
            Self::SafeEmail => {
                let email: String = SafeEmail(EN).fake_with_rng(rng);
                Value::String(email)
            }
            Self::Uuid => Value::String(Uuid::from_u128(rng.random()).to_string()),
        })
    }

    /// Wraps this kind in a producer descriptor bound to `random`.
    #[must_use]
    pub fn descriptor(self, random: &RandomSource) -> FieldDescriptor {
        let source = random.clone();
        FieldDescriptor::producer(move || self.generate(&source))
    }
}
