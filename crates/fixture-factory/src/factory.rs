//! Batch creation on top of a [`Definition`].
//!
//! A [`Factory`] owns one definition and evaluates it once per requested
//! instance. A batch of `n` instances evaluates with indices `0..n` in
//! ascending order and passes `n` as the batch size to every evaluation;
//! creating a single instance is a batch of one.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::definition::{Definition, Instance};
use crate::error::GenerationError;

/// Produces instances from a definition, with override and field-subset
/// helpers.
///
/// # Example
///
/// ```
/// use fixture_factory::{Definition, Factory, Sequence};
/// use serde_json::json;
///
/// let mut factory = Factory::new(Definition::new().field("id", 0))
///     .with_overrides(Definition::new().field("id", Sequence::new([5, 0, 1])));
///
/// let ids: Vec<_> = factory.create_many(5).into_iter().map(|user| user["id"].clone()).collect();
/// assert_eq!(ids, [json!(5), json!(0), json!(1), json!(5), json!(0)]);
/// ```
#[derive(Debug, Default)]
pub struct Factory {
    definition: Definition,
}

impl Factory {
    /// Wraps `definition`.
    #[must_use]
    pub const fn new(definition: Definition) -> Self {
        Self { definition }
    }

    /// Returns the current definition.
    #[must_use]
    pub const fn definition(&self) -> &Definition {
        &self.definition
    }

    /// Shallow-merges `overrides` into the definition in place.
    pub fn override_fields(&mut self, overrides: Definition) -> &mut Self {
        self.definition.merge(overrides);
        self
    }

    /// Shallow-merges `overrides` into the definition.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Definition) -> Self {
        self.override_fields(overrides);
        self
    }

    /// Shallow-merges the definition returned by `overrides`.
    #[must_use]
    pub fn with_overrides_from(self, overrides: impl FnOnce() -> Definition) -> Self {
        self.with_overrides(overrides())
    }

    /// Keeps only the listed fields.
    ///
    /// Every other descriptor is dropped unevaluated.
    #[must_use]
    pub fn pick(mut self, names: &[&str]) -> Self {
        self.definition
            .retain(|name| names.iter().any(|picked| *picked == name));
        self
    }

    /// Drops the listed fields unevaluated.
    #[must_use]
    pub fn omit(mut self, names: &[&str]) -> Self {
        self.definition
            .retain(|name| !names.iter().any(|omitted| *omitted == name));
        self
    }

    /// Evaluates the definition for item `index` of a batch of `total`.
    pub fn evaluate(&mut self, index: usize, total: usize) -> Instance {
        self.definition.evaluate(index, total)
    }

    /// Creates a single instance, as a batch of one.
    pub fn create(&mut self) -> Instance {
        self.evaluate(0, 1)
    }

    /// Creates `count` instances in index order.
    pub fn create_many(&mut self, count: usize) -> Vec<Instance> {
        debug!(count, fields = self.definition.len(), "creating factory batch");
        (0..count).map(|index| self.evaluate(index, count)).collect()
    }

    /// Creates `count` instances by calling `handler` for every index.
    ///
    /// The handler replaces default evaluation entirely. It receives this
    /// factory, so it may override fields before creating.
    ///
    /// # Example
    ///
    /// ```
    /// use fixture_factory::{Definition, Factory};
    /// use serde_json::json;
    ///
    /// let mut factory = Factory::new(Definition::new().field("id", 0));
    /// let users = factory.create_many_with(3, |index, factory| {
    ///     factory
    ///         .override_fields(Definition::new().field("id", index + 1))
    ///         .create()
    /// });
    ///
    /// assert_eq!(users[2]["id"], json!(3));
    /// ```
    pub fn create_many_with<F>(&mut self, count: usize, mut handler: F) -> Vec<Instance>
    where
        F: FnMut(usize, &mut Self) -> Instance,
    {
        debug!(count, "creating factory batch with handler");
        (0..count).map(|index| handler(index, self)).collect()
    }

    /// Creates a single instance and deserializes it into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Deserialize`] if the instance does not fit
    /// `T`.
    pub fn create_as<T: DeserializeOwned>(&mut self) -> Result<T, GenerationError> {
        let instance = self.create();
        into_typed(0, instance)
    }

    /// Creates `count` instances and deserializes each into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Deserialize`] for the first instance that
    /// does not fit `T`.
    pub fn create_many_as<T: DeserializeOwned>(
        &mut self,
        count: usize,
    ) -> Result<Vec<T>, GenerationError> {
        self.create_many(count)
            .into_iter()
            .enumerate()
            .map(|(index, instance)| into_typed(index, instance))
            .collect()
    }
}

impl From<Definition> for Factory {
    fn from(definition: Definition) -> Self {
        Self::new(definition)
    }
}

fn into_typed<T: DeserializeOwned>(index: usize, instance: Instance) -> Result<T, GenerationError> {
    serde_json::from_value(Value::Object(instance)).map_err(|e| GenerationError::Deserialize {
        index,
        message: e.to_string(),
    })
}
