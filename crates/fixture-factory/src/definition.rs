//! Generator definitions: ordered field-name-to-descriptor mappings.

use serde_json::{Map, Value};
use tracing::trace;

use crate::descriptor::FieldDescriptor;
use crate::factory::Factory;

/// One generated object, keyed by field name in definition order.
pub type Instance = Map<String, Value>;

/// The full set of field descriptors describing one data shape.
///
/// Field order is preserved: it is both the order in which descriptors are
/// evaluated and the key order of produced instances.
///
/// # Example
///
/// ```
/// use fixture_factory::Definition;
/// use serde_json::json;
///
/// let mut definition = Definition::new()
///     .field("name", "Mark")
///     .producer("age", || json!(42));
///
/// let instance = definition.evaluate(0, 1);
/// assert_eq!(serde_json::Value::Object(instance), json!({ "name": "Mark", "age": 42 }));
/// ```
#[derive(Debug, Default)]
pub struct Definition {
    fields: Vec<(String, FieldDescriptor)>,
}

impl Definition {
    /// Creates an empty definition.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Adds or replaces a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, descriptor: impl Into<FieldDescriptor>) -> Self {
        self.insert(name, descriptor);
        self
    }

    /// Adds or replaces a field resolved by calling `f` for each instance.
    #[must_use]
    pub fn producer(self, name: impl Into<String>, f: impl FnMut() -> Value + 'static) -> Self {
        self.field(name, FieldDescriptor::producer(f))
    }

    /// Adds or replaces a field holding one instance of a nested factory.
    #[must_use]
    pub fn nested(self, name: impl Into<String>, build: impl Fn() -> Factory + 'static) -> Self {
        self.field(name, FieldDescriptor::nested(build))
    }

    /// Inserts a field, keeping its position when the name already exists.
    pub fn insert(&mut self, name: impl Into<String>, descriptor: impl Into<FieldDescriptor>) {
        let key = name.into();
        let replacement = descriptor.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = replacement,
            None => self.fields.push((key, replacement)),
        }
    }

    /// Shallow-merges `overrides` into this definition.
    ///
    /// Overriding descriptors replace existing ones field by field; fields
    /// not mentioned keep whatever descriptor they had.
    pub fn merge(&mut self, overrides: Self) {
        for (name, descriptor) in overrides.fields {
            self.insert(name, descriptor);
        }
    }

    /// Drops every field whose name fails `keep`.
    ///
    /// Dropped descriptors are discarded without being evaluated.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.fields.retain(|(name, _)| keep(name));
    }

    /// Returns the descriptor for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, descriptor)| descriptor)
    }

    /// Returns the field names in definition order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Resolves every field for item `index` of a batch of `total` items.
    pub fn evaluate(&mut self, index: usize, total: usize) -> Instance {
        let mut instance = Instance::new();
        for (name, descriptor) in &mut self.fields {
            trace!(field = %name, kind = descriptor.kind(), index, total, "resolving field");
            if let Some(value) = descriptor.resolve(index, total) {
                instance.insert(name.clone(), value);
            }
        }
        instance
    }
}
