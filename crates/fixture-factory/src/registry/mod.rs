//! Blueprint registry types and JSON parsing.
//!
//! A blueprint registry is a versioned JSON document declaring named
//! blueprints. Each blueprint maps field names to literal values or
//! `$`-prefixed directives, and can be turned into a [`Factory`] on demand.
//! References between blueprints are resolved and checked for cycles when the
//! registry is loaded, so building a factory afterwards cannot fail.

mod directive;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::chance::WeightedChoice;
use crate::definition::Definition;
use crate::descriptor::FieldDescriptor;
use crate::error::RegistryError;
use crate::factory::Factory;
use crate::many::Many;
use crate::random::RandomSource;
use crate::sequence::Sequence;

use self::directive::{FieldSpec, parse_field};

/// Current supported registry version.
const SUPPORTED_VERSION: u32 = 1;

/// A registry of named blueprints loaded from JSON.
///
/// # Example
///
/// ```
/// use fixture_factory::BlueprintRegistry;
/// use serde_json::json;
///
/// let json = r#"{
///     "version": 1,
///     "seed": 42,
///     "blueprints": [
///         {"name": "dog", "fields": {"name": "Cooper"}},
///         {"name": "person", "fields": {
///             "id": {"$sequence": [1, 2, 3]},
///             "dog": {"$factory": "dog"}
///         }}
///     ]
/// }"#;
///
/// let registry = BlueprintRegistry::from_json(json).expect("valid registry");
/// let mut people = registry
///     .factory("person", &registry.random_source())
///     .expect("blueprint exists");
///
/// let person = people.create();
/// assert_eq!(person["id"], json!(1));
/// assert_eq!(person["dog"], json!({"name": "Cooper"}));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BlueprintRegistry {
    version: u32,
    seed: Option<u64>,
    blueprints: Vec<Rc<Blueprint>>,
}

impl BlueprintRegistry {
    /// Parses a blueprint registry from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if:
    /// - The JSON is malformed or required fields are missing
    /// - The version is unsupported
    /// - There are no blueprints, or two share a name
    /// - A directive is unknown, malformed or misconfigured
    /// - A reference names a missing blueprint or closes a cycle
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let raw: RawBlueprintRegistry =
            serde_json::from_str(json).map_err(|e| RegistryError::ParseError {
                message: e.to_string(),
            })?;

        Self::from_raw(raw)
    }

    /// Loads a blueprint registry from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let contents = fs::read_to_string(path).map_err(|e| RegistryError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::from_json(&contents)
    }

    fn from_raw(raw: RawBlueprintRegistry) -> Result<Self, RegistryError> {
        if raw.version != SUPPORTED_VERSION {
            return Err(RegistryError::UnsupportedVersion {
                expected: SUPPORTED_VERSION,
                actual: raw.version,
            });
        }

        if raw.blueprints.is_empty() {
            return Err(RegistryError::EmptyBlueprints);
        }

        let mut seen = HashSet::new();
        let mut order = Vec::with_capacity(raw.blueprints.len());
        let mut parsed = HashMap::with_capacity(raw.blueprints.len());
        for blueprint in raw.blueprints {
            if !seen.insert(blueprint.name.clone()) {
                return Err(RegistryError::DuplicateBlueprint {
                    name: blueprint.name,
                });
            }
            let fields = blueprint
                .fields
                .into_iter()
                .map(|(field, value)| {
                    parse_field(&blueprint.name, &field, value).map(|spec| (field, spec))
                })
                .collect::<Result<Vec<_>, _>>()?;
            order.push(blueprint.name.clone());
            parsed.insert(blueprint.name, fields);
        }

        let mut resolver = Resolver {
            parsed,
            resolved: HashMap::new(),
            visiting: Vec::new(),
        };
        let blueprints = order
            .iter()
            .map(|name| resolver.resolve(name))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            version = raw.version,
            blueprints = blueprints.len(),
            seeded = raw.seed.is_some(),
            "loaded blueprint registry"
        );

        Ok(Self {
            version: raw.version,
            seed: raw.seed,
            blueprints,
        })
    }

    /// Returns the registry version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns the configured seed, if any.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns a random source honouring the configured seed.
    ///
    /// Without a seed the source is entropy-seeded and runs are not
    /// reproducible.
    #[must_use]
    pub fn random_source(&self) -> RandomSource {
        self.seed
            .map_or_else(RandomSource::from_entropy, RandomSource::seeded)
    }

    /// Returns all blueprints in declaration order.
    pub fn blueprints(&self) -> impl Iterator<Item = &Blueprint> {
        self.blueprints.iter().map(Rc::as_ref)
    }

    /// Finds a blueprint by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::BlueprintNotFound`] if no blueprint with the
    /// given name exists.
    pub fn find_blueprint(&self, name: &str) -> Result<&Blueprint, RegistryError> {
        self.blueprints()
            .find(|blueprint| blueprint.name == name)
            .ok_or_else(|| RegistryError::BlueprintNotFound {
                name: name.to_owned(),
            })
    }

    /// Builds a fresh factory for the named blueprint.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::BlueprintNotFound`] if no blueprint with the
    /// given name exists.
    pub fn factory(&self, name: &str, random: &RandomSource) -> Result<Factory, RegistryError> {
        self.find_blueprint(name)
            .map(|blueprint| blueprint.factory(random))
    }
}

/// A named, resolved blueprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    name: String,
    fields: Vec<(String, FieldSpec<Rc<Blueprint>>)>,
}

impl Blueprint {
    /// Returns the blueprint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Builds a factory whose randomised descriptors draw from `random`.
    ///
    /// `$many` fields build their nested factory immediately; `$factory`
    /// fields rebuild theirs for every instance.
    #[must_use]
    pub fn factory(&self, random: &RandomSource) -> Factory {
        let definition = self
            .fields
            .iter()
            .fold(Definition::new(), |definition, (name, spec)| {
                definition.field(name.as_str(), descriptor_for(spec, random))
            });
        Factory::new(definition)
    }
}

fn descriptor_for(spec: &FieldSpec<Rc<Blueprint>>, random: &RandomSource) -> FieldDescriptor {
    match spec {
        FieldSpec::Literal(value) => FieldDescriptor::Literal(value.clone()),
        FieldSpec::Sequence { values, config } => Sequence::new(values.iter().cloned())
            .with_config(config.clone())
            .with_random_source(random.clone())
            .into(),
        FieldSpec::Chance(slots) => WeightedChoice::from_slots(slots.iter().cloned(), random).into(),
        FieldSpec::Factory(blueprint) => {
            let target = Rc::clone(blueprint);
            let source = random.clone();
            FieldDescriptor::nested(move || target.factory(&source))
        }
        FieldSpec::Many { blueprint, range } => Many::new(blueprint.factory(random))
            .with_range(*range)
            .with_random_source(random.clone())
            .into(),
        FieldSpec::Fake(kind) => kind.descriptor(random),
    }
}

/// Resolves blueprint names into shared blueprints, depth first.
struct Resolver {
    parsed: HashMap<String, Vec<(String, FieldSpec<String>)>>,
    resolved: HashMap<String, Rc<Blueprint>>,
    visiting: Vec<String>,
}

impl Resolver {
    fn resolve(&mut self, name: &str) -> Result<Rc<Blueprint>, RegistryError> {
        if let Some(done) = self.resolved.get(name) {
            return Ok(Rc::clone(done));
        }
        if self.visiting.iter().any(|open| open == name) {
            return Err(RegistryError::ReferenceCycle {
                name: name.to_owned(),
            });
        }
        let Some(fields) = self.parsed.remove(name) else {
            return Err(RegistryError::BlueprintNotFound {
                name: name.to_owned(),
            });
        };

        self.visiting.push(name.to_owned());
        let mut resolved_fields = Vec::with_capacity(fields.len());
        for (field, spec) in fields {
            if let Some(target) = spec.reference().filter(|target| !self.is_known(target)) {
                return Err(RegistryError::UnknownReference {
                    blueprint: name.to_owned(),
                    field,
                    target: target.clone(),
                });
            }
            let resolved_spec = spec.try_map_reference(|target| self.resolve(&target))?;
            resolved_fields.push((field, resolved_spec));
        }
        self.visiting.pop();

        let blueprint = Rc::new(Blueprint {
            name: name.to_owned(),
            fields: resolved_fields,
        });
        self.resolved.insert(name.to_owned(), Rc::clone(&blueprint));
        Ok(blueprint)
    }

    fn is_known(&self, name: &str) -> bool {
        self.parsed.contains_key(name)
            || self.resolved.contains_key(name)
            || self.visiting.iter().any(|open| open == name)
    }
}

/// Raw JSON representation for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlueprintRegistry {
    version: u32,
    #[serde(default)]
    seed: Option<u64>,
    blueprints: Vec<RawBlueprint>,
}

/// Raw JSON representation of a blueprint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlueprint {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    const VALID_JSON: &str = r#"{
        "version": 1,
        "seed": 2026,
        "blueprints": [
            {"name": "dog", "fields": {"name": "Cooper"}},
            {"name": "person", "fields": {
                "id": {"$sequence": [5, 0, 1]},
                "name": "Mark",
                "dog": {"$factory": "dog"},
                "pets": {"$many": {"factory": "dog", "min": 2, "max": 2}}
            }}
        ]
    }"#;

    fn registry() -> BlueprintRegistry {
        BlueprintRegistry::from_json(VALID_JSON).expect("valid registry")
    }

    #[test]
    fn parses_valid_registry() {
        let registry = registry();

        assert_eq!(registry.version(), 1);
        assert_eq!(registry.seed(), Some(2026));
        let names: Vec<&str> = registry.blueprints().map(Blueprint::name).collect();
        assert_eq!(names, ["dog", "person"]);
    }

    #[test]
    fn finds_blueprint_by_name() {
        let registry = registry();
        let person = registry.find_blueprint("person").expect("blueprint found");

        assert_eq!(person.name(), "person");
        assert_eq!(
            person.field_names().collect::<Vec<_>>(),
            ["id", "name", "dog", "pets"]
        );
    }

    #[test]
    fn returns_error_for_unknown_blueprint() {
        let registry = registry();
        assert_eq!(
            registry.find_blueprint("cat").map(Blueprint::name),
            Err(RegistryError::BlueprintNotFound {
                name: "cat".to_owned()
            })
        );
    }

    #[test]
    fn builds_factories_from_blueprints() {
        let registry = registry();
        let mut people = registry
            .factory("person", &registry.random_source())
            .expect("blueprint exists");

        let batch: Vec<Value> = people.create_many(2).into_iter().map(Value::Object).collect();

        assert_eq!(
            batch,
            [
                json!({
                    "id": 5, "name": "Mark", "dog": {"name": "Cooper"},
                    "pets": [{"name": "Cooper"}, {"name": "Cooper"}]
                }),
                json!({
                    "id": 0, "name": "Mark", "dog": {"name": "Cooper"},
                    "pets": [{"name": "Cooper"}, {"name": "Cooper"}]
                }),
            ]
        );
    }

    #[test]
    fn forward_references_resolve() {
        let json = r#"{
            "version": 1,
            "blueprints": [
                {"name": "owner", "fields": {"pet": {"$factory": "pet"}}},
                {"name": "pet", "fields": {"kind": "cat"}}
            ]
        }"#;
        let registry = BlueprintRegistry::from_json(json).expect("valid registry");
        let mut owners = registry
            .factory("owner", &RandomSource::seeded(1))
            .expect("blueprint exists");

        assert_eq!(Value::Object(owners.create()), json!({"pet": {"kind": "cat"}}));
    }

    #[test]
    fn shared_references_are_resolved_once() {
        let json = r#"{
            "version": 1,
            "blueprints": [
                {"name": "tag", "fields": {"label": "x"}},
                {"name": "a", "fields": {"tag": {"$factory": "tag"}}},
                {"name": "b", "fields": {"tags": {"$many": "tag"}, "a": {"$factory": "a"}}}
            ]
        }"#;
        assert!(BlueprintRegistry::from_json(json).is_ok());
    }

    #[test]
    fn blueprints_without_fields_produce_empty_instances() {
        let json = r#"{"version": 1, "blueprints": [{"name": "empty"}]}"#;
        let registry = BlueprintRegistry::from_json(json).expect("valid registry");
        let mut factory = registry
            .factory("empty", &RandomSource::seeded(1))
            .expect("blueprint exists");

        assert!(factory.create().is_empty());
    }

    #[test]
    fn unseeded_registries_still_produce_a_source() {
        let json = r#"{"version": 1, "blueprints": [{"name": "n", "fields": {"v": 1}}]}"#;
        let registry = BlueprintRegistry::from_json(json).expect("valid registry");

        assert_eq!(registry.seed(), None);
        assert!(registry.random_source().int_in_range(1, 10) >= 1);
    }

    #[rstest]
    #[case::malformed_json("not valid json")]
    #[case::missing_version(r#"{"blueprints": [{"name": "a"}]}"#)]
    #[case::missing_blueprints(r#"{"version": 1}"#)]
    fn rejects_json_with_parse_error(#[case] json: &str) {
        let result = BlueprintRegistry::from_json(json);
        assert!(matches!(result, Err(RegistryError::ParseError { .. })));
    }

    #[rstest]
    #[case::unsupported_version(
        r#"{"version": 99, "blueprints": [{"name": "a"}]}"#,
        RegistryError::UnsupportedVersion { expected: 1, actual: 99 }
    )]
    #[case::empty_blueprints(r#"{"version": 1, "blueprints": []}"#, RegistryError::EmptyBlueprints)]
    #[case::duplicate_blueprint(
        r#"{"version": 1, "blueprints": [{"name": "a"}, {"name": "a"}]}"#,
        RegistryError::DuplicateBlueprint { name: "a".to_owned() }
    )]
    #[case::unknown_reference(
        r#"{"version": 1, "blueprints": [{"name": "a", "fields": {"b": {"$factory": "b"}}}]}"#,
        RegistryError::UnknownReference {
            blueprint: "a".to_owned(),
            field: "b".to_owned(),
            target: "b".to_owned(),
        }
    )]
    #[case::self_cycle(
        r#"{"version": 1, "blueprints": [{"name": "node", "fields": {"next": {"$factory": "node"}}}]}"#,
        RegistryError::ReferenceCycle { name: "node".to_owned() }
    )]
    #[case::indirect_cycle(
        r#"{"version": 1, "blueprints": [
            {"name": "a", "fields": {"b": {"$factory": "b"}}},
            {"name": "b", "fields": {"a": {"$many": "a"}}}
        ]}"#,
        RegistryError::ReferenceCycle { name: "a".to_owned() }
    )]
    fn rejects_invalid_registry(#[case] json: &str, #[case] expected: RegistryError) {
        let result = BlueprintRegistry::from_json(json);
        assert_eq!(result, Err(expected));
    }
}
