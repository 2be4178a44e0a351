//! Parsing of blueprint field values into field specs.
//!
//! A field value that is an object with a single `$`-prefixed key is a
//! directive; every other value is a literal. `$literal` escapes objects that
//! would otherwise read as directives.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::chance::{DEFAULT_CHANCE_PERCENT, split_percent};
use crate::error::{DefinitionError, RegistryError};
use crate::fakes::FakeKind;
use crate::many::{CountRange, DEFAULT_MAX_ITEMS, DEFAULT_MIN_ITEMS};
use crate::sequence::{SequenceConfig, present};

const DIRECTIVE_PREFIX: char = '$';

/// A validated field declaration whose blueprint references have type `R`.
///
/// Parsing yields `FieldSpec<String>`; the registry then swaps names for
/// resolved blueprints.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FieldSpec<R> {
    Literal(Value),
    Sequence {
        values: Vec<Value>,
        config: SequenceConfig,
    },
    Chance(Vec<(usize, Option<Value>)>),
    Factory(R),
    Many {
        blueprint: R,
        range: CountRange,
    },
    Fake(FakeKind),
}

impl<R> FieldSpec<R> {
    /// Returns the referenced blueprint, if any.
    pub(crate) const fn reference(&self) -> Option<&R> {
        match self {
            Self::Factory(target) | Self::Many { blueprint: target, .. } => Some(target),
            Self::Literal(_) | Self::Sequence { .. } | Self::Chance(_) | Self::Fake(_) => None,
        }
    }

    /// Replaces the blueprint reference, leaving other specs untouched.
    pub(crate) fn try_map_reference<S, E>(
        self,
        resolve: impl FnOnce(R) -> Result<S, E>,
    ) -> Result<FieldSpec<S>, E> {
        Ok(match self {
            Self::Literal(value) => FieldSpec::Literal(value),
            Self::Sequence { values, config } => FieldSpec::Sequence { values, config },
            Self::Chance(slots) => FieldSpec::Chance(slots),
            Self::Factory(target) => FieldSpec::Factory(resolve(target)?),
            Self::Many { blueprint, range } => FieldSpec::Many {
                blueprint: resolve(blueprint)?,
                range,
            },
            Self::Fake(kind) => FieldSpec::Fake(kind),
        })
    }
}

/// Largest total weight a `$chance` may expand to.
const MAX_CHANCE_SLOTS: usize = 1_000_000;

/// Largest collection a `$many` may request.
const MAX_MANY_ITEMS: usize = 10_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawSequence {
    values: Vec<Value>,
    #[serde(default, deserialize_with = "present")]
    fallback: Option<Value>,
    #[serde(default)]
    randomize_if_not_enough_items: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTwoOutcome {
    value: Value,
    #[serde(default = "default_percent")]
    percent: u32,
}

const fn default_percent() -> u32 {
    DEFAULT_CHANCE_PERCENT
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawMany {
    Name(String),
    Configured(RawManyConfig),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManyConfig {
    factory: String,
    min: Option<usize>,
    max: Option<usize>,
}

/// Location of a field, carried into every error it can raise.
struct FieldContext<'a> {
    blueprint: &'a str,
    field: &'a str,
}

impl FieldContext<'_> {
    fn invalid(&self, message: impl Into<String>) -> RegistryError {
        RegistryError::InvalidDirective {
            blueprint: self.blueprint.to_owned(),
            field: self.field.to_owned(),
            message: message.into(),
        }
    }

    fn definition(&self, source: DefinitionError) -> RegistryError {
        RegistryError::Definition {
            blueprint: self.blueprint.to_owned(),
            field: self.field.to_owned(),
            source,
        }
    }

    fn payload<T: DeserializeOwned>(&self, directive: &str, payload: Value) -> Result<T, RegistryError> {
        serde_json::from_value(payload).map_err(|e| self.invalid(format!("{directive}: {e}")))
    }
}

/// A raw field value before its directive, if any, is interpreted.
enum FieldValue {
    Directive(String, Value),
    Literal(Value),
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(mut map) => match directive_key(&map) {
                Some(key) => {
                    let payload = map.remove(&key).unwrap_or_default();
                    Self::Directive(key, payload)
                }
                None => Self::Literal(Value::Object(map)),
            },
            other => Self::Literal(other),
        }
    }
}

fn directive_key(map: &Map<String, Value>) -> Option<String> {
    match (map.len(), map.keys().next()) {
        (1, Some(key)) if key.starts_with(DIRECTIVE_PREFIX) => Some(key.clone()),
        _ => None,
    }
}

/// Parses one field value of blueprint `blueprint`.
pub(crate) fn parse_field(
    blueprint: &str,
    field: &str,
    value: Value,
) -> Result<FieldSpec<String>, RegistryError> {
    let context = FieldContext { blueprint, field };
    match FieldValue::from(value) {
        FieldValue::Directive(directive, payload) => {
            parse_directive(&context, &directive, payload)
        }
        FieldValue::Literal(literal) => Ok(FieldSpec::Literal(literal)),
    }
}

fn parse_directive(
    context: &FieldContext<'_>,
    directive: &str,
    payload: Value,
) -> Result<FieldSpec<String>, RegistryError> {
    match directive {
        "$literal" => Ok(FieldSpec::Literal(payload)),
        "$sequence" => parse_sequence(context, payload),
        "$chance" => {
            let pairs: Vec<(usize, Value)> = context.payload(directive, payload)?;
            check_total_weight(context, &pairs)?;
            Ok(FieldSpec::Chance(
                pairs
                    .into_iter()
                    .map(|(count, value)| (count, Some(value)))
                    .collect(),
            ))
        }
        "$orNull" => parse_two_outcome(context, directive, payload, Some(Value::Null)),
        "$orAbsent" => parse_two_outcome(context, directive, payload, None),
        "$factory" => {
            let target: String = context.payload(directive, payload)?;
            Ok(FieldSpec::Factory(target))
        }
        "$many" => parse_many(context, directive, payload),
        "$fake" => {
            let kind: String = context.payload(directive, payload)?;
            FakeKind::from_name(&kind)
                .map(FieldSpec::Fake)
                .ok_or_else(|| RegistryError::UnknownFakeKind {
                    blueprint: context.blueprint.to_owned(),
                    field: context.field.to_owned(),
                    kind,
                })
        }
        other => Err(RegistryError::UnknownDirective {
            blueprint: context.blueprint.to_owned(),
            field: context.field.to_owned(),
            directive: other.to_owned(),
        }),
    }
}

fn parse_sequence(
    context: &FieldContext<'_>,
    payload: Value,
) -> Result<FieldSpec<String>, RegistryError> {
    let raw = match payload {
        Value::Array(values) => RawSequence {
            values,
            fallback: None,
            randomize_if_not_enough_items: false,
        },
        other => context.payload("$sequence", other)?,
    };
    Ok(FieldSpec::Sequence {
        values: raw.values,
        config: SequenceConfig {
            fallback: raw.fallback,
            randomize_if_not_enough_items: raw.randomize_if_not_enough_items,
        },
    })
}

fn check_total_weight(
    context: &FieldContext<'_>,
    pairs: &[(usize, Value)],
) -> Result<(), RegistryError> {
    let total = pairs
        .iter()
        .try_fold(0_usize, |sum, (count, _)| sum.checked_add(*count));
    match total {
        Some(0) => Err(context.invalid("$chance: total weight must be at least 1")),
        Some(weight) if weight <= MAX_CHANCE_SLOTS => Ok(()),
        _ => Err(context.invalid(format!(
            "$chance: total weight exceeds {MAX_CHANCE_SLOTS}"
        ))),
    }
}

fn parse_two_outcome(
    context: &FieldContext<'_>,
    directive: &str,
    payload: Value,
    alternate: Option<Value>,
) -> Result<FieldSpec<String>, RegistryError> {
    let raw: RawTwoOutcome = context.payload(directive, payload)?;
    let (primary, rest) = split_percent(raw.percent).map_err(|e| context.definition(e))?;
    Ok(FieldSpec::Chance(vec![
        (primary, Some(raw.value)),
        (rest, alternate),
    ]))
}

fn parse_many(
    context: &FieldContext<'_>,
    directive: &str,
    payload: Value,
) -> Result<FieldSpec<String>, RegistryError> {
    let (blueprint, range) = match context.payload(directive, payload)? {
        RawMany::Name(name) => (name, CountRange::default()),
        RawMany::Configured(RawManyConfig { factory, min, max }) => {
            let range = CountRange::new(
                min.unwrap_or(DEFAULT_MIN_ITEMS),
                max.unwrap_or(DEFAULT_MAX_ITEMS),
            )
            .map_err(|e| context.definition(e))?;
            if range.max() > MAX_MANY_ITEMS {
                return Err(context.invalid(format!("$many: max exceeds {MAX_MANY_ITEMS}")));
            }
            (factory, range)
        }
    };
    Ok(FieldSpec::Many { blueprint, range })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn parse(value: Value) -> Result<FieldSpec<String>, RegistryError> {
        parse_field("person", "field", value)
    }

    #[rstest]
    #[case::string(json!("Mark"))]
    #[case::number(json!(42))]
    #[case::null(Value::Null)]
    #[case::plain_object(json!({ "street": "Main", "number": 1 }))]
    #[case::single_plain_key(json!({ "street": "Main" }))]
    #[case::array(json!([1, 2, 3]))]
    fn non_directives_are_literals(#[case] value: Value) {
        assert_eq!(parse(value.clone()), Ok(FieldSpec::Literal(value)));
    }

    #[test]
    fn literal_directive_escapes_objects() {
        assert_eq!(
            parse(json!({ "$literal": { "$sequence": [1] } })),
            Ok(FieldSpec::Literal(json!({ "$sequence": [1] })))
        );
    }

    #[test]
    fn sequence_accepts_bare_arrays() {
        assert_eq!(
            parse(json!({ "$sequence": [5, 0, 1] })),
            Ok(FieldSpec::Sequence {
                values: vec![json!(5), json!(0), json!(1)],
                config: SequenceConfig::default(),
            })
        );
    }

    #[test]
    fn sequence_accepts_configuration() {
        let parsed = parse(json!({
            "$sequence": { "values": [1, 2], "fallback": 0, "randomizeIfNotEnoughItems": true }
        }));

        assert_eq!(
            parsed,
            Ok(FieldSpec::Sequence {
                values: vec![json!(1), json!(2)],
                config: SequenceConfig {
                    fallback: Some(json!(0)),
                    randomize_if_not_enough_items: true,
                },
            })
        );
    }

    #[test]
    fn chance_parses_weighted_pairs() {
        assert_eq!(
            parse(json!({ "$chance": [[3, "active"], [1, "inactive"]] })),
            Ok(FieldSpec::Chance(vec![
                (3, Some(json!("active"))),
                (1, Some(json!("inactive"))),
            ]))
        );
    }

    #[test]
    fn or_null_defaults_to_eighty_percent() {
        assert_eq!(
            parse(json!({ "$orNull": { "value": "Bob" } })),
            Ok(FieldSpec::Chance(vec![
                (80, Some(json!("Bob"))),
                (20, Some(Value::Null)),
            ]))
        );
    }

    #[test]
    fn or_absent_uses_absent_slots() {
        assert_eq!(
            parse(json!({ "$orAbsent": { "value": 1, "percent": 60 } })),
            Ok(FieldSpec::Chance(vec![(60, Some(json!(1))), (40, None)]))
        );
    }

    #[rstest]
    #[case(0)]
    #[case(100)]
    fn two_outcome_rejects_extreme_percents(#[case] percent: u32) {
        assert_eq!(
            parse(json!({ "$orNull": { "value": "Bob", "percent": percent } })),
            Err(RegistryError::Definition {
                blueprint: "person".to_owned(),
                field: "field".to_owned(),
                source: DefinitionError::InvalidChancePercent { percent },
            })
        );
    }

    #[test]
    fn many_accepts_a_bare_name() {
        assert_eq!(
            parse(json!({ "$many": "dog" })),
            Ok(FieldSpec::Many {
                blueprint: "dog".to_owned(),
                range: CountRange::default(),
            })
        );
    }

    #[test]
    fn many_fills_missing_bounds_with_defaults() {
        assert_eq!(
            parse(json!({ "$many": { "factory": "dog", "max": 3 } })),
            Ok(FieldSpec::Many {
                blueprint: "dog".to_owned(),
                range: CountRange::new(1, 3).expect("valid range"),
            })
        );
    }

    #[test]
    fn many_rejects_inverted_range() {
        assert!(matches!(
            parse(json!({ "$many": { "factory": "dog", "min": 4, "max": 2 } })),
            Err(RegistryError::Definition {
                source: DefinitionError::InvalidCountRange { min: 4, max: 2 },
                ..
            })
        ));
    }

    #[test]
    fn factory_and_fake_directives_parse() {
        assert_eq!(
            parse(json!({ "$factory": "dog" })),
            Ok(FieldSpec::Factory("dog".to_owned()))
        );
        assert_eq!(
            parse(json!({ "$fake": "firstName" })),
            Ok(FieldSpec::Fake(FakeKind::FirstName))
        );
    }

    #[test]
    fn unknown_directive_is_rejected() {
        assert_eq!(
            parse(json!({ "$cycle": [1, 2] })),
            Err(RegistryError::UnknownDirective {
                blueprint: "person".to_owned(),
                field: "field".to_owned(),
                directive: "$cycle".to_owned(),
            })
        );
    }

    #[test]
    fn unknown_fake_kind_is_rejected() {
        assert!(matches!(
            parse(json!({ "$fake": "phoneNumber" })),
            Err(RegistryError::UnknownFakeKind { kind, .. }) if kind == "phoneNumber"
        ));
    }

    #[rstest]
    #[case::chance_not_pairs(json!({ "$chance": "often" }))]
    #[case::factory_not_name(json!({ "$factory": 3 }))]
    #[case::sequence_missing_values(json!({ "$sequence": { "fallback": 1 } }))]
    #[case::or_null_missing_value(json!({ "$orNull": { "percent": 50 } }))]
    #[case::sequence_typo_key(json!({ "$sequence": { "values": [1, 2, 3], "fallbak": 0 } }))]
    #[case::many_typo_key(json!({ "$many": { "factory": "dog", "mn": 5, "mx": 5 } }))]
    #[case::or_absent_typo_key(json!({ "$orAbsent": { "value": 1, "percnt": 5 } }))]
    #[case::empty_chance(json!({ "$chance": [] }))]
    #[case::zero_weight_chance(json!({ "$chance": [[0, "a"], [0, "b"]] }))]
    #[case::oversized_chance(json!({ "$chance": [[usize::MAX, "x"]] }))]
    #[case::overflowing_chance(json!({ "$chance": [[usize::MAX, "x"], [1, "y"]] }))]
    #[case::oversized_many(json!({ "$many": { "factory": "dog", "max": 10_001 } }))]
    fn malformed_payloads_are_invalid(#[case] value: Value) {
        assert!(matches!(
            parse(value),
            Err(RegistryError::InvalidDirective { .. })
        ));
    }

    #[test]
    fn bounds_at_the_limits_are_accepted() {
        assert!(parse(json!({ "$chance": [[MAX_CHANCE_SLOTS, "x"]] })).is_ok());
        assert!(parse(json!({ "$many": { "factory": "dog", "max": MAX_MANY_ITEMS } })).is_ok());
    }

    #[test]
    fn references_are_mapped() {
        let spec = FieldSpec::Many {
            blueprint: "dog".to_owned(),
            range: CountRange::exactly(2),
        };
        assert_eq!(spec.reference(), Some(&"dog".to_owned()));

        let mapped: Result<FieldSpec<usize>, ()> = spec.try_map_reference(|name| Ok(name.len()));
        assert_eq!(
            mapped,
            Ok(FieldSpec::Many {
                blueprint: 3,
                range: CountRange::exactly(2),
            })
        );
    }
}
