//! Error types for the fixture-factory crate.
//!
//! Descriptor construction, typed instance creation and blueprint registry
//! loading each get a semantic error enum built with `thiserror`.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while constructing field descriptors.
///
/// These guard against configurations that are almost certainly caller
/// mistakes, such as a weighted choice that can never pick its alternate
/// value. They are reported immediately and never clamped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// A two-outcome chance percentage fell outside `1..=99`.
    #[error("chance percent must be between 1 and 99, got {percent}")]
    InvalidChancePercent {
        /// The rejected percentage.
        percent: u32,
    },

    /// A collection size range had its lower bound above its upper bound.
    #[error("invalid collection size range: min {min} is greater than max {max}")]
    InvalidCountRange {
        /// Requested lower bound.
        min: usize,
        /// Requested upper bound.
        max: usize,
    },
}

/// Errors that can occur while turning generated instances into typed values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The generated instance does not match the requested type.
    #[error("generated instance at index {index} does not fit the target type: {message}")]
    Deserialize {
        /// Index of the offending instance within its batch.
        index: usize,
        /// Description of the deserialization failure.
        message: String,
    },
}

/// Errors that can occur when loading or querying a blueprint registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The registry file could not be read.
    #[error("failed to read registry file at '{path}': {message}")]
    IoError {
        /// Path to the registry file.
        path: PathBuf,
        /// Description of the I/O error.
        message: String,
    },

    /// The registry JSON is malformed or missing required fields.
    #[error("invalid registry JSON: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
    },

    /// The registry version is not supported.
    #[error("unsupported registry version: expected {expected}, found {actual}")]
    UnsupportedVersion {
        /// Expected version number.
        expected: u32,
        /// Actual version found in the registry.
        actual: u32,
    },

    /// The registry declares no blueprints.
    #[error("registry contains no blueprints")]
    EmptyBlueprints,

    /// Two blueprints share a name.
    #[error("blueprint '{name}' is declared more than once")]
    DuplicateBlueprint {
        /// The repeated blueprint name.
        name: String,
    },

    /// The requested blueprint was not found in the registry.
    #[error("blueprint '{name}' not found in registry")]
    BlueprintNotFound {
        /// The blueprint name that was not found.
        name: String,
    },

    /// A field used a `$` directive the registry does not understand.
    #[error("unknown directive '{directive}' in field '{blueprint}.{field}'")]
    UnknownDirective {
        /// Blueprint declaring the field.
        blueprint: String,
        /// Field carrying the directive.
        field: String,
        /// The unrecognised directive key.
        directive: String,
    },

    /// A directive payload had the wrong shape.
    #[error("invalid directive in field '{blueprint}.{field}': {message}")]
    InvalidDirective {
        /// Blueprint declaring the field.
        blueprint: String,
        /// Field carrying the directive.
        field: String,
        /// Description of the payload problem.
        message: String,
    },

    /// A `$fake` directive named an unsupported fake kind.
    #[error("unknown fake kind '{kind}' in field '{blueprint}.{field}'")]
    UnknownFakeKind {
        /// Blueprint declaring the field.
        blueprint: String,
        /// Field carrying the directive.
        field: String,
        /// The unsupported kind.
        kind: String,
    },

    /// A `$factory` or `$many` directive referenced a missing blueprint.
    #[error("field '{blueprint}.{field}' references unknown blueprint '{target}'")]
    UnknownReference {
        /// Blueprint declaring the field.
        blueprint: String,
        /// Field carrying the reference.
        field: String,
        /// The missing blueprint name.
        target: String,
    },

    /// Blueprint references form a cycle and could never finish evaluating.
    #[error("blueprint '{name}' is part of a reference cycle")]
    ReferenceCycle {
        /// A blueprint on the cycle.
        name: String,
    },

    /// A directive was well formed but its configuration was rejected.
    #[error("invalid definition in field '{blueprint}.{field}': {source}")]
    Definition {
        /// Blueprint declaring the field.
        blueprint: String,
        /// Field carrying the directive.
        field: String,
        /// The underlying descriptor error.
        #[source]
        source: DefinitionError,
    },
}
