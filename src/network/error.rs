//! Network Error Module
//!
//! Errors raised while building, validating or modifying a reaction network.
//! All of them are construction-time errors: a network that failed to build is
//! never partially usable.

use thiserror::Error;

use crate::expression::ExpressionError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// A rate law, rule, compartment size or stoichiometry entry references an
    /// identifier that is not declared anywhere in the network.
    #[error("Unresolved reference '{identifier}' in {location}")]
    UnresolvedReference {
        identifier: String,
        location: String,
    },

    /// The same identifier is declared more than once.
    #[error("Identifier '{identifier}' is declared more than once ({location})")]
    DuplicateIdentifier {
        identifier: String,
        location: String,
    },

    /// An expression could not be parsed or compiled.
    #[error("Invalid expression in {location}: {source}")]
    InvalidExpression {
        location: String,
        #[source]
        source: ExpressionError,
    },

    /// A reaction equation string could not be parsed.
    #[error("Invalid reaction equation '{equation}': {message}")]
    InvalidEquation { equation: String, message: String },

    /// Assignment rules and fluxes depend on each other in a cycle.
    #[error("Cyclic dependency between {0}")]
    CyclicDependency(String),

    /// The override target is unknown or cannot be overridden.
    #[error("Cannot override '{name}': {reason}")]
    InvalidOverride { name: String, reason: String },

    /// Any other definition problem reported by the consistency check.
    #[error("Invalid network definition: {0}")]
    InvalidDefinition(String),

    /// A builder was finalized without a required field.
    #[error("Builder error: {0}")]
    Builder(String),
}

impl From<derive_builder::UninitializedFieldError> for NetworkError {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        NetworkError::Builder(err.to_string())
    }
}

impl From<String> for NetworkError {
    fn from(message: String) -> Self {
        NetworkError::Builder(message)
    }
}
