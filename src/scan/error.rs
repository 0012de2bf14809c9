use thiserror::Error;

use crate::network::error::NetworkError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("Invalid scan axis '{0}'. Expected 'name=from:to:n' or 'name=v1,v2,...'")]
    InvalidAxis(String),

    #[error("Scan axis '{name}' has no values")]
    EmptyAxis { name: String },

    #[error("Variable '{0}' is scanned more than once")]
    DuplicateAxis(String),

    #[error("Collection holds {found} outcomes but its grid has {expected} points")]
    OutcomeCount { expected: usize, found: usize },

    #[error("Variable '{0}' is not part of any completed run")]
    UnknownVariable(String),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Cannot scan '{name}': {source}")]
    Override {
        name: String,
        #[source]
        source: NetworkError,
    },
}
