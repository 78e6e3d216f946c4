//! Typed errors for model parsing and forest construction.
//!
//! Construction never terminates the process: every invalid-input condition
//! surfaces as a variant here so embedding callers can recover.

use thiserror::Error;

use crate::expr::ExprError;

#[derive(Error, Debug)]
pub enum Error {
    /// A node names a child that does not exist in the definition mapping.
    #[error("missing node: '{name}' (referenced by '{referenced_by}')")]
    MissingNode { name: String, referenced_by: String },

    /// One of the cash/days/repeat expressions failed to evaluate.
    #[error("bad {field} expression for node '{node}': {source}")]
    Expression {
        node: String,
        field: &'static str,
        source: ExprError,
    },

    /// The repeat expression evaluated, but not to an exact integer.
    #[error("repeat must evaluate to an integer for node '{node}', got {value}")]
    InvalidRepeat { node: String, value: f64 },

    /// A node is reachable as its own descendant. Detected on the raw
    /// name-reference graph before any construction happens.
    #[error("cyclic node definitions involving '{name}'")]
    CyclicDefinition { name: String },

    #[error("invalid YAML document")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON document")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
