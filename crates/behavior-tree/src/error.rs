//! Error types surfaced by the behavior tree engine.
//!
//! A `Failure` node result is never an error. These variants cover
//! programmer mistakes (bad construction arguments, blackboard type
//! contract violations, structural mutation of a running tree) and errors
//! raised from inside user callbacks, which propagate out of `tick`.
use thiserror::Error;

use crate::blackboard::BlackboardKey;

pub type Result<T> = std::result::Result<T, BehaviorTreeError>;

#[derive(Debug, Error)]
pub enum BehaviorTreeError {
    #[error("required argument `{name}` is missing")]
    MissingArgument { name: &'static str },

    #[error("argument `{name}` = {value} is out of range: {reason}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("blackboard key {key} not found")]
    KeyNotFound { key: BlackboardKey },

    #[error("blackboard key {key} is bound to `{bound}`, not `{requested}`")]
    TypeMismatch {
        key: BlackboardKey,
        bound: &'static str,
        requested: &'static str,
    },

    #[error("invalid state: {reason}")]
    InvalidState { reason: &'static str },

    #[error("node callback failed")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BehaviorTreeError {
    /// Wraps an arbitrary error raised inside an action callback.
    pub fn callback(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Callback(error.into())
    }

    pub(crate) fn out_of_range(
        name: &'static str,
        value: impl Into<f64>,
        reason: &'static str,
    ) -> Self {
        Self::OutOfRange {
            name,
            value: value.into(),
            reason,
        }
    }
}
