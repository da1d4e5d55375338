//! Errors that abort a validation call.

/// A fault in how the engine is being driven, as opposed to a problem with the data.
///
/// These are never folded into a [`ValidationResult`](crate::ValidationResult).
/// A contract violation means the API is being misused; cancellation means the
/// caller asked the run to stop.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Nested dispatch was driven by a scope that is not a `ValidationContext`.
    #[error("incorrect context type for use with child validators: expected ValidationContext, actual was {actual}")]
    IncompatibleContext { actual: &'static str },

    /// A rule or validator was handed a model of the wrong type.
    #[error("model type mismatch: expected {expected}, actual was {actual}")]
    ModelTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// The run observed a cancellation request.
    #[error("validation was cancelled")]
    Cancelled,

    /// The blocking adapter could not start a runtime for an async rule body.
    #[error("failed to start runtime for async rule body: {0}")]
    Runtime(#[from] std::io::Error),
}

impl EngineError {
    /// Returns true for programming errors (wrong context or model type).
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            EngineError::IncompatibleContext { .. } | EngineError::ModelTypeMismatch { .. }
        )
    }

    /// Returns true if the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Cancelled)
    }
}
