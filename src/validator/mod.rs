//! Validators: the type-erased contract and the rule-set container.
//!
//! [`Validator`] is what nested dispatch talks to: it validates whatever model
//! the context carries. [`ObjectValidator`] is the concrete container of
//! declared rules for one model type.

mod object;
mod options;

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::error::{EngineError, ValidationResult};
use crate::validation::{ModelRef, ValidationContext};

pub use object::ObjectValidator;
pub use options::ValidatorOptions;

/// Shared handle to a type-erased validator.
pub type ValidatorHandle = Arc<dyn Validator>;

/// A validator for the model carried by a [`ValidationContext`].
///
/// Implementations must accept both calling conventions. Data problems go in
/// the returned [`ValidationResult`]; an `Err` means the call itself was
/// invalid or cancelled.
pub trait Validator: Send + Sync {
    /// Validates the context's model synchronously.
    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<ValidationResult, EngineError>;

    /// Validates the context's model asynchronously, observing `cancel`.
    fn validate_async<'a>(
        &'a self,
        ctx: &'a ValidationContext<'a>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<ValidationResult, EngineError>>;

    /// Returns true if this validator accepts `model`'s type.
    fn can_validate(&self, model: ModelRef<'_>) -> bool;

    /// Name of the model type this validator checks.
    fn model_type_name(&self) -> &'static str;

    /// Name of the validator's own type.
    fn validator_type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
