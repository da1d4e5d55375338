//! Nested validator dispatch.
//!
//! [`ChildValidatorAdaptor`] treats "validate this nested value with another
//! validator" as a property rule. It derives a child context from the parent,
//! extends the chain with the owning property name, delegates, and hands the
//! nested failures back unchanged.

use std::fmt;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::error::{EngineError, ValidationFailure};
use crate::validation::{ModelRef, ValidationContext, ValidationScope};
use crate::validator::ValidatorHandle;

/// Resolves the validator for a property value at runtime, or None to skip it.
pub type ValidatorProvider = Arc<dyn Fn(ModelRef<'_>) -> Option<ValidatorHandle> + Send + Sync>;

/// Everything the adaptor needs to know about the property being dispatched.
#[derive(Clone, Copy)]
pub struct PropertyValidatorContext<'c> {
    parent: &'c dyn ValidationScope,
    property_name: &'c str,
    property_value: Option<ModelRef<'c>>,
}

impl<'c> PropertyValidatorContext<'c> {
    pub fn new(
        parent: &'c dyn ValidationScope,
        property_name: &'c str,
        property_value: Option<ModelRef<'c>>,
    ) -> Self {
        Self {
            parent,
            property_name,
            property_value,
        }
    }

    pub fn parent(&self) -> &'c dyn ValidationScope {
        self.parent
    }

    pub fn property_name(&self) -> &'c str {
        self.property_name
    }

    pub fn property_value(&self) -> Option<ModelRef<'c>> {
        self.property_value
    }
}

/// Dispatches a property value to a nested validator.
///
/// Either wraps a fixed validator or a provider that picks one from the
/// runtime value (for instance one validator per enum variant or per
/// concrete type registered in a [`ValidatorRegistry`](crate::ValidatorRegistry)).
///
/// A missing property value or a provider that resolves nothing produces no
/// failures. A parent scope that is not a [`ValidationContext`] is a contract
/// violation and aborts the call.
#[derive(Clone)]
pub struct ChildValidatorAdaptor {
    provider: ValidatorProvider,
    validator_type: &'static str,
}

impl ChildValidatorAdaptor {
    /// Wraps a fixed nested validator.
    pub fn new(validator: ValidatorHandle) -> Self {
        let validator_type = validator.validator_type_name();
        Self {
            provider: Arc::new(move |_: ModelRef<'_>| Some(Arc::clone(&validator))),
            validator_type,
        }
    }

    /// Wraps a provider that chooses the nested validator per value.
    pub fn with_provider<P>(provider: P, validator_type: &'static str) -> Self
    where
        P: Fn(ModelRef<'_>) -> Option<ValidatorHandle> + Send + Sync + 'static,
    {
        Self {
            provider: Arc::new(provider),
            validator_type,
        }
    }

    /// Name of the nested validator type (or the label given to the provider).
    pub fn validator_type(&self) -> &'static str {
        self.validator_type
    }

    /// Resolves the nested validator for `value`.
    pub fn get_validator(&self, value: ModelRef<'_>) -> Option<ValidatorHandle> {
        (self.provider)(value)
    }

    /// Validates the property value synchronously.
    pub fn validate(
        &self,
        context: &PropertyValidatorContext<'_>,
    ) -> Result<Vec<ValidationFailure>, EngineError> {
        match self.prepare(context)? {
            Some((validator, child)) => Ok(validator.validate(&child)?.into_errors()),
            None => Ok(Vec::new()),
        }
    }

    /// Validates the property value asynchronously.
    ///
    /// `cancel` is handed to the nested validator; a cancelled nested run
    /// surfaces as [`EngineError::Cancelled`].
    pub fn validate_async<'c>(
        &'c self,
        context: &PropertyValidatorContext<'c>,
        cancel: CancellationToken,
    ) -> BoxFuture<'c, Result<Vec<ValidationFailure>, EngineError>> {
        let prepared = match self.prepare(context) {
            Ok(prepared) => prepared,
            Err(e) => return future::ready(Err(e)).boxed(),
        };
        async move {
            let Some((validator, child)) = prepared else {
                return Ok(Vec::new());
            };
            let result = validator.validate_async(&child, cancel).await?;
            Ok(result.into_errors())
        }
        .boxed()
    }

    /// The adaptor has no preference of its own; the run decides.
    pub fn should_run_async(&self, scope: &dyn ValidationScope) -> bool {
        scope.is_async()
    }

    fn prepare<'c>(
        &self,
        context: &PropertyValidatorContext<'c>,
    ) -> Result<Option<(ValidatorHandle, ValidationContext<'c>)>, EngineError> {
        let Some(value) = context.property_value() else {
            return Ok(None);
        };

        let Some(validator) = self.get_validator(value) else {
            trace!(property = context.property_name(), "no nested validator resolved");
            return Ok(None);
        };

        let child = Self::child_context(context, value)?;
        trace!(
            path = %child.property_chain(),
            validator = validator.validator_type_name(),
            "dispatching to nested validator"
        );
        Ok(Some((validator, child)))
    }

    fn child_context<'c>(
        context: &PropertyValidatorContext<'c>,
        value: ModelRef<'c>,
    ) -> Result<ValidationContext<'c>, EngineError> {
        let parent = context.parent();
        let Some(parent_context) = parent.as_validation_context() else {
            warn!(
                actual = parent.scope_type_name(),
                "child validator driven by an incompatible context"
            );
            return Err(EngineError::IncompatibleContext {
                actual: parent.scope_type_name(),
            });
        };

        let mut child = parent_context.derive_for_child_validator(value);
        // Collection elements already carry their positional name.
        if !parent_context.is_child_collection_context() {
            child.property_chain_mut().add(context.property_name());
        }
        Ok(child)
    }
}

impl fmt::Debug for ChildValidatorAdaptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildValidatorAdaptor")
            .field("validator_type", &self.validator_type)
            .finish()
    }
}
