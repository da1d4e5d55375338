//! Validator registry: model types mapped to the validators that check them.
//!
//! This module provides the [`ValidatorRegistry`] type that stores one
//! validator per model type and resolves them at runtime, both for direct
//! validation and as the provider behind polymorphic nested dispatch.

use std::any::{Any, TypeId};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::{EngineError, ValidationResult};
use crate::validation::{ModelRef, ValidationContext};
use crate::validator::{Validator, ValidatorHandle};

struct Registration {
    model_type: &'static str,
    validator: ValidatorHandle,
}

/// Type alias for the validator storage map.
type ValidatorMap = Arc<RwLock<IndexMap<TypeId, Registration>>>;

/// One model type paired with the validator registered for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanResult {
    /// Name of the model type.
    pub model_type: &'static str,
    /// Name of the validator type.
    pub validator_type: &'static str,
}

/// A thread-safe registry of validators keyed by model type.
///
/// # Thread Safety
///
/// Storage sits behind `Arc<RwLock<...>>`:
/// - Lookups from many threads proceed concurrently
/// - Registrations are serialized
/// - Clones share the same storage
///
/// # Example
///
/// ```rust
/// use inquest::{ObjectValidator, ValidatorRegistry};
///
/// struct User { email: String }
///
/// let registry = ValidatorRegistry::new();
/// registry
///     .register::<User>(ObjectValidator::<User>::new().rule("Email", |u, ctx| {
///         if u.email.contains('@') { vec![] } else { vec![ctx.failure("Email", "invalid")] }
///     }))
///     .unwrap();
///
/// let result = registry.validate(&User { email: "nope".into() }).unwrap();
/// assert_eq!(result.property_names(), ["Email"]);
/// ```
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: ValidatorMap,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `validator` as the validator for model type `T`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateModel` if `T` already has a validator.
    pub fn register<T: Any + Send + Sync>(
        &self,
        validator: impl Validator + 'static,
    ) -> Result<(), RegistryError> {
        self.register_handle::<T>(Arc::new(validator))
    }

    /// Registers an already shared validator for model type `T`.
    pub fn register_handle<T: Any + Send + Sync>(
        &self,
        validator: ValidatorHandle,
    ) -> Result<(), RegistryError> {
        let model_type = std::any::type_name::<T>();
        let mut validators = self.validators.write();

        if validators.contains_key(&TypeId::of::<T>()) {
            return Err(RegistryError::DuplicateModel(model_type));
        }

        tracing::debug!(
            model = model_type,
            validator = validator.validator_type_name(),
            "registered validator"
        );
        validators.insert(
            TypeId::of::<T>(),
            Registration {
                model_type,
                validator,
            },
        );
        Ok(())
    }

    /// Lists every registration in registration order.
    pub fn scan(&self) -> Vec<ScanResult> {
        self.validators
            .read()
            .values()
            .map(|r| ScanResult {
                model_type: r.model_type,
                validator_type: r.validator.validator_type_name(),
            })
            .collect()
    }

    /// Retrieves the validator for the runtime type of `model`.
    pub fn get_for(&self, model: ModelRef<'_>) -> Option<ValidatorHandle> {
        self.validators
            .read()
            .get(&model.type_id())
            .map(|r| Arc::clone(&r.validator))
    }

    /// Retrieves the validator for `T`.
    pub fn get<T: Any>(&self) -> Option<ValidatorHandle> {
        self.validators
            .read()
            .get(&TypeId::of::<T>())
            .map(|r| Arc::clone(&r.validator))
    }

    pub fn len(&self) -> usize {
        self.validators.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.read().is_empty()
    }

    /// A provider resolving nested validators through this registry.
    ///
    /// Values whose type has no registration are skipped, not failed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use inquest::{ModelRef, ObjectValidator, ValidatorRegistry};
    ///
    /// struct Card { number: String }
    /// struct Payment { method: Card }
    ///
    /// let registry = ValidatorRegistry::new();
    /// registry
    ///     .register::<Card>(ObjectValidator::<Card>::new().rule("Number", |c, ctx| {
    ///         if c.number.len() == 16 { vec![] } else { vec![ctx.failure("Number", "16 digits")] }
    ///     }))
    ///     .unwrap();
    ///
    /// let payment = ObjectValidator::<Payment>::new().child_with(
    ///     "Method",
    ///     |p: &Payment| Some(ModelRef::new(&p.method)),
    ///     registry.provider(),
    /// );
    ///
    /// let result = payment.validate(&Payment { method: Card { number: "1".into() } }).unwrap();
    /// assert_eq!(result.property_names(), ["Method.Number"]);
    /// ```
    pub fn provider(&self) -> impl Fn(ModelRef<'_>) -> Option<ValidatorHandle> + Send + Sync + 'static {
        let registry = self.clone();
        move |value: ModelRef<'_>| registry.get_for(value)
    }

    /// Validates `model` with the validator registered for `T`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ValidatorNotFound` if `T` has no validator, or
    /// `RegistryError::Engine` if the run itself fails.
    pub fn validate<T: Any + Send + Sync>(&self, model: &T) -> Result<ValidationResult, RegistryError> {
        let validator = self.require::<T>()?;
        let ctx = ValidationContext::new(model);
        Ok(validator.validate(&ctx)?)
    }

    /// Validates `model` asynchronously with the validator registered for `T`.
    pub async fn validate_async<T: Any + Send + Sync>(
        &self,
        model: &T,
        cancel: CancellationToken,
    ) -> Result<ValidationResult, RegistryError> {
        let validator = self.require::<T>()?;
        let ctx = ValidationContext::new(model).as_async();
        Ok(validator.validate_async(&ctx, cancel).await?)
    }

    fn require<T: Any>(&self) -> Result<ValidatorHandle, RegistryError> {
        self.get::<T>()
            .ok_or(RegistryError::ValidatorNotFound(std::any::type_name::<T>()))
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.scan()).finish()
    }
}

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Attempted to register a second validator for the same model type.
    #[error("validator for '{0}' already registered")]
    DuplicateModel(&'static str),

    /// Attempted to validate a model type with no registered validator.
    #[error("no validator registered for '{0}'")]
    ValidatorNotFound(&'static str),

    /// The validation run itself failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
