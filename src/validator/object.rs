//! Declared-rule container and the traversal that runs it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{EngineError, ValidationFailure, ValidationResult};
use crate::rules::{ChildValidatorAdaptor, PropertyValidatorContext, RuleExecutor};
use crate::selector::RuleDescriptor;
use crate::validation::{ModelRef, ValidationContext};

use super::{Validator, ValidatorHandle, ValidatorOptions};

type ChildGetter<T> = Arc<dyn for<'x> Fn(&'x T) -> Option<ModelRef<'x>> + Send + Sync>;
type ElementsGetter<T> = Arc<dyn for<'x> Fn(&'x T) -> Vec<ModelRef<'x>> + Send + Sync>;

fn child_getter<T, F>(getter: F) -> ChildGetter<T>
where
    F: for<'x> Fn(&'x T) -> Option<ModelRef<'x>> + Send + Sync + 'static,
{
    Arc::new(getter)
}

fn elements_getter<T, F>(getter: F) -> ElementsGetter<T>
where
    F: for<'x> Fn(&'x T) -> Vec<ModelRef<'x>> + Send + Sync + 'static,
{
    Arc::new(getter)
}

enum RuleKind<T> {
    Body(RuleExecutor<T>),
    Child {
        getter: ChildGetter<T>,
        adaptor: ChildValidatorAdaptor,
    },
    Collection {
        elements: ElementsGetter<T>,
        adaptor: ChildValidatorAdaptor,
    },
}

struct DeclaredRule<T> {
    property_name: Option<String>,
    rule_sets: Vec<String>,
    kind: RuleKind<T>,
}

impl<T> DeclaredRule<T> {
    fn descriptor(&self) -> RuleDescriptor<'_> {
        RuleDescriptor {
            property_name: self.property_name.as_deref(),
            rule_sets: &self.rule_sets,
            is_child_dispatch: !matches!(self.kind, RuleKind::Body(_)),
        }
    }

    fn name(&self) -> &str {
        self.property_name.as_deref().unwrap_or_default()
    }

    /// Full path of the rule in `ctx`; model-level rules sit at the chain itself.
    fn path(&self, ctx: &ValidationContext<'_>) -> String {
        match &self.property_name {
            Some(name) => ctx.property_path(name),
            None => ctx.property_chain().to_string(),
        }
    }
}

/// Validator for model type `T` built from declared rules.
///
/// Rules run in declaration order and every failure is collected; a failing
/// rule never stops the ones after it. Nested values are dispatched to other
/// validators through [`ChildValidatorAdaptor`], extending the property chain
/// as the traversal descends.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use inquest::ObjectValidator;
///
/// struct Address { city: String }
/// struct Customer { name: String, address: Option<Address> }
///
/// let address = ObjectValidator::<Address>::new().rule("City", |a, ctx| {
///     if a.city.is_empty() { vec![ctx.failure("City", "required")] } else { vec![] }
/// });
///
/// let customer = ObjectValidator::<Customer>::new()
///     .rule("Name", |c, ctx| {
///         if c.name.is_empty() { vec![ctx.failure("Name", "required")] } else { vec![] }
///     })
///     .child("Address", |c: &Customer| c.address.as_ref(), Arc::new(address));
///
/// let model = Customer {
///     name: String::new(),
///     address: Some(Address { city: String::new() }),
/// };
/// let result = customer.validate(&model).unwrap();
/// assert_eq!(result.property_names(), ["Name", "Address.City"]);
/// ```
pub struct ObjectValidator<T> {
    rules: Vec<DeclaredRule<T>>,
    rule_set_stack: Vec<String>,
}

impl<T: Any + Send + Sync> ObjectValidator<T> {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            rule_set_stack: Vec::new(),
        }
    }

    fn push(mut self, property_name: Option<String>, kind: RuleKind<T>) -> Self {
        self.rules.push(DeclaredRule {
            property_name,
            rule_sets: self.rule_set_stack.clone(),
            kind,
        });
        self
    }

    /// Adds a synchronous rule for `property_name`.
    pub fn rule<F>(self, property_name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&T, &ValidationContext<'_>) -> Vec<ValidationFailure> + Send + Sync + 'static,
    {
        self.push(
            Some(property_name.into()),
            RuleKind::Body(RuleExecutor::sync(body)),
        )
    }

    /// Adds an asynchronous rule for `property_name`.
    pub fn rule_async<F>(self, property_name: impl Into<String>, body: F) -> Self
    where
        F: for<'a> Fn(&'a T, &'a ValidationContext<'a>, CancellationToken) -> BoxFuture<'a, Vec<ValidationFailure>>
            + Send
            + Sync
            + 'static,
    {
        self.push(
            Some(property_name.into()),
            RuleKind::Body(RuleExecutor::asynchronous(body)),
        )
    }

    /// Adds a rule on the model as a whole.
    pub fn model_rule(self, body: RuleExecutor<T>) -> Self {
        self.push(None, RuleKind::Body(body))
    }

    /// Validates an optional nested value with a fixed validator.
    pub fn child<C, F>(self, property_name: impl Into<String>, getter: F, validator: ValidatorHandle) -> Self
    where
        C: Any + Send + Sync,
        F: for<'x> Fn(&'x T) -> Option<&'x C> + Send + Sync + 'static,
    {
        let getter = child_getter(move |model: &T| getter(model).map(ModelRef::new));
        self.push(
            Some(property_name.into()),
            RuleKind::Child {
                getter,
                adaptor: ChildValidatorAdaptor::new(validator),
            },
        )
    }

    /// Validates an optional nested value with a validator chosen at runtime.
    pub fn child_with<F, P>(self, property_name: impl Into<String>, getter: F, provider: P) -> Self
    where
        F: for<'x> Fn(&'x T) -> Option<ModelRef<'x>> + Send + Sync + 'static,
        P: Fn(ModelRef<'_>) -> Option<ValidatorHandle> + Send + Sync + 'static,
    {
        self.push(
            Some(property_name.into()),
            RuleKind::Child {
                getter: child_getter(getter),
                adaptor: ChildValidatorAdaptor::with_provider(provider, "provider"),
            },
        )
    }

    /// Validates every element of a collection with a fixed validator.
    ///
    /// Element failures are reported under `name[index]`.
    pub fn children<C, F>(self, property_name: impl Into<String>, getter: F, validator: ValidatorHandle) -> Self
    where
        C: Any + Send + Sync,
        F: for<'x> Fn(&'x T) -> &'x [C] + Send + Sync + 'static,
    {
        let elements = elements_getter(move |model: &T| getter(model).iter().map(ModelRef::new).collect());
        self.push(
            Some(property_name.into()),
            RuleKind::Collection {
                elements,
                adaptor: ChildValidatorAdaptor::new(validator),
            },
        )
    }

    /// Validates every element of a collection with a validator chosen per element.
    pub fn children_with<F, P>(self, property_name: impl Into<String>, getter: F, provider: P) -> Self
    where
        F: for<'x> Fn(&'x T) -> Vec<ModelRef<'x>> + Send + Sync + 'static,
        P: Fn(ModelRef<'_>) -> Option<ValidatorHandle> + Send + Sync + 'static,
    {
        self.push(
            Some(property_name.into()),
            RuleKind::Collection {
                elements: elements_getter(getter),
                adaptor: ChildValidatorAdaptor::with_provider(provider, "provider"),
            },
        )
    }

    /// Tags every rule declared inside `declare` with the rule set `name`.
    ///
    /// Rule sets nest: a rule declared inside two calls belongs to both.
    pub fn rule_set<F>(mut self, name: impl Into<String>, declare: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.rule_set_stack.push(name.into());
        let mut this = declare(self);
        this.rule_set_stack.pop();
        this
    }

    /// Number of declared rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validates `model` with the default selector.
    pub fn validate(&self, model: &T) -> Result<ValidationResult, EngineError> {
        self.run(&ValidationContext::new(model))
    }

    /// Validates `model` with the selector and root data from `options`.
    pub fn validate_with(&self, model: &T, options: &ValidatorOptions) -> Result<ValidationResult, EngineError> {
        self.run(&options.build_context(model))
    }

    /// Validates `model` asynchronously with the default selector.
    pub async fn validate_async(
        &self,
        model: &T,
        cancel: CancellationToken,
    ) -> Result<ValidationResult, EngineError> {
        let ctx = ValidationContext::new(model).as_async();
        self.run_async(&ctx, cancel).await
    }

    /// Validates `model` asynchronously with the selector and root data from `options`.
    pub async fn validate_async_with(
        &self,
        model: &T,
        options: &ValidatorOptions,
        cancel: CancellationToken,
    ) -> Result<ValidationResult, EngineError> {
        let ctx = options.build_context(model).as_async();
        self.run_async(&ctx, cancel).await
    }

    /// Validates independent models in parallel, one run each.
    ///
    /// Results keep the order of `models`.
    pub fn validate_batch(&self, models: &[T]) -> Vec<Result<ValidationResult, EngineError>> {
        models.par_iter().map(|model| self.validate(model)).collect()
    }

    fn is_selected(&self, rule: &DeclaredRule<T>, ctx: &ValidationContext<'_>) -> bool {
        let path = rule.path(ctx);
        let selected = ctx.selector().can_execute(&rule.descriptor(), &path, ctx);
        if !selected {
            trace!(path = %path, "rule skipped by selector");
        }
        selected
    }

    fn finish(&self, failures: Vec<ValidationFailure>, ctx: &ValidationContext<'_>) -> ValidationResult {
        ValidationResult::new(failures).with_rule_sets(ctx.selector().rule_sets())
    }

    /// Positional frame for element `index` of the collection `name`.
    fn element_context<'a>(
        ctx: &ValidationContext<'_>,
        name: &str,
        index: usize,
        element: ModelRef<'a>,
    ) -> ValidationContext<'a> {
        let mut element_ctx = ctx.derive_for_child_collection_validator(element);
        let chain = element_ctx.property_chain_mut();
        chain.add_chain(ctx.property_chain());
        chain.add(name);
        chain.add_indexer(index);
        element_ctx
    }

    fn run(&self, ctx: &ValidationContext<'_>) -> Result<ValidationResult, EngineError> {
        let model = ctx.model_as::<T>()?;
        debug!(
            model = std::any::type_name::<T>(),
            path = %ctx.property_chain(),
            is_async = false,
            rules = self.rules.len(),
            "running validator"
        );

        let mut failures = Vec::new();
        for rule in &self.rules {
            if !self.is_selected(rule, ctx) {
                continue;
            }
            match &rule.kind {
                RuleKind::Body(executor) => failures.extend(executor.execute(ctx)?),
                RuleKind::Child { getter, adaptor } => {
                    let property = PropertyValidatorContext::new(ctx, rule.name(), getter(model));
                    failures.extend(adaptor.validate(&property)?);
                }
                RuleKind::Collection { elements, adaptor } => {
                    for (index, element) in elements(model).into_iter().enumerate() {
                        let element_ctx = Self::element_context(ctx, rule.name(), index, element);
                        let property = PropertyValidatorContext::new(&element_ctx, rule.name(), Some(element));
                        failures.extend(adaptor.validate(&property)?);
                    }
                }
            }
        }
        Ok(self.finish(failures, ctx))
    }

    async fn run_async(
        &self,
        ctx: &ValidationContext<'_>,
        cancel: CancellationToken,
    ) -> Result<ValidationResult, EngineError> {
        let model = ctx.model_as::<T>()?;
        debug!(
            model = std::any::type_name::<T>(),
            path = %ctx.property_chain(),
            is_async = true,
            rules = self.rules.len(),
            "running validator"
        );

        let mut failures = Vec::new();
        for rule in &self.rules {
            check_cancelled(&cancel, ctx)?;
            if !self.is_selected(rule, ctx) {
                continue;
            }
            match &rule.kind {
                RuleKind::Body(executor) => {
                    if executor.should_run_async(ctx) {
                        failures.extend(executor.execute_async(ctx, cancel.clone()).await?);
                    } else {
                        failures.extend(executor.execute(ctx)?);
                    }
                }
                RuleKind::Child { getter, adaptor } => {
                    let property = PropertyValidatorContext::new(ctx, rule.name(), getter(model));
                    if adaptor.should_run_async(ctx) {
                        failures.extend(adaptor.validate_async(&property, cancel.clone()).await?);
                    } else {
                        failures.extend(adaptor.validate(&property)?);
                    }
                }
                RuleKind::Collection { elements, adaptor } => {
                    for (index, element) in elements(model).into_iter().enumerate() {
                        check_cancelled(&cancel, ctx)?;
                        let element_ctx = Self::element_context(ctx, rule.name(), index, element);
                        let property = PropertyValidatorContext::new(&element_ctx, rule.name(), Some(element));
                        if adaptor.should_run_async(&element_ctx) {
                            failures.extend(adaptor.validate_async(&property, cancel.clone()).await?);
                        } else {
                            failures.extend(adaptor.validate(&property)?);
                        }
                    }
                }
            }
        }
        check_cancelled(&cancel, ctx)?;
        Ok(self.finish(failures, ctx))
    }
}

fn check_cancelled(cancel: &CancellationToken, ctx: &ValidationContext<'_>) -> Result<(), EngineError> {
    if cancel.is_cancelled() {
        warn!(path = %ctx.property_chain(), "validation cancelled");
        return Err(EngineError::Cancelled);
    }
    Ok(())
}

impl<T: Any + Send + Sync> Default for ObjectValidator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ObjectValidator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectValidator")
            .field("model", &std::any::type_name::<T>())
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl<T: Any + Send + Sync> Validator for ObjectValidator<T> {
    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<ValidationResult, EngineError> {
        self.run(ctx)
    }

    fn validate_async<'a>(
        &'a self,
        ctx: &'a ValidationContext<'a>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<ValidationResult, EngineError>> {
        async move {
            if ctx.is_async() {
                self.run_async(ctx, cancel).await
            } else {
                let ctx = ctx.as_async();
                self.run_async(&ctx, cancel).await
            }
        }
        .boxed()
    }

    fn can_validate(&self, model: ModelRef<'_>) -> bool {
        model.is::<T>()
    }

    fn model_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}
