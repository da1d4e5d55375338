//! Validation context and the state threaded through a run.
//!
//! This module provides [`ValidationContext`], one frame of a validation run:
//! the model under validation, the [`PropertyChain`] locating it, the
//! [`ValidatorSelector`] deciding which rules run, and the [`RootContextData`]
//! shared by every frame of the run.
//!
//! Frames are produced only through the constructors and derivation methods
//! here. Deriving copies the chain and shares the selector and root data:
//!
//! ```rust
//! use inquest::{ModelRef, ValidationContext};
//!
//! struct Order { id: u32 }
//! struct Customer { name: String }
//!
//! let order = Order { id: 42 };
//! let customer = Customer { name: "Ada".into() };
//!
//! let root = ValidationContext::new(&order);
//! let mut child = root.derive_for_child_validator(ModelRef::new(&customer));
//! child.property_chain_mut().add("Customer");
//!
//! assert!(root.property_chain().is_empty());
//! assert_eq!(child.property_chain().to_string(), "Customer");
//! assert!(child.root_context_data().shares_storage_with(root.root_context_data()));
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{EngineError, ValidationFailure};
use crate::path::PropertyChain;
use crate::selector::{DefaultSelector, ValidatorSelector};

/// A type-erased model instance.
pub type Model = dyn Any + Send + Sync + 'static;

/// A borrowed, type-erased reference to the instance being validated.
///
/// Keeps the concrete type name alongside the erased reference so that type
/// mismatches can be reported precisely.
#[derive(Clone, Copy)]
pub struct ModelRef<'a> {
    value: &'a Model,
    type_name: &'static str,
}

impl<'a> ModelRef<'a> {
    /// Erases a typed reference.
    pub fn new<T: Any + Send + Sync>(value: &'a T) -> Self {
        Self {
            value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Returns the typed reference if the model is a `T`.
    pub fn downcast<T: Any>(&self) -> Option<&'a T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns true if the model is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Returns the runtime type identifier of the model.
    pub fn type_id(&self) -> TypeId {
        (*self.value).type_id()
    }

    /// Returns the concrete type name of the model.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the erased reference.
    pub fn as_any(&self) -> &'a Model {
        self.value
    }
}

impl fmt::Debug for ModelRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRef")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Key/value metadata shared by reference across every context of one run.
///
/// Cloning a `RootContextData` yields another handle to the same map, so a
/// value written by a nested validator is visible to its siblings and to the
/// root once the nested call returns. This is how run-wide signals (such as
/// "already validated this instance") travel across subtrees.
///
/// Traversal within a run is sequential; the lock only makes the map safe to
/// hand to hosts that fan out across threads.
#[derive(Debug, Clone, Default)]
pub struct RootContextData(Arc<RwLock<IndexMap<String, Value>>>);

impl RootContextData {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map seeded with the given entries.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self(Arc::new(RwLock::new(map)))
    }

    /// Inserts a value, returning the previous one for the key.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.write().insert(key.into(), value.into())
    }

    /// Returns a copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.read().get(key).cloned()
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.read().contains_key(key)
    }

    /// Removes `key`, preserving the order of the remaining entries.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.write().shift_remove(key)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Returns the keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.0.read().keys().cloned().collect()
    }

    /// Returns a point-in-time copy of the whole map.
    pub fn snapshot(&self) -> IndexMap<String, Value> {
        self.0.read().clone()
    }

    /// Returns true if both handles point at the same map.
    pub fn shares_storage_with(&self, other: &RootContextData) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// The host-facing view of a validation frame.
///
/// Hosts other than the engine may implement this to drive rule bodies, but
/// nested dispatch needs the chain and selector plumbing that only
/// [`ValidationContext`] carries. [`as_validation_context`] is the capability
/// check the dispatch boundary uses.
///
/// [`as_validation_context`]: ValidationScope::as_validation_context
pub trait ValidationScope: Send + Sync {
    /// The instance being validated in this frame.
    fn model(&self) -> ModelRef<'_>;

    /// Run-wide shared metadata.
    fn root_context_data(&self) -> &RootContextData;

    /// Whether the caller of the run asked for asynchronous execution.
    fn is_async(&self) -> bool;

    /// Name of the concrete scope type, used in contract-violation reports.
    fn scope_type_name(&self) -> &'static str;

    /// Returns the engine context if this scope is one.
    fn as_validation_context(&self) -> Option<&ValidationContext<'_>> {
        None
    }
}

/// One frame of a validation run.
///
/// - The model is borrowed from the caller and never mutated.
/// - The property chain is owned per frame; deriving copies it.
/// - The selector and root data are shared by reference with every derived frame.
/// - `is_child_context` / `is_child_collection_context` are only ever set on
///   derived frames, never on a root.
#[derive(Clone)]
pub struct ValidationContext<'a> {
    model: ModelRef<'a>,
    property_chain: PropertyChain,
    selector: Arc<dyn ValidatorSelector>,
    root_context_data: RootContextData,
    is_child_context: bool,
    is_child_collection_context: bool,
    is_async: bool,
}

impl<'a> ValidationContext<'a> {
    /// Creates a root context with an empty chain, the default selector and
    /// fresh root data.
    pub fn new<T: Any + Send + Sync>(model: &'a T) -> Self {
        Self::with_selector(model, Arc::new(DefaultSelector))
    }

    /// Creates a root context with a custom selector.
    pub fn with_selector<T: Any + Send + Sync>(
        model: &'a T,
        selector: Arc<dyn ValidatorSelector>,
    ) -> Self {
        Self::from_parts(ModelRef::new(model), &PropertyChain::new(), selector)
    }

    /// Creates a root context over an erased model, copying `chain`.
    pub fn from_parts(
        model: ModelRef<'a>,
        chain: &PropertyChain,
        selector: Arc<dyn ValidatorSelector>,
    ) -> Self {
        Self {
            model,
            property_chain: PropertyChain::from_chain(chain),
            selector,
            root_context_data: RootContextData::new(),
            is_child_context: false,
            is_child_collection_context: false,
            is_async: false,
        }
    }

    /// Replaces the root data with `data` (a handle, not a copy).
    pub fn with_root_context_data(mut self, data: RootContextData) -> Self {
        self.root_context_data = data;
        self
    }

    /// Creates a new context from this one, reusing every field not supplied.
    ///
    /// The root data is always shared with `self`. Used for non-hierarchical
    /// transformations such as re-running the same position with another selector.
    pub fn clone_with<'b>(
        &self,
        chain: Option<PropertyChain>,
        model: Option<ModelRef<'b>>,
        selector: Option<Arc<dyn ValidatorSelector>>,
    ) -> ValidationContext<'b>
    where
        'a: 'b,
    {
        ValidationContext {
            model: model.unwrap_or(self.model),
            property_chain: chain.unwrap_or_else(|| PropertyChain::from_chain(&self.property_chain)),
            selector: selector.unwrap_or_else(|| Arc::clone(&self.selector)),
            root_context_data: self.root_context_data.clone(),
            is_child_context: self.is_child_context,
            is_child_collection_context: self.is_child_collection_context,
            is_async: self.is_async,
        }
    }

    /// Creates a context for a nested validator over `model`.
    ///
    /// The chain is a fresh copy of this one and is not extended; appending
    /// the owning property name is the caller's job.
    pub fn derive_for_child_validator<'b>(&self, model: ModelRef<'b>) -> ValidationContext<'b> {
        ValidationContext {
            model,
            property_chain: PropertyChain::from_chain(&self.property_chain),
            selector: Arc::clone(&self.selector),
            root_context_data: self.root_context_data.clone(),
            is_child_context: true,
            is_child_collection_context: false,
            is_async: self.is_async,
        }
    }

    /// Creates a context for validating one element of a collection.
    ///
    /// The chain starts empty: positional naming is rebuilt by the caller.
    pub fn derive_for_child_collection_validator<'b>(
        &self,
        element: ModelRef<'b>,
    ) -> ValidationContext<'b> {
        ValidationContext {
            model: element,
            property_chain: PropertyChain::new(),
            selector: Arc::clone(&self.selector),
            root_context_data: self.root_context_data.clone(),
            is_child_context: true,
            is_child_collection_context: true,
            is_async: self.is_async,
        }
    }

    /// Returns a copy of this context flagged for asynchronous execution.
    pub fn as_async(&self) -> Self {
        let mut ctx = self.clone();
        ctx.is_async = true;
        ctx
    }

    pub fn model(&self) -> ModelRef<'a> {
        self.model
    }

    /// Returns the model as a `T`, or a contract violation if it is something else.
    pub fn model_as<T: Any>(&self) -> Result<&'a T, EngineError> {
        self.model
            .downcast::<T>()
            .ok_or(EngineError::ModelTypeMismatch {
                expected: std::any::type_name::<T>(),
                actual: self.model.type_name(),
            })
    }

    pub fn property_chain(&self) -> &PropertyChain {
        &self.property_chain
    }

    pub fn property_chain_mut(&mut self) -> &mut PropertyChain {
        &mut self.property_chain
    }

    pub fn selector(&self) -> &Arc<dyn ValidatorSelector> {
        &self.selector
    }

    pub fn root_context_data(&self) -> &RootContextData {
        &self.root_context_data
    }

    pub fn is_child_context(&self) -> bool {
        self.is_child_context
    }

    pub fn is_child_collection_context(&self) -> bool {
        self.is_child_collection_context
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// Full dotted path of `property_name` at this position.
    pub fn property_path(&self, property_name: &str) -> String {
        self.property_chain.build_property_name(property_name)
    }

    /// Builds a failure for `property_name` at this position.
    pub fn failure(&self, property_name: &str, message: impl Into<String>) -> ValidationFailure {
        ValidationFailure::new(self.property_path(property_name), message)
    }
}

impl fmt::Debug for ValidationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("model", &self.model)
            .field("property_chain", &self.property_chain.to_string())
            .field("root_context_data", &self.root_context_data.len())
            .field("is_child_context", &self.is_child_context)
            .field("is_child_collection_context", &self.is_child_collection_context)
            .field("is_async", &self.is_async)
            .finish()
    }
}

impl ValidationScope for ValidationContext<'_> {
    fn model(&self) -> ModelRef<'_> {
        self.model
    }

    fn root_context_data(&self) -> &RootContextData {
        &self.root_context_data
    }

    fn is_async(&self) -> bool {
        self.is_async
    }

    fn scope_type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn as_validation_context(&self) -> Option<&ValidationContext<'_>> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::RuleSetSelector;
    use serde_json::json;

    #[derive(Debug)]
    struct Parent;
    #[derive(Debug)]
    struct Child;

    #[test]
    fn test_root_context_defaults() {
        let parent = Parent;
        let ctx = ValidationContext::new(&parent);

        assert!(ctx.property_chain().is_empty());
        assert!(ctx.root_context_data().is_empty());
        assert!(!ctx.is_child_context());
        assert!(!ctx.is_child_collection_context());
        assert!(!ctx.is_async());
        assert!(ctx.model().is::<Parent>());
    }

    #[test]
    fn test_derive_for_child_copies_chain() {
        let parent = Parent;
        let child = Child;
        let root = ValidationContext::from_parts(
            ModelRef::new(&parent),
            &PropertyChain::from_segments(["Order"]),
            Arc::new(DefaultSelector),
        );

        let mut derived = root.derive_for_child_validator(ModelRef::new(&child));
        assert_eq!(derived.property_chain().to_string(), "Order");
        assert!(derived.is_child_context());
        assert!(!derived.is_child_collection_context());

        derived.property_chain_mut().add("Customer");
        assert_eq!(root.property_chain().len(), 1);
        assert_eq!(derived.property_chain().to_string(), "Order.Customer");
    }

    #[test]
    fn test_derive_for_child_collection_starts_empty() {
        let parent = Parent;
        let child = Child;
        let root = ValidationContext::from_parts(
            ModelRef::new(&parent),
            &PropertyChain::from_segments(["Order", "Lines"]),
            Arc::new(DefaultSelector),
        );

        let derived = root.derive_for_child_collection_validator(ModelRef::new(&child));
        assert!(derived.property_chain().is_empty());
        assert!(derived.is_child_context());
        assert!(derived.is_child_collection_context());
        assert!(derived.model().is::<Child>());
    }

    #[test]
    fn test_shared_state_across_derivation() {
        let parent = Parent;
        let child = Child;
        let root = ValidationContext::new(&parent).as_async();
        let derived = root.derive_for_child_validator(ModelRef::new(&child));

        assert!(Arc::ptr_eq(root.selector(), derived.selector()));
        assert!(derived.root_context_data().shares_storage_with(root.root_context_data()));
        assert!(derived.is_async());

        derived.root_context_data().insert("visited", json!(true));
        assert_eq!(root.root_context_data().get("visited"), Some(json!(true)));
    }

    #[test]
    fn test_clone_with_overrides() {
        let parent = Parent;
        let child = Child;
        let root = ValidationContext::new(&parent);
        root.root_context_data().insert("k", json!(1));

        let swapped = root.clone_with(
            Some(PropertyChain::from_segments(["X"])),
            Some(ModelRef::new(&child)),
            Some(Arc::new(RuleSetSelector::new(["create"]))),
        );

        assert_eq!(swapped.property_chain().to_string(), "X");
        assert!(swapped.model().is::<Child>());
        assert!(!Arc::ptr_eq(root.selector(), swapped.selector()));
        assert_eq!(swapped.root_context_data().get("k"), Some(json!(1)));
        assert!(root.property_chain().is_empty());
    }

    #[test]
    fn test_clone_chain_is_not_aliased() {
        let parent = Parent;
        let root = ValidationContext::new(&parent);
        let mut clone = root.clone_with(None, None, None);
        clone.property_chain_mut().add("A");

        assert_eq!(root.property_chain().len(), 0);
        assert_eq!(clone.property_chain().len(), 1);
    }

    #[test]
    fn test_model_as_mismatch_is_contract_violation() {
        let parent = Parent;
        let ctx = ValidationContext::new(&parent);

        assert!(ctx.model_as::<Parent>().is_ok());
        let err = ctx.model_as::<Child>().unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_root_context_data_ordering() {
        let data = RootContextData::from_entries([("b", json!(2)), ("a", json!(1))]);
        data.insert("c", json!(3));
        assert_eq!(data.keys(), vec!["b", "a", "c"]);

        data.remove("a");
        assert_eq!(data.keys(), vec!["b", "c"]);
    }

    #[test]
    fn test_failure_uses_current_chain() {
        let parent = Parent;
        let mut ctx = ValidationContext::new(&parent);
        ctx.property_chain_mut().add("Customer");

        let failure = ctx.failure("Name", "required");
        assert_eq!(failure.property_name, "Customer.Name");
    }
}
