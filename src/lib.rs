//! # Inquest
//!
//! A validation engine for object graphs that threads a validation context
//! through nested validators, so every failure carries the full property path
//! of the value that produced it.
//!
//! ## Overview
//!
//! A run starts from a root [`ValidationContext`] over the model. Each nested
//! value is dispatched to its own validator through a
//! [`ChildValidatorAdaptor`], which derives a child context and extends the
//! [`PropertyChain`] with the owning property name. Collection elements get
//! positional names such as `Lines[2]`. All failures are accumulated in
//! declaration order, depth first.
//!
//! Rule bodies are authored either synchronously or asynchronously
//! ([`RuleExecutor`]); a run started either way executes every rule, bridging
//! conventions as needed.
//!
//! ## Core Types
//!
//! - [`PropertyChain`]: Ordered path locating the current value (e.g., `Orders[0].Customer`)
//! - [`ValidationContext`]: One frame of a run: model, chain, selector, shared root data
//! - [`ObjectValidator`]: Declared rules for one model type
//! - [`ValidatorRegistry`]: Validators keyed by model type, usable as a nested provider
//! - [`ValidationResult`]: The accumulated [`ValidationFailure`]s of a run
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use inquest::ObjectValidator;
//!
//! struct Country { code: String }
//! struct Address { country: Option<Country> }
//! struct Customer { address: Option<Address> }
//!
//! let country = ObjectValidator::<Country>::new().rule("Code", |c, ctx| {
//!     if c.code.len() == 2 { vec![] } else { vec![ctx.failure("Code", "must be two letters")] }
//! });
//! let address = ObjectValidator::<Address>::new()
//!     .child("Country", |a: &Address| a.country.as_ref(), Arc::new(country));
//! let customer = ObjectValidator::<Customer>::new()
//!     .child("Address", |c: &Customer| c.address.as_ref(), Arc::new(address));
//!
//! let model = Customer {
//!     address: Some(Address { country: Some(Country { code: "GBR".into() }) }),
//! };
//! let result = customer.validate(&model).unwrap();
//! assert_eq!(result.property_names(), ["Address.Country.Code"]);
//! ```

mod blocking;
pub mod error;
pub mod path;
pub mod registry;
pub mod rules;
pub mod selector;
pub mod validation;
pub mod validator;

pub use error::{EngineError, Severity, ValidationFailure, ValidationFailures, ValidationResult};
pub use path::PropertyChain;
pub use registry::{RegistryError, ScanResult, ValidatorRegistry};
pub use rules::{ChildValidatorAdaptor, PropertyValidatorContext, RuleExecutor, ValidatorProvider};
pub use selector::{
    CompositeSelector, DefaultSelector, MemberNameSelector, RuleDescriptor, RuleSetSelector,
    ValidatorSelector,
};
pub use validation::{Model, ModelRef, RootContextData, ValidationContext, ValidationScope};
pub use validator::{ObjectValidator, Validator, ValidatorHandle, ValidatorOptions};

pub use tokio_util::sync::CancellationToken;
