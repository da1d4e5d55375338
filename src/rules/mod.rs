//! Rule bodies and nested dispatch.

mod child;
mod executor;

pub use child::{ChildValidatorAdaptor, PropertyValidatorContext, ValidatorProvider};
pub use executor::{AsyncBody, RuleExecutor, SyncBody};
