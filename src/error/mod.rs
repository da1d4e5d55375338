//! Error types for validation failures and engine faults.
//!
//! Two kinds of problems come out of a validation run and they never mix:
//! data-level [`ValidationFailure`]s are collected into a [`ValidationResult`],
//! while [`EngineError`]s (contract violations, cancellation) abort the call.

mod engine_error;
mod failure;

pub use engine_error::EngineError;
pub use failure::{Severity, ValidationFailure, ValidationFailures, ValidationResult};
