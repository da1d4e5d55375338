//! Validation failure types.
//!
//! This module provides [`ValidationFailure`] for a single failed rule,
//! [`ValidationFailures`] for a non-empty accumulation of them, and
//! [`ValidationResult`] for the flat outcome of a whole run.

use std::fmt::{self, Display};

use serde_json::Value;
use stillwater::prelude::*;

/// How serious a failure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Info,
}

/// A single failed rule with its location in the object graph.
///
/// - **property_name**: full dotted path at the point of failure
/// - **message**: human-readable description
/// - **attempted_value**: the offending value, if the rule recorded it
/// - **error_code**: machine-readable code for programmatic handling
///
/// # Example
///
/// ```rust
/// use inquest::ValidationFailure;
/// use serde_json::json;
///
/// let failure = ValidationFailure::new("Customer.Email", "is not a valid email")
///     .with_code("invalid_email")
///     .with_attempted_value(json!("nope"));
///
/// assert_eq!(failure.error_code, "invalid_email");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    /// Dotted property path of the value that failed.
    pub property_name: String,
    /// Human-readable error message.
    pub message: String,
    /// The value that was rejected.
    pub attempted_value: Option<Value>,
    /// Machine-readable error code (e.g. `not_empty`).
    pub error_code: String,
    /// Severity of the failure.
    pub severity: Severity,
}

impl ValidationFailure {
    /// Creates a new failure at the given path.
    ///
    /// The error code defaults to "validation_error".
    pub fn new(property_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            message: message.into(),
            attempted_value: None,
            error_code: "validation_error".to_string(),
            severity: Severity::Error,
        }
    }

    /// Sets the error code and returns self for chaining.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = code.into();
        self
    }

    /// Sets the attempted value and returns self for chaining.
    pub fn with_attempted_value(mut self, value: impl Into<Value>) -> Self {
        self.attempted_value = Some(value.into());
        self
    }

    /// Sets the severity and returns self for chaining.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.property_name.is_empty() {
            "(root)"
        } else {
            self.property_name.as_str()
        };

        write!(f, "{}: {}", path, self.message)?;

        if let Some(ref attempted) = self.attempted_value {
            write!(f, " (attempted: {})", attempted)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<ValidationFailure>();
    assert_sync::<ValidationFailure>();
};

/// A non-empty collection of validation failures.
///
/// `ValidationFailures` wraps a `NonEmptyVec` so that a
/// `Validation<T, ValidationFailures>` failure always carries at least one entry.
/// It implements `Semigroup`, so failures from separate runs can be combined:
///
/// ```rust
/// use inquest::{ValidationFailure, ValidationFailures};
/// use stillwater::prelude::*;
///
/// let a = ValidationFailures::single(ValidationFailure::new("Name", "required"));
/// let b = ValidationFailures::single(ValidationFailure::new("Email", "invalid"));
///
/// assert_eq!(a.combine(b).len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailures(NonEmptyVec<ValidationFailure>);

impl ValidationFailures {
    /// Creates a collection containing a single failure.
    pub fn single(failure: ValidationFailure) -> Self {
        Self(NonEmptyVec::singleton(failure))
    }

    /// Creates a collection from a vec, or None if the vec is empty.
    pub fn from_vec(failures: Vec<ValidationFailure>) -> Option<Self> {
        NonEmptyVec::from_vec(failures).map(Self)
    }

    /// Returns the number of failures.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; the collection is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns an iterator over the failures.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.0.iter()
    }

    /// Returns all failures recorded against `property_name`.
    pub fn at_property(&self, property_name: &str) -> Vec<&ValidationFailure> {
        self.0
            .iter()
            .filter(|f| f.property_name == property_name)
            .collect()
    }

    /// Returns the first failure.
    pub fn first(&self) -> &ValidationFailure {
        self.0.head()
    }

    /// Converts into a plain vec.
    pub fn into_vec(self) -> Vec<ValidationFailure> {
        self.0.into_vec()
    }
}

impl Semigroup for ValidationFailures {
    fn combine(self, other: Self) -> Self {
        ValidationFailures(self.0.combine(other.0))
    }
}

impl Display for ValidationFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation failed with {} error(s):", self.len())?;
        for (i, failure) in self.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailures {}

impl IntoIterator for ValidationFailures {
    type Item = ValidationFailure;
    type IntoIter = std::vec::IntoIter<ValidationFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}

/// The flat outcome of one validation run.
///
/// Failures appear in traversal order: declaration order across sibling rules,
/// depth-first into nested validators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    errors: Vec<ValidationFailure>,
    rule_sets_executed: Vec<String>,
}

impl ValidationResult {
    /// Creates a result from the given failures.
    pub fn new(errors: Vec<ValidationFailure>) -> Self {
        Self {
            errors,
            rule_sets_executed: Vec::new(),
        }
    }

    /// Records the rule sets that were executed during the run.
    pub fn with_rule_sets(mut self, rule_sets: Vec<String>) -> Self {
        self.rule_sets_executed = rule_sets;
        self
    }

    /// Returns true when no failures were recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the failures in traversal order.
    pub fn errors(&self) -> &[ValidationFailure] {
        &self.errors
    }

    /// Returns the rule sets that were executed.
    pub fn rule_sets_executed(&self) -> &[String] {
        &self.rule_sets_executed
    }

    /// Returns the property paths of every failure, in order.
    pub fn property_names(&self) -> Vec<&str> {
        self.errors
            .iter()
            .map(|f| f.property_name.as_str())
            .collect()
    }

    /// Consumes the result, returning the failures.
    pub fn into_errors(self) -> Vec<ValidationFailure> {
        self.errors
    }

    /// Views the result as a `stillwater::Validation`.
    pub fn into_validation(self) -> Validation<(), ValidationFailures> {
        match ValidationFailures::from_vec(self.errors) {
            Some(failures) => Validation::Failure(failures),
            None => Validation::Success(()),
        }
    }
}

impl Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_defaults() {
        let failure = ValidationFailure::new("Name", "is required");

        assert_eq!(failure.property_name, "Name");
        assert_eq!(failure.error_code, "validation_error");
        assert_eq!(failure.severity, Severity::Error);
        assert!(failure.attempted_value.is_none());
    }

    #[test]
    fn test_failure_display() {
        let failure = ValidationFailure::new("Customer.Age", "must be positive")
            .with_attempted_value(json!(-4));
        let display = failure.to_string();

        assert!(display.contains("Customer.Age: must be positive"));
        assert!(display.contains("attempted: -4"));
    }

    #[test]
    fn test_failure_display_root() {
        let failure = ValidationFailure::new("", "model is inconsistent");
        assert!(failure.to_string().starts_with("(root): "));
    }

    #[test]
    fn test_failures_from_empty_vec() {
        assert!(ValidationFailures::from_vec(Vec::new()).is_none());
    }

    #[test]
    fn test_failures_at_property() {
        let failures = ValidationFailures::single(ValidationFailure::new("a", "1"))
            .combine(ValidationFailures::single(ValidationFailure::new("b", "2")))
            .combine(ValidationFailures::single(ValidationFailure::new("a", "3")));

        assert_eq!(failures.at_property("a").len(), 2);
        assert_eq!(failures.at_property("b").len(), 1);
        assert_eq!(failures.first().message, "1");
    }

    #[test]
    fn test_semigroup_associativity() {
        let e1 = ValidationFailures::single(ValidationFailure::new("", "1"));
        let e2 = ValidationFailures::single(ValidationFailure::new("", "2"));
        let e3 = ValidationFailures::single(ValidationFailure::new("", "3"));

        let left = e1.clone().combine(e2.clone()).combine(e3.clone());
        let right = e1.combine(e2.combine(e3));

        let left_msgs: Vec<_> = left.iter().map(|e| e.message.clone()).collect();
        let right_msgs: Vec<_> = right.iter().map(|e| e.message.clone()).collect();
        assert_eq!(left_msgs, right_msgs);
    }

    #[test]
    fn test_result_into_validation() {
        assert!(ValidationResult::default().into_validation().is_success());

        let result = ValidationResult::new(vec![ValidationFailure::new("Name", "required")]);
        assert!(!result.is_valid());
        assert_eq!(result.property_names(), vec!["Name"]);
        assert!(result.into_validation().is_failure());
    }
}
