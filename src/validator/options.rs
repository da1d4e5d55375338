//! Per-call configuration for a validation run.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::selector::{
    CompositeSelector, DefaultSelector, MemberNameSelector, RuleSetSelector, ValidatorSelector,
};
use crate::validation::{RootContextData, ValidationContext};

/// Options for one validation run.
///
/// With nothing set, a run uses the [`DefaultSelector`] and starts with empty
/// root data. Rule sets and member names each add a selector; a rule runs if
/// any of them accepts it. An explicit selector replaces all of that.
///
/// # Example
///
/// ```rust
/// use inquest::ValidatorOptions;
/// use serde_json::json;
///
/// struct Order;
///
/// let options = ValidatorOptions::new()
///     .include_rule_sets(["create"])
///     .with_root_data("tenant", json!("acme"));
///
/// let order = Order;
/// let ctx = options.build_context(&order);
/// assert_eq!(ctx.root_context_data().get("tenant"), Some(json!("acme")));
/// assert_eq!(ctx.selector().rule_sets(), vec!["create"]);
/// ```
#[derive(Clone, Default)]
pub struct ValidatorOptions {
    rule_sets: Vec<String>,
    properties: Vec<String>,
    selector: Option<Arc<dyn ValidatorSelector>>,
    root_data: IndexMap<String, Value>,
}

impl ValidatorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs only rules in the given rule sets (`*` for all, `default` for untagged).
    pub fn include_rule_sets<I, S>(mut self, rule_sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule_sets.extend(rule_sets.into_iter().map(Into::into));
        self
    }

    /// Runs only rules for the given dotted member paths.
    pub fn include_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties.extend(properties.into_iter().map(Into::into));
        self
    }

    /// Uses `selector` instead of anything derived from rule sets or members.
    pub fn with_selector(mut self, selector: Arc<dyn ValidatorSelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Seeds the run's root data with `key`.
    pub fn with_root_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.root_data.insert(key.into(), value.into());
        self
    }

    /// Builds the selector this configuration describes.
    pub fn selector(&self) -> Arc<dyn ValidatorSelector> {
        if let Some(selector) = &self.selector {
            return Arc::clone(selector);
        }

        let mut parts: Vec<Arc<dyn ValidatorSelector>> = Vec::new();
        if !self.rule_sets.is_empty() {
            parts.push(Arc::new(RuleSetSelector::new(self.rule_sets.iter().cloned())));
        }
        if !self.properties.is_empty() {
            parts.push(Arc::new(MemberNameSelector::new(self.properties.iter().cloned())));
        }

        match parts.len() {
            0 => Arc::new(DefaultSelector),
            1 => parts.remove(0),
            _ => Arc::new(CompositeSelector::new(parts)),
        }
    }

    /// Builds a root context over `model` for this configuration.
    pub fn build_context<'a, T: Any + Send + Sync>(&self, model: &'a T) -> ValidationContext<'a> {
        let data = RootContextData::from_entries(self.root_data.clone());
        ValidationContext::with_selector(model, self.selector()).with_root_context_data(data)
    }
}

impl fmt::Debug for ValidatorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorOptions")
            .field("rule_sets", &self.rule_sets)
            .field("properties", &self.properties)
            .field("custom_selector", &self.selector.is_some())
            .field("root_data", &self.root_data)
            .finish()
    }
}
