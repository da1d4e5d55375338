//! Selectors decide which declared rules run in a given context.
//!
//! A selector is consulted once per declared rule, with the rule's
//! [`RuleDescriptor`] and its full property path. The same selector instance
//! is shared by every context derived during a run.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::validation::ValidationContext;

/// Name of the rule set that untagged rules belong to.
pub const DEFAULT_RULE_SET: &str = "default";

/// Rule set name that selects every rule.
pub const WILDCARD_RULE_SET: &str = "*";

/// What a selector gets to see about a declared rule.
#[derive(Debug, Clone, Copy)]
pub struct RuleDescriptor<'r> {
    /// Declared property name, or None for model-level rules.
    pub property_name: Option<&'r str>,
    /// Rule sets the rule was declared in.
    pub rule_sets: &'r [String],
    /// True for rules that descend into a nested validator.
    pub is_child_dispatch: bool,
}

impl RuleDescriptor<'_> {
    fn in_default_set(&self) -> bool {
        self.rule_sets.is_empty() || self.rule_sets.iter().any(|s| s == DEFAULT_RULE_SET)
    }
}

/// Decides whether a rule should execute.
pub trait ValidatorSelector: Send + Sync {
    /// Returns true if `rule`, located at `property_path`, should run in `ctx`.
    fn can_execute(
        &self,
        rule: &RuleDescriptor<'_>,
        property_path: &str,
        ctx: &ValidationContext<'_>,
    ) -> bool;

    /// Rule sets this selector executes, reported on the result.
    fn rule_sets(&self) -> Vec<String> {
        vec![DEFAULT_RULE_SET.to_string()]
    }
}

/// Runs every rule that is not tagged with a rule set (or is tagged `default`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSelector;

impl ValidatorSelector for DefaultSelector {
    fn can_execute(
        &self,
        rule: &RuleDescriptor<'_>,
        _property_path: &str,
        _ctx: &ValidationContext<'_>,
    ) -> bool {
        rule.in_default_set()
    }
}

/// Runs rules belonging to any of the named rule sets.
///
/// `*` selects everything; `default` selects untagged rules.
///
/// # Example
///
/// ```rust
/// use inquest::RuleSetSelector;
///
/// let selector = RuleSetSelector::new(["create", "default"]);
/// assert_eq!(selector.rule_set_names(), ["create", "default"]);
/// ```
#[derive(Debug, Clone)]
pub struct RuleSetSelector {
    rule_sets: Vec<String>,
}

impl RuleSetSelector {
    pub fn new<I, S>(rule_sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rule_sets: rule_sets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn rule_set_names(&self) -> &[String] {
        &self.rule_sets
    }
}

impl ValidatorSelector for RuleSetSelector {
    fn can_execute(
        &self,
        rule: &RuleDescriptor<'_>,
        _property_path: &str,
        _ctx: &ValidationContext<'_>,
    ) -> bool {
        if self.rule_sets.iter().any(|s| s == WILDCARD_RULE_SET) {
            return true;
        }
        if rule.rule_sets.is_empty() {
            return self.rule_sets.iter().any(|s| s == DEFAULT_RULE_SET);
        }
        rule.rule_sets
            .iter()
            .any(|declared| self.rule_sets.contains(declared))
    }

    fn rule_sets(&self) -> Vec<String> {
        self.rule_sets.clone()
    }
}

fn indexer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[\d+\]").expect("indexer pattern is valid"))
}

/// Replaces concrete collection indexes with `[]`, so `Lines[3].Sku` matches `Lines[].Sku`.
fn normalize_indexers(path: &str) -> String {
    indexer_pattern().replace_all(path, "[]").into_owned()
}

/// Runs only the rules for the named members.
///
/// Member names are dotted paths; collection indexes may be written as `[]`
/// to match any element. Rules on an ancestor of a named member also run so
/// that the engine can descend to it. Once inside a child validator, every
/// rule runs unless some member name reaches below the top level.
#[derive(Debug, Clone)]
pub struct MemberNameSelector {
    member_names: Vec<String>,
}

impl MemberNameSelector {
    pub fn new<I, S>(member_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            member_names: member_names
                .into_iter()
                .map(|m| {
                    let member: String = m.into();
                    normalize_indexers(&member)
                })
                .collect(),
        }
    }

    pub fn member_names(&self) -> &[String] {
        &self.member_names
    }

    fn matches(&self, path: &str) -> bool {
        self.member_names.iter().any(|member| {
            member == path
                || is_descendant(path, member)
                || (!path.is_empty() && is_descendant(member, path))
        })
    }
}

/// True when `path` lies strictly below `ancestor` (`a.b` or `a[]` below `a`).
fn is_descendant(path: &str, ancestor: &str) -> bool {
    path.strip_prefix(ancestor)
        .map(|rest| rest.starts_with('.') || rest.starts_with('['))
        .unwrap_or(false)
}

impl ValidatorSelector for MemberNameSelector {
    fn can_execute(
        &self,
        _rule: &RuleDescriptor<'_>,
        property_path: &str,
        ctx: &ValidationContext<'_>,
    ) -> bool {
        let nested_members = self.member_names.iter().any(|m| m.contains('.'));
        if ctx.is_child_context() && !nested_members {
            return true;
        }
        self.matches(&normalize_indexers(property_path))
    }
}

/// Runs a rule when any of the inner selectors accepts it.
#[derive(Clone, Default)]
pub struct CompositeSelector {
    selectors: Vec<Arc<dyn ValidatorSelector>>,
}

impl CompositeSelector {
    pub fn new(selectors: Vec<Arc<dyn ValidatorSelector>>) -> Self {
        Self { selectors }
    }

    pub fn push(&mut self, selector: Arc<dyn ValidatorSelector>) {
        self.selectors.push(selector);
    }
}

impl ValidatorSelector for CompositeSelector {
    fn can_execute(
        &self,
        rule: &RuleDescriptor<'_>,
        property_path: &str,
        ctx: &ValidationContext<'_>,
    ) -> bool {
        self.selectors
            .iter()
            .any(|s| s.can_execute(rule, property_path, ctx))
    }

    fn rule_sets(&self) -> Vec<String> {
        let mut sets: Vec<String> = Vec::new();
        for selector in &self.selectors {
            for set in selector.rule_sets() {
                if !sets.contains(&set) {
                    sets.push(set);
                }
            }
        }
        sets
    }
}
