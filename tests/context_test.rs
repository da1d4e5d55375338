//! Tests for context construction, derivation and the dispatch boundary.

mod common;

use std::sync::Arc;

use common::*;
use inquest::{
    CancellationToken, ChildValidatorAdaptor, EngineError, ModelRef, PropertyChain,
    PropertyValidatorContext, RootContextData, RuleSetSelector, ValidationContext,
    ValidationScope, ValidatorOptions,
};
use serde_json::json;

#[test]
fn test_root_context_from_options() {
    let order = valid_order();
    let ctx = ValidatorOptions::new()
        .with_root_data("tenant", "acme")
        .build_context(&order);

    assert!(ctx.property_chain().is_empty());
    assert!(!ctx.is_child_context());
    assert!(!ctx.is_child_collection_context());
    assert_eq!(ctx.root_context_data().get("tenant"), Some(json!("acme")));
}

#[test]
fn test_clone_with_keeps_flags_and_shares_root_data() {
    let order = valid_order();
    let root = ValidationContext::new(&order);
    let customer = order.customer.as_ref().unwrap();
    let child = root.derive_for_child_validator(ModelRef::new(customer));

    let clone = child.clone_with(Some(PropertyChain::from_segments(["Customer"])), None, None);
    assert!(clone.is_child_context());
    assert!(clone.model().is::<Customer>());
    assert!(clone.root_context_data().shares_storage_with(root.root_context_data()));
    assert!(Arc::ptr_eq(clone.selector(), root.selector()));
}

#[test]
fn test_clone_with_new_selector() {
    let order = valid_order();
    let root = ValidationContext::new(&order);
    let strict = root.clone_with(None, None, Some(Arc::new(RuleSetSelector::new(["strict"]))));

    assert_eq!(strict.selector().rule_sets(), vec!["strict"]);
    assert_eq!(root.selector().rule_sets(), vec!["default"]);
}

#[test]
fn test_appending_to_clone_leaves_original() {
    let order = valid_order();
    let mut root = ValidationContext::new(&order);
    root.property_chain_mut().add("Orders");

    let mut clone = root.clone_with(None, None, None);
    clone.property_chain_mut().add("Customer");

    assert_eq!(root.property_chain().len(), 1);
    assert_eq!(clone.property_chain().len(), 2);
}

#[test]
fn test_collection_derivation_starts_empty() {
    let order = valid_order();
    let mut root = ValidationContext::new(&order);
    root.property_chain_mut().add("Shipment");

    let line = &order.lines[0];
    let element = root.derive_for_child_collection_validator(ModelRef::new(line));
    assert!(element.property_chain().is_empty());
    assert!(element.is_child_collection_context());
    assert_eq!(element.model_as::<Line>().unwrap().sku, "A-1");
}

#[test]
fn test_async_flag_is_inherited() {
    let order = valid_order();
    let root = ValidationContext::new(&order).as_async();
    let customer = order.customer.as_ref().unwrap();

    assert!(root.derive_for_child_validator(ModelRef::new(customer)).is_async());
    assert!(root.derive_for_child_collection_validator(ModelRef::new(customer)).is_async());
}

struct HostScope {
    data: RootContextData,
}

impl ValidationScope for HostScope {
    fn model(&self) -> ModelRef<'_> {
        ModelRef::new(self)
    }

    fn root_context_data(&self) -> &RootContextData {
        &self.data
    }

    fn is_async(&self) -> bool {
        true
    }

    fn scope_type_name(&self) -> &'static str {
        "HostScope"
    }
}

#[test]
fn test_adaptor_rejects_foreign_scope() {
    let scope = HostScope {
        data: RootContextData::new(),
    };
    let adaptor = ChildValidatorAdaptor::new(Arc::new(customer_validator()));
    let customer = invalid_order().customer.unwrap();
    let property = PropertyValidatorContext::new(&scope, "Customer", Some(ModelRef::new(&customer)));

    let err = adaptor.validate(&property).unwrap_err();
    assert!(matches!(err, EngineError::IncompatibleContext { actual: "HostScope" }));
}

#[tokio::test]
async fn test_adaptor_rejects_foreign_scope_async() {
    let scope = HostScope {
        data: RootContextData::new(),
    };
    let adaptor = ChildValidatorAdaptor::new(Arc::new(customer_validator()));
    let customer = invalid_order().customer.unwrap();
    let property = PropertyValidatorContext::new(&scope, "Customer", Some(ModelRef::new(&customer)));

    assert!(adaptor.should_run_async(&scope));
    let err = adaptor
        .validate_async(&property, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_contract_violation());
}

#[test]
fn test_adaptor_reports_validator_type() {
    let adaptor = ChildValidatorAdaptor::new(Arc::new(customer_validator()));
    assert!(adaptor.validator_type().contains("Customer"));

    let provided = ChildValidatorAdaptor::with_provider(|_| None, "provider");
    assert_eq!(provided.validator_type(), "provider");
}

#[tokio::test]
async fn test_sync_rule_body_under_async_adaptor() {
    let order = invalid_order();
    let root = ValidationContext::new(&order).as_async();
    let customer = order.customer.as_ref().unwrap();
    let adaptor = ChildValidatorAdaptor::new(Arc::new(customer_validator()));
    let property = PropertyValidatorContext::new(&root, "Customer", Some(ModelRef::new(customer)));

    let sync = adaptor.validate(&property).unwrap();
    let awaited = adaptor
        .validate_async(&property, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(sync, awaited);
    assert_eq!(sync[0].property_name, "Customer.Name");
}
