//! Tests for sharing validators and registries across threads.

mod common;

use std::sync::Arc;
use std::thread;

use common::*;
use inquest::{ObjectValidator, RuleExecutor, ValidatorRegistry};

#[test]
fn test_concurrent_validation() {
    let validator = Arc::new(order_validator());

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let validator = Arc::clone(&validator);
            thread::spawn(move || {
                let order = if i % 2 == 0 { valid_order() } else { invalid_order() };
                let result = validator.validate(&order).unwrap();
                assert_eq!(result.is_valid(), i % 2 == 0);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_registry_access() {
    let registry = ValidatorRegistry::new();
    registry.register::<Order>(order_validator()).unwrap();
    registry.register::<Customer>(customer_validator()).unwrap();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || {
                assert!(registry.get::<Order>().is_some());
                let result = registry.validate(&invalid_order()).unwrap();
                assert_eq!(result.errors().len(), 6);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_registration() {
    struct A;
    struct B;
    struct C;

    let registry = ValidatorRegistry::new();
    let handles = vec![
        {
            let registry = registry.clone();
            thread::spawn(move || registry.register::<A>(ObjectValidator::<A>::new()).is_ok())
        },
        {
            let registry = registry.clone();
            thread::spawn(move || registry.register::<B>(ObjectValidator::<B>::new()).is_ok())
        },
        {
            let registry = registry.clone();
            thread::spawn(move || registry.register::<C>(ObjectValidator::<C>::new()).is_ok())
        },
    ];

    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_validate_batch_runs_are_independent() {
    let line = ObjectValidator::<Line>::new().model_rule(RuleExecutor::sync(|line: &Line, ctx| {
        let previous = ctx.root_context_data().insert("sku", line.sku.clone());
        assert!(previous.is_none(), "root data leaked between runs");
        Vec::new()
    }));
    let lines: Vec<Line> = (0..64)
        .map(|i| Line {
            sku: format!("SKU-{i}"),
            quantity: i,
        })
        .collect();

    let results = line.validate_batch(&lines);
    assert_eq!(results.len(), 64);
    assert!(results.iter().all(|r| r.as_ref().is_ok_and(|r| r.is_valid())));
}

#[test]
fn test_validate_batch_preserves_order() {
    let orders = vec![valid_order(), invalid_order(), valid_order()];
    let results = order_validator().validate_batch(&orders);

    let validity: Vec<bool> = results
        .into_iter()
        .map(|r| r.unwrap().is_valid())
        .collect();
    assert_eq!(validity, vec![true, false, true]);
}
