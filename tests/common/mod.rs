//! Shared models and validators for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use inquest::{ObjectValidator, ValidationFailure};

/// Installs a test subscriber once; controlled by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Country {
    pub code: String,
}

pub struct Address {
    pub line1: String,
    pub country: Option<Country>,
}

pub struct Customer {
    pub name: String,
    pub address: Option<Address>,
}

pub struct Line {
    pub sku: String,
    pub quantity: u32,
}

pub struct Order {
    pub reference: String,
    pub customer: Option<Customer>,
    pub lines: Vec<Line>,
}

pub fn required(ctx: &inquest::ValidationContext<'_>, name: &str, value: &str) -> Vec<ValidationFailure> {
    if value.is_empty() {
        vec![ctx.failure(name, "must not be empty").with_code("not_empty")]
    } else {
        Vec::new()
    }
}

pub fn country_validator() -> ObjectValidator<Country> {
    ObjectValidator::new().rule("Code", |c: &Country, ctx| {
        if c.code.len() == 2 {
            Vec::new()
        } else {
            vec![ctx.failure("Code", "must be two letters").with_attempted_value(c.code.clone())]
        }
    })
}

pub fn address_validator() -> ObjectValidator<Address> {
    ObjectValidator::new()
        .rule("Line1", |a: &Address, ctx| required(ctx, "Line1", &a.line1))
        .child("Country", |a: &Address| a.country.as_ref(), Arc::new(country_validator()))
}

pub fn customer_validator() -> ObjectValidator<Customer> {
    ObjectValidator::new()
        .rule("Name", |c: &Customer, ctx| required(ctx, "Name", &c.name))
        .child("Address", |c: &Customer| c.address.as_ref(), Arc::new(address_validator()))
}

pub fn line_validator() -> ObjectValidator<Line> {
    ObjectValidator::new()
        .rule("Sku", |l: &Line, ctx| required(ctx, "Sku", &l.sku))
        .rule("Quantity", |l: &Line, ctx| {
            if l.quantity == 0 {
                vec![ctx.failure("Quantity", "must be positive")]
            } else {
                Vec::new()
            }
        })
}

pub fn order_validator() -> ObjectValidator<Order> {
    ObjectValidator::new()
        .rule("Reference", |o: &Order, ctx| required(ctx, "Reference", &o.reference))
        .child("Customer", |o: &Order| o.customer.as_ref(), Arc::new(customer_validator()))
        .children("Lines", |o: &Order| o.lines.as_slice(), Arc::new(line_validator()))
}

pub fn valid_order() -> Order {
    Order {
        reference: "ORD-1".into(),
        customer: Some(Customer {
            name: "Ada".into(),
            address: Some(Address {
                line1: "1 Analytical Way".into(),
                country: Some(Country { code: "GB".into() }),
            }),
        }),
        lines: vec![Line {
            sku: "A-1".into(),
            quantity: 1,
        }],
    }
}

/// An order with one failure at every level of nesting.
pub fn invalid_order() -> Order {
    Order {
        reference: String::new(),
        customer: Some(Customer {
            name: String::new(),
            address: Some(Address {
                line1: String::new(),
                country: Some(Country { code: "GBR".into() }),
            }),
        }),
        lines: vec![
            Line {
                sku: "A-1".into(),
                quantity: 0,
            },
            Line {
                sku: String::new(),
                quantity: 3,
            },
        ],
    }
}
