//! `PayU` request signing and submission.

#![allow(clippy::unwrap_used)]

use httpmock::prelude::*;
use serde_json::json;
use spree_storefront::checkout::PaymentInput;
use spree_storefront::spree::Order;
use spree_storefront_core::{Email, Money, OrderNumber};
use spree_storefront_integration_tests::{app_state, fast_poll, order_json};

fn order() -> Order {
    serde_json::from_value(order_json("R1", "t1", "payment", &[])).unwrap()
}

#[tokio::test]
async fn test_signature_is_deterministic_and_field_sensitive() {
    let server = MockServer::start_async().await;
    let state = app_state(&server, fast_poll(1));
    let order = order();
    let billing = order.bill_address.clone().unwrap();
    let email = Email::parse("asha@example.com").unwrap();
    let other_email = Email::parse("ravi@example.com").unwrap();

    let input = PaymentInput {
        order_number: &order.number,
        amount: order.total,
        billing: &billing,
        email: &email,
    };
    let sign = |input: &PaymentInput<'_>, txnid: &str| {
        state
            .payments()
            .build_with_txnid(input, txnid.to_string())
            .unwrap()
            .hash
    };

    let base = sign(&input, "R1AAAAAAAAA");
    assert_eq!(base, sign(&input, "R1AAAAAAAAA"));
    assert_ne!(base, sign(&input, "R1BBBBBBBBB"));

    let cheaper = PaymentInput {
        amount: "25.49".parse::<Money>().unwrap(),
        ..input
    };
    assert_ne!(base, sign(&cheaper, "R1AAAAAAAAA"));

    let someone_else = PaymentInput {
        email: &other_email,
        ..input
    };
    assert_ne!(base, sign(&someone_else, "R1AAAAAAAAA"));
}

#[tokio::test]
async fn test_fresh_requests_get_distinct_txnids() {
    let server = MockServer::start_async().await;
    let state = app_state(&server, fast_poll(1));
    let order = order();
    let billing = order.bill_address.clone().unwrap();
    let email = Email::parse("asha@example.com").unwrap();
    let input = PaymentInput {
        order_number: &order.number,
        amount: order.total,
        billing: &billing,
        email: &email,
    };

    let first = state.payments().build(&input).unwrap();
    let second = state.payments().build(&input).unwrap();

    assert!(first.txnid.starts_with("R1"));
    assert_eq!(first.txnid.len(), "R1".len() + 9);
    assert_ne!(first.txnid, second.txnid);
    assert_ne!(first.hash, second.hash);
    assert_eq!(first.udf1, "R1");
    assert_eq!(first.amount, "25.50");
}

#[tokio::test]
async fn test_submit_forwards_signed_request() {
    let server = MockServer::start_async().await;
    let bridge = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/payubiz/post_request_payubiz")
                .body_contains("\"txnid\":\"R1CCCCCCCCC\"")
                .body_contains("\"productinfo\":\"Pickles-Product\"");
            then.status(200)
                .json_body(json!({"redirect_url": "https://pay.example.com/_payment"}));
        })
        .await;

    let state = app_state(&server, fast_poll(1));
    let order = order();
    let billing = order.bill_address.clone().unwrap();
    let email = Email::parse("asha@example.com").unwrap();
    let number = OrderNumber::new("R1");
    let request = state.payments().build_with_txnid(
        &PaymentInput {
            order_number: &number,
            amount: order.total,
            billing: &billing,
            email: &email,
        },
        "R1CCCCCCCCC".to_string(),
    )
    .unwrap();

    let response = state.orders().submit_payment(&request).await.unwrap();

    assert_eq!(response["redirect_url"], "https://pay.example.com/_payment");
    bridge.assert_hits_async(1).await;
}
