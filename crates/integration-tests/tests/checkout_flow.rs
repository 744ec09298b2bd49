//! Checkout step transitions against a mock Spree backend.

#![allow(clippy::unwrap_used)]

use httpmock::prelude::*;
use serde_json::json;
use spree_storefront::checkout::{
    CheckoutError, CheckoutEvent, CheckoutFlow, CheckoutStep, MemoryTokenStore, OrderReadyPoller,
    OrderTokenRecord,
};
use spree_storefront::spree::{CheckoutFields, CheckoutUpdate};
use spree_storefront_core::{Email, Money, OrderNumber, OrderToken, PaymentMethodId};
use spree_storefront_integration_tests::{
    fast_poll, order_json, order_service, shipped_order_json,
};

fn store() -> MemoryTokenStore {
    MemoryTokenStore::with_record(OrderTokenRecord {
        order_number: OrderNumber::new("R1"),
        order_token: OrderToken::new("t1"),
    })
}

#[tokio::test]
async fn test_advance_follows_server_state() {
    let server = MockServer::start_async().await;
    let next = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/api/v1/checkouts/R1/next.json")
                .query_param("order_token", "t1");
            then.status(200).json_body(order_json("R1", "t1", "address", &[]));
        })
        .await;

    let service = order_service(&server);
    let store = store();
    let mut events = service.events().subscribe();
    let mut flow = CheckoutFlow::new(&service, &store);

    assert_eq!(flow.step(), CheckoutStep::Cart);
    assert_eq!(flow.advance().await.unwrap(), CheckoutStep::AddressSelection);
    next.assert_hits_async(1).await;

    match events.try_recv().unwrap() {
        CheckoutEvent::StateChanged(order) => assert_eq!(order.number.as_str(), "R1"),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_transition_keeps_step() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/api/v1/checkouts/R1.json");
            then.status(200).json_body(order_json("R1", "t1", "payment", &[]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/api/v1/checkouts/R1/next.json");
            then.status(422)
                .json_body(json!({"error": "payment method required"}));
        })
        .await;

    let service = order_service(&server);
    let store = store();
    let mut flow = CheckoutFlow::new(&service, &store);

    let update = CheckoutUpdate {
        order: CheckoutFields {
            email: Some(Email::parse("asha@example.com").unwrap()),
            ..CheckoutFields::default()
        },
    };
    assert_eq!(
        flow.update(&update).await.unwrap(),
        CheckoutStep::PaymentSelection
    );

    assert!(flow.advance().await.is_err());
    assert_eq!(flow.step(), CheckoutStep::PaymentSelection);
}

#[tokio::test]
async fn test_update_sends_only_set_fields() {
    let server = MockServer::start_async().await;
    let update_mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/api/v1/checkouts/R1.json")
                .json_body(json!({"order": {"email": "asha@example.com", "use_billing": true}}));
            then.status(200).json_body(order_json("R1", "t1", "delivery", &[]));
        })
        .await;

    let service = order_service(&server);
    let store = store();
    let mut flow = CheckoutFlow::new(&service, &store);

    let update = CheckoutUpdate {
        order: CheckoutFields {
            email: Some(Email::parse("asha@example.com").unwrap()),
            use_billing: Some(true),
            ..CheckoutFields::default()
        },
    };
    assert_eq!(
        flow.update(&update).await.unwrap(),
        CheckoutStep::AddressSelection
    );
    update_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_pay_records_payment_then_advances() {
    let server = MockServer::start_async().await;
    let methods = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/orders/R1/payments/new");
            then.status(200).json_body(json!({
                "payment_methods": [{"id": 2, "name": "PayUbiz", "method_type": "payubiz"}]
            }));
        })
        .await;
    let payment = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/orders/R1/payments")
                .json_body(json!({"payment": {"payment_method_id": 2, "amount": "25.50"}}));
            then.status(201)
                .json_body(json!({"id": 9, "amount": "25.50", "state": "checkout"}));
        })
        .await;
    let next = server
        .mock_async(|when, then| {
            when.method(PUT).path("/api/v1/checkouts/R1/next.json");
            then.status(200).json_body(order_json("R1", "t1", "confirm", &[]));
        })
        .await;

    let service = order_service(&server);
    let store = store();

    let available = service.available_payment_methods(&store).await.unwrap();
    assert_eq!(available.len(), 1);
    let method = available.first().unwrap();
    assert_eq!(method.name, "PayUbiz");

    let mut flow = CheckoutFlow::new(&service, &store);
    let step = flow
        .pay(method.id, "25.50".parse::<Money>().unwrap())
        .await
        .unwrap();

    assert_eq!(step, CheckoutStep::PaymentSubmitted);
    assert_eq!(method.id, PaymentMethodId::new(2));
    methods.assert_hits_async(1).await;
    payment.assert_hits_async(1).await;
    next.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_confirmation_is_terminal() {
    let server = MockServer::start_async().await;
    let detail = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/orders/R1");
            then.status(200).json_body(shipped_order_json("R1", "ready"));
        })
        .await;
    let next = server
        .mock_async(|when, then| {
            when.method(PUT).path("/api/v1/checkouts/R1/next.json");
            then.status(200).json_body(order_json("R1", "t1", "complete", &[]));
        })
        .await;

    let service = order_service(&server);
    let store = store();
    let poller = OrderReadyPoller::new(fast_poll(30));
    let mut flow = CheckoutFlow::new(&service, &store);

    let confirmation = flow
        .await_confirmation(&poller, &OrderNumber::new("R1"))
        .await;

    assert!(confirmation.ready);
    assert_eq!(confirmation.attempts, 1);
    assert_eq!(flow.step(), CheckoutStep::Confirmed);
    detail.assert_hits_async(1).await;

    assert!(matches!(
        flow.advance().await,
        Err(CheckoutError::AlreadyConfirmed)
    ));
    next.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_resume_positions_flow_on_current_order() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/orders/current");
            then.status(200).json_body(order_json("R1", "t1", "payment", &[]));
        })
        .await;

    let service = order_service(&server);
    let store = MemoryTokenStore::new();
    let mut flow = CheckoutFlow::new(&service, &store);

    assert_eq!(flow.resume().await.unwrap(), CheckoutStep::PaymentSelection);
    assert_eq!(
        flow.machine().order().unwrap().number,
        OrderNumber::new("R1")
    );
}

#[tokio::test]
async fn test_shipment_availability() {
    let server = MockServer::start_async().await;
    let check = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/address/shipment_availability")
                .json_body(json!({"pincode": 411_001}));
            then.status(200).json_body(json!({"available": true}));
        })
        .await;

    let service = order_service(&server);
    let availability = service.shipment_availability(411_001).await.unwrap();

    assert!(availability.available);
    check.assert_hits_async(1).await;
}
