//! Typed backend client against the mock backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use pedalhub_core::{
    CreateOrderItem, CreateOrderRequest, OrderId, OrderStatus, PaymentMethod, ProductId,
};
use pedalhub_integration_tests::{MOCK_TOKEN, spawn_backend};
use pedalhub_web::config::WebConfig;
use pedalhub_web::services::BackendClient;
use secrecy::SecretString;

async fn backend_client() -> BackendClient {
    let backend = spawn_backend().await;
    let config = WebConfig::for_backend(&backend.api_url()).unwrap();
    BackendClient::new(&config.backend).unwrap()
}

#[tokio::test]
async fn order_by_id_matches_list_entry() {
    let client = backend_client().await;
    let token = SecretString::from(MOCK_TOKEN);

    let orders = client.list_orders(&token).await.unwrap();
    assert_eq!(orders.len(), 2);

    for listed in &orders {
        let fetched = client.get_order(&token, &listed.id).await.unwrap();
        assert_eq!(&fetched, listed);
    }
}

#[tokio::test]
async fn decoded_order_fields() {
    let client = backend_client().await;
    let token = SecretString::from(MOCK_TOKEN);

    let order = client.get_order(&token, &OrderId::new("o-2")).await.unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.payment_method, PaymentMethod::Cod);
    assert!(order.is_paid);
    assert_eq!(order.item_count(), 2);
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let client = backend_client().await;
    let token = SecretString::from(MOCK_TOKEN);

    let err = client
        .get_order(&token, &OrderId::new("missing"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.user_message(), "Order not found");
}

#[tokio::test]
async fn bad_token_is_unauthorized() {
    let client = backend_client().await;

    let err = client
        .list_orders(&SecretString::from("forged"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn created_order_starts_pending() {
    let client = backend_client().await;
    let token = SecretString::from(MOCK_TOKEN);

    let request = CreateOrderRequest {
        customer_id: None,
        shipping_address: "7 Hai Ba Trung, Hue".to_string(),
        billing_address: None,
        payment_method: PaymentMethod::BankTransfer,
        items: vec![CreateOrderItem {
            product_id: ProductId::new("p-1"),
            quantity: 1,
        }],
    };

    let order = client.create_order(&token, &request).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_method, PaymentMethod::BankTransfer);
    assert_eq!(order.shipping_address, "7 Hai Ba Trung, Hue");
    assert!(!order.is_paid);
    assert_eq!(order.items.len(), 1);
}

#[tokio::test]
async fn empty_order_reports_validation_message() {
    let client = backend_client().await;
    let token = SecretString::from(MOCK_TOKEN);

    let request = CreateOrderRequest {
        customer_id: None,
        shipping_address: "7 Hai Ba Trung, Hue".to_string(),
        billing_address: None,
        payment_method: PaymentMethod::Cod,
        items: Vec::new(),
    };

    let err = client.create_order(&token, &request).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.user_message(), "items must not be empty");
}
