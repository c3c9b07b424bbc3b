//! Cart endpoints: upsert add, quantity update, removal and clearing.

mod common;

use axum::http::{Method, StatusCode};
use common::{decimal, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn empty_cart_is_created_on_first_read() {
    let app = TestApp::new().await;
    let token = app.customer_token("alice");

    let (status, body) = app
        .request(Method::GET, "/api/v1/cart", None, Some(&token))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["success"].as_bool().unwrap_or(false));
    assert_eq!(body["data"]["cart"]["user_id"], "alice");
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(0));
    assert_eq!(decimal(&body["data"]["subtotal"]), dec!(0));
}

#[tokio::test]
async fn adding_same_product_twice_merges_into_one_line() {
    let app = TestApp::new().await;
    let token = app.customer_token("alice");
    let product_id = app.seed_product("Tempered Glass", "12.50", None).await;

    let (status, first) = app
        .request(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "product_id": product_id, "quantity": 2 })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["data"]["quantity"], 2);

    let (status, second) = app
        .request(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "product_id": product_id, "quantity": 3 })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["data"]["quantity"], 5);
    assert_eq!(second["data"]["id"], first["data"]["id"]);

    let (_, cart) = app
        .request(Method::GET, "/api/v1/cart", None, Some(&token))
        .await;
    let items = cart["data"]["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1);
    assert_eq!(decimal(&items[0]["line_total"]), dec!(62.50));
    assert_eq!(decimal(&cart["data"]["subtotal"]), dec!(62.50));
}

#[tokio::test]
async fn quantity_defaults_to_one() {
    let app = TestApp::new().await;
    let token = app.customer_token("alice");
    let product_id = app.seed_product("Phone Strap", "4.00", None).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "product_id": product_id })),
            Some(&token),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["quantity"], 1);
}

#[tokio::test]
async fn cart_prices_use_discounted_price() {
    let app = TestApp::new().await;
    let token = app.customer_token("alice");
    let product_id = app.seed_product("MagSafe Case", "30.00", Some("20.00")).await;

    app.request(
        Method::POST,
        "/api/v1/cart/items",
        Some(json!({ "product_id": product_id, "quantity": 2 })),
        Some(&token),
    )
    .await;

    let (_, cart) = app
        .request(Method::GET, "/api/v1/cart", None, Some(&token))
        .await;
    assert_eq!(decimal(&cart["data"]["items"][0]["unit_price"]), dec!(20));
    assert_eq!(decimal(&cart["data"]["subtotal"]), dec!(40));
}

#[tokio::test]
async fn zero_quantity_is_rejected() {
    let app = TestApp::new().await;
    let token = app.customer_token("alice");
    let product_id = app.seed_product("Screen Wipe", "1.00", None).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "product_id": product_id, "quantity": 0 })),
            Some(&token),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let app = TestApp::new().await;
    let token = app.customer_token("alice");

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "product_id": Uuid::new_v4(), "quantity": 1 })),
            Some(&token),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_sets_quantity_and_remove_deletes_line() {
    let app = TestApp::new().await;
    let token = app.customer_token("alice");
    let product_id = app.seed_product("Car Mount", "15.00", None).await;

    app.request(
        Method::POST,
        "/api/v1/cart/items",
        Some(json!({ "product_id": product_id, "quantity": 1 })),
        Some(&token),
    )
    .await;

    let uri = format!("/api/v1/cart/items/{product_id}");
    let (status, body) = app
        .request(Method::PUT, &uri, Some(json!({ "quantity": 4 })), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["quantity"], 4);

    let (status, _) = app
        .request(Method::PUT, &uri, Some(json!({ "quantity": 0 })), Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.request(Method::DELETE, &uri, None, Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = app.request(Method::DELETE, &uri, None, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn updating_a_missing_line_is_not_found() {
    let app = TestApp::new().await;
    let token = app.customer_token("alice");
    let product_id = app.seed_product("Lens Protector", "9.00", None).await;

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/v1/cart/items/{product_id}"),
            Some(json!({ "quantity": 2 })),
            Some(&token),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn clear_empties_cart_and_carts_are_per_user() {
    let app = TestApp::new().await;
    let alice = app.customer_token("alice");
    let bob = app.customer_token("bob");
    let first = app.seed_product("Charger", "25.00", None).await;
    let second = app.seed_product("Cable", "8.00", None).await;

    for product_id in [first, second] {
        app.request(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "product_id": product_id, "quantity": 1 })),
            Some(&alice),
        )
        .await;
    }

    let (_, bob_cart) = app.request(Method::GET, "/api/v1/cart", None, Some(&bob)).await;
    assert_eq!(bob_cart["data"]["items"].as_array().map(Vec::len), Some(0));

    let (status, _) = app
        .request(Method::DELETE, "/api/v1/cart", None, Some(&alice))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, cart) = app
        .request(Method::GET, "/api/v1/cart", None, Some(&alice))
        .await;
    assert_eq!(cart["data"]["items"].as_array().map(Vec::len), Some(0));

    // Clearing an already empty cart still succeeds
    let (status, _) = app
        .request(Method::DELETE, "/api/v1/cart", None, Some(&alice))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn line_mutations_without_a_cart_do_not_create_one() {
    let app = TestApp::new().await;
    let token = app.customer_token("newcomer");
    let missing = Uuid::new_v4();

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/v1/cart/items/{missing}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/v1/cart/items/{missing}"),
            Some(json!({ "quantity": 0 })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(Method::DELETE, "/api/v1/cart", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(app.row_count("carts").await, 0);
}

#[tokio::test]
async fn mistyped_body_is_a_bad_request() {
    let app = TestApp::new().await;
    let token = app.customer_token("alice");
    let product_id = app.seed_product("Screen Wipe", "2.00", None).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "product_id": product_id, "quantity": "two" })),
            Some(&token),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
    assert!(body["message"].as_str().unwrap_or_default().starts_with("Invalid argument"));
}

#[tokio::test]
async fn quantity_overflow_is_a_bad_request() {
    let app = TestApp::new().await;
    let token = app.customer_token("alice");
    let product_id = app.seed_product("Bulk Pack", "1.00", None).await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "product_id": product_id, "quantity": i32::MAX })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/cart/items",
            Some(json!({ "product_id": product_id, "quantity": 1 })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
}
