//! Per-user address book over HTTP.

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::{json, Value};
use uuid::Uuid;

fn address(street: &str, address_type: &str, is_default: bool) -> Value {
    json!({
        "street_address": street,
        "apartment_address": null,
        "city": "Dublin",
        "state_province": null,
        "postal_code": "D02 X285",
        "country": "Ireland",
        "address_type": address_type,
        "is_default": is_default,
    })
}

#[tokio::test]
async fn address_book_crud_for_the_owner() {
    let app = TestApp::new().await;
    let token = app.customer_token("dana");

    let (status, created) = app
        .request(
            Method::POST,
            "/api/v1/addresses",
            Some(address("1 Grafton St", "SHIPPING", true)),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["data"]["id"].as_str().expect("address id").to_string();
    assert_eq!(created["data"]["address_type"], "SHIPPING");

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/addresses",
            Some(address("7 Dame St", "SHIPPING", true)),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, first) = app
        .request(Method::GET, &format!("/api/v1/addresses/{id}"), None, Some(&token))
        .await;
    assert_eq!(first["data"]["is_default"], false);

    let (status, replaced) = app
        .request(
            Method::PUT,
            &format!("/api/v1/addresses/{id}"),
            Some(address("2 Grafton St", "BILLING", false)),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replaced["data"]["street_address"], "2 Grafton St");
    assert_eq!(replaced["data"]["address_type"], "BILLING");

    let (_, listed) = app
        .request(Method::GET, "/api/v1/addresses", None, Some(&token))
        .await;
    let listed = listed["data"].as_array().expect("addresses");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["street_address"], "7 Dame St");

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/v1/addresses/{id}"), None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.row_count("addresses").await, 1);
}

#[tokio::test]
async fn other_users_addresses_are_hidden() {
    let app = TestApp::new().await;
    let owner = app.customer_token("erin");
    let other = app.customer_token("frank");

    let (_, created) = app
        .request(
            Method::POST,
            "/api/v1/addresses",
            Some(address("4 Quay Rd", "BILLING", false)),
            Some(&owner),
        )
        .await;
    let id = created["data"]["id"].as_str().expect("address id").to_string();

    let (status, _) = app
        .request(Method::GET, &format!("/api/v1/addresses/{id}"), None, Some(&other))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/v1/addresses/{id}"), None, Some(&other))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = app
        .request(Method::GET, "/api/v1/addresses", None, Some(&other))
        .await;
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(0));

    let (status, _) = app
        .request(
            Method::GET,
            &format!("/api/v1/addresses/{}", Uuid::new_v4()),
            None,
            Some(&owner),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn addresses_require_a_token_and_valid_fields() {
    let app = TestApp::new().await;
    let (status, _) = app.request(Method::GET, "/api/v1/addresses", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.customer_token("gail");
    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/addresses",
            Some(address("", "SHIPPING", false)),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/addresses",
            Some(address("1 Main St", "HOME", false)),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
