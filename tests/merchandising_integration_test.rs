//! Home-page slideshow and promo banners over HTTP.

mod common;

use axum::http::{Method, StatusCode};
use common::{decimal, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

async fn staff_post(app: &TestApp, uri: &str, body: Value) -> Value {
    let staff = app.staff_token();
    let (status, response) = app
        .request(Method::POST, uri, Some(body), Some(&staff))
        .await;
    assert_eq!(status, StatusCode::CREATED, "POST {uri} failed: {response}");
    response["data"].clone()
}

#[tokio::test]
async fn slides_are_public_and_ordered_by_position() {
    let app = TestApp::new().await;
    let earbuds = app.seed_product("Earbuds", "59.00", Some("49.00")).await;
    let stand = app.seed_product("Phone Stand", "12.00", None).await;

    staff_post(&app, "/api/v1/slides", json!({ "product_id": earbuds, "position": 2 })).await;
    let first = staff_post(&app, "/api/v1/slides", json!({ "product_id": stand, "position": 1 })).await;
    staff_post(
        &app,
        "/api/v1/slides",
        json!({ "product_id": stand, "position": 0, "is_active": false }),
    )
    .await;

    let (status, body) = app.request(Method::GET, "/api/v1/slides", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let slides = body["data"].as_array().expect("slides array");
    assert_eq!(slides.len(), 2);
    assert_eq!(slides[0]["id"], first["id"]);
    assert_eq!(slides[1]["product"]["name"], "Earbuds");
    assert_eq!(decimal(&slides[1]["product"]["unit_price"]), dec!(49));
}

#[tokio::test]
async fn slide_writes_require_staff() {
    let app = TestApp::new().await;
    let product_id = app.seed_product("Ring Holder", "5.00", None).await;
    let customer = app.customer_token("carol");

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/slides",
            Some(json!({ "product_id": product_id })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/slides",
            Some(json!({ "product_id": product_id })),
            Some(&customer),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn banners_default_small_update_and_delete() {
    let app = TestApp::new().await;
    let staff = app.staff_token();
    let product_id = app.seed_product("Car Mount", "22.00", None).await;

    let banner = staff_post(&app, "/api/v1/banners", json!({ "product_id": product_id })).await;
    assert_eq!(banner["size"], "small");
    assert_eq!(banner["is_active"], true);
    let banner_id = banner["id"].as_str().expect("banner id");

    let (status, updated) = app
        .request(
            Method::PUT,
            &format!("/api/v1/banners/{banner_id}"),
            Some(json!({ "size": "large", "position": 3 })),
            Some(&staff),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["size"], "large");
    assert_eq!(updated["data"]["position"], 3);

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/v1/banners/{banner_id}"),
            Some(json!({ "size": "huge" })),
            Some(&staff),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/v1/banners/{banner_id}"),
            None,
            Some(&staff),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, listed) = app.request(Method::GET, "/api/v1/banners", None, None).await;
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(0));
}
