//! Catalog, wishlist and testimonial endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{decimal, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

async fn create(app: &TestApp, uri: &str, body: Value) -> Value {
    let staff = app.staff_token();
    let (status, response) = app
        .request(Method::POST, uri, Some(body), Some(&staff))
        .await;
    assert_eq!(status, StatusCode::CREATED, "POST {uri} failed: {response}");
    response["data"].clone()
}

#[tokio::test]
async fn product_view_exposes_price_and_discount() {
    let app = TestApp::new().await;
    let product_id = app.seed_product("Clear Case", "20.00", Some("15.00")).await;

    let (status, body) = app
        .request(Method::GET, &format!("/api/v1/products/{product_id}"), None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let view = &body["data"];
    assert_eq!(view["name"], "Clear Case");
    assert_eq!(view["slug"], "clear-case");
    assert_eq!(view["stock_quantity"], 10);
    assert_eq!(view["is_available"], true);
    assert_eq!(decimal(&view["unit_price"]), dec!(15));
    assert_eq!(view["discount_percentage"], 25);
}

#[tokio::test]
async fn duplicate_names_get_distinct_slugs() {
    let app = TestApp::new().await;
    let first = app.seed_product("USB-C Cable", "9.00", None).await;
    let second = app.seed_product("USB-C Cable", "11.00", None).await;

    let (_, by_slug) = app
        .request(Method::GET, "/api/v1/products/slug/usb-c-cable", None, None)
        .await;
    assert_eq!(by_slug["data"]["id"], first.to_string());

    let (status, by_slug) = app
        .request(Method::GET, "/api/v1/products/slug/usb-c-cable-1", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_slug["data"]["id"], second.to_string());

    let (status, _) = app
        .request(Method::GET, "/api/v1/products/slug/does-not-exist", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::GET,
            &format!("/api/v1/products/{}", Uuid::new_v4()),
            None,
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn catalog_writes_require_staff() {
    let app = TestApp::new().await;
    let customer = app.customer_token("alice");
    let body = json!({ "name": "Bootleg Case", "price": "1.00" });

    let (status, _) = app
        .request(Method::POST, "/api/v1/products", Some(body.clone()), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(Method::POST, "/api/v1/products", Some(body), Some(&customer))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/categories",
            Some(json!({ "name": "Cases" })),
            Some(&customer),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn negative_price_is_rejected() {
    let app = TestApp::new().await;
    let staff = app.staff_token();

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({ "name": "Broken", "price": "-1.00" })),
            Some(&staff),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn products_filter_by_category_and_brand() {
    let app = TestApp::new().await;
    let category = create(&app, "/api/v1/categories", json!({ "name": "Chargers" })).await;
    let brand = create(&app, "/api/v1/brands", json!({ "name": "Acme Mobile" })).await;
    assert_eq!(category["slug"], "chargers");
    assert_eq!(brand["slug"], "acme-mobile");

    let brand_id = brand["id"].as_str().expect("brand id");
    let phone = create(
        &app,
        &format!("/api/v1/brands/{brand_id}/phone-models"),
        json!({ "name": "Acme X1" }),
    )
    .await;
    assert_eq!(phone["brand_id"], brand_id);

    let charger = create(
        &app,
        "/api/v1/products",
        json!({
            "name": "Fast Charger",
            "price": "29.00",
            "category_id": category["id"],
            "brand_id": brand["id"],
            "compatible_with": [phone["id"]],
        }),
    )
    .await;
    app.seed_product("Unrelated Strap", "3.00", None).await;

    let (_, all) = app.request(Method::GET, "/api/v1/products", None, None).await;
    assert_eq!(all["data"]["total"], 2);

    let (_, filtered) = app
        .request(
            Method::GET,
            &format!(
                "/api/v1/products?category_id={}",
                category["id"].as_str().expect("category id")
            ),
            None,
            None,
        )
        .await;
    assert_eq!(filtered["data"]["total"], 1);
    assert_eq!(filtered["data"]["items"][0]["name"], "Fast Charger");

    let (_, filtered) = app
        .request(
            Method::GET,
            &format!("/api/v1/products?brand_id={brand_id}&page=1&limit=5"),
            None,
            None,
        )
        .await;
    assert_eq!(filtered["data"]["total"], 1);
    assert_eq!(filtered["data"]["limit"], 5);

    let (_, models) = app
        .request(
            Method::GET,
            &format!("/api/v1/brands/{brand_id}/phone-models"),
            None,
            None,
        )
        .await;
    assert_eq!(models["data"].as_array().map(Vec::len), Some(1));

    let phone_id = phone["id"].as_str().expect("phone model id");
    let (_, compatible) = app
        .request(
            Method::GET,
            &format!("/api/v1/products?phone_model_id={phone_id}"),
            None,
            None,
        )
        .await;
    assert_eq!(compatible["data"]["total"], 1);
    assert_eq!(compatible["data"]["items"][0]["id"], charger["id"]);

    let charger_id = charger["id"].as_str().expect("product id");
    let (status, fits) = app
        .request(
            Method::GET,
            &format!("/api/v1/products/{charger_id}/phone-models"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fits["data"][0]["slug"], "acme-x1");
}

#[tokio::test]
async fn product_with_unknown_category_is_not_found() {
    let app = TestApp::new().await;
    let staff = app.staff_token();

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({ "name": "Orphan", "price": "2.00", "category_id": Uuid::new_v4() })),
            Some(&staff),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_media_is_attached_and_listed() {
    let app = TestApp::new().await;
    let product_id = app.seed_product("Gradient Case", "18.00", None).await;
    let uri = format!("/api/v1/products/{product_id}/media");

    let media = create(
        &app,
        &uri,
        json!({ "media_type": "IMAGE", "url": "https://cdn.example.com/gradient.jpg" }),
    )
    .await;
    assert_eq!(media["product_id"], product_id.to_string());

    let (status, listed) = app.request(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn wishlist_add_remove_and_clear() {
    let app = TestApp::new().await;
    let token = app.customer_token("alice");
    let first = app.seed_product("Desk Stand", "22.00", None).await;
    let second = app.seed_product("Pop Grip", "6.00", None).await;

    let (status, empty) = app
        .request(Method::GET, "/api/v1/wishlist", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty["data"]["products"].as_array().map(Vec::len), Some(0));

    for product_id in [first, second] {
        let (status, body) = app
            .request(
                Method::POST,
                "/api/v1/wishlist/items",
                Some(json!({ "product_id": product_id })),
                Some(&token),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["product_id"], product_id.to_string());
    }

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/wishlist/items",
            Some(json!({ "product_id": first })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listed) = app
        .request(Method::GET, "/api/v1/wishlist", None, Some(&token))
        .await;
    assert_eq!(listed["data"]["products"].as_array().map(Vec::len), Some(2));

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/v1/wishlist/items/{first}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/v1/wishlist/items/{first}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(Method::DELETE, "/api/v1/wishlist", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, cleared) = app
        .request(Method::GET, "/api/v1/wishlist", None, Some(&token))
        .await;
    assert_eq!(cleared["data"]["products"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn wishlist_requires_authentication() {
    let app = TestApp::new().await;

    let (status, _) = app.request(Method::GET, "/api/v1/wishlist", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn testimonials_are_public_to_read_and_signed_in_to_write() {
    let app = TestApp::new().await;
    let token = app.customer_token("alice");

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/testimonials",
            Some(json!({ "body": "Great shop" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, created) = app
        .request(
            Method::POST,
            "/api/v1/testimonials",
            Some(json!({ "body": "Great shop", "author_role": "Customer" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["author_name"], "User alice");

    let (status, listed) = app
        .request(Method::GET, "/api/v1/testimonials", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(listed["data"][0]["body"], "Great shop");
}

#[tokio::test]
async fn categories_list_top_level_with_children_and_counts() {
    let app = TestApp::new().await;
    let power = create(&app, "/api/v1/categories", json!({ "name": "Power" })).await;
    let banks = create(
        &app,
        "/api/v1/categories",
        json!({ "name": "Power Banks", "parent_id": power["id"] }),
    )
    .await;
    create(
        &app,
        "/api/v1/products",
        json!({ "name": "10k Bank", "price": "35.00", "category_id": banks["id"] }),
    )
    .await;
    create(
        &app,
        "/api/v1/products",
        json!({ "name": "20k Bank", "price": "55.00", "category_id": banks["id"] }),
    )
    .await;

    let (status, body) = app.request(Method::GET, "/api/v1/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let roots = body["data"].as_array().expect("category array");
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["slug"], "power");
    assert_eq!(roots[0]["product_count"], 0);
    assert_eq!(roots[0]["children"][0]["id"], banks["id"]);
    assert_eq!(roots[0]["children"][0]["product_count"], 2);
}

#[tokio::test]
async fn compatibility_can_be_replaced_by_staff_only() {
    let app = TestApp::new().await;
    let brand = create(&app, "/api/v1/brands", json!({ "name": "Pixelworks" })).await;
    let brand_id = brand["id"].as_str().expect("brand id");
    let phone = create(
        &app,
        &format!("/api/v1/brands/{brand_id}/phone-models"),
        json!({ "name": "P9" }),
    )
    .await;
    let product_id = app.seed_product("Glass Guard", "11.00", None).await;
    let uri = format!("/api/v1/products/{product_id}/phone-models");

    let customer = app.customer_token("hana");
    let (status, _) = app
        .request(
            Method::PUT,
            &uri,
            Some(json!({ "phone_model_ids": [phone["id"]] })),
            Some(&customer),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let staff = app.staff_token();
    let (status, body) = app
        .request(
            Method::PUT,
            &uri,
            Some(json!({ "phone_model_ids": [phone["id"]] })),
            Some(&staff),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "P9");

    let (status, _) = app
        .request(
            Method::PUT,
            &uri,
            Some(json!({ "phone_model_ids": [Uuid::new_v4()] })),
            Some(&staff),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, still) = app.request(Method::GET, &uri, None, None).await;
    assert_eq!(still["data"].as_array().map(Vec::len), Some(1));
}
