use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Accessory Shop API",
        version = "1.0.0",
        description = r#"
# Accessory Shop API

Backend for a phone-accessory store: catalog, carts, checkout, orders,
wishlists, address books, product reviews, testimonials and home-page
merchandising.

## Authentication

Tokens are issued by an external identity provider and verified here
(HS256). Send them in the Authorization header:

```
Authorization: Bearer <your-jwt-token>
```

Catalog reads, review reads and explicit orders work without a token.
Carts, wishlists, addresses, checkout and order history require one.
Catalog and merchandising writes and order updates require the `staff` or
`admin` role.

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 20, max 100).
"#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "cart", description = "Per-user shopping cart"),
        (name = "orders", description = "Order placement and history"),
        (name = "catalog", description = "Products, categories, brands and phone models"),
        (name = "reviews", description = "Product reviews"),
        (name = "wishlist", description = "Per-user wishlist"),
        (name = "testimonials", description = "Customer testimonials"),
        (name = "merchandising", description = "Home-page slideshow and promo banners"),
        (name = "addresses", description = "Per-user address book")
    ),
    paths(
        crate::handlers::carts::get_cart,
        crate::handlers::carts::add_cart_item,
        crate::handlers::carts::update_cart_item,
        crate::handlers::carts::remove_cart_item,
        crate::handlers::carts::clear_cart,

        crate::handlers::orders::create_order,
        crate::handlers::orders::checkout,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order,

        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::get_product_by_slug,
        crate::handlers::products::create_product,
        crate::handlers::products::list_product_media,
        crate::handlers::products::add_product_media,
        crate::handlers::products::list_compatible_phone_models,
        crate::handlers::products::set_compatible_phone_models,
        crate::handlers::products::list_categories,
        crate::handlers::products::create_category,
        crate::handlers::products::list_brands,
        crate::handlers::products::create_brand,
        crate::handlers::products::list_phone_models,
        crate::handlers::products::create_phone_model,

        crate::handlers::reviews::list_reviews,
        crate::handlers::reviews::create_review,
        crate::handlers::reviews::update_review,
        crate::handlers::reviews::delete_review,

        crate::handlers::wishlists::get_wishlist,
        crate::handlers::wishlists::add_wishlist_item,
        crate::handlers::wishlists::remove_wishlist_item,
        crate::handlers::wishlists::clear_wishlist,

        crate::handlers::testimonials::list_testimonials,
        crate::handlers::testimonials::create_testimonial,

        crate::handlers::merchandising::list_slides,
        crate::handlers::merchandising::create_slide,
        crate::handlers::merchandising::update_slide,
        crate::handlers::merchandising::delete_slide,
        crate::handlers::merchandising::list_banners,
        crate::handlers::merchandising::create_banner,
        crate::handlers::merchandising::update_banner,
        crate::handlers::merchandising::delete_banner,

        crate::handlers::addresses::list_addresses,
        crate::handlers::addresses::create_address,
        crate::handlers::addresses::get_address,
        crate::handlers::addresses::update_address,
        crate::handlers::addresses::delete_address,
    ),
    components(
        schemas(
            crate::ListQuery,
            crate::errors::ErrorResponse,
            crate::entities::OrderStatus,
            crate::entities::MediaType,
            crate::entities::BannerSize,
            crate::entities::AddressType,
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
