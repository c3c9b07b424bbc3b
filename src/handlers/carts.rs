use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::CartItemModel,
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response, AppJson},
    services::commerce::CartWithItems,
    ApiResponse, AppState,
};

/// Cart endpoints. Every route requires a signed-in user and operates on
/// that user's cart.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_cart_item))
        .route(
            "/cart/items/:product_id",
            put(update_cart_item).delete(remove_cart_item),
        )
        .with_auth()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    /// Defaults to 1
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemResponse {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

impl From<CartItemModel> for CartItemResponse {
    fn from(item: CartItemModel) -> Self {
        Self {
            id: item.id,
            cart_id: item.cart_id,
            product_id: item.product_id,
            quantity: item.quantity,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/cart",
    summary = "Get cart",
    description = "Return the caller's cart with priced lines, creating an empty cart on first access",
    responses(
        (status = 200, description = "Cart retrieved", body = ApiResponse<CartWithItems>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let cart_service = &state.services.cart;
    let cart = cart_service.get_or_create_cart(&auth_user.user_id).await?;
    let view = cart_service.cart_with_items(cart).await?;
    Ok(success_response(view))
}

#[utoipa::path(
    post,
    path = "/api/v1/cart/items",
    summary = "Add item to cart",
    description = "Add a product to the cart; an existing line for the product is incremented",
    request_body = AddCartItemRequest,
    responses(
        (status = 201, description = "Line created or incremented", body = ApiResponse<CartItemResponse>),
        (status = 400, description = "Quantity below 1 or malformed body", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn add_cart_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<AddCartItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let cart_service = &state.services.cart;
    let cart = cart_service.get_or_create_cart(&auth_user.user_id).await?;
    let item = cart_service
        .add_item(cart.id, payload.product_id, payload.quantity)
        .await?;
    Ok(created_response(CartItemResponse::from(item)))
}

#[utoipa::path(
    put,
    path = "/api/v1/cart/items/{product_id}",
    summary = "Set line quantity",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity overwritten", body = ApiResponse<CartItemResponse>),
        (status = 400, description = "Quantity below 1 or malformed body", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "No line for product", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(product_id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateCartItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let cart_service = &state.services.cart;
    let cart = cart_service
        .find_cart(&auth_user.user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("cart for user", &auth_user.user_id))?;
    let item = cart_service
        .update_item(cart.id, product_id, payload.quantity)
        .await?;
    Ok(success_response(CartItemResponse::from(item)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/{product_id}",
    summary = "Remove line",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Line removed"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "No line for product", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let cart_service = &state.services.cart;
    let cart = cart_service
        .find_cart(&auth_user.user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("cart for user", &auth_user.user_id))?;
    cart_service.remove_item(cart.id, product_id).await?;
    Ok(no_content_response())
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart",
    summary = "Clear cart",
    responses(
        (status = 204, description = "Cart emptied, or the caller has no cart yet"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let cart_service = &state.services.cart;
    if let Some(cart) = cart_service.find_cart(&auth_user.user_id).await? {
        cart_service.clear(cart.id).await?;
    }
    Ok(no_content_response())
}
