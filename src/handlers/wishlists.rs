use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response, AppJson},
    services::commerce::ProductView,
    ApiResponse, AppState,
};

/// Wishlist endpoints for the signed-in user
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/wishlist", get(get_wishlist).delete(clear_wishlist))
        .route("/wishlist/items", post(add_wishlist_item))
        .route("/wishlist/items/:product_id", delete(remove_wishlist_item))
        .with_auth()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddWishlistItemRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistResponse {
    pub id: Uuid,
    pub products: Vec<ProductView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistItemResponse {
    pub id: Uuid,
    pub wishlist_id: Uuid,
    pub product_id: Uuid,
    pub added_at: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/api/v1/wishlist",
    summary = "Get wishlist",
    responses(
        (status = 200, description = "Wishlist retrieved", body = ApiResponse<WishlistResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn get_wishlist(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let view = state.services.wishlist.view(&auth_user.user_id).await?;
    Ok(success_response(WishlistResponse {
        id: view.wishlist.id,
        products: view.products.into_iter().map(ProductView::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/wishlist/items",
    summary = "Add to wishlist",
    request_body = AddWishlistItemRequest,
    responses(
        (status = 201, description = "Product added", body = ApiResponse<WishlistItemResponse>),
        (status = 400, description = "Product already in wishlist", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn add_wishlist_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<AddWishlistItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state
        .services
        .wishlist
        .add_item(&auth_user.user_id, payload.product_id)
        .await?;
    Ok(created_response(WishlistItemResponse {
        id: item.id,
        wishlist_id: item.wishlist_id,
        product_id: item.product_id,
        added_at: item.added_at,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/wishlist/items/{product_id}",
    summary = "Remove from wishlist",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product removed"),
        (status = 404, description = "Product not in wishlist", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn remove_wishlist_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .wishlist
        .remove_item(&auth_user.user_id, product_id)
        .await?;
    Ok(no_content_response())
}

#[utoipa::path(
    delete,
    path = "/api/v1/wishlist",
    summary = "Clear wishlist",
    responses((status = 204, description = "Wishlist emptied")),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn clear_wishlist(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.wishlist.clear(&auth_user.user_id).await?;
    Ok(no_content_response())
}
