use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::{OrderItemModel, OrderStatus},
    errors::ServiceError,
    handlers::common::{created_response, paginated, success_response, AppJson},
    services::commerce::{
        ExplicitOrderItem, OrderScope, OrderWithItems, ShippingAddress, UpdateOrderInput,
    },
    ApiResponse, AppState, ListQuery, PaginatedResponse,
};

/// Order endpoints. Guests may place explicit orders; everything else
/// needs a token, which the handlers demand through the `AuthUser`
/// extractor.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/checkout", post(checkout))
        .route("/orders/:id", get(get_order).patch(update_order))
        .with_optional_auth()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub shipping_address: ShippingAddress,
    pub items: Vec<ExplicitOrderItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddress,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub price: Decimal,
    pub quantity: i32,
    pub cost: Decimal,
}

impl From<OrderItemModel> for OrderItemResponse {
    fn from(item: OrderItemModel) -> Self {
        Self {
            cost: item.cost(),
            id: item.id,
            product_id: item.product_id,
            price: item.price,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub street_address: String,
    pub apartment_address: Option<String>,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub status: OrderStatus,
    pub is_paid: bool,
    pub payment_transaction_id: Option<String>,
    pub items: Vec<OrderItemResponse>,
    /// Sum of item price times quantity
    pub total_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderWithItems> for OrderResponse {
    fn from(placed: OrderWithItems) -> Self {
        let total_cost = placed.total_cost();
        let order = placed.order;
        Self {
            id: order.id,
            user_id: order.user_id,
            first_name: order.first_name,
            last_name: order.last_name,
            email: order.email,
            street_address: order.street_address,
            apartment_address: order.apartment_address,
            postal_code: order.postal_code,
            city: order.city,
            country: order.country,
            status: order.status,
            is_paid: order.is_paid,
            payment_transaction_id: order.payment_transaction_id,
            items: placed.items.into_iter().map(OrderItemResponse::from).collect(),
            total_cost,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Create order",
    description = "Place an order with caller-supplied line prices. A bearer token is optional; without one the order is recorded as a guest order.",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid order data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid token", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    AppJson(request): AppJson<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let buyer = auth_user.as_ref().map(|user| user.user_id.as_str());
    let placed = state
        .services
        .order
        .create_order_explicit(buyer, request.shipping_address, request.items)
        .await?;
    Ok(created_response(OrderResponse::from(placed)))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/checkout",
    summary = "Checkout cart",
    description = "Convert the caller's cart into an order at current prices and empty the cart",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order created from cart", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Cart is empty or address invalid", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(request): AppJson<CheckoutRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let placed = state
        .services
        .order
        .create_order_from_cart(&auth_user.user_id, request.shipping_address)
        .await?;
    Ok(created_response(OrderResponse::from(placed)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "List orders",
    description = "Newest first. Staff see every order; customers see their own.",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20, max: 100)"),
    ),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<PaginatedResponse<OrderResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<OrderResponse>>>, ServiceError> {
    let (page, limit) = query.normalized();
    let scope = OrderScope::from(&auth_user);
    let (orders, total) = state.services.order.list_orders(&scope, page, limit).await?;
    let items = orders.into_iter().map(OrderResponse::from).collect();
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    summary = "Get order",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order retrieved", body = ApiResponse<OrderResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let scope = OrderScope::from(&auth_user);
    let order = state.services.order.get_order(&scope, id).await?;
    Ok(success_response(OrderResponse::from(order)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}",
    summary = "Update order",
    description = "Staff only. Sets status and/or the paid flag; any status may follow any other.",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderInput,
    responses(
        (status = 200, description = "Order updated", body = ApiResponse<OrderResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Staff role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(input): AppJson<UpdateOrderInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .order
        .update_order(&auth_user, id, input)
        .await?;
    Ok(success_response(OrderResponse::from(order)))
}
