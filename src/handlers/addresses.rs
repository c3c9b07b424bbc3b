use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::{AddressModel, AddressType},
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response, AppJson},
    services::commerce::AddressInput,
    ApiResponse, AppState,
};

/// Address book of the signed-in user
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/addresses", get(list_addresses).post(create_address))
        .route(
            "/addresses/:id",
            get(get_address).put(update_address).delete(delete_address),
        )
        .with_auth()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressResponse {
    pub id: Uuid,
    pub street_address: String,
    pub apartment_address: Option<String>,
    pub city: String,
    pub state_province: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub address_type: AddressType,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AddressModel> for AddressResponse {
    fn from(a: AddressModel) -> Self {
        Self {
            id: a.id,
            street_address: a.street_address,
            apartment_address: a.apartment_address,
            city: a.city,
            state_province: a.state_province,
            postal_code: a.postal_code,
            country: a.country,
            address_type: a.address_type,
            is_default: a.is_default,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/addresses",
    summary = "List addresses",
    description = "The caller's addresses, defaults first",
    responses(
        (status = 200, description = "Addresses retrieved", body = ApiResponse<Vec<AddressResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "addresses"
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let addresses: Vec<AddressResponse> = state
        .services
        .address
        .list(&auth_user.user_id)
        .await?
        .into_iter()
        .map(AddressResponse::from)
        .collect();
    Ok(success_response(addresses))
}

#[utoipa::path(
    post,
    path = "/api/v1/addresses",
    summary = "Create address",
    request_body = AddressInput,
    responses(
        (status = 201, description = "Address saved", body = ApiResponse<AddressResponse>),
        (status = 400, description = "Invalid address", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "addresses"
)]
pub async fn create_address(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(input): AppJson<AddressInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let address = state
        .services
        .address
        .create(&auth_user.user_id, input)
        .await?;
    Ok(created_response(AddressResponse::from(address)))
}

#[utoipa::path(
    get,
    path = "/api/v1/addresses/{id}",
    summary = "Get address",
    params(("id" = Uuid, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Address retrieved", body = ApiResponse<AddressResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Address not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "addresses"
)]
pub async fn get_address(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let address = state.services.address.get(&auth_user.user_id, id).await?;
    Ok(success_response(AddressResponse::from(address)))
}

#[utoipa::path(
    put,
    path = "/api/v1/addresses/{id}",
    summary = "Replace address",
    params(("id" = Uuid, Path, description = "Address ID")),
    request_body = AddressInput,
    responses(
        (status = 200, description = "Address replaced", body = ApiResponse<AddressResponse>),
        (status = 400, description = "Invalid address", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Address not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "addresses"
)]
pub async fn update_address(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(input): AppJson<AddressInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let address = state
        .services
        .address
        .update(&auth_user.user_id, id, input)
        .await?;
    Ok(success_response(AddressResponse::from(address)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/addresses/{id}",
    summary = "Delete address",
    params(("id" = Uuid, Path, description = "Address ID")),
    responses(
        (status = 204, description = "Address deleted"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Address not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "addresses"
)]
pub async fn delete_address(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.address.delete(&auth_user.user_id, id).await?;
    Ok(no_content_response())
}
