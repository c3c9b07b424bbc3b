use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::ReviewModel,
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response, AppJson},
    services::commerce::{CreateReviewInput, UpdateReviewInput},
    ApiResponse, AppState,
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products/:id/reviews",
            get(list_reviews).post(create_review),
        )
        .route("/reviews/:id", put(update_review).delete(delete_review))
        .with_optional_auth()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Option<String>,
    pub user_name: String,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewModel> for ReviewResponse {
    fn from(r: ReviewModel) -> Self {
        Self {
            id: r.id,
            product_id: r.product_id,
            user_id: r.user_id,
            user_name: r.user_name,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/reviews",
    summary = "List reviews",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Reviews, newest first", body = ApiResponse<Vec<ReviewResponse>>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let reviews: Vec<ReviewResponse> = state
        .services
        .review
        .list_reviews(id)
        .await?
        .into_iter()
        .map(ReviewResponse::from)
        .collect();
    Ok(success_response(reviews))
}

#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/reviews",
    summary = "Create review",
    description = "Guests must supply user_name. The product's review count and average rating are refreshed afterwards.",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = CreateReviewInput,
    responses(
        (status = 201, description = "Review created", body = ApiResponse<ReviewResponse>),
        (status = 400, description = "Invalid rating or missing name", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    Path(id): Path<Uuid>,
    AppJson(input): AppJson<CreateReviewInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let review = state
        .services
        .review
        .create_review(auth_user.as_ref(), id, input)
        .await?;
    Ok(created_response(ReviewResponse::from(review)))
}

#[utoipa::path(
    put,
    path = "/api/v1/reviews/{id}",
    summary = "Update review",
    description = "Author or staff only. Does not refresh the product's rating aggregate.",
    params(("id" = Uuid, Path, description = "Review ID")),
    request_body = UpdateReviewInput,
    responses(
        (status = 200, description = "Review updated", body = ApiResponse<ReviewResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Not the author", body = crate::errors::ErrorResponse),
        (status = 404, description = "Review not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "reviews"
)]
pub async fn update_review(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    Path(id): Path<Uuid>,
    AppJson(input): AppJson<UpdateReviewInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let review = state
        .services
        .review
        .update_review(auth_user.as_ref(), id, input)
        .await?;
    Ok(success_response(ReviewResponse::from(review)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/reviews/{id}",
    summary = "Delete review",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Not the author", body = crate::errors::ErrorResponse),
        (status = 404, description = "Review not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "reviews"
)]
pub async fn delete_review(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .review
        .delete_review(auth_user.as_ref(), id)
        .await?;
    Ok(no_content_response())
}
