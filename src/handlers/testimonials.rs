use axum::{
    extract::State,
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
    entities::TestimonialModel,
    errors::ServiceError,
    handlers::common::{created_response, success_response, AppJson},
    services::commerce::CreateTestimonialInput,
    ApiResponse, AppState,
};

pub fn testimonial_routes() -> Router<AppState> {
    Router::new()
        .route("/testimonials", get(list_testimonials).post(create_testimonial))
        .with_optional_auth()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TestimonialResponse {
    pub id: Uuid,
    pub author_name: String,
    pub author_role: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<TestimonialModel> for TestimonialResponse {
    fn from(t: TestimonialModel) -> Self {
        Self {
            id: t.id,
            author_name: t.author_name,
            author_role: t.author_role,
            body: t.body,
            created_at: t.created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/testimonials",
    summary = "List testimonials",
    responses((status = 200, description = "Testimonials, newest first", body = ApiResponse<Vec<TestimonialResponse>>)),
    tag = "testimonials"
)]
pub async fn list_testimonials(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let testimonials: Vec<TestimonialResponse> = state
        .services
        .testimonial
        .list()
        .await?
        .into_iter()
        .map(TestimonialResponse::from)
        .collect();
    Ok(success_response(testimonials))
}

#[utoipa::path(
    post,
    path = "/api/v1/testimonials",
    summary = "Create testimonial",
    request_body = CreateTestimonialInput,
    responses(
        (status = 201, description = "Testimonial created", body = ApiResponse<TestimonialResponse>),
        (status = 400, description = "Invalid testimonial", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "testimonials"
)]
pub async fn create_testimonial(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(input): AppJson<CreateTestimonialInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let testimonial = state.services.testimonial.create(&auth_user, input).await?;
    Ok(created_response(TestimonialResponse::from(testimonial)))
}
