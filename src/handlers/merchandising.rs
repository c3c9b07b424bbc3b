use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use uuid::Uuid;

use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::ServiceError,
    handlers::{
        common::{created_response, no_content_response, success_response, AppJson},
        products::require_staff,
    },
    services::commerce::{
        BannerView, CreateBannerInput, CreateSlideInput, SlideView, UpdateBannerInput,
        UpdateSlideInput,
    },
    ApiResponse, AppState,
};

/// Home-page slideshow and promo banners. Reads are public; writes require a
/// staff token.
pub fn merchandising_routes() -> Router<AppState> {
    Router::new()
        .route("/slides", get(list_slides).post(create_slide))
        .route("/slides/:id", put(update_slide).delete(delete_slide))
        .route("/banners", get(list_banners).post(create_banner))
        .route("/banners/:id", put(update_banner).delete(delete_banner))
        .with_optional_auth()
}

#[utoipa::path(
    get,
    path = "/api/v1/slides",
    summary = "List slides",
    description = "Active slideshow entries by position",
    responses((status = 200, description = "Slides retrieved", body = ApiResponse<Vec<SlideView>>)),
    tag = "merchandising"
)]
pub async fn list_slides(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let slides = state.services.merchandising.list_slides().await?;
    Ok(success_response(slides))
}

#[utoipa::path(
    post,
    path = "/api/v1/slides",
    summary = "Create slide",
    request_body = CreateSlideInput,
    responses(
        (status = 201, description = "Slide created", body = ApiResponse<SlideView>),
        (status = 400, description = "Invalid slide", body = crate::errors::ErrorResponse),
        (status = 403, description = "Staff role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "merchandising"
)]
pub async fn create_slide(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    AppJson(input): AppJson<CreateSlideInput>,
) -> Result<impl IntoResponse, ServiceError> {
    require_staff(auth_user.as_ref())?;
    let slide = state.services.merchandising.create_slide(input).await?;
    Ok(created_response(slide))
}

#[utoipa::path(
    put,
    path = "/api/v1/slides/{id}",
    summary = "Update slide",
    params(("id" = Uuid, Path, description = "Slide ID")),
    request_body = UpdateSlideInput,
    responses(
        (status = 200, description = "Slide updated", body = ApiResponse<SlideView>),
        (status = 403, description = "Staff role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Slide not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "merchandising"
)]
pub async fn update_slide(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    Path(id): Path<Uuid>,
    AppJson(input): AppJson<UpdateSlideInput>,
) -> Result<impl IntoResponse, ServiceError> {
    require_staff(auth_user.as_ref())?;
    let slide = state.services.merchandising.update_slide(id, input).await?;
    Ok(success_response(slide))
}

#[utoipa::path(
    delete,
    path = "/api/v1/slides/{id}",
    summary = "Delete slide",
    params(("id" = Uuid, Path, description = "Slide ID")),
    responses(
        (status = 204, description = "Slide deleted"),
        (status = 403, description = "Staff role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Slide not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "merchandising"
)]
pub async fn delete_slide(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    require_staff(auth_user.as_ref())?;
    state.services.merchandising.delete_slide(id).await?;
    Ok(no_content_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/banners",
    summary = "List banners",
    description = "Active promo banners by position",
    responses((status = 200, description = "Banners retrieved", body = ApiResponse<Vec<BannerView>>)),
    tag = "merchandising"
)]
pub async fn list_banners(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let banners = state.services.merchandising.list_banners().await?;
    Ok(success_response(banners))
}

#[utoipa::path(
    post,
    path = "/api/v1/banners",
    summary = "Create banner",
    description = "Staff only. `size` defaults to `small`.",
    request_body = CreateBannerInput,
    responses(
        (status = 201, description = "Banner created", body = ApiResponse<BannerView>),
        (status = 400, description = "Invalid banner", body = crate::errors::ErrorResponse),
        (status = 403, description = "Staff role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "merchandising"
)]
pub async fn create_banner(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    AppJson(input): AppJson<CreateBannerInput>,
) -> Result<impl IntoResponse, ServiceError> {
    require_staff(auth_user.as_ref())?;
    let banner = state.services.merchandising.create_banner(input).await?;
    Ok(created_response(banner))
}

#[utoipa::path(
    put,
    path = "/api/v1/banners/{id}",
    summary = "Update banner",
    params(("id" = Uuid, Path, description = "Banner ID")),
    request_body = UpdateBannerInput,
    responses(
        (status = 200, description = "Banner updated", body = ApiResponse<BannerView>),
        (status = 403, description = "Staff role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Banner not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "merchandising"
)]
pub async fn update_banner(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    Path(id): Path<Uuid>,
    AppJson(input): AppJson<UpdateBannerInput>,
) -> Result<impl IntoResponse, ServiceError> {
    require_staff(auth_user.as_ref())?;
    let banner = state.services.merchandising.update_banner(id, input).await?;
    Ok(success_response(banner))
}

#[utoipa::path(
    delete,
    path = "/api/v1/banners/{id}",
    summary = "Delete banner",
    params(("id" = Uuid, Path, description = "Banner ID")),
    responses(
        (status = 204, description = "Banner deleted"),
        (status = 403, description = "Staff role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Banner not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "merchandising"
)]
pub async fn delete_banner(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    require_staff(auth_user.as_ref())?;
    state.services.merchandising.delete_banner(id).await?;
    Ok(no_content_response())
}
