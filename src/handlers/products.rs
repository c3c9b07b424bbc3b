use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::{BrandModel, CategoryModel, MediaType, PhoneModelModel, ProductMediaModel},
    errors::ServiceError,
    handlers::common::{created_response, paginated, success_response, AppJson},
    services::commerce::{
        AddProductMediaInput, CategoryNode, CreateBrandInput, CreateCategoryInput,
        CreatePhoneModelInput, CreateProductInput, ProductFilter, ProductView,
        SetCompatibilityInput,
    },
    ApiResponse, AppState, ListQuery, PaginatedResponse,
};

/// Catalog endpoints. Reads are public; writes require a staff token.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/slug/:slug", get(get_product_by_slug))
        .route("/products/:id", get(get_product))
        .route(
            "/products/:id/media",
            get(list_product_media).post(add_product_media),
        )
        .route(
            "/products/:id/phone-models",
            get(list_compatible_phone_models).put(set_compatible_phone_models),
        )
        .route("/categories", get(list_categories).post(create_category))
        .route("/brands", get(list_brands).post(create_brand))
        .route(
            "/brands/:id/phone-models",
            get(list_phone_models).post(create_phone_model),
        )
        .with_optional_auth()
}

pub(crate) fn require_staff(user: Option<&AuthUser>) -> Result<(), ServiceError> {
    match user {
        Some(user) => user.require_staff(),
        None => Err(ServiceError::Unauthorized(
            "sign in to manage the catalog".to_string(),
        )),
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub description: Option<String>,
}

impl From<CategoryModel> for CategoryResponse {
    fn from(c: CategoryModel) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            parent_id: c.parent_id,
            description: c.description,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BrandResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<BrandModel> for BrandResponse {
    fn from(b: BrandModel) -> Self {
        Self {
            id: b.id,
            name: b.name,
            slug: b.slug,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PhoneModelResponse {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<PhoneModelModel> for PhoneModelResponse {
    fn from(m: PhoneModelModel) -> Self {
        Self {
            id: m.id,
            brand_id: m.brand_id,
            name: m.name,
            slug: m.slug,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductMediaResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub media_type: MediaType,
    pub url: String,
    pub alt_text: Option<String>,
    pub position: i32,
}

impl From<ProductMediaModel> for ProductMediaResponse {
    fn from(m: ProductMediaModel) -> Self {
        Self {
            id: m.id,
            product_id: m.product_id,
            media_type: m.media_type,
            url: m.url,
            alt_text: m.alt_text,
            position: m.position,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    summary = "List products",
    description = "Available products, newest first",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20, max: 100)"),
        ("category_id" = Option<Uuid>, Query, description = "Only products in this category"),
        ("brand_id" = Option<Uuid>, Query, description = "Only products of this brand"),
        ("phone_model_id" = Option<Uuid>, Query, description = "Only products compatible with this phone model"),
    ),
    responses(
        (status = 200, description = "Products retrieved", body = ApiResponse<PaginatedResponse<ProductView>>),
    ),
    tag = "catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, limit) = query.normalized();
    let (products, total) = state
        .services
        .product_catalog
        .list_products(&filter, page, limit)
        .await?;
    let items: Vec<ProductView> = products.into_iter().map(ProductView::from).collect();
    Ok(success_response(paginated(items, total, page, limit)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    summary = "Get product",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product retrieved", body = ApiResponse<ProductView>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.product_catalog.get_product(id).await?;
    Ok(success_response(ProductView::from(product)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/slug/{slug}",
    summary = "Get product by slug",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product retrieved", body = ApiResponse<ProductView>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state
        .services
        .product_catalog
        .get_product_by_slug(&slug)
        .await?;
    Ok(success_response(ProductView::from(product)))
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    summary = "Create product",
    description = "Staff only. The slug is derived from the name and suffixed with -1, -2, ... on collision.",
    request_body = CreateProductInput,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductView>),
        (status = 400, description = "Invalid product data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Staff role required", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn create_product(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    AppJson(input): AppJson<CreateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    require_staff(auth_user.as_ref())?;
    let product = state.services.product_catalog.create_product(input).await?;
    Ok(created_response(ProductView::from(product)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/media",
    summary = "List product media",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Media retrieved", body = ApiResponse<Vec<ProductMediaResponse>>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn list_product_media(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let media: Vec<ProductMediaResponse> = state
        .services
        .product_catalog
        .list_product_media(id)
        .await?
        .into_iter()
        .map(ProductMediaResponse::from)
        .collect();
    Ok(success_response(media))
}

#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/media",
    summary = "Attach media",
    description = "Staff only. Records the URL of an already uploaded image or video.",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = AddProductMediaInput,
    responses(
        (status = 201, description = "Media attached", body = ApiResponse<ProductMediaResponse>),
        (status = 403, description = "Staff role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn add_product_media(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    Path(id): Path<Uuid>,
    AppJson(input): AppJson<AddProductMediaInput>,
) -> Result<impl IntoResponse, ServiceError> {
    require_staff(auth_user.as_ref())?;
    let media = state
        .services
        .product_catalog
        .add_product_media(id, input)
        .await?;
    Ok(created_response(ProductMediaResponse::from(media)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/phone-models",
    summary = "List compatible phone models",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Compatible phone models", body = ApiResponse<Vec<PhoneModelResponse>>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn list_compatible_phone_models(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let models: Vec<PhoneModelResponse> = state
        .services
        .product_catalog
        .list_compatible_phone_models(id)
        .await?
        .into_iter()
        .map(PhoneModelResponse::from)
        .collect();
    Ok(success_response(models))
}

#[utoipa::path(
    put,
    path = "/api/v1/products/{id}/phone-models",
    summary = "Replace compatible phone models",
    description = "Staff only. The given list replaces the product's compatibility set.",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = SetCompatibilityInput,
    responses(
        (status = 200, description = "Compatibility replaced", body = ApiResponse<Vec<PhoneModelResponse>>),
        (status = 403, description = "Staff role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or phone model not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn set_compatible_phone_models(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    Path(id): Path<Uuid>,
    AppJson(input): AppJson<SetCompatibilityInput>,
) -> Result<impl IntoResponse, ServiceError> {
    require_staff(auth_user.as_ref())?;
    let models: Vec<PhoneModelResponse> = state
        .services
        .product_catalog
        .set_compatible_phone_models(id, &input.phone_model_ids)
        .await?
        .into_iter()
        .map(PhoneModelResponse::from)
        .collect();
    Ok(success_response(models))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    summary = "List categories",
    description = "Top-level categories with their product counts and nested children",
    responses((status = 200, description = "Category tree", body = ApiResponse<Vec<CategoryNode>>)),
    tag = "catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let tree = state.services.product_catalog.category_tree().await?;
    Ok(success_response(tree))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    summary = "Create category",
    request_body = CreateCategoryInput,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponse>),
        (status = 403, description = "Staff role required", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn create_category(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    AppJson(input): AppJson<CreateCategoryInput>,
) -> Result<impl IntoResponse, ServiceError> {
    require_staff(auth_user.as_ref())?;
    let category = state.services.product_catalog.create_category(input).await?;
    Ok(created_response(CategoryResponse::from(category)))
}

#[utoipa::path(
    get,
    path = "/api/v1/brands",
    summary = "List brands",
    responses((status = 200, description = "Brands retrieved", body = ApiResponse<Vec<BrandResponse>>)),
    tag = "catalog"
)]
pub async fn list_brands(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let brands: Vec<BrandResponse> = state
        .services
        .product_catalog
        .list_brands()
        .await?
        .into_iter()
        .map(BrandResponse::from)
        .collect();
    Ok(success_response(brands))
}

#[utoipa::path(
    post,
    path = "/api/v1/brands",
    summary = "Create brand",
    request_body = CreateBrandInput,
    responses(
        (status = 201, description = "Brand created", body = ApiResponse<BrandResponse>),
        (status = 403, description = "Staff role required", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn create_brand(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    AppJson(input): AppJson<CreateBrandInput>,
) -> Result<impl IntoResponse, ServiceError> {
    require_staff(auth_user.as_ref())?;
    let brand = state.services.product_catalog.create_brand(input).await?;
    Ok(created_response(BrandResponse::from(brand)))
}

#[utoipa::path(
    get,
    path = "/api/v1/brands/{id}/phone-models",
    summary = "List phone models of a brand",
    params(("id" = Uuid, Path, description = "Brand ID")),
    responses((status = 200, description = "Phone models retrieved", body = ApiResponse<Vec<PhoneModelResponse>>)),
    tag = "catalog"
)]
pub async fn list_phone_models(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let models: Vec<PhoneModelResponse> = state
        .services
        .product_catalog
        .list_phone_models(id)
        .await?
        .into_iter()
        .map(PhoneModelResponse::from)
        .collect();
    Ok(success_response(models))
}

#[utoipa::path(
    post,
    path = "/api/v1/brands/{id}/phone-models",
    summary = "Create phone model",
    params(("id" = Uuid, Path, description = "Brand ID")),
    request_body = CreatePhoneModelInput,
    responses(
        (status = 201, description = "Phone model created", body = ApiResponse<PhoneModelResponse>),
        (status = 403, description = "Staff role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Brand not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "catalog"
)]
pub async fn create_phone_model(
    State(state): State<AppState>,
    auth_user: Option<AuthUser>,
    Path(id): Path<Uuid>,
    AppJson(input): AppJson<CreatePhoneModelInput>,
) -> Result<impl IntoResponse, ServiceError> {
    require_staff(auth_user.as_ref())?;
    let model = state
        .services
        .product_catalog
        .create_phone_model(id, input)
        .await?;
    Ok(created_response(PhoneModelResponse::from(model)))
}
