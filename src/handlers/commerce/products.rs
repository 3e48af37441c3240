use crate::handlers::common::{
    envelope_response, map_service_error, validate_input, Envelope, PaginatedResponse,
    PaginationParams,
};
use crate::{
    entities::product::{Model as ProductModel, ProductStatus},
    errors::{ApiError, ServiceError},
    repositories::product_repository::ProductListFilter,
    services::product_service::{
        ProductImages, ProductInput, PRODUCT_NOT_FOUND, SKU_ALREADY_EXISTS,
        SKU_ALREADY_EXISTS_MESSAGE,
    },
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Creates the router for catalog endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
pub struct ProductFilters {
    /// Keyword matched against name or SKU
    pub key: Option<String>,
    #[validate(length(max = 100, message = "SKU must not exceed 100 characters"))]
    pub sku: Option<String>,
    #[validate(length(max = 255, message = "Name must not exceed 255 characters"))]
    pub name: Option<String>,
    #[param(value_type = Option<String>)]
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i64,
    pub sku: String,
    pub name: String,
    #[schema(value_type = String, example = "6.50")]
    pub price: Decimal,
    pub status: ProductStatus,
    pub category: Option<String>,
    pub description: Option<String>,
    pub images: Option<ProductImages>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductModel> for ProductResponse {
    fn from(model: ProductModel) -> Self {
        Self {
            id: model.id,
            sku: model.sku,
            name: model.name,
            price: model.price,
            status: model.status,
            category: model.category,
            description: model.description,
            images: model
                .images
                .and_then(|value| serde_json::from_value(value).ok()),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Attaches the catalog error codes clients key on
fn catalog_error(err: ServiceError) -> ApiError {
    match err {
        ServiceError::NotFound(message) => ApiError::NotFound {
            message,
            error_code: Some(PRODUCT_NOT_FOUND),
        },
        ServiceError::BadRequest(message) if message == SKU_ALREADY_EXISTS_MESSAGE => {
            ApiError::BadRequest {
                message,
                error_code: Some(SKU_ALREADY_EXISTS),
            }
        }
        other => map_service_error(other),
    }
}

/// List live products
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(PaginationParams, ProductFilters),
    responses(
        (status = 200, description = "Page of products"),
        (status = 400, description = "Invalid query", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<ProductFilters>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&pagination)?;
    validate_input(&filters)?;

    let limit = state.config.clamp_page_size(pagination.limit);
    let filter = ProductListFilter {
        keyword: filters.key,
        sku: filters.sku,
        name: filters.name,
        status: filters.status,
    };

    let (products, total) = state
        .services
        .products
        .list(&filter, pagination.page, limit)
        .await
        .map_err(catalog_error)?;

    let items = products.into_iter().map(ProductResponse::from).collect();
    Ok(envelope_response(
        "Get list data success",
        PaginatedResponse::new(items, pagination.page, limit, total),
    ))
}

/// Product detail
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = Envelope<ProductResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.products.get(id).await.map_err(catalog_error)?;
    Ok(envelope_response(
        "Get Detail data success",
        ProductResponse::from(product),
    ))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product created", body = Envelope<ProductResponse>),
        (status = 400, description = "Invalid payload or duplicate SKU", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<ProductInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let product = state
        .services
        .products
        .create(payload)
        .await
        .map_err(catalog_error)?;

    Ok(envelope_response(
        "Create data success",
        ProductResponse::from(product),
    ))
}

/// Replace a product's editable fields
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product updated", body = Envelope<ProductResponse>),
        (status = 400, description = "Invalid payload or duplicate SKU", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let product = state
        .services
        .products
        .update(id, payload)
        .await
        .map_err(catalog_error)?;

    Ok(envelope_response(
        "Update data success",
        ProductResponse::from(product),
    ))
}

/// Soft-delete a product
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .products
        .delete(id)
        .await
        .map_err(catalog_error)?;

    Ok(envelope_response("Delete data success", serde_json::Value::Null))
}
