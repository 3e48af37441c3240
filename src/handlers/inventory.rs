use crate::handlers::common::{
    created_response, map_service_error, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::{
    entities::product_inventory::{Model as InventoryModel, StockStatus},
    errors::ApiError,
    repositories::inventory_repository::{
        BulkQuantityUpdate, BulkUpdateOutcome, InventoryListFilter, InventoryStats,
        QuantityUpdate, WarehouseFilter,
    },
    services::inventory::{NewInventory, ProductStockSummary},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Creates the router for inventory endpoints
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_inventory).post(create_inventory))
        .route("/inventory/lookup", get(lookup_inventory))
        .route("/inventory/bulk", post(bulk_update_inventory))
        .route("/inventory/low-stock", get(low_stock))
        .route("/inventory/out-of-stock", get(out_of_stock))
        .route("/inventory/stats", get(inventory_stats))
        .route("/inventory/products/:sku", get(product_inventory))
        .route("/inventory/:id", get(get_inventory))
        .route("/inventory/:id/quantities", patch(update_quantities))
        .route("/inventory/:id/reserve", post(reserve_inventory))
}

/// Stock row plus derived fields
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryResponse {
    pub id: i64,
    pub product_sku: String,
    /// `null` is the default warehouse
    pub warehouse_id: Option<i64>,
    pub quantity_available: i32,
    pub quantity_reserved: i32,
    pub quantity_sold: i32,
    pub reorder_point: i32,
    pub version: i32,
    pub total_quantity: i64,
    pub stock_status: StockStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<InventoryModel> for InventoryResponse {
    fn from(model: InventoryModel) -> Self {
        Self {
            total_quantity: model.total_quantity(),
            stock_status: model.stock_status(),
            id: model.id,
            product_sku: model.product_sku,
            warehouse_id: model.warehouse_id,
            quantity_available: model.quantity_available,
            quantity_reserved: model.quantity_reserved,
            quantity_sold: model.quantity_sold,
            reorder_point: model.reorder_point,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn to_responses(rows: Vec<InventoryModel>) -> Vec<InventoryResponse> {
    rows.into_iter().map(InventoryResponse::from).collect()
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductStockResponse {
    pub product_sku: String,
    pub total_available: i64,
    pub total_reserved: i64,
    pub locations: Vec<InventoryResponse>,
}

impl From<ProductStockSummary> for ProductStockResponse {
    fn from(summary: ProductStockSummary) -> Self {
        Self {
            product_sku: summary.product_sku,
            total_available: summary.total_available,
            total_reserved: summary.total_reserved,
            locations: to_responses(summary.locations),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
pub struct InventoryFilters {
    /// Matched against SKU or product name
    pub key: Option<String>,
    #[validate(length(max = 100))]
    pub product_sku: Option<String>,
    /// Omit for every warehouse, `null` for the default warehouse
    pub warehouse_id: Option<String>,
    #[param(value_type = Option<String>)]
    pub stock_status: Option<StockStatus>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct WarehouseQuery {
    pub warehouse_id: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LookupQuery {
    pub sku: String,
    /// Omit for the default warehouse
    pub warehouse_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct StatsQuery {
    pub warehouse_id: Option<i64>,
    pub product_sku: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateInventoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub product_sku: String,
    pub warehouse_id: Option<i64>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub quantity_available: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub quantity_reserved: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub quantity_sold: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub reorder_point: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateQuantitiesRequest {
    /// Version the client last read
    #[validate(range(min = 0))]
    pub version: i32,
    #[validate(range(min = 0))]
    pub quantity_available: Option<i32>,
    #[validate(range(min = 0))]
    pub quantity_reserved: Option<i32>,
    #[validate(range(min = 0))]
    pub quantity_sold: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReserveRequest {
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BulkUpdateRequest {
    pub updates: Vec<BulkQuantityUpdate>,
}

/// `None` = every warehouse, `"null"` or empty = default warehouse
fn parse_warehouse_filter(raw: Option<&str>) -> Result<WarehouseFilter, ApiError> {
    match raw.map(str::trim) {
        None => Ok(WarehouseFilter::Any),
        Some("") | Some("null") => Ok(WarehouseFilter::Default),
        Some(value) => value.parse().map(WarehouseFilter::Id).map_err(|_| {
            ApiError::ValidationError(format!("warehouse_id: '{}' is not a number", value))
        }),
    }
}

/// List stock rows
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(PaginationParams, InventoryFilters),
    responses(
        (status = 200, description = "Page of stock rows"),
        (status = 400, description = "Invalid query", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<InventoryFilters>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&pagination)?;
    validate_input(&filters)?;

    let limit = state.config.clamp_page_size(pagination.limit);
    let filter = InventoryListFilter {
        keyword: filters.key,
        product_sku: filters.product_sku,
        warehouse: parse_warehouse_filter(filters.warehouse_id.as_deref())?,
        stock_status: filters.stock_status,
    };

    let (rows, total) = state
        .services
        .inventory
        .list(&filter, pagination.page, limit)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        to_responses(rows),
        pagination.page,
        limit,
        total,
    )))
}

/// Create a stock row at version 0
#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = CreateInventoryRequest,
    responses(
        (status = 201, description = "Stock row created", body = InventoryResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse),
        (status = 409, description = "Row already exists for this warehouse", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn create_inventory(
    State(state): State<AppState>,
    Json(payload): Json<CreateInventoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let created = state
        .services
        .inventory
        .create(NewInventory {
            product_sku: payload.product_sku,
            warehouse_id: payload.warehouse_id,
            quantity_available: payload.quantity_available,
            quantity_reserved: payload.quantity_reserved,
            quantity_sold: payload.quantity_sold,
            reorder_point: payload.reorder_point,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(InventoryResponse::from(created)))
}

/// Stock row detail
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}",
    params(("id" = i64, Path, description = "Inventory id")),
    responses(
        (status = 200, description = "Stock row", body = InventoryResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn get_inventory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .services
        .inventory
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(InventoryResponse::from(row)))
}

/// Versioned quantity write; a stale `version` yields 409
#[utoipa::path(
    patch,
    path = "/api/v1/inventory/{id}/quantities",
    params(("id" = i64, Path, description = "Inventory id")),
    request_body = UpdateQuantitiesRequest,
    responses(
        (status = 200, description = "Quantities written", body = InventoryResponse),
        (status = 400, description = "Invalid quantities", body = crate::errors::ErrorResponse),
        (status = 409, description = "Version conflict", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn update_quantities(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuantitiesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let updated = state
        .services
        .inventory
        .update_quantities(
            id,
            payload.version,
            QuantityUpdate {
                quantity_available: payload.quantity_available,
                quantity_reserved: payload.quantity_reserved,
                quantity_sold: payload.quantity_sold,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(InventoryResponse::from(updated)))
}

/// Move units from available to reserved, retrying on version conflicts
#[utoipa::path(
    post,
    path = "/api/v1/inventory/{id}/reserve",
    params(("id" = i64, Path, description = "Inventory id")),
    request_body = ReserveRequest,
    responses(
        (status = 200, description = "Units reserved", body = InventoryResponse),
        (status = 409, description = "Retries exhausted", body = crate::errors::ErrorResponse),
        (status = 422, description = "Not enough stock", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn reserve_inventory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ReserveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let reserved = state
        .services
        .inventory
        .reserve(id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(InventoryResponse::from(reserved)))
}

/// Best-effort overwrite keyed by (sku, warehouse)
#[utoipa::path(
    post,
    path = "/api/v1/inventory/bulk",
    request_body = BulkUpdateRequest,
    responses(
        (status = 200, description = "Rows updated; unknown keys listed as skipped", body = BulkUpdateOutcome),
        (status = 400, description = "Invalid quantities", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn bulk_update_inventory(
    State(state): State<AppState>,
    Json(payload): Json<BulkUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .services
        .inventory
        .bulk_update(payload.updates)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(outcome))
}

/// Stock row for one product in one warehouse
#[utoipa::path(
    get,
    path = "/api/v1/inventory/lookup",
    params(LookupQuery),
    responses(
        (status = 200, description = "Stock row", body = InventoryResponse),
        (status = 404, description = "No row for this product and warehouse", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn lookup_inventory(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .services
        .inventory
        .find_by_product_and_warehouse(&query.sku, query.warehouse_id)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| ApiError::NotFound {
            message: format!(
                "No inventory for {} in warehouse {}",
                query.sku,
                query
                    .warehouse_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "default".to_string())
            ),
            error_code: None,
        })?;

    Ok(success_response(InventoryResponse::from(row)))
}

/// Every warehouse row for a SKU, with totals
#[utoipa::path(
    get,
    path = "/api/v1/inventory/products/{sku}",
    params(("sku" = String, Path, description = "Product SKU")),
    responses(
        (status = 200, description = "Per-warehouse stock", body = ProductStockResponse),
        (status = 404, description = "No stock rows", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn product_inventory(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .services
        .inventory
        .product_summary(&sku)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductStockResponse::from(summary)))
}

/// Rows at or below their reorder point
#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    params(WarehouseQuery),
    responses((status = 200, description = "Low stock rows", body = [InventoryResponse])),
    tag = "inventory"
)]
pub async fn low_stock(
    State(state): State<AppState>,
    Query(query): Query<WarehouseQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .services
        .inventory
        .low_stock(query.warehouse_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(to_responses(rows)))
}

/// Rows with nothing available
#[utoipa::path(
    get,
    path = "/api/v1/inventory/out-of-stock",
    params(WarehouseQuery),
    responses((status = 200, description = "Out of stock rows", body = [InventoryResponse])),
    tag = "inventory"
)]
pub async fn out_of_stock(
    State(state): State<AppState>,
    Query(query): Query<WarehouseQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .services
        .inventory
        .out_of_stock(query.warehouse_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(to_responses(rows)))
}

/// Aggregate stock figures
#[utoipa::path(
    get,
    path = "/api/v1/inventory/stats",
    params(StatsQuery),
    responses((status = 200, description = "Inventory statistics", body = InventoryStats)),
    tag = "inventory"
)]
pub async fn inventory_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state
        .services
        .inventory
        .stats(query.warehouse_id, query.product_sku.as_deref())
        .await
        .map_err(map_service_error)?;

    Ok(success_response(stats))
}
