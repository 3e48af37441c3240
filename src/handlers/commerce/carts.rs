use crate::handlers::common::{envelope_response, map_service_error, validate_input, Envelope};
use crate::{
    errors::ApiError,
    services::commerce::{
        pricing_service::CartPreview, CheckoutCartRequest, PreviewCartRequest,
    },
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

/// Creates the router for cart endpoints
pub fn carts_routes() -> Router<AppState> {
    Router::new()
        .route("/carts/user", get(get_user_cart))
        .route("/carts/preview", post(preview_cart))
        .route("/carts/checkout", post(checkout_cart))
        .route("/carts/:uuid/preview", get(preview_saved_cart))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SavedCartPreviewQuery {
    /// Comma-separated promotion codes
    pub promotion_codes: Option<String>,
}

impl SavedCartPreviewQuery {
    fn codes(&self) -> Vec<String> {
        self.promotion_codes
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Cart of the calling user
#[utoipa::path(
    get,
    path = "/api/v1/carts/user",
    responses((status = 200, description = "Always `data: null` for now")),
    tag = "carts"
)]
pub async fn get_user_cart(State(state): State<AppState>) -> impl IntoResponse {
    envelope_response("Get carts detail success", state.services.carts.detail_by_user())
}

/// Price a cart without saving anything
#[utoipa::path(
    post,
    path = "/api/v1/carts/preview",
    request_body = PreviewCartRequest,
    responses(
        (status = 200, description = "Cart priced", body = Envelope<CartPreview>),
        (status = 400, description = "Invalid items", body = crate::errors::ErrorResponse),
    ),
    tag = "carts"
)]
pub async fn preview_cart(
    State(state): State<AppState>,
    Json(payload): Json<PreviewCartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let preview = state
        .services
        .carts
        .preview(&payload)
        .map_err(map_service_error)?;

    Ok(envelope_response("Cart preview calculated successfully", preview))
}

/// Price a cart for checkout
#[utoipa::path(
    post,
    path = "/api/v1/carts/checkout",
    request_body = CheckoutCartRequest,
    responses(
        (status = 200, description = "Cart priced for checkout", body = Envelope<CartPreview>),
        (status = 400, description = "Invalid items", body = crate::errors::ErrorResponse),
    ),
    tag = "carts"
)]
pub async fn checkout_cart(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutCartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let preview = state
        .services
        .carts
        .checkout(&payload)
        .map_err(map_service_error)?;

    Ok(envelope_response("Cart checkout successfully", preview))
}

/// Price a stored cart from its active items
#[utoipa::path(
    get,
    path = "/api/v1/carts/{uuid}/preview",
    params(("uuid" = String, Path, description = "Cart uuid"), SavedCartPreviewQuery),
    responses(
        (status = 200, description = "Cart priced", body = Envelope<CartPreview>),
        (status = 400, description = "Cart expired", body = crate::errors::ErrorResponse),
        (status = 404, description = "Cart not found", body = crate::errors::ErrorResponse),
    ),
    tag = "carts"
)]
pub async fn preview_saved_cart(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Query(query): Query<SavedCartPreviewQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let preview = state
        .services
        .carts
        .preview_saved_cart(&uuid, &query.codes())
        .await
        .map_err(map_service_error)?;

    Ok(envelope_response("Cart preview calculated successfully", preview))
}
