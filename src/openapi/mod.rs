use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "1.0.0",
        description = r#"
# Storefront API

Product catalog, per-warehouse inventory and cart pricing.

## Inventory writes

Quantity updates are version-checked. Send the `version` you last read; a stale
version is rejected with `409 Conflict` and the client should reload and retry.

## Promotion codes

`HAPPYHOURS` takes 18% off the order total. `BUYGETONE` makes the lowest priced
unit free. Unknown codes are ignored.

## Errors

Every error body has the shape:

```json
{
  "error": "Not Found",
  "message": "Product not found!",
  "details": "{\"errorCode\":20002}",
  "request_id": "4f1c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
"#,
    ),
    tags(
        (name = "products", description = "Catalog management"),
        (name = "inventory", description = "Per-warehouse stock"),
        (name = "carts", description = "Cart pricing and checkout"),
    ),
    paths(
        // Products
        crate::handlers::commerce::products::list_products,
        crate::handlers::commerce::products::get_product,
        crate::handlers::commerce::products::create_product,
        crate::handlers::commerce::products::update_product,
        crate::handlers::commerce::products::delete_product,
        // Inventory
        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::create_inventory,
        crate::handlers::inventory::get_inventory,
        crate::handlers::inventory::update_quantities,
        crate::handlers::inventory::reserve_inventory,
        crate::handlers::inventory::bulk_update_inventory,
        crate::handlers::inventory::lookup_inventory,
        crate::handlers::inventory::product_inventory,
        crate::handlers::inventory::low_stock,
        crate::handlers::inventory::out_of_stock,
        crate::handlers::inventory::inventory_stats,
        // Carts
        crate::handlers::commerce::carts::get_user_cart,
        crate::handlers::commerce::carts::preview_cart,
        crate::handlers::commerce::carts::checkout_cart,
        crate::handlers::commerce::carts::preview_saved_cart,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::entities::product::ProductStatus,
            crate::entities::product_inventory::StockStatus,
            crate::services::product_service::ProductInput,
            crate::services::product_service::ProductImages,
            crate::handlers::commerce::products::ProductResponse,
            crate::handlers::inventory::InventoryResponse,
            crate::handlers::inventory::ProductStockResponse,
            crate::handlers::inventory::CreateInventoryRequest,
            crate::handlers::inventory::UpdateQuantitiesRequest,
            crate::handlers::inventory::ReserveRequest,
            crate::handlers::inventory::BulkUpdateRequest,
            crate::repositories::inventory_repository::BulkQuantityUpdate,
            crate::repositories::inventory_repository::BulkUpdateOutcome,
            crate::repositories::inventory_repository::InventoryKey,
            crate::repositories::inventory_repository::InventoryStats,
            crate::repositories::inventory_repository::QuantityUpdate,
            crate::services::commerce::pricing_service::LineItem,
            crate::services::commerce::pricing_service::CartPreview,
            crate::services::commerce::pricing_service::PricedLineItem,
            crate::services::commerce::pricing_service::PromotionResult,
            crate::services::commerce::pricing_service::PromotionKind,
            crate::services::commerce::PreviewCartRequest,
            crate::services::commerce::CheckoutCartRequest,
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
