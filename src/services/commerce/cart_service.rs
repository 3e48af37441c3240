use crate::{
    entities::{
        shopping_cart::{self, Entity as ShoppingCart},
        shopping_cart_item::{self, CartItemStatus, Entity as ShoppingCartItem},
    },
    errors::ServiceError,
    services::commerce::pricing_service::{compute_preview, CartPreview, LineItem},
};
use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewCartRequest {
    #[validate]
    pub items: Vec<LineItem>,
    #[serde(default)]
    #[validate(length(min = 3, max = 3, message = "Currency must be a three-letter code"))]
    pub currency: Option<String>,
    #[serde(default)]
    pub promotion_codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutCartRequest {
    /// Cart being checked out; carried through but not persisted yet
    #[serde(default)]
    pub cart_uuid: Option<String>,
    #[validate]
    pub items: Vec<LineItem>,
    #[serde(default)]
    #[validate(length(min = 3, max = 3, message = "Currency must be a three-letter code"))]
    pub currency: Option<String>,
    #[serde(default)]
    pub promotion_codes: Vec<String>,
}

/// Cart endpoints backed by the pricing engine
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    default_currency: String,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, default_currency: impl Into<String>) -> Self {
        Self {
            db,
            default_currency: default_currency.into(),
        }
    }

    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub fn preview(&self, request: &PreviewCartRequest) -> Result<CartPreview, ServiceError> {
        compute_preview(
            &request.items,
            &request.promotion_codes,
            Some(request.currency.as_deref().unwrap_or(&self.default_currency)),
        )
    }

    /// Prices the cart exactly like [`Self::preview`]; no order is created
    #[instrument(skip(self, request), fields(items = request.items.len(), cart_uuid = ?request.cart_uuid))]
    pub fn checkout(&self, request: &CheckoutCartRequest) -> Result<CartPreview, ServiceError> {
        let preview = compute_preview(
            &request.items,
            &request.promotion_codes,
            Some(request.currency.as_deref().unwrap_or(&self.default_currency)),
        )?;
        info!(total = %preview.total_amount, "Cart checked out");
        Ok(preview)
    }

    /// Prices a stored cart from its active items, without modifying it
    #[instrument(skip(self))]
    pub async fn preview_saved_cart(
        &self,
        cart_uuid: &str,
        promotion_codes: &[String],
    ) -> Result<CartPreview, ServiceError> {
        let cart = ShoppingCart::find_by_id(cart_uuid.to_string())
            .filter(shopping_cart::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_uuid)))?;

        if cart.is_expired(Utc::now()) {
            return Err(ServiceError::BadRequest(format!("Cart {} has expired", cart_uuid)));
        }

        let items: Vec<LineItem> = ShoppingCartItem::find()
            .filter(shopping_cart_item::Column::CartUuid.eq(cart.uuid.as_str()))
            .filter(shopping_cart_item::Column::Status.eq(CartItemStatus::Active))
            .filter(shopping_cart_item::Column::DeletedAt.is_null())
            .order_by_asc(shopping_cart_item::Column::AddedAt)
            .order_by_asc(shopping_cart_item::Column::Id)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|item| LineItem {
                product_sku: item.product_sku,
                product_name: Some(item.product_name),
                product_image: item.product_image,
                quantity: item.quantity,
                unit_price: item.price,
                discount: item.discount_amount,
                notes: item.notes,
            })
            .collect();

        compute_preview(&items, promotion_codes, Some(&cart.currency))
    }

    /// Per-user carts are not tracked yet
    pub fn detail_by_user(&self) -> Option<shopping_cart::Model> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn service() -> CartService {
        CartService::new(Arc::new(DatabaseConnection::Disconnected), "EUR")
    }

    #[test]
    fn preview_falls_back_to_configured_currency() {
        let request = PreviewCartRequest {
            items: vec![LineItem::new("CAKE-001", dec!(4.50), 2)],
            currency: None,
            promotion_codes: vec![],
        };
        let preview = service().preview(&request).unwrap();
        assert_eq!(preview.currency, "EUR");
        assert_eq!(preview.total_amount, dec!(9.00));
    }

    #[test]
    fn checkout_matches_preview() {
        let items = vec![
            LineItem::new("WAFFLE-001", dec!(6.50), 2),
            LineItem::new("PIE-001", dec!(5.00), 1),
        ];
        let codes = vec!["happyhours".to_string()];
        let svc = service();

        let preview = svc
            .preview(&PreviewCartRequest {
                items: items.clone(),
                currency: Some("USD".into()),
                promotion_codes: codes.clone(),
            })
            .unwrap();
        let checkout = svc
            .checkout(&CheckoutCartRequest {
                cart_uuid: None,
                items,
                currency: Some("USD".into()),
                promotion_codes: codes,
            })
            .unwrap();

        assert_eq!(preview, checkout);
    }

    #[test]
    fn request_uses_camel_case_wire_names() {
        let request: PreviewCartRequest = serde_json::from_value(serde_json::json!({
            "items": [{ "productSku": "PIE-001", "quantity": 1, "price": 5 }],
            "promotionCodes": ["BUYGETONE"]
        }))
        .unwrap();
        assert_eq!(request.items[0].unit_price, dec!(5));
        assert_eq!(request.promotion_codes, vec!["BUYGETONE"]);
        assert!(request.currency.is_none());
    }
}
