use crate::{
    entities::product::{self, Model as ProductModel, ProductStatus},
    errors::ServiceError,
    repositories::product_repository::{ProductListFilter, ProductRepository},
};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Error code returned alongside a duplicate SKU rejection
pub const SKU_ALREADY_EXISTS: u32 = 20001;
/// Error code returned when a product is missing or soft-deleted
pub const PRODUCT_NOT_FOUND: u32 = 20002;

pub const SKU_ALREADY_EXISTS_MESSAGE: &str = "SKU already exists!";
pub const PRODUCT_NOT_FOUND_MESSAGE: &str = "Product not found!";

pub static SKU_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9_-]+$").expect("valid SKU pattern"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductImages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tablet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop: Option<String>,
}

/// Full product payload; used for both create and replace-style update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ProductInput {
    #[validate(
        length(min = 1, max = 100, message = "SKU must not exceed 100 characters"),
        regex(
            path = "SKU_PATTERN",
            message = "SKU must contain only uppercase letters, numbers, hyphens, and underscores"
        )
    )]
    pub sku: String,

    #[validate(length(min = 1, max = 255, message = "Name must not exceed 255 characters"))]
    pub name: String,

    #[validate(custom = "validate_price")]
    #[schema(value_type = String, example = "6.50")]
    pub price: Decimal,

    #[serde(default)]
    pub status: Option<ProductStatus>,

    #[validate(length(max = 100, message = "Category must not exceed 100 characters"))]
    pub category: Option<String>,

    #[validate(length(max = 1000, message = "Description must not exceed 1000 characters"))]
    pub description: Option<String>,

    pub images: Option<ProductImages>,
}

/// Positive, at most two decimal places
fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() || price.is_zero() {
        let mut err = ValidationError::new("price");
        err.message = Some("Price must be greater than 0".into());
        return Err(err);
    }
    if price.normalize().scale() > 2 {
        let mut err = ValidationError::new("price");
        err.message = Some("Price must be a number with up to 2 decimal places".into());
        return Err(err);
    }
    Ok(())
}

/// Catalog operations with SKU uniqueness and soft delete
#[derive(Clone)]
pub struct ProductService {
    repository: Arc<ProductRepository>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self {
            repository: Arc::new(ProductRepository::new(db_pool)),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &ProductListFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<ProductModel>, u64), ServiceError> {
        self.repository.list(filter, page, limit).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<ProductModel, ServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(PRODUCT_NOT_FOUND_MESSAGE.to_string()))
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create(&self, input: ProductInput) -> Result<ProductModel, ServiceError> {
        input.validate()?;
        self.ensure_unique_sku(None, &input.sku).await?;

        let product = self
            .repository
            .create(product::ActiveModel {
                sku: Set(input.sku),
                name: Set(input.name),
                price: Set(input.price),
                status: Set(input.status.unwrap_or(ProductStatus::Active)),
                category: Set(input.category),
                description: Set(input.description),
                images: Set(images_json(input.images)?),
                ..Default::default()
            })
            .await?;

        info!(id = product.id, "Product created");
        Ok(product)
    }

    /// Replaces every editable field of a live product
    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn update(&self, id: i64, input: ProductInput) -> Result<ProductModel, ServiceError> {
        input.validate()?;
        let existing = self.get(id).await?;
        self.ensure_unique_sku(Some(id), &input.sku).await?;

        let mut active: product::ActiveModel = existing.into();
        active.sku = Set(input.sku);
        active.name = Set(input.name);
        active.price = Set(input.price);
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        active.category = Set(input.category);
        active.description = Set(input.description);
        active.images = Set(images_json(input.images)?);

        let product = self.repository.update(active).await?;
        info!(id, "Product updated");
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let existing = self.get(id).await?;
        self.repository.soft_delete(existing).await?;
        info!(id, "Product soft-deleted");
        Ok(())
    }

    async fn ensure_unique_sku(&self, exclude_id: Option<i64>, sku: &str) -> Result<(), ServiceError> {
        if let Some(existing) = self.repository.find_duplicate(exclude_id, sku).await? {
            warn!(existing_id = existing.id, sku, "duplicate SKU rejected");
            return Err(ServiceError::BadRequest(SKU_ALREADY_EXISTS_MESSAGE.to_string()));
        }
        Ok(())
    }
}

fn images_json(images: Option<ProductImages>) -> Result<Option<serde_json::Value>, ServiceError> {
    images
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| ServiceError::InternalError(format!("Failed to encode images: {}", e)))
}
