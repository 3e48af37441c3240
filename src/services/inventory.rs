use crate::{
    entities::product_inventory::{self, Model as InventoryModel},
    errors::ServiceError,
    repositories::{
        inventory_repository::{
            BulkQuantityUpdate, BulkUpdateOutcome, InventoryListFilter, InventoryRepository,
            InventoryStats, QuantityUpdate,
        },
        product_repository::ProductRepository,
    },
    tracing::with_metrics,
};
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

/// Stock row to create; starts at version 0
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewInventory {
    pub product_sku: String,
    #[serde(default)]
    pub warehouse_id: Option<i64>,
    #[serde(default)]
    pub quantity_available: i32,
    #[serde(default)]
    pub quantity_reserved: i32,
    #[serde(default)]
    pub quantity_sold: i32,
    #[serde(default)]
    pub reorder_point: i32,
}

/// Per-SKU totals plus every warehouse row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductStockSummary {
    pub product_sku: String,
    pub total_available: i64,
    pub total_reserved: i64,
    pub locations: Vec<InventoryModel>,
}

/// Service for per-warehouse stock with optimistic locking
#[derive(Clone)]
pub struct InventoryService {
    repository: Arc<InventoryRepository>,
    products: Arc<ProductRepository>,
    max_retries: u32,
}

impl InventoryService {
    /// `max_retries` bounds the reload-and-retry loop used by [`Self::reserve`]
    pub fn new(db_pool: Arc<DatabaseConnection>, max_retries: u32) -> Self {
        Self {
            repository: Arc::new(InventoryRepository::new(db_pool.clone())),
            products: Arc::new(ProductRepository::new(db_pool)),
            max_retries: max_retries.max(1),
        }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<InventoryModel, ServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory {} not found", id)))
    }

    /// `warehouse_id = None` means the default warehouse
    #[instrument(skip(self))]
    pub async fn find_by_product_and_warehouse(
        &self,
        product_sku: &str,
        warehouse_id: Option<i64>,
    ) -> Result<Option<InventoryModel>, ServiceError> {
        self.repository
            .find_by_product_and_warehouse(product_sku, warehouse_id)
            .await
    }

    #[instrument(skip(self))]
    pub async fn find_by_product(
        &self,
        product_sku: &str,
    ) -> Result<Vec<InventoryModel>, ServiceError> {
        self.repository.find_by_product(product_sku).await
    }

    #[instrument(skip(self))]
    pub async fn find_by_warehouse(
        &self,
        warehouse_id: i64,
    ) -> Result<Vec<InventoryModel>, ServiceError> {
        self.repository.find_by_warehouse(warehouse_id).await
    }

    #[instrument(skip(self))]
    pub async fn product_summary(
        &self,
        product_sku: &str,
    ) -> Result<ProductStockSummary, ServiceError> {
        let locations = self.repository.find_by_product(product_sku).await?;
        if locations.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "No inventory for product {}",
                product_sku
            )));
        }

        Ok(ProductStockSummary {
            product_sku: product_sku.to_string(),
            total_available: self.repository.total_available(product_sku).await?,
            total_reserved: self.repository.total_reserved(product_sku).await?,
            locations,
        })
    }

    #[instrument(skip(self))]
    pub async fn low_stock(
        &self,
        warehouse_id: Option<i64>,
    ) -> Result<Vec<InventoryModel>, ServiceError> {
        self.repository.find_low_stock(warehouse_id).await
    }

    #[instrument(skip(self))]
    pub async fn out_of_stock(
        &self,
        warehouse_id: Option<i64>,
    ) -> Result<Vec<InventoryModel>, ServiceError> {
        self.repository.find_out_of_stock(warehouse_id).await
    }

    #[instrument(skip(self))]
    pub async fn stats(
        &self,
        warehouse_id: Option<i64>,
        product_sku: Option<&str>,
    ) -> Result<InventoryStats, ServiceError> {
        self.repository.stats(warehouse_id, product_sku).await
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &InventoryListFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<InventoryModel>, u64), ServiceError> {
        self.repository.list(filter, page, limit).await
    }

    /// Creates a stock row for a catalog product.
    /// A second row for the same (sku, warehouse) is a `Conflict`.
    #[instrument(skip(self))]
    pub async fn create(&self, input: NewInventory) -> Result<InventoryModel, ServiceError> {
        ensure_non_negative(&[
            ("quantity_available", input.quantity_available),
            ("quantity_reserved", input.quantity_reserved),
            ("quantity_sold", input.quantity_sold),
            ("reorder_point", input.reorder_point),
        ])?;

        if self.products.find_by_sku(&input.product_sku).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                input.product_sku
            )));
        }

        if self
            .repository
            .find_by_product_and_warehouse(&input.product_sku, input.warehouse_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(format!(
                "Inventory for {} in warehouse {:?} already exists",
                input.product_sku, input.warehouse_id
            )));
        }

        let created = self
            .repository
            .create(product_inventory::ActiveModel {
                product_sku: Set(input.product_sku),
                warehouse_id: Set(input.warehouse_id),
                quantity_available: Set(input.quantity_available),
                quantity_reserved: Set(input.quantity_reserved),
                quantity_sold: Set(input.quantity_sold),
                reorder_point: Set(input.reorder_point),
                ..Default::default()
            })
            .await?;

        info!(id = created.id, product_sku = %created.product_sku, "Inventory created");
        Ok(created)
    }

    /// Single versioned write; see [`InventoryRepository::update_quantities`].
    #[instrument(skip(self))]
    pub async fn update_quantities(
        &self,
        id: i64,
        expected_version: i32,
        update: QuantityUpdate,
    ) -> Result<InventoryModel, ServiceError> {
        validate_quantity_update(&update)?;

        let updated = with_metrics("inventory.update_quantities", || {
            self.repository
                .update_quantities(id, expected_version, &update)
        })
        .await?;

        info!(id, version = updated.version, "Inventory quantities updated");
        Ok(updated)
    }

    /// Reload-and-reapply loop around the versioned write.
    ///
    /// `compute` derives the new quantities from a fresh snapshot each attempt.
    /// Only `ConcurrencyConflict` is retried; after `max_attempts` the last
    /// conflict is returned.
    pub async fn update_with_retry<F>(
        &self,
        id: i64,
        max_attempts: u32,
        compute: F,
    ) -> Result<InventoryModel, ServiceError>
    where
        F: Fn(&InventoryModel) -> Result<QuantityUpdate, ServiceError>,
    {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let current = self.get(id).await?;
            let update = compute(&current)?;
            validate_quantity_update(&update)?;

            match self
                .repository
                .update_quantities(id, current.version, &update)
                .await
            {
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    warn!(id, attempt, max_attempts, "inventory write conflicted, retrying");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Moves `quantity` units from available to reserved
    #[instrument(skip(self))]
    pub async fn reserve(&self, id: i64, quantity: i32) -> Result<InventoryModel, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "quantity must be greater than 0".to_string(),
            ));
        }

        let reserved = self
            .update_with_retry(id, self.max_retries, |current| {
                if current.quantity_available < quantity {
                    return Err(ServiceError::InsufficientStock(format!(
                        "{} available for {}, {} requested",
                        current.quantity_available, current.product_sku, quantity
                    )));
                }
                let reserved = current.quantity_reserved.checked_add(quantity).ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "reserving {} more units of {} exceeds the reserved quantity limit",
                        quantity, current.product_sku
                    ))
                })?;
                Ok(QuantityUpdate {
                    quantity_available: Some(current.quantity_available - quantity),
                    quantity_reserved: Some(reserved),
                    quantity_sold: None,
                })
            })
            .await?;

        info!(id, quantity, "Inventory reserved");
        Ok(reserved)
    }

    /// Best-effort overwrite; unknown (sku, warehouse) keys are reported, not fatal
    #[instrument(skip(self, updates), fields(count = updates.len()))]
    pub async fn bulk_update(
        &self,
        updates: Vec<BulkQuantityUpdate>,
    ) -> Result<BulkUpdateOutcome, ServiceError> {
        for update in &updates {
            validate_quantity_update(&update.quantities)?;
        }

        let outcome = self.repository.bulk_update_quantities(&updates).await?;
        info!(
            updated = outcome.updated,
            skipped = outcome.skipped.len(),
            "Bulk inventory update finished"
        );
        Ok(outcome)
    }
}

fn validate_quantity_update(update: &QuantityUpdate) -> Result<(), ServiceError> {
    if update.is_empty() {
        return Err(ServiceError::ValidationError(
            "at least one quantity must be provided".to_string(),
        ));
    }

    ensure_non_negative(&[
        ("quantity_available", update.quantity_available.unwrap_or(0)),
        ("quantity_reserved", update.quantity_reserved.unwrap_or(0)),
        ("quantity_sold", update.quantity_sold.unwrap_or(0)),
    ])
}

fn ensure_non_negative(values: &[(&str, i32)]) -> Result<(), ServiceError> {
    match values.iter().find(|(_, v)| *v < 0) {
        Some((field, value)) => Err(ServiceError::ValidationError(format!(
            "{} cannot be negative (got {})",
            field, value
        ))),
        None => Ok(()),
    }
}
