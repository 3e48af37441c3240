use chrono::Utc;
use metrics::counter;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::entities::product;
use crate::entities::product_inventory::{
    ActiveModel as InventoryActiveModel, Column, Entity as Inventory, Model as InventoryModel,
    Relation, StockStatus,
};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Absolute quantity values to write; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuantityUpdate {
    pub quantity_available: Option<i32>,
    pub quantity_reserved: Option<i32>,
    pub quantity_sold: Option<i32>,
}

impl QuantityUpdate {
    pub fn is_empty(&self) -> bool {
        self.quantity_available.is_none()
            && self.quantity_reserved.is_none()
            && self.quantity_sold.is_none()
    }
}

/// Identifies a stock row by product and warehouse (`None` = default warehouse)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InventoryKey {
    pub product_sku: String,
    pub warehouse_id: Option<i64>,
}

/// One entry of a best-effort bulk overwrite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BulkQuantityUpdate {
    pub product_sku: String,
    #[serde(default)]
    pub warehouse_id: Option<i64>,
    #[serde(flatten)]
    pub quantities: QuantityUpdate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BulkUpdateOutcome {
    /// Rows found and overwritten
    pub updated: u64,
    /// Entries whose (sku, warehouse) matched no row
    pub skipped: Vec<InventoryKey>,
}

/// Warehouse predicate for list queries.
///
/// `Any` leaves warehouses unfiltered; `Default` matches only the NULL warehouse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WarehouseFilter {
    #[default]
    Any,
    Default,
    Id(i64),
}

#[derive(Debug, Clone, Default)]
pub struct InventoryListFilter {
    /// Substring matched against the SKU or the product name
    pub keyword: Option<String>,
    /// Substring matched against the SKU only
    pub product_sku: Option<String>,
    pub warehouse: WarehouseFilter,
    pub stock_status: Option<StockStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InventoryStats {
    pub total_products: u64,
    pub total_warehouses: u64,
    pub total_records: u64,
    pub total_available: i64,
    pub total_reserved: i64,
    pub total_sold: i64,
    pub low_stock_count: u64,
    pub out_of_stock_count: u64,
    pub in_stock_count: u64,
}

/// Repository for per-warehouse stock rows
#[derive(Debug)]
pub struct InventoryRepository {
    base: BaseRepository,
}

impl InventoryRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<InventoryModel>, ServiceError> {
        Ok(Inventory::find_by_id(id).one(self.base.get_db()).await?)
    }

    /// Exact lookup. `None` selects the default-warehouse row, never "any warehouse".
    pub async fn find_by_product_and_warehouse(
        &self,
        product_sku: &str,
        warehouse_id: Option<i64>,
    ) -> Result<Option<InventoryModel>, ServiceError> {
        let warehouse = match warehouse_id {
            Some(id) => Column::WarehouseId.eq(id),
            None => Column::WarehouseId.is_null(),
        };

        Ok(Inventory::find()
            .filter(Column::ProductSku.eq(product_sku))
            .filter(warehouse)
            .one(self.base.get_db())
            .await?)
    }

    /// All rows for a SKU across warehouses, ordered by warehouse id
    pub async fn find_by_product(
        &self,
        product_sku: &str,
    ) -> Result<Vec<InventoryModel>, ServiceError> {
        Ok(Inventory::find()
            .filter(Column::ProductSku.eq(product_sku))
            .order_by_asc(Column::WarehouseId)
            .all(self.base.get_db())
            .await?)
    }

    pub async fn find_by_warehouse(
        &self,
        warehouse_id: i64,
    ) -> Result<Vec<InventoryModel>, ServiceError> {
        Ok(Inventory::find()
            .filter(Column::WarehouseId.eq(warehouse_id))
            .order_by_asc(Column::ProductSku)
            .all(self.base.get_db())
            .await?)
    }

    /// Rows at or below their reorder point (including empty ones), lowest first
    pub async fn find_low_stock(
        &self,
        warehouse_id: Option<i64>,
    ) -> Result<Vec<InventoryModel>, ServiceError> {
        let mut query = Inventory::find()
            .filter(Column::ReorderPoint.gt(0))
            .filter(Expr::col(Column::QuantityAvailable).lte(Expr::col(Column::ReorderPoint)));
        if let Some(id) = warehouse_id {
            query = query.filter(Column::WarehouseId.eq(id));
        }

        Ok(query
            .order_by_asc(Column::QuantityAvailable)
            .all(self.base.get_db())
            .await?)
    }

    /// Rows with nothing available, most recently touched first
    pub async fn find_out_of_stock(
        &self,
        warehouse_id: Option<i64>,
    ) -> Result<Vec<InventoryModel>, ServiceError> {
        let mut query = Inventory::find().filter(Column::QuantityAvailable.eq(0));
        if let Some(id) = warehouse_id {
            query = query.filter(Column::WarehouseId.eq(id));
        }

        Ok(query
            .order_by_desc(Column::UpdatedAt)
            .all(self.base.get_db())
            .await?)
    }

    pub async fn total_available(&self, product_sku: &str) -> Result<i64, ServiceError> {
        self.sum_for_sku(Column::QuantityAvailable, product_sku).await
    }

    pub async fn total_reserved(&self, product_sku: &str) -> Result<i64, ServiceError> {
        self.sum_for_sku(Column::QuantityReserved, product_sku).await
    }

    async fn sum_for_sku(&self, column: Column, product_sku: &str) -> Result<i64, ServiceError> {
        let total: Option<Option<i64>> = Inventory::find()
            .select_only()
            .column_as(column.sum(), "total")
            .filter(Column::ProductSku.eq(product_sku))
            .into_tuple()
            .one(self.base.get_db())
            .await?;

        Ok(total.flatten().unwrap_or(0))
    }

    pub async fn create(
        &self,
        inventory: InventoryActiveModel,
    ) -> Result<InventoryModel, ServiceError> {
        Ok(inventory.insert(self.base.get_db()).await?)
    }

    /// Version-checked write.
    ///
    /// Sets the supplied quantities and bumps `version` in one conditional
    /// statement keyed on `(id, expected_version)`. No matching row means the
    /// caller's snapshot is stale (or the row is gone) and yields
    /// `ServiceError::ConcurrencyConflict`. The returned record is re-read inside
    /// the same transaction.
    pub async fn update_quantities(
        &self,
        id: i64,
        expected_version: i32,
        update: &QuantityUpdate,
    ) -> Result<InventoryModel, ServiceError> {
        let txn = self.base.get_db().begin().await?;

        let mut stmt = Inventory::update_many()
            .col_expr(Column::Version, Expr::col(Column::Version).add(1))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .filter(Column::Version.eq(expected_version));
        if let Some(v) = update.quantity_available {
            stmt = stmt.col_expr(Column::QuantityAvailable, Expr::value(v));
        }
        if let Some(v) = update.quantity_reserved {
            stmt = stmt.col_expr(Column::QuantityReserved, Expr::value(v));
        }
        if let Some(v) = update.quantity_sold {
            stmt = stmt.col_expr(Column::QuantitySold, Expr::value(v));
        }

        let result = stmt.exec(&txn).await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            counter!("inventory_version_conflicts_total", 1);
            debug!(id, expected_version, "versioned inventory write matched no row");
            return Err(ServiceError::ConcurrencyConflict(format!(
                "inventory {} was modified by another process (expected version {})",
                id, expected_version
            )));
        }

        let updated = Inventory::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory {} not found", id)))?;
        txn.commit().await?;

        Ok(updated)
    }

    /// Best-effort overwrite keyed by (sku, warehouse).
    ///
    /// No version check; each write still bumps `version` so versioned writers
    /// holding an older snapshot will conflict. Missing rows are skipped.
    /// Entries are applied one by one, not in a shared transaction.
    pub async fn bulk_update_quantities(
        &self,
        updates: &[BulkQuantityUpdate],
    ) -> Result<BulkUpdateOutcome, ServiceError> {
        let db = self.base.get_db();
        let mut outcome = BulkUpdateOutcome::default();

        for update in updates {
            let Some(current) = self
                .find_by_product_and_warehouse(&update.product_sku, update.warehouse_id)
                .await?
            else {
                warn!(
                    product_sku = %update.product_sku,
                    warehouse_id = ?update.warehouse_id,
                    "bulk inventory update skipped: no stock row"
                );
                outcome.skipped.push(InventoryKey {
                    product_sku: update.product_sku.clone(),
                    warehouse_id: update.warehouse_id,
                });
                continue;
            };

            let q = &update.quantities;
            Inventory::update_many()
                .col_expr(
                    Column::QuantityAvailable,
                    Expr::value(q.quantity_available.unwrap_or(current.quantity_available)),
                )
                .col_expr(
                    Column::QuantityReserved,
                    Expr::value(q.quantity_reserved.unwrap_or(current.quantity_reserved)),
                )
                .col_expr(
                    Column::QuantitySold,
                    Expr::value(q.quantity_sold.unwrap_or(current.quantity_sold)),
                )
                .col_expr(Column::Version, Expr::col(Column::Version).add(1))
                .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(Column::Id.eq(current.id))
                .exec(db)
                .await?;

            outcome.updated += 1;
        }

        Ok(outcome)
    }

    /// Filtered page ordered by `updated_at DESC, product_sku ASC`.
    /// `page` is 1-based. Returns the page and the total match count.
    pub async fn list(
        &self,
        filter: &InventoryListFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<InventoryModel>, u64), ServiceError> {
        let mut query = Inventory::find();

        if let Some(keyword) = filter.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
            let keyword = keyword.trim();
            query = query
                .join(JoinType::LeftJoin, Relation::Product.def())
                .filter(
                    Condition::any()
                        .add(Column::ProductSku.contains(keyword))
                        .add(product::Column::Name.contains(keyword)),
                );
        }

        if let Some(sku) = filter.product_sku.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(Column::ProductSku.contains(sku));
        }

        query = match filter.warehouse {
            WarehouseFilter::Any => query,
            WarehouseFilter::Default => query.filter(Column::WarehouseId.is_null()),
            WarehouseFilter::Id(id) => query.filter(Column::WarehouseId.eq(id)),
        };

        if let Some(status) = filter.stock_status {
            query = query.filter(stock_status_condition(status));
        }

        let paginator = query
            .order_by_desc(Column::UpdatedAt)
            .order_by_asc(Column::ProductSku)
            .paginate(self.base.get_db(), limit.max(1));

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.max(1) - 1).await?;

        Ok((rows, total))
    }

    /// Aggregate counts over rows matching the optional warehouse and SKU.
    /// `total_warehouses` counts distinct non-default warehouses.
    pub async fn stats(
        &self,
        warehouse_id: Option<i64>,
        product_sku: Option<&str>,
    ) -> Result<InventoryStats, ServiceError> {
        let mut query = Inventory::find();
        if let Some(id) = warehouse_id {
            query = query.filter(Column::WarehouseId.eq(id));
        }
        if let Some(sku) = product_sku {
            query = query.filter(Column::ProductSku.eq(sku));
        }
        let rows = query.all(self.base.get_db()).await?;

        Ok(summarize(&rows))
    }
}

impl Repository for InventoryRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}

fn stock_status_condition(status: StockStatus) -> Condition {
    let available = || Expr::col(Column::QuantityAvailable);
    let reorder_point = || Expr::col(Column::ReorderPoint);

    match status {
        StockStatus::OutOfStock => Condition::all().add(Column::QuantityAvailable.eq(0)),
        StockStatus::LowStock => Condition::all()
            .add(Column::ReorderPoint.gt(0))
            .add(available().lte(reorder_point()))
            .add(Column::QuantityAvailable.gt(0)),
        StockStatus::InStock => Condition::all()
            .add(Column::QuantityAvailable.gt(0))
            .add(
                Condition::any()
                    .add(Column::ReorderPoint.eq(0))
                    .add(available().gt(reorder_point())),
            ),
    }
}

fn summarize(rows: &[InventoryModel]) -> InventoryStats {
    let products: BTreeSet<&str> = rows.iter().map(|r| r.product_sku.as_str()).collect();
    let warehouses: BTreeSet<i64> = rows.iter().filter_map(|r| r.warehouse_id).collect();
    let out_of_stock = rows.iter().filter(|r| r.is_out_of_stock()).count() as u64;
    let total_records = rows.len() as u64;

    InventoryStats {
        total_products: products.len() as u64,
        total_warehouses: warehouses.len() as u64,
        total_records,
        total_available: rows.iter().map(|r| i64::from(r.quantity_available)).sum(),
        total_reserved: rows.iter().map(|r| i64::from(r.quantity_reserved)).sum(),
        total_sold: rows.iter().map(|r| i64::from(r.quantity_sold)).sum(),
        low_stock_count: rows.iter().filter(|r| r.is_low_stock()).count() as u64,
        out_of_stock_count: out_of_stock,
        in_stock_count: total_records - out_of_stock,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sku: &str, warehouse_id: Option<i64>, available: i32, reorder_point: i32) -> InventoryModel {
        let now = Utc::now();
        InventoryModel {
            id: 0,
            product_sku: sku.into(),
            warehouse_id,
            quantity_available: available,
            quantity_reserved: 2,
            quantity_sold: 1,
            reorder_point,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn summarize_counts_like_the_listing_filters() {
        let rows = vec![
            row("WAFFLE-001", None, 50, 10),
            row("WAFFLE-001", Some(2), 5, 10),
            row("CAKE-001", Some(2), 0, 10),
            row("CAKE-001", Some(3), 8, 0),
        ];

        let stats = summarize(&rows);
        assert_eq!(stats.total_products, 2);
        assert_eq!(stats.total_warehouses, 2);
        assert_eq!(stats.total_records, 4);
        assert_eq!(stats.total_available, 63);
        assert_eq!(stats.total_reserved, 8);
        assert_eq!(stats.total_sold, 4);
        assert_eq!(stats.low_stock_count, 1);
        assert_eq!(stats.out_of_stock_count, 1);
        assert_eq!(stats.in_stock_count, 3);
    }

    #[test]
    fn summarize_empty_is_all_zero() {
        assert_eq!(summarize(&[]), InventoryStats::default());
    }

    #[test]
    fn bulk_entry_reads_flat_json() {
        let entry: BulkQuantityUpdate = serde_json::from_str(
            r#"{"product_sku":"PIE-001","quantity_available":12}"#,
        )
        .unwrap();
        assert_eq!(entry.warehouse_id, None);
        assert_eq!(entry.quantities.quantity_available, Some(12));
        assert!(entry.quantities.quantity_reserved.is_none());
    }
}
