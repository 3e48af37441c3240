use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Stock for one product in one warehouse.
///
/// `warehouse_id = None` is the default warehouse. `version` is the optimistic
/// lock: every versioned write bumps it by exactly one.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_inventories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub product_sku: String,
    pub warehouse_id: Option<i64>,
    pub quantity_available: i32,
    pub quantity_reserved: i32,
    pub quantity_sold: i32,
    pub reorder_point: i32,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductSku",
        to = "super::product::Column::Sku"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.version = Set(0);
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);

        Ok(active_model)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl Model {
    /// Units on hand, whether free or held for pending orders
    pub fn total_quantity(&self) -> i64 {
        i64::from(self.quantity_available) + i64::from(self.quantity_reserved)
    }

    pub fn stock_status(&self) -> StockStatus {
        if self.quantity_available == 0 {
            StockStatus::OutOfStock
        } else if self.reorder_point > 0 && self.quantity_available <= self.reorder_point {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock_status() == StockStatus::LowStock
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.stock_status() == StockStatus::OutOfStock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(available: i32, reserved: i32, reorder_point: i32) -> Model {
        let now = Utc::now();
        Model {
            id: 1,
            product_sku: "WAFFLE-001".into(),
            warehouse_id: None,
            quantity_available: available,
            quantity_reserved: reserved,
            quantity_sold: 0,
            reorder_point,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn total_quantity_adds_available_and_reserved() {
        assert_eq!(record(7, 3, 0).total_quantity(), 10);
        assert_eq!(
            record(i32::MAX, 1, 0).total_quantity(),
            i64::from(i32::MAX) + 1
        );
    }

    #[test]
    fn stock_status_thresholds() {
        assert_eq!(record(0, 5, 10).stock_status(), StockStatus::OutOfStock);
        assert_eq!(record(10, 0, 10).stock_status(), StockStatus::LowStock);
        assert_eq!(record(11, 0, 10).stock_status(), StockStatus::InStock);
        // no reorder point configured: never low
        assert_eq!(record(1, 0, 0).stock_status(), StockStatus::InStock);
    }
}
