use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Catalog product. Rows with `deleted_at` set are soft-deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Stock keeping unit, unique across the catalog
    #[sea_orm(unique)]
    pub sku: String,

    pub name: String,

    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,

    pub status: ProductStatus,

    pub category: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// `{ thumbnail, mobile, tablet, desktop }` image URLs
    #[sea_orm(column_type = "Json", nullable)]
    pub images: Option<Json>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProductStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
    #[sea_orm(string_value = "discontinued")]
    Discontinued,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_inventory::Entity")]
    Inventories,
}

impl Related<super::product_inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventories.def()
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
            if active_model.status.is_not_set() {
                active_model.status = Set(ProductStatus::Active);
            }
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);

        Ok(active_model)
    }
}

impl Model {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
