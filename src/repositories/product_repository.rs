use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;

use crate::entities::product::{
    ActiveModel as ProductActiveModel, Column, Entity as Product, Model as ProductModel,
    ProductStatus,
};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

#[derive(Debug, Clone, Default)]
pub struct ProductListFilter {
    /// Substring matched against name or SKU
    pub keyword: Option<String>,
    pub sku: Option<String>,
    pub name: Option<String>,
    pub status: Option<ProductStatus>,
}

/// Repository for catalog products. Soft-deleted rows are invisible to reads.
#[derive(Debug)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<ProductModel>, ServiceError> {
        Ok(Product::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(self.base.get_db())
            .await?)
    }

    pub async fn find_by_sku(&self, sku: &str) -> Result<Option<ProductModel>, ServiceError> {
        Ok(Product::find()
            .filter(Column::Sku.eq(sku))
            .filter(Column::DeletedAt.is_null())
            .one(self.base.get_db())
            .await?)
    }

    /// Case-insensitive SKU clash with any other row, soft-deleted ones included,
    /// since the unique index still covers them.
    pub async fn find_duplicate(
        &self,
        exclude_id: Option<i64>,
        sku: &str,
    ) -> Result<Option<ProductModel>, ServiceError> {
        let mut query = Product::find().filter(
            Expr::expr(Func::lower(Expr::col(Column::Sku))).eq(sku.to_lowercase()),
        );
        if let Some(id) = exclude_id {
            query = query.filter(Column::Id.ne(id));
        }

        Ok(query.one(self.base.get_db()).await?)
    }

    /// 1-based page of live products, newest first
    pub async fn list(
        &self,
        filter: &ProductListFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<ProductModel>, u64), ServiceError> {
        let mut query = Product::find().filter(Column::DeletedAt.is_null());

        if let Some(keyword) = filter.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(Column::Name.contains(keyword))
                    .add(Column::Sku.contains(keyword)),
            );
        }
        if let Some(status) = filter.status {
            query = query.filter(Column::Status.eq(status));
        }
        if let Some(sku) = filter.sku.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(Column::Sku.contains(sku));
        }
        if let Some(name) = filter.name.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(Column::Name.contains(name));
        }

        let paginator = query
            .order_by_desc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .paginate(self.base.get_db(), limit.max(1));

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.max(1) - 1).await?;

        Ok((products, total))
    }

    pub async fn create(&self, product: ProductActiveModel) -> Result<ProductModel, ServiceError> {
        Ok(product.insert(self.base.get_db()).await?)
    }

    pub async fn update(&self, product: ProductActiveModel) -> Result<ProductModel, ServiceError> {
        Ok(product.update(self.base.get_db()).await?)
    }

    pub async fn soft_delete(&self, product: ProductModel) -> Result<ProductModel, ServiceError> {
        let mut active_model: ProductActiveModel = product.into();
        active_model.deleted_at = Set(Some(Utc::now()));
        Ok(active_model.update(self.base.get_db()).await?)
    }
}

impl Repository for ProductRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}
