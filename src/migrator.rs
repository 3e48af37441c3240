use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241219_000001_create_products_table::Migration),
            Box::new(m20241219_000002_create_product_inventories_table::Migration),
            Box::new(m20241219_000003_seed_products::Migration),
            Box::new(m20241219_000004_create_shopping_carts_table::Migration),
            Box::new(m20241219_000005_create_shopping_cart_items_table::Migration),
        ]
    }
}

mod m20241219_000001_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241219_000001_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Products::Sku)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Products::Price)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::Status)
                                .string_len(20)
                                .not_null()
                                .default("active"),
                        )
                        .col(ColumnDef::new(Products::Category).string_len(100).null())
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(ColumnDef::new(Products::Images).json().null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_status")
                        .table(Products::Table)
                        .col(Products::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_category")
                        .table(Products::Table)
                        .col(Products::Category)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Products {
        Table,
        Id,
        Sku,
        Name,
        Price,
        Status,
        Category,
        Description,
        Images,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20241219_000002_create_product_inventories_table {
    use super::m20241219_000001_create_products_table::Products;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241219_000002_create_product_inventories_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductInventories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductInventories::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ProductInventories::ProductSku)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductInventories::WarehouseId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductInventories::QuantityAvailable)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductInventories::QuantityReserved)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductInventories::QuantitySold)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductInventories::ReorderPoint)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductInventories::Version)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductInventories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductInventories::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_inventories_product_sku")
                                .from(ProductInventories::Table, ProductInventories::ProductSku)
                                .to(Products::Table, Products::Sku)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            // NULL warehouse ids compare as distinct here; the service guards the default row
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_inventories_sku_warehouse")
                        .table(ProductInventories::Table)
                        .col(ProductInventories::ProductSku)
                        .col(ProductInventories::WarehouseId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_inventories_warehouse")
                        .table(ProductInventories::Table)
                        .col(ProductInventories::WarehouseId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductInventories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum ProductInventories {
        Table,
        Id,
        ProductSku,
        WarehouseId,
        QuantityAvailable,
        QuantityReserved,
        QuantitySold,
        ReorderPoint,
        Version,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20241219_000003_seed_products {
    use super::m20241219_000001_create_products_table::Products;
    use super::m20241219_000002_create_product_inventories_table::ProductInventories;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use sea_orm_migration::prelude::*;
    use serde_json::json;

    pub struct Migration;

    const IMAGE_BASE: &str = "https://orderfoodonline.deno.dev/public/images";
    const SEED_STOCK: i32 = 50;
    const SEED_REORDER_POINT: i32 = 10;

    struct SeedProduct {
        sku: &'static str,
        name: &'static str,
        category: &'static str,
        price: Decimal,
        description: &'static str,
        image: &'static str,
    }

    fn seed_products() -> Vec<SeedProduct> {
        vec![
            SeedProduct {
                sku: "WAFFLE-001",
                name: "Waffle with Berries",
                category: "Waffle",
                price: dec!(6.50),
                description: "Delicious waffle topped with fresh berries",
                image: "waffle",
            },
            SeedProduct {
                sku: "CREME-001",
                name: "Vanilla Bean Crème Brûlée",
                category: "Crème Brûlée",
                price: dec!(7.00),
                description: "Classic French dessert with vanilla bean and caramelized sugar",
                image: "creme-brulee",
            },
            SeedProduct {
                sku: "MACARON-001",
                name: "Macaron Mix of Five",
                category: "Macaron",
                price: dec!(8.00),
                description: "Assorted pack of five colorful French macarons",
                image: "macaron",
            },
            SeedProduct {
                sku: "TIRAMISU-001",
                name: "Classic Tiramisu",
                category: "Tiramisu",
                price: dec!(5.50),
                description: "Traditional Italian coffee-flavored dessert",
                image: "tiramisu",
            },
            SeedProduct {
                sku: "BAKLAVA-001",
                name: "Pistachio Baklava",
                category: "Baklava",
                price: dec!(4.00),
                description: "Sweet pastry made of layers of filo filled with chopped pistachios",
                image: "baklava",
            },
            SeedProduct {
                sku: "PIE-001",
                name: "Lemon Meringue Pie",
                category: "Pie",
                price: dec!(5.00),
                description: "Tangy lemon curd topped with fluffy meringue in a pastry crust",
                image: "meringue",
            },
            SeedProduct {
                sku: "CAKE-001",
                name: "Red Velvet Cake",
                category: "Cake",
                price: dec!(4.50),
                description: "Moist red velvet cake with cream cheese frosting",
                image: "cake",
            },
            SeedProduct {
                sku: "BROWNIE-001",
                name: "Salted Caramel Brownie",
                category: "Brownie",
                price: dec!(4.50),
                description: "Rich chocolate brownie with salted caramel swirl",
                image: "brownie",
            },
            SeedProduct {
                sku: "PANNA-001",
                name: "Vanilla Panna Cotta",
                category: "Panna Cotta",
                price: dec!(6.50),
                description: "Silky smooth Italian dessert infused with vanilla",
                image: "panna-cotta",
            },
        ]
    }

    fn images_for(slug: &str) -> serde_json::Value {
        json!({
            "thumbnail": format!("{IMAGE_BASE}/image-{slug}-thumbnail.jpg"),
            "mobile": format!("{IMAGE_BASE}/image-{slug}-mobile.jpg"),
            "tablet": format!("{IMAGE_BASE}/image-{slug}-tablet.jpg"),
            "desktop": format!("{IMAGE_BASE}/image-{slug}-desktop.jpg"),
        })
    }

    fn seed_err(e: impl std::fmt::Display) -> DbErr {
        DbErr::Custom(format!("invalid seed row: {e}"))
    }

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241219_000003_seed_products"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let now = chrono::Utc::now();
            let products = seed_products();

            let mut insert_products = Query::insert();
            insert_products.into_table(Products::Table).columns([
                Products::Sku,
                Products::Name,
                Products::Category,
                Products::Price,
                Products::Status,
                Products::Description,
                Products::Images,
                Products::CreatedAt,
                Products::UpdatedAt,
            ]);
            for p in &products {
                insert_products
                    .values([
                        p.sku.into(),
                        p.name.into(),
                        p.category.into(),
                        p.price.into(),
                        "active".into(),
                        p.description.into(),
                        images_for(p.image).into(),
                        now.into(),
                        now.into(),
                    ])
                    .map_err(seed_err)?;
            }
            manager.exec_stmt(insert_products.to_owned()).await?;

            // Every seeded product starts with stock in the default warehouse
            let mut insert_stock = Query::insert();
            insert_stock.into_table(ProductInventories::Table).columns([
                ProductInventories::ProductSku,
                ProductInventories::QuantityAvailable,
                ProductInventories::QuantityReserved,
                ProductInventories::QuantitySold,
                ProductInventories::ReorderPoint,
                ProductInventories::Version,
                ProductInventories::CreatedAt,
                ProductInventories::UpdatedAt,
            ]);
            for p in &products {
                insert_stock
                    .values([
                        p.sku.into(),
                        SEED_STOCK.into(),
                        0.into(),
                        0.into(),
                        SEED_REORDER_POINT.into(),
                        0.into(),
                        now.into(),
                        now.into(),
                    ])
                    .map_err(seed_err)?;
            }
            manager.exec_stmt(insert_stock.to_owned()).await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let skus: Vec<&str> = seed_products().iter().map(|p| p.sku).collect();

            manager
                .exec_stmt(
                    Query::delete()
                        .from_table(ProductInventories::Table)
                        .and_where(Expr::col(ProductInventories::ProductSku).is_in(skus.clone()))
                        .to_owned(),
                )
                .await?;

            manager
                .exec_stmt(
                    Query::delete()
                        .from_table(Products::Table)
                        .and_where(Expr::col(Products::Sku).is_in(skus))
                        .to_owned(),
                )
                .await
        }
    }
}

mod m20241219_000004_create_shopping_carts_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241219_000004_create_shopping_carts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ShoppingCarts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ShoppingCarts::Uuid)
                                .string_len(36)
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ShoppingCarts::UserId).big_integer().not_null())
                        .col(
                            ColumnDef::new(ShoppingCarts::Status)
                                .string_len(20)
                                .not_null()
                                .default("active"),
                        )
                        .col(ColumnDef::new(ShoppingCarts::SessionId).string_len(255).null())
                        .col(
                            ColumnDef::new(ShoppingCarts::TotalAmount)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ShoppingCarts::TotalItems)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ShoppingCarts::Currency)
                                .string_len(3)
                                .not_null()
                                .default("USD"),
                        )
                        .col(ColumnDef::new(ShoppingCarts::Notes).text().null())
                        .col(
                            ColumnDef::new(ShoppingCarts::ExpiresAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ShoppingCarts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShoppingCarts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShoppingCarts::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_shopping_carts_user_status")
                        .table(ShoppingCarts::Table)
                        .col(ShoppingCarts::UserId)
                        .col(ShoppingCarts::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_shopping_carts_session")
                        .table(ShoppingCarts::Table)
                        .col(ShoppingCarts::SessionId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ShoppingCarts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum ShoppingCarts {
        Table,
        Uuid,
        UserId,
        Status,
        SessionId,
        TotalAmount,
        TotalItems,
        Currency,
        Notes,
        ExpiresAt,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20241219_000005_create_shopping_cart_items_table {
    use super::m20241219_000004_create_shopping_carts_table::ShoppingCarts;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241219_000005_create_shopping_cart_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ShoppingCartItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ShoppingCartItems::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ShoppingCartItems::CartUuid)
                                .string_len(36)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShoppingCartItems::ProductSku)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(ColumnDef::new(ShoppingCartItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(ShoppingCartItems::Price)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShoppingCartItems::DiscountAmount)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ShoppingCartItems::Status)
                                .string_len(20)
                                .not_null()
                                .default("active"),
                        )
                        .col(
                            ColumnDef::new(ShoppingCartItems::ProductName)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShoppingCartItems::ProductImage)
                                .string_len(500)
                                .null(),
                        )
                        .col(ColumnDef::new(ShoppingCartItems::Notes).text().null())
                        .col(
                            ColumnDef::new(ShoppingCartItems::AddedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShoppingCartItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShoppingCartItems::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_shopping_cart_items_cart")
                                .from(ShoppingCartItems::Table, ShoppingCartItems::CartUuid)
                                .to(ShoppingCarts::Table, ShoppingCarts::Uuid)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_cart_items_cart_product")
                        .table(ShoppingCartItems::Table)
                        .col(ShoppingCartItems::CartUuid)
                        .col(ShoppingCartItems::ProductSku)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ShoppingCartItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum ShoppingCartItems {
        Table,
        Id,
        CartUuid,
        ProductSku,
        Quantity,
        Price,
        DiscountAmount,
        Status,
        ProductName,
        ProductImage,
        Notes,
        AddedAt,
        UpdatedAt,
        DeletedAt,
    }
}
