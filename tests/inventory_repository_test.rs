mod common;

use assert_matches::assert_matches;
use common::{TestApp, SEEDED_SKUS};
use storefront_api::{
    entities::product_inventory,
    errors::ServiceError,
    repositories::inventory_repository::{
        BulkQuantityUpdate, InventoryListFilter, InventoryRepository, QuantityUpdate,
        WarehouseFilter,
    },
    services::inventory::{InventoryService, NewInventory},
};

async fn default_row(repo: &InventoryRepository, sku: &str) -> product_inventory::Model {
    repo.find_by_product_and_warehouse(sku, None)
        .await
        .unwrap()
        .expect("seeded default-warehouse row")
}

#[tokio::test]
async fn versioned_update_bumps_version_by_one() {
    let app = TestApp::new().await;
    let repo = InventoryRepository::new(app.db());
    let row = default_row(&repo, "WAFFLE-001").await;
    assert_eq!(row.version, 0);

    let updated = repo
        .update_quantities(
            row.id,
            row.version,
            &QuantityUpdate {
                quantity_available: Some(45),
                quantity_reserved: Some(5),
                quantity_sold: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.version, 1);
    assert_eq!(updated.quantity_available, 45);
    assert_eq!(updated.quantity_reserved, 5);
    assert_eq!(updated.quantity_sold, row.quantity_sold);
}

#[tokio::test]
async fn stale_version_is_a_conflict_and_leaves_row_untouched() {
    let app = TestApp::new().await;
    let repo = InventoryRepository::new(app.db());
    let row = default_row(&repo, "PIE-001").await;

    let update = QuantityUpdate {
        quantity_available: Some(10),
        ..Default::default()
    };
    repo.update_quantities(row.id, 0, &update).await.unwrap();

    let stale = repo.update_quantities(row.id, 0, &update).await;
    assert_matches!(stale, Err(ServiceError::ConcurrencyConflict(_)));

    let current = repo.find_by_id(row.id).await.unwrap().unwrap();
    assert_eq!(current.version, 1);
}

#[tokio::test]
async fn concurrent_updates_with_same_version_let_exactly_one_through() {
    let app = TestApp::new().await;
    let repo = InventoryRepository::new(app.db());
    let row = default_row(&repo, "CAKE-001").await;

    let first = QuantityUpdate {
        quantity_available: Some(40),
        ..Default::default()
    };
    let second = QuantityUpdate {
        quantity_available: Some(30),
        ..Default::default()
    };

    let (a, b) = tokio::join!(
        repo.update_quantities(row.id, row.version, &first),
        repo.update_quantities(row.id, row.version, &second),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1);
    let conflict = if a.is_err() { a } else { b };
    assert_matches!(conflict, Err(ServiceError::ConcurrencyConflict(_)));

    let current = repo.find_by_id(row.id).await.unwrap().unwrap();
    assert_eq!(current.version, row.version + 1);
}

#[tokio::test]
async fn missing_row_is_reported_as_conflict() {
    let app = TestApp::new().await;
    let repo = InventoryRepository::new(app.db());

    let result = repo
        .update_quantities(
            999_999,
            0,
            &QuantityUpdate {
                quantity_sold: Some(1),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(result, Err(ServiceError::ConcurrencyConflict(_)));
}

#[tokio::test]
async fn default_warehouse_lookup_is_distinct_from_all_warehouses() {
    let app = TestApp::new().await;
    let service = InventoryService::new(app.db(), 3);
    let repo = InventoryRepository::new(app.db());

    service
        .create(NewInventory {
            product_sku: "MACARON-001".into(),
            warehouse_id: Some(7),
            quantity_available: 12,
            reorder_point: 2,
            ..Default::default()
        })
        .await
        .unwrap();

    let default = repo
        .find_by_product_and_warehouse("MACARON-001", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(default.warehouse_id, None);
    assert_eq!(default.quantity_available, 50);

    let north = repo
        .find_by_product_and_warehouse("MACARON-001", Some(7))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(north.quantity_available, 12);
    assert_eq!(north.version, 0);

    let all = repo.find_by_product("MACARON-001").await.unwrap();
    assert_eq!(all.len(), 2);

    assert_eq!(repo.total_available("MACARON-001").await.unwrap(), 62);
    assert_eq!(repo.find_by_warehouse(7).await.unwrap().len(), 1);
    assert!(repo
        .find_by_product_and_warehouse("MACARON-001", Some(8))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn bulk_update_skips_missing_rows_without_failing() {
    let app = TestApp::new().await;
    let repo = InventoryRepository::new(app.db());

    let entry = |sku: &str, available: i32| BulkQuantityUpdate {
        product_sku: sku.to_string(),
        warehouse_id: None,
        quantities: QuantityUpdate {
            quantity_available: Some(available),
            ..Default::default()
        },
    };

    let outcome = repo
        .bulk_update_quantities(&[
            entry("WAFFLE-001", 1),
            entry("CREME-001", 2),
            entry("NOPE-404", 3),
            entry("BAKLAVA-001", 0),
        ])
        .await
        .unwrap();

    assert_eq!(outcome.updated, 3);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].product_sku, "NOPE-404");

    let creme = default_row(&repo, "CREME-001").await;
    assert_eq!(creme.quantity_available, 2);
    // unsupplied fields keep their values
    assert_eq!(creme.quantity_reserved, 0);
    assert_eq!(creme.version, 1);

    // a writer holding the pre-bulk snapshot now conflicts
    let stale = repo
        .update_quantities(
            creme.id,
            0,
            &QuantityUpdate {
                quantity_available: Some(9),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(stale, Err(ServiceError::ConcurrencyConflict(_)));

    let out = repo.find_out_of_stock(None).await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].product_sku, "BAKLAVA-001");

    let low: Vec<String> = repo
        .find_low_stock(None)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.product_sku)
        .collect();
    assert_eq!(low, vec!["BAKLAVA-001", "WAFFLE-001", "CREME-001"]);
}

#[tokio::test]
async fn stats_cover_seeded_rows() {
    let app = TestApp::new().await;
    let repo = InventoryRepository::new(app.db());

    let stats = repo.stats(None, None).await.unwrap();
    assert_eq!(stats.total_records, SEEDED_SKUS.len() as u64);
    assert_eq!(stats.total_products, SEEDED_SKUS.len() as u64);
    assert_eq!(stats.total_warehouses, 0);
    assert_eq!(stats.total_available, 50 * SEEDED_SKUS.len() as i64);
    assert_eq!(stats.in_stock_count, SEEDED_SKUS.len() as u64);
    assert_eq!(stats.low_stock_count, 0);
    assert_eq!(stats.out_of_stock_count, 0);

    let single = repo.stats(None, Some("PIE-001")).await.unwrap();
    assert_eq!(single.total_records, 1);
    assert_eq!(single.total_available, 50);
}

#[tokio::test]
async fn list_filters_by_keyword_and_warehouse() {
    let app = TestApp::new().await;
    let service = InventoryService::new(app.db(), 3);
    let repo = InventoryRepository::new(app.db());

    service
        .create(NewInventory {
            product_sku: "BROWNIE-001".into(),
            warehouse_id: Some(3),
            quantity_available: 1,
            reorder_point: 5,
            ..Default::default()
        })
        .await
        .unwrap();

    let (all, total) = repo.list(&InventoryListFilter::default(), 1, 100).await.unwrap();
    assert_eq!(total, 10);
    assert_eq!(all.len(), 10);

    let (defaults, total) = repo
        .list(
            &InventoryListFilter {
                warehouse: WarehouseFilter::Default,
                ..Default::default()
            },
            1,
            100,
        )
        .await
        .unwrap();
    assert_eq!(total, 9);
    assert!(defaults.iter().all(|row| row.warehouse_id.is_none()));

    let (in_three, _) = repo
        .list(
            &InventoryListFilter {
                warehouse: WarehouseFilter::Id(3),
                ..Default::default()
            },
            1,
            100,
        )
        .await
        .unwrap();
    assert_eq!(in_three.len(), 1);

    let (by_sku, total) = repo
        .list(
            &InventoryListFilter {
                product_sku: Some("BROWNIE".into()),
                ..Default::default()
            },
            1,
            1,
        )
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(by_sku.len(), 1);
}

#[tokio::test]
async fn service_create_rejects_duplicates_and_unknown_products() {
    let app = TestApp::new().await;
    let service = InventoryService::new(app.db(), 3);

    let duplicate = service
        .create(NewInventory {
            product_sku: "PIE-001".into(),
            warehouse_id: None,
            ..Default::default()
        })
        .await;
    assert_matches!(duplicate, Err(ServiceError::Conflict(_)));

    let unknown = service
        .create(NewInventory {
            product_sku: "GHOST-001".into(),
            warehouse_id: Some(1),
            ..Default::default()
        })
        .await;
    assert_matches!(unknown, Err(ServiceError::NotFound(_)));

    let negative = service
        .create(NewInventory {
            product_sku: "PIE-001".into(),
            warehouse_id: Some(1),
            quantity_available: -1,
            ..Default::default()
        })
        .await;
    assert_matches!(negative, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn reserve_moves_units_and_rejects_overdraw() {
    let app = TestApp::new().await;
    let service = InventoryService::new(app.db(), 3);
    let row = service
        .find_by_product_and_warehouse("TIRAMISU-001", None)
        .await
        .unwrap()
        .unwrap();

    let reserved = service.reserve(row.id, 20).await.unwrap();
    assert_eq!(reserved.quantity_available, 30);
    assert_eq!(reserved.quantity_reserved, 20);
    assert_eq!(reserved.version, row.version + 1);

    let overdraw = service.reserve(row.id, 31).await;
    assert_matches!(overdraw, Err(ServiceError::InsufficientStock(_)));

    let zero = service.reserve(row.id, 0).await;
    assert_matches!(zero, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn reserve_past_reserved_limit_is_rejected() {
    let app = TestApp::new().await;
    let service = InventoryService::new(app.db(), 3);
    let row = service
        .create(NewInventory {
            product_sku: "CAKE-001".into(),
            warehouse_id: Some(6),
            quantity_available: 10,
            quantity_reserved: i32::MAX - 1,
            ..Default::default()
        })
        .await
        .unwrap();

    let result = service.reserve(row.id, 3).await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    let unchanged = service.get(row.id).await.unwrap();
    assert_eq!(unchanged.quantity_reserved, i32::MAX - 1);
    assert_eq!(unchanged.version, row.version);
}

#[tokio::test]
async fn concurrent_reservations_all_land_through_retries() {
    let app = TestApp::new().await;
    let service = InventoryService::new(app.db(), 5);
    let row = service
        .find_by_product_and_warehouse("PANNA-001", None)
        .await
        .unwrap()
        .unwrap();

    let (a, b, c) = tokio::join!(
        service.reserve(row.id, 5),
        service.reserve(row.id, 5),
        service.reserve(row.id, 5),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());

    let current = service.get(row.id).await.unwrap();
    assert_eq!(current.quantity_available, 35);
    assert_eq!(current.quantity_reserved, 15);
    assert_eq!(current.version, 3);
}

#[tokio::test]
async fn retry_loop_recomputes_from_fresh_snapshot() {
    let app = TestApp::new().await;
    let service = InventoryService::new(app.db(), 3);
    let repo = InventoryRepository::new(app.db());
    let row = default_row(&repo, "BAKLAVA-001").await;

    repo.update_quantities(
        row.id,
        row.version,
        &QuantityUpdate {
            quantity_sold: Some(4),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let attempts = std::sync::atomic::AtomicU32::new(0);
    let result = service
        .update_with_retry(row.id, 2, |current| {
            attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(QuantityUpdate {
                quantity_sold: Some(current.quantity_sold + 1),
                ..Default::default()
            })
        })
        .await;

    let updated = result.unwrap();
    assert_eq!(updated.quantity_sold, 5);
    assert_eq!(updated.version, row.version + 2);
    assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 1);

    let missing = service
        .update_with_retry(999_999, 2, |_| Ok(QuantityUpdate::default()))
        .await;
    assert_matches!(missing, Err(ServiceError::NotFound(_)));
}
