// Catalog and stock
pub mod inventory;
pub mod product_service;

// Cart pricing
pub mod commerce;

pub use commerce::CartService;
pub use inventory::InventoryService;
pub use product_service::ProductService;
