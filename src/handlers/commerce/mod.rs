/// Catalog and cart API handlers
pub mod carts;
pub mod products;

pub use carts::carts_routes;
pub use products::products_routes;
