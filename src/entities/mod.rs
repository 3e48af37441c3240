pub mod product;
pub mod product_inventory;
pub mod shopping_cart;
pub mod shopping_cart_item;
