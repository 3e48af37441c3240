/// Commerce services: cart pricing and cart endpoints
pub mod cart_service;
pub mod pricing_service;

pub use cart_service::{CartService, CheckoutCartRequest, PreviewCartRequest};
pub use pricing_service::{compute_preview, CartPreview, LineItem, PromotionCode};
