pub mod config;
pub mod item;
pub mod market;

// Re-export the main types for convenience
pub use config::{MarketConfig, BPS_DENOMINATOR, DEFAULT_MIN_LISTING_PRICE, DEFAULT_SALES_FEE_BPS};
pub use item::MarketItem;
pub use market::{Market, SaleSettlement};
