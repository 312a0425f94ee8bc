use midi_core::AccountId;
use serde::{Deserialize, Serialize};

/// Fee denominator: 10000 basis points = 100%
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Default sales fee at deployment: 200 basis points (2%)
pub const DEFAULT_SALES_FEE_BPS: u16 = 200;

/// Default minimum listing price at deployment: 0.01 native units
/// (the native unit carries 18 decimals, so this is 10^16 minor units)
pub const DEFAULT_MIN_LISTING_PRICE: u128 = 10_000_000_000_000_000;

/// Singleton sale configuration of the marketplace
///
/// Mutable only through the component's owner-gated setters; the serialized
/// transaction order is the single-writer discipline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Sales fee in basis points, always within [0, 10000]
    pub sales_fee_bps: u16,

    /// Floor every new listing's price is checked against
    pub min_listing_price: u128,

    /// Account the fee share of each sale is routed to
    pub payout_wallet: AccountId,
}

impl MarketConfig {
    /// Deployment-time configuration: 2% fee, 0.01 native unit floor, and
    /// fees paid out to the deployer until `set_wallet` is called
    pub fn new(payout_wallet: AccountId) -> Self {
        Self {
            sales_fee_bps: DEFAULT_SALES_FEE_BPS,
            min_listing_price: DEFAULT_MIN_LISTING_PRICE,
            payout_wallet,
        }
    }
}
