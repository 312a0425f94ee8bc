use midi_core::{AccountId, MarketItemId, TokenId};
use serde::{Deserialize, Serialize};

/// A listing record pairing a token reference with a price and sale status
///
/// Item ids are global across all token contracts ever listed and append-only
/// starting at 1. The only state transition is `Listed -> Sold`, which is
/// terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketItem {
    /// Sequential item id, starting at 1
    pub id: MarketItemId,

    /// Address of the token contract the listed token belongs to
    pub token_contract: AccountId,

    /// Id of the listed token within that contract
    pub token_id: TokenId,

    /// Account that created the listing
    pub seller: AccountId,

    /// Buyer of the item; unset while the item is listed
    pub owner: Option<AccountId>,

    /// Asking price in minor units of the native value unit
    pub price: u128,

    /// Whether the sale has completed
    pub sold: bool,
}

impl MarketItem {
    /// Create a fresh, unsold listing
    pub fn new(
        id: MarketItemId,
        token_contract: AccountId,
        token_id: TokenId,
        seller: AccountId,
        price: u128,
    ) -> Self {
        Self {
            id,
            token_contract,
            token_id,
            seller,
            owner: None,
            price,
            sold: false,
        }
    }
}
