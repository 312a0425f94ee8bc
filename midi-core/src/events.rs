use crate::id::{AccountId, MarketItemId, TokenId};
use serde::{Deserialize, Serialize};

/// Structured record emitted by a committed transaction
///
/// Events are the detectable side effect of the ledger: each committed
/// transaction appends its events to the receipt and to the event log, where
/// external observers can consume them. Failed transactions emit nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A token was minted (`from` unset) or moved between accounts
    Transfer {
        from: Option<AccountId>,
        to: Option<AccountId>,
        token_id: TokenId,
    },

    /// A new market item was listed
    MarketItemCreated {
        item_id: MarketItemId,
        token_contract: AccountId,
        token_id: TokenId,
        seller: AccountId,
        owner: Option<AccountId>,
        price: u128,
        sold: bool,
    },

    /// A market item completed its Listed -> Sold transition
    MarketItemSold {
        item_id: MarketItemId,
        token_id: TokenId,
        seller: AccountId,
        buyer: AccountId,
        price: u128,
        fee: u128,
    },
}
