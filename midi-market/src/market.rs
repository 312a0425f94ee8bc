use log::debug;
use midi_core::{AccountId, LedgerError, LedgerEvent, MarketItemId, Ownable, TokenId};

use crate::config::{MarketConfig, BPS_DENOMINATOR};
use crate::item::MarketItem;

/// Amounts owed to each party once a sale settles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleSettlement {
    /// Account the net proceeds go to
    pub seller: AccountId,

    /// Full price the buyer pays
    pub price: u128,

    /// Fee share routed to the payout wallet; the seller receives the rest
    pub fee: u128,

    /// Token contract the sold token belongs to
    pub token_contract: AccountId,

    /// The sold token
    pub token_id: TokenId,
}

/// The marketplace component ("MIDIMarket")
///
/// Exclusively owns market items and the singleton sale configuration.
/// Tokens are referenced by (contract address, token id) and never embedded;
/// the actual token movement at settlement happens in the referenced
/// contract.
#[derive(Debug)]
pub struct Market {
    /// Address this component was deployed at
    address: AccountId,

    /// The privileged account recorded at deployment
    owner: AccountId,

    /// Singleton sale configuration, mutable only by the owner
    config: MarketConfig,

    /// All listings in creation order; an item's id is its index plus 1
    items: Vec<MarketItem>,

    /// Events emitted since the last drain
    pending_events: Vec<LedgerEvent>,
}

impl Market {
    /// Create a marketplace owned by `owner`, with deployment defaults and
    /// fees paid out to the owner until `set_wallet` changes that
    pub fn new(address: AccountId, owner: AccountId) -> Self {
        Self {
            address,
            owner,
            config: MarketConfig::new(owner),
            items: Vec::new(),
            pending_events: Vec::new(),
        }
    }

    /// The address this component was deployed at
    pub fn address(&self) -> &AccountId {
        &self.address
    }

    /// Update the sales fee; owner-gated and bounded to [0, 10000]
    pub fn set_market_sales_fee(
        &mut self,
        caller: &AccountId,
        basis_points: u16,
    ) -> Result<(), LedgerError> {
        self.require_owner(caller)?;
        if u128::from(basis_points) > BPS_DENOMINATOR {
            return Err(LedgerError::InvalidReference(
                "sales fee exceeds 10000 basis points".to_string(),
            ));
        }
        self.config.sales_fee_bps = basis_points;
        Ok(())
    }

    /// Current sales fee in basis points
    pub fn get_market_sales_fee(&self) -> u16 {
        self.config.sales_fee_bps
    }

    /// Update the listing price floor; owner-gated
    pub fn set_min_listing_price(
        &mut self,
        caller: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.require_owner(caller)?;
        self.config.min_listing_price = amount;
        Ok(())
    }

    /// Current listing price floor
    pub fn get_min_listing_price(&self) -> u128 {
        self.config.min_listing_price
    }

    /// Update the payout destination for sale fees; owner-gated
    pub fn set_wallet(&mut self, caller: &AccountId, address: AccountId) -> Result<(), LedgerError> {
        self.require_owner(caller)?;
        self.config.payout_wallet = address;
        Ok(())
    }

    /// Account the fee share of each sale is routed to
    pub fn payout_wallet(&self) -> &AccountId {
        &self.config.payout_wallet
    }

    /// List a token for sale
    ///
    /// Anyone may list; token ownership is not checked here and is enforced
    /// when the sale actually moves the token. The price is validated against
    /// the floor configured at creation time.
    ///
    /// # Returns
    /// * `Ok(item_id)` - The newly assigned item id (starting at 1)
    /// * `Err(PriceTooLow)` - `price` is below the current minimum
    pub fn create_market_item(
        &mut self,
        caller: &AccountId,
        token_contract: AccountId,
        token_id: TokenId,
        price: u128,
    ) -> Result<MarketItemId, LedgerError> {
        if price < self.config.min_listing_price {
            return Err(LedgerError::listing_too_low());
        }

        let item_id = self.items.len() as MarketItemId + 1;
        debug!(
            "listing item {}: token {} of {} at {} by {}",
            item_id, token_id, token_contract, price, caller
        );

        let item = MarketItem::new(item_id, token_contract, token_id, *caller, price);
        self.pending_events.push(LedgerEvent::MarketItemCreated {
            item_id,
            token_contract,
            token_id,
            seller: *caller,
            owner: None,
            price,
            sold: false,
        });
        self.items.push(item);

        Ok(item_id)
    }

    /// Look up a listing by item id
    pub fn fetch_market_item(&self, item_id: MarketItemId) -> Result<&MarketItem, LedgerError> {
        item_id
            .checked_sub(1)
            .and_then(|index| self.items.get(index as usize))
            .ok_or_else(|| LedgerError::NotFound(format!("no market item with id {}", item_id)))
    }

    /// Fee share of a price at the current sales fee
    ///
    /// Exact floor of `price * bps / 10000`, computed so that prices up to
    /// `u128::MAX` cannot overflow: the quotient and remainder of the price
    /// are scaled separately, and the remainder term stays below 10^8.
    pub fn sales_fee_for(&self, price: u128) -> u128 {
        let bps = u128::from(self.config.sales_fee_bps);
        price / BPS_DENOMINATOR * bps + price % BPS_DENOMINATOR * bps / BPS_DENOMINATOR
    }

    /// Complete the `Listed -> Sold` transition for an item
    ///
    /// The caller (the ledger) is responsible for moving funds and the token
    /// according to the returned settlement; this records the terminal state
    /// and emits the sale event.
    ///
    /// # Returns
    /// * `Err(NotFound)` - unknown item id
    /// * `Err(AlreadySold)` - the item already sold
    pub fn mark_sold(
        &mut self,
        item_id: MarketItemId,
        buyer: AccountId,
    ) -> Result<SaleSettlement, LedgerError> {
        let fee = {
            let item = self.fetch_market_item(item_id)?;
            if item.sold {
                return Err(LedgerError::AlreadySold(item_id));
            }
            self.sales_fee_for(item.price)
        };

        // fetch_market_item already bounds-checked the index
        let item = &mut self.items[(item_id - 1) as usize];
        item.sold = true;
        item.owner = Some(buyer);

        debug!(
            "item {} sold to {} for {} (fee {})",
            item_id, buyer, item.price, fee
        );

        self.pending_events.push(LedgerEvent::MarketItemSold {
            item_id,
            token_id: item.token_id,
            seller: item.seller,
            buyer,
            price: item.price,
            fee,
        });

        Ok(SaleSettlement {
            seller: item.seller,
            price: item.price,
            fee,
            token_contract: item.token_contract,
            token_id: item.token_id,
        })
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

impl Ownable for Market {
    fn owner(&self) -> &AccountId {
        &self.owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_MIN_LISTING_PRICE, DEFAULT_SALES_FEE_BPS};

    fn setup() -> (Market, AccountId) {
        let owner = AccountId::random();
        let address = AccountId::derive(&[b"market", owner.bytes()]);
        (Market::new(address, owner), owner)
    }

    #[test]
    fn test_deployment_defaults() {
        let (market, owner) = setup();
        assert_eq!(market.get_market_sales_fee(), DEFAULT_SALES_FEE_BPS);
        assert_eq!(market.get_min_listing_price(), DEFAULT_MIN_LISTING_PRICE);
        assert_eq!(*market.payout_wallet(), owner);
    }

    #[test]
    fn test_update_sales_fee_from_non_owner_fails() {
        let (mut market, _) = setup();
        let stranger = AccountId::random();
        let err = market.set_market_sales_fee(&stranger, 1).unwrap_err();
        assert!(err.to_string().contains("caller is not the owner"));
        assert_eq!(market.get_market_sales_fee(), DEFAULT_SALES_FEE_BPS);
    }

    #[test]
    fn test_owner_updates_configuration() {
        let (mut market, owner) = setup();
        let wallet = AccountId::random();

        market.set_market_sales_fee(&owner, 350).unwrap();
        market.set_min_listing_price(&owner, 42).unwrap();
        market.set_wallet(&owner, wallet).unwrap();

        assert_eq!(market.get_market_sales_fee(), 350);
        assert_eq!(market.get_min_listing_price(), 42);
        assert_eq!(*market.payout_wallet(), wallet);
    }

    #[test]
    fn test_non_owner_setters_all_fail() {
        let (mut market, _) = setup();
        let stranger = AccountId::random();
        assert!(market.set_min_listing_price(&stranger, 1).is_err());
        assert!(market.set_wallet(&stranger, stranger).is_err());
    }

    #[test]
    fn test_sales_fee_bounded_to_10000() {
        let (mut market, owner) = setup();
        assert!(market.set_market_sales_fee(&owner, 10_000).is_ok());
        let err = market.set_market_sales_fee(&owner, 10_001).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidReference(_)));
    }

    #[test]
    fn test_listing_below_floor_fails() {
        let (mut market, owner) = setup();
        let err = market
            .create_market_item(
                &owner,
                AccountId::random(),
                1,
                DEFAULT_MIN_LISTING_PRICE - 1,
            )
            .unwrap_err();
        assert!(err.to_string().contains("Listing price too low"));
        assert!(market.fetch_market_item(1).is_err());
    }

    #[test]
    fn test_listing_at_floor_succeeds_and_emits() {
        let (mut market, _) = setup();
        let seller = AccountId::random();
        let token_contract = AccountId::random();

        let item_id = market
            .create_market_item(&seller, token_contract, 7, DEFAULT_MIN_LISTING_PRICE)
            .unwrap();
        assert_eq!(item_id, 1);

        let item = market.fetch_market_item(1).unwrap();
        assert_eq!(item.seller, seller);
        assert_eq!(item.owner, None);
        assert!(!item.sold);

        let events = market.drain_events();
        assert_eq!(
            events,
            vec![LedgerEvent::MarketItemCreated {
                item_id: 1,
                token_contract,
                token_id: 7,
                seller,
                owner: None,
                price: DEFAULT_MIN_LISTING_PRICE,
                sold: false,
            }]
        );
    }

    #[test]
    fn test_item_ids_are_sequential_and_skip_failures() {
        let (mut market, _) = setup();
        let seller = AccountId::random();
        let contract = AccountId::random();

        let first = market
            .create_market_item(&seller, contract, 1, DEFAULT_MIN_LISTING_PRICE)
            .unwrap();
        assert!(market.create_market_item(&seller, contract, 2, 0).is_err());
        let second = market
            .create_market_item(&seller, contract, 3, DEFAULT_MIN_LISTING_PRICE)
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[test]
    fn test_fetch_unknown_item_fails() {
        let (market, _) = setup();
        assert!(matches!(
            market.fetch_market_item(0),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            market.fetch_market_item(5),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_fee_math() {
        let (mut market, owner) = setup();
        assert_eq!(market.sales_fee_for(10_000), 200);
        market.set_market_sales_fee(&owner, 0).unwrap();
        assert_eq!(market.sales_fee_for(10_000), 0);
        market.set_market_sales_fee(&owner, 10_000).unwrap();
        assert_eq!(market.sales_fee_for(12_345), 12_345);
    }

    #[test]
    fn test_fee_math_handles_extreme_prices() {
        let (mut market, owner) = setup();

        // 200 bps is exactly 2%, so the fee is the floor of price / 50
        assert_eq!(market.sales_fee_for(u128::MAX), u128::MAX / 50);

        market.set_market_sales_fee(&owner, 10_000).unwrap();
        assert_eq!(market.sales_fee_for(u128::MAX), u128::MAX);

        market.set_market_sales_fee(&owner, 0).unwrap();
        assert_eq!(market.sales_fee_for(u128::MAX), 0);

        // split computation stays exact for prices that are not multiples
        // of the denominator
        market.set_market_sales_fee(&owner, 333).unwrap();
        assert_eq!(market.sales_fee_for(9_999), 9_999 * 333 / 10_000);
    }

    #[test]
    fn test_mark_sold_is_terminal() {
        let (mut market, _) = setup();
        let seller = AccountId::random();
        let buyer = AccountId::random();
        let item_id = market
            .create_market_item(&seller, AccountId::random(), 1, DEFAULT_MIN_LISTING_PRICE)
            .unwrap();

        let settlement = market.mark_sold(item_id, buyer).unwrap();
        assert_eq!(settlement.seller, seller);
        assert_eq!(settlement.price, DEFAULT_MIN_LISTING_PRICE);
        assert_eq!(settlement.fee, market.sales_fee_for(DEFAULT_MIN_LISTING_PRICE));

        let item = market.fetch_market_item(item_id).unwrap();
        assert!(item.sold);
        assert_eq!(item.owner, Some(buyer));

        assert!(matches!(
            market.mark_sold(item_id, buyer),
            Err(LedgerError::AlreadySold(1))
        ));
    }
}
