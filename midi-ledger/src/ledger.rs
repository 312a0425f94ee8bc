use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use midi_core::{
    AccountId, DeviceId, LedgerError, LedgerEvent, MarketItemId, SlotNumber, TokenId,
    TransactionHash, TransactionReceipt,
};
use midi_market::{Market, MarketItem};
use midi_registry::{Device, Patch, Registry};

use crate::event_log::{EventRecord, FileEventLog};

/// One external call into the ledger, dispatched by `Ledger::execute`
///
/// Every variant corresponds to a mutating operation of the Registry or the
/// Marketplace; read-only lookups go through the ledger's accessor methods
/// and never occupy a slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Call {
    CreateDevice {
        manufacturer: String,
        name: String,
    },
    CreatePatch {
        name: String,
        device_id: DeviceId,
        data: Vec<u8>,
    },
    Transfer {
        from: AccountId,
        to: AccountId,
        token_id: TokenId,
    },
    Approve {
        approved: AccountId,
        token_id: TokenId,
    },
    SetApprovalForAll {
        operator: AccountId,
        approved: bool,
    },
    SetContractAddress {
        address: AccountId,
    },
    SetMarketSalesFee {
        basis_points: u16,
    },
    SetMinListingPrice {
        amount: u128,
    },
    SetWallet {
        address: AccountId,
    },
    CreateMarketItem {
        token_contract: AccountId,
        token_id: TokenId,
        price: u128,
    },
    CreateMarketSale {
        item_id: MarketItemId,
    },
}

/// All committed state behind the ledger's single lock
struct LedgerState {
    registry: Registry,
    market: Market,

    /// Native balances in minor units; absent means zero
    balances: HashMap<AccountId, u128>,

    /// Next slot in the total transaction order
    current_slot: SlotNumber,

    /// Receipts of every processed transaction, committed or aborted
    receipts: HashMap<TransactionHash, TransactionReceipt>,
}

/// The single global serialized ledger
///
/// Holds the Registry and the Marketplace behind one mutex and executes each
/// call as an atomic, isolated transaction in a total slot order. A failed
/// call changes no state, consumes no entity id, and is surfaced as a
/// `success = false` receipt; nothing is retried internally.
pub struct Ledger {
    state: Mutex<LedgerState>,
    event_log: Option<FileEventLog>,
    registry_address: AccountId,
    market_address: AccountId,
}

impl Ledger {
    /// Deploy both components, owned by `deployer`
    ///
    /// The marketplace is deployed first, then the registry linked to the
    /// marketplace's address, matching the original deployment order.
    pub fn deploy(deployer: AccountId) -> Self {
        let market_address = AccountId::derive(&[b"midi-market", deployer.bytes()]);
        let registry_address = AccountId::derive(&[b"midi-registry", deployer.bytes()]);

        let market = Market::new(market_address, deployer);
        let registry = Registry::new(registry_address, deployer, market_address);

        debug!(
            "deployed market at {} and registry at {} for {}",
            market_address, registry_address, deployer
        );

        Self {
            state: Mutex::new(LedgerState {
                registry,
                market,
                balances: HashMap::new(),
                current_slot: 0,
                receipts: HashMap::new(),
            }),
            event_log: None,
            registry_address,
            market_address,
        }
    }

    /// Attach a file event log; every committed transaction is appended to it
    pub fn with_event_log(mut self, event_log: FileEventLog) -> Self {
        self.event_log = Some(event_log);
        self
    }

    /// Address the registry component is deployed at
    pub fn registry_address(&self) -> AccountId {
        self.registry_address
    }

    /// Address the marketplace component is deployed at
    pub fn market_address(&self) -> AccountId {
        self.market_address
    }

    /// Execute one call as an atomic transaction
    ///
    /// The call is assigned the next slot, hashed, dispatched against a
    /// consistent snapshot of committed state, and turned into a receipt.
    /// Committed transactions have their events appended to the event log.
    pub fn execute(&self, caller: AccountId, call: Call) -> TransactionReceipt {
        let mut state = self.lock_state();

        let slot = state.current_slot;
        state.current_slot += 1;
        let timestamp = current_timestamp();
        let transaction_hash = hash_call(slot, &caller, &call);

        let receipt = match dispatch(&mut state, &caller, call) {
            Ok((output, events)) => {
                debug!("slot {} committed ({} events)", slot, events.len());
                let receipt = TransactionReceipt::committed(
                    transaction_hash,
                    slot,
                    timestamp,
                    output,
                    events.clone(),
                );
                if let Some(log) = &self.event_log {
                    let record = EventRecord {
                        transaction_hash,
                        slot,
                        timestamp,
                        events,
                    };
                    if let Err(err) = log.append(&record) {
                        warn!("failed to append slot {} to event log: {}", slot, err);
                    }
                }
                receipt
            }
            Err(err) => {
                warn!("slot {} aborted: {}", slot, err);
                TransactionReceipt::failed(transaction_hash, slot, timestamp, err.to_string())
            }
        };

        state.receipts.insert(transaction_hash, receipt.clone());
        receipt
    }

    /// Look up the receipt of a processed transaction
    pub fn receipt(&self, hash: &TransactionHash) -> Option<TransactionReceipt> {
        self.lock_state().receipts.get(hash).cloned()
    }

    /// Credit an account's native balance (external funding, e.g. test setup)
    ///
    /// Saturates at `u128::MAX` rather than wrapping.
    pub fn credit(&self, account: AccountId, amount: u128) {
        let mut state = self.lock_state();
        let balance = state.balances.entry(account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Native balance of an account
    pub fn balance(&self, account: &AccountId) -> u128 {
        self.lock_state()
            .balances
            .get(account)
            .copied()
            .unwrap_or(0)
    }

    // ---- Registry reads ----

    pub fn get_devices(&self) -> Vec<Device> {
        self.lock_state().registry.get_devices().to_vec()
    }

    pub fn get_device_patch_count(&self, device_id: DeviceId) -> u64 {
        self.lock_state().registry.get_device_patch_count(device_id)
    }

    pub fn get_patches_by_owner(&self, account: &AccountId) -> Vec<TokenId> {
        self.lock_state()
            .registry
            .get_patches_by_owner(account)
            .to_vec()
    }

    pub fn fetch_patch(&self, token_id: TokenId) -> Result<Patch, LedgerError> {
        self.lock_state()
            .registry
            .fetch_patch(token_id)
            .map(Patch::clone)
    }

    pub fn owner_of(&self, token_id: TokenId) -> Result<AccountId, LedgerError> {
        self.lock_state().registry.owner_of(token_id)
    }

    pub fn balance_of(&self, account: &AccountId) -> u64 {
        self.lock_state().registry.balance_of(account)
    }

    pub fn get_market_contract_address(&self) -> AccountId {
        self.lock_state().registry.get_market_contract_address()
    }

    // ---- Marketplace reads ----

    pub fn get_market_sales_fee(&self) -> u16 {
        self.lock_state().market.get_market_sales_fee()
    }

    pub fn get_min_listing_price(&self) -> u128 {
        self.lock_state().market.get_min_listing_price()
    }

    pub fn payout_wallet(&self) -> AccountId {
        *self.lock_state().market.payout_wallet()
    }

    pub fn fetch_market_item(&self, item_id: MarketItemId) -> Result<MarketItem, LedgerError> {
        self.lock_state()
            .market
            .fetch_market_item(item_id)
            .map(MarketItem::clone)
    }

    fn lock_state(&self) -> MutexGuard<'_, LedgerState> {
        // Validate-then-mutate keeps the state consistent even if a previous
        // holder panicked, so a poisoned lock is recoverable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run one call against the state; on `Err` no state has been mutated
fn dispatch(
    state: &mut LedgerState,
    caller: &AccountId,
    call: Call,
) -> Result<(Option<u64>, Vec<LedgerEvent>), LedgerError> {
    match call {
        Call::CreateDevice { manufacturer, name } => {
            let id = state.registry.create_device(manufacturer, name);
            Ok((Some(id), state.registry.drain_events()))
        }
        Call::CreatePatch {
            name,
            device_id,
            data,
        } => {
            let id = state.registry.create_patch(caller, name, device_id, data)?;
            Ok((Some(id), state.registry.drain_events()))
        }
        Call::Transfer { from, to, token_id } => {
            state.registry.transfer(caller, &from, &to, token_id)?;
            Ok((None, state.registry.drain_events()))
        }
        Call::Approve { approved, token_id } => {
            state.registry.approve(caller, approved, token_id)?;
            Ok((None, Vec::new()))
        }
        Call::SetApprovalForAll { operator, approved } => {
            state.registry.set_approval_for_all(caller, operator, approved);
            Ok((None, Vec::new()))
        }
        Call::SetContractAddress { address } => {
            state.registry.set_contract_address(caller, address)?;
            Ok((None, Vec::new()))
        }
        Call::SetMarketSalesFee { basis_points } => {
            state.market.set_market_sales_fee(caller, basis_points)?;
            Ok((None, Vec::new()))
        }
        Call::SetMinListingPrice { amount } => {
            state.market.set_min_listing_price(caller, amount)?;
            Ok((None, Vec::new()))
        }
        Call::SetWallet { address } => {
            state.market.set_wallet(caller, address)?;
            Ok((None, Vec::new()))
        }
        Call::CreateMarketItem {
            token_contract,
            token_id,
            price,
        } => {
            let id = state
                .market
                .create_market_item(caller, token_contract, token_id, price)?;
            Ok((Some(id), state.market.drain_events()))
        }
        Call::CreateMarketSale { item_id } => {
            let events = settle_sale(state, caller, item_id)?;
            Ok((None, events))
        }
    }
}

/// Complete a sale: move the token, split the proceeds, mark the item sold
///
/// Validation happens strictly before any mutation: the listing must be
/// unsold and reference the linked registry, the buyer must cover the price,
/// and the registry transfer must be admissible. Only then do balances move
/// and the item records its terminal state.
fn settle_sale(
    state: &mut LedgerState,
    buyer: &AccountId,
    item_id: MarketItemId,
) -> Result<Vec<LedgerEvent>, LedgerError> {
    let (seller, price, token_contract, token_id) = {
        let item = state.market.fetch_market_item(item_id)?;
        if item.sold {
            return Err(LedgerError::AlreadySold(item_id));
        }
        (item.seller, item.price, item.token_contract, item.token_id)
    };

    if token_contract != *state.registry.address() {
        return Err(LedgerError::InvalidReference(format!(
            "market item {} references unknown token contract {}",
            item_id, token_contract
        )));
    }

    let buyer_balance = state.balances.get(buyer).copied().unwrap_or(0);
    if buyer_balance < price {
        return Err(LedgerError::InsufficientFunds(format!(
            "balance {} does not cover price {}",
            buyer_balance, price
        )));
    }

    // Settlement amounts are fixed before the first write; fee math is
    // overflow-free for any price, so nothing below this point can abort.
    let fee = state.market.sales_fee_for(price);
    let payout_wallet = *state.market.payout_wallet();

    // The registry transfer validates before it mutates, so a rejection here
    // still leaves the whole transaction without effect.
    let market_address = *state.market.address();
    state
        .registry
        .transfer(&market_address, &seller, buyer, token_id)?;

    state.market.mark_sold(item_id, *buyer)?;

    *state.balances.entry(*buyer).or_insert(0) -= price;
    let wallet_balance = state.balances.entry(payout_wallet).or_insert(0);
    *wallet_balance = wallet_balance.saturating_add(fee);
    let seller_balance = state.balances.entry(seller).or_insert(0);
    *seller_balance = seller_balance.saturating_add(price - fee);

    let mut events = state.registry.drain_events();
    events.append(&mut state.market.drain_events());
    Ok(events)
}

/// Hash a call into its transaction hash
fn hash_call(slot: SlotNumber, caller: &AccountId, call: &Call) -> TransactionHash {
    let mut hasher = Sha256::new();

    // Domain separator
    hasher.update(b"MIDI_Transaction");

    hasher.update(slot.to_le_bytes());
    hasher.update(caller.bytes());
    // Call serialization is infallible for these variants; fall back to the
    // debug form rather than aborting the hash.
    match bincode::serialize(call) {
        Ok(bytes) => hasher.update(&bytes),
        Err(_) => hasher.update(format!("{:?}", call).as_bytes()),
    }

    hasher.finalize().into()
}

/// Current timestamp in seconds
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
