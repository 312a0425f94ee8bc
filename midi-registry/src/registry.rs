use std::collections::{HashMap, HashSet};

use log::debug;
use midi_core::{AccountId, DeviceId, LedgerError, LedgerEvent, Ownable, TokenId};

use crate::device::Device;
use crate::patch::Patch;

/// The device/patch registry component ("MIDI")
///
/// Exclusively owns device and patch records, the per-owner token index, and
/// the per-device patch counters. The marketplace is referenced only by its
/// address; the registry never embeds marketplace state.
///
/// Every mutating operation validates completely before touching state, so a
/// failed call leaves the registry exactly as it found it and consumes no id.
#[derive(Debug)]
pub struct Registry {
    /// Address this component was deployed at
    address: AccountId,

    /// The privileged account recorded at deployment
    owner: AccountId,

    /// Address of the linked marketplace component
    ///
    /// The linked marketplace acts as an approved operator for every holder,
    /// which is how a completed sale moves the sold token to its buyer.
    market_contract_address: AccountId,

    /// All devices in creation order; a device's id is its index here
    devices: Vec<Device>,

    /// Minted patches by token id
    patches: HashMap<TokenId, Patch>,

    /// Current owner of each minted token
    token_owners: HashMap<TokenId, AccountId>,

    /// Token ids held by each account, in insertion order of mint/transfer-in
    owner_index: HashMap<AccountId, Vec<TokenId>>,

    /// Number of patches minted against each device
    device_patch_counts: HashMap<DeviceId, u64>,

    /// Single approved account per token, cleared on transfer
    token_approvals: HashMap<TokenId, AccountId>,

    /// Accounts approved to manage all tokens of a holder
    operator_approvals: HashMap<AccountId, HashSet<AccountId>>,

    /// Next token id to assign; token ids start at 1
    next_token_id: TokenId,

    /// Events emitted since the last drain
    pending_events: Vec<LedgerEvent>,
}

impl Registry {
    /// Create a registry owned by `owner` and linked to the marketplace at
    /// `market_contract_address`
    pub fn new(address: AccountId, owner: AccountId, market_contract_address: AccountId) -> Self {
        Self {
            address,
            owner,
            market_contract_address,
            devices: Vec::new(),
            patches: HashMap::new(),
            token_owners: HashMap::new(),
            owner_index: HashMap::new(),
            device_patch_counts: HashMap::new(),
            token_approvals: HashMap::new(),
            operator_approvals: HashMap::new(),
            next_token_id: 1,
            pending_events: Vec::new(),
        }
    }

    /// The address this component was deployed at
    pub fn address(&self) -> &AccountId {
        &self.address
    }

    /// Append a new device; ids are assigned sequentially starting at 0
    ///
    /// Devices are open for anyone to create and immutable afterwards.
    pub fn create_device(&mut self, manufacturer: String, name: String) -> DeviceId {
        let id = self.devices.len() as DeviceId;
        debug!("registering device {} ({} {})", id, manufacturer, name);
        self.devices.push(Device::new(id, manufacturer, name));
        id
    }

    /// Mint a new patch token against an existing device
    ///
    /// The token is minted to the caller, credited to the caller's owner
    /// index, and counted against the device.
    ///
    /// # Returns
    /// * `Ok(token_id)` - The newly assigned token id (starting at 1)
    /// * `Err(InvalidReference)` - `device_id` does not name a created device
    pub fn create_patch(
        &mut self,
        caller: &AccountId,
        name: String,
        device_id: DeviceId,
        data: Vec<u8>,
    ) -> Result<TokenId, LedgerError> {
        if device_id >= self.devices.len() as DeviceId {
            return Err(LedgerError::no_device());
        }

        let token_id = self.next_token_id;
        self.next_token_id += 1;

        debug!(
            "minting patch token {} ({} bytes) for device {} to {}",
            token_id,
            data.len(),
            device_id,
            caller
        );

        self.patches
            .insert(token_id, Patch::new(token_id, name, device_id, data));
        self.token_owners.insert(token_id, *caller);
        self.owner_index.entry(*caller).or_default().push(token_id);
        *self.device_patch_counts.entry(device_id).or_insert(0) += 1;

        self.pending_events.push(LedgerEvent::Transfer {
            from: None,
            to: Some(*caller),
            token_id,
        });

        Ok(token_id)
    }

    /// All devices in creation order
    pub fn get_devices(&self) -> &[Device] {
        &self.devices
    }

    /// Number of patches minted against a device; 0 when none (or when the
    /// device does not exist)
    pub fn get_device_patch_count(&self, device_id: DeviceId) -> u64 {
        self.device_patch_counts
            .get(&device_id)
            .copied()
            .unwrap_or(0)
    }

    /// Token ids held by an account, in insertion order of mint/transfer-in
    pub fn get_patches_by_owner(&self, account: &AccountId) -> &[TokenId] {
        self.owner_index
            .get(account)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look up a minted patch by token id
    pub fn fetch_patch(&self, token_id: TokenId) -> Result<&Patch, LedgerError> {
        self.patches.get(&token_id).ok_or_else(|| {
            LedgerError::NotFound(format!("no patch minted with token id {}", token_id))
        })
    }

    /// Current owner of a minted token
    pub fn owner_of(&self, token_id: TokenId) -> Result<AccountId, LedgerError> {
        self.token_owners.get(&token_id).copied().ok_or_else(|| {
            LedgerError::NotFound(format!("no patch minted with token id {}", token_id))
        })
    }

    /// Number of tokens held by an account
    pub fn balance_of(&self, account: &AccountId) -> u64 {
        self.get_patches_by_owner(account).len() as u64
    }

    /// Approve a single account to transfer a specific token
    ///
    /// Only the token's owner, or an operator approved for the owner, may
    /// grant the approval. The approval is cleared when the token moves.
    pub fn approve(
        &mut self,
        caller: &AccountId,
        approved: AccountId,
        token_id: TokenId,
    ) -> Result<(), LedgerError> {
        let token_owner = self.owner_of(token_id)?;
        if *caller != token_owner && !self.is_approved_for_all(&token_owner, caller) {
            return Err(LedgerError::Unauthorized(
                "caller is not owner nor approved operator".to_string(),
            ));
        }
        self.token_approvals.insert(token_id, approved);
        Ok(())
    }

    /// Grant or revoke an operator's right to manage all of the caller's
    /// tokens
    pub fn set_approval_for_all(&mut self, caller: &AccountId, operator: AccountId, approved: bool) {
        let operators = self.operator_approvals.entry(*caller).or_default();
        if approved {
            operators.insert(operator);
        } else {
            operators.remove(&operator);
        }
    }

    /// Whether `operator` may manage all tokens held by `holder`
    ///
    /// The linked marketplace is implicitly approved for every holder so that
    /// a completed sale can move the sold token.
    pub fn is_approved_for_all(&self, holder: &AccountId, operator: &AccountId) -> bool {
        if !self.market_contract_address.is_zero() && *operator == self.market_contract_address {
            return true;
        }
        self.operator_approvals
            .get(holder)
            .map(|operators| operators.contains(operator))
            .unwrap_or(false)
    }

    /// Move a token from one account to another
    ///
    /// Device reference, name, and MIDI data are untouched; only the owner
    /// index and the token's owner change, and any per-token approval is
    /// cleared.
    ///
    /// # Returns
    /// * `Err(NotFound)` - `token_id` was never minted
    /// * `Err(InvalidReference)` - `from` is not the current owner, or `to`
    ///   is the zero account
    /// * `Err(Unauthorized)` - the caller is neither the owner, the approved
    ///   account for the token, nor an approved operator
    pub fn transfer(
        &mut self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        token_id: TokenId,
    ) -> Result<(), LedgerError> {
        let current_owner = self.owner_of(token_id)?;
        if current_owner != *from {
            return Err(LedgerError::InvalidReference(
                "transfer from incorrect owner".to_string(),
            ));
        }
        if to.is_zero() {
            return Err(LedgerError::InvalidReference(
                "transfer to the zero account".to_string(),
            ));
        }
        if !self.is_authorized_for_token(caller, from, token_id) {
            return Err(LedgerError::Unauthorized(
                "caller is not owner nor approved".to_string(),
            ));
        }

        debug!("transferring token {} from {} to {}", token_id, from, to);

        self.token_approvals.remove(&token_id);
        if let Some(held) = self.owner_index.get_mut(from) {
            held.retain(|id| *id != token_id);
        }
        self.owner_index.entry(*to).or_default().push(token_id);
        self.token_owners.insert(token_id, *to);

        self.pending_events.push(LedgerEvent::Transfer {
            from: Some(*from),
            to: Some(*to),
            token_id,
        });

        Ok(())
    }

    /// Update the linked marketplace address; owner-gated
    pub fn set_contract_address(
        &mut self,
        caller: &AccountId,
        address: AccountId,
    ) -> Result<(), LedgerError> {
        self.require_owner(caller)?;
        self.market_contract_address = address;
        Ok(())
    }

    /// The linked marketplace address
    pub fn get_market_contract_address(&self) -> AccountId {
        self.market_contract_address
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn is_authorized_for_token(
        &self,
        caller: &AccountId,
        token_owner: &AccountId,
        token_id: TokenId,
    ) -> bool {
        caller == token_owner
            || self.token_approvals.get(&token_id) == Some(caller)
            || self.is_approved_for_all(token_owner, caller)
    }
}

impl Ownable for Registry {
    fn owner(&self) -> &AccountId {
        &self.owner
    }
}
