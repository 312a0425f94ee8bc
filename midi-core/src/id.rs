use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Deref;

/// Sequential identifier of a registered device. Device ids start at 0.
pub type DeviceId = u64;

/// Sequential identifier of a minted patch token. Token ids start at 1;
/// the 0 slot is reserved and never minted.
pub type TokenId = u64;

/// Sequential identifier of a market listing. Item ids start at 1.
pub type MarketItemId = u64;

// AccountId uniquely identifies an account on the ledger.
// It is a 32 byte long unique identifier, resembling a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId([u8; 32]);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format as a hex string with a prefix of the first 6 bytes
        let prefix = hex::encode(&self.0[0..6]);
        write!(f, "acct:{}", prefix)
    }
}

impl Ord for AccountId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for AccountId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Default for AccountId {
    fn default() -> Self {
        AccountId([0; 32])
    }
}

impl Deref for AccountId {
    type Target = [u8; 32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AccountId {
    /// The all-zero account, used as the unset/burn address.
    pub const ZERO: AccountId = AccountId([0; 32]);

    pub fn new(id: [u8; 32]) -> Self {
        AccountId(id)
    }

    /// Create an AccountId from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        AccountId(bytes)
    }

    /// Get a reference to the internal bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether this is the zero/unset account
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 32]
    }

    /// Derive a deterministic AccountId from a set of seeds
    ///
    /// Used to assign addresses to deployed components: the same seeds always
    /// produce the same address.
    pub fn derive(seeds: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();

        // Domain separator
        hasher.update(b"MIDI_Account");

        for seed in seeds {
            hasher.update(seed);
        }

        AccountId(hasher.finalize().into())
    }

    /// Create a random AccountId for testing
    pub fn random() -> Self {
        // Generate a random ID using system time
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
            .to_le_bytes();

        static COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
        let nonce = COUNTER
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            .to_le_bytes();

        Self::derive(&[&now, &nonce])
    }
}
