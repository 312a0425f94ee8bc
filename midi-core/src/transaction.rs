use crate::events::LedgerEvent;
use serde::{Deserialize, Serialize};

/// Transaction hash type (32-byte array)
pub type TransactionHash = [u8; 32];

/// Position of a transaction in the single global serialized order
pub type SlotNumber = u64;

/// A receipt of a processed transaction
///
/// Every call through the ledger produces exactly one receipt, whether it
/// committed or aborted. Committed receipts carry the events the transaction
/// emitted and, for creation calls, the sequential id that was assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// The hash of the transaction that was executed
    pub transaction_hash: TransactionHash,

    /// The slot in which this transaction was processed
    pub slot: SlotNumber,

    /// Whether the transaction committed
    pub success: bool,

    /// Timestamp when the transaction was processed (Unix seconds)
    pub timestamp: u64,

    /// Sequential id assigned by a creation call (device, token, or item id)
    pub output: Option<u64>,

    /// Events emitted by the transaction (empty unless committed)
    pub events: Vec<LedgerEvent>,

    /// Any error message from the execution (if not successful)
    pub error_message: Option<String>,
}

impl TransactionReceipt {
    /// Create a receipt for a committed transaction
    pub fn committed(
        transaction_hash: TransactionHash,
        slot: SlotNumber,
        timestamp: u64,
        output: Option<u64>,
        events: Vec<LedgerEvent>,
    ) -> Self {
        Self {
            transaction_hash,
            slot,
            success: true,
            timestamp,
            output,
            events,
            error_message: None,
        }
    }

    /// Create a receipt for an aborted transaction
    pub fn failed(
        transaction_hash: TransactionHash,
        slot: SlotNumber,
        timestamp: u64,
        error_message: String,
    ) -> Self {
        Self {
            transaction_hash,
            slot,
            success: false,
            timestamp,
            output: None,
            events: Vec::new(),
            error_message: Some(error_message),
        }
    }
}
