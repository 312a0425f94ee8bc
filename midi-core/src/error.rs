use crate::id::MarketItemId;
use std::io;
use thiserror::Error;

/// Represents all possible errors that can abort a ledger transaction
///
/// Every failure is terminal for its transaction: no partial state change
/// survives and nothing is retried internally.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The caller is not allowed to perform the operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// An operation referenced an entity that does not exist or is invalid
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// A listing was attempted below the configured minimum price
    #[error("Price too low: {0}")]
    PriceTooLow(String),

    /// Lookup of an entity that was never created
    #[error("Not found: {0}")]
    NotFound(String),

    /// The buyer's balance does not cover the purchase price
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// The market item has already completed its Listed -> Sold transition
    #[error("Market item {0} already sold")]
    AlreadySold(MarketItemId),

    /// IO errors that occur when writing or replaying the event log
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Errors that occur during event log operations
    #[error("Event log error: {0}")]
    EventLog(String),

    /// Anyhow error wrapper for error context
    #[error(transparent)]
    Context(#[from] anyhow::Error),
}

impl From<bincode::Error> for LedgerError {
    fn from(err: bincode::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl LedgerError {
    /// The fixed reason string for every owner-gated operation
    pub fn not_owner() -> Self {
        LedgerError::Unauthorized("caller is not the owner".to_string())
    }

    /// The fixed reason string for patch creation against a missing device
    pub fn no_device() -> Self {
        LedgerError::InvalidReference("No Device ID found".to_string())
    }

    /// The fixed reason string for listing below the configured floor
    pub fn listing_too_low() -> Self {
        LedgerError::PriceTooLow("Listing price too low".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_reason_strings() {
        assert_eq!(
            LedgerError::not_owner().to_string(),
            "Unauthorized: caller is not the owner"
        );
        assert_eq!(
            LedgerError::no_device().to_string(),
            "Invalid reference: No Device ID found"
        );
        assert_eq!(
            LedgerError::listing_too_low().to_string(),
            "Price too low: Listing price too low"
        );
    }

    #[test]
    fn test_already_sold_carries_item_id() {
        assert_eq!(
            LedgerError::AlreadySold(7).to_string(),
            "Market item 7 already sold"
        );
    }
}
