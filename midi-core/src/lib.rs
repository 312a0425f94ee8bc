pub mod error;
pub mod events;
pub mod id;
pub mod ownable;
pub mod transaction;

// Re-export the main types for convenience
pub use error::LedgerError;
pub use events::LedgerEvent;
pub use id::{AccountId, DeviceId, MarketItemId, TokenId};
pub use ownable::Ownable;
pub use transaction::{SlotNumber, TransactionHash, TransactionReceipt};
