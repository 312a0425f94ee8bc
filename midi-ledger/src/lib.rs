//! MIDI Ledger
//!
//! This crate re-exports all the components of the MIDI ledger and provides
//! the `Ledger` runtime that executes calls against them as serialized,
//! atomic transactions.

pub mod event_log;
pub mod ledger;

pub use event_log::{EventRecord, FileEventLog};
pub use ledger::{Call, Ledger};

pub use midi_core::*;
pub use midi_market::{Market, MarketConfig, MarketItem, SaleSettlement};
pub use midi_registry::{Device, Patch, Registry};
