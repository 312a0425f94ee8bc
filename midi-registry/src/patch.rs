use midi_core::{DeviceId, TokenId};
use serde::{Deserialize, Serialize};

/// A single MIDI patch, minted as one non-fungible token
///
/// Name, device reference, and raw MIDI payload are immutable post-mint;
/// only ownership (tracked by the registry, not stored here) changes hands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    /// Sequential token id, starting at 1
    pub id: TokenId,

    /// Human-readable patch name
    pub name: String,

    /// The device this patch was minted against
    pub device_id: DeviceId,

    /// Raw MIDI payload (typically a sysex dump)
    pub data: Vec<u8>,
}

impl Patch {
    pub fn new(id: TokenId, name: String, device_id: DeviceId, data: Vec<u8>) -> Self {
        Self {
            id,
            name,
            device_id,
            data,
        }
    }

    /// The raw MIDI bytes supplied at mint time
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
