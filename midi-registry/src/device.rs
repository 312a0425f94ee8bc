use midi_core::DeviceId;
use serde::{Deserialize, Serialize};

/// A named manufacturer/model record that patches are grouped under
///
/// Devices are created once and never mutated; their id space is append-only
/// starting at 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Sequential device id, assigned in creation order
    pub id: DeviceId,

    /// Manufacturer name, e.g. "Yamaha"
    pub manufacturer: String,

    /// Device/model name, e.g. "TG-33"
    pub name: String,
}

impl Device {
    pub fn new(id: DeviceId, manufacturer: String, name: String) -> Self {
        Self {
            id,
            manufacturer,
            name,
        }
    }
}
