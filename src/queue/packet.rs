//! Packet type carried through the priority queue
//!
//! A packet is the unit of queued work: the identifier of the module it is
//! addressed to plus an opaque, already serialized payload. The queue never
//! inspects the payload.

use serde::{Deserialize, Serialize};

/// Unit of work addressed to a single module
///
/// # Example
///
/// ```rust
/// use packet_dispatch::queue::api::Packet;
///
/// let packet = Packet::new("whiteboard", "{\"stroke\":[1,2,3]}");
/// assert_eq!(packet.module_identifier(), "whiteboard");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    module_identifier: String,
    serialized_data: String,
}

impl Packet {
    pub fn new(module_identifier: impl Into<String>, serialized_data: impl Into<String>) -> Self {
        Self {
            module_identifier: module_identifier.into(),
            serialized_data: serialized_data.into(),
        }
    }

    pub fn module_identifier(&self) -> &str {
        &self.module_identifier
    }

    pub fn serialized_data(&self) -> &str {
        &self.serialized_data
    }

    /// Split the packet into `(module_identifier, serialized_data)`
    pub fn into_parts(self) -> (String, String) {
        (self.module_identifier, self.serialized_data)
    }
}

/// Identifiers of the modules shipped with the default configuration
pub mod modules {
    pub const WHITEBOARD: &str = "whiteboard";
    pub const SCREEN_SHARE: &str = "screenshare";
    pub const FILE: &str = "file";
}

/// Default priorities for the built-in modules (lower value is more urgent)
pub mod priorities {
    pub const WHITEBOARD: i32 = 1;
    pub const SCREEN_SHARE: i32 = 2;
    pub const FILE: i32 = 3;
}
