//! Public API for the network communicator
//!
//! External modules should import from here rather than directly from
//! internal modules.

pub use crate::network::client::{ClientCommunicator, CONNECTED_STATUS};
pub use crate::network::error::{CommunicatorError, CommunicatorResult};
pub use crate::network::frame::{decode_frame, encode_frame};
pub use crate::network::server::{ServerCommunicator, DEFAULT_HOST, MAX_FRAME_BYTES};
