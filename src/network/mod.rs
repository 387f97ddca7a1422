//! Network Communicator Component
//!
//! A thin TCP transport between peers. [`ServerCommunicator`] listens and
//! reports its address, [`ClientCommunicator`] connects and reports a status
//! string. Packets travel as newline-delimited JSON frames; a server built
//! with a [`PriorityQueueStore`](crate::queue::api::PriorityQueueStore)
//! enqueues every valid frame it receives.
//!
//! ```text
//! ClientCommunicator ──frame\n──▶ ServerCommunicator ──enqueue──▶ PriorityQueueStore
//! ```

mod client;
mod error;
mod frame;
mod server;

pub mod api;

pub use client::{ClientCommunicator, CONNECTED_STATUS};
pub use error::{CommunicatorError, CommunicatorResult};
pub use frame::{decode_frame, encode_frame};
pub use server::{ServerCommunicator, DEFAULT_HOST, MAX_FRAME_BYTES};
