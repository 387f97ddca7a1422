//! Priority Queue Component
//!
//! A priority-aware packet queue with per-module registration and a
//! background listener that delivers each packet to its module's handler.
//!
//! # Overview
//!
//! - **Per-module FIFO**: packets for one module are delivered in enqueue order
//! - **Priorities**: the most urgent non-empty module is serviced first
//!   (lower numeric priority is more urgent, ties go to the earlier registration)
//! - **Starvation bound**: each module is serviced at most `burst_per_pass`
//!   times per scheduling pass, so every non-empty module gets a turn within
//!   one pass over all modules
//! - **Isolation**: a failing or panicking handler never stops delivery to
//!   other modules
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  ┌────────────┐  ┌────────────┐
//! │ whiteboard │  │screenshare │  │    file    │   producers / QueuePublisher
//! └─────┬──────┘  └─────┬──────┘  └─────┬──────┘
//!       │ enqueue       │ enqueue       │ enqueue
//!       ▼               ▼               ▼
//! ┌─────────────────────────────────────────────┐
//! │             PriorityQueueStore              │
//! │  p1 whiteboard  [w1][w2]                    │
//! │  p2 screenshare [s1]                        │
//! │  p3 file        [f1][f2][f3]                │
//! └──────────────────────┬──────────────────────┘
//!                        │ dequeue (priority pass)
//!                        ▼
//! ┌─────────────────────────────────────────────┐
//! │ ReceiveQueueListener (worker thread)        │
//! │   ModuleRegistry ─▶ handler.notify(...)     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use packet_dispatch::notifications::api::{HandlerResult, NotificationEvent};
//! use packet_dispatch::queue::api::{modules, priorities, Packet, QueueManager};
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = QueueManager::new();
//! manager.register_module(
//!     modules::WHITEBOARD,
//!     priorities::WHITEBOARD,
//!     Arc::new(|_: NotificationEvent, data: &str| -> HandlerResult {
//!         println!("whiteboard update: {}", data);
//!         Ok(())
//!     }),
//! )?;
//!
//! let listener = manager.create_listener()?;
//! listener.start()?;
//! manager.enqueue(Packet::new(modules::WHITEBOARD, "{\"x\":1}"))?;
//! listener.stop()?;
//! # Ok(())
//! # }
//! ```

mod error;
mod listener;
mod manager;
mod packet;
mod publisher;
mod registry;
mod store;
mod types;

pub mod api;

pub use error::{QueueError, QueueResult};
pub use listener::{ReceiveQueueListener, MAX_RECORDED_FAILURES};
pub use manager::QueueManager;
pub use packet::{modules, priorities, Packet};
pub use publisher::QueuePublisher;
pub use registry::ModuleRegistry;
pub use store::{PriorityQueueStore, DEFAULT_BURST_PER_PASS};
pub use types::{DispatchFailure, HandlerStatistics, ModuleQueueStats, QueueStats};

#[cfg(test)]
mod tests;
