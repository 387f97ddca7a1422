//! Public API for the queue system
//!
//! External modules should import from here rather than directly from
//! internal modules. See the module documentation for the architecture.

// Core queue components
pub use crate::queue::listener::{ReceiveQueueListener, MAX_RECORDED_FAILURES};
pub use crate::queue::manager::QueueManager;
pub use crate::queue::publisher::QueuePublisher;
pub use crate::queue::registry::ModuleRegistry;
pub use crate::queue::store::{PriorityQueueStore, DEFAULT_BURST_PER_PASS};

// Packet type and built-in module identifiers
pub use crate::queue::packet::{modules, priorities, Packet};

// Error handling
pub use crate::queue::error::{QueueError, QueueResult};

// Statistics
pub use crate::queue::types::{DispatchFailure, HandlerStatistics, ModuleQueueStats, QueueStats};
