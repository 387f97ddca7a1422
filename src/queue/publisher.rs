//! Queue Publisher for sending packets to one module
//!
//! Publishers are lightweight producer handles. Each one is bound to a
//! single module identifier and wraps payloads into packets for it, so
//! sender threads never have to spell out the module name.

use crate::queue::error::{QueueError, QueueResult};
use crate::queue::packet::Packet;
use crate::queue::store::PriorityQueueStore;
use std::sync::Weak;

/// Producer handle for one module
///
/// Cheap to clone and safe to move to other threads. The handle holds a
/// weak reference, so it does not keep the store alive on its own.
///
/// # Example
///
/// ```rust,no_run
/// # use packet_dispatch::queue::api::QueueManager;
/// # fn example(manager: QueueManager) -> Result<(), Box<dyn std::error::Error>> {
/// let publisher = manager.create_publisher("file")?;
/// publisher.publish("{\"chunk\":0}")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct QueuePublisher {
    module_id: String,
    store: Weak<PriorityQueueStore>,
}

impl QueuePublisher {
    pub(crate) fn new(module_id: String, store: Weak<PriorityQueueStore>) -> Self {
        Self { module_id, store }
    }

    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    /// Enqueue a serialized payload for this publisher's module
    pub fn publish(&self, serialized_data: impl Into<String>) -> QueueResult<()> {
        let store = self
            .store
            .upgrade()
            .ok_or_else(|| QueueError::OperationFailed {
                message: "PriorityQueueStore no longer exists".to_string(),
            })?;

        store.enqueue(Packet::new(self.module_id.clone(), serialized_data))
    }
}
