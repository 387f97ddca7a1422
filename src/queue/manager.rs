//! QueueManager - setup context for the priority queue
//!
//! The QueueManager bundles the shared [`PriorityQueueStore`] with the
//! [`ModuleRegistry`] so a module's priority and handler are registered in a
//! single call. It is an explicit value handed to producers and to the code
//! that builds the listener; there is no global instance.

use crate::core::sync::handle_mutex_poison;
use crate::notifications::api::NotificationHandler;
use crate::queue::{
    ModuleRegistry, Packet, PriorityQueueStore, QueueError, QueuePublisher, QueueResult,
    QueueStats, ReceiveQueueListener,
};
use std::sync::{Arc, Mutex, MutexGuard};

/// Registry state; `None` once the listener has taken the handlers
type RegistrySlot = Option<ModuleRegistry>;

/// Central setup point for modules, producers and the dispatch loop
///
/// # Example
///
/// ```rust
/// use packet_dispatch::notifications::api::{HandlerResult, NotificationEvent};
/// use packet_dispatch::queue::api::QueueManager;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = QueueManager::new();
/// manager.register_module(
///     "whiteboard",
///     1,
///     Arc::new(|_: NotificationEvent, _: &str| -> HandlerResult { Ok(()) }),
/// )?;
///
/// let publisher = manager.create_publisher("whiteboard")?;
/// let listener = manager.create_listener()?;
/// listener.start()?;
///
/// publisher.publish("stroke")?;
/// assert!(listener.wait_for_dispatched(1, Duration::from_secs(1)));
/// listener.stop()?;
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct QueueManager {
    store: Arc<PriorityQueueStore>,
    registry: Mutex<RegistrySlot>,
}

impl Default for QueueManager {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueManager {
    pub fn new() -> Self {
        Self::with_store(PriorityQueueStore::new())
    }

    /// Manager whose store drains up to `burst_per_pass` packets per module per pass
    pub fn with_burst_per_pass(burst_per_pass: usize) -> Self {
        Self::with_store(PriorityQueueStore::with_burst_per_pass(burst_per_pass))
    }

    fn with_store(store: PriorityQueueStore) -> Self {
        Self {
            store: Arc::new(store),
            registry: Mutex::new(Some(ModuleRegistry::new())),
        }
    }

    fn lock_registry(&self) -> QueueResult<MutexGuard<'_, RegistrySlot>> {
        handle_mutex_poison(self.registry.lock(), |message| QueueError::OperationFailed {
            message,
        })
    }

    /// Register a module's priority and handler together
    ///
    /// Rejected with [`QueueError::RegistrationClosed`] once the listener has
    /// been created, and with [`QueueError::DuplicateModule`] if the
    /// identifier is already taken (the first registration stays active).
    pub fn register_module(
        &self,
        module_id: impl Into<String>,
        priority: i32,
        handler: Arc<dyn NotificationHandler>,
    ) -> QueueResult<()> {
        let module_id = module_id.into();
        let mut slot = self.lock_registry()?;

        let Some(registry) = slot.as_mut() else {
            return Err(QueueError::RegistrationClosed { module_id });
        };
        if registry.contains(&module_id) {
            return Err(QueueError::DuplicateModule { module_id });
        }

        // Store first: it performs the remaining checks before anything is mutated
        self.store.register_module(module_id.clone(), priority)?;
        registry.register(module_id.clone(), handler)?;

        log::info!("Module '{}' registered (priority {})", module_id, priority);
        Ok(())
    }

    /// Build the dispatch loop; can be called once
    ///
    /// The listener takes ownership of every registered handler, so module
    /// registration closes here.
    pub fn create_listener(&self) -> QueueResult<ReceiveQueueListener> {
        let registry = self
            .lock_registry()?
            .take()
            .ok_or_else(|| QueueError::OperationFailed {
                message: "Listener has already been created for this queue".to_string(),
            })?;

        self.store.close_registration();
        Ok(ReceiveQueueListener::new(Arc::clone(&self.store), registry))
    }

    /// Create a producer handle bound to one registered module
    pub fn create_publisher(&self, module_id: impl Into<String>) -> QueueResult<QueuePublisher> {
        let module_id = module_id.into();
        if !self.store.is_registered(&module_id) {
            return Err(QueueError::UnknownModule { module_id });
        }
        Ok(QueuePublisher::new(module_id, Arc::downgrade(&self.store)))
    }

    pub fn enqueue(&self, packet: Packet) -> QueueResult<()> {
        self.store.enqueue(packet)
    }

    /// Shared store, for producers that build their own packets
    pub fn store(&self) -> Arc<PriorityQueueStore> {
        Arc::clone(&self.store)
    }

    pub fn module_ids(&self) -> Vec<String> {
        self.store.module_ids()
    }

    pub fn stats(&self) -> QueueStats {
        self.store.stats()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
