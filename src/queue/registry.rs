//! ModuleRegistry - module identifier to notification handler mapping

use crate::notifications::api::NotificationHandler;
use crate::queue::error::{QueueError, QueueResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Lookup table from module identifier to the handler that receives its packets
///
/// Registration is a setup step: the registry is handed to a
/// [`ReceiveQueueListener`](crate::queue::api::ReceiveQueueListener) by value,
/// so once dispatch starts nothing can add or replace handlers.
#[derive(Default, Clone)]
pub struct ModuleRegistry {
    handlers: HashMap<String, Arc<dyn NotificationHandler>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for a module
    ///
    /// Fails with [`QueueError::DuplicateModule`] if a handler is already
    /// registered; the existing handler stays active.
    pub fn register(
        &mut self,
        module_id: impl Into<String>,
        handler: Arc<dyn NotificationHandler>,
    ) -> QueueResult<()> {
        let module_id = module_id.into();
        if self.handlers.contains_key(&module_id) {
            return Err(QueueError::DuplicateModule { module_id });
        }
        self.handlers.insert(module_id, handler);
        Ok(())
    }

    pub fn get_handler(&self, module_id: &str) -> QueueResult<Arc<dyn NotificationHandler>> {
        self.handlers
            .get(module_id)
            .cloned()
            .ok_or_else(|| QueueError::UnknownModule {
                module_id: module_id.to_string(),
            })
    }

    pub fn contains(&self, module_id: &str) -> bool {
        self.handlers.contains_key(module_id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn module_ids(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.module_ids().collect();
        ids.sort_unstable();
        f.debug_struct("ModuleRegistry")
            .field("modules", &ids)
            .finish()
    }
}
