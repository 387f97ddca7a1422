//! Queue Error Types

use crate::core::error_handling::ContextualError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueueError {
    #[error("Module already registered: {module_id}")]
    DuplicateModule { module_id: String },

    #[error("Module not registered: {module_id}")]
    UnknownModule { module_id: String },

    #[error("Handler for module '{module_id}' failed: {message}")]
    HandlerInvocation { module_id: String, message: String },

    #[error("Cannot register module '{module_id}': dispatch has already started")]
    RegistrationClosed { module_id: String },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },
}

impl QueueError {
    /// Module identifier the error refers to, if any
    pub fn module_id(&self) -> Option<&str> {
        match self {
            QueueError::DuplicateModule { module_id }
            | QueueError::UnknownModule { module_id }
            | QueueError::HandlerInvocation { module_id, .. }
            | QueueError::RegistrationClosed { module_id } => Some(module_id),
            QueueError::OperationFailed { .. } => None,
        }
    }
}

impl ContextualError for QueueError {
    fn is_user_actionable(&self) -> bool {
        // Registration mistakes are caller errors with a clear fix
        matches!(
            self,
            QueueError::DuplicateModule { .. }
                | QueueError::UnknownModule { .. }
                | QueueError::RegistrationClosed { .. }
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            QueueError::DuplicateModule { .. } => {
                Some("A module with this identifier is already registered")
            }
            QueueError::UnknownModule { .. } => {
                Some("Packets can only be sent to registered modules")
            }
            QueueError::RegistrationClosed { .. } => {
                Some("Modules must be registered before the listener is started")
            }
            _ => None,
        }
    }
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
