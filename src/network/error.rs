//! Communicator Error Types

use crate::core::error_handling::ContextualError;

#[derive(Debug, thiserror::Error)]
pub enum CommunicatorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Server already started on {address}")]
    AlreadyStarted { address: String },

    #[error("Client is not connected")]
    NotConnected,

    #[error("Malformed packet frame: {0}")]
    Frame(#[from] serde_json::Error),
}

impl ContextualError for CommunicatorError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            CommunicatorError::InvalidAddress { .. }
                | CommunicatorError::AlreadyStarted { .. }
                | CommunicatorError::NotConnected
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            CommunicatorError::InvalidAddress { .. } => {
                Some("Use a reachable host name and a port between 1 and 65535")
            }
            CommunicatorError::AlreadyStarted { .. } => {
                Some("Stop the server before starting it again")
            }
            CommunicatorError::NotConnected => Some("Start the client before sending packets"),
            _ => None,
        }
    }
}

/// Result type for communicator operations
pub type CommunicatorResult<T> = Result<T, CommunicatorError>;
