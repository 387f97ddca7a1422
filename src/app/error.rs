//! Application level error type
//!
//! Wraps the subsystem errors so the binary reports every failure through
//! [`log_error_with_context`](crate::core::error_handling::log_error_with_context).

use crate::app::cli::ConfigError;
use crate::core::error_handling::ContextualError;
use crate::network::api::CommunicatorError;
use crate::queue::api::QueueError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Communicator(#[from] CommunicatorError),
}

impl ContextualError for AppError {
    fn is_user_actionable(&self) -> bool {
        match self {
            AppError::Config(e) => e.is_user_actionable(),
            AppError::Queue(e) => e.is_user_actionable(),
            AppError::Communicator(e) => e.is_user_actionable(),
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Queue(e) => e.user_message(),
            AppError::Communicator(e) => e.user_message(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
