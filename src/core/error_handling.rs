//! Generic error handling utilities
//!
//! Errors from every subsystem are reported through one function so the
//! binary prints caller mistakes verbatim and keeps system failures terse,
//! with full detail at debug level.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` should return
/// `Some(message)` with a helpful, actionable message. When it returns
/// `false`, `user_message()` should return `None`.
pub trait ContextualError: std::error::Error {
    /// True for caller mistakes with a clear fix, such as registering a
    /// module twice or an invalid configuration value. False for IO
    /// failures, lost connections and lock poisoning.
    fn is_user_actionable(&self) -> bool;

    /// The message to show when this is a user-actionable error
    fn user_message(&self) -> Option<&str>;
}

/// Log errors with appropriate detail level based on error specificity
///
/// # Examples
/// ```rust,no_run
/// # use packet_dispatch::core::error_handling::log_error_with_context;
/// # use packet_dispatch::queue::api::QueueError;
/// let err = QueueError::UnknownModule { module_id: "chat".to_string() };
/// log_error_with_context(&err, "Sending packet");
/// // Logs: "FATAL: Packets can only be sent to registered modules"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message().filter(|_| error.is_user_actionable()) {
        Some(user_msg) => log::error!("FATAL: {} ({})", user_msg, error),
        None => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
