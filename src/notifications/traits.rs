//! Traits for the notification system

use crate::notifications::event::NotificationEvent;

/// Error type a handler may return; it is logged and recorded, never propagated
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

pub type HandlerResult = Result<(), HandlerError>;

/// Sink that reacts to packets delivered for one module
///
/// The dispatch loop calls [`notify`](Self::notify) synchronously on its
/// worker thread, one packet at a time. There is no timeout around the call:
/// an implementation that blocks stalls delivery for every module, so
/// long-running work should be handed off to another thread.
pub trait NotificationHandler: Send + Sync {
    /// Handle one event carrying the packet's serialized payload
    fn notify(&self, event: NotificationEvent, data: &str) -> HandlerResult;
}

impl<F> NotificationHandler for F
where
    F: Fn(NotificationEvent, &str) -> HandlerResult + Send + Sync,
{
    fn notify(&self, event: NotificationEvent, data: &str) -> HandlerResult {
        self(event, data)
    }
}
