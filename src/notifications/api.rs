//! Public API for the notification system
//!
//! Handlers are the sinks the dispatch loop delivers packets to, one per
//! module. External modules should import from here rather than directly
//! from internal modules.

pub use crate::notifications::event::NotificationEvent;
pub use crate::notifications::traits::{HandlerError, HandlerResult, NotificationHandler};
