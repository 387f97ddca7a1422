//! Event types delivered to notification handlers

use strum_macros::{Display, EnumString};

/// Events a module's handler can be notified of
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[non_exhaustive]
pub enum NotificationEvent {
    /// A packet addressed to the module was dequeued
    OnDataReceived,
}
