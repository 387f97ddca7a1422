//! Type definitions for the queue system
//!
//! Statistics snapshots returned by the store and the dispatch loop.

use chrono::{DateTime, Utc};

/// Per-module snapshot of the priority queue store
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleQueueStats {
    /// Module identifier
    pub module_id: String,
    /// Scheduling priority (lower value is more urgent)
    pub priority: i32,
    /// Packets currently waiting in this module's queue
    pub queued: usize,
    /// Packets ever accepted for this module
    pub enqueued_total: u64,
    /// Packets ever removed from this module's queue
    pub dequeued_total: u64,
}

/// Snapshot of the whole store, modules listed in scheduling order
#[derive(Debug, Clone, PartialEq)]
pub struct QueueStats {
    /// Total packets waiting across all modules
    pub total_packets: usize,
    /// Scheduling passes started since creation
    pub passes: u64,
    pub per_module: Vec<ModuleQueueStats>,
}

/// Delivery statistics for one module's handler
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerStatistics {
    /// Successful handler invocations
    pub delivered: u64,
    /// Invocations that returned an error or panicked
    pub failed: u64,
    pub last_delivery: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
}

/// A handler failure recorded by the dispatch loop
#[derive(Debug, Clone)]
pub struct DispatchFailure {
    pub module_id: String,
    pub error: crate::queue::QueueError,
    pub timestamp: DateTime<Utc>,
}
