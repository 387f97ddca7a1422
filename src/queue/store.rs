//! PriorityQueueStore implementation with per-module FIFO queues
//!
//! This module provides the core queue functionality with:
//! - One FIFO sub-queue per registered module
//! - Priority-ordered selection across modules (lower value is more urgent)
//! - A bounded-burst scheduling pass so busy modules cannot starve others
//! - Blocking dequeue driven by a condition variable

use crate::core::sync::handle_mutex_poison;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::packet::Packet;
use crate::queue::types::{ModuleQueueStats, QueueStats};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};

/// Packets a module may hand out per scheduling pass unless configured otherwise
pub const DEFAULT_BURST_PER_PASS: usize = 1;

/// Internal per-module queue entry
#[derive(Debug)]
struct ModuleEntry {
    module_id: String,
    priority: i32,
    packets: VecDeque<Packet>,
    /// Packets handed out during the current scheduling pass
    served_in_pass: usize,
    enqueued_total: u64,
    dequeued_total: u64,
}

/// Everything guarded by the store lock
#[derive(Debug)]
struct StoreState {
    /// Kept sorted by priority, ties in registration order
    modules: Vec<ModuleEntry>,
    /// Module identifier -> index into `modules`
    index: HashMap<String, usize>,
    total_packets: usize,
    registration_closed: bool,
    passes: u64,
}

impl StoreState {
    fn start_new_pass(&mut self) {
        for entry in &mut self.modules {
            entry.served_in_pass = 0;
        }
        self.passes += 1;
    }

    /// Remove the next packet according to the scheduling policy
    fn take_next(&mut self, burst_per_pass: usize) -> Option<Packet> {
        if self.total_packets == 0 {
            return None;
        }

        let eligible = |entry: &ModuleEntry| {
            !entry.packets.is_empty() && entry.served_in_pass < burst_per_pass
        };

        let selected = match self.modules.iter().position(eligible) {
            Some(position) => position,
            None => {
                // Every non-empty module used its budget, rescan from the top
                self.start_new_pass();
                self.modules.iter().position(eligible)?
            }
        };

        let entry = &mut self.modules[selected];
        let packet = entry.packets.pop_front()?;
        entry.served_in_pass += 1;
        entry.dequeued_total += 1;
        self.total_packets -= 1;

        if self.total_packets == 0 {
            // Drained: the next burst of traffic starts from strict priority order
            self.start_new_pass();
        }

        Some(packet)
    }
}

/// Thread-safe store holding one FIFO queue per registered module
///
/// Modules are registered with a priority; the store always hands out the
/// head packet of the most urgent non-empty module that still has budget in
/// the current scheduling pass. Within one pass each module is serviced at
/// most `burst_per_pass` times, so a module that is continuously refilled
/// cannot keep lower-priority modules waiting for longer than one pass.
///
/// # Thread Safety
///
/// All state lives behind a single mutex, so enqueue, dequeue and the
/// priority scan always observe a consistent snapshot. Producers may call
/// [`enqueue`](Self::enqueue) from any thread while a consumer blocks in
/// [`dequeue`](Self::dequeue).
///
/// # Example
///
/// ```rust
/// use packet_dispatch::queue::api::{Packet, PriorityQueueStore};
///
/// let store = PriorityQueueStore::new();
/// store.register_module("whiteboard", 1).unwrap();
/// store.register_module("file", 3).unwrap();
///
/// store.enqueue(Packet::new("file", "f1")).unwrap();
/// store.enqueue(Packet::new("whiteboard", "w1")).unwrap();
///
/// assert_eq!(store.dequeue().unwrap().serialized_data(), "w1");
/// assert_eq!(store.dequeue().unwrap().serialized_data(), "f1");
/// assert!(store.is_empty());
/// ```
#[derive(Debug)]
pub struct PriorityQueueStore {
    state: Mutex<StoreState>,
    /// Signalled whenever a packet is added or waiters must re-check their stop flag
    available: Condvar,
    burst_per_pass: usize,
}

impl Default for PriorityQueueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityQueueStore {
    pub fn new() -> Self {
        Self::with_burst_per_pass(DEFAULT_BURST_PER_PASS)
    }

    /// Create a store that drains up to `burst_per_pass` packets from one
    /// module before moving to the next non-empty module. Zero is treated as one.
    pub fn with_burst_per_pass(burst_per_pass: usize) -> Self {
        Self {
            state: Mutex::new(StoreState {
                modules: Vec::new(),
                index: HashMap::new(),
                total_packets: 0,
                registration_closed: false,
                passes: 1,
            }),
            available: Condvar::new(),
            burst_per_pass: burst_per_pass.max(1),
        }
    }

    pub fn burst_per_pass(&self) -> usize {
        self.burst_per_pass
    }

    fn lock(&self) -> QueueResult<MutexGuard<'_, StoreState>> {
        handle_mutex_poison(self.state.lock(), |message| QueueError::OperationFailed {
            message,
        })
    }

    /// Lock for read-only diagnostics; a poisoned lock still yields the data
    fn snapshot(&self) -> MutexGuard<'_, StoreState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a module with an empty queue
    ///
    /// Fails with [`QueueError::DuplicateModule`] if the identifier is taken
    /// and with [`QueueError::RegistrationClosed`] once a listener has
    /// started consuming from this store.
    pub fn register_module(&self, module_id: impl Into<String>, priority: i32) -> QueueResult<()> {
        let module_id = module_id.into();
        let mut state = self.lock()?;

        if state.registration_closed {
            return Err(QueueError::RegistrationClosed { module_id });
        }
        if state.index.contains_key(&module_id) {
            return Err(QueueError::DuplicateModule { module_id });
        }

        // Insert after every module of equal or higher urgency
        let position = state.modules.partition_point(|m| m.priority <= priority);
        state.modules.insert(
            position,
            ModuleEntry {
                module_id: module_id.clone(),
                priority,
                packets: VecDeque::new(),
                served_in_pass: 0,
                enqueued_total: 0,
                dequeued_total: 0,
            },
        );

        let StoreState { modules, index, .. } = &mut *state;
        index.clear();
        for (i, entry) in modules.iter().enumerate() {
            index.insert(entry.module_id.clone(), i);
        }

        log::debug!("Registered module '{}' with priority {}", module_id, priority);
        Ok(())
    }

    /// Append a packet to the tail of its module's queue
    pub fn enqueue(&self, packet: Packet) -> QueueResult<()> {
        let mut state = self.lock()?;

        let position = match state.index.get(packet.module_identifier()) {
            Some(&position) => position,
            None => {
                return Err(QueueError::UnknownModule {
                    module_id: packet.module_identifier().to_string(),
                })
            }
        };

        let entry = &mut state.modules[position];
        log::trace!(
            "Enqueue for '{}' ({} bytes)",
            entry.module_id,
            packet.serialized_data().len()
        );
        entry.packets.push_back(packet);
        entry.enqueued_total += 1;
        state.total_packets += 1;
        drop(state);

        // Waiters may include a stopping listener that will not take the packet
        self.available.notify_all();
        Ok(())
    }

    /// Block until a packet is available, then remove and return it
    pub fn dequeue(&self) -> QueueResult<Packet> {
        let mut state = self.lock()?;
        loop {
            if let Some(packet) = state.take_next(self.burst_per_pass) {
                return Ok(packet);
            }
            state = handle_mutex_poison(self.available.wait(state), |message| {
                QueueError::OperationFailed { message }
            })?;
        }
    }

    /// Remove and return the next packet without blocking
    pub fn try_dequeue(&self) -> QueueResult<Option<Packet>> {
        let mut state = self.lock()?;
        Ok(state.take_next(self.burst_per_pass))
    }

    /// Blocking dequeue that gives up once `stop` is set
    ///
    /// The flag is checked under the store lock, and [`wake_all`](Self::wake_all)
    /// takes the same lock before notifying, so a stop request cannot slip in
    /// between the check and the wait.
    pub(crate) fn dequeue_until(&self, stop: &AtomicBool) -> QueueResult<Option<Packet>> {
        let mut state = self.lock()?;
        loop {
            if stop.load(Ordering::Acquire) {
                return Ok(None);
            }
            if let Some(packet) = state.take_next(self.burst_per_pass) {
                return Ok(Some(packet));
            }
            state = handle_mutex_poison(self.available.wait(state), |message| {
                QueueError::OperationFailed { message }
            })?;
        }
    }

    /// Wake every thread blocked in a dequeue so it re-checks its stop flag
    pub(crate) fn wake_all(&self) {
        let _state = self.snapshot();
        self.available.notify_all();
    }

    /// Reject any further module registration
    pub(crate) fn close_registration(&self) {
        let mut state = self.snapshot();
        if !state.registration_closed {
            state.registration_closed = true;
            log::debug!(
                "Module registration closed with {} modules",
                state.modules.len()
            );
        }
    }

    pub fn is_registration_closed(&self) -> bool {
        self.snapshot().registration_closed
    }

    /// True when every module queue is empty
    ///
    /// Diagnostic only: the answer may be stale by the time it is used.
    pub fn is_empty(&self) -> bool {
        self.snapshot().total_packets == 0
    }

    /// Total packets waiting across all modules
    pub fn len(&self) -> usize {
        self.snapshot().total_packets
    }

    pub fn is_registered(&self, module_id: &str) -> bool {
        self.snapshot().index.contains_key(module_id)
    }

    pub fn priority_of(&self, module_id: &str) -> Option<i32> {
        let state = self.snapshot();
        state
            .index
            .get(module_id)
            .map(|&position| state.modules[position].priority)
    }

    /// Registered module identifiers in scheduling order
    pub fn module_ids(&self) -> Vec<String> {
        self.snapshot()
            .modules
            .iter()
            .map(|entry| entry.module_id.clone())
            .collect()
    }

    /// Packets waiting for a single module
    pub fn queued_for(&self, module_id: &str) -> QueueResult<usize> {
        let state = self.lock()?;
        state
            .index
            .get(module_id)
            .map(|&position| state.modules[position].packets.len())
            .ok_or_else(|| QueueError::UnknownModule {
                module_id: module_id.to_string(),
            })
    }

    pub fn stats(&self) -> QueueStats {
        let state = self.snapshot();
        QueueStats {
            total_packets: state.total_packets,
            passes: state.passes,
            per_module: state
                .modules
                .iter()
                .map(|entry| ModuleQueueStats {
                    module_id: entry.module_id.clone(),
                    priority: entry.priority,
                    queued: entry.packets.len(),
                    enqueued_total: entry.enqueued_total,
                    dequeued_total: entry.dequeued_total,
                })
                .collect(),
        }
    }
}
