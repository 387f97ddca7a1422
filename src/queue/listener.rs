//! ReceiveQueueListener - background dispatch loop
//!
//! The listener owns one worker thread that drains a [`PriorityQueueStore`]
//! and hands every packet to the handler registered for its module.
//!
//! ```text
//!  producers ──enqueue──▶ PriorityQueueStore ──dequeue──▶ worker thread
//!                                                            │
//!                                          ModuleRegistry ◀──┤ get_handler
//!                                                            ▼
//!                                       handler.notify(OnDataReceived, data)
//! ```
//!
//! Handler failures (errors and panics) are isolated: they are logged,
//! recorded, and the loop moves on to the next packet. Delivery is
//! at-most-once; a packet whose handler failed is not redelivered.

use crate::core::sync::handle_mutex_poison;
use crate::notifications::api::NotificationEvent;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::packet::Packet;
use crate::queue::registry::ModuleRegistry;
use crate::queue::store::PriorityQueueStore;
use crate::queue::types::{DispatchFailure, HandlerStatistics};
use chrono::Utc;
use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

/// Number of handler failures kept for inspection
pub const MAX_RECORDED_FAILURES: usize = 64;

const WORKER_THREAD_NAME: &str = "receive-queue-listener";

/// State shared between the listener handle and its worker thread
struct DispatchShared {
    registry: ModuleRegistry,
    statistics: Mutex<HashMap<String, HandlerStatistics>>,
    failures: Mutex<VecDeque<DispatchFailure>>,
    dispatched: Mutex<u64>,
    /// Signalled after every dispatch attempt
    progress: Condvar,
    total_failures: AtomicU64,
}

impl DispatchShared {
    fn dispatch(&self, packet: Packet) {
        let (module_id, data) = packet.into_parts();

        match self.invoke(&module_id, &data) {
            Ok(()) => {
                log::debug!("Delivered packet to '{}'", module_id);
                self.record_delivery(&module_id);
            }
            Err(error) => {
                log::warn!("Dispatch for '{}' failed: {}", module_id, error);
                self.record_failure(module_id, error);
            }
        }

        let mut dispatched = lock_recovering(&self.dispatched);
        *dispatched += 1;
        drop(dispatched);
        self.progress.notify_all();
    }

    fn invoke(&self, module_id: &str, data: &str) -> QueueResult<()> {
        let handler = self.registry.get_handler(module_id)?;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            handler.notify(NotificationEvent::OnDataReceived, data)
        }));

        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(QueueError::HandlerInvocation {
                module_id: module_id.to_string(),
                message: e.to_string(),
            }),
            Err(payload) => Err(QueueError::HandlerInvocation {
                module_id: module_id.to_string(),
                message: format!("handler panicked: {}", panic_message(payload.as_ref())),
            }),
        }
    }

    fn record_delivery(&self, module_id: &str) {
        let mut statistics = lock_recovering(&self.statistics);
        let entry = statistics.entry(module_id.to_string()).or_default();
        entry.delivered += 1;
        entry.last_delivery = Some(Utc::now());
    }

    fn record_failure(&self, module_id: String, error: QueueError) {
        let now = Utc::now();
        {
            let mut statistics = lock_recovering(&self.statistics);
            let entry = statistics.entry(module_id.clone()).or_default();
            entry.failed += 1;
            entry.last_failure = Some(now);
        }

        self.total_failures.fetch_add(1, Ordering::Relaxed);
        let mut failures = lock_recovering(&self.failures);
        if failures.len() == MAX_RECORDED_FAILURES {
            failures.pop_front();
        }
        failures.push_back(DispatchFailure {
            module_id,
            error,
            timestamp: now,
        });
    }
}

/// Bookkeeping never blocks dispatch, even after a panic elsewhere
fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Worker thread handle plus the stop flag belonging to that run
struct Worker {
    handle: JoinHandle<()>,
    stop: Arc<AtomicBool>,
}

impl Worker {
    fn is_current_thread(&self) -> bool {
        self.handle.thread().id() == thread::current().id()
    }
}

/// Lifecycle of the worker thread
///
/// `Stopping` covers the window in which a caller joins the worker without
/// holding the slot lock. Nobody may spawn a new worker during that window.
enum WorkerSlot {
    Idle,
    Running(Worker),
    Stopping(ThreadId),
}

impl WorkerSlot {
    /// Move a running worker out for joining, leaving `Stopping` behind
    fn begin_join(&mut self) -> Option<Worker> {
        match std::mem::replace(self, WorkerSlot::Idle) {
            WorkerSlot::Running(worker) => {
                *self = WorkerSlot::Stopping(worker.handle.thread().id());
                Some(worker)
            }
            other => {
                *self = other;
                None
            }
        }
    }
}

enum StartAction {
    Spawn,
    AlreadyRunning,
    ResumeCurrent,
    ReapPrevious,
    WaitForStop,
    StoppingSelf,
}

enum StopAction {
    Join,
    WaitForStop,
}

/// Controllable background loop delivering packets to module handlers
///
/// Created stopped. [`start`](Self::start) spawns the worker and closes
/// module registration on the store; [`stop`](Self::stop) blocks until the
/// worker has exited, waiting for at most the handler call in flight.
/// Packets still queued when the listener stops are kept for the next start.
///
/// # Example
///
/// ```rust,no_run
/// use packet_dispatch::notifications::api::{HandlerResult, NotificationEvent};
/// use packet_dispatch::queue::api::{ModuleRegistry, Packet, PriorityQueueStore, ReceiveQueueListener};
/// use std::sync::Arc;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(PriorityQueueStore::new());
/// store.register_module("whiteboard", 1)?;
///
/// let mut registry = ModuleRegistry::new();
/// registry.register(
///     "whiteboard",
///     Arc::new(|_: NotificationEvent, data: &str| -> HandlerResult {
///         println!("stroke: {}", data);
///         Ok(())
///     }),
/// )?;
///
/// let listener = ReceiveQueueListener::new(Arc::clone(&store), registry);
/// listener.start()?;
/// store.enqueue(Packet::new("whiteboard", "[1,2]"))?;
/// listener.stop()?;
/// # Ok(())
/// # }
/// ```
pub struct ReceiveQueueListener {
    store: Arc<PriorityQueueStore>,
    shared: Arc<DispatchShared>,
    worker: Mutex<WorkerSlot>,
    /// Signalled whenever a `Stopping` slot returns to `Idle`
    worker_changed: Condvar,
}

impl ReceiveQueueListener {
    pub fn new(store: Arc<PriorityQueueStore>, registry: ModuleRegistry) -> Self {
        for module_id in store.module_ids() {
            if !registry.contains(&module_id) {
                log::warn!(
                    "Module '{}' has no handler; its packets will be dropped",
                    module_id
                );
            }
        }

        Self {
            store,
            shared: Arc::new(DispatchShared {
                registry,
                statistics: Mutex::new(HashMap::new()),
                failures: Mutex::new(VecDeque::new()),
                dispatched: Mutex::new(0),
                progress: Condvar::new(),
                total_failures: AtomicU64::new(0),
            }),
            worker: Mutex::new(WorkerSlot::Idle),
            worker_changed: Condvar::new(),
        }
    }

    fn lock_worker(&self) -> QueueResult<MutexGuard<'_, WorkerSlot>> {
        handle_mutex_poison(self.worker.lock(), |message| QueueError::OperationFailed {
            message,
        })
    }

    fn wait_worker_changed<'a>(
        &self,
        slot: MutexGuard<'a, WorkerSlot>,
    ) -> QueueResult<MutexGuard<'a, WorkerSlot>> {
        handle_mutex_poison(self.worker_changed.wait(slot), |message| {
            QueueError::OperationFailed { message }
        })
    }

    /// Join a worker taken out by [`WorkerSlot::begin_join`] with the slot unlocked
    ///
    /// The slot returns to `Idle` even when the worker panicked.
    fn finish_join(&self, worker: Worker) -> QueueResult<MutexGuard<'_, WorkerSlot>> {
        let joined = join_worker(worker.handle);
        let mut slot = self.lock_worker()?;
        *slot = WorkerSlot::Idle;
        self.worker_changed.notify_all();
        joined.map(|()| slot)
    }

    /// Start the dispatch loop; a no-op when already running
    ///
    /// If another thread is in the middle of [`stop`](Self::stop), this waits
    /// for that worker to exit first, so at most one worker ever runs.
    pub fn start(&self) -> QueueResult<()> {
        let mut slot = self.lock_worker()?;

        loop {
            let action = match &*slot {
                WorkerSlot::Idle => StartAction::Spawn,
                WorkerSlot::Running(worker) if !worker.stop.load(Ordering::Acquire) => {
                    StartAction::AlreadyRunning
                }
                WorkerSlot::Running(worker) if worker.is_current_thread() => {
                    StartAction::ResumeCurrent
                }
                WorkerSlot::Running(_) => StartAction::ReapPrevious,
                WorkerSlot::Stopping(id) if *id == thread::current().id() => {
                    StartAction::StoppingSelf
                }
                WorkerSlot::Stopping(_) => StartAction::WaitForStop,
            };

            match action {
                StartAction::Spawn => break,
                StartAction::AlreadyRunning => {
                    log::debug!("Listener already running");
                    return Ok(());
                }
                StartAction::ResumeCurrent => {
                    // Stop and restart from the same handler: keep the current run going
                    if let WorkerSlot::Running(worker) = &*slot {
                        worker.stop.store(false, Ordering::Release);
                    }
                    return Ok(());
                }
                StartAction::ReapPrevious => {
                    // Stopped from inside a handler; that handler may still call in
                    let Some(previous) = slot.begin_join() else {
                        continue;
                    };
                    drop(slot);
                    slot = self.finish_join(previous)?;
                }
                StartAction::WaitForStop => slot = self.wait_worker_changed(slot)?,
                StartAction::StoppingSelf => {
                    return Err(QueueError::OperationFailed {
                        message: "Cannot restart the listener from a handler while stop() is waiting for it"
                            .to_string(),
                    });
                }
            }
        }

        self.store.close_registration();

        let stop = Arc::new(AtomicBool::new(false));
        let store = Arc::clone(&self.store);
        let shared = Arc::clone(&self.shared);
        let worker_stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_dispatch_loop(store, shared, worker_stop))
            .map_err(|e| QueueError::OperationFailed {
                message: format!("Failed to spawn listener thread: {}", e),
            })?;

        *slot = WorkerSlot::Running(Worker { handle, stop });
        log::info!("Receive queue listener started");
        Ok(())
    }

    /// Stop the dispatch loop; a no-op when already stopped
    ///
    /// Blocks until the worker thread has exited, so no handler runs after
    /// this returns. When called from inside a handler the worker cannot be
    /// joined from itself: the stop is signalled, this returns immediately,
    /// and the worker exits once the current handler returns.
    pub fn stop(&self) -> QueueResult<()> {
        let mut slot = self.lock_worker()?;

        loop {
            let action = match &*slot {
                WorkerSlot::Idle => return Ok(()),
                WorkerSlot::Running(worker) if worker.is_current_thread() => {
                    worker.stop.store(true, Ordering::Release);
                    self.store.wake_all();
                    log::debug!("Listener stop requested from its own handler");
                    return Ok(());
                }
                WorkerSlot::Running(_) => StopAction::Join,
                // Another thread is already joining this handler's worker
                WorkerSlot::Stopping(id) if *id == thread::current().id() => return Ok(()),
                WorkerSlot::Stopping(_) => StopAction::WaitForStop,
            };

            match action {
                StopAction::Join => {
                    let Some(worker) = slot.begin_join() else {
                        continue;
                    };
                    worker.stop.store(true, Ordering::Release);
                    self.store.wake_all();
                    drop(slot);

                    // Joined outside the lock so a handler calling into the listener cannot deadlock
                    drop(self.finish_join(worker)?);
                    log::info!("Receive queue listener stopped");
                    return Ok(());
                }
                StopAction::WaitForStop => slot = self.wait_worker_changed(slot)?,
            }
        }
    }

    pub fn is_running(&self) -> bool {
        match self.worker.lock() {
            Ok(slot) => matches!(
                &*slot,
                WorkerSlot::Running(worker) if !worker.stop.load(Ordering::Acquire)
            ),
            Err(_) => false,
        }
    }

    pub fn store(&self) -> &Arc<PriorityQueueStore> {
        &self.store
    }

    /// Packets taken off the queue so far, delivered or not
    pub fn dispatched_count(&self) -> u64 {
        *lock_recovering(&self.shared.dispatched)
    }

    /// Handler failures since creation, including those no longer retained
    pub fn failure_count(&self) -> u64 {
        self.shared.total_failures.load(Ordering::Relaxed)
    }

    /// Most recent failures, oldest first
    pub fn recent_failures(&self) -> Vec<DispatchFailure> {
        lock_recovering(&self.shared.failures)
            .iter()
            .cloned()
            .collect()
    }

    pub fn statistics(&self, module_id: &str) -> Option<HandlerStatistics> {
        lock_recovering(&self.shared.statistics)
            .get(module_id)
            .cloned()
    }

    /// Block until at least `count` packets have been dispatched or `timeout` expires
    ///
    /// Returns whether the count was reached.
    pub fn wait_for_dispatched(&self, count: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut dispatched = lock_recovering(&self.shared.dispatched);

        while *dispatched < count {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            dispatched = match self.shared.progress.wait_timeout(dispatched, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }
}

impl Drop for ReceiveQueueListener {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Failed to stop listener on drop: {}", e);
        }
    }
}

fn join_worker(handle: JoinHandle<()>) -> QueueResult<()> {
    handle.join().map_err(|payload| QueueError::OperationFailed {
        message: format!(
            "Listener thread panicked: {}",
            panic_message(payload.as_ref())
        ),
    })
}

fn run_dispatch_loop(
    store: Arc<PriorityQueueStore>,
    shared: Arc<DispatchShared>,
    stop: Arc<AtomicBool>,
) {
    log::debug!("Dispatch loop entered");
    loop {
        match store.dequeue_until(&stop) {
            Ok(Some(packet)) => shared.dispatch(packet),
            Ok(None) => break,
            Err(e) => {
                log::error!("Dispatch loop aborted: {}", e);
                stop.store(true, Ordering::Release);
                break;
            }
        }
    }
    log::debug!("Dispatch loop exited");
}
