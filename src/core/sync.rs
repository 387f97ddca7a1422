//! Synchronization utilities for robust mutex handling
//!
//! Lock poisoning means a thread panicked while holding a lock. The queue
//! propagates that as an error instead of panicking a second time.

use std::sync::LockResult;

/// Convert a poisoned lock result into an application error
///
/// Works for anything wrapped in a [`LockResult`]: mutex guards as well as
/// the guard handed back by `Condvar::wait`.
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use packet_dispatch::core::sync::handle_mutex_poison;
/// use packet_dispatch::queue::api::QueueError;
///
/// let mutex = Mutex::new(42);
/// let guard = handle_mutex_poison(
///     mutex.lock(),
///     |message| QueueError::OperationFailed { message }
/// ).unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (mutex poisoned). This indicates a panic occurred while holding a lock. PoisonError: {:?}",
            poison_err
        ))
    })
}
