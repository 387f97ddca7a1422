//! Shutdown coordination for the long-running `serve` command
//!
//! Process signals and programmatic requests feed one broadcast channel that
//! wakes the `serve` main task. That task then stops the server, whose own
//! channel closes the accept loop and every connection reader.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Exit code used when a second signal arrives during shutdown
const FORCED_EXIT_CODE: i32 = 130;

/// Fan-out of a single shutdown request
#[derive(Clone)]
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
    shutdown_requested: Arc<AtomicBool>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(8);
        Self {
            shutdown_tx,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Resolve once shutdown has been requested
    ///
    /// Returns immediately if the request happened before the call.
    pub async fn wait(&self) {
        let mut rx = self.subscribe();
        if self.is_shutdown_requested() {
            return;
        }
        // Lagged and Closed both mean the request can no longer be missed
        let _ = rx.recv().await;
    }

    /// Route SIGINT, SIGTERM, SIGHUP and SIGQUIT into this coordinator
    ///
    /// The first signal requests a graceful shutdown; a second one exits
    /// the process. Must be called from within a tokio runtime.
    pub fn install_signal_handlers(&self) {
        #[cfg(unix)]
        {
            unsafe {
                libc::signal(libc::SIGPIPE, libc::SIG_DFL);
            }

            use tokio::signal::unix::{signal, SignalKind};
            let signal_count = Arc::new(AtomicUsize::new(0));
            let signals = [
                SignalKind::interrupt(),
                SignalKind::terminate(),
                SignalKind::hangup(),
                SignalKind::quit(),
            ];

            for kind in signals {
                let coordinator = self.clone();
                let counter = Arc::clone(&signal_count);
                tokio::spawn(async move {
                    let Ok(mut sig) = signal(kind) else {
                        log::warn!("Could not install handler for {:?}", kind);
                        return;
                    };
                    while sig.recv().await.is_some() {
                        coordinator.on_signal(&counter);
                    }
                });
            }
        }

        #[cfg(not(unix))]
        {
            let coordinator = self.clone();
            let counter = Arc::new(AtomicUsize::new(0));
            tokio::spawn(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    coordinator.on_signal(&counter);
                }
            });
        }
    }

    fn on_signal(&self, counter: &AtomicUsize) {
        let previous = counter.fetch_add(1, Ordering::AcqRel);
        if previous >= 1 {
            log::warn!("Second signal received; exiting");
            std::process::exit(FORCED_EXIT_CODE);
        }
        log::info!("Signal received; shutting down");
        self.trigger_shutdown();
    }
}
