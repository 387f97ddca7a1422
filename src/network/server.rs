//! TCP server side of the communicator
//!
//! The server binds a listener, reports the bound address and accepts any
//! number of clients. When built with a store, every frame a client sends is
//! decoded and enqueued for the dispatch loop.

use crate::network::error::{CommunicatorError, CommunicatorResult};
use crate::network::frame::decode_frame;
use crate::queue::api::PriorityQueueStore;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};
use tokio::task::{JoinHandle, JoinSet};

pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Longest accepted frame, excluding the newline; longer frames close the connection
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Pause after a failed accept, e.g. when the process is out of descriptors
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

struct RunningServer {
    address: String,
    shutdown_tx: broadcast::Sender<()>,
    accept_task: JoinHandle<()>,
}

/// Listening end of a communicator pair
///
/// # Example
///
/// ```rust,no_run
/// use packet_dispatch::network::api::ServerCommunicator;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let server = ServerCommunicator::new("127.0.0.1");
/// let address = server.start().await?;
/// println!("listening on {}", address);
/// server.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct ServerCommunicator {
    host: String,
    port: u16,
    store: Option<Arc<PriorityQueueStore>>,
    state: Mutex<Option<RunningServer>>,
    connected: Arc<AtomicUsize>,
}

impl Default for ServerCommunicator {
    fn default() -> Self {
        Self::new(DEFAULT_HOST)
    }
}

impl ServerCommunicator {
    /// Server on `host` with an ephemeral port
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 0,
            store: None,
            state: Mutex::new(None),
            connected: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Listen on a fixed port instead of an ephemeral one
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enqueue packets received from clients into `store`
    pub fn with_store(mut self, store: Arc<PriorityQueueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Bind and start accepting clients
    ///
    /// Returns the bound address as `"ip:port"`.
    pub async fn start(&self) -> CommunicatorResult<String> {
        let mut state = self.state.lock().await;
        if let Some(running) = state.as_ref() {
            return Err(CommunicatorError::AlreadyStarted {
                address: running.address.clone(),
            });
        }

        let listener = TcpListener::bind((self.host.as_str(), self.port))
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::InvalidInput => CommunicatorError::InvalidAddress {
                    address: format!("{}:{}", self.host, self.port),
                    reason: e.to_string(),
                },
                _ => CommunicatorError::Io(e),
            })?;
        let local = listener.local_addr()?;
        let address = format!("{}:{}", local.ip(), local.port());

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let accept_task = tokio::spawn(accept_loop(
            listener,
            shutdown_rx,
            self.store.clone(),
            Arc::clone(&self.connected),
        ));

        log::info!("Server listening on {}", address);
        *state = Some(RunningServer {
            address: address.clone(),
            shutdown_tx,
            accept_task,
        });
        Ok(address)
    }

    /// Stop accepting and close every client connection
    ///
    /// No-op when the server is not running.
    pub async fn stop(&self) -> CommunicatorResult<()> {
        let Some(running) = self.state.lock().await.take() else {
            return Ok(());
        };

        let _ = running.shutdown_tx.send(());
        if let Err(e) = running.accept_task.await {
            log::warn!("Accept loop for {} ended abnormally: {}", running.address, e);
        }
        log::info!("Server on {} stopped", running.address);
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Bound `"ip:port"` while running
    pub async fn address(&self) -> Option<String> {
        self.state
            .lock()
            .await
            .as_ref()
            .map(|running| running.address.clone())
    }

    /// Number of currently open client connections
    pub fn connected_clients(&self) -> usize {
        self.connected.load(Ordering::Acquire)
    }
}

impl Drop for ServerCommunicator {
    fn drop(&mut self) {
        if let Some(running) = self.state.get_mut().take() {
            let _ = running.shutdown_tx.send(());
            running.accept_task.abort();
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    mut shutdown_rx: broadcast::Receiver<()>,
    store: Option<Arc<PriorityQueueStore>>,
    connected: Arc<AtomicUsize>,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    log::info!("Client connected from {}", peer);
                    let guard = ConnectionGuard::new(Arc::clone(&connected));
                    connections.spawn(read_frames(stream, peer, store.clone(), guard));
                }
                Err(e) => {
                    log::warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            },
        }
    }

    // Dropped guards bring the connection count back to zero
    connections.shutdown().await;
}

/// Counts a live connection for as long as it is held
struct ConnectionGuard(Arc<AtomicUsize>);

impl ConnectionGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

async fn read_frames(
    stream: TcpStream,
    peer: SocketAddr,
    store: Option<Arc<PriorityQueueStore>>,
    _guard: ConnectionGuard,
) {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    loop {
        line.clear();
        let limit = MAX_FRAME_BYTES as u64 + 1;
        match (&mut reader).take(limit).read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) if !line.ends_with('\n') && line.len() > MAX_FRAME_BYTES => {
                log::warn!(
                    "Frame from {} exceeds {} bytes; closing connection",
                    peer,
                    MAX_FRAME_BYTES
                );
                break;
            }
            Ok(_) => {
                let frame = line.trim_end_matches(['\n', '\r']);
                if frame.trim().is_empty() {
                    continue;
                }
                enqueue_frame(frame, peer, store.as_deref());
            }
            Err(e) => {
                log::warn!("Connection from {} failed: {}", peer, e);
                break;
            }
        }
    }

    log::info!("Client {} disconnected", peer);
}

fn enqueue_frame(line: &str, peer: SocketAddr, store: Option<&PriorityQueueStore>) {
    let packet = match decode_frame(line) {
        Ok(packet) => packet,
        Err(e) => {
            log::warn!("Skipping frame from {}: {}", peer, e);
            return;
        }
    };

    let Some(store) = store else {
        log::debug!(
            "No queue attached; dropping packet for '{}' from {}",
            packet.module_identifier(),
            peer
        );
        return;
    };

    if let Err(e) = store.enqueue(packet) {
        log::warn!("Skipping packet from {}: {}", peer, e);
    }
}
