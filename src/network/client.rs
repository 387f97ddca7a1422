//! TCP client side of the communicator

use crate::network::error::{CommunicatorError, CommunicatorResult};
use crate::network::frame::encode_frame;
use crate::queue::api::Packet;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Status returned by [`ClientCommunicator::start`] once connected
pub const CONNECTED_STATUS: &str = "1";

/// Connecting end of a communicator pair
///
/// # Example
///
/// ```rust,no_run
/// use packet_dispatch::network::api::ClientCommunicator;
/// use packet_dispatch::queue::api::Packet;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ClientCommunicator::new();
/// let status = client.start("127.0.0.1", "7070").await?;
/// assert_eq!(status, "1");
/// client.send(&Packet::new("file", "{\"chunk\":0}")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ClientCommunicator {
    stream: Mutex<Option<TcpStream>>,
}

impl ClientCommunicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect to `host:port` and return [`CONNECTED_STATUS`]
    ///
    /// An existing connection is replaced.
    pub async fn start(&self, host: &str, port: &str) -> CommunicatorResult<String> {
        let port: u16 = port
            .trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| CommunicatorError::InvalidAddress {
                address: format!("{}:{}", host, port),
                reason: e.to_string(),
            })?;
        if host.trim().is_empty() {
            return Err(CommunicatorError::InvalidAddress {
                address: format!("{}:{}", host, port),
                reason: "host is empty".to_string(),
            });
        }

        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        log::info!("Connected to {}", stream.peer_addr()?);

        if self.stream.lock().await.replace(stream).is_some() {
            log::debug!("Replaced previous connection");
        }
        Ok(CONNECTED_STATUS.to_string())
    }

    /// Write one packet frame to the server
    pub async fn send(&self, packet: &Packet) -> CommunicatorResult<()> {
        let frame = encode_frame(packet)?;
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or(CommunicatorError::NotConnected)?;

        stream.write_all(frame.as_bytes()).await?;
        stream.flush().await?;
        log::debug!(
            "Sent {} bytes for module '{}'",
            frame.len(),
            packet.module_identifier()
        );
        Ok(())
    }

    /// Close the connection; no-op when not connected
    pub async fn stop(&self) -> CommunicatorResult<()> {
        if let Some(mut stream) = self.stream.lock().await.take() {
            stream.shutdown().await?;
            log::info!("Disconnected");
        }
        Ok(())
    }

    pub async fn is_connected(&self) -> bool {
        self.stream.lock().await.is_some()
    }
}
