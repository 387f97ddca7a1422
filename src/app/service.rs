//! Running service for the `serve` command
//!
//! Wires a [`QueueManager`] with one handler per configured module, starts
//! the dispatch listener and exposes the queue's store through a TCP server.

use crate::app::cli::{Config, ModuleConfig};
use crate::app::error::{AppError, AppResult};
use crate::network::api::ServerCommunicator;
use crate::notifications::api::{HandlerResult, NotificationEvent, NotificationHandler};
use crate::queue::api::{QueueError, QueueManager, QueueStats, ReceiveQueueListener};
use std::sync::Arc;

/// Handler that writes every delivered payload to the log
pub struct LoggingHandler {
    module_id: String,
}

impl LoggingHandler {
    pub fn new(module_id: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
        }
    }
}

impl NotificationHandler for LoggingHandler {
    fn notify(&self, event: NotificationEvent, data: &str) -> HandlerResult {
        log::info!("[{}] {}: {}", self.module_id, event, data);
        Ok(())
    }
}

pub struct Service {
    manager: QueueManager,
    listener: Arc<ReceiveQueueListener>,
    server: ServerCommunicator,
    address: String,
}

impl Service {
    /// Start with a [`LoggingHandler`] for every configured module
    pub async fn start(config: &Config) -> AppResult<Self> {
        Self::start_with(config, |module| Arc::new(LoggingHandler::new(&module.id))).await
    }

    /// Start with handlers built by `handler_for`
    pub async fn start_with<F>(config: &Config, handler_for: F) -> AppResult<Self>
    where
        F: Fn(&ModuleConfig) -> Arc<dyn NotificationHandler>,
    {
        let manager = QueueManager::with_burst_per_pass(config.queue.burst_per_pass);
        for module in &config.modules {
            manager.register_module(module.id.clone(), module.priority, handler_for(module))?;
        }

        let listener = Arc::new(manager.create_listener()?);
        listener.start()?;

        let server = ServerCommunicator::new(config.server.host.clone())
            .with_port(config.server.port)
            .with_store(manager.store());
        let address = match server.start().await {
            Ok(address) => address,
            Err(e) => {
                stop_listener(Arc::clone(&listener)).await?;
                return Err(e.into());
            }
        };

        Ok(Self {
            manager,
            listener,
            server,
            address,
        })
    }

    /// Address the server is bound to, as `"ip:port"`
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn listener(&self) -> &ReceiveQueueListener {
        &self.listener
    }

    pub fn stats(&self) -> QueueStats {
        self.manager.stats()
    }

    /// Stop accepting clients, then stop dispatching
    ///
    /// Packets still queued at this point are reported and left undelivered.
    pub async fn shutdown(self) -> AppResult<()> {
        self.server.stop().await?;
        stop_listener(Arc::clone(&self.listener)).await?;

        let stats = self.manager.stats();
        log::info!(
            "Dispatched {} packets ({} handler failures); {} left queued",
            self.listener.dispatched_count(),
            self.listener.failure_count(),
            stats.total_packets
        );
        Ok(())
    }
}

// Joining the worker thread blocks, so keep it off the async executor
async fn stop_listener(listener: Arc<ReceiveQueueListener>) -> AppResult<()> {
    tokio::task::spawn_blocking(move || listener.stop())
        .await
        .map_err(|e| {
            AppError::Queue(QueueError::OperationFailed {
                message: format!("Listener shutdown task failed: {}", e),
            })
        })??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::api::ClientCommunicator;
    use crate::queue::api::Packet;
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn test_logging_handler_accepts_data() {
        let handler = LoggingHandler::new("whiteboard");
        assert!(handler
            .notify(NotificationEvent::OnDataReceived, "{\"x\":1}")
            .is_ok());
    }

    #[tokio::test]
    async fn test_service_delivers_received_packets() {
        let received: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        let service = Service::start_with(&Config::default(), move |module| {
            let sink = Arc::clone(&sink);
            let id = module.id.clone();
            Arc::new(move |_: NotificationEvent, data: &str| -> HandlerResult {
                sink.lock().unwrap().push((id.clone(), data.to_string()));
                Ok(())
            })
        })
        .await
        .unwrap();

        let (host, port) = service.address().rsplit_once(':').unwrap();
        let client = ClientCommunicator::new();
        client.start(host, port).await.unwrap();
        client.send(&Packet::new("file", "chunk-0")).await.unwrap();

        let listener_ref = Arc::clone(&service.listener);
        let delivered = tokio::task::spawn_blocking(move || {
            listener_ref.wait_for_dispatched(1, Duration::from_secs(2))
        })
        .await
        .unwrap();
        assert!(delivered);
        assert_eq!(
            received.lock().unwrap().as_slice(),
            &[("file".to_string(), "chunk-0".to_string())]
        );

        service.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_failure_stops_listener() {
        let blocker = ServerCommunicator::default();
        let address = blocker.start().await.unwrap();
        let port: u16 = address.rsplit_once(':').unwrap().1.parse().unwrap();

        let mut config = Config::default();
        config.server.port = port;

        let result = Service::start(&config).await;
        assert!(matches!(result, Err(AppError::Communicator(_))));

        blocker.stop().await.unwrap();
    }
}
