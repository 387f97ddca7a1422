//! Shared helpers for integration tests

use packet_dispatch::notifications::api::{HandlerResult, NotificationEvent, NotificationHandler};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Delivery order across every module, as `(module_id, data)`
pub type DeliveryLog = Arc<Mutex<Vec<(String, String)>>>;

/// Handler that appends each delivery to a log shared between modules
pub struct RecordingHandler {
    module_id: String,
    log: DeliveryLog,
}

impl RecordingHandler {
    pub fn new(module_id: &str, log: &DeliveryLog) -> Arc<Self> {
        Arc::new(Self {
            module_id: module_id.to_string(),
            log: Arc::clone(log),
        })
    }
}

impl NotificationHandler for RecordingHandler {
    fn notify(&self, event: NotificationEvent, data: &str) -> HandlerResult {
        assert_eq!(event, NotificationEvent::OnDataReceived);
        self.log
            .lock()
            .unwrap()
            .push((self.module_id.clone(), data.to_string()));
        Ok(())
    }
}

pub fn new_log() -> DeliveryLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn modules_in(log: &DeliveryLog) -> Vec<String> {
    log.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
}

/// Split `"ip:port"` into host and port strings
pub fn split_address(address: &str) -> (String, String) {
    let (host, port) = address.rsplit_once(':').expect("address has a port");
    (host.to_string(), port.to_string())
}

/// Poll `condition` every 10ms until it holds or `timeout` expires
pub async fn eventually<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
