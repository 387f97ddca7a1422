//! Recording notification handler shared by the queue tests

use crate::notifications::api::{HandlerResult, NotificationEvent, NotificationHandler};
use std::sync::{Arc, Mutex};

/// Dispatch order across all handlers sharing the log: `(module, data)`
pub type OrderLog = Arc<Mutex<Vec<(String, String)>>>;

pub fn order_log() -> OrderLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Handler that remembers everything it was notified of
pub struct FakeNotificationHandler {
    module_id: String,
    received: Mutex<Vec<(NotificationEvent, String)>>,
    order: Option<OrderLog>,
    /// 1-based invocation numbers that return an error
    fail_on: Vec<usize>,
    panic_on: Vec<usize>,
}

impl FakeNotificationHandler {
    pub fn new(module_id: &str) -> Arc<Self> {
        Arc::new(Self::build(module_id, None, Vec::new(), Vec::new()))
    }

    pub fn with_order_log(module_id: &str, order: &OrderLog) -> Arc<Self> {
        Arc::new(Self::build(
            module_id,
            Some(Arc::clone(order)),
            Vec::new(),
            Vec::new(),
        ))
    }

    pub fn failing_on(module_id: &str, order: &OrderLog, fail_on: Vec<usize>) -> Arc<Self> {
        Arc::new(Self::build(
            module_id,
            Some(Arc::clone(order)),
            fail_on,
            Vec::new(),
        ))
    }

    pub fn panicking_on(module_id: &str, order: &OrderLog, panic_on: Vec<usize>) -> Arc<Self> {
        Arc::new(Self::build(
            module_id,
            Some(Arc::clone(order)),
            Vec::new(),
            panic_on,
        ))
    }

    fn build(
        module_id: &str,
        order: Option<OrderLog>,
        fail_on: Vec<usize>,
        panic_on: Vec<usize>,
    ) -> Self {
        Self {
            module_id: module_id.to_string(),
            received: Mutex::new(Vec::new()),
            order,
            fail_on,
            panic_on,
        }
    }

    pub fn received(&self) -> Vec<(NotificationEvent, String)> {
        self.received.lock().unwrap().clone()
    }

    pub fn received_data(&self) -> Vec<String> {
        self.received()
            .into_iter()
            .map(|(_, data)| data)
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

impl NotificationHandler for FakeNotificationHandler {
    fn notify(&self, event: NotificationEvent, data: &str) -> HandlerResult {
        let call = {
            let mut received = self.received.lock().unwrap();
            received.push((event, data.to_string()));
            received.len()
        };
        if let Some(order) = &self.order {
            order
                .lock()
                .unwrap()
                .push((self.module_id.clone(), data.to_string()));
        }

        if self.panic_on.contains(&call) {
            panic!("{} handler exploded on call {}", self.module_id, call);
        }
        if self.fail_on.contains(&call) {
            return Err(format!("{} handler rejected call {}", self.module_id, call).into());
        }
        Ok(())
    }
}
