//! Edge case and error condition tests for the queue system

#[cfg(test)]
mod tests {
    use super::super::fake_handler::FakeNotificationHandler;
    use crate::queue::api::{
        ModuleRegistry, Packet, PriorityQueueStore, QueueError, ReceiveQueueListener,
        MAX_RECORDED_FAILURES,
    };
    use crate::notifications::api::{HandlerResult, NotificationEvent};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_unregistered_module_never_silently_accepted() {
        let store = PriorityQueueStore::new();

        for module in ["", "whiteboard", "WHITEBOARD"] {
            match store.enqueue(Packet::new(module, "data")) {
                Err(QueueError::UnknownModule { module_id }) => assert_eq!(module_id, module),
                other => panic!("Expected UnknownModule for '{}', got {:?}", module, other),
            }
        }

        store.register_module("whiteboard", 1).unwrap();
        // Identifiers are case sensitive
        assert!(store.enqueue(Packet::new("WHITEBOARD", "data")).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_payload_and_large_payload() {
        let store = Arc::new(PriorityQueueStore::new());
        store.register_module("file", 1).unwrap();
        let handler = FakeNotificationHandler::new("file");
        let mut registry = ModuleRegistry::new();
        registry.register("file", handler.clone()).unwrap();
        let listener = ReceiveQueueListener::new(Arc::clone(&store), registry);

        let large = "x".repeat(1024 * 1024);
        store.enqueue(Packet::new("file", "")).unwrap();
        store.enqueue(Packet::new("file", large.clone())).unwrap();

        listener.start().unwrap();
        assert!(listener.wait_for_dispatched(2, WAIT));
        listener.stop().unwrap();

        assert_eq!(handler.received_data(), vec![String::new(), large]);
    }

    #[test]
    fn test_blocking_dequeue_wakes_on_enqueue() {
        let store = Arc::new(PriorityQueueStore::new());
        store.register_module("a", 1).unwrap();

        let consumer = {
            let store = Arc::clone(&store);
            thread::spawn(move || store.dequeue().unwrap())
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!consumer.is_finished());

        store.enqueue(Packet::new("a", "wake")).unwrap();
        let packet = consumer.join().unwrap();
        assert_eq!(packet.serialized_data(), "wake");
    }

    #[test]
    fn test_failure_history_is_bounded() {
        let store = Arc::new(PriorityQueueStore::new());
        store.register_module("bad", 1).unwrap();
        let mut registry = ModuleRegistry::new();
        registry
            .register(
                "bad",
                Arc::new(|_: NotificationEvent, data: &str| -> HandlerResult {
                    Err(format!("rejected {}", data).into())
                }),
            )
            .unwrap();
        let listener = ReceiveQueueListener::new(Arc::clone(&store), registry);

        let total = MAX_RECORDED_FAILURES + 10;
        for i in 0..total {
            store.enqueue(Packet::new("bad", i.to_string())).unwrap();
        }

        listener.start().unwrap();
        assert!(listener.wait_for_dispatched(total as u64, WAIT));
        listener.stop().unwrap();

        assert_eq!(listener.failure_count(), total as u64);
        let failures = listener.recent_failures();
        assert_eq!(failures.len(), MAX_RECORDED_FAILURES);
        // Oldest entries were evicted
        match &failures[0].error {
            QueueError::HandlerInvocation { message, .. } => {
                assert_eq!(message, "rejected 10");
            }
            other => panic!("Expected HandlerInvocation, got {:?}", other),
        }
        assert_eq!(listener.statistics("bad").unwrap().failed, total as u64);
    }

    #[test]
    fn test_statistics_for_unknown_module() {
        let store = Arc::new(PriorityQueueStore::new());
        let listener = ReceiveQueueListener::new(store, ModuleRegistry::new());
        assert!(listener.statistics("nothing").is_none());
        assert!(listener.recent_failures().is_empty());
    }

    #[test]
    fn test_negative_priorities_are_more_urgent() {
        let store = PriorityQueueStore::new();
        store.register_module("normal", 0).unwrap();
        store.register_module("urgent", -5).unwrap();

        store.enqueue(Packet::new("normal", "n")).unwrap();
        store.enqueue(Packet::new("urgent", "u")).unwrap();
        assert_eq!(store.dequeue().unwrap().module_identifier(), "urgent");
    }
}
