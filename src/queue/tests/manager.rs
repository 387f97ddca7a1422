//! Tests for QueueManager registration and listener creation

#[cfg(test)]
mod tests {
    use super::super::fake_handler::FakeNotificationHandler;
    use crate::queue::api::{Packet, QueueError, QueueManager};
    use std::time::Duration;

    #[test]
    fn test_register_module_updates_store_and_registry() {
        let manager = QueueManager::new();
        manager
            .register_module("file", 3, FakeNotificationHandler::new("file"))
            .unwrap();
        manager
            .register_module("whiteboard", 1, FakeNotificationHandler::new("whiteboard"))
            .unwrap();

        assert_eq!(manager.module_ids(), vec!["whiteboard", "file"]);
        assert!(manager.is_empty());
        assert_eq!(manager.store().priority_of("file"), Some(3));
    }

    #[test]
    fn test_duplicate_registration_keeps_first_handler() {
        let manager = QueueManager::new();
        let first = FakeNotificationHandler::new("whiteboard");
        let second = FakeNotificationHandler::new("whiteboard");

        manager.register_module("whiteboard", 1, first.clone()).unwrap();
        match manager.register_module("whiteboard", 5, second.clone()) {
            Err(QueueError::DuplicateModule { module_id }) => assert_eq!(module_id, "whiteboard"),
            other => panic!("Expected DuplicateModule, got {:?}", other),
        }
        assert_eq!(manager.store().priority_of("whiteboard"), Some(1));

        let listener = manager.create_listener().unwrap();
        manager.enqueue(Packet::new("whiteboard", "stroke")).unwrap();
        listener.start().unwrap();
        assert!(listener.wait_for_dispatched(1, Duration::from_secs(5)));
        listener.stop().unwrap();

        assert_eq!(first.received_data(), vec!["stroke"]);
        assert_eq!(second.call_count(), 0);
    }

    #[test]
    fn test_registration_closes_when_listener_created() {
        let manager = QueueManager::new();
        manager
            .register_module("a", 1, FakeNotificationHandler::new("a"))
            .unwrap();

        let _listener = manager.create_listener().unwrap();

        match manager.register_module("b", 2, FakeNotificationHandler::new("b")) {
            Err(QueueError::RegistrationClosed { module_id }) => assert_eq!(module_id, "b"),
            other => panic!("Expected RegistrationClosed, got {:?}", other),
        }
        assert!(!manager.store().is_registered("b"));
    }

    #[test]
    fn test_listener_can_only_be_created_once() {
        let manager = QueueManager::new();
        let _listener = manager.create_listener().unwrap();

        match manager.create_listener() {
            Err(QueueError::OperationFailed { message }) => {
                assert!(message.contains("already been created"));
            }
            Err(other) => panic!("Expected OperationFailed, got {:?}", other),
            Ok(_) => panic!("Second listener should be rejected"),
        }
    }

    #[test]
    fn test_burst_configuration_reaches_store() {
        let manager = QueueManager::with_burst_per_pass(4);
        assert_eq!(manager.store().burst_per_pass(), 4);
    }

    #[test]
    fn test_stats_reflect_enqueued_packets() {
        let manager = QueueManager::new();
        manager
            .register_module("a", 1, FakeNotificationHandler::new("a"))
            .unwrap();
        manager.enqueue(Packet::new("a", "1")).unwrap();
        manager.enqueue(Packet::new("a", "2")).unwrap();

        let stats = manager.stats();
        assert_eq!(stats.total_packets, 2);
        assert_eq!(stats.per_module[0].module_id, "a");
        assert_eq!(stats.per_module[0].enqueued_total, 2);
    }
}
