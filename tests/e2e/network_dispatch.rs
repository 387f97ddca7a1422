//! Packets sent by a client reach the right handlers in priority order

use crate::common::{eventually, modules_in, new_log, split_address, RecordingHandler};
use packet_dispatch::network::api::{ClientCommunicator, ServerCommunicator, CONNECTED_STATUS};
use packet_dispatch::queue::api::{Packet, QueueManager};
use std::time::Duration;

#[tokio::test]
async fn test_client_packets_are_dispatched_by_priority() {
    let log = new_log();
    let manager = QueueManager::new();
    for (module, priority) in [("A", 1), ("B", 2), ("C", 3)] {
        manager
            .register_module(module, priority, RecordingHandler::new(module, &log))
            .unwrap();
    }
    let listener = manager.create_listener().unwrap();

    let server = ServerCommunicator::default().with_store(manager.store());
    let address = server.start().await.unwrap();
    let (host, port) = split_address(&address);

    let client = ClientCommunicator::new();
    assert_eq!(client.start(&host, &port).await.unwrap(), CONNECTED_STATUS);
    for module in ["C", "B", "A"] {
        client
            .send(&Packet::new(module, format!("payload-{}", module)))
            .await
            .unwrap();
    }

    // Everything is queued before dispatch begins
    let store = manager.store();
    assert!(eventually(|| store.len() == 3, Duration::from_secs(2)).await);

    listener.start().unwrap();
    assert!(eventually(|| log.lock().unwrap().len() == 3, Duration::from_secs(2)).await);
    assert_eq!(modules_in(&log), vec!["A", "B", "C"]);
    assert_eq!(
        log.lock().unwrap()[0],
        ("A".to_string(), "payload-A".to_string())
    );

    client.stop().await.unwrap();
    server.stop().await.unwrap();
    listener.stop().unwrap();
}

#[tokio::test]
async fn test_per_module_order_survives_the_wire() {
    let log = new_log();
    let manager = QueueManager::new();
    manager
        .register_module("file", 3, RecordingHandler::new("file", &log))
        .unwrap();
    let listener = manager.create_listener().unwrap();
    listener.start().unwrap();

    let server = ServerCommunicator::default().with_store(manager.store());
    let (host, port) = split_address(&server.start().await.unwrap());

    let client = ClientCommunicator::new();
    client.start(&host, &port).await.unwrap();
    for chunk in 0..5 {
        client
            .send(&Packet::new("file", format!("chunk-{}", chunk)))
            .await
            .unwrap();
    }

    assert!(eventually(|| log.lock().unwrap().len() == 5, Duration::from_secs(2)).await);
    let data: Vec<String> = log.lock().unwrap().iter().map(|(_, d)| d.clone()).collect();
    assert_eq!(
        data,
        vec!["chunk-0", "chunk-1", "chunk-2", "chunk-3", "chunk-4"]
    );

    server.stop().await.unwrap();
    listener.stop().unwrap();
}

#[tokio::test]
async fn test_unknown_modules_are_skipped_over_the_wire() {
    let log = new_log();
    let manager = QueueManager::new();
    manager
        .register_module("whiteboard", 1, RecordingHandler::new("whiteboard", &log))
        .unwrap();
    let listener = manager.create_listener().unwrap();
    listener.start().unwrap();

    let server = ServerCommunicator::default().with_store(manager.store());
    let (host, port) = split_address(&server.start().await.unwrap());

    let client = ClientCommunicator::new();
    client.start(&host, &port).await.unwrap();
    client.send(&Packet::new("chat", "ignored")).await.unwrap();
    client.send(&Packet::new("whiteboard", "kept")).await.unwrap();

    assert!(eventually(|| log.lock().unwrap().len() == 1, Duration::from_secs(2)).await);
    assert_eq!(
        log.lock().unwrap().as_slice(),
        &[("whiteboard".to_string(), "kept".to_string())]
    );
    assert_eq!(server.connected_clients(), 1);

    server.stop().await.unwrap();
    listener.stop().unwrap();
}
