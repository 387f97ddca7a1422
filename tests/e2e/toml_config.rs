//! Configuration files drive the running service

use crate::common::{eventually, modules_in, new_log, split_address, RecordingHandler};
use packet_dispatch::app::cli::{Config, ConfigError};
use packet_dispatch::app::service::Service;
use packet_dispatch::network::api::ClientCommunicator;
use packet_dispatch::queue::api::Packet;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_configured_modules_receive_packets() {
    let file = config_file(
        r#"
[server]
host = "127.0.0.1"

[[modules]]
id = "alerts"
priority = 0

[[modules]]
id = "bulk"
priority = 10
"#,
    );
    let config = Config::load(Some(file.path())).await.unwrap();

    let log = new_log();
    let handler_log = log.clone();
    let service = Service::start_with(&config, move |module| {
        RecordingHandler::new(&module.id, &handler_log)
    })
    .await
    .unwrap();

    let (host, port) = split_address(service.address());
    let client = ClientCommunicator::new();
    client.start(&host, &port).await.unwrap();
    client.send(&Packet::new("bulk", "b1")).await.unwrap();
    client.send(&Packet::new("alerts", "a1")).await.unwrap();

    assert!(eventually(|| log.lock().unwrap().len() == 2, Duration::from_secs(2)).await);
    let mut delivered = modules_in(&log);
    delivered.sort();
    assert_eq!(delivered, vec!["alerts", "bulk"]);

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_module_ids_fail_validation() {
    let file = config_file(
        r#"
[[modules]]
id = "file"
priority = 1

[[modules]]
id = "file"
priority = 2
"#,
    );

    let err = Config::load(Some(file.path())).await.unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));
}
