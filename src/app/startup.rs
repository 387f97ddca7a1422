//! Application startup
//!
//! Order matters: configuration is resolved before logging exists, so
//! configuration errors go to stderr directly. Everything after that is
//! reported through the logger.

use crate::app::cli::{version_string, Args, Command, Config, SendArgs};
use crate::app::error::AppResult;
use crate::app::service::Service;
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::init_logging;
use crate::core::shutdown::ShutdownCoordinator;
use crate::network::api::ClientCommunicator;
use crate::queue::api::Packet;
use clap::Parser;

/// Run the command line application and return the process exit code
pub async fn startup() -> i32 {
    let args = Args::parse();

    let config = match resolve_config(&args).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let log_file = config
        .logging
        .file
        .as_ref()
        .map(|path| path.to_string_lossy().into_owned());
    if let Err(e) = init_logging(
        Some(config.logging.level.as_str()),
        Some(config.logging.format.as_str()),
        log_file.as_deref(),
        config.use_color(),
    ) {
        eprintln!("Error initialising logging: {}", e);
        return 1;
    }
    log::debug!("packet-dispatch {}", version_string());

    let (result, context) = match &args.command {
        Command::Serve(_) => (serve(&config).await, "Running server"),
        Command::Send(send_args) => (send(&config, send_args).await, "Sending packet"),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            log_error_with_context(&e, context);
            1
        }
    }
}

async fn resolve_config(args: &Args) -> AppResult<Config> {
    let mut config = Config::load(args.config_file.as_deref()).await?;
    config.apply_args(args)?;
    Ok(config)
}

async fn serve(config: &Config) -> AppResult<()> {
    let shutdown = ShutdownCoordinator::new();
    shutdown.install_signal_handlers();

    let service = Service::start(config).await?;
    let modules: Vec<&str> = config.modules.iter().map(|m| m.id.as_str()).collect();
    log::info!(
        "Serving modules [{}] on {}",
        modules.join(", "),
        service.address()
    );
    println!("{}", service.address());

    shutdown.wait().await;
    service.shutdown().await
}

async fn send(config: &Config, args: &SendArgs) -> AppResult<()> {
    let host = args.host.as_deref().unwrap_or(&config.server.host);

    let client = ClientCommunicator::new();
    let status = client.start(host, &args.port).await?;
    client
        .send(&Packet::new(args.module.clone(), args.data.clone()))
        .await?;
    client.stop().await?;

    println!("{}", status);
    Ok(())
}
