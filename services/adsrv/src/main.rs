//! TwinCAT ADS Device Service (adsrv)
//!
//! Hosts one TwinCAT ADS device and serves its attributes and commands over HTTP.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use adsrv::adapter::TwincatAds;
use adsrv::api::{create_routes, AppState};
use adsrv::bootstrap::{self, Args, ServiceArgs, SERVICE_NAME};
use adsrv::config::AppConfig;
use adsrv::device::DeviceServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let service_args: ServiceArgs = args.clone().into();
    let service_info = bootstrap::create_service_info();

    let config_path = service_args.get_config_path(SERVICE_NAME);
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    bootstrap::initialize_logging(&args, &service_info, &config)?;
    if !args.no_color {
        common::service_bootstrap::print_startup_banner(&service_info);
    }

    // Validation mode: validate and exit
    if args.validate {
        bootstrap::validate_configuration(&config)?;
        info!("Validation completed successfully");
        return Ok(());
    }

    let device = Arc::new(TwincatAds::from_properties(config.device.clone())?);
    let server = Arc::new(DeviceServer::new(device));

    let starting = server.clone();
    if let Err(e) = tokio::task::spawn_blocking(move || starting.start()).await? {
        error!("Device startup failed: {}", e);
        let stopping = server.clone();
        tokio::task::spawn_blocking(move || stopping.stop()).await??;
        return Err(e.into());
    }
    info!("Device {} is {}", config.device.name, server.state());

    let app = create_routes(Arc::new(AppState::new(server.clone())));
    let bind_addr = bootstrap::bind_address(&service_args, &config);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("API listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let signal = common::shutdown::wait_for_shutdown().await;
            info!("{} received, shutting down", signal);
        })
        .await?;

    let stopping = server.clone();
    tokio::task::spawn_blocking(move || stopping.stop()).await??;
    info!("Service stopped");
    Ok(())
}
