use harbormaster::error::HarborError;
use harbormaster::logger::initialize as LoggerInitialize;
use harbormaster::routes::api_routes;

use coord_core::APP_NAME;
use coord_core::config::CoordSettings;
use coord_core::identity::Identity;
use coord_core::lockstore::LockStore;
use coord_core::orchestrator::Coordinator;
use coord_core::probe::ProbeClient;

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;

use log::info;

#[tokio::main]
async fn main() -> Result<(), HarborError> {
    let config_dir = settings_dir()?;
    let settings = CoordSettings::load(&config_dir)?;

    // Logs live under the data dir, next to the lock files
    let data_dir = settings.resolve_data_dir();
    let log_dir = data_dir.join("logs");
    create_dir_all(&log_dir).map_err(|e| HarborError::Harbor {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir)?;

    info!("Harbormaster starting");
    info!("Config directory: {}", config_dir.display());
    info!("Data directory: {}", data_dir.display());

    let identity = Identity::detect(&settings.identity.app_name, &settings.identity.api_version);
    let locks = LockStore::new(&data_dir, &identity);
    let coordinator = Coordinator::new(identity, locks, ProbeClient::new(), Arc::new(api_routes))
        .with_route_dump(settings.diagnostics.dump_routes);

    let handle = coordinator
        .ensure_server(
            settings.server.preferred_port,
            &settings.server.host,
            settings.server.mode,
        )
        .await?;

    // Machine-readable address on stdout; everything else goes to the log
    println!("{}", handle.base_url());

    if handle.reused {
        info!("Adopted running API server at {}", handle.base_url());
        return Ok(());
    }

    info!(
        "Launched API server at {}, serving until interrupted",
        handle.base_url()
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| HarborError::Harbor {
            message: format!("Failed to listen for shutdown signal: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!("Shutdown signal received, exiting");
    Ok(())
}

/// Platform config directory for this app, e.g. `~/.config/harbormaster`.
fn settings_dir() -> Result<PathBuf, HarborError> {
    dirs::config_local_dir()
        .map(|dir| dir.join(APP_NAME))
        .ok_or_else(|| HarborError::Harbor {
            message: String::from("No config directory available on this platform"),
            location: ErrorLocation::from(Location::caller()),
        })
}
