use rights_service::{
    RightsService,
    config::RightsConfig,
    models::{RightClass, TargetType},
    services::{InMemoryDirectory, MemoryBackend},
};
use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use std::sync::Arc;

/// Loads the catalog the way a host process would and prints it as JSON,
/// optionally restricted to a target type and a right class given as the
/// first and second arguments (`-` skips the target type).
#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = RightsConfig::from_env()?;

    if let Err(err) = init_tracing(&config.service_name, &config.log_level, config.log_format) {
        eprintln!("tracing already initialized: {}", err);
    }

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting rights service"
    );

    let mut args = std::env::args().skip(1);
    let target_type = args
        .next()
        .filter(|raw| raw != "-")
        .map(|raw| raw.parse::<TargetType>())
        .transpose()
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))?;
    let class = args
        .next()
        .map(|raw| raw.parse::<RightClass>())
        .transpose()
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))?;

    let service = RightsService::bootstrap(
        &config,
        Arc::new(MemoryBackend::new()),
        Arc::new(InMemoryDirectory::new()),
    )
    .await?;

    let rights = service.list_rights(target_type, class);
    let body = serde_json::to_string_pretty(&rights)
        .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?;
    println!("{}", body);

    tracing::info!(rights = rights.len(), "Catalog listed");
    Ok(())
}
