use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use pms_core::config::{flag_from_env_value, patient_data_file_from_env_value};
use pms_core::{CoreConfig, PatientService};

/// Main entry point for the PMS application
///
/// Starts the REST server (with OpenAPI/Swagger UI at `/swagger-ui`).
///
/// # Environment Variables
/// - `PMS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PATIENT_DATA_FILE`: Patient collection document (default: "patient.json")
/// - `PMS_INIT_STORE`: Create an empty collection document at startup if none exists
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the patient data file does not exist and `PMS_INIT_STORE` is not set,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pms=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("PMS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let patient_data_file =
        patient_data_file_from_env_value(std::env::var("PATIENT_DATA_FILE").ok());
    let init_store = flag_from_env_value(std::env::var("PMS_INIT_STORE").ok());

    let cfg = Arc::new(CoreConfig::new(patient_data_file)?);
    let patient_service = PatientService::new(cfg.clone());

    if init_store {
        patient_service.store().initialise()?;
    } else if !cfg.patient_data_file().exists() {
        anyhow::bail!(
            "Patient data file does not exist: {} (set PMS_INIT_STORE=true to create it)",
            cfg.patient_data_file().display()
        );
    }

    tracing::info!("++ Starting PMS REST on {}", rest_addr);
    tracing::info!("++ Patient data file: {}", cfg.patient_data_file().display());

    let app = router(AppState::new(patient_service));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("-- Shutting down PMS REST");
}
