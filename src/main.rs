use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use uzhavan::config::{self, Settings};
use uzhavan::{AssistantService, ServiceRegistry};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("{} v{} starting", config::APP_NAME, config::APP_VERSION);

    let settings = Settings::from_env();

    // Bootstrap talks to external services with blocking clients.
    let boot_settings = settings.clone();
    let registry =
        match tokio::task::spawn_blocking(move || ServiceRegistry::bootstrap(&boot_settings)).await
        {
            Ok(Ok(registry)) => Arc::new(registry),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Bootstrap failed");
                return ExitCode::FAILURE;
            }
            Err(e) => {
                tracing::error!(error = %e, "Bootstrap task failed");
                return ExitCode::FAILURE;
            }
        };

    let service = Arc::new(AssistantService::new(registry));
    let app = uzhavan::api::router(service);

    let listener = match tokio::net::TcpListener::bind(&settings.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %settings.bind_addr, "Could not bind");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(addr = %settings.bind_addr, "Serving API");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
