use service_core::observability::init_tracing;
use task_service::config::TaskConfig;
use task_service::services::init_metrics;
use task_service::startup::Application;
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let otlp_endpoint = std::env::var("OTLP_ENDPOINT").ok();
    init_tracing("task-service", "info", otlp_endpoint.as_deref());

    if let Err(e) = init_metrics() {
        tracing::warn!("Metrics disabled: {}", e);
    }

    let config = TaskConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to start task-service: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    app.run_until(shutdown_signal()).await
}
