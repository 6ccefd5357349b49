//! Application startup and lifecycle management.

use crate::config::{StoreBackend, TaskConfig};
use crate::handlers;
use crate::services::{InMemoryTaskStore, MongoDb, TaskStore};
use axum::{
    middleware::from_fn,
    routing::get,
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{make_request_span, metrics_middleware, request_id_middleware};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state. The store handle is built once at startup and
/// cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: TaskConfig,
    pub store: Arc<dyn TaskStore>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/tasks", get(handlers::list_tasks).post(handlers::create_task))
        // Empty trailing segment: the by-id handlers answer `{ok: 0}`.
        .route(
            "/tasks/",
            get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route(
            "/tasks/:id",
            get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route_layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(from_fn(request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Connects the configured store. For MongoDB the deployment must answer a
/// ping, so an unreachable database stops startup before any port is bound.
pub async fn connect_store(config: &TaskConfig) -> Result<Arc<dyn TaskStore>, AppError> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory task store; data is lost on restart");
            Ok(Arc::new(InMemoryTaskStore::new()))
        }
        StoreBackend::MongoDb => {
            let db = MongoDb::connect(config.mongo_uri()?, config.mongodb.database.as_deref())
                .await?;
            db.health_check().await.map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                AppError::from(e)
            })?;
            tracing::info!("Successfully connected to MongoDB");
            Ok(Arc::new(db))
        }
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    pub async fn build(config: TaskConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await?;
        Self::build_with_store(config, store).await
    }

    /// Binds the listener around an already constructed store.
    pub async fn build_with_store(
        config: TaskConfig,
        store: Arc<dyn TaskStore>,
    ) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        Ok(Self {
            port,
            listener,
            state: AppState { config, store },
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, build_router(self.state)).await
    }

    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, build_router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
    }
}
