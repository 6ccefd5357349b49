#![allow(dead_code)]

use serde_json::Value;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use task_service::config::{MongoConfig, StoreBackend, TaskConfig};
use task_service::services::{InMemoryTaskStore, MongoDb};
use task_service::startup::{build_router, AppState, Application};

pub fn test_config(store_backend: StoreBackend) -> TaskConfig {
    TaskConfig {
        common: CoreConfig { port: 0 }, // Random port for testing
        environment: "test".to_string(),
        mongodb: MongoConfig {
            uri: std::env::var("TEST_MONGODB_URI")
                .ok()
                .or_else(|| Some("mongodb://localhost:27017".to_string())),
            database: Some(format!("task_test_{}", uuid::Uuid::new_v4().simple())),
        },
        store_backend,
    }
}

/// Router over a fresh in-memory store, for `oneshot` tests.
pub fn test_router() -> (axum::Router, Arc<InMemoryTaskStore>) {
    let store = Arc::new(InMemoryTaskStore::new());
    let state = AppState {
        config: test_config(StoreBackend::Memory),
        store: store.clone(),
    };
    (build_router(state), store)
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub store: Arc<InMemoryTaskStore>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let store = Arc::new(InMemoryTaskStore::new());

        let app = Application::build_with_store(test_config(StoreBackend::Memory), store.clone())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        wait_until_healthy(&client, &address).await;

        TestApp {
            address,
            port,
            client,
            store,
        }
    }

    pub async fn create_task(&self, body: Value) -> Value {
        self.client
            .post(format!("{}/tasks", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .expect("Failed to parse response")
    }

    pub async fn list_tasks(&self) -> Vec<Value> {
        self.client
            .get(format!("{}/tasks", self.address))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .expect("Failed to parse response")
    }

    pub async fn get_task(&self, id: &str) -> Value {
        self.client
            .get(format!("{}/tasks/{}", self.address, id))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .expect("Failed to parse response")
    }

    pub async fn update_task(&self, id: &str, body: Value) -> Value {
        self.client
            .put(format!("{}/tasks/{}", self.address, id))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .expect("Failed to parse response")
    }

    pub async fn delete_task(&self, id: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}/tasks/{}", self.address, id))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Application backed by a live MongoDB; each instance gets its own database.
pub struct MongoTestApp {
    pub app: TestApp,
    pub db: MongoDb,
}

impl MongoTestApp {
    pub async fn spawn() -> Self {
        let config = test_config(StoreBackend::MongoDb);
        let db = MongoDb::connect(
            config.mongo_uri().expect("Missing test MongoDB URI"),
            config.mongodb.database.as_deref(),
        )
        .await
        .expect("Failed to connect to MongoDB");

        let app = Application::build_with_store(config, Arc::new(db.clone()))
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        wait_until_healthy(&client, &address).await;

        MongoTestApp {
            app: TestApp {
                address,
                port,
                client,
                // Unused by MongoDB-backed tests.
                store: Arc::new(InMemoryTaskStore::new()),
            },
            db,
        }
    }

    /// Drops the per-test database.
    pub async fn cleanup(&self) {
        let _ = self.db.database().drop(None).await;
    }
}

async fn wait_until_healthy(client: &reqwest::Client, address: &str) {
    let health_url = format!("{}/health", address);
    for _ in 0..50 {
        if client.get(&health_url).send().await.is_ok() {
            break;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }
}
