use crate::error::StoreError;
use crate::models::{Task, TaskChanges};
use crate::services::TaskStore;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::FindOneAndUpdateOptions,
    Client as MongoClient, Collection, Database,
};
use service_core::error::AppError;

pub const TASKS_COLLECTION: &str = "tasks";

/// Used when neither the configuration nor the connection string names one.
pub const DEFAULT_DATABASE: &str = "tasks";

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    /// Opens a client for `uri`. The driver connects lazily; call
    /// `health_check` to find out whether the deployment is reachable.
    pub async fn connect(uri: &str, database: Option<&str>) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to parse MongoDB connection string: {}", e);
            AppError::from(e)
        })?;
        let db = match database {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
        };
        tracing::info!(database = %db.name(), "Using MongoDB database");
        Ok(Self { client, db })
    }

    pub fn tasks(&self) -> Collection<Task> {
        self.db.collection(TASKS_COLLECTION)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl TaskStore for MongoDb {
    async fn find_all(&self) -> Result<Vec<Task>, StoreError> {
        let cursor = self.tasks().find(None, None).await?;
        let tasks: Vec<Task> = cursor.try_collect().await?;
        Ok(tasks)
    }

    async fn insert_one(&self, mut task: Task) -> Result<Task, StoreError> {
        let result = self.tasks().insert_one(&task, None).await?;
        task.id = Some(result.inserted_id);
        Ok(task)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_and_update_by_id(
        &self,
        id: ObjectId,
        changes: TaskChanges,
    ) -> Result<Option<Task>, StoreError> {
        let options = FindOneAndUpdateOptions::builder()
            .sort(doc! { "_id": -1 })
            .upsert(true)
            .build();

        Ok(self
            .tasks()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": changes.to_set_document() },
                options,
            )
            .await?)
    }

    async fn find_and_delete_by_id(&self, id: ObjectId) -> Result<Option<Task>, StoreError> {
        Ok(self
            .tasks()
            .find_one_and_delete(doc! { "_id": id }, None)
            .await?)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                StoreError::from(e)
            })?;
        Ok(())
    }
}
