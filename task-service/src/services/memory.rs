use crate::error::StoreError;
use crate::models::{Task, TaskChanges};
use crate::services::TaskStore;
use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

/// In-process task store with the same observable behavior as `MongoDb`:
/// ObjectId assignment, upsert on update, insertion-ordered listing.
///
/// Can be switched unavailable to exercise store-failure paths.
pub struct InMemoryTaskStore {
    tasks: RwLock<Vec<Task>>,
    available: AtomicBool,
    operations: AtomicU64,
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
            operations: AtomicU64::new(0),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of collection operations served, health checks excluded.
    pub fn operation_count(&self) -> u64 {
        self.operations.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable(
                "in-memory task store is unavailable".to_string(),
            ))
        }
    }

    fn begin(&self) -> Result<(), StoreError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn find_all(&self) -> Result<Vec<Task>, StoreError> {
        self.begin()?;
        Ok(self.tasks.read().await.clone())
    }

    async fn insert_one(&self, mut task: Task) -> Result<Task, StoreError> {
        self.begin()?;
        let id = task
            .id
            .get_or_insert_with(|| Bson::ObjectId(ObjectId::new()))
            .clone();
        let mut tasks = self.tasks.write().await;
        if tasks.iter().any(|t| t.id.as_ref() == Some(&id)) {
            return Err(StoreError::DuplicateKey(id));
        }
        tasks.push(task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Task>, StoreError> {
        self.begin()?;
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|t| t.has_id(&id)).cloned())
    }

    async fn find_and_update_by_id(
        &self,
        id: ObjectId,
        changes: TaskChanges,
    ) -> Result<Option<Task>, StoreError> {
        self.begin()?;
        let mut tasks = self.tasks.write().await;
        match tasks.iter_mut().find(|t| t.has_id(&id)) {
            Some(task) => {
                let previous = task.clone();
                task.apply(&changes);
                Ok(Some(previous))
            }
            None => {
                tasks.push(changes.into_upserted(id));
                Ok(None)
            }
        }
    }

    async fn find_and_delete_by_id(&self, id: ObjectId) -> Result<Option<Task>, StoreError> {
        self.begin()?;
        let mut tasks = self.tasks.write().await;
        let index = tasks.iter().position(|t| t.has_id(&id));
        Ok(index.map(|index| tasks.remove(index)))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.ensure_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(text: &str) -> Task {
        Task::new(Some(Bson::String(text.into())), None, 1)
    }

    #[tokio::test]
    async fn insert_assigns_id_and_lists_in_order() {
        let store = InMemoryTaskStore::new();

        let first = store.insert_one(task("a")).await.unwrap();
        let second = store.insert_one(task("b")).await.unwrap();

        assert!(first.id.is_some());
        assert_ne!(first.id, second.id);
        let all = store.find_all().await.unwrap();
        assert_eq!(all, vec![first, second]);
    }

    #[tokio::test]
    async fn update_returns_previous_document() {
        let store = InMemoryTaskStore::new();
        let inserted = store.insert_one(task("a")).await.unwrap();
        let id = inserted.id.clone().unwrap().as_object_id().unwrap();

        let changes = TaskChanges {
            text: None,
            completed: Some(Bson::Boolean(true)),
            modified: 2,
        };
        let previous = store.find_and_update_by_id(id, changes).await.unwrap();

        assert_eq!(previous, Some(inserted));
        let current = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(current.completed, Some(Bson::Boolean(true)));
        assert_eq!(current.created, Some(Bson::Int64(1)));
        assert_eq!(current.modified, Some(Bson::Int64(2)));
    }

    #[tokio::test]
    async fn update_of_unknown_id_upserts() {
        let store = InMemoryTaskStore::new();
        let id = ObjectId::new();

        let previous = store
            .find_and_update_by_id(id, TaskChanges::touch(7))
            .await
            .unwrap();

        assert_eq!(previous, None);
        let created = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(created.created, None);
        assert_eq!(created.modified, Some(Bson::Int64(7)));
    }

    #[tokio::test]
    async fn delete_reports_removed_document() {
        let store = InMemoryTaskStore::new();
        let inserted = store.insert_one(task("a")).await.unwrap();
        let id = inserted.id.unwrap().as_object_id().unwrap();

        assert!(store.find_and_delete_by_id(id).await.unwrap().is_some());
        assert!(store.find_and_delete_by_id(id).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn unavailable_store_fails_operations() {
        let store = InMemoryTaskStore::new();
        store.set_available(false);

        assert!(matches!(
            store.find_all().await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.health_check().await.is_err());
        assert_eq!(store.operation_count(), 1);
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected_as_duplicate_key() {
        let store = InMemoryTaskStore::new();
        let mut first = task("a");
        first.id = Some(Bson::String("fixed".into()));
        store.insert_one(first.clone()).await.unwrap();

        let err = store.insert_one(first).await.unwrap_err();

        assert!(matches!(err, StoreError::DuplicateKey(_)));
        assert_eq!(err.to_body().name, "MongoError");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn keeps_non_object_id_keys_listable() {
        let store = InMemoryTaskStore::new();
        let mut legacy = task("a");
        legacy.id = Some(Bson::String("custom-string-id".into()));
        store.insert_one(legacy.clone()).await.unwrap();

        assert_eq!(store.find_all().await.unwrap(), vec![legacy]);
        assert_eq!(store.find_by_id(ObjectId::new()).await.unwrap(), None);
    }
}
