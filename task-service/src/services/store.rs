use crate::error::StoreError;
use crate::models::{Task, TaskChanges};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

/// Collection-scoped operations behind the task routes. Each route makes
/// exactly one of these calls.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Task>, StoreError>;

    /// Inserts `task` and returns it with the identifier the store assigned.
    async fn insert_one(&self, task: Task) -> Result<Task, StoreError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Task>, StoreError>;

    /// Applies `changes` to the task with `id`, inserting a new document when
    /// none matches. Returns the document as it was before the update.
    async fn find_and_update_by_id(
        &self,
        id: ObjectId,
        changes: TaskChanges,
    ) -> Result<Option<Task>, StoreError>;

    async fn find_and_delete_by_id(&self, id: ObjectId) -> Result<Option<Task>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
