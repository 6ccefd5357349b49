use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use serde::{Deserialize, Serialize};

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A to-do item as stored in the `tasks` collection.
///
/// The collection has no schema, so every field is kept as the raw BSON the
/// store returns: `_id` need not be an ObjectId and timestamps written by
/// older clients may be doubles. Every field except `_id` may be missing: a
/// document created through an upserting update has no `created`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Bson>,
    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<Bson>,
}

impl Task {
    pub fn new(text: Option<Bson>, parent_id: Option<Bson>, now: i64) -> Self {
        Self {
            id: None,
            text,
            parent_id,
            completed: Some(Bson::Boolean(false)),
            created: Some(Bson::Int64(now)),
            modified: Some(Bson::Int64(now)),
        }
    }

    /// Whether this document's `_id` is the ObjectId `id`.
    pub fn has_id(&self, id: &ObjectId) -> bool {
        matches!(&self.id, Some(Bson::ObjectId(own)) if own == id)
    }

    pub fn apply(&mut self, changes: &TaskChanges) {
        if let Some(text) = &changes.text {
            self.text = Some(text.clone());
        }
        if let Some(completed) = &changes.completed {
            self.completed = Some(completed.clone());
        }
        self.modified = Some(Bson::Int64(changes.modified));
    }
}

/// Field overwrites carried by an update; `modified` is always written.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskChanges {
    pub text: Option<Bson>,
    pub completed: Option<Bson>,
    pub modified: i64,
}

impl TaskChanges {
    pub fn touch(modified: i64) -> Self {
        Self {
            text: None,
            completed: None,
            modified,
        }
    }

    /// The `$set` payload for a find-and-modify.
    pub fn to_set_document(&self) -> Document {
        let mut set = doc! { "modified": self.modified };
        if let Some(text) = &self.text {
            set.insert("text", text.clone());
        }
        if let Some(completed) = &self.completed {
            set.insert("completed", completed.clone());
        }
        set
    }

    /// The document an upsert creates when nothing matches `id`.
    pub fn into_upserted(self, id: ObjectId) -> Task {
        Task {
            id: Some(Bson::ObjectId(id)),
            text: self.text,
            parent_id: None,
            completed: self.completed,
            created: None,
            modified: Some(Bson::Int64(self.modified)),
        }
    }
}
