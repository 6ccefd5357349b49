use crate::error::StoreError;
use crate::models::{Task, TaskChanges};
use mongodb::bson::{oid::ObjectId, Bson};
use serde::Serialize;
use serde_json::{Map, Value};

/// Raw JSON object body accepted by the create and update routes.
pub type TaskBody = Map<String, Value>;

/// JavaScript truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn to_bson(value: Option<Value>) -> Result<Option<Bson>, StoreError> {
    value
        .map(|v| mongodb::bson::to_bson(&v))
        .transpose()
        .map_err(StoreError::from)
}

/// JSON form of a stored identifier: an ObjectId is rendered as its hex
/// string, any other key as-is.
pub fn render_id(id: Bson) -> Value {
    match id {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        other => other.into_relaxed_extjson(),
    }
}

/// `{ "ok": 0 }` / `{ "ok": 1 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub ok: u8,
}

impl Ack {
    pub fn rejected() -> Self {
        Self { ok: 0 }
    }

    pub fn accepted() -> Self {
        Self { ok: 1 }
    }
}

/// Fields copied from a create body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateTaskRequest {
    pub text: Option<Value>,
    pub parent_id: Option<Value>,
}

impl CreateTaskRequest {
    pub fn from_body(body: &TaskBody) -> Self {
        let field = |name: &str| body.get(name).filter(|v| !v.is_null()).cloned();
        Self {
            text: field("text"),
            parent_id: field("parentId"),
        }
    }

    pub fn into_task(self, now: i64) -> Result<Task, StoreError> {
        Ok(Task::new(to_bson(self.text)?, to_bson(self.parent_id)?, now))
    }
}

/// Fields of an update body that survive the truthiness filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateTaskRequest {
    pub text: Option<Value>,
    pub completed: Option<Value>,
}

impl UpdateTaskRequest {
    pub fn from_body(body: &TaskBody) -> Self {
        let field = |name: &str| body.get(name).filter(|v| is_truthy(v)).cloned();
        Self {
            text: field("text"),
            completed: field("completed"),
        }
    }

    pub fn into_changes(self, now: i64) -> Result<TaskChanges, StoreError> {
        Ok(TaskChanges {
            text: to_bson(self.text)?,
            completed: to_bson(self.completed)?,
            modified: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResponse {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Value>,
    #[serde(rename = "parentId", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<Value>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id.map(render_id),
            text: task.text.map(Bson::into_relaxed_extjson),
            parent_id: task.parent_id.map(Bson::into_relaxed_extjson),
            completed: task.completed.map(Bson::into_relaxed_extjson),
            created: task.created.map(Bson::into_relaxed_extjson),
            modified: task.modified.map(Bson::into_relaxed_extjson),
        }
    }
}

/// Insertion acknowledgment, echoing the stored document in `ops`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAck {
    pub ok: u8,
    pub n: u32,
    pub inserted_id: Value,
    pub ops: Vec<TaskResponse>,
}

impl InsertAck {
    pub fn new(task: Task) -> Self {
        let inserted_id = task.id.clone().map(render_id).unwrap_or_default();
        Self {
            ok: 1,
            n: 1,
            inserted_id,
            ops: vec![TaskResponse::from(task)],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastErrorObject {
    pub n: u32,
    pub updated_existing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upserted: Option<String>,
}

/// Find-and-modify result. `value` is the document before the update, or
/// `null` when the update inserted it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAck {
    pub ok: u8,
    pub value: Option<TaskResponse>,
    pub last_error_object: LastErrorObject,
}

impl UpdateAck {
    pub fn new(id: ObjectId, previous: Option<Task>) -> Self {
        let updated_existing = previous.is_some();
        Self {
            ok: 1,
            value: previous.map(TaskResponse::from),
            last_error_object: LastErrorObject {
                n: 1,
                updated_existing,
                upserted: (!updated_existing).then(|| id.to_hex()),
            },
        }
    }
}

/// Store failure echoed back as the response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreErrorBody {
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
}
