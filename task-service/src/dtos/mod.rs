pub mod tasks;

pub use tasks::{
    is_truthy, render_id, Ack, CreateTaskRequest, InsertAck, LastErrorObject, StoreErrorBody,
    TaskBody, TaskResponse, UpdateAck, UpdateTaskRequest,
};
