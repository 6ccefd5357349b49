pub mod health;
pub mod tasks;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use tasks::{create_task, delete_task, get_task, list_tasks, update_task};
