use serde::{Deserialize, Serialize};

use crate::lists::data::ListID;
use crate::users::data::UserID;

pub type TaskID = i64;
pub type CompletionID = i64;

#[derive(Serialize, Debug, Clone)]
pub struct Task {
    pub id: TaskID,
    pub list_id: ListID,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i64,
    pub allow_multiple_completions: bool,
    pub sort_order: i64,
}

/// A task plus its completion state for one resolved period (all-time for
/// static lists).
#[derive(Serialize, Debug)]
pub struct TaskWithStatus {
    #[serde(flatten)]
    pub task: Task,
    pub completions_in_period: i64,
    pub completed: bool,
}

/// One row of the append-only completion log.
#[derive(Serialize, Debug, Clone)]
pub struct Completion {
    pub id: CompletionID,
    pub task_id: TaskID,
    pub completed_by: Option<UserID>,
    pub completed_by_username: Option<String>,
    pub completed_at: String,
}

#[derive(Deserialize, Debug)]
pub struct CreateTaskRequest {
    pub list_id: ListID,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: Option<i64>,
    pub allow_multiple_completions: Option<bool>,
    pub sort_order: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<i64>,
    pub allow_multiple_completions: Option<bool>,
    pub sort_order: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct ReorderTasksRequest {
    pub list_id: ListID,
    pub task_ids: Vec<TaskID>,
}
