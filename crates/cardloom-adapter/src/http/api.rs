/*
[INPUT]:  Backend operations needed by pollers and the generation workflow
[OUTPUT]: Async traits abstracting the task backend (remote client or local manager)
[POS]:    HTTP layer - seams between transport and workflow logic
[UPDATE]: When the workflow needs a new backend operation
*/

use async_trait::async_trait;

use crate::http::Result;
use crate::types::{
    Chapter, CreateTaskRequest, Flashcard, ListTasksQuery, Task, TaskPage, UpdateTaskRequest,
};

/// Read access to a single task snapshot.
///
/// Implementations must be side-effect free so they can be polled freely.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn fetch_task(&self, task_id: &str) -> Result<Task>;
}

/// Full task backend used by the generation workflow.
#[async_trait]
pub trait CardloomApi: TaskSource {
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task>;

    async fn update_task(&self, task_id: &str, request: &UpdateTaskRequest) -> Result<Task>;

    async fn list_tasks(&self, query: &ListTasksQuery) -> Result<TaskPage>;

    /// Outline extracted for a `catalog_ready` task
    async fn fetch_catalog(&self, task_id: &str) -> Result<Vec<Chapter>>;

    /// Resume a task toward `completed` using the selected outline node ids
    async fn start_generation(&self, task_id: &str, selected_ids: Vec<String>) -> Result<Task>;

    async fn list_flashcards(&self, task_id: &str) -> Result<Vec<Flashcard>>;
}
