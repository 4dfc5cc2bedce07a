/*
[INPUT]:  Caller user id, CreateTaskRequest / UpdateTaskRequest / ListTasksQuery, optional TaskStorage
[OUTPUT]: Validated Task records with monotonic status transitions and owner scoping
[POS]:    Lifecycle layer - task creation, reads, updates and backend-driven transitions
[UPDATE]: When changing validation rules, transition order, or listing semantics
*/

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use cardloom_adapter::{
    CardloomError, CreateTaskRequest, ListTasksQuery, Result, Task, TaskInput, TaskPage,
    TaskSource, TaskStatus, TaskType, UpdateTaskRequest, WorkflowType,
};

use crate::state::TaskStorage;

/// A validated submission, ready to become a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub workflow_type: WorkflowType,
    pub input: TaskInput,
}

/// Validate a raw submission without creating anything.
pub fn validate_create_request(request: &CreateTaskRequest) -> Result<ValidatedSubmission> {
    let task_type: TaskType = request.task_type.trim().parse()?;
    let workflow_type: WorkflowType = request.workflow_type.trim().parse()?;
    let input = TaskInput::from_input_data(task_type, &request.input_data)?;
    Ok(ValidatedSubmission {
        workflow_type,
        input,
    })
}

#[derive(Debug, Clone)]
struct TaskEntry {
    task: Task,
    /// Insertion sequence, breaks `created_at` ties when listing
    seq: u64,
}

#[derive(Debug, Default)]
struct TaskTable {
    entries: HashMap<String, TaskEntry>,
    next_seq: u64,
}

impl TaskTable {
    fn owned(&self, owner: &str, task_id: &str) -> Result<&TaskEntry> {
        let entry = self
            .entries
            .get(task_id)
            .ok_or_else(|| CardloomError::NotFound(format!("task {task_id}")))?;
        if entry.task.user_id != owner {
            return Err(CardloomError::Authorization(format!(
                "task {task_id} belongs to another user"
            )));
        }
        Ok(entry)
    }

    fn any(&self, task_id: &str) -> Result<&TaskEntry> {
        self.entries
            .get(task_id)
            .ok_or_else(|| CardloomError::NotFound(format!("task {task_id}")))
    }
}

/// Task lifecycle manager.
///
/// Owns every task record. Client calls are scoped to the caller's user id;
/// `advance_status` and `fail_task` are the backend side and skip the owner
/// check. With storage attached, every mutation is written before it becomes
/// visible, so a failed write leaves the table untouched.
#[derive(Debug, Default)]
pub struct TaskManager {
    table: Mutex<TaskTable>,
    storage: Option<TaskStorage>,
}

impl TaskManager {
    /// In-memory manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager backed by a JSON task journal
    pub async fn with_storage(storage: TaskStorage) -> anyhow::Result<Self> {
        let tasks = storage.load_tasks().await?;
        let mut table = TaskTable::default();
        for task in tasks {
            let seq = table.next_seq;
            table.next_seq += 1;
            table
                .entries
                .insert(task.id.clone(), TaskEntry { task, seq });
        }
        info!(path = %storage.path().display(), count = table.entries.len(), "task journal loaded");

        Ok(Self {
            table: Mutex::new(table),
            storage: Some(storage),
        })
    }

    pub async fn task_count(&self) -> usize {
        self.table.lock().await.entries.len()
    }

    /// Create a task in `processing`.
    ///
    /// Nothing is recorded unless validation passes.
    pub async fn create_task(&self, owner: &str, request: &CreateTaskRequest) -> Result<Task> {
        let submission = validate_create_request(request)?;
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            user_id: owner.to_string(),
            created_at: now,
            updated_at: now,
            workflow_type: submission.workflow_type,
            input: submission.input,
            status: TaskStatus::Processing,
        };

        let mut table = self.table.lock().await;
        let seq = table.next_seq;
        let task = self.commit(&mut table, task, seq).await?;
        table.next_seq += 1;

        info!(
            task_id = %task.id,
            user_id = owner,
            task_type = %task.task_type(),
            workflow_type = %task.workflow_type,
            "task created"
        );
        Ok(task)
    }

    pub async fn get_task(&self, owner: &str, task_id: &str) -> Result<Task> {
        let table = self.table.lock().await;
        Ok(table.owned(owner, task_id)?.task.clone())
    }

    /// Apply a client update: a status move, a new input payload, or both.
    pub async fn update_task(
        &self,
        owner: &str,
        task_id: &str,
        request: &UpdateTaskRequest,
    ) -> Result<Task> {
        if request.is_empty() {
            return Err(CardloomError::Validation(
                "update requires status or input_data".to_string(),
            ));
        }
        let status = request
            .status
            .as_deref()
            .map(|value| value.trim().parse::<TaskStatus>())
            .transpose()?;

        let mut table = self.table.lock().await;
        let entry = table.owned(owner, task_id)?.clone();
        let mut task = entry.task;

        if task.is_terminal() {
            return Err(CardloomError::Validation(format!(
                "task {task_id} is {} and can no longer change",
                task.status
            )));
        }
        if let Some(data) = &request.input_data {
            task.input = TaskInput::from_input_data(task.task_type(), data)?;
        }
        if let Some(next) = status {
            ensure_transition(task_id, task.status, next)?;
            task.status = next;
        }
        task.updated_at = Utc::now();

        let task = self.commit(&mut table, task, entry.seq).await?;
        debug!(task_id, status = %task.status, "task updated");
        Ok(task)
    }

    /// The caller's tasks, newest first, with the pre-pagination total.
    pub async fn list_tasks(&self, owner: &str, query: &ListTasksQuery) -> Result<TaskPage> {
        let table = self.table.lock().await;
        let mut matching: Vec<&TaskEntry> = table
            .entries
            .values()
            .filter(|entry| entry.task.user_id == owner)
            .filter(|entry| query.status.is_none_or(|status| entry.task.status == status))
            .collect();
        matching.sort_by(|a, b| {
            b.task
                .created_at
                .cmp(&a.task.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        let total_count = matching.len() as u64;
        let tasks = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .map(|entry| entry.task.clone())
            .collect();
        Ok(TaskPage { tasks, total_count })
    }

    /// Backend-driven forward transition.
    pub async fn advance_status(&self, task_id: &str, next: TaskStatus) -> Result<Task> {
        let mut table = self.table.lock().await;
        let entry = table.any(task_id)?.clone();
        let mut task = entry.task;
        ensure_transition(task_id, task.status, next)?;
        if task.status == next {
            return Ok(task);
        }

        let from = task.status;
        task.status = next;
        task.updated_at = Utc::now();
        let task = self.commit(&mut table, task, entry.seq).await?;
        info!(task_id, from = %from, to = %next, "task status advanced");
        Ok(task)
    }

    /// Mark a task `failed` after an unexpected backend error.
    ///
    /// Terminal tasks are returned unchanged.
    pub async fn fail_task(&self, task_id: &str, reason: &str) -> Result<Task> {
        let mut table = self.table.lock().await;
        let entry = table.any(task_id)?.clone();
        if entry.task.is_terminal() {
            return Ok(entry.task);
        }

        let mut task = entry.task;
        task.status = TaskStatus::Failed;
        task.updated_at = Utc::now();
        let task = self.commit(&mut table, task, entry.seq).await?;
        warn!(task_id, reason, "task failed");
        Ok(task)
    }

    /// Persist the table with `task` applied, then make it visible.
    async fn commit(&self, table: &mut TaskTable, task: Task, seq: u64) -> Result<Task> {
        if let Some(storage) = &self.storage {
            let mut snapshot: Vec<(u64, &Task)> = table
                .entries
                .values()
                .filter(|entry| entry.task.id != task.id)
                .map(|entry| (entry.seq, &entry.task))
                .collect();
            snapshot.push((seq, &task));
            snapshot.sort_by_key(|(seq, _)| *seq);
            let tasks: Vec<&Task> = snapshot.into_iter().map(|(_, task)| task).collect();

            storage.save_tasks(&tasks).await.map_err(|err| {
                CardloomError::TransientBackend(format!("persist tasks: {err:#}"))
            })?;
        }

        table.entries.insert(
            task.id.clone(),
            TaskEntry {
                task: task.clone(),
                seq,
            },
        );
        Ok(task)
    }
}

fn ensure_transition(task_id: &str, from: TaskStatus, to: TaskStatus) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CardloomError::Validation(format!(
            "task {task_id} cannot move from {from} to {to}"
        )))
    }
}

/// Polling view of a [`TaskManager`] for one caller.
#[derive(Debug, Clone)]
pub struct LocalTaskSource {
    manager: Arc<TaskManager>,
    owner: String,
}

impl LocalTaskSource {
    pub fn new(manager: Arc<TaskManager>, owner: impl Into<String>) -> Self {
        Self {
            manager,
            owner: owner.into(),
        }
    }
}

#[async_trait]
impl TaskSource for LocalTaskSource {
    async fn fetch_task(&self, task_id: &str) -> Result<Task> {
        self.manager.get_task(&self.owner, task_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardloom_adapter::{FileRef, InputData};
    use rstest::rstest;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn topic_request(topic: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            task_type: "topic".to_string(),
            workflow_type: "direct_generate".to_string(),
            input_data: InputData {
                topic: Some(topic.to_string()),
                ..InputData::default()
            },
        }
    }

    fn status_update(status: &str) -> UpdateTaskRequest {
        UpdateTaskRequest {
            status: Some(status.to_string()),
            input_data: None,
        }
    }

    #[rstest]
    #[case("text", "extract_catalog", InputData { text: Some("Newton's laws".into()), ..InputData::default() })]
    #[case("file", "extract_catalog", InputData { file: Some(FileRef { name: "notes.pdf".into(), mime_type: "application/pdf".into() }), ..InputData::default() })]
    #[case("web", "direct_generate", InputData { web_url: Some("https://en.wikipedia.org/wiki/Enzyme".into()), card_count: Some(12), ..InputData::default() })]
    #[case("topic", "direct_generate", InputData { topic: Some("Baroque music".into()), language: Some("de".into()), ..InputData::default() })]
    #[tokio::test]
    async fn test_create_valid_task_starts_processing(
        #[case] task_type: &str,
        #[case] workflow_type: &str,
        #[case] input_data: InputData,
    ) {
        let manager = TaskManager::new();
        let request = CreateTaskRequest {
            task_type: task_type.to_string(),
            workflow_type: workflow_type.to_string(),
            input_data,
        };

        let task = manager.create_task("user-1", &request).await.unwrap();
        assert_eq!(task.status, TaskStatus::Processing);
        assert_eq!(task.task_type().as_str(), task_type);
        assert_eq!(task.user_id, "user-1");
        assert!(Uuid::parse_str(&task.id).is_ok());
    }

    #[rstest]
    #[case::unknown_task_type("video", "direct_generate")]
    #[case::unknown_workflow("topic", "summarize")]
    #[case::empty_task_type("", "extract_catalog")]
    #[tokio::test]
    async fn test_create_rejects_unknown_kinds(
        #[case] task_type: &str,
        #[case] workflow_type: &str,
    ) {
        let manager = TaskManager::new();
        let request = CreateTaskRequest {
            task_type: task_type.to_string(),
            workflow_type: workflow_type.to_string(),
            ..topic_request("Rust ownership")
        };

        let err = manager.create_task("user-1", &request).await.unwrap_err();
        assert!(matches!(err, CardloomError::Validation(_)));
        assert_eq!(manager.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_input_field() {
        let manager = TaskManager::new();
        let request = CreateTaskRequest {
            task_type: "text".to_string(),
            workflow_type: "extract_catalog".to_string(),
            input_data: InputData {
                topic: Some("wrong field for text".into()),
                ..InputData::default()
            },
        };
        let err = manager.create_task("user-1", &request).await.unwrap_err();
        assert!(matches!(err, CardloomError::Validation(_)));
        assert_eq!(manager.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let manager = TaskManager::new();
        let mut seen = HashSet::new();
        for i in 0..50 {
            let task = manager
                .create_task("user-1", &topic_request(&format!("topic {i}")))
                .await
                .unwrap();
            assert!(seen.insert(task.id));
        }
    }

    #[tokio::test]
    async fn test_get_task_checks_owner() {
        let manager = TaskManager::new();
        let task = manager.create_task("alice", &topic_request("Optics")).await.unwrap();

        assert_eq!(manager.get_task("alice", &task.id).await.unwrap(), task);
        assert!(matches!(
            manager.get_task("bob", &task.id).await,
            Err(CardloomError::Authorization(_))
        ));
        assert!(matches!(
            manager.get_task("alice", "no-such-task").await,
            Err(CardloomError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_requires_a_field() {
        let manager = TaskManager::new();
        let task = manager.create_task("user-1", &topic_request("Tides")).await.unwrap();

        let err = manager
            .update_task("user-1", &task.id, &UpdateTaskRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CardloomError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_status() {
        let manager = TaskManager::new();
        let task = manager.create_task("user-1", &topic_request("Tides")).await.unwrap();

        let err = manager
            .update_task("user-1", &task.id, &status_update("paused"))
            .await
            .unwrap_err();
        assert!(matches!(err, CardloomError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_foreign_task() {
        let manager = TaskManager::new();
        let task = manager.create_task("alice", &topic_request("Tides")).await.unwrap();

        let err = manager
            .update_task("mallory", &task.id, &status_update("completed"))
            .await
            .unwrap_err();
        assert!(matches!(err, CardloomError::Authorization(_)));
        assert_eq!(
            manager.get_task("alice", &task.id).await.unwrap().status,
            TaskStatus::Processing
        );
    }

    #[tokio::test]
    async fn test_update_moves_forward_and_rejects_regression() {
        let manager = TaskManager::new();
        let task = manager.create_task("user-1", &topic_request("Volcanoes")).await.unwrap();

        let updated = manager
            .update_task("user-1", &task.id, &status_update("catalog_ready"))
            .await
            .unwrap();
        assert_eq!(updated.status, TaskStatus::CatalogReady);
        assert!(updated.updated_at >= task.updated_at);

        let err = manager
            .update_task("user-1", &task.id, &status_update("ai_processing"))
            .await
            .unwrap_err();
        assert!(matches!(err, CardloomError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_revalidates_input() {
        let manager = TaskManager::new();
        let task = manager.create_task("user-1", &topic_request("Volcanoes")).await.unwrap();

        let request = UpdateTaskRequest {
            status: None,
            input_data: Some(InputData {
                topic: Some("Plate tectonics".into()),
                card_count: Some(25),
                ..InputData::default()
            }),
        };
        let updated = manager.update_task("user-1", &task.id, &request).await.unwrap();
        assert_eq!(updated.input.options().card_count, Some(25));

        let bad = UpdateTaskRequest {
            status: None,
            input_data: Some(InputData::default()),
        };
        assert!(matches!(
            manager.update_task("user-1", &task.id, &bad).await,
            Err(CardloomError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_task_is_terminal() {
        let manager = TaskManager::new();
        let task = manager.create_task("user-1", &topic_request("Glaciers")).await.unwrap();
        manager.fail_task(&task.id, "model crashed").await.unwrap();

        for status in TaskStatus::ALL {
            let _ = manager
                .update_task("user-1", &task.id, &status_update(status.as_str()))
                .await;
            assert_eq!(
                manager.get_task("user-1", &task.id).await.unwrap().status,
                TaskStatus::Failed
            );
        }
        assert!(manager.advance_status(&task.id, TaskStatus::Completed).await.is_err());
    }

    #[tokio::test]
    async fn test_fail_task_keeps_completed() {
        let manager = TaskManager::new();
        let task = manager.create_task("user-1", &topic_request("Glaciers")).await.unwrap();
        manager.advance_status(&task.id, TaskStatus::Completed).await.unwrap();

        let after = manager.fail_task(&task.id, "late error").await.unwrap();
        assert_eq!(after.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_list_completed_newest_first_with_total() {
        let manager = TaskManager::new();
        let mut completed = Vec::new();
        for i in 0..5 {
            let task = manager
                .create_task("user-1", &topic_request(&format!("topic {i}")))
                .await
                .unwrap();
            if i % 2 == 0 {
                manager.advance_status(&task.id, TaskStatus::Completed).await.unwrap();
                completed.push(task.id);
            } else {
                manager.fail_task(&task.id, "quota").await.unwrap();
            }
        }
        manager.create_task("someone-else", &topic_request("noise")).await.unwrap();

        let query = ListTasksQuery {
            limit: 1,
            ..ListTasksQuery::with_status(TaskStatus::Completed)
        };
        let page = manager.list_tasks("user-1", &query).await.unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.tasks.len(), 1);
        assert_eq!(Some(&page.tasks[0].id), completed.last());
    }

    #[tokio::test]
    async fn test_list_defaults_and_offset() {
        let manager = TaskManager::new();
        let mut ids = Vec::new();
        for i in 0..25 {
            let task = manager
                .create_task("user-1", &topic_request(&format!("topic {i}")))
                .await
                .unwrap();
            ids.push(task.id);
        }
        ids.reverse();

        let first = manager.list_tasks("user-1", &ListTasksQuery::default()).await.unwrap();
        assert_eq!(first.total_count, 25);
        assert_eq!(first.tasks.len(), 20);
        assert_eq!(first.tasks[0].id, ids[0]);

        let rest = manager
            .list_tasks(
                "user-1",
                &ListTasksQuery {
                    offset: 20,
                    ..ListTasksQuery::default()
                },
            )
            .await
            .unwrap();
        let rest_ids: Vec<_> = rest.tasks.into_iter().map(|task| task.id).collect();
        assert_eq!(rest_ids, ids[20..].to_vec());
    }

    #[tokio::test]
    async fn test_storage_roundtrip() {
        let tmp_dir = TempDir::new().unwrap();
        let storage = TaskStorage::in_dir(tmp_dir.path()).await.unwrap();

        let created = {
            let manager = TaskManager::with_storage(storage.clone()).await.unwrap();
            let task = manager.create_task("user-1", &topic_request("Saturn")).await.unwrap();
            manager.advance_status(&task.id, TaskStatus::GeneratingCards).await.unwrap()
        };

        let reopened = TaskManager::with_storage(storage).await.unwrap();
        let loaded = reopened.get_task("user-1", &created.id).await.unwrap();
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn test_local_source_is_scoped_to_owner() {
        let manager = Arc::new(TaskManager::new());
        let task = manager.create_task("alice", &topic_request("Comets")).await.unwrap();

        let alice = LocalTaskSource::new(manager.clone(), "alice");
        let bob = LocalTaskSource::new(manager, "bob");
        assert_eq!(alice.fetch_task(&task.id).await.unwrap().id, task.id);
        assert!(bob.fetch_task(&task.id).await.is_err());
    }
}
