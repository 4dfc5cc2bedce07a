/*
[INPUT]:  CardloomApi backend, task submission, caller's outline selection, CancellationToken
[OUTPUT]: Completed task with its flashcards, or the error that stopped the journey
[POS]:    Workflow layer - submit, wait for outline, select, generate, wait for cards
[UPDATE]: When the generation journey gains or reorders steps
*/

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cardloom_adapter::{
    CardloomApi, CardloomError, CreateTaskRequest, Flashcard, Result, Task, TaskStatus,
    WorkflowType,
};

use crate::catalog::{CatalogTree, SelectionState, load_catalog};
use crate::poller::{PollConfig, PollOutcome, TaskPoller};
use crate::task::validate_create_request;

/// Outline loaded for one `catalog_ready` task, plus the user's working selection.
///
/// The tree is never refreshed; a new session is loaded if the outline changes.
#[derive(Debug, Clone)]
pub struct CatalogSession {
    pub task: Task,
    pub tree: CatalogTree,
    pub selection: SelectionState,
}

impl CatalogSession {
    pub fn selected_ids(&self) -> Vec<String> {
        self.tree.export_selected_ids(&self.selection)
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub task: Task,
    /// Empty for `direct_generate` tasks
    pub selected_ids: Vec<String>,
    pub flashcards: Vec<Flashcard>,
}

pub struct GenerationWorkflow<A> {
    api: A,
    poller: TaskPoller,
}

impl<A: CardloomApi> GenerationWorkflow<A> {
    pub fn new(api: A, config: PollConfig) -> Self {
        Self {
            api,
            poller: TaskPoller::new(config),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn poller(&self) -> &TaskPoller {
        &self.poller
    }

    /// Validate locally, then create the task remotely.
    pub async fn submit(&self, request: &CreateTaskRequest) -> Result<Task> {
        validate_create_request(request)?;
        let task = self.api.create_task(request).await?;
        info!(
            task_id = %task.id,
            task_type = %task.task_type(),
            workflow_type = %task.workflow_type,
            "task submitted"
        );
        Ok(task)
    }

    /// Wait until the outline has been extracted.
    pub async fn await_catalog(&self, task_id: &str, cancel: &CancellationToken) -> Result<Task> {
        let outcome = self
            .poller
            .poll_until(&self.api, task_id, TaskStatus::CatalogReady, cancel)
            .await?;
        match self.settle(task_id, outcome)? {
            task if task.status == TaskStatus::CatalogReady => Ok(task),
            task => Err(CardloomError::InvalidResponse(format!(
                "task {} reached {} without an outline",
                task.id, task.status
            ))),
        }
    }

    /// Fetch the outline and start from a full selection.
    pub async fn load_selection(&self, task: &Task) -> Result<CatalogSession> {
        if task.status != TaskStatus::CatalogReady {
            return Err(CardloomError::Validation(format!(
                "task {} has no outline yet (status {})",
                task.id, task.status
            )));
        }
        let chapters = self.api.fetch_catalog(&task.id).await?;
        let (tree, selection) = load_catalog(&chapters)?;
        info!(task_id = %task.id, nodes = tree.len(), "outline loaded");
        Ok(CatalogSession {
            task: task.clone(),
            tree,
            selection,
        })
    }

    /// Send the exported selection and resume the task.
    pub async fn start_generation(&self, session: &CatalogSession) -> Result<Task> {
        let selected_ids = session.selected_ids();
        if selected_ids.is_empty() {
            return Err(CardloomError::Validation(
                "select at least one outline node".to_string(),
            ));
        }
        info!(task_id = %session.task.id, selected = selected_ids.len(), "starting generation");
        self.api.start_generation(&session.task.id, selected_ids).await
    }

    /// Wait for `completed`; a `failed` task is reported as a backend failure.
    pub async fn await_completion(
        &self,
        task_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Task> {
        let outcome = self
            .poller
            .poll_until_terminal(&self.api, task_id, cancel)
            .await?;
        self.settle(task_id, outcome)
    }

    /// Run the whole journey. `choose` edits the default full selection and
    /// may reject it.
    pub async fn run<F>(
        &self,
        request: &CreateTaskRequest,
        cancel: &CancellationToken,
        choose: F,
    ) -> Result<WorkflowReport>
    where
        F: FnOnce(&CatalogTree, SelectionState) -> Result<SelectionState>,
    {
        let submitted = self.submit(request).await?;

        let (task, selected_ids) = match submitted.workflow_type {
            WorkflowType::DirectGenerate => {
                let task = self.await_completion(&submitted.id, cancel).await?;
                (task, Vec::new())
            }
            WorkflowType::ExtractCatalog => {
                let ready = self.await_catalog(&submitted.id, cancel).await?;
                let mut session = self.load_selection(&ready).await?;
                session.selection = choose(&session.tree, session.selection)?;
                let selected_ids = session.selected_ids();
                self.start_generation(&session).await?;
                let task = self.await_completion(&submitted.id, cancel).await?;
                (task, selected_ids)
            }
        };

        let flashcards = self.api.list_flashcards(&task.id).await?;
        info!(task_id = %task.id, cards = flashcards.len(), "workflow finished");
        Ok(WorkflowReport {
            task,
            selected_ids,
            flashcards,
        })
    }

    fn settle(&self, task_id: &str, outcome: PollOutcome) -> Result<Task> {
        match outcome {
            PollOutcome::Reached(task) => Ok(task),
            PollOutcome::Terminal(task) if task.status == TaskStatus::Failed => {
                warn!(task_id, "task failed; submit a new task to retry");
                Err(CardloomError::TransientBackend(format!("task {task_id} failed")))
            }
            PollOutcome::Terminal(task) | PollOutcome::Passed(task) => Ok(task),
            PollOutcome::Cancelled { .. } => {
                Err(CardloomError::Cancelled(format!("polling task {task_id}")))
            }
            PollOutcome::TimedOut { .. } => Err(CardloomError::Timeout {
                duration: self
                    .poller
                    .config()
                    .max_duration
                    .map(|limit| limit.as_secs())
                    .unwrap_or_default(),
            }),
        }
    }
}
