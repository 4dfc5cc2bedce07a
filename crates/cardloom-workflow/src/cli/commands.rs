/*
[INPUT]:  Parsed subcommand, AppConfig, shutdown CancellationToken
[OUTPUT]: Remote task operations with terminal output and local journal updates
[POS]:    CLI command layer - one handler per subcommand
[UPDATE]: When adding subcommands or changing their output
*/

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Args, Subcommand};
use console::style;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cardloom_adapter::{
    CardloomApi, CardloomClient, CardloomError, CreateTaskRequest, FileRef, InputData,
    ListTasksQuery, Task, TaskSource, TaskStatus, TaskType, WorkflowType,
};
use cardloom_workflow::{AppConfig, GenerationWorkflow, PollOutcome, TaskStorage};

use super::{render, select};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a configuration file interactively
    Init {
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Create a flashcard task
    Submit(SubmitArgs),
    /// Show one task
    Status { task_id: String },
    /// List your tasks, newest first
    List {
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long, default_value_t = cardloom_adapter::DEFAULT_LIST_LIMIT)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Follow a task until it finishes (or reaches --until)
    Watch {
        task_id: String,
        #[arg(long)]
        until: Option<TaskStatus>,
    },
    /// Show the outline of a catalog_ready task
    Catalog { task_id: String },
    /// Choose outline nodes and start flashcard generation
    Generate {
        task_id: String,
        /// Leave these node ids (and everything under them) out
        #[arg(long = "exclude", value_name = "NODE_ID")]
        exclude: Vec<String>,
        /// Pick nodes with a checkbox prompt
        #[arg(long, conflicts_with = "exclude")]
        interactive: bool,
        /// Return right after generation starts
        #[arg(long)]
        no_wait: bool,
    },
    /// Tasks seen by this machine, from the local journal
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct SubmitArgs {
    /// text | file | web | topic
    #[arg(long = "type", value_name = "TYPE")]
    pub task_type: String,
    /// extract_catalog | direct_generate
    #[arg(long = "workflow", default_value = "extract_catalog")]
    pub workflow_type: String,
    #[arg(long)]
    pub text: Option<String>,
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,
    #[arg(long)]
    pub topic: Option<String>,
    #[arg(long)]
    pub language: Option<String>,
    #[arg(long = "cards")]
    pub card_count: Option<u32>,
    /// Wait for the flashcards, selecting the whole outline minus --exclude
    #[arg(long)]
    pub wait: bool,
    #[arg(long = "exclude", value_name = "NODE_ID", requires = "wait")]
    pub exclude: Vec<String>,
}

impl SubmitArgs {
    pub fn to_request(&self) -> CreateTaskRequest {
        CreateTaskRequest {
            task_type: self.task_type.clone(),
            workflow_type: self.workflow_type.clone(),
            input_data: InputData {
                text: self.text.clone(),
                file: self.file.as_deref().map(file_ref),
                web_url: self.url.clone(),
                topic: self.topic.clone(),
                language: self.language.clone(),
                card_count: self.card_count,
            },
        }
    }
}

fn file_ref(path: &Path) -> FileRef {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime_type = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("pptx") => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    };
    FileRef {
        name,
        mime_type: mime_type.to_string(),
    }
}

/// Local record of task snapshots this CLI has observed
struct Journal {
    storage: Option<TaskStorage>,
}

impl Journal {
    async fn open(config: &AppConfig) -> Self {
        let storage = match &config.data_dir {
            Some(dir) => TaskStorage::in_dir(dir).await,
            None => TaskStorage::new().await,
        };
        match storage {
            Ok(storage) => Self {
                storage: Some(storage),
            },
            Err(err) => {
                warn!(error = %err, "task journal unavailable");
                Self { storage: None }
            }
        }
    }

    async fn record(&self, tasks: &[&Task]) {
        let Some(storage) = &self.storage else {
            return;
        };
        if let Err(err) = Self::merge(storage, tasks).await {
            warn!(error = %err, path = %storage.path().display(), "failed to update task journal");
        }
    }

    async fn merge(storage: &TaskStorage, tasks: &[&Task]) -> Result<()> {
        let mut known = storage.load_tasks().await?;
        for task in tasks {
            match known.iter_mut().find(|existing| existing.id == task.id) {
                Some(existing) => *existing = (*task).clone(),
                None => known.push((*task).clone()),
            }
        }
        let refs: Vec<&Task> = known.iter().collect();
        storage.save_tasks(&refs).await?;
        debug!(count = refs.len(), "task journal updated");
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Task>> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| anyhow!("task journal unavailable"))?;
        let mut tasks = storage.load_tasks().await?;
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks.truncate(limit);
        Ok(tasks)
    }
}

pub fn build_client(config: &AppConfig) -> Result<CardloomClient> {
    let mut client =
        CardloomClient::with_config_and_base_url(config.api.client_config(), &config.api.base_url)
            .context("create API client")?;
    client.set_credentials(config.api.credentials());
    Ok(client)
}

pub async fn execute(
    command: Command,
    config: &AppConfig,
    cancel: CancellationToken,
) -> Result<()> {
    let workflow = GenerationWorkflow::new(build_client(config)?, config.polling.poll_config());
    let journal = Journal::open(config).await;

    match command {
        Command::Init { .. } => Err(anyhow!("init does not need an existing configuration")),
        Command::Submit(args) => submit(&workflow, &journal, &args, &cancel).await,
        Command::Status { task_id } => {
            let task = workflow.api().fetch_task(&task_id).await.context("fetch task")?;
            journal.record(&[&task]).await;
            println!("{}", render::task_detail(&task));
            Ok(())
        }
        Command::List {
            status,
            limit,
            offset,
        } => {
            let query = ListTasksQuery {
                status,
                limit,
                offset,
            };
            let page = workflow.api().list_tasks(&query).await.context("list tasks")?;
            journal.record(&page.tasks.iter().collect::<Vec<_>>()).await;
            for line in render::task_page(&page, offset) {
                println!("{line}");
            }
            Ok(())
        }
        Command::Watch { task_id, until } => {
            let task = watch(&workflow, &task_id, until, &cancel).await?;
            journal.record(&[&task]).await;
            Ok(())
        }
        Command::Catalog { task_id } => {
            let task = workflow.api().fetch_task(&task_id).await.context("fetch task")?;
            let session = workflow.load_selection(&task).await.context("load outline")?;
            for line in render::catalog_lines(&session.tree, &session.selection)? {
                println!("{line}");
            }
            Ok(())
        }
        Command::Generate {
            task_id,
            exclude,
            interactive,
            no_wait,
        } => {
            let task = workflow.api().fetch_task(&task_id).await.context("fetch task")?;
            let mut session = workflow.load_selection(&task).await.context("load outline")?;
            session.selection = if interactive {
                select::pick(&session.tree, session.selection)?
            } else {
                select::exclude(&session.tree, session.selection, &exclude)?
            };

            let started = workflow
                .start_generation(&session)
                .await
                .context("start generation")?;
            journal.record(&[&started]).await;
            println!(
                "generation started for {} outline nodes",
                session.selected_ids().len()
            );
            if no_wait {
                return Ok(());
            }

            let done = wait_for_cards(&workflow, &task_id, &cancel).await?;
            journal.record(&[&done]).await;
            Ok(())
        }
        Command::History { limit } => {
            for task in journal.recent(limit).await? {
                println!("{}", render::task_line(&task));
            }
            Ok(())
        }
    }
}

async fn submit<A: CardloomApi>(
    workflow: &GenerationWorkflow<A>,
    journal: &Journal,
    args: &SubmitArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let request = args.to_request();

    if args.wait {
        let exclude = args.exclude.clone();
        let report = workflow
            .run(&request, cancel, |tree, selection| {
                select::exclude(tree, selection, &exclude)
            })
            .await
            .context("run generation workflow")?;
        journal.record(&[&report.task]).await;
        println!("{}", render::task_detail(&report.task));
        for line in render::flashcard_lines(&report.flashcards) {
            println!("{line}");
        }
        return Ok(());
    }

    let task = workflow.submit(&request).await.context("submit task")?;
    journal.record(&[&task]).await;
    println!("{}", task.id);
    info!(task_id = %task.id, "submitted; follow with `cardloom watch {}`", task.id);
    Ok(())
}

async fn watch<A: CardloomApi>(
    workflow: &GenerationWorkflow<A>,
    task_id: &str,
    until: Option<TaskStatus>,
    cancel: &CancellationToken,
) -> Result<Task> {
    let mut updates = workflow.poller().subscribe();
    let poll = async {
        match until {
            Some(target) => {
                workflow
                    .poller()
                    .poll_until(workflow.api(), task_id, target, cancel)
                    .await
            }
            None => {
                workflow
                    .poller()
                    .poll_until_terminal(workflow.api(), task_id, cancel)
                    .await
            }
        }
    };
    tokio::pin!(poll);

    let mut last_status = None;
    let mut print_update = |snapshot: Option<Task>| {
        if let Some(task) = snapshot {
            if last_status != Some(task.status) {
                println!("{}", render::task_line(&task));
                last_status = Some(task.status);
            }
        }
    };

    let outcome = loop {
        tokio::select! {
            biased;
            outcome = &mut poll => break outcome,
            changed = updates.changed() => {
                if changed.is_err() {
                    break poll.await;
                }
                print_update(updates.borrow_and_update().clone());
            }
        }
    };
    if updates.has_changed().unwrap_or(false) {
        print_update(updates.borrow_and_update().clone());
    }

    match outcome.context("poll task")? {
        PollOutcome::Reached(task) | PollOutcome::Terminal(task) => Ok(task),
        PollOutcome::Passed(task) => {
            if let Some(target) = until {
                let note = format!("task went past {target} without stopping there");
                println!("{}", style(note).dim());
            }
            Ok(task)
        }
        PollOutcome::Cancelled { last } => {
            println!("{}", style("stopped watching").dim());
            last.ok_or_else(|| anyhow!(CardloomError::Cancelled(task_id.to_string())))
        }
        PollOutcome::TimedOut { .. } => Err(anyhow!("gave up waiting for task {task_id}")),
    }
}

async fn wait_for_cards<A: CardloomApi>(
    workflow: &GenerationWorkflow<A>,
    task_id: &str,
    cancel: &CancellationToken,
) -> Result<Task> {
    let task = workflow
        .await_completion(task_id, cancel)
        .await
        .context("wait for flashcards")?;
    let cards = workflow
        .api()
        .list_flashcards(task_id)
        .await
        .context("list flashcards")?;
    println!("{}", style(format!("{} flashcards", cards.len())).bold().green());
    for line in render::flashcard_lines(&cards) {
        println!("{line}");
    }
    Ok(task)
}

/// Reject the submission before any network call.
pub fn precheck(args: &SubmitArgs) -> Result<(TaskType, WorkflowType)> {
    let validated = cardloom_workflow::validate_create_request(&args.to_request())?;
    Ok((validated.input.task_type(), validated.workflow_type))
}
