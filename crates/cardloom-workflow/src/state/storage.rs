/*
[INPUT]:  Task snapshots from TaskManager, JSON file path
[OUTPUT]: Durable tasks.json with atomic replace-on-write
[POS]:    Persistence layer - local task journal for the lifecycle manager
[UPDATE]: When the persisted task format or location changes
*/

use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use cardloom_adapter::Task;

const DATA_DIR_NAME: &str = "cardloom";
const TASKS_FILE_NAME: &str = "tasks.json";

/// JSON-file storage for tasks
#[derive(Debug, Clone)]
pub struct TaskStorage {
    tasks_path: PathBuf,
}

impl TaskStorage {
    /// Storage rooted at the platform data directory
    pub async fn new() -> Result<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?
            .join(DATA_DIR_NAME);
        Self::in_dir(&data_dir).await
    }

    /// Storage rooted at an explicit directory (created if missing)
    pub async fn in_dir(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("create data dir {}", dir.display()))?;
        Ok(Self {
            tasks_path: dir.join(TASKS_FILE_NAME),
        })
    }

    pub fn path(&self) -> &Path {
        &self.tasks_path
    }

    /// Load tasks in the order they were saved; missing file means no tasks
    pub async fn load_tasks(&self) -> Result<Vec<Task>> {
        if !fs::try_exists(&self.tasks_path).await? {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.tasks_path).await?;
        let tasks: Vec<Task> = serde_json::from_str(&content)
            .with_context(|| format!("parse {}", self.tasks_path.display()))?;
        debug!(path = %self.tasks_path.display(), count = tasks.len(), "tasks loaded");
        Ok(tasks)
    }

    pub async fn save_tasks(&self, tasks: &[&Task]) -> Result<()> {
        let content = serde_json::to_string_pretty(tasks)?;

        // Atomic write: write to temp file then rename
        let temp_path = self.tasks_path.with_extension("tmp");
        fs::write(&temp_path, content).await?;
        fs::rename(&temp_path, &self.tasks_path).await?;
        Ok(())
    }
}
