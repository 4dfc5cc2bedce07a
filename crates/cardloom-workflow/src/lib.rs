/*
[INPUT]:  Public API exports for cardloom-workflow crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod catalog;
pub mod config;
pub mod poller;
pub mod state;
pub mod task;
pub mod workflow;

// Re-export main types for convenience
pub use catalog::{CatalogEntry, CatalogTree, CheckState, NodeKind, SelectionState, load_catalog};
pub use config::AppConfig;
pub use poller::{PollConfig, PollOutcome, TaskPoller};
pub use state::TaskStorage;
pub use task::{LocalTaskSource, TaskManager, ValidatedSubmission, validate_create_request};
pub use workflow::{CatalogSession, GenerationWorkflow, WorkflowReport};
