/*
[INPUT]:  Client-side task submissions, updates, and list queries
[OUTPUT]: Typed request structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::enums::TaskStatus;
use super::models::InputData;

pub const DEFAULT_LIST_LIMIT: u32 = 20;

/// Task submission body.
///
/// `task_type` and `workflow_type` stay raw strings so unknown values reach
/// validation instead of failing inside serde.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub task_type: String,
    pub workflow_type: String,
    #[serde(default)]
    pub input_data: InputData,
}

/// Partial task update. At least one field must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_data: Option<InputData>,
}

impl UpdateTaskRequest {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.input_data.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

impl Default for ListTasksQuery {
    fn default() -> Self {
        Self {
            status: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl ListTasksQuery {
    pub fn with_status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

fn default_limit() -> u32 {
    DEFAULT_LIST_LIMIT
}

/// Body of the generation request: the flat selection export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateCardsRequest {
    pub selected_ids: Vec<String>,
}
