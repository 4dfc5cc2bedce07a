/*
[INPUT]:  Task resource schema (task_type, workflow_type, status)
[OUTPUT]: Typed Rust enums with serialization, parsing, and lifecycle ordering
[POS]:    Data layer - enumerated values shared by client and lifecycle manager
[UPDATE]: When the backend adds task kinds or lifecycle states
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::http::CardloomError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Text,
    File,
    Web,
    Topic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    ExtractCatalog,
    DirectGenerate,
}

/// Lifecycle status of a generation task.
///
/// Variants are declared in lifecycle order. `Failed` sits outside that order:
/// it can be entered from any non-terminal state and never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Processing,
    AiProcessing,
    FileUploading,
    GeneratingCatalog,
    CatalogReady,
    GeneratingCards,
    Completed,
    Failed,
}

impl TaskType {
    pub const ALL: [TaskType; 4] = [Self::Text, Self::File, Self::Web, Self::Topic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
            Self::Web => "web",
            Self::Topic => "topic",
        }
    }
}

impl WorkflowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtractCatalog => "extract_catalog",
            Self::DirectGenerate => "direct_generate",
        }
    }
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 8] = [
        Self::Processing,
        Self::AiProcessing,
        Self::FileUploading,
        Self::GeneratingCatalog,
        Self::CatalogReady,
        Self::GeneratingCards,
        Self::Completed,
        Self::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::AiProcessing => "ai_processing",
            Self::FileUploading => "file_uploading",
            Self::GeneratingCatalog => "generating_catalog",
            Self::CatalogReady => "catalog_ready",
            Self::GeneratingCards => "generating_cards",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// `completed` and `failed` are terminal: nothing moves a task out of them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Position in the lifecycle order, `None` for `failed`.
    fn rank(&self) -> Option<u8> {
        match self {
            Self::Processing => Some(0),
            Self::AiProcessing => Some(1),
            Self::FileUploading => Some(2),
            Self::GeneratingCatalog => Some(3),
            Self::CatalogReady => Some(4),
            Self::GeneratingCards => Some(5),
            Self::Completed => Some(6),
            Self::Failed => None,
        }
    }

    /// Whether the task has moved beyond `target` in the lifecycle order, so
    /// `target` can no longer be observed. Always false for `failed`.
    pub fn has_passed(&self, target: TaskStatus) -> bool {
        matches!((self.rank(), target.rank()), (Some(now), Some(target)) if now > target)
    }

    /// Whether `self -> next` is a legal transition.
    ///
    /// Forward moves may skip states (a direct_generate task never visits the
    /// catalog states). Staying put is allowed so repeated writes are no-ops.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        if *self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(from), Some(to)) => to > from,
            (None, Some(_)) => false,
        }
    }
}

macro_rules! impl_text_enum {
    ($ty:ty, $label:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = CardloomError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                serde_json::from_value(serde_json::Value::String(value.to_string())).map_err(
                    |_| CardloomError::Validation(format!("unknown {}: {value:?}", $label)),
                )
            }
        }
    };
}

impl_text_enum!(TaskType, "task_type");
impl_text_enum!(WorkflowType, "workflow_type");
impl_text_enum!(TaskStatus, "status");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display() {
        for status in TaskStatus::ALL {
            let parsed: TaskStatus = status.as_str().parse().expect("parse status");
            assert_eq!(parsed, status);
            assert_eq!(status.to_string(), status.as_str());
        }
        assert!(matches!(
            "done".parse::<TaskStatus>(),
            Err(CardloomError::Validation(_))
        ));
    }

    #[test]
    fn test_task_type_rejects_unknown() {
        assert_eq!("topic".parse::<TaskType>().unwrap(), TaskType::Topic);
        assert!("video".parse::<TaskType>().is_err());
        assert!("Text".parse::<TaskType>().is_err());
    }

    #[test]
    fn test_workflow_type_serde_names() {
        let json = serde_json::to_string(&WorkflowType::ExtractCatalog).unwrap();
        assert_eq!(json, "\"extract_catalog\"");
        assert_eq!(
            "direct_generate".parse::<WorkflowType>().unwrap(),
            WorkflowType::DirectGenerate
        );
    }

    #[test]
    fn test_forward_transitions_only() {
        use TaskStatus::*;
        assert!(Processing.can_transition_to(CatalogReady));
        assert!(CatalogReady.can_transition_to(GeneratingCards));
        assert!(Processing.can_transition_to(Completed));
        assert!(!CatalogReady.can_transition_to(Processing));
        assert!(!GeneratingCards.can_transition_to(GeneratingCatalog));
        assert!(GeneratingCards.can_transition_to(GeneratingCards));
    }

    #[test]
    fn test_has_passed_follows_lifecycle_order() {
        use TaskStatus::*;
        assert!(GeneratingCards.has_passed(AiProcessing));
        assert!(GeneratingCards.has_passed(CatalogReady));
        assert!(!CatalogReady.has_passed(CatalogReady));
        assert!(!Processing.has_passed(CatalogReady));
        assert!(!Failed.has_passed(Processing));
        assert!(!Completed.has_passed(Failed));
    }

    #[test]
    fn test_failed_is_absorbing() {
        for status in TaskStatus::ALL {
            if status != TaskStatus::Failed {
                assert!(!TaskStatus::Failed.can_transition_to(status));
            }
        }
        assert!(TaskStatus::AiProcessing.can_transition_to(TaskStatus::Failed));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Failed));
    }
}
