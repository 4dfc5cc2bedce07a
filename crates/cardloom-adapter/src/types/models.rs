/*
[INPUT]:  Task and catalog resource schemas, serde requirements
[OUTPUT]: Typed task/catalog/flashcard models with validated input payloads
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::enums::{TaskStatus, TaskType, WorkflowType};
use crate::http::{CardloomError, Result};

/// Uploaded file reference carried by `file` tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Raw `input_data` object as it travels over the wire.
///
/// Every field is optional here; which ones are required depends on the
/// task type and is checked by [`TaskInput::from_input_data`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_count: Option<u32>,
}

/// Options shared by every task type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOptions {
    pub language: Option<String>,
    pub card_count: Option<u32>,
}

/// Validated task input, one variant per task type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskInput {
    Text {
        text: String,
        options: GenerationOptions,
    },
    File {
        file: FileRef,
        options: GenerationOptions,
    },
    Web {
        web_url: Url,
        options: GenerationOptions,
    },
    Topic {
        topic: String,
        options: GenerationOptions,
    },
}

impl TaskInput {
    /// Validate a raw payload against the fields `task_type` requires.
    ///
    /// Fields that belong to other task types are ignored.
    pub fn from_input_data(task_type: TaskType, data: &InputData) -> Result<Self> {
        let options = GenerationOptions {
            language: data
                .language
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            card_count: match data.card_count {
                Some(0) => {
                    return Err(CardloomError::Validation(
                        "input_data.card_count must be at least 1".to_string(),
                    ));
                }
                other => other,
            },
        };

        let input = match task_type {
            TaskType::Text => TaskInput::Text {
                text: required(data.text.as_deref(), "text")?,
                options,
            },
            TaskType::File => {
                let file = data.file.as_ref().ok_or_else(|| missing("file"))?;
                TaskInput::File {
                    file: FileRef {
                        name: required(Some(file.name.as_str()), "file.name")?,
                        mime_type: required(Some(file.mime_type.as_str()), "file.type")?,
                    },
                    options,
                }
            }
            TaskType::Web => {
                let raw = required(data.web_url.as_deref(), "web_url")?;
                let web_url = Url::parse(&raw).map_err(|err| {
                    CardloomError::Validation(format!("input_data.web_url is invalid: {err}"))
                })?;
                if !matches!(web_url.scheme(), "http" | "https") {
                    return Err(CardloomError::Validation(format!(
                        "input_data.web_url must use http or https, got {}",
                        web_url.scheme()
                    )));
                }
                TaskInput::Web { web_url, options }
            }
            TaskType::Topic => TaskInput::Topic {
                topic: required(data.topic.as_deref(), "topic")?,
                options,
            },
        };
        Ok(input)
    }

    pub fn task_type(&self) -> TaskType {
        match self {
            TaskInput::Text { .. } => TaskType::Text,
            TaskInput::File { .. } => TaskType::File,
            TaskInput::Web { .. } => TaskType::Web,
            TaskInput::Topic { .. } => TaskType::Topic,
        }
    }

    pub fn options(&self) -> &GenerationOptions {
        match self {
            TaskInput::Text { options, .. }
            | TaskInput::File { options, .. }
            | TaskInput::Web { options, .. }
            | TaskInput::Topic { options, .. } => options,
        }
    }

    pub fn to_input_data(&self) -> InputData {
        let options = self.options();
        let mut data = InputData {
            language: options.language.clone(),
            card_count: options.card_count,
            ..InputData::default()
        };
        match self {
            TaskInput::Text { text, .. } => data.text = Some(text.clone()),
            TaskInput::File { file, .. } => data.file = Some(file.clone()),
            TaskInput::Web { web_url, .. } => data.web_url = Some(web_url.to_string()),
            TaskInput::Topic { topic, .. } => data.topic = Some(topic.clone()),
        }
        data
    }
}

fn missing(field: &str) -> CardloomError {
    CardloomError::Validation(format!("input_data.{field} is required"))
}

fn required(value: Option<&str>, field: &str) -> Result<String> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(missing(field)),
    }
}

/// Task resource exactly as the backend serializes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub task_type: TaskType,
    pub workflow_type: WorkflowType,
    #[serde(default)]
    pub input_data: InputData,
    pub status: TaskStatus,
}

/// One flashcard generation job.
///
/// Serializes to and from [`TaskRecord`]; deserialization validates the
/// input payload against the task type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord", into = "TaskRecord")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub workflow_type: WorkflowType,
    pub input: TaskInput,
    pub status: TaskStatus,
}

impl Task {
    pub fn task_type(&self) -> TaskType {
        self.input.task_type()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl TryFrom<TaskRecord> for Task {
    type Error = CardloomError;

    fn try_from(record: TaskRecord) -> Result<Self> {
        let input = TaskInput::from_input_data(record.task_type, &record.input_data)?;
        Ok(Self {
            id: record.id,
            user_id: record.user_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            workflow_type: record.workflow_type,
            input,
            status: record.status,
        })
    }
}

impl From<Task> for TaskRecord {
    fn from(task: Task) -> Self {
        Self {
            task_type: task.task_type(),
            input_data: task.input.to_input_data(),
            id: task.id,
            user_id: task.user_id,
            created_at: task.created_at,
            updated_at: task.updated_at,
            workflow_type: task.workflow_type,
            status: task.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub chapter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsections: Vec<Subsection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subsection {
    pub id: String,
    pub subsection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Borrowed view over any level of the outline tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogNode<'a> {
    Chapter(&'a Chapter),
    Section(&'a Section),
    Subsection(&'a Subsection),
}

impl<'a> CatalogNode<'a> {
    pub fn id(&self) -> &'a str {
        match *self {
            CatalogNode::Chapter(node) => &node.id,
            CatalogNode::Section(node) => &node.id,
            CatalogNode::Subsection(node) => &node.id,
        }
    }

    pub fn title(&self) -> &'a str {
        match *self {
            CatalogNode::Chapter(node) => &node.chapter,
            CatalogNode::Section(node) => &node.section,
            CatalogNode::Subsection(node) => &node.subsection,
        }
    }

    pub fn description(&self) -> Option<&'a str> {
        match *self {
            CatalogNode::Chapter(node) => node.description.as_deref(),
            CatalogNode::Section(node) => node.description.as_deref(),
            CatalogNode::Subsection(node) => node.description.as_deref(),
        }
    }

    pub fn children(&self) -> Vec<CatalogNode<'a>> {
        match *self {
            CatalogNode::Chapter(node) => node.sections.iter().map(CatalogNode::Section).collect(),
            CatalogNode::Section(node) => node
                .subsections
                .iter()
                .map(CatalogNode::Subsection)
                .collect(),
            CatalogNode::Subsection(_) => Vec::new(),
        }
    }
}

/// A generated flashcard, as returned by the generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: String,
    pub task_id: String,
    pub front: String,
    pub back: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn task_json(task_type: &str, input_data: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "id": "task-1",
            "user_id": "user-1",
            "created_at": "2026-01-05T10:00:00Z",
            "updated_at": "2026-01-05T10:00:05Z",
            "task_type": task_type,
            "workflow_type": "extract_catalog",
            "input_data": input_data,
            "status": "catalog_ready"
        })
    }

    #[test]
    fn test_task_deserializes_into_tagged_input() {
        let value = task_json(
            "file",
            serde_json::json!({
                "file": { "name": "biology.pdf", "type": "application/pdf" },
                "language": "en",
                "card_count": 30
            }),
        );
        let task: Task = serde_json::from_value(value).expect("deserialize task");

        assert_eq!(task.task_type(), TaskType::File);
        assert_eq!(task.status, TaskStatus::CatalogReady);
        match &task.input {
            TaskInput::File { file, options } => {
                assert_eq!(file.name, "biology.pdf");
                assert_eq!(file.mime_type, "application/pdf");
                assert_eq!(options.card_count, Some(30));
                assert_eq!(options.language.as_deref(), Some("en"));
            }
            other => panic!("expected file input, got {other:?}"),
        }
    }

    #[test]
    fn test_task_serializes_wire_shape() {
        let value = task_json("topic", serde_json::json!({ "topic": "Photosynthesis" }));
        let task: Task = serde_json::from_value(value).unwrap();
        let wire = serde_json::to_value(&task).unwrap();

        assert_eq!(wire["task_type"], "topic");
        assert_eq!(wire["input_data"]["topic"], "Photosynthesis");
        assert!(wire["input_data"].get("text").is_none());
        assert_eq!(wire["status"], "catalog_ready");
    }

    #[test]
    fn test_task_with_missing_required_field_is_rejected() {
        let value = task_json("web", serde_json::json!({ "topic": "wrong field" }));
        assert!(serde_json::from_value::<Task>(value).is_err());
    }

    #[rstest]
    #[case::text_blank(TaskType::Text, InputData { text: Some("   ".into()), ..InputData::default() })]
    #[case::file_missing(TaskType::File, InputData::default())]
    #[case::file_nameless(TaskType::File, InputData { file: Some(FileRef { name: "".into(), mime_type: "application/pdf".into() }), ..InputData::default() })]
    #[case::web_not_url(TaskType::Web, InputData { web_url: Some("not a url".into()), ..InputData::default() })]
    #[case::web_ftp(TaskType::Web, InputData { web_url: Some("ftp://example.com/notes".into()), ..InputData::default() })]
    #[case::topic_missing(TaskType::Topic, InputData { text: Some("body".into()), ..InputData::default() })]
    #[case::zero_cards(TaskType::Topic, InputData { topic: Some("Rust".into()), card_count: Some(0), ..InputData::default() })]
    fn test_invalid_input_data(#[case] task_type: TaskType, #[case] data: InputData) {
        let result = TaskInput::from_input_data(task_type, &data);
        assert!(matches!(result, Err(CardloomError::Validation(_))));
    }

    #[test]
    fn test_foreign_fields_are_dropped() {
        let data = InputData {
            text: Some("Cells divide by mitosis.".into()),
            topic: Some("ignored".into()),
            ..InputData::default()
        };
        let input = TaskInput::from_input_data(TaskType::Text, &data).unwrap();
        let back = input.to_input_data();
        assert_eq!(back.text.as_deref(), Some("Cells divide by mitosis."));
        assert!(back.topic.is_none());
    }

    #[test]
    fn test_catalog_optional_children() {
        let chapters: Vec<Chapter> = serde_json::from_str(
            r#"[
                { "id": "c1", "chapter": "Cells", "sections": [
                    { "id": "s1", "section": "Membranes", "subsections": [
                        { "id": "u1", "subsection": "Lipids", "description": "bilayer" }
                    ]},
                    { "id": "s2", "section": "Organelles" }
                ]},
                { "id": "c2", "chapter": "Genetics" }
            ]"#,
        )
        .unwrap();

        assert_eq!(chapters.len(), 2);
        assert!(chapters[1].sections.is_empty());
        let root = CatalogNode::Chapter(&chapters[0]);
        assert_eq!(root.title(), "Cells");
        let sections = root.children();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].children()[0].description(), Some("bilayer"));
        assert!(sections[1].children().is_empty());
    }
}
