/*
[INPUT]:  Task submissions, updates, list queries and bearer authentication
[OUTPUT]: Task resources, pages, outlines, and generated flashcards
[POS]:    HTTP layer - task endpoints (require bearer auth)
[UPDATE]: When adding new task endpoints or changing query parameters
*/

use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, info};

use crate::http::api::{CardloomApi, TaskSource};
use crate::http::{CardloomClient, Result};
use crate::types::{
    Chapter, CreateTaskRequest, Flashcard, GenerateCardsRequest, ListTasksQuery, Task, TaskPage,
    UpdateTaskRequest,
};

fn task_endpoint(task_id: &str, suffix: &str) -> String {
    format!("/api/tasks/{task_id}{suffix}")
}

impl CardloomClient {
    /// Create a new task
    ///
    /// POST /api/tasks
    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task> {
        let builder = self.authed_request(Method::POST, "/api/tasks")?.json(request);
        let task = self.ensure_owner(self.send_json(builder).await?)?;
        info!(task_id = %task.id, task_type = %task.task_type(), "task created");
        Ok(task)
    }

    /// Fetch one task
    ///
    /// GET /api/tasks/{id}
    pub async fn get_task(&self, task_id: &str) -> Result<Task> {
        let builder = self.authed_request(Method::GET, &task_endpoint(task_id, ""))?;
        self.ensure_owner(self.send_json(builder).await?)
    }

    /// Patch status and/or input data
    ///
    /// PATCH /api/tasks/{id}
    pub async fn update_task(&self, task_id: &str, request: &UpdateTaskRequest) -> Result<Task> {
        let builder = self
            .authed_request(Method::PATCH, &task_endpoint(task_id, ""))?
            .json(request);
        self.ensure_owner(self.send_json(builder).await?)
    }

    /// List the caller's tasks, newest first
    ///
    /// GET /api/tasks?status={status}&limit={limit}&offset={offset}
    pub async fn list_tasks(&self, query: &ListTasksQuery) -> Result<TaskPage> {
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        if let Some(status) = query.status {
            params.push(("status", status.as_str().to_string()));
        }

        let builder = self
            .authed_request(Method::GET, "/api/tasks")?
            .query(&params);
        self.send_json(builder).await
    }

    /// Fetch the extracted outline
    ///
    /// GET /api/tasks/{id}/catalog
    pub async fn fetch_catalog(&self, task_id: &str) -> Result<Vec<Chapter>> {
        let builder = self.authed_request(Method::GET, &task_endpoint(task_id, "/catalog"))?;
        let chapters: Vec<Chapter> = self.send_json(builder).await?;
        debug!(task_id, chapters = chapters.len(), "catalog fetched");
        Ok(chapters)
    }

    /// Hand the selection over to flashcard generation
    ///
    /// POST /api/tasks/{id}/generate
    pub async fn start_generation(&self, task_id: &str, selected_ids: Vec<String>) -> Result<Task> {
        let body = GenerateCardsRequest { selected_ids };
        info!(task_id, selected = body.selected_ids.len(), "starting generation");
        let builder = self
            .authed_request(Method::POST, &task_endpoint(task_id, "/generate"))?
            .json(&body);
        self.ensure_owner(self.send_json(builder).await?)
    }

    /// GET /api/tasks/{id}/flashcards
    pub async fn list_flashcards(&self, task_id: &str) -> Result<Vec<Flashcard>> {
        let builder = self.authed_request(Method::GET, &task_endpoint(task_id, "/flashcards"))?;
        self.send_json(builder).await
    }
}

#[async_trait]
impl TaskSource for CardloomClient {
    async fn fetch_task(&self, task_id: &str) -> Result<Task> {
        self.get_task(task_id).await
    }
}

#[async_trait]
impl CardloomApi for CardloomClient {
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task> {
        CardloomClient::create_task(self, request).await
    }

    async fn update_task(&self, task_id: &str, request: &UpdateTaskRequest) -> Result<Task> {
        CardloomClient::update_task(self, task_id, request).await
    }

    async fn list_tasks(&self, query: &ListTasksQuery) -> Result<TaskPage> {
        CardloomClient::list_tasks(self, query).await
    }

    async fn fetch_catalog(&self, task_id: &str) -> Result<Vec<Chapter>> {
        CardloomClient::fetch_catalog(self, task_id).await
    }

    async fn start_generation(&self, task_id: &str, selected_ids: Vec<String>) -> Result<Task> {
        CardloomClient::start_generation(self, task_id, selected_ids).await
    }

    async fn list_flashcards(&self, task_id: &str) -> Result<Vec<Flashcard>> {
        CardloomClient::list_flashcards(self, task_id).await
    }
}

#[cfg(test)]
mod tests {
    use crate::http::{CardloomClient, CardloomError, ClientConfig, Credentials};
    use crate::types::{ListTasksQuery, TaskStatus};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CardloomClient {
        let mut client =
            CardloomClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
                .expect("client init");
        client.set_credentials(Credentials {
            access_token: "token-abc".to_string(),
            user_id: "user-1".to_string(),
        });
        client
    }

    fn task_body(id: &str, status: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "user_id": "user-1",
            "created_at": "2026-03-01T08:00:00Z",
            "updated_at": "2026-03-01T08:00:10Z",
            "task_type": "text",
            "workflow_type": "extract_catalog",
            "input_data": { "text": "Mitochondria are the powerhouse of the cell." },
            "status": status
        })
    }

    #[tokio::test]
    async fn test_get_task_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tasks/task-9"))
            .and(header("authorization", "Bearer token-abc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(task_body("task-9", "ai_processing")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let task = client_for(&server).get_task("task-9").await.expect("get_task");
        assert_eq!(task.id, "task-9");
        assert_eq!(task.status, TaskStatus::AiProcessing);
    }

    #[tokio::test]
    async fn test_list_tasks_passes_filter_and_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tasks"))
            .and(query_param("status", "completed"))
            .and(query_param("limit", "1"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tasks": [task_body("task-3", "completed")],
                "total_count": 3
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = ListTasksQuery {
            limit: 1,
            ..ListTasksQuery::with_status(TaskStatus::Completed)
        };
        let page = client_for(&server).list_tasks(&query).await.expect("list_tasks");
        assert_eq!(page.total_count, 3);
        assert_eq!(page.tasks.len(), 1);
        assert_eq!(page.tasks[0].id, "task-3");
    }

    #[tokio::test]
    async fn test_not_found_maps_to_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tasks/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({ "error": "task not found" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).get_task("missing").await.unwrap_err();
        match err {
            CardloomError::NotFound(message) => assert_eq!(message, "task not found"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_requests_require_credentials() {
        let server = MockServer::start().await;
        let client =
            CardloomClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
                .unwrap();
        let err = client.get_task("task-1").await.unwrap_err();
        assert!(matches!(err, CardloomError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_foreign_task_is_rejected() {
        let server = MockServer::start().await;
        let mut body = task_body("task-7", "completed");
        body["user_id"] = serde_json::json!("user-2");
        Mock::given(method("GET"))
            .and(path("/api/tasks/task-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let err = client_for(&server).get_task("task-7").await.unwrap_err();
        assert!(matches!(err, CardloomError::Authorization(_)));
        assert_eq!(err.boundary_status().as_u16(), 404);
    }
}
