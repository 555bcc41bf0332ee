//! Task API client
//!
//! [`TaskApi`] is the boundary with the external task service. [`HttpTaskApi`]
//! speaks to it over HTTP; tests substitute their own implementations.

use crate::config::ShellConfig;
use crate::error::{Result, ShellError};
use reqwest::{Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MSG_DELETION_FAILED: &str = "Deletion failed";

/// Body of `POST /tasks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    pub description: String,
}

/// Operations offered by the task service.
///
/// Payloads are returned untyped so the structured view shows exactly what the
/// service sent, extra fields included.
#[allow(async_fn_in_trait)]
pub trait TaskApi {
    /// `GET /tasks`
    async fn list_tasks(&self) -> Result<Value>;

    /// `GET /tasks/{id}`
    async fn get_task(&self, id: &str) -> Result<Value>;

    /// `POST /tasks`
    async fn create_task(&self, task: &NewTask) -> Result<Value>;

    /// `DELETE /tasks/{id}`, succeeds only on 204
    async fn delete_task(&self, id: &str) -> Result<()>;
}

/// HTTP implementation of [`TaskApi`]
#[derive(Clone)]
pub struct HttpTaskApi {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpTaskApi {
    pub fn new(config: &ShellConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            base_url: config.api_url.clone(),
            client,
        })
    }

    /// Client against `base_url` with no timeout
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let config = ShellConfig::with_api_url(base_url)?;
        Self::new(&config)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, id: Option<&str>) -> Result<Url> {
        // url drops dot segments, which would retarget the collection
        if let Some(dots @ ("." | "..")) = id {
            return Err(ShellError::Validation(format!("Invalid task ID: '{}'", dots)));
        }

        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ShellError::InvalidConfig(format!("cannot use '{}' as a base URL", self.base_url))
            })?;
            segments.pop_if_empty().push("tasks");
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self) -> Result<Value> {
        let url = self.endpoint(None)?;
        tracing::debug!(method = "GET", url = %url, "Requesting task list");
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }

    async fn get_task(&self, id: &str) -> Result<Value> {
        let url = self.endpoint(Some(id))?;
        tracing::debug!(method = "GET", url = %url, "Requesting task");
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }

    async fn create_task(&self, task: &NewTask) -> Result<Value> {
        let url = self.endpoint(None)?;
        tracing::debug!(method = "POST", url = %url, name = %task.name, "Creating task");
        let response = self.client.post(url).json(task).send().await?;
        read_json(response).await
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        let url = self.endpoint(Some(id))?;
        tracing::debug!(method = "DELETE", url = %url, "Deleting task");
        let response = self.client.delete(url).send().await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(());
        }

        let body = response.text().await?;
        let message = detail_from_body(&body).unwrap_or_else(|| MSG_DELETION_FAILED.to_string());
        tracing::warn!(status = status.as_u16(), detail = %message, "Task deletion rejected");
        Err(ShellError::Remote(message))
    }
}

/// Decode a JSON payload, turning non-2xx answers into remote errors
async fn read_json(response: Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = detail_from_body(&body)
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
        tracing::warn!(status = status.as_u16(), detail = %message, "Task API request failed");
        return Err(ShellError::Remote(message));
    }

    Ok(serde_json::from_str(&body)?)
}

/// The `detail` field of an error body, if there is a usable one
fn detail_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[test]
    fn test_detail_from_body() {
        assert_eq!(
            detail_from_body(r#"{"detail":"Task not found"}"#).as_deref(),
            Some("Task not found")
        );
        assert_eq!(detail_from_body(r#"{"detail":""}"#), None);
        assert_eq!(detail_from_body(r#"{"other":1}"#), None);
        assert_eq!(detail_from_body("not json"), None);
        assert_eq!(
            detail_from_body(r#"{"detail":[{"msg":"field required"}]}"#).as_deref(),
            Some(r#"[{"msg":"field required"}]"#)
        );
    }

    #[test]
    fn test_endpoint_building() {
        let api = HttpTaskApi::with_base_url("http://127.0.0.1:8000").unwrap();
        assert_eq!(
            api.endpoint(None).unwrap().as_str(),
            "http://127.0.0.1:8000/tasks"
        );
        assert_eq!(
            api.endpoint(Some("42")).unwrap().as_str(),
            "http://127.0.0.1:8000/tasks/42"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_encodes_id() {
        let api = HttpTaskApi::with_base_url("http://example.com/api/").unwrap();
        assert_eq!(
            api.endpoint(None).unwrap().as_str(),
            "http://example.com/api/tasks"
        );
        assert_eq!(
            api.endpoint(Some("a b/c")).unwrap().as_str(),
            "http://example.com/api/tasks/a%20b%2Fc"
        );
    }

    #[test]
    fn test_endpoint_rejects_dot_segments() {
        let api = HttpTaskApi::with_base_url("http://127.0.0.1:8000").unwrap();
        for id in [".", ".."] {
            let err = api.endpoint(Some(id)).unwrap_err();
            assert!(err.is_validation(), "id {:?}", id);
            assert_eq!(err.to_string(), format!("Invalid task ID: '{}'", id));
        }
        assert_eq!(
            api.endpoint(Some("...")).unwrap().as_str(),
            "http://127.0.0.1:8000/tasks/..."
        );
    }

    #[tokio::test]
    async fn test_delete_dot_dot_never_reaches_collection() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("DELETE", Matcher::Any)
            .with_status(204)
            .expect(0)
            .create_async()
            .await;

        let api = HttpTaskApi::with_base_url(&server.url()).unwrap();
        let err = api.delete_task("..").await.unwrap_err();
        assert!(err.is_validation());
        m.assert_async().await;
    }

    #[test]
    fn test_falsy_detail_is_absent() {
        assert_eq!(detail_from_body(r#"{"detail":0}"#), None);
        assert_eq!(detail_from_body(r#"{"detail":0.0}"#), None);
        assert_eq!(detail_from_body(r#"{"detail":false}"#), None);
        assert_eq!(detail_from_body(r#"{"detail":null}"#), None);
        assert_eq!(detail_from_body(r#"{"detail":7}"#).as_deref(), Some("7"));
        assert_eq!(detail_from_body(r#"{"detail":true}"#).as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_delete_zero_detail_falls_back() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("DELETE", "/tasks/7")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":0}"#)
            .create_async()
            .await;

        let api = HttpTaskApi::with_base_url(&server.url()).unwrap();
        let err = api.delete_task("7").await.unwrap_err();
        assert_eq!(err.to_string(), MSG_DELETION_FAILED);
    }

    #[tokio::test]
    async fn test_list_tasks_returns_payload() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/tasks")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":"1","name":"A","status":"running"}]"#)
            .create_async()
            .await;

        let api = HttpTaskApi::with_base_url(&server.url()).unwrap();
        let value = api.list_tasks().await.unwrap();
        assert_eq!(value, json!([{"id":"1","name":"A","status":"running"}]));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_task_not_found_uses_detail() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/tasks/missing")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"Task not found"}"#)
            .create_async()
            .await;

        let api = HttpTaskApi::with_base_url(&server.url()).unwrap();
        let err = api.get_task("missing").await.unwrap_err();
        assert!(matches!(err, ShellError::Remote(_)));
        assert_eq!(err.to_string(), "Task not found");
    }

    #[tokio::test]
    async fn test_error_without_detail_reports_status() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/tasks")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let api = HttpTaskApi::with_base_url(&server.url()).unwrap();
        let err = api.list_tasks().await.unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status 502");
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/tasks/1")
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let api = HttpTaskApi::with_base_url(&server.url()).unwrap();
        let err = api.get_task("1").await.unwrap_err();
        assert!(matches!(err, ShellError::Json(_)));
    }

    #[tokio::test]
    async fn test_create_task_posts_name_and_description() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/tasks")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "name": "Write docs",
                "description": "for the shell"
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id":"u-1","name":"Write docs","description":"for the shell","status":"running","created_at":"2024-05-01T10:00:00"}"#,
            )
            .create_async()
            .await;

        let api = HttpTaskApi::with_base_url(&server.url()).unwrap();
        let task = NewTask {
            name: "Write docs".to_string(),
            description: "for the shell".to_string(),
        };
        let value = api.create_task(&task).await.unwrap();
        assert_eq!(value["status"], "running");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_204_succeeds() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("DELETE", "/tasks/7")
            .with_status(204)
            .create_async()
            .await;

        let api = HttpTaskApi::with_base_url(&server.url()).unwrap();
        api.delete_task("7").await.unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_conflict_uses_detail() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("DELETE", "/tasks/7")
            .with_status(409)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"conflict"}"#)
            .create_async()
            .await;

        let api = HttpTaskApi::with_base_url(&server.url()).unwrap();
        let err = api.delete_task("7").await.unwrap_err();
        assert_eq!(err.to_string(), "conflict");
    }

    #[tokio::test]
    async fn test_delete_other_success_status_still_fails() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("DELETE", "/tasks/7")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"deleted":true}"#)
            .create_async()
            .await;

        let api = HttpTaskApi::with_base_url(&server.url()).unwrap();
        let err = api.delete_task("7").await.unwrap_err();
        assert_eq!(err.to_string(), MSG_DELETION_FAILED);
    }

    #[tokio::test]
    async fn test_delete_non_json_body_falls_back() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("DELETE", "/tasks/7")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let api = HttpTaskApi::with_base_url(&server.url()).unwrap();
        let err = api.delete_task("7").await.unwrap_err();
        assert_eq!(err.to_string(), MSG_DELETION_FAILED);
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        // Nothing listens on port 9 on the loopback interface
        let api = HttpTaskApi::with_base_url("http://127.0.0.1:9").unwrap();
        let err = api.list_tasks().await.unwrap_err();
        assert!(matches!(err, ShellError::Http(_)));
        assert_eq!(err.to_error_code(), "HTTP_ERROR");
    }
}
