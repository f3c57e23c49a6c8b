use std::time::Duration;

use anyhow::Context;
use reqwest::header::{
  CONTENT_DISPOSITION,
  CONTENT_TYPE
};
use reqwest::{
  Client,
  Method,
  Response,
  Url
};
use serde::de::DeserializeOwned;
use taskflow_shared::api::{
  EXPORT_PATH,
  STATS_PATH,
  TASKS_PATH,
  disposition_filename,
  status_path,
  task_path
};
use taskflow_shared::{
  ApiError,
  BackupFile,
  QueryParams,
  Status,
  Task,
  TaskApi,
  TaskDraft,
  TaskStats
};
use tracing::{
  debug,
  error,
  instrument,
  warn
};
use uuid::Uuid;

/// `TaskApi` over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
  client:   Client,
  base_url: Url
}

impl HttpTaskApi {
  pub fn new(
    base_url: &str,
    timeout: Duration
  ) -> anyhow::Result<Self> {
    let base_url = Url::parse(base_url)
      .with_context(|| {
        format!(
          "invalid API base URL: \
           {base_url}"
        )
      })?;
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .context(
        "failed building HTTP client \
         for task API"
      )?;
    debug!(base_url = %base_url, ?timeout, "created task API client");
    Ok(Self {
      client,
      base_url
    })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  fn url(
    &self,
    path: &str
  ) -> Result<Url, ApiError> {
    self.base_url.join(path).map_err(
      |err| {
        ApiError::Transport {
          url:     path.to_string(),
          message: err.to_string()
        }
      }
    )
  }

  async fn send(
    &self,
    method: Method,
    url: Url,
    body: Option<Vec<u8>>
  ) -> Result<Response, ApiError> {
    let label = url.to_string();
    let mut request =
      self.client.request(method, url);
    if let Some(body) = body {
      request = request
        .header(
          CONTENT_TYPE,
          "application/json"
        )
        .body(body);
    }

    let response = request
      .send()
      .await
      .map_err(|err| {
        error!(url = %label, error = %err, "request failed");
        ApiError::Transport {
          url:     label.clone(),
          message: err.to_string()
        }
      })?;

    let status = response.status();
    debug!(url = %label, status = status.as_u16(), "response received");
    if status.is_success() {
      return Ok(response);
    }

    let body =
      response.text().await.unwrap_or_default();
    warn!(
      url = %label,
      status = status.as_u16(),
      body = %body,
      "non-success response"
    );
    Err(ApiError::Status {
      url: label,
      status: status.as_u16(),
      body
    })
  }

  async fn read_bytes(
    response: Response
  ) -> Result<Vec<u8>, ApiError> {
    let url = response.url().to_string();
    response
      .bytes()
      .await
      .map(|bytes| bytes.to_vec())
      .map_err(|err| {
        ApiError::Transport {
          url,
          message: err.to_string()
        }
      })
  }

  async fn read_json<T>(
    response: Response
  ) -> Result<T, ApiError>
  where
    T: DeserializeOwned
  {
    let url = response.url().to_string();
    let bytes =
      Self::read_bytes(response).await?;
    serde_json::from_slice(&bytes).map_err(
      |err| {
        error!(url = %url, error = %err, "failed decoding response body");
        ApiError::Decode {
          url,
          message: err.to_string()
        }
      }
    )
  }

  fn encode(
    draft: &TaskDraft
  ) -> Result<Vec<u8>, ApiError> {
    draft.validate()?;
    serde_json::to_vec(draft).map_err(
      |err| {
        ApiError::Decode {
          url:     TASKS_PATH.to_string(),
          message: err.to_string()
        }
      }
    )
  }
}

fn warn_on_inconsistent_history(
  task: &Task
) {
  if !task.history_is_consistent() {
    warn!(
      task = %task.id,
      status = %task.status,
      latest = ?task.latest_change().map(|c| c.status.as_str()),
      "status history does not end in current status"
    );
  }
}

impl TaskApi for HttpTaskApi {
  #[instrument(skip(self, query), fields(keys = query.len()))]
  async fn list_tasks(
    &self,
    query: &QueryParams
  ) -> Result<Vec<Task>, ApiError> {
    let mut url = self.url(TASKS_PATH)?;
    if !query.is_empty() {
      url
        .query_pairs_mut()
        .extend_pairs(query.iter());
    }
    debug!(url = %url, "listing tasks");

    let response = self
      .send(Method::GET, url, None)
      .await?;
    let tasks: Vec<Task> =
      Self::read_json(response).await?;
    tasks
      .iter()
      .for_each(warn_on_inconsistent_history);
    debug!(count = tasks.len(), "received tasks");
    Ok(tasks)
  }

  #[instrument(skip(self))]
  async fn get_task(
    &self,
    id: Uuid
  ) -> Result<Task, ApiError> {
    let url = self.url(&task_path(id))?;
    let response = self
      .send(Method::GET, url, None)
      .await?;
    let task: Task =
      Self::read_json(response).await?;
    warn_on_inconsistent_history(&task);
    Ok(task)
  }

  #[instrument(skip(self, draft), fields(title = %draft.title))]
  async fn create_task(
    &self,
    draft: &TaskDraft
  ) -> Result<Task, ApiError> {
    let body = Self::encode(draft)?;
    let url = self.url(TASKS_PATH)?;
    let response = self
      .send(Method::POST, url, Some(body))
      .await?;
    let task: Task =
      Self::read_json(response).await?;
    debug!(id = %task.id, "task created");
    Ok(task)
  }

  #[instrument(skip(self, draft), fields(title = %draft.title))]
  async fn update_task(
    &self,
    id: Uuid,
    draft: &TaskDraft
  ) -> Result<Task, ApiError> {
    let body = Self::encode(draft)?;
    let url = self.url(&task_path(id))?;
    let response = self
      .send(Method::PUT, url, Some(body))
      .await?;
    Self::read_json(response).await
  }

  #[instrument(skip(self))]
  async fn set_status(
    &self,
    id: Uuid,
    status: Status
  ) -> Result<Task, ApiError> {
    let mut url =
      self.url(&status_path(id))?;
    url
      .query_pairs_mut()
      .append_pair("status", status.as_str());
    let response = self
      .send(Method::PUT, url, None)
      .await?;
    let task: Task =
      Self::read_json(response).await?;
    warn_on_inconsistent_history(&task);
    Ok(task)
  }

  #[instrument(skip(self))]
  async fn delete_task(
    &self,
    id: Uuid
  ) -> Result<(), ApiError> {
    let url = self.url(&task_path(id))?;
    self
      .send(Method::DELETE, url, None)
      .await?;
    debug!("task deleted");
    Ok(())
  }

  #[instrument(skip(self))]
  async fn stats(
    &self
  ) -> Result<TaskStats, ApiError> {
    let url = self.url(STATS_PATH)?;
    let response = self
      .send(Method::GET, url, None)
      .await?;
    Self::read_json(response).await
  }

  #[instrument(skip(self))]
  async fn export_backup(
    &self
  ) -> Result<BackupFile, ApiError> {
    let url = self.url(EXPORT_PATH)?;
    let response = self
      .send(Method::GET, url, None)
      .await?;
    let suggested_name = response
      .headers()
      .get(CONTENT_DISPOSITION)
      .and_then(|value| value.to_str().ok())
      .and_then(disposition_filename);
    let bytes =
      Self::read_bytes(response).await?;
    debug!(
      size = bytes.len(),
      suggested = ?suggested_name,
      "backup downloaded"
    );
    Ok(BackupFile {
      suggested_name,
      bytes
    })
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use pretty_assertions::assert_eq;
  use serde_json::json;
  use taskflow_shared::{
    ApiError,
    FilterState,
    Priority,
    Status,
    TaskApi,
    TaskDraft
  };
  use wiremock::matchers::{
    body_json,
    method,
    path,
    query_param
  };
  use wiremock::{
    Mock,
    MockServer,
    ResponseTemplate
  };

  use super::HttpTaskApi;

  const ID: &str =
    "5f0c3a52-8a0e-4c56-9a55-2d1b0e0c9b11";

  fn task_json(
    status: &str
  ) -> serde_json::Value {
    json!({
      "id": ID,
      "title": "Prepare demo",
      "description": "slides and script",
      "priority": "HIGH",
      "status": status,
      "dueDate": "2024-06-20",
      "statusHistory": [
        { "status": status, "timestamp": "2024-06-01T08:00:00Z" }
      ]
    })
  }

  fn api(server: &MockServer) -> HttpTaskApi {
    HttpTaskApi::new(
      &server.uri(),
      Duration::from_secs(5)
    )
    .expect("client")
  }

  #[tokio::test]
  async fn list_sends_built_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/tasks"))
      .and(query_param("status", "OPEN"))
      .and(query_param("sortBy", "priority"))
      .and(query_param("sortOrder", "DESC"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!([task_json("OPEN")]))
      )
      .expect(1)
      .mount(&server)
      .await;

    let filters = FilterState {
      status: Some(Status::Open),
      sort: Some("priority-desc".to_string()),
      ..FilterState::default()
    };
    let today =
      chrono::NaiveDate::from_ymd_opt(2024, 6, 15)
        .expect("date");
    let query =
      taskflow_shared::query::build(&filters, today);

    let tasks = api(&server)
      .list_tasks(&query)
      .await
      .expect("list tasks");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].priority, Priority::High);
  }

  #[tokio::test]
  async fn status_update_uses_query_param() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
      .and(path(format!("/api/tasks/{ID}/status")))
      .and(query_param("status", "COMPLETED"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(task_json("COMPLETED"))
      )
      .expect(1)
      .mount(&server)
      .await;

    let task = api(&server)
      .set_status(
        ID.parse().expect("uuid"),
        Status::Completed
      )
      .await
      .expect("set status");
    assert_eq!(task.status, Status::Completed);
  }

  #[tokio::test]
  async fn create_posts_draft_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/tasks"))
      .and(body_json(json!({
        "title": "Prepare demo",
        "description": null,
        "priority": "MEDIUM",
        "dueDate": null
      })))
      .respond_with(
        ResponseTemplate::new(201)
          .set_body_json(task_json("OPEN"))
      )
      .expect(1)
      .mount(&server)
      .await;

    let task = api(&server)
      .create_task(&TaskDraft::new("Prepare demo"))
      .await
      .expect("create");
    assert_eq!(task.title, "Prepare demo");
  }

  #[tokio::test]
  async fn blank_draft_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(201))
      .expect(0)
      .mount(&server)
      .await;

    let err = api(&server)
      .create_task(&TaskDraft::new(""))
      .await
      .expect_err("blank title");
    assert!(matches!(err, ApiError::Invalid(_)));
  }

  #[tokio::test]
  async fn non_success_maps_to_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path(format!("/api/tasks/{ID}")))
      .respond_with(
        ResponseTemplate::new(404)
          .set_body_string("Task not found")
      )
      .mount(&server)
      .await;

    let err = api(&server)
      .get_task(ID.parse().expect("uuid"))
      .await
      .expect_err("missing task");
    match err {
      | ApiError::Status {
        status, body, ..
      } => {
        assert_eq!(status, 404);
        assert_eq!(body, "Task not found");
      }
      | other => {
        panic!("unexpected error: {other:?}")
      }
    }
  }

  #[tokio::test]
  async fn malformed_body_maps_to_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/tasks/stats"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_string("{not json")
      )
      .mount(&server)
      .await;

    let err = api(&server)
      .stats()
      .await
      .expect_err("bad body");
    assert!(matches!(err, ApiError::Decode { .. }));
  }

  #[tokio::test]
  async fn unreachable_server_is_transport_error() {
    let api = HttpTaskApi::new(
      "http://127.0.0.1:9",
      Duration::from_secs(2)
    )
    .expect("client");
    let err = api
      .delete_task(ID.parse().expect("uuid"))
      .await
      .expect_err("no server");
    assert!(matches!(err, ApiError::Transport { .. }));
  }

  #[tokio::test]
  async fn export_keeps_suggested_filename() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/backup/export"))
      .respond_with(
        ResponseTemplate::new(200)
          .insert_header(
            "content-disposition",
            "attachment; filename=\"taskflow_backup_20240615_101500.json\""
          )
          .set_body_string("{\"taskCount\":0,\"tasks\":[]}")
      )
      .mount(&server)
      .await;

    let backup = api(&server)
      .export_backup()
      .await
      .expect("export");
    assert_eq!(
      backup.suggested_name.as_deref(),
      Some("taskflow_backup_20240615_101500.json")
    );
    assert_eq!(
      backup.bytes,
      b"{\"taskCount\":0,\"tasks\":[]}".to_vec()
    );
  }
}
