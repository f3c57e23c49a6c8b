use gloo::net::http::{
  Request,
  RequestBuilder,
  Response
};
use serde::de::DeserializeOwned;
use serde_json::de::from_str;
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
use uuid::Uuid;

/// `TaskApi` over the browser's fetch.
/// An empty base URL means same origin.
#[derive(Debug, Clone, PartialEq)]
pub struct GlooTaskApi {
  base_url: String
}

impl GlooTaskApi {
  pub fn new(base_url: &str) -> Self {
    Self {
      base_url: base_url
        .trim_end_matches('/')
        .to_string()
    }
  }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.base_url)
  }

  async fn send(
    url: &str,
    builder: RequestBuilder,
    draft: Option<&TaskDraft>
  ) -> Result<Response, ApiError> {
    let transport = |err: gloo::net::Error| {
      tracing::error!(url, error = %err, "request failed");
      ApiError::Transport {
        url:     url.to_string(),
        message: err.to_string()
      }
    };

    let response = match draft {
      | Some(draft) => {
        draft.validate()?;
        let request: Request = builder
          .json(draft)
          .map_err(transport)?;
        request.send().await
      }
      | None => builder.send().await
    }
    .map_err(transport)?;

    tracing::debug!(
      url,
      status = response.status(),
      "response received"
    );
    if response.ok() {
      return Ok(response);
    }

    let status = response.status();
    let body =
      response.text().await.unwrap_or_default();
    tracing::warn!(url, status, body = %body, "non-success response");
    Err(ApiError::Status {
      url: url.to_string(),
      status,
      body
    })
  }

  async fn read_json<T>(
    url: &str,
    response: Response
  ) -> Result<T, ApiError>
  where
    T: DeserializeOwned
  {
    let text =
      response.text().await.map_err(|err| {
        ApiError::Transport {
          url:     url.to_string(),
          message: err.to_string()
        }
      })?;
    from_str(&text).map_err(|err| {
      tracing::error!(url, error = %err, "failed decoding response body");
      ApiError::Decode {
        url:     url.to_string(),
        message: err.to_string()
      }
    })
  }
}

impl TaskApi for GlooTaskApi {
  async fn list_tasks(
    &self,
    query: &QueryParams
  ) -> Result<Vec<Task>, ApiError> {
    let url = self.url(TASKS_PATH);
    tracing::debug!(url = %url, params = ?query, "listing tasks");
    let builder =
      Request::get(&url).query(query.iter());
    let response =
      Self::send(&url, builder, None).await?;
    let tasks: Vec<Task> =
      Self::read_json(&url, response).await?;
    for task in
      tasks.iter().filter(|t| !t.history_is_consistent())
    {
      tracing::warn!(
        task = %task.id,
        status = %task.status,
        "status history does not end in current status"
      );
    }
    Ok(tasks)
  }

  async fn get_task(
    &self,
    id: Uuid
  ) -> Result<Task, ApiError> {
    let url = self.url(&task_path(id));
    let response = Self::send(
      &url,
      Request::get(&url),
      None
    )
    .await?;
    Self::read_json(&url, response).await
  }

  async fn create_task(
    &self,
    draft: &TaskDraft
  ) -> Result<Task, ApiError> {
    let url = self.url(TASKS_PATH);
    let response = Self::send(
      &url,
      Request::post(&url),
      Some(draft)
    )
    .await?;
    Self::read_json(&url, response).await
  }

  async fn update_task(
    &self,
    id: Uuid,
    draft: &TaskDraft
  ) -> Result<Task, ApiError> {
    let url = self.url(&task_path(id));
    let response = Self::send(
      &url,
      Request::put(&url),
      Some(draft)
    )
    .await?;
    Self::read_json(&url, response).await
  }

  async fn set_status(
    &self,
    id: Uuid,
    status: Status
  ) -> Result<Task, ApiError> {
    let url = self.url(&status_path(id));
    let builder = Request::put(&url)
      .query([("status", status.as_str())]);
    let response =
      Self::send(&url, builder, None).await?;
    Self::read_json(&url, response).await
  }

  async fn delete_task(
    &self,
    id: Uuid
  ) -> Result<(), ApiError> {
    let url = self.url(&task_path(id));
    Self::send(
      &url,
      Request::delete(&url),
      None
    )
    .await?;
    Ok(())
  }

  async fn stats(
    &self
  ) -> Result<TaskStats, ApiError> {
    let url = self.url(STATS_PATH);
    let response = Self::send(
      &url,
      Request::get(&url),
      None
    )
    .await?;
    Self::read_json(&url, response).await
  }

  async fn export_backup(
    &self
  ) -> Result<BackupFile, ApiError> {
    let url = self.url(EXPORT_PATH);
    let response = Self::send(
      &url,
      Request::get(&url),
      None
    )
    .await?;
    let suggested_name = response
      .headers()
      .get("content-disposition")
      .as_deref()
      .and_then(disposition_filename);
    let bytes =
      response.binary().await.map_err(|err| {
        ApiError::Transport {
          url:     url.clone(),
          message: err.to_string()
        }
      })?;
    Ok(BackupFile {
      suggested_name,
      bytes
    })
  }
}
