//! The REST seam. Native and browser
//! clients implement [`TaskApi`]; UI code
//! only sees this trait and [`ApiError`].

use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::datetime::format_api_date;
use crate::query::QueryParams;
use crate::task::{
  DraftError,
  Status,
  Task,
  TaskDraft,
  TaskStats
};

pub const TASKS_PATH: &str = "/api/tasks";
pub const STATS_PATH: &str =
  "/api/tasks/stats";
pub const EXPORT_PATH: &str =
  "/api/backup/export";

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("request to {url} failed: {message}")]
  Transport {
    url:     String,
    message: String
  },

  #[error("{url} returned HTTP {status}{}", body_suffix(.body))]
  Status {
    url:    String,
    status: u16,
    body:   String
  },

  #[error("malformed response from {url}: {message}")]
  Decode {
    url:     String,
    message: String
  },

  #[error(transparent)]
  Invalid(#[from] DraftError)
}

fn body_suffix(body: &str) -> String {
  let trimmed = body.trim();
  if trimmed.is_empty() {
    String::new()
  } else {
    format!(": {trimmed}")
  }
}

/// Backup file returned by the export
/// endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
  /// Name suggested by the server, if it
  /// sent a `Content-Disposition`.
  pub suggested_name: Option<String>,
  pub bytes:          Vec<u8>
}

impl BackupFile {
  /// `taskflow_backup_YYYY-MM-DD.json`
  pub fn default_name(
    today: NaiveDate
  ) -> String {
    format!(
      "taskflow_backup_{}.json",
      format_api_date(today)
    )
  }

  /// Name to save under: the server's
  /// suggestion reduced to its last path
  /// component, otherwise the dated
  /// default.
  pub fn file_name(
    &self,
    today: NaiveDate
  ) -> String {
    self
      .suggested_name
      .as_deref()
      .and_then(|name| {
        Path::new(name).file_name()
      })
      .and_then(|name| name.to_str())
      .filter(|name| !name.is_empty())
      .map(str::to_string)
      .unwrap_or_else(|| {
        Self::default_name(today)
      })
  }
}

/// Every backend call the client makes.
///
/// Futures are not required to be `Send`:
/// the browser client runs on a single
/// thread.
#[allow(async_fn_in_trait)]
pub trait TaskApi {
  async fn list_tasks(
    &self,
    query: &QueryParams
  ) -> Result<Vec<Task>, ApiError>;

  async fn get_task(
    &self,
    id: Uuid
  ) -> Result<Task, ApiError>;

  async fn create_task(
    &self,
    draft: &TaskDraft
  ) -> Result<Task, ApiError>;

  async fn update_task(
    &self,
    id: Uuid,
    draft: &TaskDraft
  ) -> Result<Task, ApiError>;

  async fn set_status(
    &self,
    id: Uuid,
    status: Status
  ) -> Result<Task, ApiError>;

  async fn delete_task(
    &self,
    id: Uuid
  ) -> Result<(), ApiError>;

  async fn stats(
    &self
  ) -> Result<TaskStats, ApiError>;

  async fn export_backup(
    &self
  ) -> Result<BackupFile, ApiError>;
}

pub fn task_path(id: Uuid) -> String {
  format!("{TASKS_PATH}/{id}")
}

pub fn status_path(id: Uuid) -> String {
  format!("{TASKS_PATH}/{id}/status")
}

/// Extracts `filename` from a
/// `Content-Disposition` header value.
pub fn disposition_filename(
  header: &str
) -> Option<String> {
  header
    .split(';')
    .map(str::trim)
    .find_map(|part| {
      part.strip_prefix("filename=")
    })
    .map(|name| {
      name.trim_matches('"').to_string()
    })
    .filter(|name| !name.is_empty())
}
