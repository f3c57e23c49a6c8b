use std::fmt;
use std::str::FromStr;

use chrono::{
  DateTime,
  NaiveDate,
  Utc
};
use serde::{
  Deserialize,
  Deserializer,
  Serialize
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
  pub kind:  &'static str,
  pub value: String
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
  #[error("Title is required")]
  BlankTitle
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
  Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
  Low,
  #[default]
  Medium,
  High
}

impl Priority {
  pub const ALL: [Priority; 3] = [
    Priority::Low,
    Priority::Medium,
    Priority::High
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      | Priority::Low => "LOW",
      | Priority::Medium => "MEDIUM",
      | Priority::High => "HIGH"
    }
  }

  /// Lower-case form used for badge and
  /// card style classes.
  pub fn slug(self) -> &'static str {
    match self {
      | Priority::Low => "low",
      | Priority::Medium => "medium",
      | Priority::High => "high"
    }
  }
}

impl fmt::Display for Priority {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Priority {
  type Err = ParseEnumError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_uppercase()
      .as_str()
    {
      | "LOW" => Ok(Priority::Low),
      | "MEDIUM" => Ok(Priority::Medium),
      | "HIGH" => Ok(Priority::High),
      | _ => {
        Err(ParseEnumError {
          kind:  "priority",
          value: s.to_string()
        })
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
  Open,
  InProgress,
  Completed
}

impl Status {
  pub const ALL: [Status; 3] = [
    Status::Open,
    Status::InProgress,
    Status::Completed
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      | Status::Open => "OPEN",
      | Status::InProgress => {
        "IN_PROGRESS"
      }
      | Status::Completed => "COMPLETED"
    }
  }

  /// Human form shown on badges and
  /// "Mark as" buttons.
  pub fn label(self) -> &'static str {
    match self {
      | Status::Open => "OPEN",
      | Status::InProgress => {
        "IN PROGRESS"
      }
      | Status::Completed => "COMPLETED"
    }
  }

  pub fn slug(self) -> &'static str {
    match self {
      | Status::Open => "open",
      | Status::InProgress => {
        "in-progress"
      }
      | Status::Completed => "completed"
    }
  }

  /// Statuses a task in this status can
  /// be moved to.
  pub fn transitions(
    self
  ) -> impl Iterator<Item = Status> {
    Status::ALL
      .into_iter()
      .filter(move |s| *s != self)
  }
}

impl fmt::Display for Status {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Status {
  type Err = ParseEnumError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let normalized = s
      .trim()
      .to_ascii_uppercase()
      .replace(['-', ' '], "_");
    match normalized.as_str() {
      | "OPEN" => Ok(Status::Open),
      | "IN_PROGRESS" => {
        Ok(Status::InProgress)
      }
      | "COMPLETED" => {
        Ok(Status::Completed)
      }
      | _ => {
        Err(ParseEnumError {
          kind:  "status",
          value: s.to_string()
        })
      }
    }
  }
}

/// One entry of a task's status history.
///
/// The backend reports the status as a
/// plain string and may emit `UNKNOWN`
/// for entries it cannot parse, so the
/// raw value is kept.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct StatusChange {
  pub status:    String,
  pub timestamp: DateTime<Utc>
}

impl StatusChange {
  pub fn new(
    status: Status,
    timestamp: DateTime<Utc>
  ) -> Self {
    Self {
      status: status.as_str().to_string(),
      timestamp
    }
  }

  pub fn parsed_status(
    &self
  ) -> Option<Status> {
    self.status.parse().ok()
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  pub id:                Uuid,
  pub title:             String,
  #[serde(default)]
  pub description:       Option<String>,
  #[serde(
    default,
    deserialize_with = "null_as_default"
  )]
  pub priority:          Priority,
  pub status:            Status,
  #[serde(default)]
  pub due_date:          Option<NaiveDate>,
  #[serde(default)]
  pub created_at:
    Option<DateTime<Utc>>,
  #[serde(default)]
  pub status_updated_at:
    Option<DateTime<Utc>>,
  #[serde(
    default,
    deserialize_with = "null_as_default"
  )]
  pub status_history:
    Vec<StatusChange>
}

impl Task {
  pub fn latest_change(
    &self
  ) -> Option<&StatusChange> {
    self.status_history.last()
  }

  /// An empty history is accepted: a
  /// freshly created task may not carry
  /// its initial entry yet.
  pub fn history_is_consistent(
    &self
  ) -> bool {
    self.latest_change().is_none_or(
      |change| {
        change.parsed_status()
          == Some(self.status)
      }
    )
  }

  pub fn is_completed(&self) -> bool {
    self.status == Status::Completed
  }

  /// Request body pre-filled from this
  /// task, for the edit form.
  pub fn to_draft(&self) -> TaskDraft {
    TaskDraft {
      title:       self.title.clone(),
      description: self
        .description
        .clone(),
      priority:    self.priority,
      due_date:    self.due_date
    }
  }
}

/// Body of `POST /api/tasks` and
/// `PUT /api/tasks/{id}`.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
  pub title:       String,
  pub description: Option<String>,
  pub priority:    Priority,
  pub due_date:    Option<NaiveDate>
}

impl TaskDraft {
  pub fn new(
    title: impl Into<String>
  ) -> Self {
    Self {
      title: title.into(),
      ..Self::default()
    }
  }

  pub fn validate(
    &self
  ) -> Result<(), DraftError> {
    if self.title.trim().is_empty() {
      return Err(DraftError::BlankTitle);
    }
    Ok(())
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
  pub total_tasks:       u64,
  pub open_tasks:        u64,
  pub in_progress_tasks: u64,
  pub completed_tasks:   u64,
  pub overdue_tasks:     u64
}

fn null_as_default<'de, D, T>(
  deserializer: D
) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de> + Default
{
  Ok(
    Option::<T>::deserialize(
      deserializer
    )?
    .unwrap_or_default()
  )
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::{
    Priority,
    Status,
    Task,
    TaskDraft,
    TaskStats
  };

  fn sample_json() -> serde_json::Value {
    json!({
      "id": "5f0c3a52-8a0e-4c56-9a55-2d1b0e0c9b11",
      "title": "Write release notes",
      "description": null,
      "priority": null,
      "status": "IN_PROGRESS",
      "dueDate": "2024-06-14",
      "createdAt": "2024-06-01T09:30:00Z",
      "statusUpdatedAt": "2024-06-02T10:00:00Z",
      "statusHistory": [
        { "status": "OPEN", "timestamp": "2024-06-01T09:30:00Z" },
        { "status": "IN_PROGRESS", "timestamp": "2024-06-02T10:00:00Z" }
      ]
    })
  }

  #[test]
  fn decodes_backend_task_with_null_priority()
  {
    let task: Task =
      serde_json::from_value(
        sample_json()
      )
      .expect("decode task");
    assert_eq!(
      task.priority,
      Priority::Medium
    );
    assert_eq!(
      task.status,
      Status::InProgress
    );
    assert_eq!(
      task
        .due_date
        .map(|d| d.to_string()),
      Some("2024-06-14".to_string())
    );
    assert_eq!(
      task.status_history.len(),
      2
    );
    assert!(task.history_is_consistent());
  }

  #[test]
  fn null_history_decodes_as_empty() {
    let mut value = sample_json();
    value["statusHistory"] = json!(null);
    let task: Task =
      serde_json::from_value(value)
        .expect("decode task");
    assert!(
      task.status_history.is_empty()
    );
    assert!(task.history_is_consistent());
  }

  #[test]
  fn detects_history_that_disagrees_with_status()
  {
    let mut value = sample_json();
    value["status"] = json!("COMPLETED");
    let task: Task =
      serde_json::from_value(value)
        .expect("decode task");
    assert!(
      !task.history_is_consistent()
    );
  }

  #[test]
  fn draft_serializes_with_wire_names() {
    let draft = TaskDraft {
      title:       "Ship it".to_string(),
      description: Some(
        "before friday".to_string()
      ),
      priority:    Priority::High,
      due_date:    chrono::NaiveDate::from_ymd_opt(
        2024, 6, 21
      )
    };
    assert_eq!(
      serde_json::to_value(&draft)
        .expect("encode draft"),
      json!({
        "title": "Ship it",
        "description": "before friday",
        "priority": "HIGH",
        "dueDate": "2024-06-21"
      })
    );
  }

  #[test]
  fn blank_title_is_rejected() {
    assert!(
      TaskDraft::new("   ")
        .validate()
        .is_err()
    );
    assert!(
      TaskDraft::new("Plan sprint")
        .validate()
        .is_ok()
    );
  }

  #[test]
  fn status_parses_ui_spellings() {
    assert_eq!(
      "in-progress".parse::<Status>(),
      Ok(Status::InProgress)
    );
    assert_eq!(
      "In Progress".parse::<Status>(),
      Ok(Status::InProgress)
    );
    assert!(
      "done".parse::<Status>().is_err()
    );
    assert_eq!(
      Status::Open
        .transitions()
        .collect::<Vec<_>>(),
      vec![
        Status::InProgress,
        Status::Completed
      ]
    );
  }

  #[test]
  fn stats_decode_from_camel_case() {
    let stats: TaskStats =
      serde_json::from_value(json!({
        "totalTasks": 7,
        "openTasks": 3,
        "inProgressTasks": 2,
        "completedTasks": 2,
        "overdueTasks": 1
      }))
      .expect("decode stats");
    assert_eq!(stats.total_tasks, 7);
    assert_eq!(
      stats.in_progress_tasks,
      2
    );
  }
}
