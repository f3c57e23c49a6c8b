//! Transient user-facing messages.

use std::fmt;

pub const TASKS_LOAD_FAILED: &str =
  "Failed to load tasks";
pub const TASK_LOAD_FAILED: &str =
  "Failed to load task";
pub const STATUS_UPDATED: &str =
  "Task status updated successfully";
pub const STATUS_UPDATE_FAILED: &str =
  "Failed to update task status";
pub const TASK_CREATED: &str =
  "Task created successfully";
pub const TASK_UPDATED: &str =
  "Task updated successfully";
pub const TASK_SAVE_FAILED: &str =
  "Failed to save task";
pub const TASK_DELETED: &str =
  "Task deleted successfully";
pub const TASK_DELETE_FAILED: &str =
  "Failed to delete task";
pub const STATS_LOAD_FAILED: &str =
  "Failed to load statistics";
pub const BACKUP_EXPORTED: &str =
  "Backup exported successfully";
pub const BACKUP_EXPORT_FAILED: &str =
  "Failed to export backup";

pub const DELETE_CONFIRMATION: &str =
  "Are you sure you want to delete this \
   task? This action cannot be undone.";

/// How long the browser keeps a notice
/// on screen.
pub const NOTICE_TIMEOUT_MS: u32 = 3_000;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum NoticeKind {
  Success,
  Error
}

impl NoticeKind {
  pub fn class(self) -> &'static str {
    match self {
      | NoticeKind::Success => "success",
      | NoticeKind::Error => "error"
    }
  }
}

#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct Notice {
  pub kind:    NoticeKind,
  pub message: String
}

impl Notice {
  pub fn success(
    message: impl Into<String>
  ) -> Self {
    Self {
      kind:    NoticeKind::Success,
      message: message.into()
    }
  }

  pub fn error(
    message: impl Into<String>
  ) -> Self {
    Self {
      kind:    NoticeKind::Error,
      message: message.into()
    }
  }

  pub fn is_error(&self) -> bool {
    self.kind == NoticeKind::Error
  }
}

impl fmt::Display for Notice {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(&self.message)
  }
}
