pub mod api;
pub mod classify;
pub mod datetime;
pub mod notice;
pub mod query;
pub mod router;
pub mod sequence;
pub mod task;

pub use api::{
  ApiError,
  BackupFile,
  TaskApi
};
pub use classify::{
  Classification,
  DueAlerts,
  DueLabel,
  DueNotification,
  DueStyle,
  classify
};
pub use datetime::{
  DateFilter,
  DateRange
};
pub use notice::{
  Notice,
  NoticeKind
};
pub use query::{
  FilterState,
  QueryParams,
  SortSelector
};
pub use router::{
  ViewRouter,
  ViewSurface
};
pub use sequence::{
  LoadSequence,
  LoadTicket
};
pub use task::{
  DraftError,
  Priority,
  Status,
  StatusChange,
  Task,
  TaskDraft,
  TaskStats
};
