//! Terminal-side application state.
//!
//! Every user action is a [`Command`]. A
//! command may queue follow-ups (router
//! activations, reloads after a mutation)
//! which `dispatch` drains in order before
//! returning.

use std::collections::{
  BTreeSet,
  VecDeque
};
use std::path::PathBuf;

use chrono::NaiveDate;
use taskflow_shared::notice::{
  BACKUP_EXPORT_FAILED,
  BACKUP_EXPORTED,
  STATS_LOAD_FAILED,
  STATUS_UPDATE_FAILED,
  STATUS_UPDATED,
  TASK_CREATED,
  TASK_DELETE_FAILED,
  TASK_DELETED,
  TASK_LOAD_FAILED,
  TASK_SAVE_FAILED,
  TASK_UPDATED,
  TASKS_LOAD_FAILED
};
use taskflow_shared::router::{
  LIST_VIEW,
  STATS_VIEW
};
use taskflow_shared::{
  ApiError,
  DueAlerts,
  DueNotification,
  FilterState,
  LoadSequence,
  LoadTicket,
  Notice,
  QueryParams,
  Status,
  Task,
  TaskApi,
  TaskDraft,
  TaskStats,
  ViewRouter,
  ViewSurface,
  query
};
use tracing::{
  debug,
  error,
  info,
  instrument,
  warn
};
use uuid::Uuid;

use crate::backup;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
  Navigate(String),
  ApplyFilters(FilterState),
  ClearFilters,
  ReloadTasks,
  ReloadStats,
  OpenTask {
    id:   Uuid,
    mode: ModalMode
  },
  OpenCreate,
  CloseModal,
  SubmitTask {
    id:    Option<Uuid>,
    draft: TaskDraft
  },
  SetStatus {
    id:     Uuid,
    status: Status
  },
  DeleteTask {
    id: Uuid
  },
  ExportBackup {
    dir: PathBuf
  },
  CheckNotifications
}

impl Command {
  pub fn name(&self) -> &'static str {
    match self {
      | Command::Navigate(_) => "navigate",
      | Command::ApplyFilters(_) => {
        "apply-filters"
      }
      | Command::ClearFilters => {
        "clear-filters"
      }
      | Command::ReloadTasks => {
        "reload-tasks"
      }
      | Command::ReloadStats => {
        "reload-stats"
      }
      | Command::OpenTask { .. } => {
        "open-task"
      }
      | Command::OpenCreate => "open-create",
      | Command::CloseModal => "close-modal",
      | Command::SubmitTask { .. } => {
        "submit-task"
      }
      | Command::SetStatus { .. } => {
        "set-status"
      }
      | Command::DeleteTask { .. } => {
        "delete-task"
      }
      | Command::ExportBackup { .. } => {
        "export-backup"
      }
      | Command::CheckNotifications => {
        "check-notifications"
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListState {
  NotLoaded,
  Loading,
  Loaded(Vec<Task>),
  Failed
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum ModalMode {
  Create,
  View,
  Edit
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalState {
  pub mode:  ModalMode,
  /// `None` in create mode.
  pub task:  Option<Task>,
  pub draft: TaskDraft
}

/// Terminal stand-in for the page: which
/// view panes are shown, which nav entry
/// is highlighted, and work queued by
/// router activations.
#[derive(Debug, Default)]
pub struct Screen {
  active: BTreeSet<String>,
  nav:    Option<String>,
  queued: VecDeque<Command>
}

impl Screen {
  pub fn is_active(
    &self,
    view: &str
  ) -> bool {
    self.active.contains(view)
  }

  pub fn nav(&self) -> Option<&str> {
    self.nav.as_deref()
  }

  fn queue(&mut self, command: Command) {
    debug!(command = command.name(), "queued follow-up");
    self.queued.push_back(command);
  }
}

impl ViewSurface for Screen {
  fn set_view_active(
    &mut self,
    view: &str,
    active: bool
  ) {
    if active {
      self.active.insert(view.to_string());
    } else {
      self.active.remove(view);
    }
  }

  fn set_nav_active(
    &mut self,
    view: &str
  ) {
    self.nav = Some(view.to_string());
  }
}

pub type Clock = Box<dyn Fn() -> NaiveDate>;

pub struct UiController<A> {
  api:         A,
  clock:       Clock,
  filters:     FilterState,
  list:        ListState,
  stats:       Option<TaskStats>,
  modal:       Option<ModalState>,
  notices:     Vec<Notice>,
  alerts:      Vec<DueNotification>,
  last_export: Option<PathBuf>,
  sequence:    LoadSequence,
  router:      ViewRouter<Screen>,
  screen:      Screen
}

impl<A: TaskApi> UiController<A> {
  pub fn new(api: A, clock: Clock) -> Self {
    let mut router = ViewRouter::new(LIST_VIEW);
    router.register(
      LIST_VIEW,
      |screen: &mut Screen| {
        screen.queue(Command::ReloadTasks)
      }
    );
    router.register(
      STATS_VIEW,
      |screen: &mut Screen| {
        screen.queue(Command::ReloadStats)
      }
    );

    Self {
      api,
      clock,
      filters: FilterState::default(),
      list: ListState::NotLoaded,
      stats: None,
      modal: None,
      notices: Vec::new(),
      alerts: Vec::new(),
      last_export: None,
      sequence: LoadSequence::new(),
      router,
      screen: Screen::default()
    }
  }

  pub fn api(&self) -> &A {
    &self.api
  }

  pub fn today(&self) -> NaiveDate {
    (self.clock)()
  }

  pub fn filters(&self) -> &FilterState {
    &self.filters
  }

  pub fn list(&self) -> &ListState {
    &self.list
  }

  /// Tasks from the last successful load.
  pub fn tasks(&self) -> &[Task] {
    match &self.list {
      | ListState::Loaded(tasks) => tasks,
      | _ => &[]
    }
  }

  pub fn stats(&self) -> Option<&TaskStats> {
    self.stats.as_ref()
  }

  pub fn modal(&self) -> Option<&ModalState> {
    self.modal.as_ref()
  }

  pub fn current_view(&self) -> &str {
    self.router.current_view()
  }

  pub fn screen(&self) -> &Screen {
    &self.screen
  }

  pub fn last_export(
    &self
  ) -> Option<&PathBuf> {
    self.last_export.as_ref()
  }

  pub fn take_notices(
    &mut self
  ) -> Vec<Notice> {
    std::mem::take(&mut self.notices)
  }

  pub fn take_alerts(
    &mut self
  ) -> Vec<DueNotification> {
    std::mem::take(&mut self.alerts)
  }

  /// Runs `command` and every follow-up it
  /// queues.
  #[instrument(skip(self, command), fields(command = command.name()))]
  pub async fn dispatch(
    &mut self,
    command: Command
  ) {
    self.screen.queue(command);
    while let Some(next) =
      self.screen.queued.pop_front()
    {
      self.run(next).await;
    }
  }

  /// First half of a list reload: marks
  /// the list as loading and tags the
  /// request.
  pub fn begin_load(
    &mut self
  ) -> (LoadTicket, QueryParams) {
    self.list = ListState::Loading;
    let ticket = self.sequence.begin();
    let params =
      query::build(&self.filters, self.today());
    debug!(?ticket, params = ?params, "starting task load");
    (ticket, params)
  }

  /// Second half of a list reload. Returns
  /// `false` when a newer load has started
  /// since `ticket` was issued; the result
  /// is then dropped.
  pub fn finish_load(
    &mut self,
    ticket: LoadTicket,
    result: Result<Vec<Task>, ApiError>
  ) -> bool {
    if !self.sequence.is_current(ticket) {
      return false;
    }
    match result {
      | Ok(tasks) => {
        info!(count = tasks.len(), "tasks loaded");
        self.list = ListState::Loaded(tasks);
      }
      | Err(err) => {
        error!(error = %err, "failed to load tasks");
        self.list = ListState::Failed;
        self.notices.push(Notice::error(
          TASKS_LOAD_FAILED
        ));
      }
    }
    true
  }

  async fn run(&mut self, command: Command) {
    debug!(command = command.name(), "running command");
    match command {
      | Command::Navigate(view) => {
        if !self
          .router
          .navigate(&view, &mut self.screen)
        {
          warn!(view = %view, "unknown view");
        }
      }
      | Command::ApplyFilters(filters) => {
        debug!(?filters, "applying filters");
        self.filters = filters;
        self.screen.queue(Command::ReloadTasks);
      }
      | Command::ClearFilters => {
        self.filters.clear();
        self.screen.queue(Command::ReloadTasks);
      }
      | Command::ReloadTasks => {
        let (ticket, params) = self.begin_load();
        let result =
          self.api.list_tasks(&params).await;
        self.finish_load(ticket, result);
      }
      | Command::ReloadStats => {
        self.reload_stats().await
      }
      | Command::OpenTask { id, mode } => {
        self.open_task(id, mode).await
      }
      | Command::OpenCreate => {
        self.modal = Some(ModalState {
          mode:  ModalMode::Create,
          task:  None,
          draft: TaskDraft::default()
        });
      }
      | Command::CloseModal => {
        self.modal = None;
      }
      | Command::SubmitTask { id, draft } => {
        self.submit(id, draft).await
      }
      | Command::SetStatus { id, status } => {
        self.set_status(id, status).await
      }
      | Command::DeleteTask { id } => {
        self.delete(id).await
      }
      | Command::ExportBackup { dir } => {
        self.export(dir).await
      }
      | Command::CheckNotifications => {
        self.check_notifications().await
      }
    }
  }

  async fn reload_stats(&mut self) {
    match self.api.stats().await {
      | Ok(stats) => {
        debug!(?stats, "statistics loaded");
        self.stats = Some(stats);
      }
      | Err(err) => {
        error!(error = %err, "failed to load statistics");
        self.notices.push(Notice::error(
          STATS_LOAD_FAILED
        ));
      }
    }
  }

  async fn open_task(
    &mut self,
    id: Uuid,
    mode: ModalMode
  ) {
    match self.api.get_task(id).await {
      | Ok(task) => {
        let draft = task.to_draft();
        self.modal = Some(ModalState {
          mode,
          task: Some(task),
          draft
        });
      }
      | Err(err) => {
        error!(task = %id, error = %err, "failed to load task");
        self.modal = None;
        self.notices.push(Notice::error(
          TASK_LOAD_FAILED
        ));
      }
    }
  }

  async fn submit(
    &mut self,
    id: Option<Uuid>,
    draft: TaskDraft
  ) {
    if let Err(err) = draft.validate() {
      warn!(error = %err, "rejected draft");
      self
        .notices
        .push(Notice::error(err.to_string()));
      return;
    }

    let (result, success) = match id {
      | Some(id) => {
        (
          self.api.update_task(id, &draft).await,
          TASK_UPDATED
        )
      }
      | None => {
        (
          self.api.create_task(&draft).await,
          TASK_CREATED
        )
      }
    };

    match result {
      | Ok(task) => {
        info!(task = %task.id, "task saved");
        self.notices.push(Notice::success(success));
        self.modal = None;
        self.after_mutation();
      }
      | Err(err) => {
        error!(error = %err, "failed to save task");
        if let Some(modal) = self.modal.as_mut() {
          modal.draft = draft;
        }
        self.notices.push(Notice::error(
          TASK_SAVE_FAILED
        ));
      }
    }
  }

  async fn set_status(
    &mut self,
    id: Uuid,
    status: Status
  ) {
    match self.api.set_status(id, status).await
    {
      | Ok(task) => {
        info!(task = %task.id, status = %task.status, "status updated");
        self.notices.push(Notice::success(
          STATUS_UPDATED
        ));
        self.after_mutation();
      }
      | Err(err) => {
        error!(task = %id, error = %err, "failed to update status");
        self.notices.push(Notice::error(
          STATUS_UPDATE_FAILED
        ));
      }
    }
  }

  async fn delete(&mut self, id: Uuid) {
    match self.api.delete_task(id).await {
      | Ok(()) => {
        info!(task = %id, "task deleted");
        self.notices.push(Notice::success(
          TASK_DELETED
        ));
        self.modal = None;
        self.after_mutation();
      }
      | Err(err) => {
        error!(task = %id, error = %err, "failed to delete task");
        self.notices.push(Notice::error(
          TASK_DELETE_FAILED
        ));
      }
    }
  }

  async fn export(&mut self, dir: PathBuf) {
    let today = self.today();
    let saved = match self
      .api
      .export_backup()
      .await
    {
      | Ok(file) => {
        backup::save(&dir, &file, today)
      }
      | Err(err) => Err(err.into())
    };

    match saved {
      | Ok(path) => {
        self.last_export = Some(path);
        self.notices.push(Notice::success(
          BACKUP_EXPORTED
        ));
      }
      | Err(err) => {
        let message = format!("{err:#}");
        error!(error = %message, "failed to export backup");
        self.notices.push(Notice::error(
          BACKUP_EXPORT_FAILED
        ));
      }
    }
  }

  /// Unfiltered fetch; failures are only
  /// logged.
  async fn check_notifications(&mut self) {
    let today = self.today();
    match self
      .api
      .list_tasks(&QueryParams::default())
      .await
    {
      | Ok(tasks) => {
        let alerts =
          DueAlerts::collect(&tasks, today);
        self.alerts = alerts.notifications();
      }
      | Err(err) => {
        warn!(error = %err, "notification check failed");
      }
    }
  }

  fn after_mutation(&mut self) {
    self.screen.queue(Command::ReloadTasks);
    if self.router.current_view()
      == STATS_VIEW
    {
      self.screen.queue(Command::ReloadStats);
    }
  }
}
