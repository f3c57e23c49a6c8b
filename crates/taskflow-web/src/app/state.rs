use std::collections::BTreeSet;
use std::rc::Rc;

use taskflow_shared::router::{
  LIST_VIEW,
  STATS_VIEW
};
use taskflow_shared::{
  Notice,
  Task,
  TaskDraft,
  ViewRouter,
  ViewSurface
};
use uuid::Uuid;
use yew::Reducible;

#[derive(Clone, PartialEq)]
pub enum ListView {
  Loading,
  Loaded(Vec<Task>),
  Failed
}

#[derive(Clone, Copy, PartialEq)]
pub enum ModalMode {
  Create,
  View(Uuid),
  Edit(Uuid)
}

#[derive(Clone, PartialEq)]
pub struct ModalState {
  pub mode:  ModalMode,
  pub task:  Option<Task>,
  pub draft: TaskDraft,
  pub error: Option<String>
}

impl ModalState {
  pub fn create() -> Self {
    Self {
      mode:  ModalMode::Create,
      task:  None,
      draft: TaskDraft::default(),
      error: None
    }
  }

  pub fn for_task(
    task: Task,
    edit: bool
  ) -> Self {
    let mode = if edit {
      ModalMode::Edit(task.id)
    } else {
      ModalMode::View(task.id)
    };
    Self {
      mode,
      draft: task.to_draft(),
      task: Some(task),
      error: None
    }
  }

  pub fn task_id(&self) -> Option<Uuid> {
    match self.mode {
      | ModalMode::Create => None,
      | ModalMode::View(id)
      | ModalMode::Edit(id) => Some(id)
    }
  }

  pub fn read_only(&self) -> bool {
    matches!(self.mode, ModalMode::View(_))
  }
}

/// Work a router activation asks the app
/// to do once navigation finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reload {
  Tasks,
  Stats
}

/// Collects what the router decided; the
/// app then copies it into yew state.
#[derive(Debug, Default)]
pub struct WebSurface {
  pub active:  BTreeSet<String>,
  pub nav:     Option<String>,
  pub reloads: Vec<Reload>
}

impl ViewSurface for WebSurface {
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

/// List and stats routes; each activation
/// asks for its data to be reloaded.
pub fn build_router() -> ViewRouter<WebSurface>
{
  let mut router =
    ViewRouter::new(LIST_VIEW);
  router.register(
    LIST_VIEW,
    |surface: &mut WebSurface| {
      surface.reloads.push(Reload::Tasks)
    }
  );
  router.register(
    STATS_VIEW,
    |surface: &mut WebSurface| {
      surface.reloads.push(Reload::Stats)
    }
  );
  router
}

pub enum NoticeAction {
  Push(Notice),
  Dismiss(u64)
}

/// Visible notices, each tagged with an id
/// so its timer can remove exactly it.
#[derive(Clone, PartialEq, Default)]
pub struct NoticeList {
  next_id: u64,
  pub items: Vec<(u64, Notice)>
}

impl Reducible for NoticeList {
  type Action = NoticeAction;

  fn reduce(
    self: Rc<Self>,
    action: Self::Action
  ) -> Rc<Self> {
    let mut next = (*self).clone();
    match action {
      | NoticeAction::Push(notice) => {
        next.items.push((next.next_id, notice));
        next.next_id += 1;
      }
      | NoticeAction::Dismiss(id) => {
        next.items.retain(|(item, _)| *item != id);
      }
    }
    Rc::new(next)
  }
}

#[cfg(test)]
mod tests {
  use std::rc::Rc;

  use taskflow_shared::{
    Notice,
    Task,
    ViewSurface
  };
  use uuid::Uuid;
  use yew::Reducible;

  use super::{
    ModalMode,
    ModalState,
    NoticeAction,
    NoticeList,
    Reload,
    WebSurface,
    build_router
  };

  #[test]
  fn navigation_marks_only_target_active() {
    let mut router = build_router();
    let mut surface = WebSurface::default();
    surface.set_view_active("list", true);

    assert!(router.navigate("stats", &mut surface));
    assert_eq!(
      surface.active.iter().collect::<Vec<_>>(),
      vec!["stats"]
    );
    assert_eq!(surface.nav.as_deref(), Some("stats"));
    assert_eq!(surface.reloads, vec![Reload::Stats]);

    let mut surface = WebSurface::default();
    assert!(!router.navigate("calendar", &mut surface));
    assert!(surface.active.is_empty());
    assert!(surface.reloads.is_empty());
  }

  #[test]
  fn dismiss_removes_only_that_notice() {
    let list = Rc::new(NoticeList::default())
      .reduce(NoticeAction::Push(
        Notice::success("first")
      ))
      .reduce(NoticeAction::Push(
        Notice::error("second")
      ));
    let first = list.items[0].0;

    let list =
      list.reduce(NoticeAction::Dismiss(first));
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].1.message, "second");
  }

  #[test]
  fn task_modal_starts_read_only() {
    let task: Task = serde_json::from_value(
      serde_json::json!({
        "id": Uuid::new_v4(),
        "title": "Ship release",
        "status": "OPEN"
      })
    )
    .expect("task");
    let id = task.id;

    let view =
      ModalState::for_task(task.clone(), false);
    assert!(view.read_only());
    assert_eq!(view.task_id(), Some(id));
    assert_eq!(view.draft.title, "Ship release");

    let edit = ModalState::for_task(task, true);
    assert!(matches!(edit.mode, ModalMode::Edit(_)));
    assert!(!edit.read_only());
    assert_eq!(ModalState::create().task_id(), None);
  }
}
