mod browser;
pub mod state;

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use gloo::timers::future::TimeoutFuture;
use taskflow_shared::datetime::local_today;
use taskflow_shared::notice::{
  BACKUP_EXPORT_FAILED,
  BACKUP_EXPORTED,
  DELETE_CONFIRMATION,
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
  DateFilter,
  DueAlerts,
  FilterState,
  LoadSequence,
  Notice,
  Priority,
  QueryParams,
  Status,
  TaskApi,
  TaskDraft,
  TaskStats,
  ViewRouter,
  query
};
use uuid::Uuid;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::api::GlooTaskApi;
use crate::app::state::{
  ListView,
  ModalMode,
  ModalState,
  NoticeAction,
  NoticeList,
  Reload,
  WebSurface,
  build_router
};
use crate::components::{
  FilterBar,
  NavBar,
  NoticeStack,
  StatsPanel,
  TaskCard,
  TaskModal
};

const SEARCH_DEBOUNCE_MS: u32 = 300;

#[derive(Properties, PartialEq)]
pub struct AppProps {
  /// Backend origin; empty for same
  /// origin.
  pub api_base: String
}

/// Handles shared by every callback that
/// talks to the backend.
#[derive(Clone)]
struct Handles {
  api:      Rc<GlooTaskApi>,
  sequence: Rc<LoadSequence>,
  router:
    Rc<RefCell<ViewRouter<WebSurface>>>,
  filters:  Rc<RefCell<FilterState>>,
  shown_filters:
    UseStateHandle<FilterState>,
  view:     UseStateHandle<String>,
  active_views:
    UseStateHandle<BTreeSet<String>>,
  list:     UseStateHandle<ListView>,
  stats:    UseStateHandle<Option<TaskStats>>,
  notices:
    UseReducerDispatcher<NoticeList>
}

impl Handles {
  fn notify(&self, notice: Notice) {
    self
      .notices
      .dispatch(NoticeAction::Push(notice));
  }

  fn load_tasks(&self) {
    let ticket = self.sequence.begin();
    let params = query::build(
      &self.filters.borrow(),
      local_today()
    );
    self.list.set(ListView::Loading);

    let this = self.clone();
    spawn_local(async move {
      let result =
        this.api.list_tasks(&params).await;
      if !this.sequence.is_current(ticket) {
        return;
      }
      match result {
        | Ok(tasks) => {
          tracing::debug!(
            count = tasks.len(),
            "tasks loaded"
          );
          this.list.set(ListView::Loaded(tasks));
        }
        | Err(err) => {
          tracing::error!(error = %err, "loading tasks failed");
          this.list.set(ListView::Failed);
          this.notify(Notice::error(
            TASKS_LOAD_FAILED
          ));
        }
      }
    });
  }

  fn load_stats(&self) {
    let this = self.clone();
    spawn_local(async move {
      match this.api.stats().await {
        | Ok(stats) => {
          this.stats.set(Some(stats))
        }
        | Err(err) => {
          tracing::error!(error = %err, "loading statistics failed");
          this.notify(Notice::error(
            STATS_LOAD_FAILED
          ));
        }
      }
    });
  }

  fn navigate(&self, target: &str) {
    let mut surface = WebSurface::default();
    let moved = self
      .router
      .borrow_mut()
      .navigate(target, &mut surface);
    if !moved {
      return;
    }

    if let Some(nav) = surface.nav {
      self.view.set(nav);
    }
    self.active_views.set(surface.active);
    for reload in surface.reloads {
      match reload {
        | Reload::Tasks => self.load_tasks(),
        | Reload::Stats => self.load_stats()
      }
    }
  }

  fn update_filters(
    &self,
    change: impl FnOnce(&mut FilterState)
  ) {
    {
      let mut filters =
        self.filters.borrow_mut();
      change(&mut *filters);
      tracing::debug!(filters = ?*filters, "filters changed");
      self.shown_filters.set(filters.clone());
    }
    self.load_tasks();
  }

  fn after_mutation(&self) {
    self.load_tasks();
    if self.router.borrow().current_view()
      == STATS_VIEW
    {
      self.load_stats();
    }
  }

  fn check_notifications(&self) {
    let api = self.api.clone();
    spawn_local(async move {
      match api
        .list_tasks(&QueryParams::default())
        .await
      {
        | Ok(tasks) => {
          let alerts = DueAlerts::collect(
            &tasks,
            local_today()
          );
          for notification in
            alerts.notifications()
          {
            browser::emit_notification(
              &notification
            );
          }
        }
        | Err(err) => {
          tracing::warn!(error = %err, "notification check failed")
        }
      }
    });
  }
}

#[function_component(App)]
pub fn app(props: &AppProps) -> Html {
  let api = use_memo(
    props.api_base.clone(),
    |base| GlooTaskApi::new(base)
  );
  let sequence =
    use_memo((), |_| LoadSequence::new());
  let router = use_mut_ref(build_router);
  let filters =
    use_mut_ref(FilterState::default);
  let shown_filters =
    use_state(FilterState::default);
  let search_text = use_state(String::new);
  let search_generation =
    use_mut_ref(|| 0_u64);
  let view =
    use_state(|| LIST_VIEW.to_string());
  let active_views = use_state(|| {
    BTreeSet::from([LIST_VIEW.to_string()])
  });
  let list = use_state(|| ListView::Loading);
  let stats = use_state(|| None::<TaskStats>);
  let modal =
    use_state(|| None::<ModalState>);
  let modal_busy = use_state(|| false);
  let notices =
    use_reducer(NoticeList::default);

  let handles = Handles {
    api: api.clone(),
    sequence: sequence.clone(),
    router: router.clone(),
    filters: filters.clone(),
    shown_filters: shown_filters.clone(),
    view: view.clone(),
    active_views: active_views.clone(),
    list: list.clone(),
    stats: stats.clone(),
    notices: notices.dispatcher()
  };

  {
    let handles = handles.clone();
    use_effect_with((), move |_| {
      tracing::info!("taskflow mounted");
      browser::request_notification_permission();
      handles.check_notifications();
      handles.navigate(LIST_VIEW);
      || ()
    });
  }

  let on_nav = {
    let handles = handles.clone();
    Callback::from(move |target: String| {
      handles.navigate(&target)
    })
  };

  let on_new = {
    let modal = modal.clone();
    Callback::from(move |_: ()| {
      modal.set(Some(ModalState::create()))
    })
  };

  let on_export = {
    let handles = handles.clone();
    Callback::from(move |_: ()| {
      let handles = handles.clone();
      spawn_local(async move {
        match handles.api.export_backup().await
        {
          | Ok(backup) => {
            let name =
              backup.file_name(local_today());
            match browser::download(
              &name,
              &backup.bytes
            ) {
              | Ok(()) => {
                handles.notify(Notice::success(
                  BACKUP_EXPORTED
                ))
              }
              | Err(err) => {
                tracing::error!(error = %err, "saving backup failed");
                handles.notify(Notice::error(
                  BACKUP_EXPORT_FAILED
                ));
              }
            }
          }
          | Err(err) => {
            tracing::error!(error = %err, "backup export failed");
            handles.notify(Notice::error(
              BACKUP_EXPORT_FAILED
            ));
          }
        }
      });
    })
  };

  let on_status_filter = {
    let handles = handles.clone();
    Callback::from(
      move |status: Option<Status>| {
        handles
          .update_filters(|f| f.status = status)
      }
    )
  };

  let on_priority_filter = {
    let handles = handles.clone();
    Callback::from(
      move |priority: Option<Priority>| {
        handles.update_filters(|f| {
          f.priority = priority
        })
      }
    )
  };

  let on_date_filter = {
    let handles = handles.clone();
    Callback::from(
      move |filter: Option<DateFilter>| {
        handles.update_filters(|f| {
          f.set_date_filter(filter)
        })
      }
    )
  };

  let on_sort = {
    let handles = handles.clone();
    Callback::from(move |selector: String| {
      handles
        .update_filters(|f| f.set_sort(&selector))
    })
  };

  let on_search_input = {
    let handles = handles.clone();
    let search_text = search_text.clone();
    let search_generation =
      search_generation.clone();
    Callback::from(move |text: String| {
      search_text.set(text.clone());
      let generation = {
        let mut current =
          search_generation.borrow_mut();
        *current += 1;
        *current
      };

      let handles = handles.clone();
      let search_generation =
        search_generation.clone();
      spawn_local(async move {
        TimeoutFuture::new(SEARCH_DEBOUNCE_MS)
          .await;
        if *search_generation.borrow()
          != generation
        {
          return;
        }
        handles
          .update_filters(|f| f.set_search(&text));
      });
    })
  };

  let on_clear_filters = {
    let handles = handles.clone();
    let search_text = search_text.clone();
    let search_generation =
      search_generation.clone();
    Callback::from(move |_: ()| {
      *search_generation.borrow_mut() += 1;
      search_text.set(String::new());
      handles.update_filters(FilterState::clear);
    })
  };

  let on_open_task = {
    let handles = handles.clone();
    let modal = modal.clone();
    Callback::from(move |id: Uuid| {
      let handles = handles.clone();
      let modal = modal.clone();
      spawn_local(async move {
        match handles.api.get_task(id).await {
          | Ok(task) => {
            modal.set(Some(ModalState::for_task(
              task, false
            )))
          }
          | Err(err) => {
            tracing::error!(task = %id, error = %err, "loading task failed");
            handles.notify(Notice::error(
              TASK_LOAD_FAILED
            ));
          }
        }
      });
    })
  };

  let on_set_status = {
    let handles = handles.clone();
    Callback::from(
      move |(id, status): (Uuid, Status)| {
        let handles = handles.clone();
        spawn_local(async move {
          match handles
            .api
            .set_status(id, status)
            .await
          {
            | Ok(_) => {
              handles.notify(Notice::success(
                STATUS_UPDATED
              ));
              handles.after_mutation();
            }
            | Err(err) => {
              tracing::error!(task = %id, error = %err, "status update failed");
              handles.notify(Notice::error(
                STATUS_UPDATE_FAILED
              ));
            }
          }
        });
      }
    )
  };

  let on_draft = {
    let modal = modal.clone();
    Callback::from(move |draft: TaskDraft| {
      if let Some(mut current) =
        (*modal).clone()
      {
        current.draft = draft;
        current.error = None;
        modal.set(Some(current));
      }
    })
  };

  let on_edit = {
    let modal = modal.clone();
    Callback::from(move |_: ()| {
      if let Some(mut current) =
        (*modal).clone()
        && let ModalMode::View(id) =
          current.mode
      {
        current.mode = ModalMode::Edit(id);
        modal.set(Some(current));
      }
    })
  };

  let on_close = {
    let modal = modal.clone();
    let modal_busy = modal_busy.clone();
    Callback::from(move |_: ()| {
      modal_busy.set(false);
      modal.set(None);
    })
  };

  let on_submit = {
    let handles = handles.clone();
    let modal = modal.clone();
    let modal_busy = modal_busy.clone();
    Callback::from(move |_: ()| {
      let Some(mut current) = (*modal).clone()
      else {
        return;
      };
      if let Err(err) = current.draft.validate()
      {
        current.error = Some(err.to_string());
        modal.set(Some(current));
        return;
      }

      modal_busy.set(true);
      let handles = handles.clone();
      let modal = modal.clone();
      let modal_busy = modal_busy.clone();
      spawn_local(async move {
        let result = match current.task_id() {
          | Some(id) => handles
            .api
            .update_task(id, &current.draft)
            .await
            .map(|_| TASK_UPDATED),
          | None => handles
            .api
            .create_task(&current.draft)
            .await
            .map(|_| TASK_CREATED)
        };
        modal_busy.set(false);
        match result {
          | Ok(message) => {
            modal.set(None);
            handles.notify(Notice::success(message));
            handles.after_mutation();
          }
          | Err(err) => {
            tracing::error!(error = %err, "saving task failed");
            handles.notify(Notice::error(
              TASK_SAVE_FAILED
            ));
          }
        }
      });
    })
  };

  let on_delete = {
    let handles = handles.clone();
    let modal = modal.clone();
    let modal_busy = modal_busy.clone();
    Callback::from(move |_: ()| {
      let Some(id) = (*modal)
        .as_ref()
        .and_then(ModalState::task_id)
      else {
        return;
      };
      if !gloo::dialogs::confirm(
        DELETE_CONFIRMATION
      ) {
        tracing::debug!(task = %id, "deletion cancelled");
        return;
      }

      modal_busy.set(true);
      let handles = handles.clone();
      let modal = modal.clone();
      let modal_busy = modal_busy.clone();
      spawn_local(async move {
        let result =
          handles.api.delete_task(id).await;
        modal_busy.set(false);
        match result {
          | Ok(()) => {
            modal.set(None);
            handles.notify(Notice::success(
              TASK_DELETED
            ));
            handles.after_mutation();
          }
          | Err(err) => {
            tracing::error!(task = %id, error = %err, "deleting task failed");
            handles.notify(Notice::error(
              TASK_DELETE_FAILED
            ));
          }
        }
      });
    })
  };

  let on_dismiss = {
    let notices = notices.dispatcher();
    Callback::from(move |id: u64| {
      notices.dispatch(NoticeAction::Dismiss(id))
    })
  };

  let today = local_today();
  let list_body = match &*list {
    | ListView::Loading => html! {
        <div class="loading">{ "Loading tasks..." }</div>
    },
    | ListView::Failed => html! {
        <div class="empty-state">{ "Error loading tasks. Please try again." }</div>
    },
    | ListView::Loaded(tasks) if tasks.is_empty() => html! {
        <div class="empty-state">{ "No tasks found. Create your first task!" }</div>
    },
    | ListView::Loaded(tasks) => html! {
        <div class="task-grid">
            {
                for tasks.iter().map(|task| html! {
                    <TaskCard
                        key={task.id.to_string()}
                        task={task.clone()}
                        today={today}
                        on_open={on_open_task.clone()}
                        on_status={on_set_status.clone()}
                    />
                })
            }
        </div>
    }
  };

  let section_class = |name: &str| {
    classes!(
      "view",
      active_views
        .contains(name)
        .then_some("active")
    )
  };

  html! {
      <div class="app">
          <NavBar
              active={(*view).clone()}
              on_nav={on_nav}
              on_new={on_new}
              on_export={on_export}
          />
          <main>
              <section class={section_class(LIST_VIEW)} id="list-view">
                  <FilterBar
                      filters={(*shown_filters).clone()}
                      search_text={(*search_text).clone()}
                      on_status={on_status_filter}
                      on_priority={on_priority_filter}
                      on_date={on_date_filter}
                      on_search_input={on_search_input}
                      on_sort={on_sort}
                      on_clear={on_clear_filters}
                  />
                  { list_body }
              </section>
              <section class={section_class(STATS_VIEW)} id="stats-view">
                  <StatsPanel stats={(*stats).clone()} />
              </section>
          </main>
          {
              if let Some(state) = (*modal).clone() {
                  html! {
                      <TaskModal
                          state={state}
                          busy={*modal_busy}
                          on_draft={on_draft}
                          on_submit={on_submit}
                          on_edit={on_edit}
                          on_delete={on_delete}
                          on_close={on_close}
                      />
                  }
              } else {
                  html! {}
              }
          }
          <NoticeStack
              notices={notices.items.clone()}
              on_dismiss={on_dismiss}
          />
      </div>
  }
}
