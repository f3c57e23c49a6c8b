use chrono::{
  DateTime,
  Local,
  Utc
};
use taskflow_shared::datetime::{
  format_api_date,
  parse_api_date
};
use taskflow_shared::{
  Priority,
  StatusChange,
  TaskDraft
};
use web_sys::{
  Event,
  HtmlInputElement,
  HtmlSelectElement,
  HtmlTextAreaElement,
  InputEvent,
  MouseEvent,
  SubmitEvent
};
use yew::{
  Callback,
  Html,
  Properties,
  TargetCast,
  function_component,
  html
};

use crate::app::state::{
  ModalMode,
  ModalState
};

#[derive(Properties, PartialEq)]
pub struct TaskModalProps {
  pub state:     ModalState,
  pub busy:      bool,
  pub on_draft:  Callback<TaskDraft>,
  pub on_submit: Callback<()>,
  pub on_edit:   Callback<()>,
  pub on_delete: Callback<()>,
  pub on_close:  Callback<()>
}

fn format_timestamp(
  ts: DateTime<Utc>
) -> String {
  ts.with_timezone(&Local)
    .format("%b %-d, %Y %I:%M %p")
    .to_string()
}

fn status_history(
  history: &[StatusChange]
) -> Html {
  if history.is_empty() {
    return html! {
        <div class="empty-state">{ "No status history available" }</div>
    };
  }

  html! {
      <>
          {
              for history.iter().map(|entry| {
                  let slug = entry
                      .parsed_status()
                      .map_or("unknown", |status| status.slug());
                  html! {
                      <div class="history-item">
                          <span class={format!("badge badge-status-{slug}")}>
                              { entry.status.replace('_', " ") }
                          </span>
                          <span>{ format_timestamp(entry.timestamp) }</span>
                      </div>
                  }
              })
          }
      </>
  }
}

#[function_component(TaskModal)]
pub fn task_modal(
  props: &TaskModalProps
) -> Html {
  let state = &props.state;
  let read_only = state.read_only();
  let draft = state.draft.clone();

  let title = match state.mode {
    | ModalMode::Create => "New Task",
    | ModalMode::View(_) => "Task Details",
    | ModalMode::Edit(_) => "Edit Task"
  };

  let on_title = {
    let draft = draft.clone();
    props.on_draft.reform(
      move |e: InputEvent| {
        let input: HtmlInputElement =
          e.target_unchecked_into();
        TaskDraft {
          title: input.value(),
          ..draft.clone()
        }
      }
    )
  };

  let on_description = {
    let draft = draft.clone();
    props.on_draft.reform(
      move |e: InputEvent| {
        let area: HtmlTextAreaElement =
          e.target_unchecked_into();
        let value = area.value();
        TaskDraft {
          description: (!value.trim().is_empty())
            .then_some(value),
          ..draft.clone()
        }
      }
    )
  };

  let on_priority = {
    let draft = draft.clone();
    props.on_draft.reform(move |e: Event| {
      let select: HtmlSelectElement =
        e.target_unchecked_into();
      TaskDraft {
        priority: select
          .value()
          .parse()
          .unwrap_or_default(),
        ..draft.clone()
      }
    })
  };

  let on_due = {
    let draft = draft.clone();
    props.on_draft.reform(move |e: Event| {
      let input: HtmlInputElement =
        e.target_unchecked_into();
      TaskDraft {
        due_date: parse_api_date(
          &input.value()
        )
        .ok(),
        ..draft.clone()
      }
    })
  };

  let on_submit = {
    let on_submit = props.on_submit.clone();
    move |e: SubmitEvent| {
      e.prevent_default();
      on_submit.emit(());
    }
  };
  let on_edit = props.on_edit.reform(|_: MouseEvent| ());
  let on_delete =
    props.on_delete.reform(|_: MouseEvent| ());
  let on_close =
    props.on_close.reform(|_: MouseEvent| ());

  let due_value = draft
    .due_date
    .map(format_api_date)
    .unwrap_or_default();

  html! {
      <div class="modal active">
          <div class="modal-content">
              <div class="modal-header">
                  <h2>{ title }</h2>
                  <button class="close-btn" onclick={on_close.clone()}>{ "×" }</button>
              </div>
              <form id="task-form" onsubmit={on_submit}>
                  <div class="form-group">
                      <label for="task-title">{ "Title *" }</label>
                      <input
                          id="task-title"
                          type="text"
                          value={draft.title.clone()}
                          disabled={read_only}
                          oninput={on_title}
                      />
                  </div>
                  <div class="form-group">
                      <label for="task-description">{ "Description" }</label>
                      <textarea
                          id="task-description"
                          value={draft.description.clone().unwrap_or_default()}
                          disabled={read_only}
                          oninput={on_description}
                      />
                  </div>
                  <div class="form-row">
                      <div class="form-group">
                          <label for="task-priority">{ "Priority" }</label>
                          <select id="task-priority" disabled={read_only} onchange={on_priority}>
                              {
                                  for Priority::ALL.into_iter().map(|priority| html! {
                                      <option
                                          value={priority.as_str()}
                                          selected={draft.priority == priority}
                                      >
                                          { priority.as_str() }
                                      </option>
                                  })
                              }
                          </select>
                      </div>
                      <div class="form-group">
                          <label for="task-due-date">{ "Due Date" }</label>
                          <input
                              id="task-due-date"
                              type="date"
                              value={due_value}
                              disabled={read_only}
                              onchange={on_due}
                          />
                      </div>
                  </div>
                  {
                      if let Some(task) = state.task.as_ref() {
                          html! {
                              <div class="form-group" id="status-group">
                                  <label>{ "Status" }</label>
                                  <span class={format!("badge badge-status-{}", task.status.slug())}>
                                      { task.status.label() }
                                  </span>
                              </div>
                          }
                      } else {
                          html! {}
                      }
                  }
                  {
                      match (&state.task, read_only) {
                          | (Some(task), true) => html! {
                              <div id="status-history-section">
                                  <h3>{ "Status History" }</h3>
                                  <div id="status-history-list">
                                      { status_history(&task.status_history) }
                                  </div>
                              </div>
                          },
                          | _ => html! {},
                      }
                  }
                  {
                      if let Some(error) = state.error.clone() {
                          html! { <div class="form-error">{ error }</div> }
                      } else {
                          html! {}
                      }
                  }
                  <div class="modal-actions">
                      {
                          if state.task_id().is_some() {
                              html! {
                                  <button
                                      type="button"
                                      class="btn danger"
                                      disabled={props.busy}
                                      onclick={on_delete}
                                  >
                                      { "Delete" }
                                  </button>
                              }
                          } else {
                              html! {}
                          }
                      }
                      <button type="button" class="btn" onclick={on_close}>{ "Cancel" }</button>
                      {
                          match state.mode {
                              | ModalMode::View(_) => html! {
                                  <button type="button" class="btn primary" onclick={on_edit}>
                                      { "Edit" }
                                  </button>
                              },
                              | ModalMode::Edit(_) => html! {
                                  <button type="submit" class="btn primary" disabled={props.busy}>
                                      { "Update" }
                                  </button>
                              },
                              | ModalMode::Create => html! {
                                  <button type="submit" class="btn primary" disabled={props.busy}>
                                      { "Save" }
                                  </button>
                              },
                          }
                      }
                  </div>
              </form>
          </div>
      </div>
  }
}
