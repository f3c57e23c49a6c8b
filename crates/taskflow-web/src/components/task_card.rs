use chrono::NaiveDate;
use taskflow_shared::{
  Status,
  Task,
  classify
};
use uuid::Uuid;
use web_sys::MouseEvent;
use yew::{
  Callback,
  Html,
  Properties,
  classes,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct TaskCardProps {
  pub task:      Task,
  pub today:     NaiveDate,
  pub on_open:   Callback<Uuid>,
  pub on_status: Callback<(Uuid, Status)>
}

#[function_component(TaskCard)]
pub fn task_card(
  props: &TaskCardProps
) -> Html {
  let task = &props.task;
  let id = task.id;
  let due = classify(task, props.today);

  let on_open = {
    let on_open = props.on_open.clone();
    move |_: MouseEvent| on_open.emit(id)
  };

  html! {
      <div
          class={classes!(
              "task-card",
              due.card_classes(),
              format!("{}-priority", task.priority.slug())
          )}
          data-task-id={id.to_string()}
          onclick={on_open}
      >
          <div class="task-header">
              <div class="task-title">{ task.title.clone() }</div>
              {
                  if let Some(description) = task.description.clone() {
                      html! { <div class="task-description">{ description }</div> }
                  } else {
                      html! {}
                  }
              }
          </div>
          <div class="task-meta">
              <span class={format!("badge badge-priority-{}", task.priority.slug())}>
                  { task.priority.as_str() }
              </span>
              <span class={format!("badge badge-status-{}", task.status.slug())}>
                  { task.status.label() }
              </span>
          </div>
          {
              if task.due_date.is_some() {
                  html! {
                      <div class={classes!("task-due-date", due.label.style.class())}>
                          { due.label.text.clone() }
                      </div>
                  }
              } else {
                  html! {}
              }
          }
          <div class="task-actions">
              {
                  for task.status.transitions().map(|status| {
                      let on_status = props.on_status.clone();
                      let onclick = move |e: MouseEvent| {
                          e.stop_propagation();
                          on_status.emit((id, status));
                      };
                      html! {
                          <button class="status-btn" onclick={onclick}>
                              { format!("Mark as {}", status.label()) }
                          </button>
                      }
                  })
              }
          </div>
      </div>
  }
}
