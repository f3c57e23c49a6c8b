use taskflow_shared::TaskStats;
use yew::{
  Html,
  Properties,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct StatsPanelProps {
  pub stats: Option<TaskStats>
}

#[function_component(StatsPanel)]
pub fn stats_panel(
  props: &StatsPanelProps
) -> Html {
  let Some(stats) = props.stats.as_ref()
  else {
    return html! {
        <div class="loading">{ "Loading statistics..." }</div>
    };
  };

  let card = |label: &str,
              value: u64,
              class: &str| {
    html! {
        <div class={format!("stat-card {class}")}>
            <div class="stat-value">{ value }</div>
            <div class="stat-label">{ label.to_string() }</div>
        </div>
    }
  };

  html! {
      <div class="stats-grid">
          { card("Total Tasks", stats.total_tasks, "total") }
          { card("Open", stats.open_tasks, "open") }
          { card("In Progress", stats.in_progress_tasks, "in-progress") }
          { card("Completed", stats.completed_tasks, "completed") }
          { card("Overdue", stats.overdue_tasks, "overdue") }
      </div>
  }
}
