use taskflow_shared::router::{
  LIST_VIEW,
  STATS_VIEW
};
use web_sys::MouseEvent;
use yew::{
  Callback,
  Html,
  Properties,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct NavBarProps {
  pub active:    String,
  pub on_nav:    Callback<String>,
  pub on_new:    Callback<()>,
  pub on_export: Callback<()>
}

#[function_component(NavBar)]
pub fn nav_bar(
  props: &NavBarProps
) -> Html {
  let make_item = |view: &str, label: &str| {
    let class = if props.active == view {
      "nav-btn active"
    } else {
      "nav-btn"
    };
    let on_nav = props.on_nav.clone();
    let view = view.to_string();
    html! {
        <button class={class} onclick={move |_| on_nav.emit(view.clone())}>
            { label }
        </button>
    }
  };

  let on_new = props.on_new.reform(|_: MouseEvent| ());
  let on_export =
    props.on_export.reform(|_: MouseEvent| ());

  html! {
      <header class="navbar">
          <div class="brand">{ "TaskFlow" }</div>
          <nav class="nav-links">
              { make_item(LIST_VIEW, "Tasks") }
              { make_item(STATS_VIEW, "Statistics") }
          </nav>
          <div class="actions">
              <button class="btn primary" onclick={on_new}>{ "New Task" }</button>
              <button class="btn" onclick={on_export}>{ "Export Backup" }</button>
          </div>
      </header>
  }
}
