use gloo::timers::callback::Timeout;
use taskflow_shared::Notice;
use taskflow_shared::notice::NOTICE_TIMEOUT_MS;
use web_sys::MouseEvent;
use yew::{
  Callback,
  Html,
  Properties,
  classes,
  function_component,
  html,
  use_effect_with
};

#[derive(Properties, PartialEq)]
pub struct NoticeStackProps {
  pub notices:    Vec<(u64, Notice)>,
  pub on_dismiss: Callback<u64>
}

#[function_component(NoticeStack)]
pub fn notice_stack(
  props: &NoticeStackProps
) -> Html {
  html! {
      <div class="notifications">
          {
              for props.notices.iter().map(|(id, notice)| html! {
                  <NoticeItem
                      key={*id}
                      id={*id}
                      notice={notice.clone()}
                      on_dismiss={props.on_dismiss.clone()}
                  />
              })
          }
      </div>
  }
}

#[derive(Properties, PartialEq)]
struct NoticeItemProps {
  id:         u64,
  notice:     Notice,
  on_dismiss: Callback<u64>
}

/// One toast; removes itself once its
/// timer fires.
#[function_component(NoticeItem)]
fn notice_item(
  props: &NoticeItemProps
) -> Html {
  {
    let on_dismiss =
      props.on_dismiss.clone();
    use_effect_with(props.id, move |id| {
      let id = *id;
      let timeout =
        Timeout::new(NOTICE_TIMEOUT_MS, move || {
          on_dismiss.emit(id)
        });
      move || drop(timeout)
    });
  }

  let on_click = {
    let on_dismiss =
      props.on_dismiss.clone();
    let id = props.id;
    move |_: MouseEvent| on_dismiss.emit(id)
  };

  html! {
      <div
          class={classes!("notification", props.notice.kind.class())}
          onclick={on_click}
      >
          { props.notice.message.clone() }
      </div>
  }
}
