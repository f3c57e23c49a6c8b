//! Browser services outside yew: desktop
//! notifications and file downloads.

use gloo::file::{
  Blob,
  ObjectUrl
};
use gloo::timers::future::TimeoutFuture;
use taskflow_shared::DueNotification;
use wasm_bindgen::JsCast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
  Unsupported,
  Default,
  Granted,
  Denied
}

pub fn notification_permission()
-> NotificationPermission {
  let Some(window) = web_sys::window()
  else {
    return NotificationPermission::Unsupported;
  };

  let has_notification =
    js_sys::Reflect::has(
      window.as_ref(),
      &wasm_bindgen::JsValue::from_str(
        "Notification"
      )
    )
    .unwrap_or(false);

  if !has_notification {
    return NotificationPermission::Unsupported;
  }

  match web_sys::Notification::permission()
  {
    | web_sys::NotificationPermission::Default => {
      NotificationPermission::Default
    }
    | web_sys::NotificationPermission::Granted => {
      NotificationPermission::Granted
    }
    | web_sys::NotificationPermission::Denied => {
      NotificationPermission::Denied
    }
    | _ => NotificationPermission::Unsupported
  }
}

/// Asks once, only while the user has not
/// decided yet.
pub fn request_notification_permission() {
  if notification_permission()
    != NotificationPermission::Default
  {
    return;
  }

  match web_sys::Notification::request_permission()
  {
    | Ok(promise) => {
      wasm_bindgen_futures::spawn_local(
        async move {
          match wasm_bindgen_futures::JsFuture::from(promise).await {
            | Ok(_) => {
              tracing::info!(
                permission = ?notification_permission(),
                "notification permission \
                 request completed"
              );
            }
            | Err(error) => {
              tracing::error!(
                error = ?error,
                "notification permission \
                 request failed"
              );
            }
          }
        }
      );
    }
    | Err(error) => {
      tracing::error!(
        error = ?error,
        "failed starting notification \
         permission request"
      );
    }
  }
}

pub fn emit_notification(
  notification: &DueNotification
) -> bool {
  if notification_permission()
    != NotificationPermission::Granted
  {
    tracing::debug!(
      tag = notification.tag,
      "skipping notification because \
       permission is not granted"
    );
    return false;
  }

  let options =
    web_sys::NotificationOptions::new();
  options.set_body(&notification.body);
  options.set_icon("/favicon.ico");
  options.set_tag(notification.tag);

  match web_sys::Notification::new_with_options(
    &notification.title,
    &options
  ) {
    | Ok(_) => {
      tracing::info!(
        tag = notification.tag,
        "emitted due notification"
      );
      true
    }
    | Err(error) => {
      tracing::error!(
        error = ?error,
        tag = notification.tag,
        "failed to emit due notification"
      );
      false
    }
  }
}

/// Saves `bytes` through a temporary
/// object URL and a synthetic link click.
pub fn download(
  file_name: &str,
  bytes: &[u8]
) -> Result<(), String> {
  let document = web_sys::window()
    .and_then(|window| window.document())
    .ok_or_else(|| {
      "no document available".to_string()
    })?;

  let blob = Blob::new_with_options(
    bytes,
    Some("application/json")
  );
  let url = ObjectUrl::from(blob);

  let anchor = document
    .create_element("a")
    .map_err(|err| format!("{err:?}"))?
    .dyn_into::<web_sys::HtmlAnchorElement>()
    .map_err(|_| {
      "created element is not an anchor"
        .to_string()
    })?;
  anchor.set_href(&url);
  anchor.set_download(file_name);
  anchor.click();

  // Revoking right away can cancel the
  // download in some browsers.
  wasm_bindgen_futures::spawn_local(
    async move {
      TimeoutFuture::new(1_000).await;
      drop(url);
    }
  );

  tracing::info!(file = file_name, size = bytes.len(), "backup download started");
  Ok(())
}
