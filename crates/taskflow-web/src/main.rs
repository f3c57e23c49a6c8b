mod api;
mod app;
mod components;

fn main() {
  console_error_panic_hook::set_once();
  wasm_tracing::set_as_global_default();

  tracing::info!(
    "starting TaskFlow web frontend"
  );

  let mount = web_sys::window()
    .and_then(|window| {
      window.document()
    })
    .and_then(|document| {
      document.get_element_by_id("app")
    })
    .expect(
      "missing #app mount element"
    );

  let api_base = mount
    .get_attribute("data-api-base")
    .unwrap_or_default();

  yew::Renderer::<app::App>::with_root_and_props(
    mount,
    app::AppProps { api_base }
  )
  .render();
}
