pub mod backup;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod controller;
pub mod render;

use std::ffi::OsString;
use std::io;

use anyhow::Context;
use clap::Parser;
use taskflow_shared::datetime::{
  local_today,
  today_in
};
use tracing::{
  debug,
  info
};

use crate::controller::Clock;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting taskflow CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    pre
      .rc_overrides
      .into_iter()
      .chain(
        cli
          .rc_overrides
          .into_iter()
          .map(|kv| (kv.key, kv.value))
      )
      .chain(cli.api.map(|url| {
        ("api.base_url".to_string(), url)
      }))
  );

  let api = client::HttpTaskApi::new(
    &cfg.base_url(),
    cfg.timeout()?
  )?;
  let clock: Clock =
    match cfg.timezone() {
      | Some(tz) => {
        Box::new(move || today_in(&tz))
      }
      | None => Box::new(local_today)
    };

  let command = match cli.command {
    | Some(command) => command,
    | None => {
      commands::default_command(&cfg)?
    }
  };

  let renderer =
    render::Renderer::new(&cfg)?;
  let mut app = commands::App::new(
    controller::UiController::new(
      api, clock
    ),
    renderer,
    cfg.export_dir(),
    io::stdin().lock(),
    io::stdout().lock()
  );

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async runtime"
      )?;
  runtime.block_on(app.execute(command))?;

  info!("done");
  Ok(())
}
