use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, anyhow, bail};
use clap::Parser;
use taskflow_shared::notice::DELETE_CONFIRMATION;
use taskflow_shared::router::{LIST_VIEW, STATS_VIEW};
use taskflow_shared::{QueryParams, TaskApi, TaskDraft};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::cli::{CliCommand, ListArgs, ShellCommand, ShellLine, split_line};
use crate::config::Config;
use crate::controller::{Command, ModalMode, UiController};
use crate::render::Renderer;

const MIN_ID_PREFIX: usize = 4;

/// Whether error notices end the command
/// with an error or are only printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    OneShot,
    Shell,
}

enum Flow {
    Continue,
    Exit,
}

/// Terminal front end: turns CLI commands
/// into controller commands and prints the
/// resulting state.
pub struct App<A, R, W> {
    controller: UiController<A>,
    renderer: Renderer,
    export_dir: PathBuf,
    input: R,
    out: W,
}

impl<A, R, W> App<A, R, W>
where
    A: TaskApi,
    R: BufRead,
    W: Write,
{
    pub fn new(
        controller: UiController<A>,
        renderer: Renderer,
        export_dir: PathBuf,
        input: R,
        out: W,
    ) -> Self {
        Self {
            controller,
            renderer,
            export_dir,
            input,
            out,
        }
    }

    pub fn controller(&self) -> &UiController<A> {
        &self.controller
    }

    pub fn into_output(self) -> W {
        self.out
    }

    #[instrument(skip(self, command))]
    pub async fn execute(&mut self, command: CliCommand) -> anyhow::Result<()> {
        match command {
            CliCommand::Shell => self.shell().await,
            other => self.run_command(other, Mode::OneShot).await,
        }
    }

    async fn run_command(&mut self, command: CliCommand, mode: Mode) -> anyhow::Result<()> {
        debug!(?command, ?mode, "running cli command");
        match command {
            CliCommand::List(args) => self.cmd_list(args, mode).await,
            CliCommand::Show { id } => self.cmd_show(&id, mode).await,
            CliCommand::Add { title, fields } => {
                let mut draft = TaskDraft::new(title.join(" "));
                fields.apply(&mut draft, self.controller.today())?;
                self.controller
                    .dispatch(Command::SubmitTask { id: None, draft })
                    .await;
                self.flush_notices(mode)
            }
            CliCommand::Edit { id, title, fields } => {
                let id = self.resolve_id(&id).await?;
                self.controller
                    .dispatch(Command::OpenTask {
                        id,
                        mode: ModalMode::Edit,
                    })
                    .await;
                let Some(modal) = self.controller.modal() else {
                    return self.flush_notices(mode);
                };
                let mut draft = modal.draft.clone();
                if let Some(title) = title {
                    draft.title = title;
                }
                fields.apply(&mut draft, self.controller.today())?;
                self.controller
                    .dispatch(Command::SubmitTask { id: Some(id), draft })
                    .await;
                self.flush_notices(mode)
            }
            CliCommand::Status { id, status } => {
                let id = self.resolve_id(&id).await?;
                self.controller
                    .dispatch(Command::SetStatus { id, status })
                    .await;
                self.flush_notices(mode)
            }
            CliCommand::Delete { id, yes } => self.cmd_delete(&id, yes, mode).await,
            CliCommand::Stats => {
                self.controller
                    .dispatch(Command::Navigate(STATS_VIEW.to_string()))
                    .await;
                self.render_view()?;
                self.flush_notices(mode)
            }
            CliCommand::Export { dir } => {
                let dir = dir.unwrap_or_else(|| self.export_dir.clone());
                self.controller
                    .dispatch(Command::ExportBackup { dir })
                    .await;
                if let Some(path) = self.controller.last_export() {
                    writeln!(self.out, "Saved {}", path.display())?;
                }
                self.flush_notices(mode)
            }
            CliCommand::Notify => {
                self.controller.dispatch(Command::CheckNotifications).await;
                let alerts = self.controller.take_alerts();
                self.renderer.write_alerts(&mut self.out, &alerts)?;
                Ok(())
            }
            CliCommand::Shell => {
                writeln!(self.out, "already in a shell")?;
                Ok(())
            }
        }
    }

    async fn cmd_list(&mut self, args: ListArgs, mode: Mode) -> anyhow::Result<()> {
        if args.is_empty() {
            self.controller
                .dispatch(Command::Navigate(LIST_VIEW.to_string()))
                .await;
        } else {
            // Flags on `list` replace the filter set; `filter` in the shell adds to it.
            if self.controller.current_view() != LIST_VIEW {
                self.controller
                    .dispatch(Command::Navigate(LIST_VIEW.to_string()))
                    .await;
            }
            self.controller
                .dispatch(Command::ApplyFilters(args.to_filters()))
                .await;
        }
        self.render_view()?;
        self.flush_notices(mode)
    }

    async fn cmd_show(&mut self, raw_id: &str, mode: Mode) -> anyhow::Result<()> {
        let id = self.resolve_id(raw_id).await?;
        self.controller
            .dispatch(Command::OpenTask {
                id,
                mode: ModalMode::View,
            })
            .await;
        if let Some(task) = self.controller.modal().and_then(|m| m.task.as_ref()) {
            self.renderer
                .write_task_detail(&mut self.out, task, self.controller.today())?;
        }
        self.controller.dispatch(Command::CloseModal).await;
        self.flush_notices(mode)
    }

    async fn cmd_delete(&mut self, raw_id: &str, yes: bool, mode: Mode) -> anyhow::Result<()> {
        let id = self.resolve_id(raw_id).await?;
        if !yes && !self.confirm(DELETE_CONFIRMATION)? {
            info!(task = %id, "delete cancelled");
            writeln!(self.out, "Deletion cancelled.")?;
            return Ok(());
        }
        self.controller.dispatch(Command::DeleteTask { id }).await;
        self.flush_notices(mode)
    }

    #[instrument(skip(self))]
    async fn shell(&mut self) -> anyhow::Result<()> {
        info!("starting shell");
        self.controller.dispatch(Command::CheckNotifications).await;
        let alerts = self.controller.take_alerts();
        if !alerts.is_empty() {
            self.renderer.write_alerts(&mut self.out, &alerts)?;
        }
        self.controller
            .dispatch(Command::Navigate(LIST_VIEW.to_string()))
            .await;
        self.render_view()?;
        self.flush_notices(Mode::Shell)?;

        loop {
            write!(self.out, "taskflow> ")?;
            self.out.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.out)?;
                break;
            }

            let words = match split_line(&line) {
                Ok(words) => words,
                Err(err) => {
                    writeln!(self.out, "error: {err}")?;
                    continue;
                }
            };
            if words.is_empty() {
                continue;
            }

            let parsed = match ShellLine::try_parse_from(words) {
                Ok(parsed) => parsed,
                Err(err) => {
                    write!(self.out, "{}", err.render())?;
                    continue;
                }
            };

            match self.run_shell_command(parsed.command).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(err) => {
                    warn!(error = %err, "shell command failed");
                    writeln!(self.out, "error: {err:#}")?;
                }
            }
        }

        info!("shell closed");
        Ok(())
    }

    async fn run_shell_command(&mut self, command: ShellCommand) -> anyhow::Result<Flow> {
        match command {
            ShellCommand::Quit => return Ok(Flow::Exit),
            ShellCommand::View { view } => {
                self.controller.dispatch(Command::Navigate(view.clone())).await;
                if self.controller.current_view() != view {
                    bail!("unknown view: {view} (expected {LIST_VIEW} or {STATS_VIEW})");
                }
                self.render_view()?;
                self.flush_notices(Mode::Shell)?;
            }
            ShellCommand::Filter(args) => {
                let mut filters = self.controller.filters().clone();
                args.apply(&mut filters);
                self.controller.dispatch(Command::ApplyFilters(filters)).await;
                self.render_list()?;
                self.flush_notices(Mode::Shell)?;
            }
            ShellCommand::Clear => {
                self.controller.dispatch(Command::ClearFilters).await;
                self.render_list()?;
                self.flush_notices(Mode::Shell)?;
            }
            ShellCommand::Run(command) => self.run_command(command, Mode::Shell).await?,
        }
        Ok(Flow::Continue)
    }

    fn render_view(&mut self) -> anyhow::Result<()> {
        if self.controller.current_view() == STATS_VIEW {
            if let Some(stats) = self.controller.stats() {
                self.renderer.write_stats(&mut self.out, stats)?;
            }
            return Ok(());
        }
        self.render_list()
    }

    fn render_list(&mut self) -> anyhow::Result<()> {
        self.renderer.write_list(
            &mut self.out,
            self.controller.list(),
            self.controller.today(),
        )
    }

    /// Prints pending notices. In one-shot
    /// mode error notices become the
    /// command's error instead.
    fn flush_notices(&mut self, mode: Mode) -> anyhow::Result<()> {
        let mut failures = Vec::new();
        for notice in self.controller.take_notices() {
            if notice.is_error() && mode == Mode::OneShot {
                failures.push(notice.message);
                continue;
            }
            self.renderer.write_notice(&mut self.out, &notice)?;
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(failures.join("; ")))
        }
    }

    fn confirm(&mut self, question: &str) -> anyhow::Result<bool> {
        write!(self.out, "{question} [y/N] ")?;
        self.out.flush()?;
        let mut answer = String::new();
        self.input
            .read_line(&mut answer)
            .context("failed reading confirmation")?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }

    /// Accepts a full id or a unique prefix
    /// of at least four hex digits.
    #[instrument(skip(self))]
    async fn resolve_id(&self, raw: &str) -> anyhow::Result<Uuid> {
        let raw = raw.trim();
        if let Ok(id) = Uuid::parse_str(raw) {
            return Ok(id);
        }

        let prefix = raw.replace('-', "").to_ascii_lowercase();
        if prefix.len() < MIN_ID_PREFIX || !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("invalid task id: {raw}");
        }

        let tasks = self
            .controller
            .api()
            .list_tasks(&QueryParams::default())
            .await
            .with_context(|| format!("failed resolving task id {raw}"))?;

        let mut matches = tasks
            .iter()
            .filter(|task| task.id.simple().to_string().starts_with(&prefix));
        let first = matches
            .next()
            .ok_or_else(|| anyhow!("no task matches id {raw}"))?;
        if matches.next().is_some() {
            bail!("ambiguous task id: {raw}");
        }
        debug!(prefix = %prefix, id = %first.id, "resolved id prefix");
        Ok(first.id)
    }
}

/// Command to run when none is given on
/// the command line, from `default.command`.
pub fn default_command(cfg: &Config) -> anyhow::Result<CliCommand> {
    let raw = cfg
        .get("default.command")
        .unwrap_or_else(|| "list".to_string());
    let words = split_line(&raw)?;
    let parsed = ShellLine::try_parse_from(&words)
        .with_context(|| format!("invalid default.command: {raw}"))?;
    match parsed.command {
        ShellCommand::Run(command) => Ok(command),
        _ => bail!("default.command must be a regular command, got: {raw}"),
    }
}
