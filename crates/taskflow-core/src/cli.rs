use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail};
use chrono::{Days, NaiveDate};
use clap::{ArgAction, Args, Parser, Subcommand};
use taskflow_shared::datetime::parse_api_date;
use taskflow_shared::query::SORT_OPTIONS;
use taskflow_shared::{DateFilter, FilterState, Priority, Status, TaskDraft};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskflow",
    version,
    about = "TaskFlow: terminal client for the TaskFlow task service",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    /// Config file to load instead of the default location.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Backend base URL, same as `--rc api.base_url=<url>`.
    #[arg(long = "api")]
    pub api: Option<String>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// List tasks, optionally filtered and sorted.
    List(ListArgs),
    /// Show one task with its status history.
    Show { id: String },
    /// Create a task.
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Change title, description, priority or due date.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Move a task to OPEN, IN_PROGRESS or COMPLETED.
    Status { id: String, status: Status },
    /// Delete a task.
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
    /// Task counts by status.
    Stats,
    /// Download a backup of all tasks.
    Export {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Report overdue tasks and tasks due today.
    Notify,
    /// Interactive session keeping filters and view between commands.
    Shell,
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ListArgs {
    #[arg(long)]
    pub status: Option<Status>,

    #[arg(long)]
    pub priority: Option<Priority>,

    /// overdue, today or this-week.
    #[arg(long, value_parser = parse_date_filter)]
    pub due: Option<DateFilter>,

    #[arg(long)]
    pub search: Option<String>,

    /// Sort selector such as `dueDate-asc` or `priority-desc`.
    #[arg(long, value_parser = parse_sort)]
    pub sort: Option<String>,
}

impl ListArgs {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlays the given flags on `filters`.
    pub fn apply(&self, filters: &mut FilterState) {
        if let Some(status) = self.status {
            filters.status = Some(status);
        }
        if let Some(priority) = self.priority {
            filters.priority = Some(priority);
        }
        if let Some(due) = self.due {
            filters.set_date_filter(Some(due));
        }
        if let Some(search) = &self.search {
            filters.set_search(search);
        }
        if let Some(sort) = &self.sort {
            filters.set_sort(sort);
        }
    }

    pub fn to_filters(&self) -> FilterState {
        let mut filters = FilterState::default();
        self.apply(&mut filters);
        filters
    }
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct TaskFields {
    /// Empty text clears the description.
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    #[arg(short = 'p', long)]
    pub priority: Option<Priority>,

    /// today, tomorrow, +Nd, YYYY-MM-DD or none.
    #[arg(long)]
    pub due: Option<DueArg>,
}

impl TaskFields {
    pub fn apply(&self, draft: &mut TaskDraft, today: NaiveDate) -> anyhow::Result<()> {
        if let Some(description) = &self.description {
            let trimmed = description.trim();
            draft.description = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        if let Some(priority) = self.priority {
            draft.priority = priority;
        }
        if let Some(due) = self.due {
            draft.due_date = due.resolve(today)?;
        }
        Ok(())
    }
}

/// Due date as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueArg {
    Clear,
    Today,
    Tomorrow,
    InDays(u64),
    On(NaiveDate),
}

impl FromStr for DueArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase();
        match raw.as_str() {
            "" | "none" => return Ok(DueArg::Clear),
            "today" => return Ok(DueArg::Today),
            "tomorrow" => return Ok(DueArg::Tomorrow),
            _ => {}
        }

        if let Some(days) = raw.strip_prefix('+').and_then(|rest| rest.strip_suffix('d')) {
            let days: u64 = days
                .parse()
                .map_err(|_| anyhow!("invalid relative due date: {s}"))?;
            return Ok(DueArg::InDays(days));
        }

        parse_api_date(&raw)
            .map(DueArg::On)
            .map_err(|_| anyhow!("invalid due date: {s} (expected YYYY-MM-DD)"))
    }
}

impl DueArg {
    pub fn resolve(self, today: NaiveDate) -> anyhow::Result<Option<NaiveDate>> {
        let date = match self {
            DueArg::Clear => return Ok(None),
            DueArg::Today => Some(today),
            DueArg::Tomorrow => today.checked_add_days(Days::new(1)),
            DueArg::InDays(days) => today.checked_add_days(Days::new(days)),
            DueArg::On(date) => Some(date),
        };
        date.map(Some)
            .ok_or_else(|| anyhow!("due date out of range"))
    }
}

fn parse_date_filter(raw: &str) -> anyhow::Result<DateFilter> {
    DateFilter::from_keyword(raw).ok_or_else(|| {
        let known: Vec<&str> = DateFilter::ALL.iter().map(|f| f.keyword()).collect();
        anyhow!("unknown date filter: {raw} (expected one of {})", known.join(", "))
    })
}

fn parse_sort(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    if let Some((selector, _)) = SORT_OPTIONS
        .iter()
        .find(|(selector, _)| selector.eq_ignore_ascii_case(raw))
    {
        return Ok((*selector).to_string());
    }
    let known: Vec<&str> = SORT_OPTIONS.iter().map(|(selector, _)| *selector).collect();
    Err(anyhow!(
        "unknown sort: {raw} (expected one of {})",
        known.join(", ")
    ))
}

/// One line typed in `taskflow shell`.
#[derive(Parser, Debug, Clone)]
#[command(no_binary_name = true, name = "taskflow>")]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ShellCommand {
    /// Switch to the list or stats view.
    View { view: String },
    /// Add to the current filters and reload.
    Filter(ListArgs),
    /// Drop every filter and reload.
    Clear,
    /// Leave the shell.
    #[command(alias = "exit")]
    Quit,
    #[command(flatten)]
    Run(CliCommand),
}

/// Splits a shell line on whitespace,
/// keeping quoted runs together.
pub fn split_line(line: &str) -> anyhow::Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_word = false;

    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_word = true;
            }
            None if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(ch);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        bail!("unterminated quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.key=value` (or
/// `rc.key:value`) overrides out of the
/// argument list before clap sees it.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = rest.split_once('=').or_else(|| rest.split_once(':'));
            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k.to_string(), v.to_string()));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use chrono::NaiveDate;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use taskflow_shared::{DateFilter, Priority, Status, TaskDraft};

    use super::{
        CliCommand, DueArg, GlobalCli, ListArgs, ShellCommand, ShellLine, TaskFields,
        preprocess_args, split_line,
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).expect("date")
    }

    #[test]
    fn list_flags_build_filters() {
        let cli = GlobalCli::try_parse_from([
            "taskflow",
            "list",
            "--status",
            "in_progress",
            "--due",
            "this-week",
            "--search",
            "  report ",
            "--sort",
            "dueDate-asc",
        ])
        .expect("parse");
        let Some(CliCommand::List(args)) = cli.command else {
            panic!("expected list");
        };
        let filters = args.to_filters();
        assert_eq!(filters.status, Some(Status::InProgress));
        assert_eq!(filters.date_filter.as_deref(), Some("this-week"));
        assert_eq!(filters.search_term.as_deref(), Some("report"));
        assert_eq!(filters.sort.as_deref(), Some("dueDate-asc"));
    }

    #[test]
    fn unknown_date_filter_is_rejected() {
        assert!(GlobalCli::try_parse_from(["taskflow", "list", "--due", "someday"]).is_err());
        assert!(GlobalCli::try_parse_from(["taskflow", "list", "--sort", "color-asc"]).is_err());
    }

    #[test]
    fn sort_is_stored_in_canonical_case() {
        let cli = GlobalCli::try_parse_from(["taskflow", "list", "--sort", "DUEDATE-ASC"])
            .expect("parse");
        let Some(CliCommand::List(args)) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.sort.as_deref(), Some("dueDate-asc"));
    }

    #[test]
    fn add_joins_title_words() {
        let cli = GlobalCli::try_parse_from([
            "taskflow", "add", "Write", "report", "-p", "high", "--due", "+3d",
        ])
        .expect("parse");
        let Some(CliCommand::Add { title, fields }) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(title.join(" "), "Write report");

        let mut draft = TaskDraft::new(title.join(" "));
        fields.apply(&mut draft, today()).expect("apply");
        assert_eq!(draft.priority, Priority::High);
        assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2024, 6, 18));
    }

    #[test]
    fn due_arg_forms() {
        assert_eq!("none".parse::<DueArg>().expect("none"), DueArg::Clear);
        assert_eq!("Tomorrow".parse::<DueArg>().expect("tomorrow"), DueArg::Tomorrow);
        assert_eq!("+10d".parse::<DueArg>().expect("rel"), DueArg::InDays(10));
        assert_eq!(
            "2024-12-31".parse::<DueArg>().expect("abs"),
            DueArg::On(NaiveDate::from_ymd_opt(2024, 12, 31).expect("date"))
        );
        assert!("next week".parse::<DueArg>().is_err());
        assert!("2024-13-40".parse::<DueArg>().is_err());
        assert_eq!(
            DueArg::Tomorrow.resolve(today()).expect("resolve"),
            NaiveDate::from_ymd_opt(2024, 6, 16)
        );
    }

    #[test]
    fn blank_description_clears_it() {
        let mut draft = TaskDraft {
            description: Some("old".to_string()),
            ..TaskDraft::new("t")
        };
        let fields = TaskFields {
            description: Some("  ".to_string()),
            ..TaskFields::default()
        };
        fields.apply(&mut draft, today()).expect("apply");
        assert_eq!(draft.description, None);
    }

    #[test]
    fn shell_lines_parse_both_command_sets() {
        let words = split_line("filter --search \"quarterly report\"").expect("split");
        let line = ShellLine::try_parse_from(words).expect("parse");
        assert_eq!(
            line.command,
            ShellCommand::Filter(ListArgs {
                search: Some("quarterly report".to_string()),
                ..ListArgs::default()
            })
        );

        let line = ShellLine::try_parse_from(["list", "--due", "overdue"]).expect("parse");
        assert_eq!(
            line.command,
            ShellCommand::Run(CliCommand::List(ListArgs {
                due: Some(DateFilter::Overdue),
                ..ListArgs::default()
            }))
        );

        let line = ShellLine::try_parse_from(["exit"]).expect("parse");
        assert_eq!(line.command, ShellCommand::Quit);
    }

    #[test]
    fn split_line_rejects_open_quote() {
        assert!(split_line("add 'oops").is_err());
        assert_eq!(
            split_line("  add  ''  x ").expect("split"),
            vec!["add".to_string(), String::new(), "x".to_string()]
        );
    }

    #[test]
    fn positional_rc_overrides_are_extracted() {
        let raw: Vec<OsString> = ["taskflow", "rc.api.base_url=http://x", "stats"]
            .iter()
            .map(OsString::from)
            .collect();
        let pre = preprocess_args(&raw).expect("preprocess");
        assert_eq!(
            pre.rc_overrides,
            vec![("api.base_url".to_string(), "http://x".to_string())]
        );
        assert_eq!(pre.cleaned_args.len(), 2);
    }
}
