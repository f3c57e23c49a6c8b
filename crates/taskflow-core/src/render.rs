use std::io::{self, IsTerminal, Write};

use chrono::{Local, NaiveDate};
use taskflow_shared::classify::classify_all;
use taskflow_shared::datetime::format_api_date;
use taskflow_shared::{
    Classification, DueNotification, DueStyle, Notice, NoticeKind, Priority, Status, Task, TaskStats,
};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::controller::ListState;

const SHORT_ID_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.color()? && io::stdout().is_terminal();
        Ok(Self { color })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, out, state, today))]
    pub fn write_list<W: Write>(
        &self,
        out: &mut W,
        state: &ListState,
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        match state {
            ListState::NotLoaded => Ok(()),
            ListState::Loading => {
                writeln!(out, "Loading tasks...")?;
                Ok(())
            }
            ListState::Failed => {
                writeln!(out, "Error loading tasks. Please try again.")?;
                Ok(())
            }
            ListState::Loaded(tasks) => self.write_task_table(out, tasks, today),
        }
    }

    pub fn write_task_table<W: Write>(
        &self,
        out: &mut W,
        tasks: &[Task],
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        if tasks.is_empty() {
            writeln!(out, "No tasks found. Create your first task!")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "Status".to_string(),
            "Priority".to_string(),
            "Due".to_string(),
            "Title".to_string(),
        ];

        let mut rows = Vec::with_capacity(tasks.len());
        for (task, class) in classify_all(tasks, today) {
            let id = short_id(task);
            let due = self.paint_due(&class);
            let status = self.paint_status(task.status);
            let priority = self.paint_priority(task.priority);
            let title = if class.is_overdue {
                self.paint(&task.title, "1")
            } else {
                task.title.clone()
            };
            rows.push(vec![self.paint(&id, "33"), status, priority, due, title]);
        }

        write_table(out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, out, task, today), fields(task = %task.id))]
    pub fn write_task_detail<W: Write>(
        &self,
        out: &mut W,
        task: &Task,
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        let class = taskflow_shared::classify(task, today);

        writeln!(out, "id          {}", task.id)?;
        writeln!(out, "title       {}", task.title)?;
        writeln!(
            out,
            "description {}",
            task.description.as_deref().unwrap_or_default()
        )?;
        writeln!(out, "status      {}", self.paint_status(task.status))?;
        writeln!(out, "priority    {}", self.paint_priority(task.priority))?;
        match task.due_date {
            Some(due) => writeln!(
                out,
                "due         {} ({})",
                format_api_date(due),
                self.paint_due(&class)
            )?,
            None => writeln!(out, "due         {}", class.label.text)?,
        }
        if let Some(created) = task.created_at {
            writeln!(out, "created     {}", format_timestamp(created))?;
        }
        if let Some(updated) = task.status_updated_at {
            writeln!(out, "updated     {}", format_timestamp(updated))?;
        }

        writeln!(out)?;
        writeln!(out, "Status history")?;
        if task.status_history.is_empty() {
            writeln!(out, "  No status history available")?;
        }
        for entry in &task.status_history {
            let label = entry.status.replacen('_', " ", 1);
            let label = match entry.parsed_status() {
                Some(status) => self.paint(&label, status_color(status)),
                None => label,
            };
            writeln!(out, "  {}  {}", format_timestamp(entry.timestamp), label)?;
        }

        Ok(())
    }

    pub fn write_stats<W: Write>(&self, out: &mut W, stats: &TaskStats) -> anyhow::Result<()> {
        let rows = vec![
            vec!["Total".to_string(), stats.total_tasks.to_string()],
            vec![
                self.paint_status(Status::Open),
                stats.open_tasks.to_string(),
            ],
            vec![
                self.paint_status(Status::InProgress),
                stats.in_progress_tasks.to_string(),
            ],
            vec![
                self.paint_status(Status::Completed),
                stats.completed_tasks.to_string(),
            ],
            vec![self.paint("OVERDUE", "31"), stats.overdue_tasks.to_string()],
        ];
        write_table(out, vec!["Tasks".to_string(), "Count".to_string()], rows)
    }

    pub fn write_notice<W: Write>(&self, out: &mut W, notice: &Notice) -> anyhow::Result<()> {
        let line = match notice.kind {
            NoticeKind::Success => self.paint(&notice.message, "32"),
            NoticeKind::Error => self.paint(&format!("error: {}", notice.message), "31"),
        };
        writeln!(out, "{line}")?;
        Ok(())
    }

    pub fn write_alerts<W: Write>(
        &self,
        out: &mut W,
        alerts: &[DueNotification],
    ) -> anyhow::Result<()> {
        if alerts.is_empty() {
            writeln!(out, "Nothing overdue or due today.")?;
        }
        for alert in alerts {
            let color = if alert.tag == "overdue-tasks" {
                "31"
            } else {
                "33"
            };
            writeln!(out, "{}", self.paint(&alert.title, color))?;
            writeln!(out, "  {}", alert.body)?;
        }
        Ok(())
    }

    fn paint_due(&self, class: &Classification) -> String {
        let text = &class.label.text;
        match class.label.style {
            DueStyle::Overdue => self.paint(text, "31"),
            DueStyle::DueToday => self.paint(text, "33"),
            DueStyle::Plain if class.is_due_soon => self.paint(text, "36"),
            DueStyle::Plain => text.to_string(),
        }
    }

    fn paint_status(&self, status: Status) -> String {
        self.paint(status.label(), status_color(status))
    }

    fn paint_priority(&self, priority: Priority) -> String {
        let code = match priority {
            Priority::High => "31",
            Priority::Medium => "33",
            Priority::Low => "32",
        };
        self.paint(priority.as_str(), code)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn status_color(status: Status) -> &'static str {
    match status {
        Status::Open => "34",
        Status::InProgress => "35",
        Status::Completed => "32",
    }
}

fn short_id(task: &Task) -> String {
    task.id.simple().to_string()[..SHORT_ID_LEN].to_string()
}

fn format_timestamp(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%b %-d, %Y %H:%M")
        .to_string()
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
