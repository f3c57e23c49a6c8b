//! Due-date classification shared by the
//! task list and the notification check.
//!
//! Both paths go through [`classify`] with
//! a `today` captured once per pass, so a
//! card and a notification can never
//! disagree about the same task.

use chrono::NaiveDate;
use tracing::debug;

use crate::datetime::short_date;
use crate::task::Task;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub enum DueStyle {
  #[default]
  Plain,
  Overdue,
  DueToday
}

impl DueStyle {
  /// Style class name, empty for plain.
  pub fn class(self) -> &'static str {
    match self {
      | DueStyle::Plain => "",
      | DueStyle::Overdue => "overdue",
      | DueStyle::DueToday => "due-today"
    }
  }
}

#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct DueLabel {
  pub text:  String,
  pub style: DueStyle
}

#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct Classification {
  pub is_overdue:   bool,
  pub is_due_today: bool,
  pub is_due_soon:  bool,
  pub label:        DueLabel
}

impl Classification {
  /// Card classes for the due state.
  pub fn card_classes(
    &self
  ) -> Vec<&'static str> {
    let mut classes = Vec::new();
    if self.is_overdue {
      classes.push("overdue");
    }
    if self.is_due_today {
      classes.push("due-today");
    }
    if self.is_due_soon {
      classes.push("due-soon");
    }
    classes
  }
}

/// Whole days from `today` to the task's
/// due date; `None` without a due date.
pub fn days_until_due(
  task: &Task,
  today: NaiveDate
) -> Option<i64> {
  task
    .due_date
    .map(|due| (due - today).num_days())
}

pub fn due_label(
  due: Option<NaiveDate>,
  today: NaiveDate
) -> DueLabel {
  let Some(due) = due else {
    return DueLabel {
      text:  "No due date".to_string(),
      style: DueStyle::Plain
    };
  };

  let diff = (due - today).num_days();
  match diff {
    | d if d < 0 => {
      DueLabel {
        text:  format!(
          "Overdue ({} days)",
          d.unsigned_abs()
        ),
        style: DueStyle::Overdue
      }
    }
    | 0 => {
      DueLabel {
        text:  "Due today".to_string(),
        style: DueStyle::DueToday
      }
    }
    | 1 => {
      DueLabel {
        text:  "Due tomorrow".to_string(),
        style: DueStyle::Plain
      }
    }
    | 2..=7 => {
      DueLabel {
        text:  format!("Due in {diff} days"),
        style: DueStyle::Plain
      }
    }
    | _ => {
      DueLabel {
        text:  short_date(due),
        style: DueStyle::Plain
      }
    }
  }
}

/// Classifies one task against `today`.
///
/// Due-today ignores status; overdue and
/// due-soon never apply to completed
/// tasks.
pub fn classify(
  task: &Task,
  today: NaiveDate
) -> Classification {
  let diff = days_until_due(task, today);
  let open = !task.is_completed();

  Classification {
    is_overdue:   open
      && diff.is_some_and(|d| d < 0),
    is_due_today: diff == Some(0),
    is_due_soon:  open
      && diff.is_some_and(|d| {
        (1..=7).contains(&d)
      }),
    label:        due_label(
      task.due_date,
      today
    )
  }
}

/// Classifies a render batch against one
/// `today`.
pub fn classify_all<'a>(
  tasks: &'a [Task],
  today: NaiveDate
) -> Vec<(&'a Task, Classification)> {
  tasks
    .iter()
    .map(|task| (task, classify(task, today)))
    .collect()
}

/// Browser-notification payload.
#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct DueNotification {
  pub tag:   &'static str,
  pub title: String,
  pub body:  String
}

/// Counts behind the start-up notification
/// check. Completed tasks are never
/// counted.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub struct DueAlerts {
  pub overdue:   usize,
  pub due_today: usize
}

impl DueAlerts {
  #[tracing::instrument(level = "debug", skip(tasks), fields(task_count = tasks.len()))]
  pub fn collect(
    tasks: &[Task],
    today: NaiveDate
  ) -> Self {
    let mut alerts = Self::default();
    for task in tasks {
      if task.is_completed() {
        continue;
      }
      let c = classify(task, today);
      if c.is_overdue {
        alerts.overdue += 1;
      }
      if c.is_due_today {
        alerts.due_today += 1;
      }
    }
    debug!(
      overdue = alerts.overdue,
      due_today = alerts.due_today,
      "collected due alerts"
    );
    alerts
  }

  pub fn is_empty(&self) -> bool {
    self.overdue == 0
      && self.due_today == 0
  }

  pub fn notifications(
    &self
  ) -> Vec<DueNotification> {
    let mut out = Vec::new();
    if self.overdue > 0 {
      let n = self.overdue;
      out.push(DueNotification {
        tag:   "overdue-tasks",
        title: format!(
          "TaskFlow: {n} overdue task(s)"
        ),
        body:  format!(
          "You have {n} task(s) that are \
           overdue."
        )
      });
    }
    if self.due_today > 0 {
      let n = self.due_today;
      out.push(DueNotification {
        tag:   "due-today-tasks",
        title: format!(
          "TaskFlow: {n} task(s) due today"
        ),
        body:  format!(
          "You have {n} task(s) due today."
        )
      });
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use pretty_assertions::assert_eq;
  use uuid::Uuid;

  use super::{
    DueAlerts,
    DueStyle,
    classify,
    due_label
  };
  use crate::task::{
    Priority,
    Status,
    Task
  };

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  fn task(
    due: Option<NaiveDate>,
    status: Status
  ) -> Task {
    Task {
      id: Uuid::new_v4(),
      title: "Review budget".to_string(),
      description: None,
      priority: Priority::Medium,
      status,
      due_date: due,
      created_at: None,
      status_updated_at: None,
      status_history: Vec::new()
    }
  }

  fn today() -> NaiveDate {
    date(2024, 6, 15)
  }

  #[test]
  fn no_due_date_is_never_flagged() {
    for status in Status::ALL {
      let c =
        classify(&task(None, status), today());
      assert_eq!(
        c.label.text,
        "No due date"
      );
      assert!(!c.is_overdue);
      assert!(!c.is_due_today);
      assert!(!c.is_due_soon);
    }
  }

  #[test]
  fn yesterday_is_overdue_by_one_day() {
    let c = classify(
      &task(
        Some(date(2024, 6, 14)),
        Status::Open
      ),
      today()
    );
    assert!(c.is_overdue);
    assert_eq!(
      c.label.text,
      "Overdue (1 days)"
    );
    assert_eq!(
      c.label.style,
      DueStyle::Overdue
    );
  }

  #[test]
  fn completed_task_is_not_overdue() {
    let c = classify(
      &task(
        Some(date(2024, 6, 14)),
        Status::Completed
      ),
      today()
    );
    assert!(!c.is_overdue);
  }

  #[test]
  fn due_today_ignores_status_on_cards() {
    let c = classify(
      &task(
        Some(today()),
        Status::Completed
      ),
      today()
    );
    assert!(c.is_due_today);
    assert_eq!(
      c.card_classes(),
      vec!["due-today"]
    );
  }

  #[test]
  fn label_boundaries() {
    let cases = [
      (1, "Due tomorrow"),
      (2, "Due in 2 days"),
      (7, "Due in 7 days"),
      (8, "Jun 23, 2024")
    ];
    for (offset, expected) in cases {
      let due = today()
        + chrono::Days::new(offset);
      let label =
        due_label(Some(due), today());
      assert_eq!(label.text, expected);
      assert_eq!(
        label.style,
        DueStyle::Plain
      );
    }
    assert_eq!(
      due_label(Some(today()), today())
        .style
        .class(),
      "due-today"
    );
  }

  #[test]
  fn due_soon_covers_the_next_week() {
    let soon = classify(
      &task(
        Some(date(2024, 6, 22)),
        Status::InProgress
      ),
      today()
    );
    assert!(soon.is_due_soon);
    let later = classify(
      &task(
        Some(date(2024, 6, 23)),
        Status::InProgress
      ),
      today()
    );
    assert!(!later.is_due_soon);
    assert_eq!(soon.card_classes(), vec!["due-soon"]);
    assert!(later.card_classes().is_empty());
  }

  #[test]
  fn alerts_skip_completed_tasks() {
    let tasks = vec![
      task(
        Some(date(2024, 6, 1)),
        Status::Open
      ),
      task(
        Some(date(2024, 6, 1)),
        Status::Completed
      ),
      task(Some(today()), Status::Open),
      task(
        Some(today()),
        Status::Completed
      ),
      task(None, Status::Open)
    ];
    let alerts =
      DueAlerts::collect(&tasks, today());
    assert_eq!(
      alerts,
      DueAlerts {
        overdue:   1,
        due_today: 1
      }
    );

    let notes = alerts.notifications();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].tag, "overdue-tasks");
    assert_eq!(
      notes[0].title,
      "TaskFlow: 1 overdue task(s)"
    );
    assert_eq!(
      notes[1].body,
      "You have 1 task(s) due today."
    );
  }

  #[test]
  fn no_alerts_means_no_notifications() {
    let alerts = DueAlerts::collect(
      &[task(None, Status::Open)],
      today()
    );
    assert!(alerts.is_empty());
    assert!(
      alerts.notifications().is_empty()
    );
  }
}
