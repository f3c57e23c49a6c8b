use chrono::{
  Datelike,
  Days,
  Local,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use tracing::{
  debug,
  trace
};

/// Wire format of calendar dates in
/// query parameters and JSON bodies.
pub const API_DATE_FORMAT: &str =
  "%Y-%m-%d";

/// Named date-range shortcuts offered by
/// the filter bar.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum DateFilter {
  Overdue,
  Today,
  ThisWeek
}

impl DateFilter {
  pub const ALL: [DateFilter; 3] = [
    DateFilter::Overdue,
    DateFilter::Today,
    DateFilter::ThisWeek
  ];

  pub fn from_keyword(
    raw: &str
  ) -> Option<Self> {
    match raw.trim() {
      | "overdue" => {
        Some(DateFilter::Overdue)
      }
      | "today" => Some(DateFilter::Today),
      | "this-week" => {
        Some(DateFilter::ThisWeek)
      }
      | _ => None
    }
  }

  pub fn keyword(self) -> &'static str {
    match self {
      | DateFilter::Overdue => "overdue",
      | DateFilter::Today => "today",
      | DateFilter::ThisWeek => {
        "this-week"
      }
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | DateFilter::Overdue => "Overdue",
      | DateFilter::Today => "Due today",
      | DateFilter::ThisWeek => {
        "Due this week"
      }
    }
  }

  /// Inclusive bounds for this shortcut.
  /// Overdue has no lower bound; the
  /// backend also drops completed tasks
  /// for it.
  pub fn range(
    self,
    today: NaiveDate
  ) -> DateRange {
    match self {
      | DateFilter::Overdue => {
        DateRange {
          from: None,
          to:   today
            .checked_sub_days(Days::new(1))
        }
      }
      | DateFilter::Today => {
        DateRange {
          from: Some(today),
          to:   Some(today)
        }
      }
      | DateFilter::ThisWeek => {
        let start = week_start(today);
        DateRange {
          from: start,
          to:   start.and_then(|s| {
            s.checked_add_days(Days::new(
              6
            ))
          })
        }
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub struct DateRange {
  pub from: Option<NaiveDate>,
  pub to:   Option<NaiveDate>
}

impl DateRange {
  pub fn is_unbounded(&self) -> bool {
    self.from.is_none()
      && self.to.is_none()
  }

  pub fn contains(
    &self,
    date: NaiveDate
  ) -> bool {
    self.from.is_none_or(|from| date >= from)
      && self.to.is_none_or(|to| date <= to)
  }
}

/// Maps a date-filter keyword to its
/// bounds. Unknown or empty keywords give
/// an unbounded range.
#[tracing::instrument(level = "debug")]
pub fn resolve(
  keyword: &str,
  today: NaiveDate
) -> DateRange {
  let range =
    match DateFilter::from_keyword(keyword)
    {
      | Some(filter) => filter.range(today),
      | None => {
        trace!(
          keyword,
          "no date filter for keyword"
        );
        DateRange::default()
      }
    };
  debug!(
    from = ?range.from,
    to = ?range.to,
    "resolved date range"
  );
  range
}

/// Sunday on or before `today`.
pub fn week_start(
  today: NaiveDate
) -> Option<NaiveDate> {
  let back = today
    .weekday()
    .num_days_from_sunday();
  today.checked_sub_days(Days::new(
    u64::from(back)
  ))
}

#[must_use]
pub fn format_api_date(
  date: NaiveDate
) -> String {
  date.format(API_DATE_FORMAT).to_string()
}

pub fn parse_api_date(
  raw: &str
) -> Result<NaiveDate, chrono::ParseError>
{
  NaiveDate::parse_from_str(
    raw.trim(),
    API_DATE_FORMAT
  )
}

/// US short form, e.g. `Jun 15, 2024`.
#[must_use]
pub fn short_date(
  date: NaiveDate
) -> String {
  date.format("%b %-d, %Y").to_string()
}

/// Calendar date of "now" in `tz`.
pub fn today_in(tz: &Tz) -> NaiveDate {
  Utc::now()
    .with_timezone(tz)
    .date_naive()
}

/// Calendar date of "now" in the host's
/// local zone.
pub fn local_today() -> NaiveDate {
  Local::now().date_naive()
}

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use pretty_assertions::assert_eq;

  use super::{
    DateFilter,
    DateRange,
    format_api_date,
    parse_api_date,
    parse_timezone,
    resolve,
    short_date
  };

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn today_is_a_single_day() {
    assert_eq!(
      resolve("today", date(2024, 6, 15)),
      DateRange {
        from: Some(date(2024, 6, 15)),
        to:   Some(date(2024, 6, 15))
      }
    );
  }

  #[test]
  fn overdue_ends_yesterday_without_lower_bound()
  {
    assert_eq!(
      resolve(
        "overdue",
        date(2024, 6, 15)
      ),
      DateRange {
        from: None,
        to:   Some(date(2024, 6, 14))
      }
    );
  }

  #[test]
  fn overdue_crosses_month_boundary() {
    assert_eq!(
      resolve("overdue", date(2024, 3, 1))
        .to,
      Some(date(2024, 2, 29))
    );
  }

  #[test]
  fn this_week_runs_sunday_to_saturday()
  {
    // 2024-06-12 is a Wednesday.
    assert_eq!(
      resolve(
        "this-week",
        date(2024, 6, 12)
      ),
      DateRange {
        from: Some(date(2024, 6, 9)),
        to:   Some(date(2024, 6, 15))
      }
    );
  }

  #[test]
  fn this_week_on_sunday_starts_that_day()
  {
    assert_eq!(
      resolve(
        "this-week",
        date(2024, 6, 9)
      )
      .from,
      Some(date(2024, 6, 9))
    );
    assert_eq!(
      resolve(
        "this-week",
        date(2024, 6, 15)
      )
      .to,
      Some(date(2024, 6, 15))
    );
  }

  #[test]
  fn unknown_keywords_are_unbounded() {
    for keyword in
      ["bogus", "", "Today", "week"]
    {
      assert!(
        resolve(keyword, date(2024, 6, 15))
          .is_unbounded(),
        "{keyword} should not bound"
      );
    }
  }

  #[test]
  fn keywords_round_trip_through_enum() {
    for filter in DateFilter::ALL {
      assert_eq!(
        DateFilter::from_keyword(
          filter.keyword()
        ),
        Some(filter)
      );
    }
  }

  #[test]
  fn range_contains_is_inclusive() {
    let week = resolve(
      "this-week",
      date(2024, 6, 12)
    );
    assert!(week.contains(date(2024, 6, 9)));
    assert!(
      week.contains(date(2024, 6, 15))
    );
    assert!(
      !week.contains(date(2024, 6, 16))
    );
  }

  #[test]
  fn formats_dates_for_api_and_display() {
    assert_eq!(
      format_api_date(date(2024, 6, 5)),
      "2024-06-05"
    );
    assert_eq!(
      parse_api_date(" 2024-06-05 ")
        .expect("parse"),
      date(2024, 6, 5)
    );
    assert_eq!(
      short_date(date(2024, 6, 5)),
      "Jun 5, 2024"
    );
  }

  #[test]
  fn rejects_unknown_timezone() {
    assert!(
      parse_timezone("Mars/Olympus", "test")
        .is_none()
    );
    assert!(
      parse_timezone("Europe/Berlin", "test")
        .is_some()
    );
  }
}
