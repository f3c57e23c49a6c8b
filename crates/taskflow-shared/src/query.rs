use chrono::NaiveDate;
use tracing::debug;

use crate::datetime::{
  DateFilter,
  format_api_date,
  resolve
};
use crate::task::{
  Priority,
  Status
};

/// Sort selectors offered by the sort
/// drop-down, `<field>-<order>` with the
/// label shown next to each.
pub const SORT_OPTIONS: &[(&str, &str)] = &[
  ("dueDate-asc", "Due date (earliest)"),
  ("dueDate-desc", "Due date (latest)"),
  ("priority-desc", "Priority (high first)"),
  ("priority-asc", "Priority (low first)"),
  ("title-asc", "Title (A-Z)"),
  ("title-desc", "Title (Z-A)"),
  ("createdAt-desc", "Newest first"),
  ("createdAt-asc", "Oldest first")
];

/// Filter and sort state captured from the
/// filter bar. Rebuilt on every change.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Default,
)]
pub struct FilterState {
  pub status:      Option<Status>,
  pub priority:    Option<Priority>,
  /// Date-filter keyword, see
  /// [`DateFilter`].
  pub date_filter: Option<String>,
  pub search_term: Option<String>,
  /// Combined `<field>-<order>` selector.
  pub sort:        Option<String>
}

impl FilterState {
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }

  pub fn clear(&mut self) {
    *self = Self::default();
  }

  /// Stores a search box value, trimmed;
  /// blank input clears the term.
  pub fn set_search(
    &mut self,
    raw: &str
  ) {
    self.search_term =
      non_empty(raw.trim());
  }

  pub fn set_date_filter(
    &mut self,
    filter: Option<DateFilter>
  ) {
    self.date_filter = filter
      .map(|f| f.keyword().to_string());
  }

  pub fn set_sort(
    &mut self,
    selector: &str
  ) {
    self.sort = non_empty(selector.trim());
  }
}

/// A parsed `<field>-<order>` selector.
#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct SortSelector {
  pub field: String,
  pub order: String
}

impl SortSelector {
  /// Exactly one `-` is required; the
  /// order is upper-cased and the field
  /// kept as written.
  pub fn parse(
    raw: &str
  ) -> Option<Self> {
    let parts: Vec<&str> =
      raw.split('-').collect();
    match parts.as_slice() {
      | [field, order] => {
        Some(Self {
          field: (*field).to_string(),
          order: order.to_uppercase()
        })
      }
      | _ => None
    }
  }
}

/// Ordered query parameters for
/// `GET /api/tasks`. Only set filters are
/// present and no value is ever empty.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Default,
)]
pub struct QueryParams {
  pairs: Vec<(&'static str, String)>
}

impl QueryParams {
  pub const STATUS: &'static str =
    "status";
  pub const PRIORITY: &'static str =
    "priority";
  pub const DUE_DATE_FROM: &'static str =
    "dueDateFrom";
  pub const DUE_DATE_TO: &'static str =
    "dueDateTo";
  pub const SEARCH_TERM: &'static str =
    "searchTerm";
  pub const SORT_BY: &'static str =
    "sortBy";
  pub const SORT_ORDER: &'static str =
    "sortOrder";

  fn push(
    &mut self,
    key: &'static str,
    value: impl Into<String>
  ) {
    let value = value.into();
    if !value.is_empty() {
      self.pairs.push((key, value));
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<&str> {
    self
      .pairs
      .iter()
      .find(|(k, _)| *k == key)
      .map(|(_, v)| v.as_str())
  }

  pub fn is_empty(&self) -> bool {
    self.pairs.is_empty()
  }

  pub fn len(&self) -> usize {
    self.pairs.len()
  }

  pub fn keys(
    &self
  ) -> impl Iterator<Item = &'static str> + '_
  {
    self.pairs.iter().map(|(k, _)| *k)
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&'static str, &str)>
  {
    self
      .pairs
      .iter()
      .map(|(k, v)| (*k, v.as_str()))
  }
}

/// Builds the canonical query for a filter
/// state. `today` anchors the date
/// keyword.
#[tracing::instrument(level = "debug", skip(filters), fields(date_filter = ?filters.date_filter, sort = ?filters.sort))]
pub fn build(
  filters: &FilterState,
  today: NaiveDate
) -> QueryParams {
  let mut params = QueryParams::default();

  if let Some(status) = filters.status {
    params.push(
      QueryParams::STATUS,
      status.as_str()
    );
  }
  if let Some(priority) = filters.priority
  {
    params.push(
      QueryParams::PRIORITY,
      priority.as_str()
    );
  }
  if let Some(keyword) =
    filters.date_filter.as_deref()
    && !keyword.is_empty()
  {
    let range = resolve(keyword, today);
    if let Some(from) = range.from {
      params.push(
        QueryParams::DUE_DATE_FROM,
        format_api_date(from)
      );
    }
    if let Some(to) = range.to {
      params.push(
        QueryParams::DUE_DATE_TO,
        format_api_date(to)
      );
    }
  }
  if let Some(term) =
    filters.search_term.as_deref()
  {
    params.push(
      QueryParams::SEARCH_TERM,
      term
    );
  }
  if let Some(selector) = filters
    .sort
    .as_deref()
    .and_then(SortSelector::parse)
  {
    params.push(
      QueryParams::SORT_BY,
      selector.field
    );
    params.push(
      QueryParams::SORT_ORDER,
      selector.order
    );
  }

  debug!(
    keys = ?params.keys().collect::<Vec<_>>(),
    "built task query"
  );
  params
}

fn non_empty(raw: &str) -> Option<String> {
  if raw.is_empty() {
    None
  } else {
    Some(raw.to_string())
  }
}
