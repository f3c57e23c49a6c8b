use taskflow_shared::query::SORT_OPTIONS;
use taskflow_shared::{
  DateFilter,
  FilterState,
  Priority,
  Status
};
use web_sys::{
  Event,
  HtmlInputElement,
  HtmlSelectElement,
  InputEvent,
  MouseEvent
};
use yew::{
  Callback,
  Html,
  Properties,
  TargetCast,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct FilterBarProps {
  pub filters:         FilterState,
  /// Raw search box text; the filter
  /// only picks it up after the debounce.
  pub search_text:     String,
  pub on_status:       Callback<Option<Status>>,
  pub on_priority:
    Callback<Option<Priority>>,
  pub on_date:
    Callback<Option<DateFilter>>,
  pub on_search_input: Callback<String>,
  pub on_sort:         Callback<String>,
  pub on_clear:        Callback<()>
}

fn select_value(event: &Event) -> String {
  event
    .target_unchecked_into::<HtmlSelectElement>()
    .value()
}

fn option(
  value: &str,
  label: &str,
  selected: bool
) -> Html {
  html! {
      <option value={value.to_string()} selected={selected}>
          { label.to_string() }
      </option>
  }
}

#[function_component(FilterBar)]
pub fn filter_bar(
  props: &FilterBarProps
) -> Html {
  let filters = &props.filters;

  let on_status = props.on_status.reform(
    |e: Event| select_value(&e).parse().ok()
  );
  let on_priority =
    props.on_priority.reform(|e: Event| {
      select_value(&e).parse().ok()
    });
  let on_date =
    props.on_date.reform(|e: Event| {
      DateFilter::from_keyword(&select_value(
        &e
      ))
    });
  let on_sort = props
    .on_sort
    .reform(|e: Event| select_value(&e));
  let on_search = props.on_search_input.reform(
    |e: InputEvent| {
      e.target_unchecked_into::<HtmlInputElement>()
        .value()
    }
  );
  let on_clear =
    props.on_clear.reform(|_: MouseEvent| ());

  let date_keyword =
    filters.date_filter.as_deref();
  let sort = filters.sort.as_deref();

  html! {
      <div class="filters">
          <select id="filter-status" onchange={on_status}>
              { option("", "All Statuses", filters.status.is_none()) }
              {
                  for Status::ALL.into_iter().map(|status| option(
                      status.as_str(),
                      status.label(),
                      filters.status == Some(status),
                  ))
              }
          </select>
          <select id="filter-priority" onchange={on_priority}>
              { option("", "All Priorities", filters.priority.is_none()) }
              {
                  for Priority::ALL.into_iter().map(|priority| option(
                      priority.as_str(),
                      priority.as_str(),
                      filters.priority == Some(priority),
                  ))
              }
          </select>
          <select id="filter-date" onchange={on_date}>
              { option("", "All Dates", date_keyword.is_none()) }
              {
                  for DateFilter::ALL.into_iter().map(|filter| option(
                      filter.keyword(),
                      filter.label(),
                      date_keyword == Some(filter.keyword()),
                  ))
              }
          </select>
          <input
              id="search-input"
              type="text"
              placeholder="Search tasks..."
              value={props.search_text.clone()}
              oninput={on_search}
          />
          <select id="sort-by" onchange={on_sort}>
              { option("", "Default order", sort.is_none()) }
              {
                  for SORT_OPTIONS.iter().map(|(value, label)| option(
                      value,
                      label,
                      sort == Some(*value),
                  ))
              }
          </select>
          <button id="clear-filters" class="btn" onclick={on_clear}>
              { "Clear Filters" }
          </button>
      </div>
  }
}
