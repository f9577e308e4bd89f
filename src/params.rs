//! Derived-state utilities.
//!
//! Pure translations from raw navigation query-string parameters to the
//! typed descriptors that become query-key fields. Malformed input never
//! fails; it falls back to the resource default so that cache-hit behavior
//! stays deterministic.

use url::Url;

use crate::cache::{Filter, SortDescriptor, SortDirection};

/// Items per page for paginated list queries.
pub const PAGE_SIZE: u32 = 10;

/// Default ordering for the bookings list.
pub fn default_bookings_sort() -> SortDescriptor {
  SortDescriptor::new("startDate", SortDirection::Desc)
}

/// Translate the raw `status` parameter into a filter.
///
/// Absent or `"all"` means no filter.
pub fn status_filter(raw: Option<&str>) -> Option<Filter> {
  match raw {
    None | Some("all") => None,
    Some(value) => Some(Filter::new("status", value)),
  }
}

/// Parse a `sortBy` parameter of the form `<field>-<direction>`.
///
/// Anything else yields the provided default.
pub fn sort_descriptor(raw: Option<&str>, default: SortDescriptor) -> SortDescriptor {
  let Some(raw) = raw else {
    return default;
  };
  let Some((field, direction)) = raw.rsplit_once('-') else {
    return default;
  };
  let direction = match direction {
    "asc" => SortDirection::Asc,
    "desc" => SortDirection::Desc,
    _ => return default,
  };
  if field.is_empty() {
    return default;
  }
  SortDescriptor::new(field, direction)
}

/// Parse a `page` parameter. Absent, non-numeric or non-positive means 1.
pub fn page_number(raw: Option<&str>) -> u32 {
  raw
    .and_then(|p| p.parse::<u32>().ok())
    .filter(|p| *p > 0)
    .unwrap_or(1)
}

/// Filter, sort and page state for the bookings list, derived from
/// navigation parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
  pub filter: Option<Filter>,
  pub sort: SortDescriptor,
  pub page: u32,
}

impl Default for ListParams {
  fn default() -> Self {
    Self {
      filter: None,
      sort: default_bookings_sort(),
      page: 1,
    }
  }
}

impl ListParams {
  /// Derive list state from the `status`, `sortBy` and `page` query-string
  /// parameters of a URL.
  pub fn from_url(url: &Url) -> Self {
    let mut status = None;
    let mut sort_by = None;
    let mut page = None;
    for (name, value) in url.query_pairs() {
      match name.as_ref() {
        "status" => status = Some(value.into_owned()),
        "sortBy" => sort_by = Some(value.into_owned()),
        "page" => page = Some(value.into_owned()),
        _ => {}
      }
    }
    Self::from_raw(status.as_deref(), sort_by.as_deref(), page.as_deref())
  }

  /// Derive list state from the raw parameter values.
  pub fn from_raw(status: Option<&str>, sort_by: Option<&str>, page: Option<&str>) -> Self {
    Self {
      filter: status_filter(status),
      sort: sort_descriptor(sort_by, default_bookings_sort()),
      page: page_number(page),
    }
  }

  pub fn next_page(&self) -> Self {
    Self {
      filter: self.filter.clone(),
      sort: self.sort.clone(),
      page: self.page + 1,
    }
  }
}
