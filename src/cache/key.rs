//! Structured query keys for the cache.

/// A filter applied to a list query, e.g. `status = checked-in`.
///
/// The absence of a filter is represented as `Option::None` so that
/// "no filter" occupies a stable slot in key equality, distinct from
/// every real filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filter {
  pub field: String,
  pub value: String,
}

impl Filter {
  pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      field: field.into(),
      value: value.into(),
    }
  }
}

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
  Asc,
  Desc,
}

impl SortDirection {
  pub fn as_str(&self) -> &'static str {
    match self {
      SortDirection::Asc => "asc",
      SortDirection::Desc => "desc",
    }
  }
}

/// How a list query is ordered. Always present; each resource kind
/// has its own default.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortDescriptor {
  pub field: String,
  pub direction: SortDirection,
}

impl SortDescriptor {
  pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
    Self {
      field: field.into(),
      direction,
    }
  }
}

/// Identifies one cache slot.
///
/// One variant per resource kind, with the fields that select different
/// slots for that kind. Two keys address the same slot iff they are
/// structurally equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
  /// Paginated bookings list for a filter/sort/page combination.
  Bookings {
    filter: Option<Filter>,
    sort: SortDescriptor,
    page: u32,
  },
  /// A single booking by id.
  Booking { id: i64 },
  /// The full cabins list.
  Cabins,
  /// Operation-wide settings.
  Settings,
  /// The authenticated user.
  User,
}

/// Resource-kind prefix of a [`QueryKey`], used for invalidation.
///
/// Invalidating a prefix touches every key of that kind and no other;
/// in particular the bookings list prefix does not cover single-booking
/// detail keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPrefix {
  Bookings,
  Booking,
  Cabins,
  Settings,
  User,
}

impl QueryKey {
  pub fn prefix(&self) -> KeyPrefix {
    match self {
      QueryKey::Bookings { .. } => KeyPrefix::Bookings,
      QueryKey::Booking { .. } => KeyPrefix::Booking,
      QueryKey::Cabins => KeyPrefix::Cabins,
      QueryKey::Settings => KeyPrefix::Settings,
      QueryKey::User => KeyPrefix::User,
    }
  }

  pub fn starts_with(&self, prefix: KeyPrefix) -> bool {
    self.prefix() == prefix
  }

  /// Human-readable form for logs.
  pub fn description(&self) -> String {
    match self {
      QueryKey::Bookings { filter, sort, page } => {
        let filter = match filter {
          Some(f) => format!("{}={}", f.field, f.value),
          None => "all".to_string(),
        };
        format!(
          "bookings [{}] {}.{} page {}",
          filter,
          sort.field,
          sort.direction.as_str(),
          page
        )
      }
      QueryKey::Booking { id } => format!("booking {}", id),
      QueryKey::Cabins => "cabins".to_string(),
      QueryKey::Settings => "settings".to_string(),
      QueryKey::User => "user".to_string(),
    }
  }
}
