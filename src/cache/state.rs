//! Query lifecycle states.

/// The state of a cached query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
  /// Entry exists but no fetch has started yet
  Idle,
  /// A fetch is in flight
  Loading,
  /// The last fetch resolved with data
  Success(T),
  /// The last fetch failed
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  /// Whether the query reached a terminal state.
  pub fn is_settled(&self) -> bool {
    matches!(self, QueryState::Success(_) | QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn into_data(self) -> Option<T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}
