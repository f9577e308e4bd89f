//! Navigation surface.

/// Write access to the navigation state of the embedding shell.
pub trait Navigator: Send + Sync {
  /// Navigate to a path, keeping the current location in history.
  fn push(&self, path: &str);

  /// Navigate to a path, replacing the current history entry.
  fn replace(&self, path: &str);
}

/// Navigator for shells without a real router; only logs the intent.
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
  fn push(&self, path: &str) {
    tracing::debug!(path, "navigation requested");
  }

  fn replace(&self, path: &str) {
    tracing::debug!(path, replace = true, "navigation requested");
  }
}
