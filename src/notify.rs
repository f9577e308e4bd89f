//! Notification surface.

/// Fire-and-forget user notifications emitted by mutations.
pub trait Notifier: Send + Sync {
  fn success(&self, message: &str);
  fn error(&self, message: &str);
}

/// Prints notifications to the terminal.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
  fn success(&self, message: &str) {
    println!("{}", message);
  }

  fn error(&self, message: &str) {
    eprintln!("Error: {}", message);
  }
}
