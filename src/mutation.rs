//! Generic mutation runner.
//!
//! A `Mutation` wraps one remote write operation plus its side effects.
//! Calling [`Mutation::mutate`] runs the operation, then the success or
//! error hook (cache reconciliation, notifications, navigation), and only
//! then resolves. Callers that must reset UI state after settlement simply
//! await the returned future, regardless of outcome.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::watch;

type BoxRun<I, O> =
  Box<dyn Fn(I) -> Pin<Box<dyn Future<Output = Result<O, String>> + Send>> + Send + Sync>;
type Hook<O> = Box<dyn Fn(&O) + Send + Sync>;
type ErrorHook = Box<dyn Fn(&str) + Send + Sync>;

pub struct Mutation<I, O> {
  run: BoxRun<I, O>,
  on_success: Hook<O>,
  on_error: ErrorHook,
  loading: watch::Sender<bool>,
}

impl<I, O> Mutation<I, O>
where
  I: Send + 'static,
  O: Send + 'static,
{
  pub fn new<F, Fut>(run: F) -> Self
  where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, String>> + Send + 'static,
  {
    let (loading, _rx) = watch::channel(false);
    Self {
      run: Box::new(move |input| Box::pin(run(input))),
      on_success: Box::new(|_| {}),
      on_error: Box::new(|_| {}),
      loading,
    }
  }

  /// Hook invoked with the operation's result after a successful run.
  pub fn on_success<F: Fn(&O) + Send + Sync + 'static>(mut self, hook: F) -> Self {
    self.on_success = Box::new(hook);
    self
  }

  /// Hook invoked with the error message after a failed run.
  pub fn on_error<F: Fn(&str) + Send + Sync + 'static>(mut self, hook: F) -> Self {
    self.on_error = Box::new(hook);
    self
  }

  pub fn is_loading(&self) -> bool {
    *self.loading.borrow()
  }

  /// Run the operation. Side-effect hooks run before this resolves.
  pub async fn mutate(&self, input: I) -> Result<O, String> {
    self.loading.send_replace(true);
    let result = (self.run)(input).await;
    match &result {
      Ok(output) => (self.on_success)(output),
      Err(e) => (self.on_error)(e),
    }
    self.loading.send_replace(false);
    result
  }
}
