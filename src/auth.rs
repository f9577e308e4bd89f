//! Auth session operations.
//!
//! Login seeds the session cache directly from the login response instead
//! of refetching the user, then replaces the current history entry so the
//! login screen is not reachable with back-navigation. Logout drops the
//! whole cache, not just the session entry, so no stale data survives into
//! the next session.

use std::sync::Arc;

use crate::api::types::{Credentials, User};
use crate::api::AuthGateway;
use crate::cache::{QueryClient, QueryHandle, QueryKey};
use crate::mutation::Mutation;
use crate::nav::Navigator;
use crate::notify::Notifier;

/// Shown on any login failure. The real error is deliberately discarded so
/// the UI never reveals which of email or password was wrong.
const LOGIN_FAILED: &str = "Provided email or password are incorrect";

const LOGOUT_FAILED: &str = "There was an error while logging out";

#[derive(Clone)]
pub struct Auth {
  client: QueryClient,
  gateway: Arc<dyn AuthGateway>,
  notifier: Arc<dyn Notifier>,
  navigator: Arc<dyn Navigator>,
}

impl Auth {
  pub fn new(
    client: QueryClient,
    gateway: Arc<dyn AuthGateway>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
  ) -> Self {
    Self {
      client,
      gateway,
      notifier,
      navigator,
    }
  }

  pub fn login(&self) -> Mutation<Credentials, User> {
    let gateway = Arc::clone(&self.gateway);
    let client = self.client.clone();
    let navigator = Arc::clone(&self.navigator);
    let notifier = Arc::clone(&self.notifier);

    Mutation::new(move |credentials: Credentials| {
      let gateway = Arc::clone(&gateway);
      async move { gateway.login(credentials).await.map_err(|e| e.to_string()) }
    })
    .on_success(move |user: &User| {
      client.set_query_data(QueryKey::User, user);
      navigator.replace("/dashboard");
    })
    .on_error(move |_| notifier.error(LOGIN_FAILED))
  }

  pub fn logout(&self) -> Mutation<(), ()> {
    let gateway = Arc::clone(&self.gateway);
    let client = self.client.clone();
    let navigator = Arc::clone(&self.navigator);
    let notifier = Arc::clone(&self.notifier);

    Mutation::new(move |_: ()| {
      let gateway = Arc::clone(&gateway);
      async move { gateway.logout().await.map_err(|e| e.to_string()) }
    })
    .on_success(move |_| {
      client.remove_all();
      navigator.replace("/login");
    })
    .on_error(move |e| {
      if e.is_empty() {
        notifier.error(LOGOUT_FAILED);
      } else {
        notifier.error(e);
      }
    })
  }

  /// Subscribe to the authenticated user. Served from the seeded session
  /// cache after login; fetched from the gateway otherwise.
  pub fn current_user(&self) -> QueryHandle<User> {
    let gateway = Arc::clone(&self.gateway);
    self.client.subscribe(QueryKey::User, move || {
      let gateway = Arc::clone(&gateway);
      async move { gateway.current_user().await.map_err(|e| e.to_string()) }
    })
  }
}
