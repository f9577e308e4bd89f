//! Cabin queries and mutations.

use std::sync::Arc;

use crate::api::types::{Cabin, CabinPayload};
use crate::api::CabinsGateway;
use crate::cache::{KeyPrefix, QueryClient, QueryHandle, QueryKey};
use crate::mutation::Mutation;
use crate::notify::Notifier;

/// Payload for editing an existing cabin.
#[derive(Debug, Clone)]
pub struct CabinEdit {
  pub id: i64,
  pub payload: CabinPayload,
}

#[derive(Clone)]
pub struct Cabins {
  client: QueryClient,
  gateway: Arc<dyn CabinsGateway>,
  notifier: Arc<dyn Notifier>,
}

impl Cabins {
  pub fn new(
    client: QueryClient,
    gateway: Arc<dyn CabinsGateway>,
    notifier: Arc<dyn Notifier>,
  ) -> Self {
    Self {
      client,
      gateway,
      notifier,
    }
  }

  /// Subscribe to the cabins list.
  pub fn list(&self) -> QueryHandle<Vec<Cabin>> {
    let gateway = Arc::clone(&self.gateway);
    self.client.subscribe(QueryKey::Cabins, move || {
      let gateway = Arc::clone(&gateway);
      async move { gateway.cabins().await.map_err(|e| e.to_string()) }
    })
  }

  pub fn create(&self) -> Mutation<CabinPayload, Cabin> {
    let gateway = Arc::clone(&self.gateway);
    self.cabin_mutation(
      move |payload: CabinPayload| {
        let gateway = Arc::clone(&gateway);
        async move {
          gateway
            .create_edit_cabin(payload, None)
            .await
            .map_err(|e| e.to_string())
        }
      },
      "New cabin successfully created",
    )
  }

  pub fn edit(&self) -> Mutation<CabinEdit, Cabin> {
    let gateway = Arc::clone(&self.gateway);
    self.cabin_mutation(
      move |edit: CabinEdit| {
        let gateway = Arc::clone(&gateway);
        async move {
          gateway
            .create_edit_cabin(edit.payload, Some(edit.id))
            .await
            .map_err(|e| e.to_string())
        }
      },
      "Cabin successfully edited",
    )
  }

  pub fn delete(&self) -> Mutation<i64, ()> {
    let gateway = Arc::clone(&self.gateway);
    self.cabin_mutation(
      move |id: i64| {
        let gateway = Arc::clone(&gateway);
        async move { gateway.delete_cabin(id).await.map_err(|e| e.to_string()) }
      },
      "Cabin successfully deleted",
    )
  }

  /// Shared shape of every cabin mutation: invalidate the cabins list and
  /// notify on success, surface the gateway message on failure.
  fn cabin_mutation<I, O, F, Fut>(&self, run: F, success_message: &'static str) -> Mutation<I, O>
  where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<O, String>> + Send + 'static,
  {
    let client = self.client.clone();
    let success_notifier = Arc::clone(&self.notifier);
    let error_notifier = Arc::clone(&self.notifier);

    Mutation::new(run)
      .on_success(move |_| {
        client.invalidate(KeyPrefix::Cabins);
        success_notifier.success(success_message);
      })
      .on_error(move |e| error_notifier.error(e))
  }
}
