//! Booking queries and mutations.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::api::types::{Booking, BookingsPage};
use crate::api::BookingsGateway;
use crate::cache::{KeyPrefix, QueryClient, QueryHandle, QueryKey, QueryState};
use crate::mutation::Mutation;
use crate::notify::Notifier;
use crate::params::{ListParams, PAGE_SIZE};

fn list_key(params: &ListParams) -> QueryKey {
  QueryKey::Bookings {
    filter: params.filter.clone(),
    sort: params.sort.clone(),
    page: params.page,
  }
}

/// Booking resource operations, bound to a cache, a gateway and a notifier.
#[derive(Clone)]
pub struct Bookings {
  client: QueryClient,
  gateway: Arc<dyn BookingsGateway>,
  notifier: Arc<dyn Notifier>,
}

impl Bookings {
  pub fn new(
    client: QueryClient,
    gateway: Arc<dyn BookingsGateway>,
    notifier: Arc<dyn Notifier>,
  ) -> Self {
    Self {
      client,
      gateway,
      notifier,
    }
  }

  /// Subscribe to one page of the bookings list.
  ///
  /// The cache key is derived from the filter/sort/page state, so equal
  /// navigation state always lands on the same slot. Once the page's total
  /// count is known and indicates another page, the next page is prefetched
  /// (forward only).
  pub fn list(&self, params: &ListParams) -> QueryHandle<BookingsPage> {
    let handle = self
      .client
      .subscribe(list_key(params), self.page_fetcher(params.clone()));
    self.prefetch_next(params.clone(), handle.clone());
    handle
  }

  /// Subscribe to a single booking.
  pub fn detail(&self, id: i64) -> QueryHandle<Booking> {
    let gateway = Arc::clone(&self.gateway);
    self.client.subscribe(QueryKey::Booking { id }, move || {
      let gateway = Arc::clone(&gateway);
      async move { gateway.booking(id).await.map_err(|e| e.to_string()) }
    })
  }

  /// Delete a booking; on success the bookings list is invalidated.
  pub fn delete(&self) -> Mutation<i64, ()> {
    let gateway = Arc::clone(&self.gateway);
    let client = self.client.clone();
    let success_notifier = Arc::clone(&self.notifier);
    let error_notifier = Arc::clone(&self.notifier);

    Mutation::new(move |id: i64| {
      let gateway = Arc::clone(&gateway);
      async move { gateway.delete_booking(id).await.map_err(|e| e.to_string()) }
    })
    .on_success(move |_| {
      client.invalidate(KeyPrefix::Bookings);
      success_notifier.success("Booking successfully deleted");
    })
    .on_error(move |e| error_notifier.error(e))
  }

  fn page_fetcher(
    &self,
    params: ListParams,
  ) -> impl Fn() -> Pin<Box<dyn Future<Output = Result<BookingsPage, String>> + Send>>
  + Send
  + Sync
  + 'static {
    let gateway = Arc::clone(&self.gateway);
    move || {
      let gateway = Arc::clone(&gateway);
      let params = params.clone();
      Box::pin(async move {
        gateway
          .bookings(params.filter, params.sort, params.page)
          .await
          .map_err(|e| e.to_string())
      })
    }
  }

  fn prefetch_next(&self, params: ListParams, handle: QueryHandle<BookingsPage>) {
    let client = self.client.clone();
    let this = self.clone();
    let mut handle = handle;
    tokio::spawn(async move {
      let QueryState::Success(page) = handle.settled().await else {
        return;
      };
      if params.page as u64 * PAGE_SIZE as u64 >= page.count as u64 {
        return;
      }
      let next = params.next_page();
      client.prefetch(list_key(&next), this.page_fetcher(next.clone()));
    });
  }
}
