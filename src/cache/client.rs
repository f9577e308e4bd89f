//! Process-wide query cache with subscription semantics.
//!
//! `QueryClient` maps a [`QueryKey`] to one cached entry holding the query's
//! state and its fetcher. Consumers subscribe to a key and observe state
//! changes through a watch channel; concurrent subscribers of the same key
//! share a single in-flight fetch. Mutations reconcile the cache through
//! `invalidate`, `remove_all` and `set_query_data` rather than touching
//! entries directly.

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::key::{KeyPrefix, QueryKey};
use super::state::QueryState;

type BoxFetch = Pin<Box<dyn Future<Output = Result<Value, String>> + Send>>;
type Fetcher = Arc<dyn Fn() -> BoxFetch + Send + Sync>;

struct Entry {
  tx: watch::Sender<QueryState<Value>>,
  fetcher: Fetcher,
  in_flight: bool,
  /// Invalidation arrived while a fetch was in flight; refetch after it settles
  refetch_queued: bool,
}

impl Entry {
  fn new(fetcher: Fetcher) -> Self {
    let (tx, _rx) = watch::channel(QueryState::Idle);
    Self {
      tx,
      fetcher,
      in_flight: false,
      refetch_queued: false,
    }
  }

  fn seeded(value: Value) -> Self {
    let snapshot = value.clone();
    let fetcher: Fetcher = Arc::new(move || {
      let value = snapshot.clone();
      Box::pin(async move { Ok(value) })
    });
    let (tx, _rx) = watch::channel(QueryState::Success(value));
    Self {
      tx,
      fetcher,
      in_flight: false,
      refetch_queued: false,
    }
  }

  fn wants_fetch(&self) -> bool {
    !self.in_flight && matches!(&*self.tx.borrow(), QueryState::Idle | QueryState::Error(_))
  }
}

/// Shared cache of remote query results.
///
/// Cloning is cheap; all clones address the same store. Construct one per
/// session (or per test) and hand it to every resource that needs it.
#[derive(Clone)]
pub struct QueryClient {
  entries: Arc<Mutex<HashMap<QueryKey, Entry>>>,
}

impl Default for QueryClient {
  fn default() -> Self {
    Self::new()
  }
}

impl QueryClient {
  pub fn new() -> Self {
    Self {
      entries: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// Subscribe to a key, fetching it if the cache has nothing fresh.
  ///
  /// If an entry already holds data, it is returned as-is without invoking
  /// the fetcher. If a fetch is in flight, the handle observes its outcome;
  /// no duplicate remote call is made. The most recent fetcher wins and is
  /// the one used for later refetches.
  pub fn subscribe<T, F, Fut>(&self, key: QueryKey, fetch: F) -> QueryHandle<T>
  where
    T: Serialize + DeserializeOwned,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let fetcher = erase(fetch);
    let mut needs_fetch = false;

    let rx = {
      let mut entries = self.entries.lock();
      let entry = entries.entry(key.clone()).or_insert_with(|| {
        needs_fetch = true;
        Entry::new(fetcher.clone())
      });
      entry.fetcher = fetcher;
      if entry.wants_fetch() {
        needs_fetch = true;
      }
      entry.tx.subscribe()
    };

    if needs_fetch {
      self.start_fetch(key.clone());
    }

    QueryHandle {
      key,
      rx,
      _marker: PhantomData,
    }
  }

  /// Warm the cache for a key without registering a subscriber.
  ///
  /// No-op when an entry already exists, fresh or in flight.
  pub fn prefetch<T, F, Fut>(&self, key: QueryKey, fetch: F)
  where
    T: Serialize + DeserializeOwned,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    {
      let mut entries = self.entries.lock();
      if entries.contains_key(&key) {
        return;
      }
      debug!(key = %key.description(), "prefetching");
      entries.insert(key.clone(), Entry::new(erase(fetch)));
    }
    self.start_fetch(key);
  }

  /// Mark every entry under `prefix` stale.
  ///
  /// Subscribed entries refetch; unsubscribed ones are evicted. If the
  /// entry's fetch is in flight, a follow-up refetch is queued so the
  /// invalidation is never lost.
  pub fn invalidate(&self, prefix: KeyPrefix) {
    self.invalidate_where(|key| key.starts_with(prefix));
  }

  /// Invalidate every entry regardless of resource kind.
  pub fn invalidate_all(&self) {
    self.invalidate_where(|_| true);
  }

  fn invalidate_where(&self, matches: impl Fn(&QueryKey) -> bool) {
    let mut to_refetch = Vec::new();
    {
      let mut entries = self.entries.lock();
      entries.retain(|key, entry| {
        if !matches(key) {
          return true;
        }
        if entry.tx.receiver_count() == 0 {
          debug!(key = %key.description(), "evicting unsubscribed entry");
          return false;
        }
        if entry.in_flight {
          entry.refetch_queued = true;
        } else {
          to_refetch.push(key.clone());
        }
        true
      });
    }
    for key in to_refetch {
      self.start_fetch(key);
    }
  }

  /// Evict everything immediately, without refetching. Used on logout.
  pub fn remove_all(&self) {
    self.entries.lock().clear();
  }

  /// Seed an entry to `Success` without calling any fetcher.
  pub fn set_query_data<T: Serialize>(&self, key: QueryKey, value: &T) {
    let value = match serde_json::to_value(value) {
      Ok(value) => value,
      Err(e) => {
        warn!(key = %key.description(), "failed to encode seeded value: {}", e);
        return;
      }
    };
    let mut entries = self.entries.lock();
    match entries.get_mut(&key) {
      Some(entry) => {
        entry.tx.send_replace(QueryState::Success(value));
      }
      None => {
        entries.insert(key, Entry::seeded(value));
      }
    }
  }

  /// Read cached data directly, if the entry holds any.
  pub fn get_query_data<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
    let entries = self.entries.lock();
    let entry = entries.get(key)?;
    let state = entry.tx.borrow();
    let value = state.data()?;
    serde_json::from_value(value.clone()).ok()
  }

  /// Whether any entry exists for the key, settled or not.
  pub fn contains(&self, key: &QueryKey) -> bool {
    self.entries.lock().contains_key(key)
  }

  fn start_fetch(&self, key: QueryKey) {
    let fetcher = {
      let mut entries = self.entries.lock();
      let Some(entry) = entries.get_mut(&key) else {
        return;
      };
      if entry.in_flight {
        return;
      }
      entry.in_flight = true;
      entry.tx.send_replace(QueryState::Loading);
      entry.fetcher.clone()
    };

    let client = self.clone();
    tokio::spawn(async move {
      // The fetcher runs in its own task so a panic still settles the
      // entry as an error instead of leaving it loading forever.
      let result = match tokio::spawn(fetcher()).await {
        Ok(result) => result,
        Err(e) => Err(format!("Fetch failed: {}", e)),
      };
      client.settle(&key, result);
    });
  }

  fn settle(&self, key: &QueryKey, result: Result<Value, String>) {
    let refetch = {
      let mut entries = self.entries.lock();
      let Some(entry) = entries.get_mut(key) else {
        // Entry evicted while the fetch was in flight; discard the result.
        debug!(key = %key.description(), "discarding result for evicted entry");
        return;
      };
      entry.in_flight = false;
      entry.tx.send_replace(match result {
        Ok(value) => QueryState::Success(value),
        Err(e) => QueryState::Error(e),
      });
      std::mem::take(&mut entry.refetch_queued)
    };
    if refetch {
      self.start_fetch(key.clone());
    }
  }
}

/// Typed view of one cache entry.
///
/// Holding a handle marks the entry as subscribed; dropping all handles for
/// a key lets invalidation evict it instead of refetching.
pub struct QueryHandle<T> {
  key: QueryKey,
  rx: watch::Receiver<QueryState<Value>>,
  _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for QueryHandle<T> {
  fn clone(&self) -> Self {
    Self {
      key: self.key.clone(),
      rx: self.rx.clone(),
      _marker: PhantomData,
    }
  }
}

impl<T: DeserializeOwned> QueryHandle<T> {
  pub fn key(&self) -> &QueryKey {
    &self.key
  }

  /// Snapshot of the current state.
  pub fn state(&self) -> QueryState<T> {
    match &*self.rx.borrow() {
      QueryState::Idle => QueryState::Idle,
      QueryState::Loading => QueryState::Loading,
      QueryState::Success(value) => match serde_json::from_value(value.clone()) {
        Ok(data) => QueryState::Success(data),
        Err(e) => QueryState::Error(format!("Failed to decode cached value: {}", e)),
      },
      QueryState::Error(e) => QueryState::Error(e.clone()),
    }
  }

  pub fn data(&self) -> Option<T> {
    self.state().into_data()
  }

  pub fn is_loading(&self) -> bool {
    self.state().is_loading()
  }

  pub fn error(&self) -> Option<String> {
    match self.state() {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }

  /// Wait for the next state change. Returns `false` once the entry is gone.
  pub async fn changed(&mut self) -> bool {
    self.rx.changed().await.is_ok()
  }

  /// Wait until the query reaches `Success` or `Error` and return that state.
  pub async fn settled(&mut self) -> QueryState<T> {
    loop {
      let state = self.state();
      if state.is_settled() {
        return state;
      }
      if self.rx.changed().await.is_err() {
        return self.state();
      }
    }
  }
}

fn erase<T, F, Fut>(fetch: F) -> Fetcher
where
  T: Serialize,
  F: Fn() -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<T, String>> + Send + 'static,
{
  Arc::new(move || {
    let fut = fetch();
    Box::pin(async move {
      let data = fut.await?;
      serde_json::to_value(data).map_err(|e| e.to_string())
    })
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::key::{Filter, SortDescriptor, SortDirection};
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::time::Duration;

  fn bookings_key(page: u32) -> QueryKey {
    QueryKey::Bookings {
      filter: Some(Filter::new("status", "checked-in")),
      sort: SortDescriptor::new("startDate", SortDirection::Desc),
      page,
    }
  }

  fn counting_fetcher(
    calls: &Arc<AtomicU32>,
  ) -> impl Fn() -> Pin<Box<dyn Future<Output = Result<u32, String>> + Send>> + Send + Sync + 'static
  {
    let calls = Arc::clone(calls);
    move || {
      let calls = Arc::clone(&calls);
      Box::pin(async move { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) })
    }
  }

  #[tokio::test]
  async fn fresh_entry_is_returned_without_refetching() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));

    let mut first = client.subscribe::<u32, _, _>(QueryKey::Cabins, counting_fetcher(&calls));
    assert!(first.settled().await.is_success());

    let second = client.subscribe::<u32, _, _>(QueryKey::Cabins, counting_fetcher(&calls));
    assert_eq!(second.data(), Some(1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn concurrent_subscribers_share_one_fetch() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));
    let slow = {
      let calls = Arc::clone(&calls);
      move || {
        let calls = Arc::clone(&calls);
        async move {
          tokio::time::sleep(Duration::from_millis(30)).await;
          calls.fetch_add(1, Ordering::SeqCst);
          Ok::<_, String>(7u32)
        }
      }
    };

    let mut a = client.subscribe::<u32, _, _>(QueryKey::Cabins, slow.clone());
    assert!(a.is_loading());
    let mut b = client.subscribe::<u32, _, _>(QueryKey::Cabins, slow);

    assert_eq!(a.settled().await.into_data(), Some(7));
    assert_eq!(b.settled().await.into_data(), Some(7));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn fetch_failure_becomes_the_entry_error() {
    let client = QueryClient::new();
    let mut handle = client.subscribe::<u32, _, _>(QueryKey::Cabins, || async {
      Err::<u32, _>("boom".to_string())
    });

    let state = handle.settled().await;
    assert_eq!(state.error(), Some("boom"));
  }

  #[tokio::test]
  async fn invalidate_refetches_subscribed_entries_under_prefix_only() {
    let client = QueryClient::new();
    let booking_calls = Arc::new(AtomicU32::new(0));
    let cabin_calls = Arc::new(AtomicU32::new(0));

    let mut bookings =
      client.subscribe::<u32, _, _>(bookings_key(1), counting_fetcher(&booking_calls));
    let mut cabins = client.subscribe::<u32, _, _>(QueryKey::Cabins, counting_fetcher(&cabin_calls));
    bookings.settled().await;
    cabins.settled().await;

    client.invalidate(KeyPrefix::Bookings);
    assert_eq!(bookings.settled().await.into_data(), Some(2));
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(booking_calls.load(Ordering::SeqCst), 2);
    assert_eq!(cabin_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn invalidate_evicts_unsubscribed_entries() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));

    client.prefetch::<u32, _, _>(bookings_key(2), counting_fetcher(&calls));
    for _ in 0..50 {
      if client.get_query_data::<u32>(&bookings_key(2)).is_some() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(client.get_query_data::<u32>(&bookings_key(2)), Some(1));

    client.invalidate(KeyPrefix::Bookings);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(!client.contains(&bookings_key(2)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn invalidation_during_flight_queues_a_refetch() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));
    let slow = {
      let calls = Arc::clone(&calls);
      move || {
        let calls = Arc::clone(&calls);
        async move {
          tokio::time::sleep(Duration::from_millis(30)).await;
          Ok::<_, String>(calls.fetch_add(1, Ordering::SeqCst) + 1)
        }
      }
    };

    let mut handle = client.subscribe::<u32, _, _>(bookings_key(1), slow);
    client.invalidate(KeyPrefix::Bookings);

    // The in-flight fetch settles first, then the queued refetch runs.
    assert!(handle.settled().await.is_success());
    for _ in 0..50 {
      if calls.load(Ordering::SeqCst) == 2 {
        break;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(handle.settled().await.into_data(), Some(2));
  }

  #[tokio::test]
  async fn prefetch_is_a_noop_for_existing_entries() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));

    let mut handle = client.subscribe::<u32, _, _>(QueryKey::Cabins, counting_fetcher(&calls));
    handle.settled().await;
    client.prefetch::<u32, _, _>(QueryKey::Cabins, counting_fetcher(&calls));
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn seeded_data_is_served_without_fetching() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));

    client.set_query_data(QueryKey::User, &42u32);
    let handle = client.subscribe::<u32, _, _>(QueryKey::User, counting_fetcher(&calls));

    assert_eq!(handle.data(), Some(42));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn panicking_fetcher_settles_as_an_error() {
    let client = QueryClient::new();
    let mut handle =
      client.subscribe::<u32, _, _>(QueryKey::Cabins, || async { panic!("fetcher blew up") });

    let state = tokio::time::timeout(Duration::from_secs(1), handle.settled())
      .await
      .expect("query settled");
    assert!(state.is_error());
  }

  #[tokio::test]
  async fn late_result_for_an_evicted_entry_is_discarded() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));
    let slow = {
      let calls = Arc::clone(&calls);
      move || {
        let calls = Arc::clone(&calls);
        async move {
          tokio::time::sleep(Duration::from_millis(30)).await;
          calls.fetch_add(1, Ordering::SeqCst);
          Ok::<_, String>(7u32)
        }
      }
    };

    client.prefetch::<u32, _, _>(QueryKey::Cabins, slow);
    client.remove_all();

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!client.contains(&QueryKey::Cabins));
    assert_eq!(client.get_query_data::<u32>(&QueryKey::Cabins), None);
  }

  #[tokio::test]
  async fn remove_all_clears_every_entry() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));

    let mut a = client.subscribe::<u32, _, _>(QueryKey::Cabins, counting_fetcher(&calls));
    let mut b = client.subscribe::<u32, _, _>(bookings_key(1), counting_fetcher(&calls));
    a.settled().await;
    b.settled().await;

    client.remove_all();

    assert!(!client.contains(&QueryKey::Cabins));
    assert!(!client.contains(&bookings_key(1)));
  }
}
