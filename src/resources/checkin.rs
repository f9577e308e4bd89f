//! Check-in and check-out mutations.
//!
//! Checking a guest in or out changes dashboard aggregates as well as the
//! bookings list, so these mutations invalidate every active query rather
//! than one resource prefix.

use std::sync::Arc;

use crate::api::types::{Booking, BookingStatus, BookingUpdate};
use crate::api::BookingsGateway;
use crate::cache::QueryClient;
use crate::mutation::Mutation;
use crate::nav::Navigator;
use crate::notify::Notifier;

/// Breakfast added at check-in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakfast {
  pub extras_price: f64,
  pub total_price: f64,
}

/// Input for the check-in mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckIn {
  pub booking_id: i64,
  pub breakfast: Option<Breakfast>,
}

#[derive(Clone)]
pub struct CheckInOut {
  client: QueryClient,
  gateway: Arc<dyn BookingsGateway>,
  notifier: Arc<dyn Notifier>,
  navigator: Arc<dyn Navigator>,
}

impl CheckInOut {
  pub fn new(
    client: QueryClient,
    gateway: Arc<dyn BookingsGateway>,
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

  /// Check a booking in, marking it paid and optionally adding breakfast.
  ///
  /// On success every active query is invalidated and navigation returns
  /// to the dashboard root. Failures show a fixed message; the gateway
  /// error for this operation carries no user-appropriate detail.
  pub fn check_in(&self) -> Mutation<CheckIn, Booking> {
    let gateway = Arc::clone(&self.gateway);
    let client = self.client.clone();
    let notifier = Arc::clone(&self.notifier);
    let error_notifier = Arc::clone(&self.notifier);
    let navigator = Arc::clone(&self.navigator);

    Mutation::new(move |input: CheckIn| {
      let gateway = Arc::clone(&gateway);
      async move {
        let mut update = BookingUpdate {
          status: Some(BookingStatus::CheckedIn),
          is_paid: Some(true),
          ..Default::default()
        };
        if let Some(breakfast) = input.breakfast {
          update.has_breakfast = Some(true);
          update.extras_price = Some(breakfast.extras_price);
          update.total_price = Some(breakfast.total_price);
        }
        gateway
          .update_booking(input.booking_id, update)
          .await
          .map_err(|e| e.to_string())
      }
    })
    .on_success(move |booking: &Booking| {
      client.invalidate_all();
      notifier.success(&format!("Booking #{} successfully checked in", booking.id));
      navigator.push("/");
    })
    .on_error(move |_| error_notifier.error("There was an error while checking in"))
  }

  /// Check a booking out. Invalidates every active query on success.
  pub fn check_out(&self) -> Mutation<i64, Booking> {
    let gateway = Arc::clone(&self.gateway);
    let client = self.client.clone();
    let notifier = Arc::clone(&self.notifier);
    let error_notifier = Arc::clone(&self.notifier);

    Mutation::new(move |booking_id: i64| {
      let gateway = Arc::clone(&gateway);
      async move {
        let update = BookingUpdate {
          status: Some(BookingStatus::CheckedOut),
          ..Default::default()
        };
        gateway
          .update_booking(booking_id, update)
          .await
          .map_err(|e| e.to_string())
      }
    })
    .on_success(move |booking: &Booking| {
      client.invalidate_all();
      notifier.success(&format!("Booking #{} successfully checked out", booking.id));
    })
    .on_error(move |_| error_notifier.error("There was an error while checking out"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::BookingsPage;
  use crate::cache::{Filter, QueryKey, SortDescriptor};
  use crate::nav::doubles::RecordingNavigator;
  use crate::notify::doubles::RecordingNotifier;
  use async_trait::async_trait;
  use chrono::Utc;
  use color_eyre::{eyre::eyre, Result};
  use parking_lot::Mutex;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::time::Duration;

  fn booking_with_status(id: i64, status: BookingStatus) -> Booking {
    Booking {
      id,
      created_at: Utc::now(),
      start_date: Utc::now(),
      end_date: Utc::now(),
      num_nights: 2,
      num_guests: 2,
      cabin_price: 200.0,
      extras_price: 0.0,
      total_price: 200.0,
      status,
      has_breakfast: false,
      is_paid: true,
      observations: None,
      guest: None,
      cabin: None,
    }
  }

  #[derive(Default)]
  struct MockGateway {
    updates: Mutex<Vec<(i64, BookingUpdate)>>,
    detail_calls: AtomicU32,
    fail: bool,
  }

  #[async_trait]
  impl BookingsGateway for MockGateway {
    async fn bookings(
      &self,
      _filter: Option<Filter>,
      _sort: SortDescriptor,
      _page: u32,
    ) -> Result<BookingsPage> {
      Ok(BookingsPage {
        bookings: vec![],
        count: 0,
      })
    }

    async fn booking(&self, id: i64) -> Result<Booking> {
      self.detail_calls.fetch_add(1, Ordering::SeqCst);
      Ok(booking_with_status(id, BookingStatus::Unconfirmed))
    }

    async fn update_booking(&self, id: i64, update: BookingUpdate) -> Result<Booking> {
      if self.fail {
        return Err(eyre!("update rejected"));
      }
      let status = update.status.unwrap_or(BookingStatus::Unconfirmed);
      self.updates.lock().push((id, update));
      Ok(booking_with_status(id, status))
    }

    async fn delete_booking(&self, _id: i64) -> Result<()> {
      Ok(())
    }
  }

  struct Harness {
    checkin: CheckInOut,
    client: QueryClient,
    gateway: Arc<MockGateway>,
    notifier: Arc<RecordingNotifier>,
    navigator: Arc<RecordingNavigator>,
  }

  fn setup(gateway: MockGateway) -> Harness {
    let gateway = Arc::new(gateway);
    let notifier = Arc::new(RecordingNotifier::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let client = QueryClient::new();
    let checkin = CheckInOut::new(
      client.clone(),
      Arc::clone(&gateway) as Arc<dyn BookingsGateway>,
      Arc::clone(&notifier) as Arc<dyn Notifier>,
      Arc::clone(&navigator) as Arc<dyn Navigator>,
    );
    Harness {
      checkin,
      client,
      gateway,
      notifier,
      navigator,
    }
  }

  #[tokio::test]
  async fn check_in_marks_paid_notifies_and_navigates_home() {
    let h = setup(MockGateway::default());

    h.checkin
      .check_in()
      .mutate(CheckIn {
        booking_id: 123,
        breakfast: None,
      })
      .await
      .unwrap();

    let updates = h.gateway.updates.lock();
    assert_eq!(updates[0].0, 123);
    assert_eq!(updates[0].1.status, Some(BookingStatus::CheckedIn));
    assert_eq!(updates[0].1.is_paid, Some(true));
    assert_eq!(updates[0].1.has_breakfast, None);

    assert_eq!(
      *h.notifier.successes.lock(),
      vec!["Booking #123 successfully checked in".to_string()]
    );
    assert_eq!(*h.navigator.visits.lock(), vec![("/".to_string(), false)]);
  }

  #[tokio::test]
  async fn check_in_with_breakfast_carries_the_extra_prices() {
    let h = setup(MockGateway::default());

    h.checkin
      .check_in()
      .mutate(CheckIn {
        booking_id: 5,
        breakfast: Some(Breakfast {
          extras_price: 45.0,
          total_price: 245.0,
        }),
      })
      .await
      .unwrap();

    let updates = h.gateway.updates.lock();
    assert_eq!(updates[0].1.has_breakfast, Some(true));
    assert_eq!(updates[0].1.extras_price, Some(45.0));
    assert_eq!(updates[0].1.total_price, Some(245.0));
  }

  #[tokio::test]
  async fn check_in_invalidates_every_active_query() {
    let h = setup(MockGateway::default());

    // An active query of a different resource kind.
    let mut detail = {
      let gateway = Arc::clone(&h.gateway);
      h.client.subscribe(QueryKey::Booking { id: 9 }, move || {
        let gateway = Arc::clone(&gateway);
        async move { gateway.booking(9).await.map_err(|e| e.to_string()) }
      })
    };
    detail.settled().await;
    assert_eq!(h.gateway.detail_calls.load(Ordering::SeqCst), 1);

    h.checkin
      .check_in()
      .mutate(CheckIn {
        booking_id: 123,
        breakfast: None,
      })
      .await
      .unwrap();

    for _ in 0..50 {
      if h.gateway.detail_calls.load(Ordering::SeqCst) == 2 {
        break;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(h.gateway.detail_calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn check_in_failure_shows_the_fixed_message() {
    let h = setup(MockGateway {
      fail: true,
      ..Default::default()
    });

    let result = h
      .checkin
      .check_in()
      .mutate(CheckIn {
        booking_id: 1,
        breakfast: None,
      })
      .await;

    assert!(result.is_err());
    assert_eq!(
      *h.notifier.errors.lock(),
      vec!["There was an error while checking in".to_string()]
    );
    assert!(h.navigator.visits.lock().is_empty());
  }

  #[tokio::test]
  async fn check_out_notifies_without_navigating() {
    let h = setup(MockGateway::default());

    h.checkin.check_out().mutate(321).await.unwrap();

    let updates = h.gateway.updates.lock();
    assert_eq!(updates[0].1.status, Some(BookingStatus::CheckedOut));
    assert_eq!(
      *h.notifier.successes.lock(),
      vec!["Booking #321 successfully checked out".to_string()]
    );
    assert!(h.navigator.visits.lock().is_empty());
  }
}
