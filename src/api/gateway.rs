//! Resource gateway traits.
//!
//! One async method per remote operation. Implementations fail with an
//! error whose display form is the human-readable message surfaced to the
//! cache and notification layers.

use async_trait::async_trait;
use color_eyre::Result;

use crate::cache::{Filter, SortDescriptor};

use super::types::{
  Booking, BookingUpdate, BookingsPage, Cabin, CabinPayload, Credentials, Setting, SettingUpdate,
  User,
};

#[async_trait]
pub trait BookingsGateway: Send + Sync {
  /// Fetch one page of bookings for the given filter/sort/page state.
  async fn bookings(
    &self,
    filter: Option<Filter>,
    sort: SortDescriptor,
    page: u32,
  ) -> Result<BookingsPage>;

  async fn booking(&self, id: i64) -> Result<Booking>;

  /// Apply a partial update and return the updated booking.
  async fn update_booking(&self, id: i64, update: BookingUpdate) -> Result<Booking>;

  async fn delete_booking(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait CabinsGateway: Send + Sync {
  async fn cabins(&self) -> Result<Vec<Cabin>>;

  /// Create a cabin, or edit the cabin with the given id.
  async fn create_edit_cabin(&self, payload: CabinPayload, id: Option<i64>) -> Result<Cabin>;

  async fn delete_cabin(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait SettingsGateway: Send + Sync {
  async fn settings(&self) -> Result<Setting>;

  async fn update_setting(&self, update: SettingUpdate) -> Result<Setting>;
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
  async fn login(&self, credentials: Credentials) -> Result<User>;

  async fn logout(&self) -> Result<()>;

  async fn current_user(&self) -> Result<User>;
}
