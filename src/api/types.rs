//! Domain types exchanged with the booking API.
//!
//! Field names follow the wire format (camelCase) so cached values and
//! gateway payloads round-trip without renaming glue at every call site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
  Unconfirmed,
  CheckedIn,
  CheckedOut,
}

impl BookingStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      BookingStatus::Unconfirmed => "unconfirmed",
      BookingStatus::CheckedIn => "checked-in",
      BookingStatus::CheckedOut => "checked-out",
    }
  }
}

/// Guest fields embedded in booking rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
  pub full_name: String,
  pub email: String,
}

/// Cabin fields embedded in booking rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CabinRef {
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
  pub id: i64,
  pub created_at: DateTime<Utc>,
  pub start_date: DateTime<Utc>,
  pub end_date: DateTime<Utc>,
  pub num_nights: u32,
  pub num_guests: u32,
  pub cabin_price: f64,
  pub extras_price: f64,
  pub total_price: f64,
  pub status: BookingStatus,
  pub has_breakfast: bool,
  pub is_paid: bool,
  pub observations: Option<String>,
  #[serde(default, rename = "guests")]
  pub guest: Option<Guest>,
  #[serde(default, rename = "cabins")]
  pub cabin: Option<CabinRef>,
}

/// One page of the bookings list together with the total row count the
/// filter matches. The count drives next-page prefetching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingsPage {
  pub bookings: Vec<Booking>,
  pub count: u32,
}

/// Fields a booking update may change. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<BookingStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_paid: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub has_breakfast: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub extras_price: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub total_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cabin {
  pub id: i64,
  pub name: String,
  pub max_capacity: u32,
  pub regular_price: f64,
  pub discount: f64,
  pub description: Option<String>,
  pub image: Option<String>,
}

/// Payload for creating a cabin or editing an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CabinPayload {
  pub name: String,
  pub max_capacity: u32,
  pub regular_price: f64,
  pub discount: f64,
  pub description: Option<String>,
  pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
  pub min_booking_length: u32,
  pub max_booking_length: u32,
  pub max_guests_per_booking: u32,
  pub breakfast_price: f64,
}

/// Partial settings update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub min_booking_length: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_booking_length: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_guests_per_booking: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub breakfast_price: Option<f64>,
}

/// The authenticated user identity kept in the session cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: i64,
  pub email: String,
  #[serde(default)]
  pub full_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
  pub email: String,
  pub password: String,
}
