//! HTTP implementation of the resource gateways.
//!
//! Talks to a PostgREST-style API: filters and ordering travel as query
//! parameters, pagination uses `Range` headers with `Prefer: count=exact`,
//! and writes ask for the updated representation back.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Response, StatusCode};
use tracing::debug;

use crate::cache::{Filter, SortDescriptor};
use crate::config::Config;
use crate::params::PAGE_SIZE;

use super::gateway::{AuthGateway, BookingsGateway, CabinsGateway, SettingsGateway};
use super::types::{
  Booking, BookingUpdate, BookingsPage, Cabin, CabinPayload, Credentials, Setting, SettingUpdate,
  User,
};

/// Columns fetched for booking rows, including the embedded guest and
/// cabin fields list views render.
const BOOKING_SELECT: &str = "*,guests(fullName,email),cabins(name)";

/// Booking API client backed by `reqwest`.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::api_token()?;

    let mut headers = HeaderMap::new();
    let apikey =
      HeaderValue::from_str(&token).map_err(|e| eyre!("Invalid API token: {}", e))?;
    let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
      .map_err(|e| eyre!("Invalid API token: {}", e))?;
    headers.insert("apikey", apikey);
    headers.insert(AUTHORIZATION, bearer);

    let http = reqwest::Client::builder()
      .default_headers(headers)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url: config.api.url.trim_end_matches('/').to_string(),
    })
  }

  fn rest_url(&self, table: &str) -> String {
    format!("{}/rest/v1/{}", self.base_url, table)
  }

  fn auth_url(&self, path: &str) -> String {
    format!("{}/auth/v1/{}", self.base_url, path)
  }
}

/// Fail with the response body as the error message on non-2xx status.
async fn checked(response: Response, what: &str) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  let body = response.text().await.unwrap_or_default();
  Err(eyre!("Failed to {}: {} {}", what, status, body.trim()))
}

fn order_param(sort: &SortDescriptor) -> String {
  format!("{}.{}", sort.field, sort.direction.as_str())
}

/// Total row count from a `Content-Range` header value like `0-9/25`.
fn content_range_total(value: &str) -> Option<u32> {
  value.rsplit_once('/')?.1.parse().ok()
}

#[async_trait]
impl BookingsGateway for ApiClient {
  async fn bookings(
    &self,
    filter: Option<Filter>,
    sort: SortDescriptor,
    page: u32,
  ) -> Result<BookingsPage> {
    let mut query = vec![
      ("select".to_string(), BOOKING_SELECT.to_string()),
      ("order".to_string(), order_param(&sort)),
    ];
    if let Some(filter) = &filter {
      query.push((filter.field.clone(), format!("eq.{}", filter.value)));
    }

    // Widened so arbitrarily large page numbers cannot overflow.
    let from = (page as u64 - 1) * PAGE_SIZE as u64;
    let to = from + PAGE_SIZE as u64 - 1;
    debug!(page, from, to, "fetching bookings page");

    let response = self
      .http
      .get(self.rest_url("bookings"))
      .query(&query)
      .header("Range", format!("{}-{}", from, to))
      .header("Prefer", "count=exact")
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch bookings: {}", e))?;
    let response = checked(response, "fetch bookings").await?;

    let count = response
      .headers()
      .get("content-range")
      .and_then(|v| v.to_str().ok())
      .and_then(content_range_total)
      .ok_or_else(|| eyre!("Bookings response is missing a total count"))?;

    let bookings: Vec<Booking> = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse bookings: {}", e))?;

    Ok(BookingsPage { bookings, count })
  }

  async fn booking(&self, id: i64) -> Result<Booking> {
    let response = self
      .http
      .get(self.rest_url("bookings"))
      .query(&[("select", BOOKING_SELECT), ("id", &format!("eq.{}", id))])
      .header("Accept", "application/vnd.pgrst.object+json")
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch booking {}: {}", id, e))?;

    if response.status() == StatusCode::NOT_ACCEPTABLE {
      return Err(eyre!("Booking {} not found", id));
    }
    let response = checked(response, "fetch booking").await?;

    response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse booking {}: {}", id, e))
  }

  async fn update_booking(&self, id: i64, update: BookingUpdate) -> Result<Booking> {
    let response = self
      .http
      .patch(self.rest_url("bookings"))
      .query(&[("id", format!("eq.{}", id))])
      .header("Prefer", "return=representation")
      .json(&update)
      .send()
      .await
      .map_err(|e| eyre!("Failed to update booking {}: {}", id, e))?;
    let response = checked(response, "update booking").await?;

    let mut rows: Vec<Booking> = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse updated booking: {}", e))?;
    rows
      .pop()
      .ok_or_else(|| eyre!("Booking {} not found", id))
  }

  async fn delete_booking(&self, id: i64) -> Result<()> {
    let response = self
      .http
      .delete(self.rest_url("bookings"))
      .query(&[("id", format!("eq.{}", id))])
      .send()
      .await
      .map_err(|e| eyre!("Failed to delete booking {}: {}", id, e))?;
    checked(response, "delete booking").await?;
    Ok(())
  }
}

#[async_trait]
impl CabinsGateway for ApiClient {
  async fn cabins(&self) -> Result<Vec<Cabin>> {
    let response = self
      .http
      .get(self.rest_url("cabins"))
      .query(&[("select", "*"), ("order", "name.asc")])
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch cabins: {}", e))?;
    let response = checked(response, "fetch cabins").await?;

    response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse cabins: {}", e))
  }

  async fn create_edit_cabin(&self, payload: CabinPayload, id: Option<i64>) -> Result<Cabin> {
    let request = match id {
      Some(id) => self
        .http
        .patch(self.rest_url("cabins"))
        .query(&[("id", format!("eq.{}", id))]),
      None => self.http.post(self.rest_url("cabins")),
    };

    let response = request
      .header("Prefer", "return=representation")
      .json(&payload)
      .send()
      .await
      .map_err(|e| eyre!("Failed to save cabin: {}", e))?;
    let response = checked(response, "save cabin").await?;

    let mut rows: Vec<Cabin> = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse saved cabin: {}", e))?;
    rows.pop().ok_or_else(|| eyre!("Cabin could not be saved"))
  }

  async fn delete_cabin(&self, id: i64) -> Result<()> {
    let response = self
      .http
      .delete(self.rest_url("cabins"))
      .query(&[("id", format!("eq.{}", id))])
      .send()
      .await
      .map_err(|e| eyre!("Failed to delete cabin {}: {}", id, e))?;
    checked(response, "delete cabin").await?;
    Ok(())
  }
}

#[async_trait]
impl SettingsGateway for ApiClient {
  async fn settings(&self) -> Result<Setting> {
    let response = self
      .http
      .get(self.rest_url("settings"))
      .query(&[("select", "*")])
      .header("Accept", "application/vnd.pgrst.object+json")
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch settings: {}", e))?;
    let response = checked(response, "fetch settings").await?;

    response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse settings: {}", e))
  }

  async fn update_setting(&self, update: SettingUpdate) -> Result<Setting> {
    // Settings live in a single row.
    let response = self
      .http
      .patch(self.rest_url("settings"))
      .query(&[("id", "eq.1")])
      .header("Prefer", "return=representation")
      .json(&update)
      .send()
      .await
      .map_err(|e| eyre!("Failed to update settings: {}", e))?;
    let response = checked(response, "update settings").await?;

    let mut rows: Vec<Setting> = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse updated settings: {}", e))?;
    rows
      .pop()
      .ok_or_else(|| eyre!("Settings could not be updated"))
  }
}

/// Shape of the auth token endpoint's response; only the identity matters
/// here, token storage is out of scope.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
  user: User,
}

#[async_trait]
impl AuthGateway for ApiClient {
  async fn login(&self, credentials: Credentials) -> Result<User> {
    let response = self
      .http
      .post(self.auth_url("token"))
      .query(&[("grant_type", "password")])
      .json(&credentials)
      .send()
      .await
      .map_err(|e| eyre!("Failed to log in: {}", e))?;
    let response = checked(response, "log in").await?;

    let token: TokenResponse = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse login response: {}", e))?;
    Ok(token.user)
  }

  async fn logout(&self) -> Result<()> {
    let response = self
      .http
      .post(self.auth_url("logout"))
      .send()
      .await
      .map_err(|e| eyre!("Failed to log out: {}", e))?;
    checked(response, "log out").await?;
    Ok(())
  }

  async fn current_user(&self) -> Result<User> {
    let response = self
      .http
      .get(self.auth_url("user"))
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch current user: {}", e))?;
    let response = checked(response, "fetch current user").await?;

    response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse current user: {}", e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::SortDirection;

  #[test]
  fn content_range_total_parses_postgrest_format() {
    assert_eq!(content_range_total("0-9/25"), Some(25));
    assert_eq!(content_range_total("*/0"), Some(0));
    assert_eq!(content_range_total("garbage"), None);
  }

  #[test]
  fn order_param_is_field_dot_direction() {
    let sort = SortDescriptor::new("startDate", SortDirection::Desc);
    assert_eq!(order_param(&sort), "startDate.desc");
  }
}
