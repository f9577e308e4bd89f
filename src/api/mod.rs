//! Resource gateway boundary: traits for each resource kind and the
//! HTTP client implementing them.

mod gateway;
mod http;
pub mod types;

pub use gateway::{AuthGateway, BookingsGateway, CabinsGateway, SettingsGateway};
pub use http::ApiClient;
