//! Resource operations composing the query cache with the gateways.
//!
//! One module per resource kind, each exposing its read queries and
//! mutations bound to a [`crate::cache::QueryClient`].

pub mod bookings;
pub mod cabins;
pub mod checkin;
pub mod settings;

pub use bookings::Bookings;
pub use cabins::Cabins;
pub use checkin::CheckInOut;
pub use settings::Settings;
