//! Client core for a small hospitality booking operation.
//!
//! The crate centers on a remote-resource synchronization layer: a shared
//! [`cache::QueryClient`] caches server data under structured keys derived
//! from navigation state, resource modules expose typed queries and
//! mutations over it, and mutations keep the cache consistent through
//! prefix invalidation, direct writes and full removal. External surfaces
//! (remote gateway, navigation, notifications) are traits supplied by the
//! embedding shell.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod mutation;
pub mod nav;
pub mod notify;
pub mod params;
pub mod resources;
