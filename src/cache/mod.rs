//! Client-side cache for remote resources.
//!
//! This module provides the synchronization core: structured query keys,
//! a shared [`QueryClient`] with per-key fetch deduplication and prefix
//! invalidation, and typed [`QueryHandle`]s for observing entries.

mod client;
mod key;
mod state;

pub use client::{QueryClient, QueryHandle};
pub use key::{Filter, KeyPrefix, QueryKey, SortDescriptor, SortDirection};
pub use state::QueryState;
