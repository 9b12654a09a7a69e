//! Adapter over the legacy ModDB API.

mod client;
mod details_store;
mod hydrate;
mod mapping;
mod search;
#[cfg(test)]
pub(crate) mod testing;
mod transport;

pub use client::{LegacyApiClient, DEFAULT_HYDRATION_CONCURRENCY};
pub use details_store::{DetailsMap, DetailsStore, ALL_DETAILS_KEY};
pub use hydrate::{run_periodic_hydration, HydrationReport};
pub use transport::{HttpLegacyTransport, LegacyTransport};
