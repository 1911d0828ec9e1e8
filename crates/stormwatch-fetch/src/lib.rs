//! # stormwatch-fetch
//!
//! Fetches the set of active weather alerts from the NWS API.
//!
//! - [`AlertSource`] - the fetch seam the poll loop depends on
//! - [`NwsClient`] - reqwest-backed implementation against `api.weather.gov`
//! - [`FetchError`] - `Network` and `Parse` failures, both non-fatal to polling

pub mod client;
pub mod error;
pub mod geojson;

pub use client::{AlertSource, FetchConfig, NwsClient, REGION_TYPE};
pub use error::{FetchError, Result};
pub use geojson::{filter_events, parse_feature_collection};
