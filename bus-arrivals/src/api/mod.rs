//! Station backend API client.
//!
//! Talks to the backend that stores favorites and proxies the city bus
//! provider, and unwraps the provider's envelopes into domain types.

mod client;
mod envelope;
mod error;
mod mock;
mod types;

pub use client::{
    BusApiClient, BusApiConfig, DEFAULT_ARRIVAL_TIMEOUT, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS,
    STATIONS_PATH,
};
pub use envelope::{
    ARRIVAL_ITEM_PATHS, EnvelopePath, HEADER_PATHS, SEARCH_ITEM_PATHS, arrival_records,
    extract_items, find_first, header, saved_stations, search_results,
};
pub use error::{ApiError, FailureKind};
pub use mock::{Endpoint, MockBusApi, MockCall, MockReply};
pub use types::{ArrivalItem, MsgHeader, StationItem};
