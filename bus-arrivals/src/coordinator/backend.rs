//! The backend surface the coordinator drives.

use std::future::Future;

use serde_json::Value;

use crate::api::{ApiError, STATIONS_PATH};
use crate::domain::{NewStation, Station};
use crate::polling::ArrivalSource;
use crate::request::Resource;

/// Locator of the favorites list.
pub const FAVORITES_PATH: &str = STATIONS_PATH;

/// Everything the search/save/delete flow needs from the backend.
///
/// Implemented by the HTTP client and by the in-memory mock.
pub trait StationBackend: ArrivalSource + Resource<Vec<Station>> {
    /// Catalog search. Returns the raw provider envelope.
    fn search(&self, keyword: &str) -> impl Future<Output = Result<Value, ApiError>> + Send;

    fn create_station(
        &self,
        station: &NewStation,
    ) -> impl Future<Output = Result<Station, ApiError>> + Send;

    fn delete_station(&self, id: i64) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Full catalog re-import. Returns the backend's summary text.
    fn sync_all(&self) -> impl Future<Output = Result<String, ApiError>> + Send;
}
