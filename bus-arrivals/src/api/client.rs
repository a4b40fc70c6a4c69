//! HTTP client for the station backend.
//!
//! The backend stores favorites and proxies the city bus provider. Provider
//! payloads come back as loosely shaped JSON envelopes; favorites are plain
//! JSON.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::coordinator::StationBackend;
use crate::domain::{ArrivalRecord, ArsId, NewStation, Station};
use crate::polling::ArrivalSource;
use crate::request::Resource;

use super::envelope::{arrival_records, saved_stations};
use super::error::ApiError;

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default timeout for one arrival board fetch. Kept below the default poll
/// interval so every tick settles before the next one is issued.
pub const DEFAULT_ARRIVAL_TIMEOUT: Duration = Duration::from_secs(8);

/// Collection path for saved favorites.
pub const STATIONS_PATH: &str = "/api/stations";

/// Configuration for the backend client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusApiConfig {
    /// Base URL of the backend, without a trailing slash
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Timeout for arrival board fetches, which are polled
    pub arrival_timeout: Duration,
}

impl Default for BusApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl BusApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            arrival_timeout: DEFAULT_ARRIVAL_TIMEOUT,
        }
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the arrival fetch timeout.
    pub fn with_arrival_timeout(mut self, timeout: Duration) -> Self {
        self.arrival_timeout = timeout;
        self
    }

    /// Arrival fetches never wait longer than the general request timeout.
    fn effective_arrival_timeout(&self) -> Duration {
        self.arrival_timeout
            .min(Duration::from_secs(self.timeout_secs))
    }
}

/// Backend API client.
#[derive(Debug, Clone)]
pub struct BusApiClient {
    http: reqwest::Client,
    base_url: String,
    arrival_timeout: Duration,
}

impl BusApiClient {
    pub fn new(config: BusApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            arrival_timeout: config.effective_arrival_timeout(),
            base_url: config.base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }

    fn decode<T: DeserializeOwned>(body: String) -> Result<T, ApiError> {
        serde_json::from_str(&body).map_err(|e| ApiError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }

    /// Decode a provider envelope. The backend answers an empty 200 when
    /// the provider call fails on its side; that becomes `Null`.
    fn decode_envelope(body: String) -> Result<Value, ApiError> {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Self::decode(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.send(self.http.get(self.url(path))).await?;
        Self::decode(body)
    }

    /// All saved favorites. Rows that do not decode are skipped.
    pub async fn list_stations(&self) -> Result<Vec<Station>, ApiError> {
        self.stations_at(STATIONS_PATH).await
    }

    async fn stations_at(&self, path: &str) -> Result<Vec<Station>, ApiError> {
        let rows: Value = self.get_json(path).await?;
        saved_stations(rows)
    }

    /// Catalog search by station name. Returns the raw provider envelope.
    pub async fn search(&self, keyword: &str) -> Result<Value, ApiError> {
        debug!(keyword, "catalog search");
        let request = self
            .http
            .get(self.url(&format!("{STATIONS_PATH}/search")))
            .query(&[("keyword", keyword)]);
        let body = self.send(request).await?;
        Self::decode_envelope(body)
    }

    async fn arrival_envelope(&self, ars_id: &ArsId) -> Result<Value, ApiError> {
        let path = format!("{STATIONS_PATH}/arrival/{ars_id}");
        let request = self
            .http
            .get(self.url(&path))
            .timeout(self.arrival_timeout);
        let body = self.send(request).await?;
        Self::decode_envelope(body)
    }

    /// Live arrivals for a stop.
    pub async fn arrivals(&self, ars_id: &ArsId) -> Result<Vec<ArrivalRecord>, ApiError> {
        let envelope = self.arrival_envelope(ars_id).await?;
        arrival_records(&envelope)
    }

    /// Save a favorite. Returns the stored record with its backend id.
    pub async fn create_station(&self, station: &NewStation) -> Result<Station, ApiError> {
        let request = self.http.post(self.url(STATIONS_PATH)).json(station);
        let body = self.send(request).await?;
        Self::decode(body)
    }

    pub async fn delete_station(&self, id: i64) -> Result<(), ApiError> {
        let path = format!("{STATIONS_PATH}/{id}");
        self.send(self.http.delete(self.url(&path))).await?;
        Ok(())
    }

    /// Ask the backend to re-import the whole station catalog.
    ///
    /// Returns the backend's plain-text summary.
    pub async fn sync_all(&self) -> Result<String, ApiError> {
        let path = format!("{STATIONS_PATH}/sync");
        self.send(self.http.post(self.url(&path))).await
    }

    /// Saved favorites whose name contains `keyword`, matched by the backend.
    pub async fn local_search(&self, keyword: &str) -> Result<Vec<Station>, ApiError> {
        if keyword.trim().is_empty() {
            return Ok(Vec::new());
        }
        let request = self
            .http
            .get(self.url(&format!("{STATIONS_PATH}/local-search")))
            .query(&[("keyword", keyword)]);
        let body = self.send(request).await?;
        saved_stations(Self::decode(body)?)
    }
}

impl Resource<Vec<Station>> for BusApiClient {
    async fn fetch(&self, locator: &str) -> Result<Vec<Station>, ApiError> {
        self.stations_at(locator).await
    }
}

impl ArrivalSource for BusApiClient {
    async fn arrivals(&self, ars_id: &ArsId) -> Result<Vec<ArrivalRecord>, ApiError> {
        BusApiClient::arrivals(self, ars_id).await
    }
}

impl StationBackend for BusApiClient {
    async fn search(&self, keyword: &str) -> Result<Value, ApiError> {
        BusApiClient::search(self, keyword).await
    }

    async fn create_station(&self, station: &NewStation) -> Result<Station, ApiError> {
        BusApiClient::create_station(self, station).await
    }

    async fn delete_station(&self, id: i64) -> Result<(), ApiError> {
        BusApiClient::delete_station(self, id).await
    }

    async fn sync_all(&self) -> Result<String, ApiError> {
        BusApiClient::sync_all(self).await
    }
}
