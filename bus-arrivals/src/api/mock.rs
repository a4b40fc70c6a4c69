//! In-memory backend for development and tests.
//!
//! Serves favorites from an in-memory store and provider envelopes from
//! canned JSON, optionally loaded from a directory of sample files. Replies
//! can be scripted with delays and failures, and every call is logged so
//! tests can assert on network traffic.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::{Value, json};

use crate::coordinator::StationBackend;
use crate::domain::{ArrivalRecord, ArsId, NewStation, Station};
use crate::polling::ArrivalSource;
use crate::request::Resource;

use super::client::STATIONS_PATH;
use super::envelope::arrival_records;
use super::error::ApiError;

/// Which backend operation a call hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    List,
    Search,
    Arrivals,
    Create,
    Delete,
    Sync,
    LocalSearch,
}

/// One logged call.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    List,
    Search(String),
    Arrivals(ArsId),
    Create(NewStation),
    Delete(i64),
    Sync,
    LocalSearch(String),
}

impl MockCall {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            MockCall::List => Endpoint::List,
            MockCall::Search(_) => Endpoint::Search,
            MockCall::Arrivals(_) => Endpoint::Arrivals,
            MockCall::Create(_) => Endpoint::Create,
            MockCall::Delete(_) => Endpoint::Delete,
            MockCall::Sync => Endpoint::Sync,
            MockCall::LocalSearch(_) => Endpoint::LocalSearch,
        }
    }
}

/// A scripted arrival reply.
#[derive(Debug)]
pub struct MockReply {
    pub delay: Duration,
    pub result: Result<Value, ApiError>,
}

#[derive(Debug, Default)]
struct MockState {
    stations: Vec<Station>,
    next_id: i64,
    search: HashMap<String, Value>,
    boards: HashMap<ArsId, Value>,
    scripted_arrivals: VecDeque<MockReply>,
    failures: HashMap<Endpoint, VecDeque<ApiError>>,
    latency: Duration,
    calls: Vec<MockCall>,
}

impl MockState {
    /// Log the call and take any failure queued for its endpoint.
    fn record(&mut self, call: MockCall) -> Option<ApiError> {
        let endpoint = call.endpoint();
        self.calls.push(call);
        self.failures
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front)
    }
}

fn not_found(what: String) -> ApiError {
    ApiError::Status {
        status: 404,
        body: json!({ "message": what }).to_string(),
    }
}

fn load_error(message: String) -> ApiError {
    ApiError::Transport(message)
}

fn read_error(path: &Path, e: std::io::Error) -> ApiError {
    load_error(format!("Failed to read {}: {e}", path.display()))
}

/// Mock backend that serves canned data.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockBusApi {
    state: Arc<Mutex<MockState>>,
}

impl MockBusApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load sample envelopes from a directory.
    ///
    /// Expects `boards/{arsId}.json` (arrival envelopes) and
    /// `search/{keyword}.json` (catalog envelopes). Either subdirectory may
    /// be missing, but at least one file must load.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self, ApiError> {
        let data_dir = data_dir.as_ref();
        let mut mock = Self::new();

        let boards = read_json_dir(&data_dir.join("boards"))?;
        let searches = read_json_dir(&data_dir.join("search"))?;
        if boards.is_empty() && searches.is_empty() {
            return Err(load_error(format!(
                "No mock files found in {}",
                data_dir.display()
            )));
        }

        for (stem, envelope) in boards {
            let ars_id = match ArsId::parse(&stem) {
                Ok(id) => id,
                Err(e) => return Err(load_error(format!("Invalid board file {stem}: {e}"))),
            };
            mock = mock.with_board(ars_id, envelope);
        }
        for (keyword, envelope) in searches {
            mock = mock.with_search(keyword, envelope);
        }
        Ok(mock)
    }

    /// Add a saved favorite. A missing id is assigned.
    pub fn with_station(self, mut station: Station) -> Self {
        {
            let mut state = self.lock();
            let id = match station.id {
                Some(id) => id,
                None => {
                    state.next_id += 1;
                    state.next_id
                }
            };
            state.next_id = state.next_id.max(id);
            station.id = Some(id);
            state.stations.push(station);
        }
        self
    }

    /// Catalog envelope returned for an exact keyword.
    pub fn with_search(self, keyword: impl Into<String>, envelope: Value) -> Self {
        self.lock().search.insert(keyword.into(), envelope);
        self
    }

    /// Arrival envelope returned for a stop.
    pub fn with_board(self, ars_id: ArsId, envelope: Value) -> Self {
        self.lock().boards.insert(ars_id, envelope);
        self
    }

    /// Delay applied to every unscripted reply.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = latency;
        self
    }

    /// Queue a reply for the next arrival call, ahead of the canned boards.
    pub fn script_arrival(&self, delay: Duration, result: Result<Value, ApiError>) {
        self.lock()
            .scripted_arrivals
            .push_back(MockReply { delay, result });
    }

    /// Make the next call to `endpoint` fail with `error`.
    pub fn fail_next(&self, endpoint: Endpoint, error: ApiError) {
        self.lock()
            .failures
            .entry(endpoint)
            .or_default()
            .push_back(error);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.endpoint() == endpoint)
            .count()
    }

    /// Current contents of the favorites store.
    pub fn stations(&self) -> Vec<Station> {
        self.lock().stations.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Settle a call after the configured latency. The lock is released
    /// before sleeping.
    async fn reply<T>(
        &self,
        call: MockCall,
        answer: impl FnOnce(&mut MockState) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let (latency, result) = {
            let mut state = self.lock();
            let result = match state.record(call) {
                Some(err) => Err(err),
                None => answer(&mut state),
            };
            (state.latency, result)
        };
        pause(latency).await;
        result
    }

    pub async fn list_stations(&self) -> Result<Vec<Station>, ApiError> {
        self.reply(MockCall::List, |state| Ok(state.stations.clone()))
            .await
    }

    pub async fn search(&self, keyword: &str) -> Result<Value, ApiError> {
        self.reply(MockCall::Search(keyword.to_string()), |state| {
            // Unknown names get the provider's no-result header.
            Ok(state.search.get(keyword).cloned().unwrap_or_else(|| {
                json!({
                    "msgHeader": {"headerCd": "4", "headerMsg": "결과가 없습니다."},
                    "msgBody": {}
                })
            }))
        })
        .await
    }

    pub async fn arrivals(&self, ars_id: &ArsId) -> Result<Vec<ArrivalRecord>, ApiError> {
        let (delay, result) = {
            let mut state = self.lock();
            if let Some(err) = state.record(MockCall::Arrivals(ars_id.clone())) {
                (state.latency, Err(err))
            } else if let Some(reply) = state.scripted_arrivals.pop_front() {
                (reply.delay, reply.result)
            } else {
                let board = state
                    .boards
                    .get(ars_id)
                    .cloned()
                    .ok_or_else(|| not_found(format!("No mock board for {ars_id}")));
                (state.latency, board)
            }
        };
        pause(delay).await;
        arrival_records(&result?)
    }

    pub async fn create_station(&self, station: &NewStation) -> Result<Station, ApiError> {
        self.reply(MockCall::Create(station.clone()), |state| {
            state.next_id += 1;
            let stored = Station {
                id: Some(state.next_id),
                station_id: station.station_id.clone(),
                station_name: station.station_name.clone(),
                ars_id: station.ars_id.clone(),
                direction: station.direction.clone(),
            };
            state.stations.push(stored.clone());
            Ok(stored)
        })
        .await
    }

    pub async fn delete_station(&self, id: i64) -> Result<(), ApiError> {
        self.reply(MockCall::Delete(id), |state| {
            state.stations.retain(|s| s.id != Some(id));
            Ok(())
        })
        .await
    }

    pub async fn sync_all(&self) -> Result<String, ApiError> {
        self.reply(MockCall::Sync, |state| {
            let saved = state.boards.len();
            Ok(format!("총 {saved}개의 정류장이 저장되었습니다!"))
        })
        .await
    }

    pub async fn local_search(&self, keyword: &str) -> Result<Vec<Station>, ApiError> {
        if keyword.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.reply(MockCall::LocalSearch(keyword.to_string()), |state| {
            Ok(state
                .stations
                .iter()
                .filter(|s| s.station_name.contains(keyword))
                .cloned()
                .collect())
        })
        .await
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Read every `*.json` file in `dir`, keyed by file stem. A missing
/// directory reads as empty.
fn read_json_dir(dir: &Path) -> Result<Vec<(String, Value)>, ApiError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| read_error(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| read_error(dir, e))?.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| load_error(format!("Invalid file {}", path.display())))?
            .to_string();

        let text = std::fs::read_to_string(&path).map_err(|e| read_error(&path, e))?;
        let value: Value = serde_json::from_str(&text).map_err(|e| ApiError::Json {
            message: format!("Failed to parse {}: {e}", path.display()),
            body: None,
        })?;
        files.push((stem, value));
    }
    Ok(files)
}

impl Resource<Vec<Station>> for MockBusApi {
    async fn fetch(&self, locator: &str) -> Result<Vec<Station>, ApiError> {
        if locator != STATIONS_PATH {
            return Err(not_found(format!("No mock resource at {locator}")));
        }
        self.list_stations().await
    }
}

impl ArrivalSource for MockBusApi {
    async fn arrivals(&self, ars_id: &ArsId) -> Result<Vec<ArrivalRecord>, ApiError> {
        MockBusApi::arrivals(self, ars_id).await
    }
}

impl StationBackend for MockBusApi {
    async fn search(&self, keyword: &str) -> Result<Value, ApiError> {
        MockBusApi::search(self, keyword).await
    }

    async fn create_station(&self, station: &NewStation) -> Result<Station, ApiError> {
        MockBusApi::create_station(self, station).await
    }

    async fn delete_station(&self, id: i64) -> Result<(), ApiError> {
        MockBusApi::delete_station(self, id).await
    }

    async fn sync_all(&self) -> Result<String, ApiError> {
        MockBusApi::sync_all(self).await
    }
}
