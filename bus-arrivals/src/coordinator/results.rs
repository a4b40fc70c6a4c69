//! The search → select → save/delete flow.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::api::search_results;
use crate::domain::{ArsId, Coordinate, ExtraInfo, NewStation, SearchResult, Station};
use crate::geo::rank_by_distance;
use crate::polling::{PollingController, Subject};
use crate::request::{AutoQuery, Failure, RequestExecutor};

use super::backend::{FAVORITES_PATH, StationBackend};

/// Errors from coordinator actions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinatorError {
    /// The stop is already among the favorites. Nothing was sent.
    #[error("{0} is already saved")]
    Duplicate(ArsId),

    /// The favorite has never been persisted, so it cannot be addressed.
    #[error("{0} has no backend id")]
    MissingIdentifier(String),

    /// The backend call failed.
    #[error("{}", .0.message)]
    Request(Failure),
}

/// What a search produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Blank keyword; nothing was sent and the previous results stand.
    Skipped,
    NoResults,
    /// Results, nearest first when a position was available.
    Found(Vec<SearchResult>),
}

/// Composes the executor, the favorites query, the ranking step and the
/// arrival poller into the client's main flow.
pub struct ResultCoordinator<B> {
    backend: Arc<B>,
    executor: RequestExecutor,
    favorites: AutoQuery<Vec<Station>, B>,
    detail: PollingController<B>,
    results: Vec<SearchResult>,
}

impl<B: StationBackend> ResultCoordinator<B> {
    pub fn new(backend: Arc<B>, poll_interval: Duration) -> Self {
        Self {
            executor: RequestExecutor::new(),
            favorites: AutoQuery::new(Arc::clone(&backend), FAVORITES_PATH),
            detail: PollingController::new(Arc::clone(&backend), poll_interval),
            results: Vec::new(),
            backend,
        }
    }

    /// Load the favorites list.
    pub async fn start(&self) {
        self.favorites.activate().await;
    }

    pub fn favorites(&self) -> &AutoQuery<Vec<Station>, B> {
        &self.favorites
    }

    /// Status of one-shot actions (search, save, delete, sync).
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// The arrival board of the open detail surface.
    pub fn detail(&self) -> &PollingController<B> {
        &self.detail
    }

    /// Results of the last successful search.
    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    /// Search the catalog and rank the hits around `observer`.
    ///
    /// A failed search leaves the previous results in place.
    pub async fn search(
        &mut self,
        keyword: &str,
        observer: Option<Coordinate>,
    ) -> Result<SearchOutcome, CoordinatorError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(SearchOutcome::Skipped);
        }

        let envelope = self
            .executor
            .request(|| self.backend.search(keyword))
            .await
            .into_result()
            .map_err(CoordinatorError::Request)?;

        let hits = search_results(&envelope);
        self.results = rank_by_distance(observer, &hits);
        info!(
            keyword,
            results = self.results.len(),
            ranked = observer.is_some(),
            "search finished"
        );

        if self.results.is_empty() {
            Ok(SearchOutcome::NoResults)
        } else {
            Ok(SearchOutcome::Found(self.results.clone()))
        }
    }

    /// Open the detail surface for a search hit.
    pub fn select(&mut self, candidate: &SearchResult) {
        self.open_detail(Subject::from(candidate));
    }

    /// Open the detail surface for any subject, e.g. a saved favorite.
    pub fn open_detail(&mut self, subject: Subject) {
        self.detail.activate(subject);
    }

    pub fn close_detail(&mut self) {
        self.detail.clear();
    }

    /// Save a search hit as a favorite.
    ///
    /// Stops before any network call if the stop is already saved. The
    /// travel direction is looked up from the live board first; if that
    /// fails the favorite is saved without one. On success the favorites
    /// are reloaded and the detail surface closes.
    pub async fn save(&mut self, candidate: &SearchResult) -> Result<Station, CoordinatorError> {
        if let Some(saved) = self.favorites.data()
            && saved.iter().any(|s| s.ars_id == candidate.ars_id)
        {
            info!(ars_id = %candidate.ars_id, "already saved");
            return Err(CoordinatorError::Duplicate(candidate.ars_id.clone()));
        }

        let direction = self.lookup_direction(&candidate.ars_id).await;
        let payload = NewStation::from_candidate(candidate, direction);

        let stored = self
            .executor
            .request(|| self.backend.create_station(&payload))
            .await
            .into_result()
            .map_err(CoordinatorError::Request)?;

        info!(ars_id = %stored.ars_id, id = ?stored.id, "favorite saved");
        self.favorites.refetch().await;
        self.close_detail();
        Ok(stored)
    }

    async fn lookup_direction(&self, ars_id: &ArsId) -> String {
        match self.backend.arrivals(ars_id).await {
            Ok(records) => ExtraInfo::from_records(&records)
                .map(|extra| extra.direction)
                .unwrap_or_default(),
            Err(err) => {
                debug!(%ars_id, error = %err, "direction lookup failed, saving without");
                String::new()
            }
        }
    }

    /// Remove a favorite.
    pub async fn delete(&self, station: &Station) -> Result<(), CoordinatorError> {
        let Some(id) = station.id else {
            return Err(CoordinatorError::MissingIdentifier(
                station.station_name.clone(),
            ));
        };

        self.executor
            .request(|| self.backend.delete_station(id))
            .await
            .into_result()
            .map_err(CoordinatorError::Request)?;

        info!(id, station = %station.station_name, "favorite deleted");
        self.favorites.refetch().await;
        Ok(())
    }

    /// Ask the backend to re-import the catalog, then reload favorites.
    pub async fn sync_all(&self) -> Result<String, CoordinatorError> {
        let summary = self
            .executor
            .request(|| self.backend.sync_all())
            .await
            .into_result()
            .map_err(CoordinatorError::Request)?;

        info!(%summary, "catalog synced");
        self.favorites.refetch().await;
        Ok(summary)
    }

    /// Favorites whose name or ARS id contains `keyword`.
    ///
    /// Case-sensitive. An empty keyword returns every favorite.
    pub fn filter_favorites(&self, keyword: &str) -> Vec<Station> {
        let saved = self.favorites.data().unwrap_or_default();
        if keyword.is_empty() {
            return saved;
        }
        saved.into_iter().filter(|s| s.matches(keyword)).collect()
    }
}

#[cfg(test)]
#[path = "results_tests.rs"]
mod tests;
