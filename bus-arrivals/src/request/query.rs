//! Auto-fetching query bound to a resource locator.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use crate::api::ApiError;

use super::executor::Failure;
use super::state::RequestState;

/// Something that can fetch a `T` for a locator (a backend path).
pub trait Resource<T>: Send + Sync {
    fn fetch(&self, locator: &str) -> impl Future<Output = Result<T, ApiError>> + Send;
}

/// Latest issued fetch.
#[derive(Debug)]
struct Cursor {
    locator: String,
    token: u64,
}

/// Keeps a [`RequestState`] in sync with the resource at a locator.
///
/// Every fetch takes a fresh token. A completion is applied only if its
/// token is still the latest issued; anything older is dropped, so a slow
/// response for a previous locator can never overwrite a newer one.
pub struct AutoQuery<T, S> {
    source: Arc<S>,
    cursor: Mutex<Cursor>,
    state: watch::Sender<RequestState<T>>,
}

impl<T, S> AutoQuery<T, S>
where
    T: Clone + Send + Sync,
    S: Resource<T>,
{
    /// Create an inactive query. Call [`activate`](Self::activate) to load.
    pub fn new(source: Arc<S>, locator: impl Into<String>) -> Self {
        let (state, _) = watch::channel(RequestState::default());
        Self {
            source,
            cursor: Mutex::new(Cursor {
                locator: locator.into(),
                token: 0,
            }),
            state,
        }
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> RequestState<T> {
        self.state.borrow().clone()
    }

    /// Current data, if any fetch has succeeded.
    pub fn data(&self) -> Option<T> {
        self.state.borrow().data.clone()
    }

    pub fn locator(&self) -> String {
        self.lock_cursor().locator.clone()
    }

    /// Initial fetch for the current locator.
    pub async fn activate(&self) {
        self.refetch().await;
    }

    /// Point the query at a new locator and fetch it.
    ///
    /// Does nothing if the locator is unchanged.
    pub async fn set_locator(&self, locator: impl Into<String>) {
        if let Some((token, locator)) = self.issue(Some(locator.into())) {
            self.run(token, locator).await;
        }
    }

    /// Fetch the current locator again.
    pub async fn refetch(&self) {
        if let Some((token, locator)) = self.issue(None) {
            self.run(token, locator).await;
        }
    }

    fn lock_cursor(&self) -> MutexGuard<'_, Cursor> {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take a new token and mark the state as loading.
    fn issue(&self, locator: Option<String>) -> Option<(u64, String)> {
        let mut cursor = self.lock_cursor();
        if let Some(locator) = locator {
            if locator == cursor.locator && cursor.token > 0 {
                return None;
            }
            cursor.locator = locator;
        }
        cursor.token += 1;
        self.state.send_modify(RequestState::begin);
        Some((cursor.token, cursor.locator.clone()))
    }

    async fn run(&self, token: u64, locator: String) {
        debug!(%locator, token, "fetching");
        let result = self.source.fetch(&locator).await;

        let cursor = self.lock_cursor();
        if cursor.token != token {
            debug!(%locator, token, latest = cursor.token, "discarding stale response");
            return;
        }

        match result {
            Ok(data) => self.state.send_modify(|s| s.succeed(data)),
            Err(err) => {
                let failure = Failure::from_error(&err);
                debug!(%locator, error = %err, "fetch failed, keeping previous data");
                self.state.send_modify(|s| s.fail(failure.message));
            }
        }
    }
}
