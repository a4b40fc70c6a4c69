//! One-shot request execution with a uniform outcome.

use std::future::Future;

use tokio::sync::watch;
use tracing::debug;

use crate::api::{ApiError, FailureKind};

/// Message used when a failure carries no usable text at all.
pub const FALLBACK_ERROR: &str = "request failed";

/// A settled failure, reduced to what a view can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    /// Reduce an [`ApiError`] to a user-facing message.
    ///
    /// Prefers the structured message in the failure payload, then the
    /// transport error text, then [`FALLBACK_ERROR`].
    pub fn from_error(err: &ApiError) -> Self {
        let message = err
            .payload_message()
            .or_else(|| err.transport_message())
            .unwrap_or_else(|| FALLBACK_ERROR.to_string());
        Self {
            kind: err.kind(),
            message,
        }
    }
}

/// Result of one executed call. Exactly one of data or error is present.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(Failure),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Outcome::Success(data) => Some(data),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(f) => Some(&f.message),
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(f) => Some(f),
        }
    }

    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Outcome::Success(data) => Ok(data),
            Outcome::Failure(f) => Err(f),
        }
    }
}

/// Shared status of the actions run through one executor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionStatus {
    pub loading: bool,
    pub error: Option<String>,
}

/// Runs one-shot calls (searches, saves, deletes) and reports a uniform
/// [`Outcome`].
///
/// Calls are not serialized or de-duplicated. Overlapping calls each flip
/// the shared `loading` flag; the last one to settle wins.
#[derive(Debug)]
pub struct RequestExecutor {
    status: watch::Sender<ActionStatus>,
}

impl Default for RequestExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestExecutor {
    pub fn new() -> Self {
        let (status, _) = watch::channel(ActionStatus::default());
        Self { status }
    }

    /// Watch the shared loading/error status.
    pub fn subscribe(&self) -> watch::Receiver<ActionStatus> {
        self.status.subscribe()
    }

    /// Snapshot of the shared status.
    pub fn status(&self) -> ActionStatus {
        self.status.borrow().clone()
    }

    /// Execute `call`, converting every failure into [`Outcome::Failure`].
    pub async fn request<T, F, Fut>(&self, call: F) -> Outcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.status.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let result = call().await;

        match result {
            Ok(data) => {
                self.status.send_modify(|s| {
                    s.loading = false;
                    s.error = None;
                });
                Outcome::Success(data)
            }
            Err(err) => {
                let failure = Failure::from_error(&err);
                debug!(error = %err, kind = ?failure.kind, "request failed");
                self.status.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(failure.message.clone());
                });
                Outcome::Failure(failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn success_populates_data_only() {
        let executor = RequestExecutor::new();
        let outcome = executor.request(|| async { Ok::<_, ApiError>(42) }).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.data(), Some(&42));
        assert_eq!(outcome.error(), None);
        assert_eq!(executor.status(), ActionStatus::default());
    }

    #[tokio::test]
    async fn failure_populates_error_only() {
        let executor = RequestExecutor::new();
        let outcome: Outcome<u32> = executor
            .request(|| async {
                Err(ApiError::Transport("connection refused".into()))
            })
            .await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.data(), None);
        assert_eq!(outcome.error(), Some("connection refused"));
        assert_eq!(
            executor.status().error.as_deref(),
            Some("connection refused")
        );
        assert!(!executor.status().loading);
    }

    #[tokio::test]
    async fn payload_message_preferred_over_transport_text() {
        let executor = RequestExecutor::new();
        let outcome: Outcome<()> = executor
            .request(|| async {
                Err(ApiError::Status {
                    status: 500,
                    body: r#"{"message":"duplicate arsId"}"#.into(),
                })
            })
            .await;
        assert_eq!(outcome.error(), Some("duplicate arsId"));
    }

    #[tokio::test]
    async fn fallback_when_no_text() {
        let executor = RequestExecutor::new();
        let outcome: Outcome<()> = executor
            .request(|| async { Err(ApiError::Transport(String::new())) })
            .await;
        assert_eq!(outcome.error(), Some(FALLBACK_ERROR));
    }

    #[tokio::test]
    async fn upstream_kind_is_preserved() {
        let executor = RequestExecutor::new();
        let outcome: Outcome<()> = executor
            .request(|| async {
                Err(ApiError::Upstream {
                    code: "7".into(),
                    message: "invalid key".into(),
                })
            })
            .await;
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Upstream);
        assert_eq!(failure.message, "invalid key");
    }

    #[tokio::test]
    async fn new_call_clears_previous_error() {
        let executor = RequestExecutor::new();
        let _: Outcome<()> = executor
            .request(|| async { Err(ApiError::Transport("down".into())) })
            .await;
        assert!(executor.status().error.is_some());

        let _ = executor.request(|| async { Ok::<_, ApiError>(()) }).await;
        assert_eq!(executor.status().error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn loading_only_while_in_flight() {
        let executor = RequestExecutor::new();
        let rx = executor.subscribe();

        let call = executor.request(|| async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<_, ApiError>("done")
        });
        tokio::pin!(call);

        assert!(!rx.borrow().loading);
        tokio::select! {
            biased;
            _ = &mut call => panic!("call settled too early"),
            _ = tokio::time::sleep(Duration::from_millis(10)) => {}
        }
        assert!(rx.borrow().loading);

        let outcome = call.await;
        assert_eq!(outcome.data(), Some(&"done"));
        assert!(!rx.borrow().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_calls_last_settlement_wins() {
        let executor = RequestExecutor::new();

        let slow = executor.request(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok::<_, ApiError>(1)
        });
        let fast = executor.request(|| async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Err::<i32, _>(ApiError::Transport("fast failed".into()))
        });

        let (slow, fast) = tokio::join!(slow, fast);
        assert_eq!(slow.data(), Some(&1));
        assert_eq!(fast.error(), Some("fast failed"));
        // The slow success settled last, so the earlier failure is gone.
        assert_eq!(executor.status(), ActionStatus::default());
    }
}
