//! Interval polling of an arrival board.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::domain::{ArrivalRecord, ArsId};
use crate::request::Failure;

use super::board::{BoardState, PollPhase, Subject};

/// Default refresh interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Something that can fetch the live arrival board for a stop.
pub trait ArrivalSource: Send + Sync + 'static {
    fn arrivals(
        &self,
        ars_id: &ArsId,
    ) -> impl Future<Output = Result<Vec<ArrivalRecord>, ApiError>> + Send;
}

/// Keeps a [`BoardState`] fresh for one subject at a time.
///
/// The first fetch after [`activate`](Self::activate) is a foreground
/// load; every later tick refreshes in the background and never raises the
/// loading flag. Ticks are issued on schedule even while an earlier fetch
/// is still out, and only the most recently issued tick may write.
///
/// Switching subject or calling [`clear`](Self::clear) aborts the poll
/// task and moves to a new generation. Writes are checked against the
/// generation inside the channel update, so nothing from a superseded
/// subject can land after the switch.
pub struct PollingController<S> {
    source: Arc<S>,
    period: Duration,
    board: Arc<watch::Sender<BoardState>>,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl<S: ArrivalSource> PollingController<S> {
    /// Create an idle controller. A zero `period` falls back to the default.
    pub fn new(source: Arc<S>, period: Duration) -> Self {
        let period = if period.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            period
        };
        let (board, _) = watch::channel(BoardState::default());
        Self {
            source,
            period,
            board: Arc::new(board),
            generation: 0,
            task: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<BoardState> {
        self.board.subscribe()
    }

    /// Snapshot of the board.
    pub fn board(&self) -> BoardState {
        self.board.borrow().clone()
    }

    pub fn subject(&self) -> Option<Subject> {
        self.board.borrow().subject.clone()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }

    /// Start polling `subject`.
    ///
    /// Re-activating the subject that is already being polled does nothing.
    /// Must be called from within a tokio runtime.
    pub fn activate(&mut self, subject: Subject) {
        if self.task.is_some() && self.board.borrow().subject.as_ref() == Some(&subject) {
            debug!(ars_id = %subject.ars_id, "subject already active");
            return;
        }

        self.stop();
        self.generation += 1;
        info!(
            ars_id = %subject.ars_id,
            station = %subject.station_name,
            generation = self.generation,
            "polling arrivals"
        );
        self.board
            .send_replace(BoardState::started(subject.clone(), self.generation));

        let poll = PollLoop {
            source: Arc::clone(&self.source),
            board: Arc::clone(&self.board),
            subject,
            generation: self.generation,
            period: self.period,
        };
        self.task = Some(tokio::spawn(poll.run()));
    }

    /// Stop polling and reset to idle.
    pub fn clear(&mut self) {
        if self.stop() {
            debug!(generation = self.generation, "polling stopped");
        }
        self.generation += 1;
        self.board.send_replace(BoardState::idle(self.generation));
    }

    fn stop(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

impl<S> Drop for PollingController<S> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct PollLoop<S> {
    source: Arc<S>,
    board: Arc<watch::Sender<BoardState>>,
    subject: Subject,
    generation: u64,
    period: Duration,
}

impl<S: ArrivalSource> PollLoop<S> {
    async fn run(self) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut in_flight = FuturesUnordered::new();
        let mut issued: u64 = 0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    issued += 1;
                    if issued > 1 {
                        self.mark_refreshing();
                    }
                    let source = Arc::clone(&self.source);
                    let ars_id = self.subject.ars_id.clone();
                    let tick = issued;
                    in_flight.push(async move { (tick, source.arrivals(&ars_id).await) });
                }
                Some((tick, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    if tick != issued {
                        debug!(
                            ars_id = %self.subject.ars_id,
                            tick,
                            latest = issued,
                            "discarding stale tick"
                        );
                        continue;
                    }
                    self.apply(result);
                }
            }
        }
    }

    fn mark_refreshing(&self) {
        let generation = self.generation;
        self.board.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            match state.phase {
                PollPhase::Ready | PollPhase::Failed => {
                    state.phase = PollPhase::Refreshing;
                    true
                }
                _ => false,
            }
        });
    }

    fn apply(&self, result: Result<Vec<ArrivalRecord>, ApiError>) {
        let generation = self.generation;
        let outcome = result.map_err(|err| {
            warn!(ars_id = %self.subject.ars_id, error = %err, "arrival refresh failed");
            Failure::from_error(&err)
        });

        self.board.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            match outcome {
                Ok(records) => {
                    debug!(
                        ars_id = %self.subject.ars_id,
                        routes = records.len(),
                        "board refreshed"
                    );
                    state.apply_success(records, Local::now());
                }
                Err(failure) => state.apply_failure(failure),
            }
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Endpoint, FailureKind, MockBusApi};
    use serde_json::{Value, json};

    const PERIOD: Duration = Duration::from_secs(10);

    fn ars(s: &str) -> ArsId {
        ArsId::parse(s).unwrap()
    }

    fn gangnam() -> Subject {
        Subject::new(ars("22009"), "강남역")
    }

    fn yeoksam() -> Subject {
        Subject::new(ars("22010"), "역삼역")
    }

    fn board_json(routes: &[&str]) -> Value {
        let items: Vec<Value> = routes
            .iter()
            .map(|r| {
                json!({
                    "rtNm": r,
                    "arrmsg1": "3분후[2번째 전]",
                    "arrmsg2": "곧 도착",
                    "routeType": "4",
                    "nxtStn": "역삼역",
                    "adirection": "논현동",
                })
            })
            .collect();
        json!({
            "msgHeader": {"headerCd": "0", "headerMsg": "정상적으로 처리되었습니다."},
            "msgBody": {"itemList": items},
        })
    }

    fn gangnam_board(routes: &[&str]) -> Arc<MockBusApi> {
        let board = board_json(routes);
        Arc::new(MockBusApi::new().with_board(ars("22009"), board))
    }

    fn routes(state: &BoardState) -> Vec<&str> {
        state
            .records
            .iter()
            .map(|r| r.route_name.as_str())
            .collect()
    }

    async fn settle(poller: &PollingController<MockBusApi>, done: impl FnMut(&BoardState) -> bool) {
        let mut rx = poller.subscribe();
        tokio::time::timeout(Duration::from_secs(3600), rx.wait_for(done))
            .await
            .expect("board never settled")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_is_foreground_then_background() {
        let api = Arc::new(
            MockBusApi::new()
                .with_board(ars("22009"), board_json(&["146", "341"]))
                .with_latency(Duration::from_millis(500)),
        );
        let mut poller = PollingController::new(Arc::clone(&api), PERIOD);

        poller.activate(gangnam());
        assert!(poller.board().loading());
        assert!(poller.board().records.is_empty());

        settle(&poller, |b| b.phase == PollPhase::Ready).await;
        let board = poller.board();
        assert!(!board.loading());
        assert_eq!(routes(&board), vec!["146", "341"]);
        assert_eq!(board.extra.as_ref().unwrap().next_stop, "역삼역");
        assert!(board.last_updated_label().is_some());

        // Second tick is out but has not answered yet.
        tokio::time::sleep(Duration::from_millis(9_700)).await;
        let board = poller.board();
        assert_eq!(board.phase, PollPhase::Refreshing);
        assert!(!board.loading());
        assert_eq!(routes(&board), vec!["146", "341"]);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(poller.board().phase, PollPhase::Ready);
        assert_eq!(api.call_count(Endpoint::Arrivals), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn loading_is_raised_once_per_activation() {
        let api = Arc::new(
            MockBusApi::new()
                .with_board(ars("22009"), board_json(&["146"]))
                .with_latency(Duration::from_millis(200)),
        );
        let mut poller = PollingController::new(api, PERIOD);
        let mut rx = poller.subscribe();

        let observer = tokio::spawn(async move {
            let mut phases = vec![rx.borrow_and_update().phase];
            while rx.changed().await.is_ok() {
                phases.push(rx.borrow_and_update().phase);
            }
            phases
        });

        poller.activate(gangnam());
        tokio::time::sleep(Duration::from_secs(45)).await;
        drop(poller);

        let phases = observer.await.unwrap();
        let loading = phases.iter().filter(|p| **p == PollPhase::Loading).count();
        assert_eq!(loading, 1, "{phases:?}");
        assert!(phases.contains(&PollPhase::Refreshing), "{phases:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn clear_stops_all_mutation() {
        let api = gangnam_board(&["146"]);
        let mut poller = PollingController::new(Arc::clone(&api), PERIOD);

        poller.activate(gangnam());
        settle(&poller, |b| b.phase == PollPhase::Ready).await;
        poller.clear();

        let cleared = poller.board();
        assert_eq!(cleared.phase, PollPhase::Idle);
        assert!(cleared.subject.is_none());
        assert!(!poller.is_active());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(poller.board(), cleared);
        assert_eq!(api.call_count(Endpoint::Arrivals), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_discards_in_flight_fetch() {
        let api = Arc::new(
            MockBusApi::new()
                .with_board(ars("22009"), board_json(&["146"]))
                .with_latency(Duration::from_secs(5)),
        );
        let mut poller = PollingController::new(Arc::clone(&api), PERIOD);

        poller.activate(gangnam());
        tokio::time::sleep(Duration::from_secs(1)).await;
        poller.clear();

        tokio::time::sleep(Duration::from_secs(30)).await;
        let board = poller.board();
        assert_eq!(board.phase, PollPhase::Idle);
        assert!(board.records.is_empty());
        assert_eq!(api.call_count(Endpoint::Arrivals), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn switching_subject_never_leaks_records() {
        let api = Arc::new(
            MockBusApi::new()
                .with_board(ars("22009"), board_json(&["146"]))
                .with_board(ars("22010"), board_json(&["740"])),
        );
        // The first fetch for 강남역 is slow and must never land.
        api.script_arrival(Duration::from_secs(5), Ok(board_json(&["stale"])));
        let mut poller = PollingController::new(Arc::clone(&api), PERIOD);

        poller.activate(gangnam());
        tokio::time::sleep(Duration::from_secs(1)).await;
        poller.activate(yeoksam());

        let switched = poller.board();
        assert_eq!(switched.subject, Some(yeoksam()));
        assert!(switched.loading());
        assert!(switched.records.is_empty());

        settle(&poller, |b| b.phase == PollPhase::Ready).await;
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(routes(&poller.board()), vec!["740"]);
    }

    #[tokio::test(start_paused = true)]
    async fn reactivating_same_subject_is_noop() {
        let api = gangnam_board(&["146"]);
        let mut poller = PollingController::new(Arc::clone(&api), PERIOD);

        poller.activate(gangnam());
        settle(&poller, |b| b.phase == PollPhase::Ready).await;
        poller.activate(gangnam());

        assert_eq!(poller.board().phase, PollPhase::Ready);
        assert_eq!(routes(&poller.board()), vec!["146"]);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(api.call_count(Endpoint::Arrivals), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn older_tick_completing_late_is_discarded() {
        let api = gangnam_board(&["default"]);
        api.script_arrival(Duration::ZERO, Ok(board_json(&["first"])));
        api.script_arrival(Duration::from_secs(15), Ok(board_json(&["slow"])));
        api.script_arrival(Duration::ZERO, Ok(board_json(&["third"])));
        let mut poller = PollingController::new(Arc::clone(&api), PERIOD);

        poller.activate(gangnam());
        settle(&poller, |b| routes(b) == ["first"]).await;

        // t=20: tick 3 answers at once while tick 2 is still out.
        tokio::time::sleep(Duration::from_secs(21)).await;
        assert_eq!(routes(&poller.board()), vec!["third"]);

        // t=25: tick 2 answers and is dropped.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(routes(&poller.board()), vec!["third"]);
        assert_eq!(poller.board().phase, PollPhase::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_records() {
        let api = gangnam_board(&["146"]);
        api.script_arrival(Duration::ZERO, Ok(board_json(&["146"])));
        api.script_arrival(
            Duration::ZERO,
            Err(ApiError::Status {
                status: 503,
                body: r#"{"message":"점검 중입니다"}"#.to_string(),
            }),
        );
        let mut poller = PollingController::new(Arc::clone(&api), PERIOD);

        poller.activate(gangnam());
        settle(&poller, |b| b.phase == PollPhase::Ready).await;
        let refreshed_at = poller.board().last_updated;

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        let board = poller.board();
        assert_eq!(board.phase, PollPhase::Failed);
        assert_eq!(routes(&board), vec!["146"]);
        assert!(board.is_stale());
        assert_eq!(board.last_updated, refreshed_at);
        let failure = board.error.unwrap();
        assert_eq!(failure.kind, FailureKind::Transport);
        assert_eq!(failure.message, "점검 중입니다");

        // Next tick recovers.
        tokio::time::sleep(Duration::from_secs(10)).await;
        let board = poller.board();
        assert_eq!(board.phase, PollPhase::Ready);
        assert!(board.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn upstream_header_is_reported_distinctly() {
        let api = Arc::new(MockBusApi::new().with_board(
            ars("22009"),
            json!({"msgHeader": {"headerCd": "4", "headerMsg": "결과가 없습니다."}}),
        ));
        let mut poller = PollingController::new(api, PERIOD);

        poller.activate(gangnam());
        settle(&poller, |b| b.phase == PollPhase::Failed).await;

        let failure = poller.board().error.unwrap();
        assert_eq!(failure.kind, FailureKind::Upstream);
        assert_eq!(failure.message, "결과가 없습니다.");
    }

    #[tokio::test]
    async fn zero_period_falls_back_to_default() {
        let poller = PollingController::new(Arc::new(MockBusApi::new()), Duration::ZERO);
        assert_eq!(poller.period(), DEFAULT_POLL_INTERVAL);
        assert!(!poller.is_active());
        assert_eq!(poller.board().phase, PollPhase::Idle);
    }
}
