//! Observable state of a polled arrival board.

use chrono::{DateTime, Local};

use crate::domain::{ArrivalRecord, ArsId, ExtraInfo, SearchResult, Station};
use crate::request::Failure;

/// The board being polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub ars_id: ArsId,
    pub station_name: String,
}

impl Subject {
    pub fn new(ars_id: ArsId, station_name: impl Into<String>) -> Self {
        Self {
            ars_id,
            station_name: station_name.into(),
        }
    }
}

impl From<&SearchResult> for Subject {
    fn from(result: &SearchResult) -> Self {
        Subject::new(result.ars_id.clone(), result.station_name.clone())
    }
}

impl From<&Station> for Subject {
    fn from(station: &Station) -> Self {
        Subject::new(station.ars_id.clone(), station.station_name.clone())
    }
}

/// Where the poll cycle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// No subject.
    Idle,
    /// Foreground fetch for a freshly activated subject.
    Loading,
    /// Last fetch succeeded.
    Ready,
    /// Last fetch failed; earlier records, if any, are still shown.
    Failed,
    /// Background fetch in flight.
    Refreshing,
}

/// Snapshot published to views on every change.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardState {
    pub subject: Option<Subject>,
    pub phase: PollPhase,
    pub records: Vec<ArrivalRecord>,
    pub extra: Option<ExtraInfo>,
    pub last_updated: Option<DateTime<Local>>,
    pub error: Option<Failure>,
    /// Which activation this state belongs to.
    pub(crate) generation: u64,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::idle(0)
    }
}

impl BoardState {
    pub(crate) fn idle(generation: u64) -> Self {
        Self {
            subject: None,
            phase: PollPhase::Idle,
            records: Vec::new(),
            extra: None,
            last_updated: None,
            error: None,
            generation,
        }
    }

    pub(crate) fn started(subject: Subject, generation: u64) -> Self {
        Self {
            subject: Some(subject),
            phase: PollPhase::Loading,
            ..Self::idle(generation)
        }
    }

    /// Foreground loading indicator. Background refreshes never set it.
    pub fn loading(&self) -> bool {
        self.phase == PollPhase::Loading
    }

    /// Records are on screen but the latest refresh failed.
    pub fn is_stale(&self) -> bool {
        self.error.is_some() && !self.records.is_empty()
    }

    /// Last successful refresh as `H:MM:SS`.
    pub fn last_updated_label(&self) -> Option<String> {
        self.last_updated.map(|t| t.format("%-H:%M:%S").to_string())
    }

    pub(crate) fn apply_success(&mut self, records: Vec<ArrivalRecord>, at: DateTime<Local>) {
        if let Some(extra) = ExtraInfo::from_records(&records) {
            self.extra = Some(extra);
        }
        self.records = records;
        self.last_updated = Some(at);
        self.error = None;
        self.phase = PollPhase::Ready;
    }

    pub(crate) fn apply_failure(&mut self, failure: Failure) {
        self.error = Some(failure);
        self.phase = PollPhase::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FailureKind;
    use crate::domain::{Crowding, RouteType};
    use chrono::TimeZone;

    fn record(route: &str) -> ArrivalRecord {
        ArrivalRecord {
            route_name: route.into(),
            first_message: "곧 도착".into(),
            second_message: String::new(),
            route_type: RouteType::Branch,
            is_last_bus: false,
            crowding: Crowding::Normal,
            next_stop: "역삼역".into(),
            direction: "논현동".into(),
            low_floor: false,
        }
    }

    fn subject() -> Subject {
        Subject::new(ArsId::parse("22009").unwrap(), "강남역")
    }

    #[test]
    fn loading_state_is_clean() {
        let state = BoardState::started(subject(), 3);
        assert!(state.loading());
        assert!(state.records.is_empty());
        assert_eq!(state.generation, 3);
    }

    #[test]
    fn failure_keeps_records() {
        let mut state = BoardState::started(subject(), 1);
        let at = Local.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap();
        state.apply_success(vec![record("3412")], at);
        assert_eq!(state.phase, PollPhase::Ready);
        assert_eq!(state.last_updated_label().as_deref(), Some("9:05:07"));

        state.apply_failure(Failure {
            kind: FailureKind::Transport,
            message: "timeout".into(),
        });
        assert_eq!(state.phase, PollPhase::Failed);
        assert_eq!(state.records.len(), 1);
        assert!(state.is_stale());
        assert_eq!(state.last_updated_label().as_deref(), Some("9:05:07"));
    }

    #[test]
    fn empty_success_keeps_extra_info() {
        let mut state = BoardState::started(subject(), 1);
        let at = Local::now();
        state.apply_success(vec![record("3412")], at);
        state.apply_success(Vec::new(), at);
        assert!(state.records.is_empty());
        assert_eq!(state.extra.as_ref().unwrap().next_stop, "역삼역");
    }
}
