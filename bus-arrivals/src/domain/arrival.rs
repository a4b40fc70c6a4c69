//! Live arrival predictions for a station board.

use serde::Serialize;

/// Route category as coded by the arrival provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RouteType {
    /// Code `3`.
    Trunk,
    /// Code `4`.
    Branch,
    /// Code `5`.
    Circular,
    /// Code `6`.
    WideArea,
    /// Anything else.
    General,
}

impl RouteType {
    /// Map a provider route-type code.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "3" => RouteType::Trunk,
            "4" => RouteType::Branch,
            "5" => RouteType::Circular,
            "6" => RouteType::WideArea,
            _ => RouteType::General,
        }
    }

    /// Short display label.
    pub fn label(self) -> &'static str {
        match self {
            RouteType::Trunk => "간선",
            RouteType::Branch => "지선",
            RouteType::Circular => "순환",
            RouteType::WideArea => "광역",
            RouteType::General => "일반",
        }
    }
}

/// On-board crowding level of the first approaching bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Crowding {
    Spacious,
    Normal,
    Crowded,
}

impl Crowding {
    /// Map a provider crowding code. Unknown codes read as spacious.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "5" => Crowding::Crowded,
            "4" => Crowding::Normal,
            _ => Crowding::Spacious,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Crowding::Spacious => "여유",
            Crowding::Normal => "보통",
            Crowding::Crowded => "혼잡",
        }
    }
}

/// One route's prediction at a board.
///
/// Records are replaced wholesale on every poll; there is no identity
/// across ticks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrivalRecord {
    pub route_name: String,
    /// ETA message for the first approaching bus.
    pub first_message: String,
    /// ETA message for the second approaching bus.
    pub second_message: String,
    pub route_type: RouteType,
    pub is_last_bus: bool,
    pub crowding: Crowding,
    pub next_stop: String,
    pub direction: String,
    pub low_floor: bool,
}

/// Side-channel info shown in the board header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtraInfo {
    pub direction: String,
    pub next_stop: String,
}

impl ExtraInfo {
    /// Derive header info from the first record of a board.
    pub fn from_records(records: &[ArrivalRecord]) -> Option<Self> {
        records.first().map(|r| ExtraInfo {
            direction: r.direction.clone(),
            next_stop: r.next_stop.clone(),
        })
    }
}
