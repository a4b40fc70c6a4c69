//! Station identity and favorite records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid ARS id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid ARS id {value:?}: {reason}")]
pub struct InvalidArsId {
    value: String,
    reason: &'static str,
}

/// A public station board number (ARS id).
///
/// ARS ids are the numbers printed on the physical stop sign. They are
/// distinct from the catalog's internal station id. The catalog uses `"0"`
/// for stops that have no public board, so that value is rejected.
///
/// # Examples
///
/// ```
/// use bus_arrivals::domain::ArsId;
///
/// let id = ArsId::parse("23285").unwrap();
/// assert_eq!(id.as_str(), "23285");
///
/// assert!(ArsId::parse("").is_err());
/// assert!(ArsId::parse("0").is_err());
/// assert!(ArsId::parse("23-285").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArsId(String);

impl ArsId {
    /// Parse an ARS id, trimming surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, InvalidArsId> {
        let trimmed = s.trim();
        let invalid = |reason| InvalidArsId {
            value: s.to_string(),
            reason,
        };

        if trimmed.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("must be ASCII digits"));
        }
        if trimmed.bytes().all(|b| b == b'0') {
            return Err(invalid("placeholder id"));
        }

        Ok(ArsId(trimmed.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ArsId {
    type Error = InvalidArsId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ArsId::parse(&value)
    }
}

impl From<ArsId> for String {
    fn from(id: ArsId) -> Self {
        id.0
    }
}

impl fmt::Debug for ArsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArsId({})", self.0)
    }
}

impl fmt::Display for ArsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A saved favorite station, as returned by the backend store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    /// Backend identifier; absent until the record has been persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub station_id: String,
    pub station_name: String,
    pub ars_id: ArsId,
    /// Travel direction. Empty means unknown.
    #[serde(rename = "adirection", default)]
    pub direction: String,
}

impl Station {
    /// Whether the name or ARS id contains `keyword`.
    pub fn matches(&self, keyword: &str) -> bool {
        self.station_name.contains(keyword) || self.ars_id.as_str().contains(keyword)
    }
}

/// Payload for creating a favorite.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStation {
    pub station_name: String,
    pub station_id: String,
    pub ars_id: ArsId,
    #[serde(rename = "adirection")]
    pub direction: String,
}

impl NewStation {
    /// Build the payload for a search candidate with a (possibly empty) direction.
    pub fn from_candidate(candidate: &SearchResult, direction: impl Into<String>) -> Self {
        Self {
            station_name: candidate.station_name.clone(),
            station_id: candidate.station_id.clone(),
            ars_id: candidate.ars_id.clone(),
            direction: direction.into(),
        }
    }
}

/// A catalog search hit.
///
/// Coordinates are kept as the raw catalog strings; they are only parsed
/// when the result set is ranked.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub station_id: String,
    pub station_name: String,
    pub ars_id: ArsId,
    /// Raw latitude (`tmY`).
    pub lat: String,
    /// Raw longitude (`tmX`).
    pub lng: String,
    /// Distance from the observer, set by ranking.
    pub distance_meters: Option<f64>,
}
