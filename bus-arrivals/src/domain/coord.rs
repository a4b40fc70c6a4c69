//! Geographic coordinates.

/// Error returned for a coordinate that is not a usable position.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidCoordinate {
    #[error("coordinate is not a number: {0:?}")]
    NotANumber(String),

    #[error("latitude {0} out of range [-90, 90]")]
    Latitude(f64),

    #[error("longitude {0} out of range [-180, 180]")]
    Longitude(f64),
}

/// A WGS84 position in decimal degrees.
///
/// Always finite and in range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    /// Create a coordinate from latitude/longitude degrees.
    pub fn new(lat: f64, lng: f64) -> Result<Self, InvalidCoordinate> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidCoordinate::Latitude(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(InvalidCoordinate::Longitude(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Parse raw catalog strings (latitude first).
    pub fn parse(lat: &str, lng: &str) -> Result<Self, InvalidCoordinate> {
        let parse = |s: &str| {
            s.trim()
                .parse::<f64>()
                .map_err(|_| InvalidCoordinate::NotANumber(s.to_string()))
        };
        Self::new(parse(lat)?, parse(lng)?)
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}
