//! Geospatial helpers: distance, proximity ranking and the location seam.

mod distance;
mod location;
mod rank;

pub use distance::{EARTH_RADIUS_KM, distance_meters};
pub use location::{Fix, LocationError, LocationProvider, ManualLocation};
pub use rank::rank_by_distance;
