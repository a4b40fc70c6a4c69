//! Great-circle distance.

use crate::domain::Coordinate;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two positions, in meters.
///
/// # Example
///
/// ```
/// use bus_arrivals::domain::Coordinate;
/// use bus_arrivals::geo::distance_meters;
///
/// let a = Coordinate::new(37.5, 127.0).unwrap();
/// let b = Coordinate::new(37.6, 127.0).unwrap();
/// let d = distance_meters(a, b);
/// assert!((d - 11_119.5).abs() < 1.0); // 0.1 degree of latitude
/// ```
pub fn distance_meters(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.lat().to_radians();
    let lat2 = to.lat().to_radians();
    let delta_lat = (to.lat() - from.lat()).to_radians();
    let delta_lng = (to.lng() - from.lng()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points.
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());

    EARTH_RADIUS_KM * c * 1000.0
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn coordinate() -> impl Strategy<Value = Coordinate> {
        (-89.0f64..89.0, -179.0f64..179.0).prop_map(|(lat, lng)| Coordinate::new(lat, lng).unwrap())
    }

    proptest! {
        /// Distance does not depend on direction.
        #[test]
        fn symmetric(a in coordinate(), b in coordinate()) {
            let ab = distance_meters(a, b);
            let ba = distance_meters(b, a);
            prop_assert!((ab - ba).abs() <= 1e-6 * ab.max(1.0));
        }

        /// A point is at distance zero from itself.
        #[test]
        fn identity(a in coordinate()) {
            prop_assert_eq!(distance_meters(a, a), 0.0);
        }

        /// Shrinking the offset shrinks the distance towards zero.
        #[test]
        fn tends_to_zero(a in coordinate()) {
            let near = |eps: f64| Coordinate::new(a.lat() + eps, a.lng()).unwrap();
            let d1 = distance_meters(a, near(1e-3));
            let d2 = distance_meters(a, near(1e-5));
            let d3 = distance_meters(a, near(1e-7));
            prop_assert!(d1 > d2 && d2 > d3);
            prop_assert!(d3 < 0.1);
        }

        /// Always finite and non-negative.
        #[test]
        fn finite_non_negative(a in coordinate(), b in coordinate()) {
            let d = distance_meters(a, b);
            prop_assert!(d.is_finite());
            prop_assert!(d >= 0.0);
        }
    }
}
