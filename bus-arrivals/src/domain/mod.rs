//! Domain types for the bus arrival client.
//!
//! Identifiers and coordinates validate at construction time, so code that
//! receives them can trust their validity.

mod arrival;
mod coord;
mod station;

pub use arrival::{ArrivalRecord, Crowding, ExtraInfo, RouteType};
pub use coord::{Coordinate, InvalidCoordinate};
pub use station::{ArsId, InvalidArsId, NewStation, SearchResult, Station};
