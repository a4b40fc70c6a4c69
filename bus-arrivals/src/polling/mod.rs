//! Interval polling of the arrival board for the station being viewed.

mod board;
mod controller;

pub use board::{BoardState, PollPhase, Subject};
pub use controller::{ArrivalSource, DEFAULT_POLL_INTERVAL, PollingController};
