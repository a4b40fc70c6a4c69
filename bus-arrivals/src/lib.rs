//! Bus arrival client core.
//!
//! Searches the stop catalog, ranks hits by distance from the user, polls
//! live arrival boards, and keeps a list of favorite stops in sync with the
//! backend.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod geo;
pub mod polling;
pub mod request;
