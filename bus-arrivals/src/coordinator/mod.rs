//! Search, select, save and delete, composed over the request, polling
//! and ranking layers.

mod backend;
mod results;

pub use backend::{FAVORITES_PATH, StationBackend};
pub use results::{CoordinatorError, ResultCoordinator, SearchOutcome};
