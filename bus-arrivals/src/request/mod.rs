//! Request execution: one-shot actions and auto-fetching queries.
//!
//! Both modes share the same fetch contract (`Result<T, ApiError>`) and the
//! same error-reduction policy ([`Failure::from_error`]).

mod executor;
mod query;
mod state;

pub use executor::{ActionStatus, FALLBACK_ERROR, Failure, Outcome, RequestExecutor};
pub use query::{AutoQuery, Resource};
pub use state::RequestState;
