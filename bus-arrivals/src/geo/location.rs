//! Device location seam.
//!
//! The sensor itself is outside this crate. Hosts implement
//! [`LocationProvider`] over whatever they have, or feed a
//! [`ManualLocation`].

use std::future::Future;

use tokio::sync::watch;

use crate::domain::Coordinate;

/// Why no position is available.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable: {0}")]
    Unavailable(String),

    #[error("no position fix yet")]
    NoFix,
}

/// Latest location reading.
pub type Fix = Result<Coordinate, LocationError>;

/// A source of the caller's position.
pub trait LocationProvider: Send + Sync {
    /// One-shot position query.
    fn current(&self) -> impl Future<Output = Fix> + Send;

    /// Continuous updates; the receiver always holds the latest reading.
    fn subscribe(&self) -> watch::Receiver<Fix>;
}

/// Location fed explicitly by the host.
#[derive(Debug)]
pub struct ManualLocation {
    fix: watch::Sender<Fix>,
}

impl Default for ManualLocation {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualLocation {
    /// A provider with no fix yet.
    pub fn new() -> Self {
        let (fix, _) = watch::channel(Err(LocationError::NoFix));
        Self { fix }
    }

    /// A provider fixed at `position`.
    pub fn at(position: Coordinate) -> Self {
        let (fix, _) = watch::channel(Ok(position));
        Self { fix }
    }

    pub fn update(&self, position: Coordinate) {
        self.fix.send_replace(Ok(position));
    }

    pub fn fail(&self, error: LocationError) {
        self.fix.send_replace(Err(error));
    }
}

impl LocationProvider for ManualLocation {
    async fn current(&self) -> Fix {
        self.fix.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Fix> {
        self.fix.subscribe()
    }
}
