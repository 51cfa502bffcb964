use crate::driver::DriverError;
use crate::target::Strategy;
use thiserror::Error;

/// A resolved element, valid only for the document generation it was found in.
#[derive(Debug, Clone)]
pub struct Handle<E> {
    pub(crate) element: E,
    pub(crate) target: String,
    pub(crate) strategy: Strategy,
    pub(crate) generation: u64,
}

impl<E> Handle<E> {
    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// The candidate locator that produced the match.
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Error)]
#[error("Resolution failed for target '{target}': {reason} (tried: {})", .attempted.join(", "))]
pub struct ResolutionError {
    pub target: String,
    pub reason: String,
    pub attempted: Vec<String>, // Strategies tried
    pub last_error: Option<DriverError>,
}

/// How an actuation finally went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuation {
    Direct,
    Fallback,
}

#[derive(Debug, Clone, Error)]
pub enum ActuationError {
    #[error("Handle for '{target}' is stale (generation {handle}, document at {current})")]
    StaleHandle {
        target: String,
        handle: u64,
        current: u64,
    },
    #[error("{action} on '{target}' failed: direct path: {direct}; fallback: {fallback}")]
    Failed {
        target: String,
        action: String,
        direct: DriverError,
        fallback: DriverError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arrival {
    /// The location contained the hint.
    Location(String),
    /// Only the document content contained the hint.
    Content(String),
}

#[derive(Debug, Clone, Error)]
pub enum NavigationError {
    #[error("Could not read starting location: {0}")]
    Origin(DriverError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Actuation(#[from] ActuationError),
    #[error("Navigation via '{target}' not verified: '{hint}' absent from location '{last_url}' and content")]
    Unverified {
        target: String,
        hint: String,
        last_url: String,
    },
    #[error("Could not return to '{origin}': {source}")]
    RestoreFailed { origin: String, source: DriverError },
}

/// Outcome of a document-ready wait. Timing out is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Complete,
    TimedOut,
}
