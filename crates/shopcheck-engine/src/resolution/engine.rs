//! Multi-strategy element resolution over a [`Driver`].
//!
//! A target's candidate locators are tried in order. Each strategy is polled
//! (not sampled once) for a visible and enabled match until its share of the
//! caller's budget runs out, then resolution advances to the next strategy:
//!
//! ```text
//! PENDING(0) -> MATCHED
//!            -> PENDING(1) -> ... -> FAILED
//! ```
//!
//! There are no backward transitions.

use super::result::{Handle, Readiness, ResolutionError};
use crate::config::schema::TimeoutsConfig;
use crate::driver::{Driver, DriverError};
use crate::target::{Strategy, Target};
use crate::wait::PollBudget;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Budget used by [`Resolver::find`].
    pub resolve_timeout: Duration,
    pub poll_interval: Duration,
    /// Upper bound on waiting for a resolved element to become actuatable.
    pub actuation_timeout: Duration,
    pub ready_timeout: Duration,
    pub navigation_attempts: u32,
    pub navigation_retry_delay: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from(&TimeoutsConfig::default())
    }
}

impl From<&TimeoutsConfig> for ResolverSettings {
    fn from(config: &TimeoutsConfig) -> Self {
        Self {
            resolve_timeout: Duration::from_millis(config.resolve_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            actuation_timeout: Duration::from_millis(config.actuation_ms),
            ready_timeout: Duration::from_millis(config.ready_ms),
            navigation_attempts: config.navigation_attempts,
            navigation_retry_delay: Duration::from_millis(config.navigation_retry_delay_ms),
        }
    }
}

/// Resolves targets against one session's document and acts on the results.
pub struct Resolver<D: Driver> {
    pub(crate) driver: D,
    pub(crate) settings: ResolverSettings,
    /// Bumped on every navigation; handles from older generations are refused.
    pub(crate) generation: u64,
}

impl<D: Driver> Resolver<D> {
    pub fn new(driver: D) -> Self {
        Self::with_settings(driver, ResolverSettings::default())
    }

    pub fn with_settings(driver: D, settings: ResolverSettings) -> Self {
        Self {
            driver,
            settings,
            generation: 0,
        }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolve `target` to a single interactable element within `timeout`.
    ///
    /// The budget is shared fairly between the strategies still to be tried,
    /// and every strategy is queried at least once.
    pub async fn resolve(
        &mut self,
        target: &Target,
        timeout: Duration,
    ) -> Result<Handle<D::Element>, ResolutionError> {
        let overall = PollBudget::new(timeout, self.settings.poll_interval);
        let candidates = target.candidates();
        let mut attempted = Vec::with_capacity(candidates.len());
        let mut last_error = None;

        for (index, strategy) in candidates.iter().enumerate() {
            attempted.push(strategy.to_string());
            let strategies_left = (candidates.len() - index) as u32;
            let mut window =
                PollBudget::new(overall.remaining() / strategies_left, self.settings.poll_interval);

            loop {
                match self.first_interactable(strategy).await {
                    Ok(Some(element)) => {
                        debug!(
                            "Resolved '{}' via {} (candidate {} of {})",
                            target,
                            strategy,
                            index + 1,
                            candidates.len()
                        );
                        return Ok(Handle {
                            element,
                            target: target.name().to_string(),
                            strategy: strategy.clone(),
                            generation: self.generation,
                        });
                    }
                    Ok(None) => {}
                    Err(e) => last_error = Some(e),
                }
                if !window.wait_next().await {
                    break;
                }
            }
            debug!("No interactable match for '{}' via {}", target, strategy);
        }

        Err(ResolutionError {
            target: target.name().to_string(),
            reason: format!("no candidate matched within {:?}", timeout),
            attempted,
            last_error,
        })
    }

    /// First visible and enabled match of a single strategy, in document order.
    async fn first_interactable(
        &mut self,
        strategy: &Strategy,
    ) -> Result<Option<D::Element>, DriverError> {
        let matches = self.driver.find_all(strategy).await?;
        let mut last_error = None;
        for element in matches {
            match self.driver.element_state(&element).await {
                Ok(state) if state.interactable() => return Ok(Some(element)),
                Ok(_) => {}
                // Detached between query and inspection; try the next match.
                Err(e) => last_error = Some(e),
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    /// Poll `document.readyState` until it reports `complete`.
    ///
    /// Fails open: a timeout is reported as [`Readiness::TimedOut`] and the
    /// caller carries on with its own element-level waits.
    pub async fn wait_until_ready(&mut self, timeout: Duration) -> Readiness {
        let mut budget = PollBudget::new(timeout, self.settings.poll_interval);
        let mut last_seen = String::new();
        loop {
            match self.driver.ready_state().await {
                Ok(state) if state == "complete" => {
                    debug!("Document readyState=complete");
                    return Readiness::Complete;
                }
                Ok(state) => last_seen = state,
                Err(e) => last_seen = e.to_string(),
            }
            if !budget.wait_next().await {
                break;
            }
        }
        warn!(
            "Document not ready after {:?} (last: {}); continuing",
            timeout, last_seen
        );
        Readiness::TimedOut
    }

    /// Resolve with the default per-call budget used by page wrappers.
    pub async fn find(
        &mut self,
        target: &Target,
    ) -> Result<Handle<D::Element>, ResolutionError> {
        let timeout = self.settings.resolve_timeout;
        let result = self.resolve(target, timeout).await;
        if let Err(e) = &result {
            info!("Step result: '{}' not found ({})", target, e);
        }
        result
    }
}
