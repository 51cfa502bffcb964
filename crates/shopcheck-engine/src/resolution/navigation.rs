use super::engine::Resolver;
use super::result::{Arrival, NavigationError, Readiness};
use crate::driver::{Action, Driver, DriverError};
use crate::target::Target;
use crate::wait::PollBudget;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

impl<D: Driver> Resolver<D> {
    /// Load `url`, retrying only on timeouts up to the configured attempt count.
    pub async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.generation += 1;
        let attempts = self.settings.navigation_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.driver.goto(url).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_timeout() && attempt < attempts => {
                    warn!(
                        "Navigation to {} timed out (attempt {}/{}): {}",
                        url, attempt, attempts, e
                    );
                    sleep(self.settings.navigation_retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Navigate and give the document a chance to finish loading.
    pub async fn open(&mut self, url: &str) -> Result<Readiness, DriverError> {
        info!("Opening {}", url);
        self.goto(url).await?;
        let timeout = self.settings.ready_timeout;
        Ok(self.wait_until_ready(timeout).await)
    }

    /// Follow a navigation target and check where it led, then return to the
    /// starting location whatever the outcome.
    ///
    /// Arrival is proven by the location containing `hint`, or, for client-side
    /// routing that leaves the location behind, by a changed document whose
    /// content contains it. Both comparisons ignore case.
    pub async fn verify_navigation(
        &mut self,
        target: &Target,
        hint: &str,
        timeout: Duration,
    ) -> Result<Arrival, NavigationError> {
        let origin = self
            .driver
            .current_url()
            .await
            .map_err(NavigationError::Origin)?;
        info!("Step: follow '{}' from {} expecting '{}'", target, origin, hint);

        let outcome = self.follow(target, hint, timeout).await;
        let restored = self.open(&origin).await;

        match (outcome, restored) {
            (Ok(arrival), Ok(_)) => Ok(arrival),
            (Ok(_), Err(source)) => Err(NavigationError::RestoreFailed { origin, source }),
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(restore)) => {
                error!("Could not return to {} after failed navigation: {}", origin, restore);
                Err(e)
            }
        }
    }

    /// Boolean form of [`Resolver::verify_navigation`] for page checks.
    pub async fn navigate_and_verify(
        &mut self,
        target: &Target,
        hint: &str,
        timeout: Duration,
    ) -> bool {
        match self.verify_navigation(target, hint, timeout).await {
            Ok(Arrival::Location(url)) => {
                info!("Navigation via '{}' verified at {}", target, url);
                true
            }
            Ok(Arrival::Content(url)) => {
                info!(
                    "Navigation via '{}' verified by content (location {})",
                    target, url
                );
                true
            }
            Err(e) => {
                warn!("Navigation via '{}' failed: {}", target, e);
                false
            }
        }
    }

    async fn follow(
        &mut self,
        target: &Target,
        hint: &str,
        timeout: Duration,
    ) -> Result<Arrival, NavigationError> {
        let needle = hint.trim().to_lowercase();
        if needle.is_empty() {
            return Err(NavigationError::Unverified {
                target: target.name().to_string(),
                hint: hint.to_string(),
                last_url: String::new(),
            });
        }

        let handle = self.resolve(target, timeout).await?;
        let origin_source = self.driver.page_source().await.ok();
        self.safe_actuate(&handle, &Action::Click).await?;
        // Whatever happened, the click was meant to leave this document.
        self.generation += 1;

        let mut budget = PollBudget::new(timeout, self.settings.poll_interval);
        let mut last_url = String::new();
        loop {
            if let Ok(url) = self.driver.current_url().await {
                if url.to_lowercase().contains(&needle) {
                    return Ok(Arrival::Location(url));
                }
                last_url = url;
            }
            if let Ok(source) = self.driver.page_source().await
                && origin_source.as_deref() != Some(source.as_str())
                && source.to_lowercase().contains(&needle)
            {
                return Ok(Arrival::Content(last_url));
            }
            if !budget.wait_next().await {
                break;
            }
        }

        debug!("Hint '{}' never appeared after following '{}'", hint, target);
        Err(NavigationError::Unverified {
            target: target.name().to_string(),
            hint: hint.to_string(),
            last_url,
        })
    }
}
