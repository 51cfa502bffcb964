use super::engine::Resolver;
use super::result::{Actuation, ActuationError, Handle};
use crate::driver::{Action, Driver, DriverError};
use crate::wait::PollBudget;
use tracing::{debug, info, warn};

impl<D: Driver> Resolver<D> {
    /// Scroll, wait for actuatability, and act on a resolved handle.
    ///
    /// If the direct path fails, exactly one script-level fallback is made
    /// against the same handle. A second failure is returned, never hidden.
    pub async fn safe_actuate(
        &mut self,
        handle: &Handle<D::Element>,
        action: &Action,
    ) -> Result<Actuation, ActuationError> {
        if handle.generation != self.generation {
            return Err(ActuationError::StaleHandle {
                target: handle.target.clone(),
                handle: handle.generation,
                current: self.generation,
            });
        }

        let before = self.driver.current_url().await.ok();

        let outcome = match self.actuate_direct(handle, action).await {
            Ok(()) => {
                info!("Performed {} on '{}'", action, handle.target);
                Actuation::Direct
            }
            Err(direct) => {
                warn!(
                    "Direct {} on '{}' failed, attempting script fallback: {}",
                    action, handle.target, direct
                );
                match self.driver.perform_unchecked(&handle.element, action).await {
                    Ok(()) => {
                        info!("Performed script {} on '{}'", action, handle.target);
                        Actuation::Fallback
                    }
                    Err(fallback) => {
                        warn!("Script {} on '{}' also failed: {}", action, handle.target, fallback);
                        return Err(ActuationError::Failed {
                            target: handle.target.clone(),
                            action: action.to_string(),
                            direct,
                            fallback,
                        });
                    }
                }
            }
        };

        let after = self.driver.current_url().await.ok();
        if before.is_none() || before != after {
            debug!("Location changed after {} on '{}'", action, handle.target);
            self.generation += 1;
        }
        Ok(outcome)
    }

    async fn actuate_direct(
        &mut self,
        handle: &Handle<D::Element>,
        action: &Action,
    ) -> Result<(), DriverError> {
        self.driver.scroll_into_view(&handle.element).await?;

        let mut budget =
            PollBudget::new(self.settings.actuation_timeout, self.settings.poll_interval);
        loop {
            if self.driver.element_state(&handle.element).await?.interactable() {
                break;
            }
            if !budget.wait_next().await {
                return Err(DriverError::NotInteractable(format!(
                    "'{}' not actuatable within {:?}",
                    handle.target, self.settings.actuation_timeout
                )));
            }
        }

        self.driver.perform(&handle.element, action).await
    }
}
