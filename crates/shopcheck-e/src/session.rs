//! Browser session bootstrap: connect, size the window, land on the site.

use crate::backend::WebDriverSession;
use crate::webdriver;
use fantoccini::wd::TimeoutConfiguration;
use serde_json::{Map, Value};
use shopcheck_engine::config::SuiteConfig;
use shopcheck_engine::config::schema::{SiteConfig, WindowSize};
use shopcheck_engine::{
    DriverError, Readiness, ResolutionError, Resolver, ResolverSettings, Strategy, Target,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("WebDriver session failed: {0}")]
    Driver(#[from] DriverError),
    #[error("Landing page never showed '{marker}': {source}")]
    Landing {
        marker: String,
        #[source]
        source: ResolutionError,
    },
}

pub struct SessionBuilder {
    site: SiteConfig,
    settings: ResolverSettings,
    page_load_timeout: Duration,
    landing_timeout: Duration,
}

impl SessionBuilder {
    pub fn from_config(config: &SuiteConfig) -> Self {
        Self {
            site: config.site.clone(),
            settings: ResolverSettings::from(&config.timeouts),
            page_load_timeout: Duration::from_millis(config.timeouts.page_load_ms),
            landing_timeout: Duration::from_millis(config.timeouts.landing_ms),
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.site.headless = headless;
        self
    }

    pub fn webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.site.webdriver_url = url.into();
        self
    }

    pub fn capabilities(&self) -> Map<String, Value> {
        webdriver::capabilities(&self.site)
    }

    /// Start the session and open the base URL.
    ///
    /// The returned resolver owns the session. If anything after the connect
    /// fails, the session is closed before the error is returned.
    pub async fn launch(self) -> Result<Resolver<WebDriverSession>, SessionError> {
        info!(
            "Starting {:?} session via {} (headless: {})",
            self.site.browser, self.site.webdriver_url, self.site.headless
        );
        let client = webdriver::connect(&self.site.webdriver_url, self.capabilities()).await?;
        let mut resolver =
            Resolver::with_settings(WebDriverSession::new(client), self.settings.clone());

        match self.bootstrap(&mut resolver).await {
            Ok(()) => {
                info!("Session ready at {}", self.site.base_url);
                Ok(resolver)
            }
            Err(e) => {
                warn!("Session bootstrap failed: {}", e);
                if let Err(close) = resolver.into_driver().close().await {
                    warn!("{}", close);
                }
                Err(e)
            }
        }
    }

    async fn bootstrap(
        &self,
        resolver: &mut Resolver<WebDriverSession>,
    ) -> Result<(), SessionError> {
        let client = resolver.driver().client().clone();
        client
            .update_timeouts(TimeoutConfiguration::new(
                None,
                Some(self.page_load_timeout),
                Some(Duration::ZERO),
            ))
            .await
            .map_err(|e| webdriver::classify(e.to_string()))?;

        match self.site.window {
            Some(WindowSize { width, height }) => client.set_window_size(width, height).await,
            None => client.maximize_window().await,
        }
        .map_err(|e| webdriver::classify(e.to_string()))?;

        if resolver.open(&self.site.base_url).await? == Readiness::TimedOut {
            warn!("{} still loading; waiting for the landing marker", self.site.base_url);
        }

        let landing = Target::new(
            "landing marker",
            Strategy::Attribute(self.site.ready_marker.clone()),
        );
        resolver
            .resolve(&landing, self.landing_timeout)
            .await
            .map_err(|source| SessionError::Landing {
                marker: self.site.ready_marker.clone(),
                source,
            })?;
        Ok(())
    }
}
