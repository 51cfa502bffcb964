#![allow(dead_code)]

use async_trait::async_trait;
use shopcheck_engine::{Action, Driver, DriverError, ElementState, ResolverSettings, Strategy};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickEffect {
    /// Full navigation to a new location.
    Navigate(String),
    /// Client-side route: content changes, location does not.
    Route(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeElement {
    pub id: String,
    pub state: ElementState,
    pub on_click: Option<ClickEffect>,
}

impl FakeElement {
    pub fn visible(id: &str) -> Self {
        Self {
            id: id.to_string(),
            state: ElementState {
                displayed: true,
                enabled: true,
            },
            on_click: None,
        }
    }

    pub fn hidden(id: &str) -> Self {
        Self {
            state: ElementState {
                displayed: false,
                enabled: true,
            },
            ..Self::visible(id)
        }
    }

    pub fn disabled(id: &str) -> Self {
        Self {
            state: ElementState {
                displayed: true,
                enabled: false,
            },
            ..Self::visible(id)
        }
    }

    pub fn link(id: &str, effect: ClickEffect) -> Self {
        Self {
            on_click: Some(effect),
            ..Self::visible(id)
        }
    }
}

#[derive(Debug, Default)]
pub struct MockDriver {
    pub dom: HashMap<Strategy, Vec<FakeElement>>,
    /// Queries a strategy answers with nothing before its elements render.
    pub render_after: HashMap<Strategy, usize>,
    pub find_error: Option<DriverError>,
    pub queries: Vec<Strategy>,
    pub url: String,
    pub sources: HashMap<String, String>,
    pub routed_source: Option<String>,
    pub reject_perform: bool,
    pub reject_unchecked: bool,
    pub perform_calls: Vec<String>,
    pub unchecked_calls: Vec<String>,
    pub typed: HashMap<String, String>,
    pub scrolls: usize,
    pub goto_calls: Vec<String>,
    pub goto_failures: VecDeque<DriverError>,
    /// States reported before `complete`.
    pub loading_states: VecDeque<String>,
    pub never_ready: bool,
}

impl MockDriver {
    pub fn at(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn with(mut self, strategy: Strategy, elements: Vec<FakeElement>) -> Self {
        self.dom.insert(strategy, elements);
        self
    }

    pub fn set_state(&mut self, id: &str, state: ElementState) {
        for element in self.dom.values_mut().flatten() {
            if element.id == id {
                element.state = state;
            }
        }
    }

    pub fn query_count(&self, strategy: &Strategy) -> usize {
        self.queries.iter().filter(|q| *q == strategy).count()
    }

    pub fn actuation_calls(&self) -> usize {
        self.perform_calls.len() + self.unchecked_calls.len()
    }

    fn live(&self, id: &str) -> Option<&FakeElement> {
        self.dom.values().flatten().find(|e| e.id == id)
    }

    fn apply(&mut self, element: &FakeElement, action: &Action) {
        match action {
            Action::Click => match element.on_click.clone() {
                Some(ClickEffect::Navigate(url)) => {
                    self.url = url;
                    self.routed_source = None;
                }
                Some(ClickEffect::Route(source)) => self.routed_source = Some(source),
                None => {}
            },
            Action::TypeText(text) => {
                self.typed.insert(element.id.clone(), text.clone());
            }
        }
    }
}

#[async_trait]
impl Driver for MockDriver {
    type Element = FakeElement;

    async fn find_all(&mut self, strategy: &Strategy) -> Result<Vec<FakeElement>, DriverError> {
        self.queries.push(strategy.clone());
        if let Some(e) = &self.find_error {
            return Err(e.clone());
        }
        let seen = self.query_count(strategy);
        if seen <= self.render_after.get(strategy).copied().unwrap_or(0) {
            return Ok(vec![]);
        }
        Ok(self.dom.get(strategy).cloned().unwrap_or_default())
    }

    async fn element_state(&mut self, element: &FakeElement) -> Result<ElementState, DriverError> {
        self.live(&element.id)
            .map(|e| e.state)
            .ok_or_else(|| DriverError::StaleElement(element.id.clone()))
    }

    async fn scroll_into_view(&mut self, _element: &FakeElement) -> Result<(), DriverError> {
        self.scrolls += 1;
        Ok(())
    }

    async fn perform(&mut self, element: &FakeElement, action: &Action) -> Result<(), DriverError> {
        self.perform_calls.push(element.id.clone());
        if self.reject_perform {
            return Err(DriverError::NotInteractable("click intercepted".into()));
        }
        self.apply(element, action);
        Ok(())
    }

    async fn perform_unchecked(
        &mut self,
        element: &FakeElement,
        action: &Action,
    ) -> Result<(), DriverError> {
        self.unchecked_calls.push(element.id.clone());
        if self.reject_unchecked {
            return Err(DriverError::Script("arguments[0] is null".into()));
        }
        self.apply(element, action);
        Ok(())
    }

    async fn ready_state(&mut self) -> Result<String, DriverError> {
        if self.never_ready {
            return Ok("interactive".to_string());
        }
        Ok(self
            .loading_states
            .pop_front()
            .unwrap_or_else(|| "complete".to_string()))
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.url.clone())
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        if let Some(source) = &self.routed_source {
            return Ok(source.clone());
        }
        Ok(self
            .sources
            .get(&self.url)
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.goto_calls.push(url.to_string());
        if let Some(e) = self.goto_failures.pop_front() {
            return Err(e);
        }
        self.url = url.to_string();
        self.routed_source = None;
        Ok(())
    }
}

pub fn test_settings() -> ResolverSettings {
    ResolverSettings {
        resolve_timeout: Duration::from_millis(2000),
        poll_interval: Duration::from_millis(250),
        actuation_timeout: Duration::from_millis(1000),
        ready_timeout: Duration::from_millis(2000),
        navigation_attempts: 2,
        navigation_retry_delay: Duration::from_millis(1500),
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
