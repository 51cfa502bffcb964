use crate::target::Strategy;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("Timed out: {0}")]
    Timeout(String),
    #[error("No such element: {0}")]
    NoSuchElement(String),
    #[error("Stale element reference: {0}")]
    StaleElement(String),
    #[error("Element not interactable: {0}")]
    NotInteractable(String),
    #[error("Script error: {0}")]
    Script(String),
    #[error("Navigation error: {0}")]
    Navigation(String),
    #[error("Not supported: {0}")]
    NotSupported(String),
    #[error("Driver error: {0}")]
    Other(String),
}

impl DriverError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout(_))
    }
}

/// Visibility and enablement of an element at the moment it was sampled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementState {
    pub displayed: bool,
    pub enabled: bool,
}

impl ElementState {
    pub fn interactable(&self) -> bool {
        self.displayed && self.enabled
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Click,
    /// Clear the field, then type the text.
    TypeText(String),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Click => write!(f, "click"),
            Action::TypeText(text) => write!(f, "type({} chars)", text.chars().count()),
        }
    }
}

/// The document handle a resolver drives.
///
/// One implementation instance belongs to exactly one browser session; element
/// handles it returns are never shared with another session.
#[async_trait]
pub trait Driver: Send {
    /// Opaque reference to a node in the current document.
    type Element: Clone + fmt::Debug + Send + Sync;

    /// Query the document once with the given strategy. Matches come back in
    /// document order; an empty list is not an error.
    async fn find_all(&mut self, strategy: &Strategy) -> Result<Vec<Self::Element>, DriverError>;

    async fn element_state(&mut self, element: &Self::Element)
    -> Result<ElementState, DriverError>;

    /// Scroll the element to the centre of the viewport.
    async fn scroll_into_view(&mut self, element: &Self::Element) -> Result<(), DriverError>;

    /// Validated, user-like actuation.
    async fn perform(&mut self, element: &Self::Element, action: &Action)
    -> Result<(), DriverError>;

    /// Script-level actuation that skips interactability checks.
    async fn perform_unchecked(
        &mut self,
        element: &Self::Element,
        action: &Action,
    ) -> Result<(), DriverError>;

    /// `document.readyState` of the current document.
    async fn ready_state(&mut self) -> Result<String, DriverError>;

    async fn current_url(&mut self) -> Result<String, DriverError>;

    async fn page_source(&mut self) -> Result<String, DriverError>;

    async fn goto(&mut self, url: &str) -> Result<(), DriverError>;

    /// Capture a PNG of the current viewport.
    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        Err(DriverError::NotSupported("screenshot".into()))
    }
}
