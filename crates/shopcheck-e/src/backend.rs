use crate::webdriver::classify;
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, Locator};
use serde_json::Value;
use shopcheck_engine::driver::{Action, Driver, DriverError, ElementState};
use shopcheck_engine::target::{Strategy, partial_link_xpath};
use tracing::debug;

const SCROLL_SCRIPT: &str =
    "arguments[0].scrollIntoView({block: 'center', inline: 'center'});";
const CLICK_SCRIPT: &str = "arguments[0].click();";
const SET_VALUE_SCRIPT: &str = r#"
    const el = arguments[0];
    el.value = arguments[1];
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
"#;

/// One remote browser session driven over the WebDriver protocol.
pub struct WebDriverSession {
    client: Client,
}

impl WebDriverSession {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn close(self) -> Result<(), DriverError> {
        self.client
            .close()
            .await
            .map_err(|e| DriverError::Other(format!("Failed to close session: {}", e)))
    }

    async fn run_script(&self, script: &str, args: Vec<Value>) -> Result<Value, DriverError> {
        self.client
            .execute(script, args)
            .await
            .map_err(|e| classify(e.to_string()))
    }
}

fn element_arg(element: &Element) -> Result<Value, DriverError> {
    serde_json::to_value(element)
        .map_err(|e| DriverError::Script(format!("Cannot pass element to script: {}", e)))
}

#[async_trait]
impl Driver for WebDriverSession {
    type Element = Element;

    async fn find_all(&mut self, strategy: &Strategy) -> Result<Vec<Element>, DriverError> {
        let partial;
        let locator = match strategy {
            Strategy::Attribute(css) => Locator::Css(css),
            Strategy::Text(text) => Locator::LinkText(text),
            Strategy::PartialText(fragment) => {
                partial = partial_link_xpath(fragment);
                Locator::XPath(&partial)
            }
            Strategy::StructuralPattern(xpath) => Locator::XPath(xpath),
        };
        debug!("Querying {}", strategy);
        self.client
            .find_all(locator)
            .await
            .map_err(|e| classify(e.to_string()))
    }

    async fn element_state(&mut self, element: &Element) -> Result<ElementState, DriverError> {
        let displayed = element
            .is_displayed()
            .await
            .map_err(|e| classify(e.to_string()))?;
        let enabled = element
            .is_enabled()
            .await
            .map_err(|e| classify(e.to_string()))?;
        Ok(ElementState { displayed, enabled })
    }

    async fn scroll_into_view(&mut self, element: &Element) -> Result<(), DriverError> {
        self.run_script(SCROLL_SCRIPT, vec![element_arg(element)?])
            .await
            .map(|_| ())
    }

    async fn perform(&mut self, element: &Element, action: &Action) -> Result<(), DriverError> {
        match action {
            Action::Click => element.click().await,
            Action::TypeText(text) => match element.clear().await {
                Ok(()) => element.send_keys(text).await,
                Err(e) => Err(e),
            },
        }
        .map_err(|e| classify(e.to_string()))
    }

    async fn perform_unchecked(
        &mut self,
        element: &Element,
        action: &Action,
    ) -> Result<(), DriverError> {
        let el = element_arg(element)?;
        match action {
            Action::Click => self.run_script(CLICK_SCRIPT, vec![el]).await,
            Action::TypeText(text) => {
                self.run_script(SET_VALUE_SCRIPT, vec![el, Value::String(text.clone())])
                    .await
            }
        }
        .map(|_| ())
    }

    async fn ready_state(&mut self) -> Result<String, DriverError> {
        let value = self.run_script("return document.readyState;", vec![]).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        self.client
            .current_url()
            .await
            .map(|u| u.to_string())
            .map_err(|e| classify(e.to_string()))
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        self.client
            .source()
            .await
            .map_err(|e| classify(e.to_string()))
    }

    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.client.goto(url).await.map_err(|e| match classify(e.to_string()) {
            DriverError::Other(message) => DriverError::Navigation(message),
            other => other,
        })
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        self.client
            .screenshot()
            .await
            .map_err(|e| DriverError::Other(format!("Screenshot failed: {}", e)))
    }
}
