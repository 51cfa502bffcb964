use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, Value, json};
use shopcheck_engine::config::schema::{Browser, SiteConfig};
use shopcheck_engine::driver::DriverError;
use tracing::debug;

const CHROME_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-gpu",
    "--remote-allow-origins=*",
];

/// W3C capabilities for the configured browser.
pub fn capabilities(site: &SiteConfig) -> Map<String, Value> {
    let mut caps = Map::new();
    caps.insert("pageLoadStrategy".into(), json!("normal"));
    match site.browser {
        Browser::Chrome => {
            let mut args: Vec<&str> = CHROME_ARGS.to_vec();
            if site.headless {
                args.push("--headless=new");
            }
            caps.insert("browserName".into(), json!("chrome"));
            caps.insert("goog:chromeOptions".into(), json!({ "args": args }));
        }
        Browser::Firefox => {
            let args: Vec<&str> = if site.headless { vec!["-headless"] } else { vec![] };
            caps.insert("browserName".into(), json!("firefox"));
            caps.insert("moz:firefoxOptions".into(), json!({ "args": args }));
        }
    }
    caps
}

pub async fn connect(url: &str, capabilities: Map<String, Value>) -> Result<Client, DriverError> {
    debug!("Connecting to WebDriver at {} with {:?}", url, capabilities);
    ClientBuilder::native()
        .capabilities(capabilities)
        .connect(url)
        .await
        .map_err(|e| {
            DriverError::Other(format!("Failed to connect to WebDriver at {}: {}", url, e))
        })
}

/// Map a WebDriver command failure onto the driver error taxonomy.
///
/// Classification goes by the W3C error text the remote end reports.
pub fn classify(message: String) -> DriverError {
    let lower = message.to_lowercase();
    if lower.contains("stale element") {
        DriverError::StaleElement(message)
    } else if lower.contains("no such element") {
        DriverError::NoSuchElement(message)
    } else if lower.contains("not interactable")
        || lower.contains("click intercepted")
        || lower.contains("invalid element state")
    {
        DriverError::NotInteractable(message)
    } else if lower.contains("timeout") || lower.contains("timed out") {
        DriverError::Timeout(message)
    } else if lower.contains("javascript error") {
        DriverError::Script(message)
    } else {
        DriverError::Other(message)
    }
}
