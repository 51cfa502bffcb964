use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chrome,
    Firefox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub browser: Browser,
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default)]
    pub headless: bool,
    /// Fixed window size; the window is maximized when absent.
    #[serde(default)]
    pub window: Option<WindowSize>,
    /// Selector of the element that proves the landing page rendered.
    #[serde(default = "default_ready_marker")]
    pub ready_marker: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            browser: Browser::default(),
            webdriver_url: default_webdriver_url(),
            headless: false,
            window: None,
            ready_marker: default_ready_marker(),
        }
    }
}

fn default_base_url() -> String {
    "https://automationexercise.com".to_string()
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_ready_marker() -> String {
    ".logo, .site-logo, .navbar-brand img".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_resolve_ms")]
    pub resolve_ms: u64,
    #[serde(default = "default_page_load_ms")]
    pub page_load_ms: u64,
    #[serde(default = "default_ready_ms")]
    pub ready_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_actuation_ms")]
    pub actuation_ms: u64,
    #[serde(default = "default_navigation_attempts")]
    pub navigation_attempts: u32,
    #[serde(default = "default_navigation_retry_delay_ms")]
    pub navigation_retry_delay_ms: u64,
    #[serde(default = "default_landing_ms")]
    pub landing_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            resolve_ms: default_resolve_ms(),
            page_load_ms: default_page_load_ms(),
            ready_ms: default_ready_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            actuation_ms: default_actuation_ms(),
            navigation_attempts: default_navigation_attempts(),
            navigation_retry_delay_ms: default_navigation_retry_delay_ms(),
            landing_ms: default_landing_ms(),
        }
    }
}

fn default_resolve_ms() -> u64 {
    10000
}

fn default_page_load_ms() -> u64 {
    60000
}

fn default_ready_ms() -> u64 {
    10000
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_actuation_ms() -> u64 {
    3000
}

fn default_navigation_attempts() -> u32 {
    2
}

fn default_navigation_retry_delay_ms() -> u64 {
    1500
}

fn default_landing_ms() -> u64 {
    15000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_signup_workbook")]
    pub signup_workbook: PathBuf,
    #[serde(default = "default_signup_sheet")]
    pub signup_sheet: String,
    #[serde(default = "default_credentials_workbook")]
    pub credentials_workbook: PathBuf,
    #[serde(default = "default_credentials_sheet")]
    pub credentials_sheet: String,
    #[serde(default = "default_unique_column")]
    pub unique_column: String,
    #[serde(default = "default_append_attempts")]
    pub append_attempts: u32,
    #[serde(default = "default_append_retry_delay_ms")]
    pub append_retry_delay_ms: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            signup_workbook: default_signup_workbook(),
            signup_sheet: default_signup_sheet(),
            credentials_workbook: default_credentials_workbook(),
            credentials_sheet: default_credentials_sheet(),
            unique_column: default_unique_column(),
            append_attempts: default_append_attempts(),
            append_retry_delay_ms: default_append_retry_delay_ms(),
        }
    }
}

fn default_signup_workbook() -> PathBuf {
    PathBuf::from("testdata/signup_data.json")
}

fn default_signup_sheet() -> String {
    "Sheet1".to_string()
}

fn default_credentials_workbook() -> PathBuf {
    PathBuf::from("testdata/registered_users.json")
}

fn default_credentials_sheet() -> String {
    "registered".to_string()
}

fn default_unique_column() -> String {
    "email".to_string()
}

fn default_append_attempts() -> u32 {
    5
}

fn default_append_retry_delay_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: PathBuf,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: default_screenshot_dir(),
        }
    }
}

fn default_screenshot_dir() -> PathBuf {
    PathBuf::from("reports/screenshots")
}
