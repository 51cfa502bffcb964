use shopcheck_engine::ResolverSettings;
use shopcheck_engine::config::schema::{Browser, SuiteConfig, WindowSize};
use shopcheck_engine::config::{ConfigError, ConfigLoader, candidate_paths};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
site:
  base_url: "https://staging.shop.test"
  browser: firefox
  headless: true
  window:
    width: 1366
    height: 768
timeouts:
  resolve_ms: 4000
  navigation_attempts: 3
data:
  credentials_sheet: "users"
"#
    )
    .unwrap();

    let config = ConfigLoader::load_from(file.path())
        .await
        .expect("Failed to load config from file");

    assert_eq!(config.site.base_url, "https://staging.shop.test");
    assert_eq!(config.site.browser, Browser::Firefox);
    assert!(config.site.headless);
    assert_eq!(
        config.site.window,
        Some(WindowSize {
            width: 1366,
            height: 768
        })
    );
    assert_eq!(config.timeouts.resolve_ms, 4000);
    assert_eq!(config.timeouts.navigation_attempts, 3);
    // Unspecified fields keep their defaults.
    assert_eq!(config.timeouts.poll_interval_ms, 250);
    assert_eq!(config.site.webdriver_url, "http://localhost:4444");
    assert_eq!(config.data.credentials_sheet, "users");
    assert_eq!(config.data.unique_column, "email");
}

#[test]
fn test_default_values() {
    let config = SuiteConfig::default();
    assert_eq!(config.site.browser, Browser::Chrome);
    assert!(config.site.window.is_none());
    assert_eq!(config.timeouts.page_load_ms, 60000);
    assert_eq!(config.data.append_attempts, 5);
    assert_eq!(config.data.append_retry_delay_ms, 500);
    assert_eq!(
        config.reports.screenshot_dir,
        std::path::PathBuf::from("reports/screenshots")
    );
}

#[test]
fn test_settings_from_timeouts() {
    let config = SuiteConfig::default();
    let settings = ResolverSettings::from(&config.timeouts);
    assert_eq!(settings.resolve_timeout, Duration::from_secs(10));
    assert_eq!(settings.poll_interval, Duration::from_millis(250));
    assert_eq!(settings.navigation_attempts, 2);
    assert_eq!(settings.navigation_retry_delay, Duration::from_millis(1500));
}

#[tokio::test]
async fn test_load_from_nonexistent_file() {
    let result =
        ConfigLoader::load_from(std::path::Path::new("/nonexistent/path/config.yaml")).await;
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}

#[tokio::test]
async fn test_load_invalid_yaml() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "site: [not, a, map").unwrap();

    let result = ConfigLoader::load_from(file.path()).await;
    match result {
        Err(ConfigError::Parse { path, .. }) => assert_eq!(path, file.path()),
        other => panic!("expected a parse error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_search_order_without_override() {
    let paths = candidate_paths(None, Some(PathBuf::from("/home/qa")));
    assert_eq!(
        paths,
        vec![
            PathBuf::from("shopcheck.yaml"),
            PathBuf::from("shopcheck.yml"),
            PathBuf::from("/home/qa/.shopcheck/config.yaml"),
        ]
    );
    assert_eq!(candidate_paths(None, None).len(), 2);
}

#[test]
fn test_env_override_replaces_search() {
    let paths = candidate_paths(
        Some(PathBuf::from("/ci/suite.yaml")),
        Some(PathBuf::from("/home/qa")),
    );
    assert_eq!(paths, vec![PathBuf::from("/ci/suite.yaml")]);
}

#[test]
fn test_empty_document_is_defaults() {
    let config = ConfigLoader::parse(Path::new("empty.yaml"), "\n  \n").unwrap();
    assert_eq!(config.timeouts.resolve_ms, SuiteConfig::default().timeouts.resolve_ms);
}

#[test]
fn test_unusable_settings_rejected() {
    for (yaml, field) in [
        ("timeouts:\n  poll_interval_ms: 0\n", "poll_interval_ms"),
        ("timeouts:\n  navigation_attempts: 0\n", "navigation_attempts"),
        ("data:\n  append_attempts: 0\n", "append_attempts"),
        ("site:\n  base_url: \"  \"\n", "base_url"),
    ] {
        match ConfigLoader::parse(Path::new("suite.yaml"), yaml) {
            Err(ConfigError::Invalid { reason, .. }) => {
                assert!(reason.contains(field), "{}: {}", field, reason)
            }
            other => panic!("{} accepted: {:?}", field, other.map(|_| ())),
        }
    }
}
