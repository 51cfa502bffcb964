//! WebDriver session integration tests
//!
//! These tests drive a real browser through a WebDriver server listening on
//! `SHOPCHECK_WEBDRIVER_URL` (default `http://localhost:4444`).
//! Tests run sequentially via `#[serial]` to share the one server.

use serial_test::serial;
use shopcheck_e::{SessionBuilder, capture_screenshot};
use shopcheck_engine::config::SuiteConfig;
use shopcheck_engine::{Action, Strategy, Target};
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn builder() -> SessionBuilder {
    let mut config = SuiteConfig::default();
    if let Ok(url) = std::env::var("SHOPCHECK_WEBDRIVER_URL") {
        config.site.webdriver_url = url;
    }
    SessionBuilder::from_config(&config).headless(true)
}

#[tokio::test]
#[serial]
#[ignore] // Requires a WebDriver server and network access
async fn test_session_lands_on_base_url() {
    init_tracing();
    let mut resolver = builder().launch().await.expect("Failed to launch session");

    let home = Target::new("home link", Strategy::Attribute("a[href='/']".into()))
        .or(Strategy::Text("Home".into()));
    let handle = resolver
        .resolve(&home, Duration::from_secs(5))
        .await
        .expect("home link should resolve");
    println!("Resolved via {}", handle.strategy());

    resolver.into_driver().close().await.expect("Close failed");
}

#[tokio::test]
#[serial]
#[ignore] // Requires a WebDriver server and network access
async fn test_nav_link_round_trip() {
    init_tracing();
    let mut resolver = builder().launch().await.expect("Failed to launch session");
    let start = resolver.driver_mut().client().current_url().await.unwrap();

    let verified = resolver
        .navigate_and_verify(&Target::nav_link("Products"), "products", Duration::from_secs(10))
        .await;
    assert!(verified, "Products link should lead to /products");

    let end = resolver.driver_mut().client().current_url().await.unwrap();
    assert_eq!(start, end);

    resolver.into_driver().close().await.expect("Close failed");
}

#[tokio::test]
#[serial]
#[ignore] // Requires a WebDriver server and network access
async fn test_typing_and_screenshot() {
    init_tracing();
    let dir = tempfile::TempDir::new().unwrap();
    let mut resolver = builder().launch().await.expect("Failed to launch session");

    let opened = resolver
        .navigate_and_verify(&Target::nav_link("Signup / Login"), "login", Duration::from_secs(10))
        .await;
    assert!(opened);
    resolver.open("https://automationexercise.com/login").await.unwrap();

    let name = Target::new(
        "signup name",
        Strategy::Attribute("input[data-qa='signup-name']".into()),
    )
    .or(Strategy::StructuralPattern("//input[@name='name']".into()));
    let handle = resolver.find(&name).await.expect("signup name field");
    resolver
        .safe_actuate(&handle, &Action::TypeText("Jane".into()))
        .await
        .expect("typing should succeed");

    let shot = capture_screenshot(&mut resolver, dir.path(), "signup").await;
    let shot = shot.expect("screenshot should be written");
    assert!(std::fs::metadata(&shot).unwrap().len() > 0);

    resolver.into_driver().close().await.expect("Close failed");
}
