use std::path::PathBuf;
use std::time::Duration;

use wishcart_core::{
    AccountCredentials, AppConfig, AvailabilityEvent, Environment, PaymentCredentials,
};

use super::*;

#[test]
fn parses_watch_command() {
    let cli = Cli::try_parse_from(["wishcart", "watch"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Watch { dry_run: false })));
}

#[test]
fn parses_watch_dry_run() {
    let cli = Cli::try_parse_from(["wishcart", "watch", "--dry-run"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Watch { dry_run: true })));
}

#[test]
fn parses_config_command() {
    let cli = Cli::try_parse_from(["wishcart", "config"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Config)));
}

#[test]
fn parses_probe_with_endpoint() {
    let cli =
        Cli::try_parse_from(["wishcart", "probe", "--endpoint", "http://10.0.0.5:9222"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Probe { ref endpoint }) if endpoint == "http://10.0.0.5:9222"
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["wishcart"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn unknown_flag_is_rejected() {
    assert!(Cli::try_parse_from(["wishcart", "watch", "--buy-twice"]).is_err());
}

fn config() -> AppConfig {
    AppConfig {
        env: Environment::Test,
        log_level: "info".to_owned(),
        chrome_endpoint: "http://127.0.0.1:9333".to_owned(),
        poll_interval_secs: 30,
        settle_ms: 300,
        element_timeout_secs: 12,
        navigation_timeout_secs: 45,
        evidence_dir: PathBuf::from("."),
        connect_max_retries: 5,
        connect_backoff_base_ms: 250,
        account: AccountCredentials {
            username: "buyer@example.com".to_owned(),
            password: "hunter2".to_owned(),
        },
        payment: PaymentCredentials {
            card_number: "4111111111111111".to_owned(),
            expiry: "12/30".to_owned(),
            cvc: "123".to_owned(),
            holder_name: "Erika Mustermann".to_owned(),
        },
    }
}

#[test]
fn session_options_come_from_config() {
    let options = watch::session_options(&config());

    assert_eq!(options.endpoint, "http://127.0.0.1:9333");
    assert_eq!(options.element_timeout, Duration::from_secs(12));
    assert_eq!(options.navigation_timeout, Duration::from_secs(45));
    assert_eq!(options.connect_max_retries, 5);
    assert_eq!(options.connect_backoff_base_ms, 250);
}

#[test]
fn alert_subscriber_accepts_events() {
    let mut bus = wishcart_checkout::NotificationBus::new();
    bus.subscribe(watch::alert);

    let notified = bus.publish(&AvailabilityEvent::new(
        "Media Markt",
        "https://www.mediamarkt.de/checkout/summary",
    ));

    assert_eq!(notified, 1);
}

/// A browser that went away before the first page load.
struct ClosedSession;

#[async_trait::async_trait]
impl wishcart_browser::SessionHandle for ClosedSession {
    async fn navigate(
        &self,
        _url: &str,
        _wait: wishcart_browser::WaitPolicy,
    ) -> Result<(), wishcart_browser::BrowserError> {
        Err(wishcart_browser::BrowserError::SessionClosed)
    }

    async fn wait_for_element(
        &self,
        _selector: &wishcart_browser::Selector,
        _visibility: wishcart_browser::Visibility,
    ) -> Result<(), wishcart_browser::BrowserError> {
        Err(wishcart_browser::BrowserError::SessionClosed)
    }

    async fn query_all(
        &self,
        _selector: &wishcart_browser::Selector,
    ) -> Result<Vec<wishcart_browser::ElementHandle>, wishcart_browser::BrowserError> {
        Err(wishcart_browser::BrowserError::SessionClosed)
    }

    async fn click(
        &self,
        _target: wishcart_browser::ClickTarget<'_>,
    ) -> Result<(), wishcart_browser::BrowserError> {
        Err(wishcart_browser::BrowserError::SessionClosed)
    }

    async fn focus_and_type(
        &self,
        _selector: &wishcart_browser::Selector,
        _text: &str,
    ) -> Result<(), wishcart_browser::BrowserError> {
        Err(wishcart_browser::BrowserError::SessionClosed)
    }

    async fn screenshot(
        &self,
        _path: &std::path::Path,
        _full_page: bool,
    ) -> Result<(), wishcart_browser::BrowserError> {
        Err(wishcart_browser::BrowserError::SessionClosed)
    }

    async fn reload(
        &self,
        _wait: wishcart_browser::WaitPolicy,
    ) -> Result<(), wishcart_browser::BrowserError> {
        Err(wishcart_browser::BrowserError::SessionClosed)
    }

    async fn sleep(&self, _duration: Duration) {}
}

#[tokio::test]
async fn failed_watch_is_an_error_not_a_clean_exit() {
    let err = watch::watch_on(&ClosedSession, &config(), false)
        .await
        .unwrap_err();

    let chain = format!("{err:#}");
    assert_eq!(chain, "login failed: browser session closed");
}
