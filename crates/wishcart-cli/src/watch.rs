//! The `watch` command: one login, one poll loop, at most one purchase.
//!
//! No signal handler is installed. Stopping the process is left to the
//! operator, so a checkout is never abandoned by this code between stages.

use wishcart_browser::{CdpSession, SessionHandle, SessionOptions};
use wishcart_checkout::{CheckoutReport, NotificationBus, Storefront, WatchSettings, Watcher};
use wishcart_core::{AppConfig, AvailabilityEvent};

pub(crate) fn session_options(config: &AppConfig) -> SessionOptions {
    SessionOptions {
        endpoint: config.chrome_endpoint.clone(),
        element_timeout: config.element_timeout(),
        navigation_timeout: config.navigation_timeout(),
        connect_max_retries: config.connect_max_retries,
        connect_backoff_base_ms: config.connect_backoff_base_ms,
    }
}

/// Bus subscriber that makes a detection impossible to miss in the log.
pub(crate) fn alert(event: &AvailabilityEvent) {
    match serde_json::to_string(event) {
        Ok(json) => tracing::info!(
            company = %event.company_name,
            url = %event.url,
            %json,
            "ITEM AVAILABLE"
        ),
        Err(e) => tracing::warn!(error = %e, "failed to serialize availability event"),
    }
}

/// Runs the watcher on `session` to completion and returns its report.
pub(crate) async fn watch_on<S>(
    session: &S,
    config: &AppConfig,
    dry_run: bool,
) -> anyhow::Result<CheckoutReport>
where
    S: SessionHandle + ?Sized,
{
    let storefront = Storefront::media_markt();

    let mut bus = NotificationBus::new();
    bus.subscribe(alert);

    let report = Watcher::new(
        session,
        &storefront,
        &bus,
        WatchSettings::from_config(config, dry_run),
    )
    .run(&config.account, config.payment.clone())
    .await?;
    Ok(report)
}

pub(crate) async fn run_watch(config: &AppConfig, dry_run: bool) -> anyhow::Result<()> {
    tracing::info!(
        env = %config.env,
        endpoint = %config.chrome_endpoint,
        dry_run,
        "starting watch"
    );
    let session = CdpSession::open(&session_options(config)).await?;

    let report = watch_on(&session, config, dry_run).await?;

    let stages: Vec<String> = report.stages.iter().map(ToString::to_string).collect();
    println!("stages:    {}", stages.join(" -> "));
    for path in &report.evidence {
        println!("evidence:  {}", path.display());
    }
    if !report.submitted {
        println!("payment form filled; not submitted (dry run)");
    }
    Ok(())
}
