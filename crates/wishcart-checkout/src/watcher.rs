//! Composition of one run: log in, poll, publish, check out.

use std::path::PathBuf;
use std::time::Duration;

use wishcart_browser::SessionHandle;
use wishcart_core::{AccountCredentials, AppConfig, AvailabilityEvent, PaymentCredentials};

use crate::bus::NotificationBus;
use crate::checkout::{CheckoutMachine, CheckoutOptions, CheckoutReport};
use crate::error::WatchError;
use crate::evidence::EvidenceRecorder;
use crate::login::{log_in, open_wish_list};
use crate::poller::AvailabilityPoller;
use crate::storefront::{Storefront, StorefrontPage};

#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub poll_interval: Duration,
    pub settle: Duration,
    pub evidence_dir: PathBuf,
    pub dry_run: bool,
}

impl WatchSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig, dry_run: bool) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            settle: config.settle_interval(),
            evidence_dir: config.evidence_dir.clone(),
            dry_run,
        }
    }
}

pub struct Watcher<'a, S: SessionHandle + ?Sized> {
    session: &'a S,
    storefront: &'a Storefront,
    bus: &'a NotificationBus,
    settings: WatchSettings,
}

impl<'a, S: SessionHandle + ?Sized> Watcher<'a, S> {
    pub fn new(
        session: &'a S,
        storefront: &'a Storefront,
        bus: &'a NotificationBus,
        settings: WatchSettings,
    ) -> Self {
        Self {
            session,
            storefront,
            bus,
            settings,
        }
    }

    /// Runs the whole flow once and returns what the checkout reached.
    ///
    /// The availability event is published before the first checkout click.
    ///
    /// # Errors
    ///
    /// - [`WatchError::Login`] if login or opening the wish list fails
    /// - [`WatchError::Poll`] on a non-transient session failure while polling
    /// - [`WatchError::Checkout`] if a checkout stage fails
    pub async fn run(
        self,
        account: &AccountCredentials,
        payment: PaymentCredentials,
    ) -> Result<CheckoutReport, WatchError> {
        let page = StorefrontPage::new(self.session, self.storefront);
        let mut evidence =
            EvidenceRecorder::new(&self.settings.evidence_dir, &self.storefront.evidence_prefix);
        if let Err(e) = evidence.prepare().await {
            tracing::warn!(
                dir = %self.settings.evidence_dir.display(),
                error = %e,
                "evidence directory unavailable; screenshots will fail"
            );
        }

        log_in(page, account).await.map_err(WatchError::Login)?;
        open_wish_list(page).await.map_err(WatchError::Login)?;

        let candidate = AvailabilityPoller::new(page, self.settings.poll_interval)
            .poll_until_available(&mut evidence)
            .await
            .map_err(WatchError::Poll)?;

        let event = AvailabilityEvent::new(
            self.storefront.company_name.clone(),
            self.storefront.checkout_url.clone(),
        );
        let notified = self.bus.publish(&event);
        tracing::info!(notified, url = %event.url, "availability published");

        let options = CheckoutOptions {
            settle: self.settings.settle,
            dry_run: self.settings.dry_run,
        };
        let report = CheckoutMachine::new(page, payment, options)
            .run(&candidate, &event, &mut evidence)
            .await?;

        tracing::info!(
            stages = report.stages.len(),
            submitted = report.submitted,
            "checkout finished"
        );
        Ok(report)
    }
}
