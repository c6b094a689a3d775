//! The checkout state machine.
//!
//! Stages run strictly in order and each at most once. A required control
//! that never shows up ends the run with [`CheckoutError::Stage`]; nothing
//! is retried and nothing already done is undone.

use std::path::PathBuf;
use std::time::Duration;

use wishcart_browser::{BrowserError, ClickTarget, SessionHandle, WaitPolicy};
use wishcart_core::{AvailabilityEvent, PaymentCredentials};

use crate::error::CheckoutError;
use crate::evidence::{Checkpoint, EvidenceRecorder};
use crate::poller::CandidateAction;
use crate::storefront::{PaymentField, StorefrontPage};

/// Position of the checkout cursor. Ordering follows the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckoutStage {
    ItemAdded,
    Navigated,
    /// Skipped when the checkout offers no credit-card option.
    PaymentMethodSelected,
    ContinuedToPayment,
    PaymentFormFilled,
    Submitted,
}

impl std::fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CheckoutStage::ItemAdded => "ItemAdded",
            CheckoutStage::Navigated => "Navigated",
            CheckoutStage::PaymentMethodSelected => "PaymentMethodSelected",
            CheckoutStage::ContinuedToPayment => "ContinuedToPayment",
            CheckoutStage::PaymentFormFilled => "PaymentFormFilled",
            CheckoutStage::Submitted => "Submitted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CheckoutOptions {
    /// Pause after actions whose effect the page does not signal.
    pub settle: Duration,
    /// Stop with the card form filled instead of submitting it.
    pub dry_run: bool,
}

impl Default for CheckoutOptions {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(300),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReport {
    pub stages: Vec<CheckoutStage>,
    pub evidence: Vec<PathBuf>,
    pub submitted: bool,
}

/// Forward-only record of the stages reached.
#[derive(Debug, Default)]
struct StageCursor {
    reached: Vec<CheckoutStage>,
}

impl StageCursor {
    fn current(&self) -> Option<CheckoutStage> {
        self.reached.last().copied()
    }

    fn advance(&mut self, to: CheckoutStage) -> Result<(), CheckoutError> {
        let from = self.current();
        if from.is_some_and(|from| to <= from) {
            return Err(CheckoutError::InvalidTransition { from, to });
        }
        tracing::info!(stage = %to, "checkout stage reached");
        self.reached.push(to);
        Ok(())
    }

    fn failed(&self, stage: CheckoutStage, source: BrowserError) -> CheckoutError {
        CheckoutError::Stage {
            stage,
            reached: self.reached.clone(),
            source,
        }
    }
}

pub struct CheckoutMachine<'a, S: SessionHandle + ?Sized> {
    page: StorefrontPage<'a, S>,
    payment: PaymentCredentials,
    options: CheckoutOptions,
}

impl<'a, S: SessionHandle + ?Sized> CheckoutMachine<'a, S> {
    pub fn new(
        page: StorefrontPage<'a, S>,
        payment: PaymentCredentials,
        options: CheckoutOptions,
    ) -> Self {
        Self {
            page,
            payment,
            options,
        }
    }

    /// Drives the checkout for `candidate`, continuing on `event.url`.
    ///
    /// Consumes the machine: one purchase attempt per instance.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Stage`] naming the stage that failed and the
    /// stages completed before it.
    pub async fn run(
        self,
        candidate: &CandidateAction,
        event: &AvailabilityEvent,
        evidence: &mut EvidenceRecorder,
    ) -> Result<CheckoutReport, CheckoutError> {
        use CheckoutStage::{
            ContinuedToPayment, ItemAdded, Navigated, PaymentFormFilled, PaymentMethodSelected,
            Submitted,
        };

        let page = self.page;
        let session = page.session();
        let settle = self.options.settle;
        let mut cursor = StageCursor::default();

        let item = candidate.first();
        tracing::info!(item = %item.selector, node = item.id, "adding item to cart");
        session
            .click(ClickTarget::from(item))
            .await
            .map_err(|e| cursor.failed(ItemAdded, e))?;
        session.sleep(settle).await;
        cursor.advance(ItemAdded)?;

        session
            .navigate(&event.url, WaitPolicy::NetworkIdle)
            .await
            .map_err(|e| cursor.failed(Navigated, e))?;
        session.sleep(settle).await;
        cursor.advance(Navigated)?;

        let option = page
            .credit_card_option()
            .await
            .map_err(|e| cursor.failed(PaymentMethodSelected, e))?;
        if let Some(option) = option {
            session
                .click(ClickTarget::from(&option))
                .await
                .map_err(|e| cursor.failed(PaymentMethodSelected, e))?;
            evidence.capture(session, Checkpoint::PaymentMethod).await;
            let next = page
                .overview_continue_control()
                .await
                .map_err(|e| cursor.failed(PaymentMethodSelected, e))?;
            session
                .click(ClickTarget::from(&next))
                .await
                .map_err(|e| cursor.failed(PaymentMethodSelected, e))?;
            cursor.advance(PaymentMethodSelected)?;
        } else {
            tracing::info!("no credit card option offered; skipping payment method selection");
        }

        let control = page
            .continue_to_payment_control()
            .await
            .map_err(|e| cursor.failed(ContinuedToPayment, e))?;
        session
            .click(ClickTarget::from(&control))
            .await
            .map_err(|e| cursor.failed(ContinuedToPayment, e))?;
        cursor.advance(ContinuedToPayment)?;

        evidence.capture(session, Checkpoint::PaymentForm).await;
        page.wait_for_payment_form()
            .await
            .map_err(|e| cursor.failed(PaymentFormFilled, e))?;
        for field in PaymentField::FILL_ORDER {
            tracing::debug!(%field, "filling payment field");
            session
                .focus_and_type(page.payment_field(field), field.value(&self.payment))
                .await
                .map_err(|e| cursor.failed(PaymentFormFilled, e))?;
        }
        cursor.advance(PaymentFormFilled)?;

        if self.options.dry_run {
            tracing::warn!("dry run: payment form filled, not submitting");
            return Ok(CheckoutReport {
                stages: cursor.reached,
                evidence: evidence.files(),
                submitted: false,
            });
        }

        session
            .click(ClickTarget::from(page.submit_control()))
            .await
            .map_err(|e| cursor.failed(Submitted, e))?;
        cursor.advance(Submitted)?;

        Ok(CheckoutReport {
            stages: cursor.reached,
            evidence: evidence.files(),
            submitted: true,
        })
    }
}

#[cfg(test)]
#[path = "checkout_test.rs"]
mod tests;
