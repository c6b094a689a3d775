//! Wish-list polling.
//!
//! One query per cycle. Nothing found means sleep, full reload, query again.
//! The loop has no retry cap and ends only by returning a candidate or a
//! fatal session error.

use std::time::Duration;

use wishcart_browser::{BrowserError, ElementHandle, SessionHandle, WaitPolicy};

use crate::evidence::{Checkpoint, EvidenceRecorder};
use crate::storefront::StorefrontPage;

/// The purchase affordances found in the cycle that ended polling.
///
/// Only the first one is ever acted on; the rest are kept for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAction {
    affordances: Vec<ElementHandle>,
}

impl CandidateAction {
    /// `None` when nothing is purchasable.
    #[must_use]
    pub fn from_affordances(affordances: Vec<ElementHandle>) -> Option<Self> {
        if affordances.is_empty() {
            None
        } else {
            Some(Self { affordances })
        }
    }

    /// The affordance to act on, first in document order.
    #[must_use]
    pub fn first(&self) -> &ElementHandle {
        &self.affordances[0]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.affordances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.affordances.is_empty()
    }
}

pub struct AvailabilityPoller<'a, S: SessionHandle + ?Sized> {
    page: StorefrontPage<'a, S>,
    interval: Duration,
}

impl<'a, S: SessionHandle + ?Sized> AvailabilityPoller<'a, S> {
    pub fn new(page: StorefrontPage<'a, S>, interval: Duration) -> Self {
        Self { page, interval }
    }

    /// Polls until at least one item can be bought.
    ///
    /// Expects the session to already show the wish list. The `available`
    /// screenshot is taken before returning, so it always precedes any
    /// mutating action.
    ///
    /// # Errors
    ///
    /// Returns the first non-transient [`BrowserError`]. Timeouts and failed
    /// navigations during a reload are logged and polling continues.
    pub async fn poll_until_available(
        &self,
        evidence: &mut EvidenceRecorder,
    ) -> Result<CandidateAction, BrowserError> {
        let session = self.page.session();
        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            match self.page.purchase_affordances().await {
                Ok(found) => {
                    if let Some(candidate) = CandidateAction::from_affordances(found) {
                        tracing::info!(
                            cycle,
                            available = candidate.len(),
                            "purchasable item found"
                        );
                        evidence.capture(session, Checkpoint::Available).await;
                        return Ok(candidate);
                    }
                    tracing::info!(
                        cycle,
                        retry_in_secs = self.interval.as_secs(),
                        "no items available"
                    );
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!(cycle, error = %e, "wish list query failed; will retry");
                }
                Err(e) => return Err(e),
            }

            session.sleep(self.interval).await;

            if let Err(e) = session.reload(WaitPolicy::Load).await {
                if !e.is_transient() {
                    return Err(e);
                }
                tracing::warn!(cycle, error = %e, "wish list reload failed; will retry");
            }
        }
    }
}

#[cfg(test)]
#[path = "poller_test.rs"]
mod tests;
