//! Availability polling and the checkout state machine it triggers.
//!
//! The flow for one process run is: log in, poll the wish list until an
//! item can be bought, publish an [`AvailabilityEvent`], then drive the
//! checkout once. Nothing in here retries a checkout stage.

pub mod bus;
pub mod checkout;
pub mod error;
pub mod evidence;
pub mod login;
pub mod poller;
pub mod storefront;
pub mod watcher;

#[cfg(test)]
mod fake;

pub use bus::NotificationBus;
pub use checkout::{CheckoutMachine, CheckoutOptions, CheckoutReport, CheckoutStage};
pub use error::{CheckoutError, WatchError};
pub use evidence::{Checkpoint, EvidenceRecorder};
pub use poller::{AvailabilityPoller, CandidateAction};
pub use storefront::{PaymentField, Storefront, StorefrontPage, StorefrontSelectors};
pub use watcher::{WatchSettings, Watcher};
pub use wishcart_core::AvailabilityEvent;
