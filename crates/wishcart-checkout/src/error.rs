use thiserror::Error;
use wishcart_browser::BrowserError;

use crate::checkout::CheckoutStage;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("checkout failed at {stage} (reached: {})", format_stages(.reached))]
    Stage {
        stage: CheckoutStage,
        reached: Vec<CheckoutStage>,
        #[source]
        source: BrowserError,
    },

    #[error("invalid checkout transition from {} to {to}", .from.map_or_else(|| "start".to_owned(), |s| s.to_string()))]
    InvalidTransition {
        from: Option<CheckoutStage>,
        to: CheckoutStage,
    },
}

impl CheckoutError {
    /// Stages completed before the failure.
    #[must_use]
    pub fn reached(&self) -> &[CheckoutStage] {
        match self {
            CheckoutError::Stage { reached, .. } => reached,
            CheckoutError::InvalidTransition { .. } => &[],
        }
    }
}

fn format_stages(stages: &[CheckoutStage]) -> String {
    if stages.is_empty() {
        return "none".to_owned();
    }
    stages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("login failed")]
    Login(#[source] BrowserError),

    #[error("availability polling failed")]
    Poll(#[source] BrowserError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}
