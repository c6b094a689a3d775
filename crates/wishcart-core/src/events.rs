use serde::{Deserialize, Serialize};

/// "A purchasable item was found, and this is where to complete the purchase."
///
/// Built once per detection and handed to every bus subscriber. `url` is the
/// checkout page the purchase continues on, so a generic consumer can act on
/// it without knowing anything about the retailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityEvent {
    pub company_name: String,
    pub url: String,
}

impl AvailabilityEvent {
    #[must_use]
    pub fn new(company_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            url: url.into(),
        }
    }
}
