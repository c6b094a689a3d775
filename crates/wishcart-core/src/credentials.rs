//! Secrets read once at startup and handed to the flows that need them.
//!
//! Both types print `[redacted]` in place of every secret so they can sit
//! inside logged structs without leaking.

/// Retailer account login.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("username", &"[redacted]")
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Card details typed into the payment form. Held for one checkout run only.
#[derive(Clone, PartialEq, Eq)]
pub struct PaymentCredentials {
    pub card_number: String,
    pub expiry: String,
    pub cvc: String,
    pub holder_name: String,
}

impl std::fmt::Debug for PaymentCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentCredentials")
            .field("card_number", &"[redacted]")
            .field("expiry", &"[redacted]")
            .field("cvc", &"[redacted]")
            .field("holder_name", &"[redacted]")
            .finish()
    }
}
