//! Retailer page model.
//!
//! Every selector, visible label and positional quirk of a retailer's pages
//! lives in [`StorefrontSelectors`]. [`StorefrontPage`] turns those into
//! named affordances so the poller and the checkout never match on page
//! structure themselves.

use wishcart_browser::{BrowserError, ElementHandle, Selector, SessionHandle, Visibility};
use wishcart_core::PaymentCredentials;

#[derive(Debug, Clone)]
pub struct StorefrontSelectors {
    pub cookie_accept: Selector,
    pub login_email: Selector,
    pub login_password: Selector,
    pub login_submit: Selector,
    /// Enabled "add to cart" buttons on the wish list.
    pub add_to_cart: Selector,
    pub credit_card_option: Selector,
    /// Continue button on the payment-method step, matched by label.
    pub overview_continue: Selector,
    /// "Continue and pay" buttons; the second match is the real one.
    pub continue_and_pay: Selector,
    pub card_number: Selector,
    pub card_expiry: Selector,
    pub card_cvc: Selector,
    pub card_holder: Selector,
    pub submit_payment: Selector,
}

#[derive(Debug, Clone)]
pub struct Storefront {
    pub company_name: String,
    /// File-name prefix for evidence screenshots.
    pub evidence_prefix: String,
    pub account_url: String,
    pub wishlist_url: String,
    /// Where a purchase continues once an item is in the cart.
    pub checkout_url: String,
    pub selectors: StorefrontSelectors,
}

impl Storefront {
    /// `mediamarkt.de`, German-language checkout.
    #[must_use]
    pub fn media_markt() -> Self {
        Self {
            company_name: "Media Markt".to_owned(),
            evidence_prefix: "mediamarkt".to_owned(),
            account_url: "https://www.mediamarkt.de/de/myaccount".to_owned(),
            wishlist_url: "https://www.mediamarkt.de/de/myaccount/wishlist".to_owned(),
            checkout_url: "https://www.mediamarkt.de/checkout/summary".to_owned(),
            selectors: StorefrontSelectors {
                cookie_accept: Selector::css("#privacy-layer-accept-all-button"),
                login_email: Selector::css("#mms-login-form__email"),
                login_password: Selector::css("#mms-login-form__password"),
                login_submit: Selector::css("#mms-login-form__login-button"),
                add_to_cart: Selector::xpath(
                    "//button[@data-test='a2c-Button' and not(@disabled)]",
                ),
                credit_card_option: Selector::xpath("//span[contains(text(), 'Kreditkarte')]"),
                overview_continue: Selector::xpath(
                    "//div[@data-test='checkout-continue-mobile-enabled']/button[contains(text(), 'Weiter')]",
                ),
                continue_and_pay: Selector::xpath(
                    "//div[@data-test]/button[contains(text(), 'Fortfahren und bezahlen')]",
                ),
                card_number: Selector::css("#MMSKKNr"),
                card_expiry: Selector::css("#MMSExpiry"),
                card_cvc: Selector::css("#MMSCCCVC"),
                card_holder: Selector::css("#MMScreditCardHolder"),
                submit_payment: Selector::css("#submitButton"),
            },
        }
    }
}

/// One input of the card payment form, in the order it is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentField {
    CardNumber,
    Expiry,
    Cvc,
    HolderName,
}

impl PaymentField {
    pub const FILL_ORDER: [PaymentField; 4] = [
        PaymentField::CardNumber,
        PaymentField::Expiry,
        PaymentField::Cvc,
        PaymentField::HolderName,
    ];

    #[must_use]
    pub fn value(self, credentials: &PaymentCredentials) -> &str {
        match self {
            PaymentField::CardNumber => &credentials.card_number,
            PaymentField::Expiry => &credentials.expiry,
            PaymentField::Cvc => &credentials.cvc,
            PaymentField::HolderName => &credentials.holder_name,
        }
    }
}

impl std::fmt::Display for PaymentField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentField::CardNumber => write!(f, "card number"),
            PaymentField::Expiry => write!(f, "expiry"),
            PaymentField::Cvc => write!(f, "cvc"),
            PaymentField::HolderName => write!(f, "holder name"),
        }
    }
}

/// A session bound to a storefront's page model.
pub struct StorefrontPage<'a, S: SessionHandle + ?Sized> {
    session: &'a S,
    storefront: &'a Storefront,
}

impl<S: SessionHandle + ?Sized> Clone for StorefrontPage<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: SessionHandle + ?Sized> Copy for StorefrontPage<'_, S> {}

impl<'a, S: SessionHandle + ?Sized> StorefrontPage<'a, S> {
    pub fn new(session: &'a S, storefront: &'a Storefront) -> Self {
        Self {
            session,
            storefront,
        }
    }

    #[must_use]
    pub fn session(&self) -> &'a S {
        self.session
    }

    #[must_use]
    pub fn storefront(&self) -> &'a Storefront {
        self.storefront
    }

    fn selectors(&self) -> &'a StorefrontSelectors {
        &self.storefront.selectors
    }

    /// Enabled purchase buttons currently rendered, in document order.
    pub async fn purchase_affordances(&self) -> Result<Vec<ElementHandle>, BrowserError> {
        self.session.query_all(&self.selectors().add_to_cart).await
    }

    /// The credit-card payment option, if this checkout variant shows one.
    pub async fn credit_card_option(&self) -> Result<Option<ElementHandle>, BrowserError> {
        let mut matches = self
            .session
            .query_all(&self.selectors().credit_card_option)
            .await?;
        Ok(if matches.is_empty() {
            None
        } else {
            Some(matches.swap_remove(0))
        })
    }

    /// The continue button shown after choosing a payment method.
    ///
    /// Waits for it to render within the session's element budget.
    pub async fn overview_continue_control(&self) -> Result<ElementHandle, BrowserError> {
        let selector = &self.selectors().overview_continue;
        self.session
            .wait_for_element(selector, Visibility::Visible)
            .await?;
        self.session
            .query_all(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    /// The control that moves on to the card form.
    ///
    /// Waits for the buttons to render, then picks one. The page renders two
    /// matching buttons and only the second one works.
    /// It is not known why; fewer than two matches is treated as a page we
    /// do not recognise rather than falling back to the first.
    pub async fn continue_to_payment_control(&self) -> Result<ElementHandle, BrowserError> {
        let selector = &self.selectors().continue_and_pay;
        self.session
            .wait_for_element(selector, Visibility::Visible)
            .await?;
        let matches = self.session.query_all(selector).await?;
        let found = matches.len();
        matches
            .into_iter()
            .nth(1)
            .ok_or_else(|| BrowserError::ElementNotFound {
                selector: format!("{selector} (second match, found {found})"),
            })
    }

    pub async fn wait_for_payment_form(&self) -> Result<(), BrowserError> {
        self.session
            .wait_for_element(&self.selectors().card_number, Visibility::Visible)
            .await
    }

    #[must_use]
    pub fn payment_field(&self, field: PaymentField) -> &'a Selector {
        let s = self.selectors();
        match field {
            PaymentField::CardNumber => &s.card_number,
            PaymentField::Expiry => &s.card_expiry,
            PaymentField::Cvc => &s.card_cvc,
            PaymentField::HolderName => &s.card_holder,
        }
    }

    #[must_use]
    pub fn submit_control(&self) -> &'a Selector {
        &self.selectors().submit_payment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{Call, FakeSession};

    fn credentials() -> PaymentCredentials {
        PaymentCredentials {
            card_number: "4111111111111111".to_owned(),
            expiry: "12/30".to_owned(),
            cvc: "123".to_owned(),
            holder_name: "Erika Mustermann".to_owned(),
        }
    }

    #[test]
    fn payment_fields_fill_in_form_order() {
        let creds = credentials();
        let values: Vec<&str> = PaymentField::FILL_ORDER
            .iter()
            .map(|f| f.value(&creds))
            .collect();
        assert_eq!(
            values,
            vec!["4111111111111111", "12/30", "123", "Erika Mustermann"]
        );
    }

    #[test]
    fn media_markt_checkout_url_is_summary_page() {
        let shop = Storefront::media_markt();
        assert_eq!(shop.checkout_url, "https://www.mediamarkt.de/checkout/summary");
        assert!(matches!(shop.selectors.add_to_cart, Selector::XPath(_)));
    }

    #[tokio::test]
    async fn continue_to_payment_uses_second_match() {
        let shop = Storefront::media_markt();
        let session = FakeSession::new();
        session.script(&shop.selectors.continue_and_pay, &[2]);
        let page = StorefrontPage::new(&session, &shop);

        let control = page.continue_to_payment_control().await.unwrap();

        assert_eq!(control.id, 2);
    }

    #[tokio::test]
    async fn continue_to_payment_with_single_match_is_not_found() {
        let shop = Storefront::media_markt();
        let session = FakeSession::new();
        session.script(&shop.selectors.continue_and_pay, &[1]);
        let page = StorefrontPage::new(&session, &shop);

        let err = page.continue_to_payment_control().await.unwrap_err();

        assert!(
            matches!(err, BrowserError::ElementNotFound { ref selector } if selector.contains("found 1")),
            "expected ElementNotFound, got: {err:?}"
        );
    }

    #[tokio::test]
    async fn continue_to_payment_waits_for_late_buttons() {
        let shop = Storefront::media_markt();
        let session = FakeSession::new();
        session.script(&shop.selectors.continue_and_pay, &[0, 0, 2]);
        let page = StorefrontPage::new(&session, &shop);

        let control = page.continue_to_payment_control().await.unwrap();

        assert_eq!(control.id, 2);
        assert_eq!(
            session.calls(),
            vec![
                Call::WaitFor(shop.selectors.continue_and_pay.clone(), Visibility::Visible),
                Call::Query(shop.selectors.continue_and_pay.clone()),
            ]
        );
    }

    #[tokio::test]
    async fn continue_to_payment_never_rendered_times_out() {
        let shop = Storefront::media_markt();
        let session = FakeSession::new();
        session.script(&shop.selectors.continue_and_pay, &[0]);
        let page = StorefrontPage::new(&session, &shop);

        let err = page.continue_to_payment_control().await.unwrap_err();

        assert!(matches!(err, BrowserError::Timeout { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn overview_continue_waits_for_late_button() {
        let shop = Storefront::media_markt();
        let session = FakeSession::new();
        session.script(&shop.selectors.overview_continue, &[0, 1]);
        let page = StorefrontPage::new(&session, &shop);

        let control = page.overview_continue_control().await.unwrap();

        assert_eq!(control.id, 1);
    }

    #[tokio::test]
    async fn credit_card_option_absent_is_none() {
        let shop = Storefront::media_markt();
        let session = FakeSession::new();
        let page = StorefrontPage::new(&session, &shop);

        assert!(page.credit_card_option().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn overview_continue_never_rendered_times_out() {
        let shop = Storefront::media_markt();
        let session = FakeSession::new();
        session.script(&shop.selectors.overview_continue, &[0]);
        let page = StorefrontPage::new(&session, &shop);

        let err = page.overview_continue_control().await.unwrap_err();
        assert!(matches!(err, BrowserError::Timeout { .. }));
    }
}
