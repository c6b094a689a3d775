//! Account login and positioning on the wish list.

use wishcart_browser::{BrowserError, ClickTarget, SessionHandle, Visibility, WaitPolicy};
use wishcart_core::AccountCredentials;

use crate::storefront::StorefrontPage;

/// Signs in through the storefront's account page.
///
/// Accepts the cookie banner first; the login form is not clickable while
/// it is shown. Done once the login button disappears.
///
/// # Errors
///
/// Any [`BrowserError`] from the session. Nothing is retried.
pub async fn log_in<S>(
    page: StorefrontPage<'_, S>,
    account: &AccountCredentials,
) -> Result<(), BrowserError>
where
    S: SessionHandle + ?Sized,
{
    let session = page.session();
    let shop = page.storefront();
    let s = &shop.selectors;

    tracing::info!(company = %shop.company_name, url = %shop.account_url, "logging in");
    session.navigate(&shop.account_url, WaitPolicy::Load).await?;

    session
        .wait_for_element(&s.cookie_accept, Visibility::Visible)
        .await?;
    session.click(ClickTarget::from(&s.cookie_accept)).await?;

    session
        .focus_and_type(&s.login_email, &account.username)
        .await?;
    session
        .focus_and_type(&s.login_password, &account.password)
        .await?;
    session.click(ClickTarget::from(&s.login_submit)).await?;
    session
        .wait_for_element(&s.login_submit, Visibility::Hidden)
        .await?;

    tracing::info!(company = %shop.company_name, "logged in");
    Ok(())
}

/// Navigates to the wish list and waits for the page load.
///
/// # Errors
///
/// Any [`BrowserError`] from the navigation.
pub async fn open_wish_list<S>(page: StorefrontPage<'_, S>) -> Result<(), BrowserError>
where
    S: SessionHandle + ?Sized,
{
    let shop = page.storefront();
    tracing::debug!(url = %shop.wishlist_url, "opening wish list");
    page.session()
        .navigate(&shop.wishlist_url, WaitPolicy::Load)
        .await
}
