//! The capability set every page flow is written against.
//!
//! [`SessionHandle`] is deliberately small: navigate, locate, click, type,
//! capture, wait. Retailer logic lives above it and the wire protocol lives
//! below it, so flows can be exercised against a scripted fake.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::BrowserError;

/// When a navigation or reload counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// The document `load` event fired.
    Load,
    /// No network activity for a short quiet window after load.
    NetworkIdle,
}

/// Target state for [`SessionHandle::wait_for_element`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Visible => write!(f, "visible"),
            Visibility::Hidden => write!(f, "hidden"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    Css(String),
    XPath(String),
}

impl Selector {
    #[must_use]
    pub fn css(query: impl Into<String>) -> Self {
        Selector::Css(query.into())
    }

    #[must_use]
    pub fn xpath(query: impl Into<String>) -> Self {
        Selector::XPath(query.into())
    }

    #[must_use]
    pub fn query(&self) -> &str {
        match self {
            Selector::Css(q) | Selector::XPath(q) => q,
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::Css(q) => write!(f, "css:{q}"),
            Selector::XPath(q) => write!(f, "xpath:{q}"),
        }
    }
}

/// A live element returned by [`SessionHandle::query_all`].
///
/// Only valid until the document changes; the id is whatever the backing
/// session uses to address the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub id: i64,
    pub selector: Selector,
}

#[derive(Debug, Clone, Copy)]
pub enum ClickTarget<'a> {
    Element(&'a ElementHandle),
    Selector(&'a Selector),
}

impl std::fmt::Display for ClickTarget<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClickTarget::Element(el) => write!(f, "{} (node {})", el.selector, el.id),
            ClickTarget::Selector(sel) => write!(f, "{sel}"),
        }
    }
}

impl<'a> From<&'a ElementHandle> for ClickTarget<'a> {
    fn from(el: &'a ElementHandle) -> Self {
        ClickTarget::Element(el)
    }
}

impl<'a> From<&'a Selector> for ClickTarget<'a> {
    fn from(sel: &'a Selector) -> Self {
        ClickTarget::Selector(sel)
    }
}

/// An authenticated browser tab. Every call suspends until the page reports
/// completion or the session's own timeout elapses.
#[async_trait]
pub trait SessionHandle: Send + Sync {
    async fn navigate(&self, url: &str, wait: WaitPolicy) -> Result<(), BrowserError>;

    async fn wait_for_element(
        &self,
        selector: &Selector,
        visibility: Visibility,
    ) -> Result<(), BrowserError>;

    /// All current matches, in document order.
    async fn query_all(&self, selector: &Selector) -> Result<Vec<ElementHandle>, BrowserError>;

    async fn click(&self, target: ClickTarget<'_>) -> Result<(), BrowserError>;

    /// Focuses the first match of `selector`, then types `text` into it.
    async fn focus_and_type(&self, selector: &Selector, text: &str) -> Result<(), BrowserError>;

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), BrowserError>;

    async fn reload(&self, wait: WaitPolicy) -> Result<(), BrowserError>;

    async fn sleep(&self, duration: Duration);
}
