//! Scripted in-memory session used by the unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use wishcart_browser::{
    BrowserError, ClickTarget, ElementHandle, Selector, SessionHandle, Visibility, WaitPolicy,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Navigate(String, WaitPolicy),
    WaitFor(Selector, Visibility),
    Query(Selector),
    ClickElement(Selector, i64),
    ClickSelector(Selector),
    Type(Selector, String),
    Screenshot(PathBuf, bool),
    Reload(WaitPolicy),
    Sleep(Duration),
}

#[derive(Default)]
pub(crate) struct FakeSession {
    calls: Mutex<Vec<Call>>,
    /// Result sizes per selector; the last entry repeats.
    counts: Mutex<HashMap<Selector, VecDeque<usize>>>,
    missing: Mutex<HashSet<Selector>>,
    reload_failures: Mutex<VecDeque<BrowserError>>,
    screenshot_fails: Mutex<bool>,
}

impl FakeSession {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Successive `query_all(selector)` calls return these many elements.
    pub(crate) fn script(&self, selector: &Selector, counts: &[usize]) {
        self.counts
            .lock()
            .unwrap()
            .insert(selector.clone(), counts.iter().copied().collect());
    }

    /// `wait_for_element(selector, _)` times out whatever is scripted.
    pub(crate) fn never_appears(&self, selector: &Selector) {
        self.missing.lock().unwrap().insert(selector.clone());
    }

    pub(crate) fn fail_next_reload(&self, err: BrowserError) {
        self.reload_failures.lock().unwrap().push_back(err);
    }

    pub(crate) fn fail_screenshots(&self) {
        *self.screenshot_fails.lock().unwrap() = true;
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    /// Waiting for a scripted selector to become visible skips the empty
    /// lookups at the front of its script, like polling the DOM would.
    /// `false` when the script never yields a match.
    fn settle_visible(&self, selector: &Selector) -> bool {
        let mut counts = self.counts.lock().unwrap();
        let Some(queue) = counts.get_mut(selector) else {
            return true;
        };
        while queue.len() > 1 && queue.front() == Some(&0) {
            queue.pop_front();
        }
        queue.front().is_some_and(|&n| n > 0)
    }

    fn next_count(&self, selector: &Selector) -> usize {
        let mut counts = self.counts.lock().unwrap();
        match counts.get_mut(selector) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(0),
            Some(queue) => queue.front().copied().unwrap_or(0),
            None => 0,
        }
    }
}

#[async_trait]
impl SessionHandle for FakeSession {
    async fn navigate(&self, url: &str, wait: WaitPolicy) -> Result<(), BrowserError> {
        self.record(Call::Navigate(url.to_owned(), wait));
        Ok(())
    }

    async fn wait_for_element(
        &self,
        selector: &Selector,
        visibility: Visibility,
    ) -> Result<(), BrowserError> {
        self.record(Call::WaitFor(selector.clone(), visibility));
        let missing = self.missing.lock().unwrap().contains(selector)
            || (visibility == Visibility::Visible && !self.settle_visible(selector));
        if missing {
            return Err(BrowserError::Timeout {
                what: format!("{selector} to become {visibility}"),
                after_ms: 30_000,
            });
        }
        Ok(())
    }

    async fn query_all(&self, selector: &Selector) -> Result<Vec<ElementHandle>, BrowserError> {
        self.record(Call::Query(selector.clone()));
        let count = self.next_count(selector);
        Ok((1..=count)
            .map(|i| ElementHandle {
                id: i64::try_from(i).unwrap_or(i64::MAX),
                selector: selector.clone(),
            })
            .collect())
    }

    async fn click(&self, target: ClickTarget<'_>) -> Result<(), BrowserError> {
        self.record(match target {
            ClickTarget::Element(el) => Call::ClickElement(el.selector.clone(), el.id),
            ClickTarget::Selector(sel) => Call::ClickSelector(sel.clone()),
        });
        Ok(())
    }

    async fn focus_and_type(&self, selector: &Selector, text: &str) -> Result<(), BrowserError> {
        self.record(Call::Type(selector.clone(), text.to_owned()));
        Ok(())
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), BrowserError> {
        self.record(Call::Screenshot(path.to_path_buf(), full_page));
        if *self.screenshot_fails.lock().unwrap() {
            return Err(BrowserError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        Ok(())
    }

    async fn reload(&self, wait: WaitPolicy) -> Result<(), BrowserError> {
        self.record(Call::Reload(wait));
        match self.reload_failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn sleep(&self, duration: Duration) {
        self.record(Call::Sleep(duration));
    }
}
