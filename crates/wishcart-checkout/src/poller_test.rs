use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wishcart_browser::{BrowserError, WaitPolicy};

use super::*;
use crate::fake::{Call, FakeSession};
use crate::storefront::Storefront;

const INTERVAL: Duration = Duration::from_secs(30);

/// Log output paired with how many session calls had been made when each
/// line was written.
type StampedLog = Arc<Mutex<Vec<(usize, String)>>>;

struct StampedWriter {
    session: Arc<FakeSession>,
    log: StampedLog,
}

impl io::Write for StampedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let line = String::from_utf8_lossy(buf).into_owned();
        self.log
            .lock()
            .unwrap()
            .push((self.session.calls().len(), line));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn recorder() -> EvidenceRecorder {
    EvidenceRecorder::new("evidence", "mediamarkt")
}

#[test]
fn candidate_requires_at_least_one_affordance() {
    assert!(CandidateAction::from_affordances(Vec::new()).is_none());
}

#[tokio::test]
async fn available_on_first_query_returns_without_reload() {
    let shop = Storefront::media_markt();
    let session = FakeSession::new();
    session.script(&shop.selectors.add_to_cart, &[1]);
    let poller = AvailabilityPoller::new(StorefrontPage::new(&session, &shop), INTERVAL);
    let mut evidence = recorder();

    let candidate = poller.poll_until_available(&mut evidence).await.unwrap();

    assert_eq!(candidate.first().id, 1);
    assert_eq!(
        session.calls(),
        vec![
            Call::Query(shop.selectors.add_to_cart.clone()),
            Call::Screenshot(PathBuf::from("evidence/mediamarkt-available.png"), true),
        ]
    );
}

#[tokio::test]
async fn empty_wish_list_sleeps_then_reloads_before_querying_again() {
    let shop = Storefront::media_markt();
    let session = Arc::new(FakeSession::new());
    session.script(&shop.selectors.add_to_cart, &[0, 2]);

    let log: StampedLog = Arc::default();
    let subscriber = {
        let session = Arc::clone(&session);
        let log = Arc::clone(&log);
        tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || StampedWriter {
                session: Arc::clone(&session),
                log: Arc::clone(&log),
            })
            .finish()
    };
    let _guard = tracing::subscriber::set_default(subscriber);

    let poller = AvailabilityPoller::new(StorefrontPage::new(session.as_ref(), &shop), INTERVAL);
    let mut evidence = recorder();

    let candidate = poller.poll_until_available(&mut evidence).await.unwrap();

    let query = Call::Query(shop.selectors.add_to_cart.clone());
    assert_eq!(
        session.calls(),
        vec![
            query.clone(),
            Call::Sleep(INTERVAL),
            Call::Reload(WaitPolicy::Load),
            query,
            Call::Screenshot(PathBuf::from("evidence/mediamarkt-available.png"), true),
        ]
    );
    assert_eq!(candidate.len(), 2);

    let log = log.lock().unwrap();
    let (calls_before, _) = log
        .iter()
        .find(|(_, line)| line.contains("no items available"))
        .unwrap_or_else(|| panic!("no 'no items available' line in {log:?}"));
    // Logged after the first query and before the sleep.
    assert_eq!(*calls_before, 1);
}

#[tokio::test]
async fn first_affordance_in_document_order_is_the_candidate() {
    let shop = Storefront::media_markt();
    let session = FakeSession::new();
    session.script(&shop.selectors.add_to_cart, &[3]);
    let poller = AvailabilityPoller::new(StorefrontPage::new(&session, &shop), INTERVAL);

    let candidate = poller.poll_until_available(&mut recorder()).await.unwrap();

    assert_eq!(candidate.len(), 3);
    assert_eq!(candidate.first().id, 1);
}

#[tokio::test]
async fn every_retry_is_preceded_by_a_full_reload() {
    let shop = Storefront::media_markt();
    let session = FakeSession::new();
    session.script(&shop.selectors.add_to_cart, &[0, 0, 0, 1]);
    let poller = AvailabilityPoller::new(StorefrontPage::new(&session, &shop), INTERVAL);

    poller.poll_until_available(&mut recorder()).await.unwrap();

    let calls = session.calls();
    let queries: Vec<usize> = calls
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, Call::Query(_)))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(queries.len(), 4);
    for pair in queries.windows(2) {
        let between = &calls[pair[0] + 1..pair[1]];
        assert_eq!(
            between,
            &[Call::Sleep(INTERVAL), Call::Reload(WaitPolicy::Load)][..]
        );
    }
}

#[tokio::test]
async fn transient_reload_failure_is_absorbed() {
    let shop = Storefront::media_markt();
    let session = FakeSession::new();
    session.script(&shop.selectors.add_to_cart, &[0, 1]);
    session.fail_next_reload(BrowserError::NavigationFailed {
        url: shop.wishlist_url.clone(),
        reason: "net::ERR_CONNECTION_RESET".to_owned(),
    });
    let poller = AvailabilityPoller::new(StorefrontPage::new(&session, &shop), INTERVAL);

    let candidate = poller.poll_until_available(&mut recorder()).await;

    assert!(candidate.is_ok(), "expected candidate, got: {candidate:?}");
}

#[tokio::test]
async fn closed_session_during_reload_is_fatal() {
    let shop = Storefront::media_markt();
    let session = FakeSession::new();
    session.script(&shop.selectors.add_to_cart, &[0]);
    session.fail_next_reload(BrowserError::SessionClosed);
    let poller = AvailabilityPoller::new(StorefrontPage::new(&session, &shop), INTERVAL);

    let err = poller
        .poll_until_available(&mut recorder())
        .await
        .unwrap_err();

    assert!(matches!(err, BrowserError::SessionClosed));
    assert!(!session
        .calls()
        .iter()
        .any(|c| matches!(c, Call::Screenshot(..))));
}

#[tokio::test]
async fn failed_evidence_capture_does_not_stop_detection() {
    let shop = Storefront::media_markt();
    let session = FakeSession::new();
    session.script(&shop.selectors.add_to_cart, &[1]);
    session.fail_screenshots();
    let poller = AvailabilityPoller::new(StorefrontPage::new(&session, &shop), INTERVAL);
    let mut evidence = recorder();

    let candidate = poller.poll_until_available(&mut evidence).await;

    assert!(candidate.is_ok());
    assert!(evidence.checkpoints().is_empty());
}
