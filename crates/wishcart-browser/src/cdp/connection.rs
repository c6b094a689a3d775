//! Browser-level WebSocket connection shared by page sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::BrowserError;

use super::protocol::{CdpEvent, CdpMessage, CdpRequest};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, BrowserError>>>>>;
type EventRoutes = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<CdpEvent>>>>;

/// Upper bound for a single command round-trip. Waiting for page state is
/// done by the session with its own budgets, never by one long command.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) struct Connection {
    ws_tx: tokio::sync::Mutex<WsSink>,
    request_id: AtomicU64,
    pending: Pending,
    routes: EventRoutes,
    recv_task: tokio::task::JoinHandle<()>,
}

impl Connection {
    pub(crate) async fn open(ws_url: &str) -> Result<Self, BrowserError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(ws_url).await?;
        let (ws_sink, ws_source) = ws_stream.split();

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let routes: EventRoutes = Arc::new(Mutex::new(HashMap::new()));

        let recv_task = {
            let pending = Arc::clone(&pending);
            let routes = Arc::clone(&routes);
            tokio::spawn(async move {
                receive_loop(ws_source, pending, routes).await;
            })
        };

        tracing::debug!(%ws_url, "CDP connection open");

        Ok(Self {
            ws_tx: tokio::sync::Mutex::new(ws_sink),
            request_id: AtomicU64::new(1),
            pending,
            routes,
            recv_task,
        })
    }

    /// Sends `method` and waits for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, BrowserError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method,
            params,
            session_id,
        };
        let json = serde_json::to_string(&request).map_err(|e| BrowserError::Deserialize {
            context: format!("request {method}"),
            source: e,
        })?;
        tracing::trace!(%json, "CDP send");

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(BrowserError::Protocol { code, message, .. }))) => {
                Err(BrowserError::Protocol {
                    method: method.to_owned(),
                    code,
                    message,
                })
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(_)) => Err(BrowserError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(BrowserError::Timeout {
                    what: format!("response to {method}"),
                    after_ms: duration_ms(COMMAND_TIMEOUT),
                })
            }
        }
    }

    /// Routes events tagged with `session_id` to the returned receiver.
    pub(crate) fn subscribe(&self, session_id: &str) -> mpsc::UnboundedReceiver<CdpEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.routes.lock().insert(session_id.to_owned(), tx);
        rx
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}

async fn receive_loop(mut ws_source: WsSource, pending: Pending, routes: EventRoutes) {
    while let Some(msg) = ws_source.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                tracing::trace!(text = %text.as_str(), "CDP recv");
                match serde_json::from_str::<CdpMessage>(text.as_str()) {
                    Ok(frame) => dispatch(frame, &pending, &routes),
                    Err(e) => tracing::warn!(error = %e, "failed to parse CDP message"),
                }
            }
            Ok(Message::Close(_)) => {
                tracing::debug!("CDP WebSocket closed");
                break;
            }
            Err(e) => {
                tracing::error!(error = %e, "CDP WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Dropping the senders wakes every waiter with SessionClosed.
    pending.lock().clear();
    routes.lock().clear();
}

fn dispatch(frame: CdpMessage, pending: &Pending, routes: &EventRoutes) {
    if let Some(id) = frame.id {
        let Some(tx) = pending.lock().remove(&id) else {
            return;
        };
        let result = match frame.error {
            Some(error) => Err(BrowserError::Protocol {
                method: String::new(),
                code: error.code,
                message: error.message,
            }),
            None => Ok(frame.result.unwrap_or(Value::Null)),
        };
        let _ = tx.send(result);
    } else if let Some(method) = frame.method {
        let session_id = frame.session_id.unwrap_or_default();
        let routes = routes.lock();
        if let Some(tx) = routes.get(&session_id) {
            let _ = tx.send(CdpEvent {
                method,
                params: frame.params.unwrap_or(Value::Null),
            });
        }
    }
}

pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
