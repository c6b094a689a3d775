//! A single attached tab implementing [`SessionHandle`].

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::error::BrowserError;
use crate::retry::retry_with_backoff;
use crate::session::{ClickTarget, ElementHandle, Selector, SessionHandle, Visibility, WaitPolicy};

use super::connection::{duration_ms, Connection};
use super::discovery::fetch_browser_version;
use super::protocol::{BoxModel, CdpEvent};

/// How often element waits re-query the DOM.
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Domains whose events the session consumes. Every enabled domain feeds the
/// unbounded event channel, so nothing else is switched on.
const ENABLED_DOMAINS: [&str; 2] = ["Page.enable", "DOM.enable"];

/// Connection and wait budgets for a [`CdpSession`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// HTTP debugging endpoint, e.g. `http://127.0.0.1:9222`.
    pub endpoint: String,
    pub element_timeout: Duration,
    pub navigation_timeout: Duration,
    pub connect_max_retries: u32,
    pub connect_backoff_base_ms: u64,
}

/// A browser tab driven over the DevTools protocol.
pub struct CdpSession {
    connection: Connection,
    target_id: String,
    session_id: String,
    events: tokio::sync::Mutex<mpsc::UnboundedReceiver<CdpEvent>>,
    element_timeout: Duration,
    navigation_timeout: Duration,
}

impl CdpSession {
    /// Connects to the browser behind `options.endpoint` and opens a new tab.
    ///
    /// Discovery and the WebSocket handshake are retried with back-off, since
    /// the browser is often started alongside this process.
    ///
    /// # Errors
    ///
    /// - [`BrowserError::Unavailable`] / [`BrowserError::Http`] if the endpoint
    ///   never answers within the retry budget.
    /// - [`BrowserError::Protocol`] if the tab cannot be created or attached.
    pub async fn open(options: &SessionOptions) -> Result<Self, BrowserError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        let http = &http;
        let endpoint = options.endpoint.as_str();
        let connection = retry_with_backoff(
            options.connect_max_retries,
            options.connect_backoff_base_ms,
            move || async move {
                let version = fetch_browser_version(http, endpoint).await?;
                tracing::info!(
                    browser = %version.browser,
                    protocol = %version.protocol_version,
                    "connected to browser"
                );
                Connection::open(&version.web_socket_debugger_url).await
            },
        )
        .await?;

        let created = connection
            .call(
                "Target.createTarget",
                Some(json!({"url": "about:blank"})),
                None,
            )
            .await?;
        let target_id = string_field(&created, "targetId", "Target.createTarget")?;

        let attached = connection
            .call(
                "Target.attachToTarget",
                Some(json!({"targetId": target_id, "flatten": true})),
                None,
            )
            .await?;
        let session_id = string_field(&attached, "sessionId", "Target.attachToTarget")?;
        let events = connection.subscribe(&session_id);

        let session = Self {
            connection,
            target_id,
            session_id,
            events: tokio::sync::Mutex::new(events),
            element_timeout: options.element_timeout,
            navigation_timeout: options.navigation_timeout,
        };
        session.enable_domains().await?;
        Ok(session)
    }

    async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, BrowserError> {
        self.connection
            .call(method, params, Some(&self.session_id))
            .await
    }

    async fn enable_domains(&self) -> Result<(), BrowserError> {
        for method in ENABLED_DOMAINS {
            self.call(method, None).await?;
        }
        self.call("Page.setLifecycleEventsEnabled", Some(json!({"enabled": true})))
            .await?;
        tracing::debug!(session_id = %self.session_id, "enabled CDP domains");
        Ok(())
    }

    /// Drops events that arrived before the action about to be waited on.
    async fn drain_events(&self) {
        let mut events = self.events.lock().await;
        while events.try_recv().is_ok() {}
    }

    /// Waits for lifecycle event `name` on `frame_id`. With `loader_id` set,
    /// only events for that document count.
    async fn wait_for_lifecycle(
        &self,
        frame_id: &str,
        loader_id: Option<&str>,
        name: &str,
    ) -> Result<String, BrowserError> {
        let mut events = self.events.lock().await;
        let wait = async {
            while let Some(event) = events.recv().await {
                if let Some((frame, loader, event_name)) = event.lifecycle() {
                    if frame == frame_id
                        && event_name == name
                        && loader_id.is_none_or(|l| l == loader)
                    {
                        return Ok(loader.to_owned());
                    }
                }
            }
            Err(BrowserError::SessionClosed)
        };
        tokio::time::timeout(self.navigation_timeout, wait)
            .await
            .map_err(|_| BrowserError::Timeout {
                what: format!("page lifecycle event {name}"),
                after_ms: duration_ms(self.navigation_timeout),
            })?
    }

    async fn document_root(&self) -> Result<i64, BrowserError> {
        let doc = self
            .call("DOM.getDocument", Some(json!({"depth": 0})))
            .await?;
        doc["root"]["nodeId"]
            .as_i64()
            .ok_or_else(|| BrowserError::InvalidResponse {
                method: "DOM.getDocument".to_owned(),
                reason: "missing root.nodeId".to_owned(),
            })
    }

    async fn node_ids(&self, selector: &Selector) -> Result<Vec<i64>, BrowserError> {
        let root = self.document_root().await?;
        match selector {
            Selector::Css(query) => {
                let result = self
                    .call(
                        "DOM.querySelectorAll",
                        Some(json!({"nodeId": root, "selector": query})),
                    )
                    .await?;
                Ok(int_array(&result["nodeIds"]))
            }
            Selector::XPath(query) => {
                let search = self
                    .call("DOM.performSearch", Some(json!({"query": query})))
                    .await?;
                let search_id = string_field(&search, "searchId", "DOM.performSearch")?;
                let count = search["resultCount"].as_i64().unwrap_or(0);

                let ids = if count > 0 {
                    self.call(
                        "DOM.getSearchResults",
                        Some(json!({"searchId": search_id, "fromIndex": 0, "toIndex": count})),
                    )
                    .await
                    .map(|r| int_array(&r["nodeIds"]))
                } else {
                    Ok(Vec::new())
                };

                self.call(
                    "DOM.discardSearchResults",
                    Some(json!({"searchId": search_id})),
                )
                .await?;
                ids
            }
        }
    }

    /// `None` when the node is detached or not rendered.
    async fn box_model(&self, node_id: i64) -> Result<Option<BoxModel>, BrowserError> {
        match self
            .call("DOM.getBoxModel", Some(json!({"nodeId": node_id})))
            .await
        {
            Ok(result) => {
                let model = serde_json::from_value(result["model"].clone()).map_err(|e| {
                    BrowserError::Deserialize {
                        context: "DOM.getBoxModel".to_owned(),
                        source: e,
                    }
                })?;
                Ok(Some(model))
            }
            Err(BrowserError::Protocol { code: -32000, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn any_visible(&self, node_ids: &[i64]) -> Result<bool, BrowserError> {
        for id in node_ids {
            if self.box_model(*id).await?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn first_node(&self, selector: &Selector) -> Result<i64, BrowserError> {
        self.node_ids(selector)
            .await?
            .first()
            .copied()
            .ok_or_else(|| BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    async fn click_node(&self, node_id: i64, label: &str) -> Result<(), BrowserError> {
        self.call("DOM.scrollIntoViewIfNeeded", Some(json!({"nodeId": node_id})))
            .await?;
        let model = self
            .box_model(node_id)
            .await?
            .ok_or_else(|| BrowserError::ElementNotFound {
                selector: format!("{label} (not visible)"),
            })?;
        let (x, y) = model.center();

        for kind in ["mouseMoved", "mousePressed", "mouseReleased"] {
            self.call(
                "Input.dispatchMouseEvent",
                Some(json!({
                    "type": kind,
                    "x": x,
                    "y": y,
                    "button": "left",
                    "clickCount": 1,
                })),
            )
            .await?;
        }
        tracing::debug!(element = %label, x, y, "clicked");
        Ok(())
    }

    async fn full_page_clip(&self) -> Result<Value, BrowserError> {
        let metrics = self.call("Page.getLayoutMetrics", None).await?;
        let size = &metrics["cssContentSize"];
        let width = size["width"].as_f64().unwrap_or(0.0);
        let height = size["height"].as_f64().unwrap_or(0.0);
        Ok(json!({"x": 0, "y": 0, "width": width, "height": height, "scale": 1}))
    }
}

#[async_trait]
impl SessionHandle for CdpSession {
    async fn navigate(&self, url: &str, wait: WaitPolicy) -> Result<(), BrowserError> {
        self.drain_events().await;
        let result = self.call("Page.navigate", Some(json!({"url": url}))).await?;

        if let Some(error) = result.get("errorText").and_then(Value::as_str) {
            return Err(BrowserError::NavigationFailed {
                url: url.to_owned(),
                reason: error.to_owned(),
            });
        }

        let frame_id = string_field(&result, "frameId", "Page.navigate")?;
        let loader_id = result.get("loaderId").and_then(Value::as_str);
        self.wait_for_lifecycle(&frame_id, loader_id, lifecycle_name(wait))
            .await
            .map_err(|e| match e {
                BrowserError::Timeout { .. } => BrowserError::NavigationFailed {
                    url: url.to_owned(),
                    reason: e.to_string(),
                },
                other => other,
            })?;

        tracing::debug!(%url, ?wait, "navigated");
        Ok(())
    }

    async fn wait_for_element(
        &self,
        selector: &Selector,
        visibility: Visibility,
    ) -> Result<(), BrowserError> {
        let deadline = tokio::time::Instant::now() + self.element_timeout;
        loop {
            let ids = self.node_ids(selector).await?;
            let visible = self.any_visible(&ids).await?;
            let satisfied = match visibility {
                Visibility::Visible => visible,
                Visibility::Hidden => !visible,
            };
            if satisfied {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BrowserError::Timeout {
                    what: format!("{selector} to become {visibility}"),
                    after_ms: duration_ms(self.element_timeout),
                });
            }
            tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
        }
    }

    async fn query_all(&self, selector: &Selector) -> Result<Vec<ElementHandle>, BrowserError> {
        let ids = self.node_ids(selector).await?;
        Ok(ids
            .into_iter()
            .map(|id| ElementHandle {
                id,
                selector: selector.clone(),
            })
            .collect())
    }

    async fn click(&self, target: ClickTarget<'_>) -> Result<(), BrowserError> {
        let node_id = match target {
            ClickTarget::Element(el) => el.id,
            ClickTarget::Selector(sel) => self.first_node(sel).await?,
        };
        self.click_node(node_id, &target.to_string()).await
    }

    async fn focus_and_type(&self, selector: &Selector, text: &str) -> Result<(), BrowserError> {
        let node_id = self.first_node(selector).await?;
        self.call("DOM.focus", Some(json!({"nodeId": node_id})))
            .await?;
        self.call("Input.insertText", Some(json!({"text": text})))
            .await?;
        // Never log `text`: it is a credential on every call site.
        tracing::debug!(%selector, chars = text.chars().count(), "typed into field");
        Ok(())
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), BrowserError> {
        let mut params = json!({
            "format": "png",
            "captureBeyondViewport": full_page,
        });
        if full_page {
            params["clip"] = self.full_page_clip().await?;
        }

        let result = self.call("Page.captureScreenshot", Some(params)).await?;
        let data = string_field(&result, "data", "Page.captureScreenshot")?;
        let bytes = base64::engine::general_purpose::STANDARD.decode(data)?;

        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| BrowserError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
        tracing::debug!(path = %path.display(), full_page, "saved screenshot");
        Ok(())
    }

    async fn reload(&self, wait: WaitPolicy) -> Result<(), BrowserError> {
        self.drain_events().await;
        self.call("Page.reload", Some(json!({"ignoreCache": true})))
            .await?;
        // The main frame of a page target shares the target's id. `init`
        // marks the new document; wait on that loader only.
        let loader = self.wait_for_lifecycle(&self.target_id, None, "init").await?;
        self.wait_for_lifecycle(&self.target_id, Some(&loader), lifecycle_name(wait))
            .await?;
        Ok(())
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

fn lifecycle_name(wait: WaitPolicy) -> &'static str {
    match wait {
        WaitPolicy::Load => "load",
        WaitPolicy::NetworkIdle => "networkIdle",
    }
}

fn string_field(value: &Value, key: &str, method: &str) -> Result<String, BrowserError> {
    value[key]
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| BrowserError::InvalidResponse {
            method: method.to_owned(),
            reason: format!("missing {key}"),
        })
}

fn int_array(value: &Value) -> Vec<i64> {
    value
        .as_array()
        .map(|arr| arr.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default()
}
