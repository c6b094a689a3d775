//! Wire types for the subset of CDP this crate speaks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct CdpRequest<'a> {
    pub id: u64,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
}

/// Any inbound frame: a response when `id` is set, an event when `method` is.
#[derive(Debug, Deserialize)]
pub(crate) struct CdpMessage {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<CdpErrorBody>,
    pub method: Option<String>,
    pub params: Option<Value>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CdpErrorBody {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone)]
pub(crate) struct CdpEvent {
    pub method: String,
    pub params: Value,
}

impl CdpEvent {
    /// `Some((frame_id, loader_id, name))` for `Page.lifecycleEvent`.
    pub(crate) fn lifecycle(&self) -> Option<(&str, &str, &str)> {
        if self.method != "Page.lifecycleEvent" {
            return None;
        }
        Some((
            self.params.get("frameId")?.as_str()?,
            self.params.get("loaderId")?.as_str()?,
            self.params.get("name")?.as_str()?,
        ))
    }
}

/// Response of `GET /json/version`. Chrome uses PascalCase keys here.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(rename = "Protocol-Version")]
    pub protocol_version: String,
    #[serde(rename = "User-Agent", default)]
    pub user_agent: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

/// `DOM.getBoxModel` result. Quads are 8 numbers: four x/y corner pairs.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BoxModel {
    pub content: Vec<f64>,
}

impl BoxModel {
    pub(crate) fn center(&self) -> (f64, f64) {
        quad_center(&self.content)
    }
}

pub(crate) fn quad_center(quad: &[f64]) -> (f64, f64) {
    if quad.len() >= 8 {
        let x = (quad[0] + quad[2] + quad[4] + quad[6]) / 4.0;
        let y = (quad[1] + quad[3] + quad[5] + quad[7]) / 4.0;
        (x, y)
    } else {
        (0.0, 0.0)
    }
}
