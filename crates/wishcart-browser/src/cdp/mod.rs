//! Chrome DevTools Protocol backend for [`SessionHandle`](crate::SessionHandle).
//!
//! Start Chromium with remote debugging and point the session at the HTTP
//! endpoint:
//!
//! ```bash
//! chromium --remote-debugging-port=9222
//! ```
//!
//! [`CdpSession::open`] discovers the browser WebSocket through
//! `/json/version`, opens a fresh tab and attaches to it with a flattened
//! session. Responses are routed back to callers by request id; page events
//! (lifecycle, network) are forwarded to the owning session.

mod connection;
mod discovery;
mod page;
mod protocol;

pub use discovery::fetch_browser_version;
pub use page::{CdpSession, SessionOptions};
pub use protocol::BrowserVersion;
