pub mod cdp;
pub mod error;
mod retry;
pub mod session;

pub use cdp::{fetch_browser_version, BrowserVersion, CdpSession, SessionOptions};
pub use error::BrowserError;
pub use session::{ClickTarget, ElementHandle, SessionHandle, Selector, Visibility, WaitPolicy};
