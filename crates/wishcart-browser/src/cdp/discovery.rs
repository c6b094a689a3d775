//! HTTP discovery of the browser-level WebSocket endpoint.

use crate::error::BrowserError;

use super::protocol::BrowserVersion;

/// Fetches `<endpoint>/json/version` from a browser started with
/// `--remote-debugging-port`.
///
/// # Errors
///
/// - [`BrowserError::Http`] on connection failure.
/// - [`BrowserError::Unavailable`] if the endpoint answers with a non-2xx status.
/// - [`BrowserError::Deserialize`] if the body is not a version document.
pub async fn fetch_browser_version(
    client: &reqwest::Client,
    endpoint: &str,
) -> Result<BrowserVersion, BrowserError> {
    let endpoint = endpoint.trim_end_matches('/');
    let url = format!("{endpoint}/json/version");
    tracing::debug!(%url, "fetching browser version");

    let response = client.get(&url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(BrowserError::Unavailable {
            endpoint: endpoint.to_owned(),
            reason: format!("unexpected HTTP status {}", status.as_u16()),
        });
    }

    let body = response.text().await?;
    serde_json::from_str::<BrowserVersion>(&body).map_err(|e| BrowserError::Deserialize {
        context: format!("browser version from {endpoint}"),
        source: e,
    })
}
