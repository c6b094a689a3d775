use std::time::Duration;

use wishcart_browser::fetch_browser_version;

/// Prints what the browser at `endpoint` reports about itself.
pub(crate) async fn run_probe(endpoint: &str) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let version = fetch_browser_version(&client, endpoint).await?;

    tracing::info!(endpoint, browser = %version.browser, "browser reachable");
    println!("browser:    {}", version.browser);
    println!("protocol:   {}", version.protocol_version);
    println!("user agent: {}", version.user_agent);
    println!("websocket:  {}", version.web_socket_debugger_url);
    Ok(())
}
