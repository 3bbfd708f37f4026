// http.rs - Shared reqwest client setup
// Each outbound collaborator (AI providers, YouTube, facts API) builds its own
// client through here so pooling and timeouts stay consistent.

use std::time::Duration;

pub const USER_AGENT: &str = "TubeBrief-Bot-Rust/0.1";

// Browser UA for youtube.com; the watch page is trimmed down for unknown agents
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(30))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Duration::from_secs(60))
        .user_agent(USER_AGENT)
        .build()
}

/// Renders a non-success HTTP response the way provider SDKs phrase their
/// errors: status line first, then the body.
pub async fn describe_failure(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());
    format!("{}: {}", status, body.trim())
}
