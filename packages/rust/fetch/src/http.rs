//! Blocking HTTP fetch for URL items. One attempt per request, no retries.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, instrument};

use ctxkit_shared::{CtxKitError, HttpSettings, Result};

/// Build a blocking reqwest client with the configured limits.
pub(crate) fn build_client(settings: &HttpSettings) -> Result<Client> {
    Client::builder()
        .user_agent(settings.user_agent.as_str())
        .redirect(reqwest::redirect::Policy::limited(settings.max_redirects))
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .map_err(|e| CtxKitError::config(format!("failed to build HTTP client: {e}")))
}

/// GET `url` and return its body text, trimmed.
///
/// Any non-success status is a transport failure.
#[instrument(skip(client))]
pub(crate) fn get_text(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| CtxKitError::transport(url, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CtxKitError::transport(url, format!("HTTP {status}")));
    }

    let body = response
        .text()
        .map_err(|e| CtxKitError::transport(url, format!("failed to read body: {e}")))?;

    debug!(%status, bytes = body.len(), "fetched URL");
    Ok(body.trim().to_string())
}
