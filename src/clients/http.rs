//! Shared plumbing for the JSON-over-HTTP clients.

use crate::clients::session::SessionContext;
use crate::framework::SourceError;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Builds an HTTP client. Pass `None` for long-lived streaming connections.
pub fn build_client(timeout: Option<Duration>) -> Result<Client, SourceError> {
    let builder = Client::builder().user_agent(concat!("nore-tracker/", env!("CARGO_PKG_VERSION")));
    let builder = match timeout {
        Some(timeout) => builder.timeout(timeout),
        None => builder,
    };
    builder.build().map_err(|e| SourceError::Transport(e.to_string()))
}

/// Appends path segments to `base`, keeping any path it already has.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, SourceError> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| SourceError::Transport(format!("{base} cannot be used as a base URL")))?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}

/// GETs `url` and decodes the JSON body.
///
/// Any non-2xx status is reported as [`SourceError::NotFound`].
pub async fn get_json<T: DeserializeOwned>(
    client: &Client,
    session: &SessionContext,
    url: Url,
) -> Result<T, SourceError> {
    debug!(%url, "GET");
    let response = session
        .authorize(client.get(url))
        .send()
        .await
        .map_err(|e| SourceError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::NotFound(status.to_string()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| SourceError::Transport(e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| SourceError::Malformed(e.to_string()))
}
