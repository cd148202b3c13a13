mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use reqwest::{StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use crate::error::{ClientError, ClientResult, PayloadError};

/// Issues a single GET and decodes the JSON body.
///
/// Transport failures and non-success statuses become
/// [`ClientError::Network`]; a success body that is not JSON becomes
/// [`ClientError::Malformed`]. No retries.
pub async fn fetch_json<C: HttpClient + ?Sized>(client: &C, url: Url) -> ClientResult<Value> {
    let resp = client
        .get_json(url.clone())
        .await
        .map_err(|e| ClientError::transport(&url, e))?;
    let status = resp.status();
    let body = resp
        .bytes()
        .await
        .map_err(|e| ClientError::transport(&url, e))?;

    debug!(%url, status = status.as_u16(), bytes = body.len(), "Response received");
    decode_body(status, &body, url.path())
}

/// Turns a status and raw body into JSON or a typed failure.
pub fn decode_body(status: StatusCode, body: &[u8], endpoint: &str) -> ClientResult<Value> {
    if !status.is_success() {
        return Err(ClientError::from_status(status, body));
    }

    serde_json::from_slice(body)
        .map_err(|e| ClientError::malformed(endpoint, PayloadError::InvalidJson(e)))
}
