mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use crate::error::{RankingError, Result};
use tracing::debug;

/// Issues a GET through `client` and returns the body.
///
/// A 404 maps to [`RankingError::NotFound`]; any other failure is transient.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Vec<u8>> {
    let parsed = url
        .parse::<reqwest::Url>()
        .map_err(|e| RankingError::Transient(format!("invalid url '{url}': {e}")))?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?;
    let status = resp.status();
    debug!(url, status = status.as_u16(), "Fetched");

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(RankingError::NotFound(url.to_string()));
    }
    if !status.is_success() {
        return Err(RankingError::Transient(format!(
            "GET {url} returned status {status}"
        )));
    }

    Ok(resp.bytes().await?.to_vec())
}
