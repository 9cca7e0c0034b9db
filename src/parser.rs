//! JSON decoding for ranking documents and the index.

use crate::error::Result;
use crate::index::Index;
use crate::model::RankingDocument;

/// Decodes a [`RankingDocument`] from raw bytes.
///
/// # Errors
///
/// Returns [`crate::error::RankingError::Malformed`] if the bytes are not a
/// valid ranking document.
pub fn parse_ranking(bytes: &[u8]) -> Result<RankingDocument> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decodes the year/phase [`Index`] from raw bytes.
pub fn parse_index(bytes: &[u8]) -> Result<Index> {
    Ok(serde_json::from_slice(bytes)?)
}
