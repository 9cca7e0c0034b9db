//! Where ranking documents and the index come from.
//!
//! [`RankingSource`] and [`IndexSource`] are the seams the aggregator and the
//! CLI consume. [`HttpSource`] reads the published data over HTTP,
//! [`FileSource`] reads a local mirror with the same layout.

mod file;
mod http;

pub use file::FileSource;
pub use http::HttpSource;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::index::Index;
use crate::model::RankingDocument;

/// Public output of the PoliNetwork rankings scraper.
pub const DEFAULT_BASE_URL: &str =
    "https://raw.githubusercontent.com/PoliNetworkOrg/GraduatorieScriptCSharp/main/data/output";

pub const DEFAULT_INDEX_PATH: &str = "index.json";

/// Loads one ranking document per (school, year, phase).
#[async_trait]
pub trait RankingSource: Send + Sync {
    /// `phase` is the phase link as listed in the [`Index`].
    ///
    /// # Errors
    ///
    /// [`crate::error::RankingError::NotFound`] if nothing is published there,
    /// [`crate::error::RankingError::Transient`] on retrieval failure.
    async fn load_ranking(&self, school: &str, year: u16, phase: &str)
        -> Result<Arc<RankingDocument>>;
}

/// Loads the year/phase index.
#[async_trait]
pub trait IndexSource: Send + Sync {
    async fn load_index(&self) -> Result<Index>;
}

#[async_trait]
impl<S: RankingSource + ?Sized> RankingSource for Arc<S> {
    async fn load_ranking(
        &self,
        school: &str,
        year: u16,
        phase: &str,
    ) -> Result<Arc<RankingDocument>> {
        (**self).load_ranking(school, year, phase).await
    }
}

#[async_trait]
impl<S: IndexSource + ?Sized> IndexSource for Arc<S> {
    async fn load_index(&self) -> Result<Index> {
        (**self).load_index().await
    }
}

/// Relative location of a ranking: `<school>/<year>/<phase link>.json`.
pub fn ranking_path(school: &str, year: u16, phase: &str) -> String {
    let phase = phase.trim_start_matches('/');
    if phase.ends_with(".json") {
        format!("{school}/{year}/{phase}")
    } else {
        format!("{school}/{year}/{phase}.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_path_appends_extension_once() {
        assert_eq!(ranking_path("Design", 2023, "prima"), "Design/2023/prima.json");
        assert_eq!(
            ranking_path("Design", 2023, "/prima.json"),
            "Design/2023/prima.json"
        );
    }
}
