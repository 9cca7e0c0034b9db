use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use super::{IndexSource, RankingSource, ranking_path};
use crate::error::Result;
use crate::index::Index;
use crate::model::RankingDocument;
use crate::parser::{parse_index, parse_ranking};

/// Reads rankings from a local directory laid out like the published data.
pub struct FileSource {
    root: PathBuf,
    index_path: String,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>, index_path: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            index_path: index_path.into(),
        }
    }
}

#[async_trait]
impl RankingSource for FileSource {
    #[tracing::instrument(skip(self))]
    async fn load_ranking(
        &self,
        school: &str,
        year: u16,
        phase: &str,
    ) -> Result<Arc<RankingDocument>> {
        let path = self.root.join(ranking_path(school, year, phase));
        let bytes = tokio::fs::read(&path).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "Ranking read");
        Ok(Arc::new(parse_ranking(&bytes)?))
    }
}

#[async_trait]
impl IndexSource for FileSource {
    async fn load_index(&self) -> Result<Index> {
        let path = self.root.join(&self.index_path);
        let bytes = tokio::fs::read(&path).await?;
        parse_index(&bytes)
    }
}
