use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{IndexSource, RankingSource, ranking_path};
use crate::error::Result;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::index::Index;
use crate::model::RankingDocument;
use crate::parser::{parse_index, parse_ranking};

/// Reads rankings over HTTP from a base URL.
pub struct HttpSource<C> {
    client: C,
    base_url: String,
    index_path: String,
}

impl<C: HttpClient> HttpSource<C> {
    pub fn new(client: C, base_url: impl Into<String>, index_path: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            index_path: index_path.into(),
        }
    }

    fn url(&self, relative: &str) -> String {
        format!("{}/{}", self.base_url, relative.trim_start_matches('/'))
    }

    pub fn ranking_url(&self, school: &str, year: u16, phase: &str) -> String {
        self.url(&ranking_path(school, year, phase))
    }
}

#[async_trait]
impl<C: HttpClient> RankingSource for HttpSource<C> {
    #[tracing::instrument(skip(self))]
    async fn load_ranking(
        &self,
        school: &str,
        year: u16,
        phase: &str,
    ) -> Result<Arc<RankingDocument>> {
        let url = self.ranking_url(school, year, phase);
        let bytes = fetch_bytes(&self.client, &url).await?;
        debug!(bytes = bytes.len(), "Ranking bytes received, parsing");
        Ok(Arc::new(parse_ranking(&bytes)?))
    }
}

#[async_trait]
impl<C: HttpClient> IndexSource for HttpSource<C> {
    #[tracing::instrument(skip(self))]
    async fn load_index(&self) -> Result<Index> {
        let bytes = fetch_bytes(&self.client, &self.url(&self.index_path)).await?;
        parse_index(&bytes)
    }
}
