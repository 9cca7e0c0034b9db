//! In-memory caches for loaded rankings and the index.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::Result;
use crate::index::Index;
use crate::model::RankingDocument;
use crate::sources::{IndexSource, RankingSource};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RankingKey {
    pub school: String,
    pub year: u16,
    pub phase: String,
}

impl RankingKey {
    pub fn new(school: &str, year: u16, phase: &str) -> Self {
        Self {
            school: school.to_string(),
            year,
            phase: phase.to_string(),
        }
    }
}

/// A [`RankingSource`] wrapper that keeps every successfully loaded document.
///
/// Failures are not cached. Two concurrent misses on the same key may both
/// reach the inner source; the first stored document wins.
pub struct RankingCache<S> {
    inner: S,
    entries: Mutex<HashMap<RankingKey, Arc<RankingDocument>>>,
}

impl<S> RankingCache<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RankingKey, Arc<RankingDocument>>> {
        // A poisoned map still holds only complete documents.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, key: &RankingKey) -> bool {
        self.lock().contains_key(key)
    }

    pub fn invalidate(&self, key: &RankingKey) -> bool {
        self.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[async_trait]
impl<S: RankingSource> RankingSource for RankingCache<S> {
    async fn load_ranking(
        &self,
        school: &str,
        year: u16,
        phase: &str,
    ) -> Result<Arc<RankingDocument>> {
        let key = RankingKey::new(school, year, phase);
        let cached = self.lock().get(&key).cloned();
        if let Some(doc) = cached {
            debug!(school, year, phase, "Ranking cache hit");
            return Ok(doc);
        }

        let doc = self.inner.load_ranking(school, year, phase).await?;
        let stored = self.lock().entry(key).or_insert(doc).clone();
        Ok(stored)
    }
}

/// Loads the index once and hands out the same copy afterwards.
pub struct IndexCache<S> {
    inner: S,
    cell: OnceCell<Index>,
}

impl<S: IndexSource> IndexCache<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cell: OnceCell::new(),
        }
    }

    pub async fn get(&self) -> Result<&Index> {
        self.cell.get_or_try_init(|| self.inner.load_index()).await
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}
