use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::database::memory::MemoryScoreStore;
use crate::database::models::score_entry::ScoreEntry;
use crate::database::{EntryId, ScoreStore, StoreContext, StoreError};
use crate::observability::SkipCounter;

/// Memory store that records how often each operation was invoked.
pub struct CountingStore {
    pub inner: MemoryScoreStore,
    pub inserts: AtomicUsize,
    pub queries: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(CountingStore {
            inner: MemoryScoreStore::new(Arc::new(SkipCounter::default())),
            inserts: AtomicUsize::new(0),
            queries: AtomicUsize::new(0),
        })
    }

    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScoreStore for CountingStore {
    async fn insert(&self, ctx: &StoreContext, entry: ScoreEntry) -> Result<EntryId, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(ctx, entry).await
    }

    async fn query_top_n(&self, ctx: &StoreContext, limit: u32) -> Result<Vec<ScoreEntry>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query_top_n(ctx, limit).await
    }

    async fn close(&self) {
        self.inner.close().await
    }
}

/// Store whose every call fails with the configured error.
pub struct FailingStore(pub StoreError);

#[async_trait]
impl ScoreStore for FailingStore {
    async fn insert(&self, _ctx: &StoreContext, _entry: ScoreEntry) -> Result<EntryId, StoreError> {
        Err(self.0.clone())
    }

    async fn query_top_n(&self, _ctx: &StoreContext, _limit: u32) -> Result<Vec<ScoreEntry>, StoreError> {
        Err(self.0.clone())
    }

    async fn close(&self) {}
}
