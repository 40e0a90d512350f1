use std::fmt::{self, Display};
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::database::models::score_entry::{DecodeError, ScoreEntry};
use crate::observability::QueryObserver;
use crate::util::validation::verbose_result_ok;

pub mod memory;
pub mod models;
pub mod mongo;
#[cfg(test)]
pub mod testing;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("score store is unavailable: {0}")]
    Unavailable(String),
    #[error("score store rejected the operation: {0}")]
    Rejected(String),
    #[error("score store call exceeded its deadline")]
    Timeout,
    #[error("score store call was cancelled")]
    Cancelled,
}

/// Store-generated identifier of a persisted entry. Never exposed over the API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryId(String);

impl From<ObjectId> for EntryId {
    fn from(id: ObjectId) -> Self {
        EntryId(id.to_hex())
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deadline and cancellation signal inherited from the request that triggered a store call.
#[derive(Debug, Clone)]
pub struct StoreContext {
    pub request_id: Uuid,
    deadline: Instant,
    cancellation: CancellationToken,
}

impl StoreContext {
    pub fn new(timeout: Duration, cancellation: CancellationToken) -> Self {
        StoreContext {
            request_id: Uuid::new_v4(),
            deadline: Instant::now() + timeout,
            cancellation,
        }
    }

    #[cfg(test)]
    pub fn detached(timeout: Duration) -> Self {
        Self::new(timeout, CancellationToken::new())
    }

    #[cfg(test)]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Runs a store operation until it completes, the deadline passes, or the request is cancelled.
    pub async fn bound<T, F>(&self, operation: &'static str, future: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        if self.cancellation.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => {
                debug!("[{}] {} cancelled by request", self.request_id, operation);
                Err(StoreError::Cancelled)
            }
            result = tokio::time::timeout_at(self.deadline, future) => match result {
                Ok(result) => result,
                Err(_) => {
                    warn!("[{}] {} exceeded its deadline", self.request_id, operation);
                    Err(StoreError::Timeout)
                }
            }
        }
    }
}

#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Appends a validated entry. Every call creates a new record.
    async fn insert(&self, ctx: &StoreContext, entry: ScoreEntry) -> Result<EntryId, StoreError>;

    /// At most `limit` entries ordered by score descending, then earliest timestamp,
    /// then entry id. Records that fail to decode are skipped and reported.
    async fn query_top_n(&self, ctx: &StoreContext, limit: u32) -> Result<Vec<ScoreEntry>, StoreError>;

    async fn close(&self);
}

// entries are pushed as they are read, so the caller's limit is only a hint
const FOLD_CAPACITY_HINT: usize = 64;

/// Accumulates ranked entries while counting the records that failed to decode.
pub struct RankedFold {
    request_id: Uuid,
    entries: Vec<ScoreEntry>,
    skipped: u64,
}

impl RankedFold {
    pub fn new(ctx: &StoreContext, limit: u32) -> Self {
        RankedFold {
            request_id: ctx.request_id,
            entries: Vec::with_capacity((limit as usize).min(FOLD_CAPACITY_HINT)),
            skipped: 0,
        }
    }

    pub fn push(mut self, decoded: Result<ScoreEntry, DecodeError>) -> Self {
        let position = self.entries.len() + self.skipped as usize;
        let request_id = self.request_id;
        match verbose_result_ok(
            || format!("[{}] Skipping undecodable score record at rank {}", request_id, position + 1),
            decoded,
        ) {
            Some(entry) => self.entries.push(entry),
            None => self.skipped += 1,
        }
        self
    }

    pub fn finish(self, observer: &dyn QueryObserver) -> Vec<ScoreEntry> {
        if self.skipped > 0 {
            observer.records_skipped("query_top_n", self.skipped);
        }
        self.entries
    }
}

pub(crate) fn reject_empty_limit(limit: u32) -> Result<(), StoreError> {
    if limit == 0 {
        return Err(StoreError::Rejected(String::from("limit must be at least 1")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::observability::SkipCounter;

    #[tokio::test]
    async fn bound_passes_results_through() {
        let ctx = StoreContext::detached(Duration::from_secs(1));
        assert_eq!(ctx.bound("noop", async { Ok(7) }).await, Ok(7));
        let failed: Result<(), StoreError> = ctx.bound("noop", async { Err(StoreError::Rejected(String::from("quota"))) }).await;
        assert_eq!(failed, Err(StoreError::Rejected(String::from("quota"))));
    }

    #[tokio::test]
    async fn bound_times_out_slow_calls() {
        let ctx = StoreContext::detached(Duration::from_millis(20));
        let slow = ctx.bound("slow", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        });
        assert_eq!(slow.await, Err(StoreError::Timeout));
    }

    #[tokio::test]
    async fn bound_refuses_already_cancelled_requests() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = StoreContext::new(Duration::from_secs(1), token);
        assert_eq!(ctx.bound("fast", async { Ok(()) }).await, Err(StoreError::Cancelled));
    }

    #[tokio::test]
    async fn bound_aborts_when_cancelled_mid_call() {
        let token = CancellationToken::new();
        let ctx = StoreContext::new(Duration::from_secs(10), token.clone());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });
        let pending = ctx.bound("hanging", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        });
        assert_eq!(pending.await, Err(StoreError::Cancelled));
    }

    #[test]
    fn fold_keeps_order_and_counts_skips() {
        let ctx = StoreContext::detached(Duration::from_secs(1));
        let make = |score| ScoreEntry {
            user_id: String::from("uid"),
            username: String::from("Ada"),
            score,
            level: 0,
            timestamp: Utc::now(),
            platform: String::new(),
        };
        let observer = Arc::new(SkipCounter::default());
        let entries = vec![
            Ok(make(30)),
            Err(DecodeError::Invariant("score")),
            Ok(make(20)),
            Err(DecodeError::Malformed(String::from("truncated"))),
        ]
        .into_iter()
        .fold(RankedFold::new(&ctx, 4), RankedFold::push)
        .finish(observer.as_ref());

        assert_eq!(entries.iter().map(|e| e.score).collect::<Vec<_>>(), vec![30, 20]);
        assert_eq!(observer.skipped(), 2);
    }

    #[test]
    fn fold_capacity_does_not_follow_huge_limits() {
        let ctx = StoreContext::detached(Duration::from_secs(1));
        let fold = RankedFold::new(&ctx, u32::MAX);
        assert!(fold.entries.capacity() < 1024);
        assert!(fold.finish(&SkipCounter::default()).is_empty());
    }

    #[test]
    fn entry_ids_are_object_id_hex() {
        let id = ObjectId::new();
        assert_eq!(EntryId::from(id).to_string(), id.to_hex());
    }
}
