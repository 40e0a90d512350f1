use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::config::LeaderboardConfig;
use crate::database::models::score_entry::ScoreEntry;
use crate::database::{EntryId, ScoreStore, StoreContext, StoreError};
use crate::util::time::ceil_to_millis;
use crate::util::validation::is_blank;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("username must not be empty")]
    InvalidUsername,
    #[error("score must not be negative")]
    InvalidScore,
    #[error("user id must not be empty")]
    InvalidUserId,
    #[error("limit must be at least 1")]
    InvalidLimit,
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

/// A submission as decoded from the client, before any checks.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct UnvalidatedScoreEntry {
    pub user_id: String,
    pub username: String,
    pub score: i64,
    pub level: u32,
    pub platform: String,
    /// Accepted on the wire but always replaced by the server clock.
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy)]
pub struct LeaderboardLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl From<&LeaderboardConfig> for LeaderboardLimits {
    fn from(config: &LeaderboardConfig) -> Self {
        LeaderboardLimits {
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        }
    }
}

pub struct LeaderboardService {
    store: Arc<dyn ScoreStore>,
    limits: LeaderboardLimits,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn ScoreStore>, limits: LeaderboardLimits) -> Self {
        LeaderboardService { store, limits }
    }

    pub async fn submit_score(
        &self,
        ctx: &StoreContext,
        candidate: UnvalidatedScoreEntry,
        now: DateTime<Utc>,
    ) -> Result<EntryId, SubmissionError> {
        let entry = Self::validate(candidate, now)?;
        let (user_id, score) = (entry.user_id.clone(), entry.score);
        match self.store.insert(ctx, entry).await {
            Ok(id) => {
                info!("[{}] Recorded score {} for {} as entry {}", ctx.request_id, score, user_id, id);
                Ok(id)
            }
            Err(e) => {
                warn!("[{}] insert of score for {} failed: {}", ctx.request_id, user_id, e);
                Err(SubmissionError::Persistence(e))
            }
        }
    }

    pub async fn get_leaderboard(
        &self,
        ctx: &StoreContext,
        requested: Option<u32>,
    ) -> Result<Vec<ScoreEntry>, SubmissionError> {
        let limit = self.resolve_limit(requested)?;
        self.store.query_top_n(ctx, limit).await.map_err(|e| {
            warn!("[{}] query_top_n (limit {}) failed: {}", ctx.request_id, limit, e);
            SubmissionError::Persistence(e)
        })
    }

    pub fn resolve_limit(&self, requested: Option<u32>) -> Result<u32, SubmissionError> {
        match requested {
            None => Ok(self.limits.default_limit),
            Some(0) => Err(SubmissionError::InvalidLimit),
            Some(limit) => Ok(limit.min(self.limits.max_limit)),
        }
    }

    // first failing rule wins; nothing here touches the store
    fn validate(candidate: UnvalidatedScoreEntry, now: DateTime<Utc>) -> Result<ScoreEntry, SubmissionError> {
        if is_blank(&candidate.username) {
            return Err(SubmissionError::InvalidUsername);
        }
        if candidate.score < 0 {
            return Err(SubmissionError::InvalidScore);
        }
        if is_blank(&candidate.user_id) {
            return Err(SubmissionError::InvalidUserId);
        }
        if let Some(claimed) = candidate.timestamp {
            debug!("Discarding client timestamp {} for {}", claimed, candidate.user_id);
        }
        Ok(ScoreEntry {
            user_id: candidate.user_id,
            username: candidate.username,
            score: candidate.score,
            level: candidate.level,
            timestamp: ceil_to_millis(now),
            platform: candidate.platform,
        })
    }
}
