#[macro_use]
extern crate rocket;
#[macro_use]
extern crate log;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use crate::config::{ApiConfig, StoreBackend};
use crate::database::memory::MemoryScoreStore;
use crate::database::mongo::MongoScoreStore;
use crate::database::{ScoreStore, StoreContext};
use crate::leaderboard::{LeaderboardLimits, LeaderboardService};
use crate::observability::SkipCounter;

mod config;
mod database;
mod http;
mod leaderboard;
mod observability;
mod util;

pub struct DriftMinerState {
    pub leaderboard: LeaderboardService,
    pub request_timeout: Duration,
    pub shutdown: CancellationToken,
}

impl DriftMinerState {
    pub fn new(leaderboard: LeaderboardService, request_timeout: Duration, shutdown: CancellationToken) -> Self {
        DriftMinerState { leaderboard, request_timeout, shutdown }
    }

    pub fn store_context(&self) -> StoreContext {
        StoreContext::new(self.request_timeout, self.shutdown.child_token())
    }
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::load().await.context("loading configuration")?;
    observability::setup_logger(&config.log_level)?;
    info!("Starting Drift Miner Backend ({} environment)", config.app_env);

    let skip_counter = Arc::new(SkipCounter::default());
    let store: Arc<dyn ScoreStore> = match config.store.resolve_backend(config.app_env) {
        StoreBackend::Mongo => Arc::new(MongoScoreStore::connect(&config.store, skip_counter.clone()).await?),
        StoreBackend::Memory => {
            warn!("Using the in-memory score store, scores will not survive a restart");
            Arc::new(MemoryScoreStore::new(skip_counter.clone()))
        }
    };

    let shutdown = CancellationToken::new();
    let state = DriftMinerState::new(
        LeaderboardService::new(store.clone(), LeaderboardLimits::from(&config.leaderboard)),
        Duration::from_millis(config.leaderboard.request_timeout_ms),
        shutdown.clone(),
    );

    info!("Drift Miner Backend listening on port {}", config.listen_port);
    let launched = http::build(state, config.listen_port).launch().await;

    shutdown.cancel();
    store.close().await;
    info!("Shut down, {} undecodable score record(s) skipped", skip_counter.skipped());
    if let Err(e) = launched {
        error!("Http server failed: {}", e);
        return Err(anyhow::anyhow!("http server failed"));
    }
    Ok(())
}
