use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::error::{Error, ErrorKind};
use mongodb::options::{ClientOptions, FindOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};

use crate::config::StoreConfig;
use crate::database::models::score_entry::{DecodeError, ScoreDocument, ScoreEntry};
use crate::database::{reject_empty_limit, EntryId, RankedFold, ScoreStore, StoreContext, StoreError};
use crate::observability::QueryObserver;

pub struct MongoScoreStore {
    client: Client,
    scores: Collection<ScoreDocument>,
    observer: Arc<dyn QueryObserver>,
}

impl MongoScoreStore {
    pub async fn connect(config: &StoreConfig, observer: Arc<dyn QueryObserver>) -> anyhow::Result<Self> {
        let mut options = ClientOptions::parse(&config.mongo_url)
            .await
            .context("parsing mongo connection string")?;
        options.app_name = Some(config.app_name.clone());
        options.server_selection_timeout = Some(Duration::from_millis(config.server_selection_timeout_ms));
        let client = Client::with_options(options).context("building mongo client")?;
        let scores = client
            .database(&config.database)
            .collection::<ScoreDocument>(ScoreDocument::get_collection_name());

        // serves the ranked query without an in-memory sort
        let rank_index = IndexModel::builder()
            .keys(Self::rank_order())
            .options(IndexOptions::builder().name(String::from("score_rank")).build())
            .build();
        scores
            .create_index(rank_index, None)
            .await
            .context("creating score ranking index")?;
        info!("Connected to mongo database '{}'", config.database);

        Ok(MongoScoreStore { client, scores, observer })
    }

    fn rank_order() -> mongodb::bson::Document {
        doc! { "score": -1, "timestamp": 1, "_id": 1 }
    }

    fn classify(ctx: &StoreContext, operation: &'static str, error: Error) -> StoreError {
        let reason = error.to_string();
        debug!("[{}] {} failed: {}", ctx.request_id, operation, reason);
        match *error.kind {
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::ConnectionPoolCleared { .. }
            | ErrorKind::DnsResolve { .. } => StoreError::Unavailable(reason),
            _ => StoreError::Rejected(reason),
        }
    }
}

#[async_trait]
impl ScoreStore for MongoScoreStore {
    async fn insert(&self, ctx: &StoreContext, entry: ScoreEntry) -> Result<EntryId, StoreError> {
        ctx.bound("insert", async {
            let result = self
                .scores
                .insert_one(ScoreDocument::from(&entry), None)
                .await
                .map_err(|e| Self::classify(ctx, "insert", e))?;
            result
                .inserted_id
                .as_object_id()
                .map(EntryId::from)
                .ok_or_else(|| StoreError::Rejected(format!("unexpected generated id {}", result.inserted_id)))
        })
        .await
    }

    async fn query_top_n(&self, ctx: &StoreContext, limit: u32) -> Result<Vec<ScoreEntry>, StoreError> {
        reject_empty_limit(limit)?;
        ctx.bound("query_top_n", async {
            let find_options = FindOptions::builder()
                .sort(Self::rank_order())
                .limit(i64::from(limit))
                .build();
            let mut cursor = self
                .scores
                .find(doc! {}, find_options)
                .await
                .map_err(|e| Self::classify(ctx, "query_top_n", e))?;

            let mut fold = RankedFold::new(ctx, limit);
            while cursor
                .advance()
                .await
                .map_err(|e| Self::classify(ctx, "query_top_n", e))?
            {
                let decoded = cursor
                    .deserialize_current()
                    .map_err(|e| DecodeError::Malformed(e.to_string()))
                    .and_then(ScoreEntry::try_from);
                fold = fold.push(decoded);
            }
            Ok(fold.finish(self.observer.as_ref()))
        })
        .await
    }

    async fn close(&self) {
        info!("Closing mongo client...");
        self.client.clone().shutdown().await;
        info!("Mongo client closed");
    }
}
