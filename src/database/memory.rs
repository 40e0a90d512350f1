use std::cmp::Reverse;
use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::{self, oid::ObjectId, Bson, Document};
use tokio::sync::RwLock;

use crate::database::models::score_entry::{ScoreDocument, ScoreEntry};
use crate::database::{reject_empty_limit, EntryId, RankedFold, ScoreStore, StoreContext, StoreError};
use crate::observability::QueryObserver;

/// In-process document list ranked the same way as the `scores` collection.
pub struct MemoryScoreStore {
    documents: RwLock<Vec<Document>>,
    observer: Arc<dyn QueryObserver>,
}

type RankKey = (Reverse<u8>, Reverse<i64>, i64, [u8; 12]);

impl MemoryScoreStore {
    pub fn new(observer: Arc<dyn QueryObserver>) -> Self {
        MemoryScoreStore {
            documents: RwLock::new(Vec::new()),
            observer,
        }
    }

    // mirrors BSON sort order under a descending sort: types above numbers (strings,
    // objects, dates...) come first, numbers next, missing or null scores last
    fn rank_key(document: &Document) -> RankKey {
        let (class, score) = match document.get("score") {
            None | Some(Bson::Null) | Some(Bson::MinKey) => (0, 0),
            Some(Bson::Int64(score)) => (1, *score),
            Some(Bson::Int32(score)) => (1, i64::from(*score)),
            Some(Bson::Double(score)) => (1, *score as i64),
            Some(_) => (2, 0),
        };
        let timestamp = document
            .get_datetime("timestamp")
            .map(|timestamp| timestamp.timestamp_millis())
            .unwrap_or(i64::MAX);
        let id = document
            .get_object_id("_id")
            .map(|id| id.bytes())
            .unwrap_or([0xff; 12]);
        (Reverse(class), Reverse(score), timestamp, id)
    }

    #[cfg(test)]
    pub async fn insert_raw(&self, mut document: Document) -> EntryId {
        let id = ObjectId::new();
        document.insert("_id", id);
        self.documents.write().await.push(document);
        EntryId::from(id)
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }
}

#[async_trait]
impl ScoreStore for MemoryScoreStore {
    async fn insert(&self, ctx: &StoreContext, entry: ScoreEntry) -> Result<EntryId, StoreError> {
        ctx.bound("insert", async {
            let mut document = bson::to_document(&ScoreDocument::from(&entry))
                .map_err(|e| StoreError::Rejected(e.to_string()))?;
            let id = ObjectId::new();
            document.insert("_id", id);
            self.documents.write().await.push(document);
            Ok(EntryId::from(id))
        })
        .await
    }

    async fn query_top_n(&self, ctx: &StoreContext, limit: u32) -> Result<Vec<ScoreEntry>, StoreError> {
        reject_empty_limit(limit)?;
        ctx.bound("query_top_n", async {
            let mut ranked: Vec<(RankKey, Document)> = {
                let documents = self.documents.read().await;
                documents
                    .iter()
                    .map(|document| (Self::rank_key(document), document.clone()))
                    .collect()
            };
            ranked.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(ranked
                .into_iter()
                .take(limit as usize)
                .map(|(_, document)| ScoreDocument::decode(document))
                .fold(RankedFold::new(ctx, limit), RankedFold::push)
                .finish(self.observer.as_ref()))
        })
        .await
    }

    async fn close(&self) {
        let retained = self.documents.read().await.len();
        info!("Closing in-memory score store, {} entries discarded", retained);
    }
}
