use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::time::{from_bson_datetime, to_bson_datetime};
use crate::util::validation::is_blank;

/// One finished game session, as served on the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub user_id: String,
    pub username: String,
    pub score: i64,
    pub level: u32,
    pub timestamp: DateTime<Utc>,
    pub platform: String,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed score document: {0}")]
    Malformed(String),
    #[error("score document field `{0}` is out of range")]
    Invariant(&'static str),
}

/// Persisted layout of a [`ScoreEntry`] in the `scores` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub username: String,
    pub score: i64,
    pub level: i64,
    pub timestamp: bson::DateTime,
    #[serde(default)]
    pub platform: String,
}

impl ScoreDocument {
    pub fn get_collection_name() -> &'static str {
        "scores"
    }

    pub fn decode(document: bson::Document) -> Result<ScoreEntry, DecodeError> {
        bson::from_document::<ScoreDocument>(document)
            .map_err(|e| DecodeError::Malformed(e.to_string()))
            .and_then(ScoreEntry::try_from)
    }
}

impl From<&ScoreEntry> for ScoreDocument {
    fn from(entry: &ScoreEntry) -> Self {
        ScoreDocument {
            id: None,
            user_id: entry.user_id.clone(),
            username: entry.username.clone(),
            score: entry.score,
            level: i64::from(entry.level),
            timestamp: to_bson_datetime(&entry.timestamp),
            platform: entry.platform.clone(),
        }
    }
}

impl TryFrom<ScoreDocument> for ScoreEntry {
    type Error = DecodeError;

    fn try_from(document: ScoreDocument) -> Result<Self, Self::Error> {
        if is_blank(&document.user_id) {
            return Err(DecodeError::Invariant("user_id"));
        }
        if is_blank(&document.username) {
            return Err(DecodeError::Invariant("username"));
        }
        if document.score < 0 {
            return Err(DecodeError::Invariant("score"));
        }
        let level = u32::try_from(document.level).map_err(|_| DecodeError::Invariant("level"))?;
        let timestamp = from_bson_datetime(document.timestamp).ok_or(DecodeError::Invariant("timestamp"))?;
        Ok(ScoreEntry {
            user_id: document.user_id,
            username: document.username,
            score: document.score,
            level,
            timestamp,
            platform: document.platform,
        })
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;

    use super::*;
    use crate::util::time::ceil_to_millis;

    fn entry() -> ScoreEntry {
        ScoreEntry {
            user_id: String::from("uid-1"),
            username: String::from("Ada"),
            score: 120,
            level: 3,
            timestamp: ceil_to_millis(Utc::now()),
            platform: String::from("android"),
        }
    }

    #[test]
    fn document_layout_uses_named_fields() {
        let document = bson::to_document(&ScoreDocument::from(&entry())).unwrap();
        for field in ["user_id", "username", "score", "level", "timestamp", "platform"] {
            assert!(document.contains_key(field), "missing {}", field);
        }
        assert!(!document.contains_key("_id"));
        assert!(document.get_datetime("timestamp").is_ok());
    }

    #[test]
    fn stored_document_decodes_back() {
        let original = entry();
        let mut document = bson::to_document(&ScoreDocument::from(&original)).unwrap();
        document.insert("_id", ObjectId::new());
        assert_eq!(ScoreDocument::decode(document).unwrap(), original);
    }

    #[test]
    fn missing_platform_defaults_to_empty() {
        let document = doc! {
            "user_id": "uid-1",
            "username": "Ada",
            "score": 10_i64,
            "level": 1_i64,
            "timestamp": bson::DateTime::now(),
        };
        assert_eq!(ScoreDocument::decode(document).unwrap().platform, "");
    }

    #[test]
    fn partial_document_is_malformed() {
        let document = doc! { "username": "Ada", "score": "lots" };
        assert!(matches!(ScoreDocument::decode(document), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn out_of_range_fields_violate_invariants() {
        let base = bson::to_document(&ScoreDocument::from(&entry())).unwrap();

        let mut negative = base.clone();
        negative.insert("score", -5_i64);
        assert!(matches!(ScoreDocument::decode(negative), Err(DecodeError::Invariant("score"))));

        let mut nameless = base.clone();
        nameless.insert("username", "");
        assert!(matches!(ScoreDocument::decode(nameless), Err(DecodeError::Invariant("username"))));

        let mut anonymous = base.clone();
        anonymous.insert("user_id", "");
        assert!(matches!(ScoreDocument::decode(anonymous), Err(DecodeError::Invariant("user_id"))));

        let mut sunken = base;
        sunken.insert("level", -1_i64);
        assert!(matches!(ScoreDocument::decode(sunken), Err(DecodeError::Invariant("level"))));
    }
}
