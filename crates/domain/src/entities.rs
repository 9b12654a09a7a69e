use crate::models::ModCommentContentType;
use chrono::{DateTime, Utc};

/// A mod hosted by this application (non-legacy mode).
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMod {
    pub id: i64,
    pub name: String,
    pub summary: String,
    pub url_alias: Option<String>,
    pub description: Option<String>,
    pub time_created_utc: DateTime<Utc>,
    pub time_updated_utc: DateTime<Utc>,
    pub tags: Vec<String>,
    pub comment_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalModComment {
    pub id: i64,
    pub mod_id: i64,
    pub author: String,
    pub comment: String,
    pub content_type: ModCommentContentType,
    pub time_created_utc: DateTime<Utc>,
    pub time_updated_utc: Option<DateTime<Utc>>,
}

/// File metadata; the bytes live in the storage provider under `asset_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub id: i64,
    pub file_name: String,
    pub content_type: String,
    pub asset_path: String,
}
