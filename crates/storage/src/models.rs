use chrono::{DateTime, Utc};
use domain::{
    AccountLinkRequest, LocalMod, LocalModComment, ModCommentContentType, StoredAsset, User,
};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct SqlLinkRequest {
    pub username: String,
    pub email: String,
    pub link_token: String,
    pub secret: String,
    pub time_created_utc: DateTime<Utc>,
    pub time_verified_utc: Option<DateTime<Utc>>,
}

impl From<SqlLinkRequest> for AccountLinkRequest {
    fn from(sql: SqlLinkRequest) -> Self {
        AccountLinkRequest {
            username: sql.username,
            email: sql.email,
            link_token: sql.link_token,
            secret: sql.secret,
            time_created_utc: sql.time_created_utc,
            time_verified_utc: sql.time_verified_utc,
        }
    }
}

#[derive(FromRow)]
pub struct SqlUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub mod_db_user_id: Option<i64>,
    pub time_created_utc: DateTime<Utc>,
}

impl From<SqlUser> for User {
    fn from(sql: SqlUser) -> Self {
        User {
            id: sql.id,
            username: sql.username,
            email: sql.email,
            password_hash: sql.password_hash,
            mod_db_user_id: sql.mod_db_user_id,
            time_created_utc: sql.time_created_utc,
        }
    }
}

// tags 需要单独查询后再填充
#[derive(FromRow)]
pub struct SqlMod {
    pub id: i64,
    pub name: String,
    pub summary: String,
    pub url_alias: Option<String>,
    pub description: Option<String>,
    pub time_created_utc: DateTime<Utc>,
    pub time_updated_utc: DateTime<Utc>,
    pub comment_count: i64,
}

impl SqlMod {
    pub fn into_mod(self, tags: Vec<String>) -> LocalMod {
        LocalMod {
            id: self.id,
            name: self.name,
            summary: self.summary,
            url_alias: self.url_alias,
            description: self.description,
            time_created_utc: self.time_created_utc,
            time_updated_utc: self.time_updated_utc,
            tags,
            comment_count: self.comment_count,
        }
    }
}

#[derive(FromRow)]
pub struct SqlModComment {
    pub id: i64,
    pub mod_id: i64,
    pub author: String,
    pub comment: String,
    pub content_type: String,
    pub time_created_utc: DateTime<Utc>,
    pub time_updated_utc: Option<DateTime<Utc>>,
}

impl From<SqlModComment> for LocalModComment {
    fn from(sql: SqlModComment) -> Self {
        LocalModComment {
            id: sql.id,
            mod_id: sql.mod_id,
            author: sql.author,
            comment: sql.comment,
            content_type: ModCommentContentType::parse(&sql.content_type),
            time_created_utc: sql.time_created_utc,
            time_updated_utc: sql.time_updated_utc,
        }
    }
}

#[derive(FromRow)]
pub struct SqlAsset {
    pub id: i64,
    pub file_name: String,
    pub content_type: String,
    pub asset_path: String,
}

impl From<SqlAsset> for StoredAsset {
    fn from(sql: SqlAsset) -> Self {
        StoredAsset {
            id: sql.id,
            file_name: sql.file_name,
            content_type: sql.content_type,
            asset_path: sql.asset_path,
        }
    }
}
