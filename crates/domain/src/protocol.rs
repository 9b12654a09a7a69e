//! Wire format of the legacy ModDB API.
//!
//! Property names are lowercase without separators (`modid`, `urlalias`),
//! timestamps use `yyyy-MM-dd HH:mm:ss` without a zone and are read as UTC,
//! and every payload carries a `statuscode` where `"200"` means success.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const LEGACY_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const LEGACY_SUCCESS_STATUS: &str = "200";

pub fn parse_legacy_datetime(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), LEGACY_DATETIME_FORMAT)?;
    Ok(Utc.from_utc_datetime(&naive))
}

pub mod legacy_datetime {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.format(LEGACY_DATETIME_FORMAT).to_string())
    }

    /// Empty or missing values decode to the Unix epoch.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(DateTime::<Utc>::default()),
            Some(v) => parse_legacy_datetime(v).map_err(serde::de::Error::custom),
        }
    }
}

/// The legacy API sends `0` where it means "no value" for some string fields.
pub mod zeroable_string {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) if n.as_i64() == Some(0) => Ok(None),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(serde::de::Error::custom(format!(
                "expected string or number, got {}",
                other
            ))),
        }
    }
}

fn status_code_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "unexpected statuscode {}",
            other
        ))),
    }
}

/// Envelope header present on every legacy response.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyStatus {
    #[serde(rename = "statuscode", deserialize_with = "status_code_string")]
    pub status_code: String,
}

impl LegacyStatus {
    pub fn is_success(&self) -> bool {
        self.status_code == LEGACY_SUCCESS_STATUS
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyMod {
    #[serde(rename = "modid")]
    pub mod_id: i64,
    #[serde(rename = "assetid")]
    pub asset_id: i64,
    #[serde(default)]
    pub downloads: i64,
    #[serde(default)]
    pub comments: i64,
    #[serde(default)]
    pub follows: i64,
    #[serde(rename = "trendingpoints", default)]
    pub trending_points: i64,
    pub name: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(rename = "modidstrs", default)]
    pub mod_id_strs: Vec<String>,
    pub author: String,
    #[serde(
        rename = "urlalias",
        default,
        deserialize_with = "zeroable_string::deserialize"
    )]
    pub url_alias: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "lastreleased", with = "legacy_datetime", default)]
    pub last_released: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyModRelease {
    #[serde(rename = "releaseid")]
    pub release_id: i64,
    #[serde(rename = "mainfile")]
    pub main_file: String,
    #[serde(rename = "filename")]
    pub file_name: String,
    #[serde(rename = "fileid", default)]
    pub file_id: i64,
    #[serde(default)]
    pub downloads: i64,
    /// Game versions this release targets.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "modidstr", default)]
    pub mod_id_str: String,
    #[serde(rename = "modversion")]
    pub mod_version: String,
    #[serde(with = "legacy_datetime", default)]
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyModDetails {
    #[serde(rename = "modid")]
    pub mod_id: i64,
    #[serde(rename = "assetid")]
    pub asset_id: i64,
    pub name: String,
    #[serde(default)]
    pub text: Option<String>,
    pub author: String,
    #[serde(
        rename = "urlalias",
        default,
        deserialize_with = "zeroable_string::deserialize"
    )]
    pub url_alias: Option<String>,
    #[serde(
        rename = "logofilename",
        default,
        deserialize_with = "zeroable_string::deserialize"
    )]
    pub logo_file_name: Option<String>,
    #[serde(rename = "homepageurl", default)]
    pub homepage_url: Option<String>,
    #[serde(rename = "sourcecodeurl", default)]
    pub source_code_url: Option<String>,
    #[serde(rename = "issuetrackerurl", default)]
    pub issue_tracker_url: Option<String>,
    #[serde(rename = "wikiurl", default)]
    pub wiki_url: Option<String>,
    #[serde(default)]
    pub downloads: i64,
    #[serde(default)]
    pub follows: i64,
    #[serde(default)]
    pub comments: i64,
    #[serde(default)]
    pub side: String,
    #[serde(with = "legacy_datetime", default)]
    pub created: DateTime<Utc>,
    #[serde(rename = "lastmodified", with = "legacy_datetime", default)]
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Newest first, as returned upstream.
    #[serde(default)]
    pub releases: Vec<LegacyModRelease>,
}

impl LegacyModDetails {
    pub fn latest_release(&self) -> Option<&LegacyModRelease> {
        self.releases.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyComment {
    #[serde(rename = "commentid")]
    pub comment_id: i64,
    #[serde(rename = "assetid")]
    pub asset_id: i64,
    #[serde(rename = "userid")]
    pub user_id: i64,
    pub text: String,
    #[serde(with = "legacy_datetime", default)]
    pub created: DateTime<Utc>,
    #[serde(rename = "lastmodified", with = "legacy_datetime", default)]
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyAuthor {
    #[serde(rename = "userid")]
    pub user_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyTag {
    #[serde(rename = "tagid", default)]
    pub tag_id: i64,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyModsResponse {
    #[serde(default)]
    pub mods: Vec<LegacyMod>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyModDetailsResponse {
    #[serde(rename = "mod", default)]
    pub mod_details: Option<LegacyModDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyCommentsResponse {
    #[serde(default)]
    pub comments: Vec<LegacyComment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyAuthorsResponse {
    #[serde(default)]
    pub authors: Vec<LegacyAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyTagsResponse {
    #[serde(default)]
    pub tags: Vec<LegacyTag>,
}
