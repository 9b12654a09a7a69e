use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ModSortType {
    /// Approximated by the mod id, the legacy list carries no creation time.
    Created,
    Downloads,
    Comments,
    Trending,
    #[default]
    Name,
    Updated,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ModSortDirection {
    #[default]
    Ascending,
    Descending,
}

// 前端和旧客户端的大小写不统一，`name` 与 `Name` 都要认
impl<'de> Deserialize<'de> for ModSortType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        match raw.to_ascii_lowercase().as_str() {
            "created" => Ok(Self::Created),
            "downloads" => Ok(Self::Downloads),
            "comments" => Ok(Self::Comments),
            "trending" => Ok(Self::Trending),
            "name" => Ok(Self::Name),
            "updated" => Ok(Self::Updated),
            _ => Err(serde::de::Error::unknown_variant(
                &raw,
                &["Created", "Downloads", "Comments", "Trending", "Name", "Updated"],
            )),
        }
    }
}

impl<'de> Deserialize<'de> for ModSortDirection {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        match raw.to_ascii_lowercase().as_str() {
            "ascending" => Ok(Self::Ascending),
            "descending" => Ok(Self::Descending),
            _ => Err(serde::de::Error::unknown_variant(&raw, &["Ascending", "Descending"])),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModCommentContentType {
    #[default]
    Html,
    Markdown,
}

impl ModCommentContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "Html",
            Self::Markdown => "Markdown",
        }
    }

    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("markdown") {
            Self::Markdown
        } else {
            Self::Html
        }
    }
}

/// Summary row used by list, search and "latest" views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModDisplay {
    pub id: i64,
    pub name: String,
    pub author: String,
    pub url_alias: Option<String>,
    pub summary: Option<String>,
    pub downloads: i64,
    pub comments: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModTag {
    pub value: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModRelease {
    pub file_name: String,
    pub downloads: i64,
    pub game_versions: Vec<String>,
    pub mod_id: String,
    pub mod_version: String,
    pub time_created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModDetails {
    pub id: i64,
    pub name: String,
    pub summary: Option<String>,
    pub url_alias: Option<String>,
    pub time_created_utc: DateTime<Utc>,
    pub time_updated_utc: DateTime<Utc>,
    pub description: Option<String>,
    pub tags: Vec<ModTag>,
    pub author: String,
    pub side: String,
    pub downloads: i64,
    pub follows: i64,
    pub homepage_url: Option<String>,
    pub source_code_url: Option<String>,
    pub issue_tracker_url: Option<String>,
    pub wiki_url: Option<String>,
    pub releases: Vec<ModRelease>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModComment {
    pub author: String,
    pub comment: String,
    pub content_type: ModCommentContentType,
    pub time_created_utc: DateTime<Utc>,
    pub time_updated_utc: Option<DateTime<Utc>>,
}

/// A comment from the "latest comments" feed, together with the mod it was posted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestModComment {
    pub comment: ModComment,
    #[serde(rename = "mod")]
    pub mod_summary: ModDisplay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetModsResponse {
    /// Size of the filtered set before pagination.
    pub total_mods: usize,
    pub mods: Vec<ModDisplay>,
}

/// Query string of the plain mod listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModListQuery {
    pub sort: ModSortType,
    pub direction: ModSortDirection,
    pub take: usize,
    pub skip: usize,
    pub author: Option<String>,
}

impl Default for ModListQuery {
    fn default() -> Self {
        Self {
            sort: ModSortType::default(),
            direction: ModSortDirection::default(),
            take: 25,
            skip: 0,
            author: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchModsRequest {
    pub text: Option<String>,
    pub sort: Option<ModSortType>,
    pub direction: Option<ModSortDirection>,
    pub author: Option<String>,
    pub side: Option<String>,
    pub game_version: Option<String>,
    pub game_versions: Vec<String>,
    pub tags: Vec<String>,
    pub skip: Option<usize>,
    pub take: Option<usize>,
}

impl SearchModsRequest {
    /// Merges the single `gameVersion` field older clients send with `gameVersions`.
    pub fn requested_game_versions(&self) -> Vec<&str> {
        let mut versions: Vec<&str> = self
            .game_versions
            .iter()
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
            .collect();
        if let Some(v) = self.game_version.as_deref() {
            if !v.trim().is_empty() && !versions.contains(&v) {
                versions.push(v);
            }
        }
        versions
    }

    pub fn requested_side(&self) -> Option<&str> {
        self.side
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("any"))
    }
}

/// An in-memory file handed back to HTTP callers.
#[derive(Clone, PartialEq, Eq)]
pub struct Asset {
    pub data: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}
