use super::details_store::{DetailsMap, DetailsStore, ALL_DETAILS_KEY};
use super::mapping::{to_mod_comment, to_mod_details, to_mod_display, to_mod_tags};
use super::search::{author_contains, filter_mods, paginate, sort_mods, DEFAULT_SEARCH_TAKE};
use super::transport::LegacyTransport;
use crate::cache::MemoryCache;
use crate::traits::{AuthorDirectory, ModCatalog};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use domain::protocol::{
    LegacyAuthorsResponse, LegacyCommentsResponse, LegacyMod, LegacyModDetails,
    LegacyModDetailsResponse, LegacyModsResponse, LegacyStatus, LegacyTagsResponse,
};
use domain::{
    Asset, GetModsResponse, LatestModComment, ModComment, ModDbError, ModDetails, ModDisplay,
    ModListQuery, ModTag, SearchModsRequest,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use storage::StorageProvider;
use tracing::{debug, warn};

const SHORT_TTL: Duration = Duration::from_secs(5 * 60);
const LONG_TTL: Duration = Duration::from_secs(30 * 60);
// 只是为了省掉每次搜索都反序列化整张表
const DETAILS_MEMO_TTL: Duration = Duration::from_secs(60);

const MODS_KEY: &str = "legacy.mods";
const LATEST_MODS_KEY: &str = "legacy.mods.latest";
const LATEST_COMMENTS_KEY: &str = "legacy.comments.latest";
const USERS_KEY: &str = "legacy.users";
const USERS_REFETCH_KEY: &str = "legacy.users.refetch";
const TAGS_KEY: &str = "legacy.tags";

const LATEST_MODS_LIMIT: usize = 10;
const LATEST_COMMENTS_LIMIT: usize = 20;
const DEFAULT_LOGO_PATH: &str = "/web/img/mod-default.png";
const MOD_FILE_CONTENT_TYPE: &str = "application/zip";
const NOT_FOUND_STATUS: &str = "404";

pub const DEFAULT_HYDRATION_CONCURRENCY: usize = 8;

type AuthorMap = HashMap<i64, String>;

/// Read-only client for the legacy ModDB API with a TTL cache in front of
/// every endpoint.
pub struct LegacyApiClient {
    transport: Arc<dyn LegacyTransport>,
    cache: MemoryCache,
    details_store: Arc<dyn DetailsStore>,
    storage: Arc<dyn StorageProvider>,
    pub(crate) hydration_concurrency: usize,
}

impl LegacyApiClient {
    pub fn new(
        transport: Arc<dyn LegacyTransport>,
        cache: MemoryCache,
        details_store: Arc<dyn DetailsStore>,
        storage: Arc<dyn StorageProvider>,
    ) -> Self {
        Self {
            transport,
            cache,
            details_store,
            storage,
            hydration_concurrency: DEFAULT_HYDRATION_CONCURRENCY,
        }
    }

    pub fn with_hydration_concurrency(mut self, concurrency: usize) -> Self {
        self.hydration_concurrency = concurrency.max(1);
        self
    }

    pub fn cache(&self) -> &MemoryCache {
        &self.cache
    }

    pub(crate) fn details_store(&self) -> &dyn DetailsStore {
        self.details_store.as_ref()
    }

    /// GET + envelope check + decode.
    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.transport.get(path).await?;
        let status: LegacyStatus = serde_json::from_slice(&body)
            .with_context(|| format!("Malformed legacy response from {}", path))?;
        if !status.is_success() {
            return Err(ModDbError::LegacyStatus(status.status_code).into());
        }
        serde_json::from_slice(&body)
            .with_context(|| format!("Unexpected legacy payload from {}", path))
    }

    async fn cached<T>(&self, key: &str, ttl: Duration, path: &str) -> Result<Arc<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.cache
            .get_or_try_insert_with(key, ttl, || async { self.fetch::<T>(path).await.map(Some) })
            .await?
            .ok_or_else(|| anyhow!("No value cached for {}", key))
    }

    pub async fn all_mods(&self) -> Result<Arc<LegacyModsResponse>> {
        self.cached(MODS_KEY, SHORT_TTL, "api/mods").await
    }

    async fn tag_table(&self) -> Result<Arc<LegacyTagsResponse>> {
        self.cached(TAGS_KEY, LONG_TTL, "api/tags").await
    }

    async fn authors(&self) -> Result<Arc<AuthorMap>> {
        self.cache
            .get_or_try_insert_with(USERS_KEY, LONG_TTL, || async {
                let response = self.fetch::<LegacyAuthorsResponse>("api/authors").await?;
                let map: AuthorMap = response
                    .authors
                    .into_iter()
                    .map(|a| (a.user_id, a.name))
                    .collect();
                Ok(Some(map))
            })
            .await?
            .ok_or_else(|| anyhow!("No value cached for {}", USERS_KEY))
    }

    /// Looks something up in the author map. A miss drops the map and fetches
    /// it once more, unless that already happened within the refetch window.
    async fn lookup_author<R, F>(&self, lookup: F) -> Result<Option<R>>
    where
        F: Fn(&AuthorMap) -> Option<R> + Send,
    {
        let authors = self.authors().await?;
        if let Some(found) = lookup(&authors) {
            return Ok(Some(found));
        }
        if !self.cache.try_insert(USERS_REFETCH_KEY, (), SHORT_TTL) {
            return Ok(None);
        }
        debug!("author not in cached list, refetching");
        self.cache.remove(USERS_KEY);
        let authors = self.authors().await?;
        Ok(lookup(&authors))
    }

    pub async fn resolve_user_name(&self, user_id: i64) -> Result<Option<String>> {
        self.lookup_author(|authors| authors.get(&user_id).cloned()).await
    }

    /// Failures are logged and rendered as an unknown author.
    async fn author_name_or_unknown(&self, user_id: i64) -> Option<String> {
        match self.resolve_user_name(user_id).await {
            Ok(name) => name,
            Err(e) => {
                warn!(user_id, error = %e, "failed to resolve legacy author");
                None
            }
        }
    }

    /// Integer aliases are taken as mod ids as-is.
    pub async fn mod_id_for_alias(&self, alias: &str) -> Result<Option<i64>> {
        if let Ok(id) = alias.parse::<i64>() {
            return Ok(Some(id));
        }
        let key = format!("legacy.alias-to-id.{}", alias);
        let id = self
            .cache
            .get_or_try_insert_with(&key, LONG_TTL, || async {
                let mods = self.all_mods().await?;
                Ok(mods
                    .mods
                    .iter()
                    .find(|m| m.url_alias.as_deref() == Some(alias))
                    .map(|m| m.mod_id))
            })
            .await?;
        Ok(id.map(|id| *id))
    }

    pub async fn mod_details_by_id(&self, id: i64) -> Result<Option<Arc<LegacyModDetails>>> {
        let key = format!("legacy.mods.by-id.{}", id);
        self.cache
            .get_or_try_insert_with(&key, SHORT_TTL, || async {
                let path = format!("api/mod/{}", id);
                match self.fetch::<LegacyModDetailsResponse>(&path).await {
                    Ok(response) => Ok(response.mod_details),
                    Err(e) => match e.downcast_ref::<ModDbError>() {
                        Some(ModDbError::LegacyStatus(code)) if code == NOT_FOUND_STATUS => {
                            debug!(mod_id = id, "legacy api has no such mod");
                            Ok(None)
                        }
                        _ => Err(e),
                    },
                }
            })
            .await
    }

    async fn resolve_details(&self, alias: &str) -> Result<Option<Arc<LegacyModDetails>>> {
        match self.mod_id_for_alias(alias).await? {
            Some(id) => self.mod_details_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn mod_by_asset_id(&self, asset_id: i64) -> Result<Option<Arc<LegacyMod>>> {
        let key = format!("legacy.mods.by-asset-id.{}", asset_id);
        self.cache
            .get_or_try_insert_with(&key, LONG_TTL, || async {
                let mods = self.all_mods().await?;
                Ok(mods.mods.iter().find(|m| m.asset_id == asset_id).cloned())
            })
            .await
    }

    /// Hydrated details, if a hydration run has ever completed.
    pub async fn hydrated_details(&self) -> Result<Option<Arc<DetailsMap>>> {
        self.cache
            .get_or_try_insert_with(ALL_DETAILS_KEY, DETAILS_MEMO_TTL, || {
                self.details_store.load()
            })
            .await
    }

    pub(crate) fn remember_details(&self, details: DetailsMap) {
        self.cache.insert(ALL_DETAILS_KEY, details, DETAILS_MEMO_TTL);
    }

    pub async fn get_mod(&self, alias: &str) -> Result<Option<ModDetails>> {
        let Some(details) = self.resolve_details(alias).await? else {
            return Ok(None);
        };
        let table = self.tag_table().await?;
        let tags = to_mod_tags(&details.tags, &table.tags);

        // 详情接口没有 summary，只能去列表里找
        let summary = match self.all_mods().await {
            Ok(mods) => mods
                .mods
                .iter()
                .find(|m| m.mod_id == details.mod_id)
                .and_then(|m| m.summary.clone()),
            Err(e) => {
                warn!(mod_id = details.mod_id, error = %e, "mod list unavailable, omitting summary");
                None
            }
        };

        Ok(Some(to_mod_details(&details, summary, tags)))
    }

    pub async fn get_mod_comments(&self, alias: &str) -> Result<Option<Vec<ModComment>>> {
        let Some(details) = self.resolve_details(alias).await? else {
            return Ok(None);
        };
        let key = format!("legacy.comments.by-mod.{}", details.mod_id);
        let path = format!("api/comments/{}", details.asset_id);
        let response = self
            .cached::<LegacyCommentsResponse>(&key, SHORT_TTL, &path)
            .await?;

        let mut comments = Vec::with_capacity(response.comments.len());
        for c in &response.comments {
            let author = self.author_name_or_unknown(c.user_id).await;
            comments.push(to_mod_comment(c, author.as_deref()));
        }
        Ok(Some(comments))
    }

    pub async fn get_latest_mods(&self, count: usize) -> Result<Vec<ModDisplay>> {
        let latest = self
            .cached::<LegacyModsResponse>(
                LATEST_MODS_KEY,
                SHORT_TTL,
                "api/mods?orderby=asset.created",
            )
            .await?;
        Ok(latest
            .mods
            .iter()
            .take(count.min(LATEST_MODS_LIMIT))
            .map(to_mod_display)
            .collect())
    }

    pub async fn get_latest_mod_comments(&self) -> Result<Vec<LatestModComment>> {
        let response = self
            .cached::<LegacyCommentsResponse>(LATEST_COMMENTS_KEY, SHORT_TTL, "api/comments")
            .await?;

        let mut latest = Vec::new();
        for c in response.comments.iter().take(LATEST_COMMENTS_LIMIT) {
            let Some(m) = self.mod_by_asset_id(c.asset_id).await? else {
                debug!(asset_id = c.asset_id, "comment on unknown asset, skipping");
                continue;
            };
            let author = self.author_name_or_unknown(c.user_id).await;
            latest.push(LatestModComment {
                comment: to_mod_comment(c, author.as_deref()),
                mod_summary: to_mod_display(&m),
            });
        }
        Ok(latest)
    }

    pub async fn get_mods(&self, query: &ModListQuery) -> Result<GetModsResponse> {
        let mods = self.all_mods().await?;
        let author = query
            .author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty());

        let mut filtered: Vec<&LegacyMod> = mods
            .mods
            .iter()
            .filter(|m| author.map_or(true, |a| author_contains(m, a)))
            .collect();
        sort_mods(&mut filtered, query.sort, query.direction);

        let total_mods = filtered.len();
        let mods = paginate(filtered, query.skip, query.take)
            .into_iter()
            .map(to_mod_display)
            .collect();
        Ok(GetModsResponse { total_mods, mods })
    }

    /// Exact, case-insensitive author name; newest first.
    pub async fn get_mods_by_author(&self, author: &str) -> Result<Vec<ModDisplay>> {
        let mods = self.all_mods().await?;
        let wanted = author.trim().to_lowercase();
        let mut owned: Vec<&LegacyMod> = mods
            .mods
            .iter()
            .filter(|m| m.author.to_lowercase() == wanted)
            .collect();
        owned.sort_by(|a, b| b.mod_id.cmp(&a.mod_id));
        Ok(owned.into_iter().map(to_mod_display).collect())
    }

    pub async fn search_mods(&self, request: &SearchModsRequest) -> Result<GetModsResponse> {
        let mods = self.all_mods().await?;
        let needs_details =
            request.requested_side().is_some() || !request.requested_game_versions().is_empty();
        let details = if needs_details {
            self.hydrated_details().await?
        } else {
            None
        };
        if needs_details && details.is_none() {
            warn!("side or game version filter requested before any hydration run");
        }

        let filtered = filter_mods(&mods.mods, request, details.as_deref());
        let total_mods = filtered.len();
        let mods = paginate(
            filtered,
            request.skip.unwrap_or(0),
            request.take.unwrap_or(DEFAULT_SEARCH_TAKE),
        )
        .into_iter()
        .map(to_mod_display)
        .collect();
        Ok(GetModsResponse { total_mods, mods })
    }

    pub async fn get_tags(&self) -> Result<Vec<ModTag>> {
        let table = self.tag_table().await?;
        Ok(table
            .tags
            .iter()
            .map(|t| ModTag {
                value: t.name.clone(),
                color: t.color.clone(),
            })
            .collect())
    }

    pub async fn get_mod_file(&self, alias: &str, version: &str) -> Result<Option<Asset>> {
        let Some(details) = self.resolve_details(alias).await? else {
            return Ok(None);
        };
        let Some(release) = details.releases.iter().find(|r| r.mod_version == version) else {
            return Ok(None);
        };

        let data = self
            .transport
            .get(&release.main_file)
            .await
            .with_context(|| format!("Failed to download {}", release.main_file))?;
        debug!(alias, version, bytes = data.len(), "downloaded legacy mod file");

        Ok(Some(Asset {
            data: data.to_vec(),
            file_name: release.file_name.clone(),
            content_type: MOD_FILE_CONTENT_TYPE.to_string(),
        }))
    }

    /// Logos are kept on disk under `legacy/{alias}/logo.png` after the
    /// first fetch.
    pub async fn get_mod_logo(&self, alias: &str) -> Result<Option<Asset>> {
        if alias.is_empty() || alias.contains(|c| c == '/' || c == '\\') {
            return Ok(None);
        }
        let path = format!("legacy/{}/logo.png", alias);

        if !self.storage.does_file_exist(&path).await? {
            let Some(details) = self.resolve_details(alias).await? else {
                return Ok(None);
            };
            let source = details
                .logo_file_name
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(DEFAULT_LOGO_PATH);
            let data = self
                .transport
                .get(source)
                .await
                .with_context(|| format!("Failed to download logo {}", source))?;
            self.storage.save_file(&path, &data).await?;
            debug!(alias, source, "cached legacy logo");
        }

        let data = self.storage.get_file(&path).await?;
        Ok(Some(Asset {
            data,
            file_name: "logo.png".to_string(),
            content_type: "image/png".to_string(),
        }))
    }
}

#[async_trait]
impl ModCatalog for LegacyApiClient {
    async fn get_mod(&self, alias: &str) -> Result<Option<ModDetails>> {
        LegacyApiClient::get_mod(self, alias).await
    }

    async fn get_mod_comments(&self, alias: &str) -> Result<Option<Vec<ModComment>>> {
        LegacyApiClient::get_mod_comments(self, alias).await
    }

    async fn get_latest_mods(&self, count: usize) -> Result<Vec<ModDisplay>> {
        LegacyApiClient::get_latest_mods(self, count).await
    }

    async fn get_latest_mod_comments(&self) -> Result<Vec<LatestModComment>> {
        LegacyApiClient::get_latest_mod_comments(self).await
    }

    async fn get_mods(&self, query: &ModListQuery) -> Result<GetModsResponse> {
        LegacyApiClient::get_mods(self, query).await
    }

    async fn get_mods_by_author(&self, author: &str) -> Result<Vec<ModDisplay>> {
        LegacyApiClient::get_mods_by_author(self, author).await
    }

    async fn search_mods(&self, request: &SearchModsRequest) -> Result<GetModsResponse> {
        LegacyApiClient::search_mods(self, request).await
    }

    async fn get_tags(&self) -> Result<Vec<ModTag>> {
        LegacyApiClient::get_tags(self).await
    }

    async fn get_banner(&self, alias: &str) -> Result<Option<Asset>> {
        self.get_mod_logo(alias).await
    }

    async fn get_mod_file(&self, alias: &str, version: &str) -> Result<Option<Asset>> {
        LegacyApiClient::get_mod_file(self, alias, version).await
    }
}

#[async_trait]
impl AuthorDirectory for LegacyApiClient {
    async fn find_user_id(&self, username: &str) -> Result<Option<i64>> {
        self.lookup_author(|authors| {
            authors
                .iter()
                .find(|(_, name)| name.as_str() == username)
                .map(|(id, _)| *id)
        })
        .await
    }
}
