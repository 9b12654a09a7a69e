use crate::traits::ModCatalog;
use anyhow::Result;
use async_trait::async_trait;
use domain::{
    Asset, GetModsResponse, LatestModComment, LocalMod, LocalModComment, ModComment, ModDbError,
    ModDetails, ModDisplay, ModListQuery, ModTag, SearchModsRequest, User,
};
use std::sync::Arc;
use storage::{Db, StorageProvider};
use tracing::{debug, warn};

const DEFAULT_BANNER_PATH: &str = "mods/mod-default.png";
const DEFAULT_BANNER_NAME: &str = "mod-default.png";
const LATEST_COMMENTS_LIMIT: i64 = 25;

/// Mods hosted in the local database, used when legacy mode is off.
#[derive(Clone)]
pub struct ModService {
    db: Db,
    storage: Arc<dyn StorageProvider>,
}

impl ModService {
    pub fn new(db: Db, storage: Arc<dyn StorageProvider>) -> Self {
        Self { db, storage }
    }

    async fn mod_id_by_alias(&self, alias: &str) -> Result<i64> {
        if let Ok(id) = alias.parse::<i64>() {
            return Ok(id);
        }
        self.db
            .find_mod_id_by_alias(alias)
            .await?
            .ok_or_else(|| ModDbError::ModNotFound(alias.to_string()).into())
    }

    async fn find_mod(&self, alias: &str) -> Result<Option<LocalMod>> {
        match alias.parse::<i64>() {
            Ok(id) => self.db.find_mod_by_id(id).await,
            Err(_) => self.db.find_mod_by_url_alias(alias).await,
        }
    }

    /// The mod's banner, or the default banner when none is set or its file
    /// is gone.
    pub async fn get_banner(&self, alias: &str) -> Result<Option<Asset>> {
        let mod_id = self.mod_id_by_alias(alias).await?;
        debug!(mod_id, "getting mod banner");

        if let Some(banner) = self.db.find_mod_banner(mod_id).await? {
            match self.storage.get_file(&banner.asset_path).await {
                Ok(data) => {
                    return Ok(Some(Asset {
                        data,
                        file_name: banner.file_name,
                        content_type: banner.content_type,
                    }))
                }
                Err(e) => warn!(mod_id, error = %e, "banner file missing, using default"),
            }
        }

        self.default_banner().await
    }

    async fn default_banner(&self) -> Result<Option<Asset>> {
        if !self.storage.does_file_exist(DEFAULT_BANNER_PATH).await? {
            warn!("default mod banner is missing from storage");
            return Ok(None);
        }
        let data = self.storage.get_file(DEFAULT_BANNER_PATH).await?;
        Ok(Some(Asset {
            data,
            file_name: DEFAULT_BANNER_NAME.to_string(),
            content_type: "image/png".to_string(),
        }))
    }

    /// Writes the file first, then swaps the banner record in one transaction.
    pub async fn set_banner(&self, alias: &str, banner: Asset) -> Result<()> {
        let mod_id = self.mod_id_by_alias(alias).await?;
        debug!(mod_id, "updating mod banner");

        if self.db.find_mod_by_id(mod_id).await?.is_none() {
            return Err(ModDbError::ModNotFound(mod_id.to_string()).into());
        }

        let asset_path = format!("mods/{}/banner.png", mod_id);
        self.storage.save_file(&asset_path, &banner.data).await?;
        self.db
            .update_mod_banner(mod_id, &asset_path, &banner.file_name, &banner.content_type)
            .await?;
        Ok(())
    }

    // TODO: check mod ownership once local mods record their contributors
    pub async fn is_user_contributor(&self, _alias: &str, _user: &User) -> Result<bool> {
        Ok(true)
    }
}

fn to_mod_display(m: &LocalMod) -> ModDisplay {
    ModDisplay {
        id: m.id,
        name: m.name.clone(),
        author: String::new(),
        url_alias: m.url_alias.clone(),
        summary: Some(m.summary.clone()),
        downloads: 0,
        comments: m.comment_count,
    }
}

fn to_mod_details(m: LocalMod) -> ModDetails {
    ModDetails {
        id: m.id,
        name: m.name,
        summary: Some(m.summary),
        url_alias: m.url_alias,
        time_created_utc: m.time_created_utc,
        time_updated_utc: m.time_updated_utc,
        description: m.description,
        tags: m
            .tags
            .into_iter()
            .map(|value| ModTag { value, color: None })
            .collect(),
        author: String::new(),
        side: String::new(),
        downloads: 0,
        follows: 0,
        homepage_url: None,
        source_code_url: None,
        issue_tracker_url: None,
        wiki_url: None,
        releases: Vec::new(),
    }
}

fn to_mod_comment(c: LocalModComment) -> ModComment {
    ModComment {
        author: c.author,
        comment: c.comment,
        content_type: c.content_type,
        time_created_utc: c.time_created_utc,
        time_updated_utc: c.time_updated_utc,
    }
}

#[async_trait]
impl ModCatalog for ModService {
    async fn get_mod(&self, alias: &str) -> Result<Option<ModDetails>> {
        Ok(self.find_mod(alias).await?.map(to_mod_details))
    }

    async fn get_mod_comments(&self, alias: &str) -> Result<Option<Vec<ModComment>>> {
        let mod_id = self.mod_id_by_alias(alias).await?;
        if self.db.find_mod_by_id(mod_id).await?.is_none() {
            return Ok(None);
        }
        let comments = self.db.get_comments_by_mod_id(mod_id).await?;
        Ok(Some(comments.into_iter().map(to_mod_comment).collect()))
    }

    async fn get_latest_mods(&self, count: usize) -> Result<Vec<ModDisplay>> {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        let mods = self.db.list_latest_mods(count).await?;
        Ok(mods.iter().map(to_mod_display).collect())
    }

    async fn get_latest_mod_comments(&self) -> Result<Vec<LatestModComment>> {
        let comments = self.db.list_latest_comments(LATEST_COMMENTS_LIMIT).await?;
        let mut latest = Vec::with_capacity(comments.len());
        for c in comments {
            let Some(m) = self.db.find_mod_by_id(c.mod_id).await? else {
                continue;
            };
            latest.push(LatestModComment {
                comment: to_mod_comment(c),
                mod_summary: to_mod_display(&m),
            });
        }
        Ok(latest)
    }

    async fn get_mods(&self, _query: &ModListQuery) -> Result<GetModsResponse> {
        Err(ModDbError::NotImplemented("mod listing").into())
    }

    async fn get_mods_by_author(&self, _author: &str) -> Result<Vec<ModDisplay>> {
        Err(ModDbError::NotImplemented("mods by author").into())
    }

    async fn search_mods(&self, _request: &SearchModsRequest) -> Result<GetModsResponse> {
        Err(ModDbError::NotImplemented("mod search").into())
    }

    async fn get_tags(&self) -> Result<Vec<ModTag>> {
        Err(ModDbError::NotImplemented("tag listing").into())
    }

    async fn get_banner(&self, alias: &str) -> Result<Option<Asset>> {
        ModService::get_banner(self, alias).await
    }

    async fn get_mod_file(&self, _alias: &str, _version: &str) -> Result<Option<Asset>> {
        Err(ModDbError::NotImplemented("mod file download").into())
    }
}
