use anyhow::Result;
use async_trait::async_trait;
use domain::{
    Asset, GetModsResponse, LatestModComment, ModComment, ModDetails, ModDisplay, ModListQuery,
    ModTag, SearchModsRequest,
};

/// Read side of the mod catalogue, served either from the legacy API or from
/// the local database.
#[async_trait]
pub trait ModCatalog: Send + Sync {
    async fn get_mod(&self, alias: &str) -> Result<Option<ModDetails>>;

    async fn get_mod_comments(&self, alias: &str) -> Result<Option<Vec<ModComment>>>;

    async fn get_latest_mods(&self, count: usize) -> Result<Vec<ModDisplay>>;

    async fn get_latest_mod_comments(&self) -> Result<Vec<LatestModComment>>;

    async fn get_mods(&self, query: &ModListQuery) -> Result<GetModsResponse>;

    async fn get_mods_by_author(&self, author: &str) -> Result<Vec<ModDisplay>>;

    async fn search_mods(&self, request: &SearchModsRequest) -> Result<GetModsResponse>;

    async fn get_tags(&self) -> Result<Vec<ModTag>>;

    async fn get_banner(&self, alias: &str) -> Result<Option<Asset>>;

    async fn get_mod_file(&self, alias: &str, version: &str) -> Result<Option<Asset>>;
}

/// Resolves legacy account names to legacy user ids.
#[async_trait]
pub trait AuthorDirectory: Send + Sync {
    async fn find_user_id(&self, username: &str) -> Result<Option<i64>>;
}
