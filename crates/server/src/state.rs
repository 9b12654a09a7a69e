use adapter::account::AccountService;
use adapter::legacy::LegacyApiClient;
use adapter::{ModCatalog, ModService};
use axum::extract::FromRef;
use std::sync::Arc;
use storage::Db;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub legacy: Arc<LegacyApiClient>,
    pub mods: ModService,
    pub accounts: Arc<AccountService>,
    // true: 目录数据来自旧版 API；false: 本地数据库
    pub legacy_enabled: bool,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn catalog(&self) -> &dyn ModCatalog {
        if self.legacy_enabled {
            &*self.legacy as &dyn ModCatalog
        } else {
            &self.mods as &dyn ModCatalog
        }
    }
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
