use anyhow::Context;
use async_trait::async_trait;
use domain::protocol::LegacyModDetails;
use std::collections::HashMap;
use storage::Db;

pub const ALL_DETAILS_KEY: &str = "legacy.mods.all-details";

pub type DetailsMap = HashMap<i64, LegacyModDetails>;

/// Long-lived home of the hydrated details map. Entries never expire; the
/// map is replaced wholesale on every hydration run.
#[async_trait]
pub trait DetailsStore: Send + Sync {
    async fn load(&self) -> anyhow::Result<Option<DetailsMap>>;
    async fn save(&self, details: &DetailsMap) -> anyhow::Result<()>;
}

#[async_trait]
impl DetailsStore for Db {
    async fn load(&self) -> anyhow::Result<Option<DetailsMap>> {
        match self.get_cache_value(ALL_DETAILS_KEY).await? {
            Some(raw) => {
                let map = serde_json::from_str(&raw).context("Corrupt hydrated details map")?;
                Ok(Some(map))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, details: &DetailsMap) -> anyhow::Result<()> {
        let raw = serde_json::to_string(details)?;
        self.set_cache_value(ALL_DETAILS_KEY, &raw).await
    }
}
