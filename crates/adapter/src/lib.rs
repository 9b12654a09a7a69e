pub mod account;
mod cache;
pub mod legacy;
mod mods;
mod traits;

pub use cache::MemoryCache;
pub use mods::ModService;
pub use traits::{AuthorDirectory, ModCatalog};

use legacy::{DetailsStore, HttpLegacyTransport, LegacyApiClient, LegacyTransport};
use std::sync::Arc;
use std::time::Duration;
use storage::StorageProvider;
use tracing::info;

#[derive(Clone, Debug)]
pub struct LegacyConfig {
    pub base_address: String,
    pub timeout: Duration,
    pub hydration_concurrency: usize,
}

/// 组装 legacy 客户端：HTTP 传输 + 进程内缓存 + 长期存储
pub fn build_legacy_client(
    config: &LegacyConfig,
    details_store: Arc<dyn DetailsStore>,
    storage: Arc<dyn StorageProvider>,
) -> anyhow::Result<(Arc<LegacyApiClient>, Arc<dyn LegacyTransport>)> {
    info!(base = %config.base_address, "Initializing legacy ModDB client...");
    let transport: Arc<dyn LegacyTransport> =
        Arc::new(HttpLegacyTransport::new(&config.base_address, config.timeout)?);

    let client = LegacyApiClient::new(transport.clone(), MemoryCache::new(), details_store, storage)
        .with_hydration_concurrency(config.hydration_concurrency);

    Ok((Arc::new(client), transport))
}
