use super::details_store::DetailsMap;
use super::LegacyApiClient;
use futures::{stream, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Outcome of one hydration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydrationReport {
    pub succeeded: usize,
    /// Mod ids whose details could not be fetched, ascending.
    pub failed: Vec<i64>,
    pub elapsed: Duration,
}

impl LegacyApiClient {
    /// Fetches details for every listed mod and replaces the long-lived
    /// details map. Per-mod failures are reported, not fatal.
    pub async fn hydrate_mod_details(&self) -> anyhow::Result<HydrationReport> {
        let started = Instant::now();
        let mods = self.all_mods().await?;
        let ids: Vec<i64> = mods.mods.iter().map(|m| m.mod_id).collect();
        let listed = ids.len();

        let results: Vec<_> = stream::iter(ids)
            .map(|id| async move { (id, self.mod_details_by_id(id).await) })
            .buffer_unordered(self.hydration_concurrency)
            .collect()
            .await;

        let mut details = DetailsMap::with_capacity(results.len());
        let mut failed = Vec::new();
        for (id, result) in results {
            match result {
                Ok(Some(d)) => {
                    details.insert(id, (*d).clone());
                }
                Ok(None) => {
                    warn!(mod_id = id, "legacy api returned no details");
                    failed.push(id);
                }
                Err(e) => {
                    warn!(mod_id = id, error = %e, "failed to fetch mod details");
                    failed.push(id);
                }
            }
        }
        failed.sort_unstable();

        let succeeded = details.len();
        if succeeded == 0 && listed > 0 {
            // 全部失败时保留上一次的结果
            warn!(listed, "no mod details fetched, keeping previous map");
        } else {
            self.details_store().save(&details).await?;
            self.remember_details(details);
        }

        let report = HydrationReport {
            succeeded,
            failed,
            elapsed: started.elapsed(),
        };
        info!(
            succeeded,
            failed = report.failed.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "hydrated legacy mod details"
        );
        Ok(report)
    }
}

/// Runs hydration right away and then every `every` until cancelled.
pub async fn run_periodic_hydration(
    client: Arc<LegacyApiClient>,
    every: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = client.hydrate_mod_details().await {
                    error!("Mod details hydration failed: {:?}", e);
                }
                let purged = client.cache().purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "purged expired cache entries");
                }
            }
            _ = cancel_token.cancelled() => {
                info!("Hydration task shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::details_store::ALL_DETAILS_KEY;
    use crate::legacy::testing::{
        client_with, legacy_details, legacy_mod, mods_json, FakeTransport, MemoryDetailsStore,
    };
    use serde_json::json;

    #[tokio::test]
    async fn reports_failures_without_aborting() {
        let mods: Vec<_> = (1..=4).map(|i| legacy_mod(i, &format!("m{}", i))).collect();
        let transport = FakeTransport::default();
        transport.set("api/mods", mods_json(&mods));
        transport.set("api/mod/1", json!({"statuscode": "200", "mod": legacy_details(1, "both", &[])}));
        transport.set("api/mod/3", json!({"statuscode": "200", "mod": legacy_details(3, "client", &[])}));
        // 2 has no route at all, 4 answers with a 404 envelope
        transport.set("api/mod/4", json!({"statuscode": "404"}));
        let store = MemoryDetailsStore::default();
        let (client, _dir) = client_with(transport, store.clone());

        let report = client.with_hydration_concurrency(2).hydrate_mod_details().await.unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, vec![2, 4]);
        let saved = store.get().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[&3].side, "client");
    }

    #[tokio::test]
    async fn total_failure_keeps_previous_map() {
        let transport = FakeTransport::default();
        transport.set("api/mods", mods_json(&[legacy_mod(1, "a")]));
        let store = MemoryDetailsStore::default();
        store.put([(9, legacy_details(9, "both", &[]))].into_iter().collect());
        let (client, _dir) = client_with(transport, store.clone());

        let report = client.hydrate_mod_details().await.unwrap();

        assert_eq!(report.failed, vec![1]);
        assert!(store.get().unwrap().contains_key(&9));
    }

    #[tokio::test]
    async fn hydrated_map_feeds_search_immediately() {
        let transport = FakeTransport::default();
        transport.set("api/mods", mods_json(&[legacy_mod(1, "a")]));
        transport.set("api/mod/1", json!({"statuscode": "200", "mod": legacy_details(1, "server", &[])}));
        let (client, _dir) = client_with(transport, MemoryDetailsStore::default());

        client.hydrate_mod_details().await.unwrap();
        assert!(client.cache().contains_key(ALL_DETAILS_KEY));
        assert_eq!(client.hydrated_details().await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_task_stops_on_cancel() {
        let transport = FakeTransport::default();
        transport.set("api/mods", mods_json(&[]));
        let (client, _dir) = client_with(transport.clone(), MemoryDetailsStore::default());
        let client = Arc::new(client);
        let token = CancellationToken::new();

        let task = tokio::spawn(run_periodic_hydration(
            client,
            Duration::from_secs(600),
            token.clone(),
        ));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.calls("api/mods"), 1);

        token.cancel();
        task.await.unwrap();
    }
}
