//! Fakes and fixtures shared by the legacy tests.

use super::details_store::{DetailsMap, DetailsStore};
use super::transport::LegacyTransport;
use super::LegacyApiClient;
use crate::cache::MemoryCache;
use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use domain::protocol::{LegacyMod, LegacyModDetails, LegacyModRelease};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use storage::DiskStorageProvider;
use tempfile::TempDir;

/// Serves canned bodies by exact path and counts every request.
#[derive(Clone, Default)]
pub(crate) struct FakeTransport {
    routes: Arc<Mutex<HashMap<String, Bytes>>>,
    calls: Arc<Mutex<HashMap<String, usize>>>,
}

impl FakeTransport {
    pub(crate) fn set(&self, path: &str, body: Value) {
        self.set_raw(path, body.to_string().into_bytes());
    }

    pub(crate) fn set_raw(&self, path: &str, body: Vec<u8>) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Bytes::from(body));
    }

    pub(crate) fn calls(&self, path: &str) -> usize {
        self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

#[async_trait]
impl LegacyTransport for FakeTransport {
    async fn get(&self, path: &str) -> anyhow::Result<Bytes> {
        *self.calls.lock().unwrap().entry(path.to_string()).or_default() += 1;
        self.routes
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("404 Not Found: {}", path))
    }
}

#[derive(Clone, Default)]
pub(crate) struct MemoryDetailsStore {
    map: Arc<Mutex<Option<DetailsMap>>>,
}

impl MemoryDetailsStore {
    pub(crate) fn put(&self, map: DetailsMap) {
        *self.map.lock().unwrap() = Some(map);
    }

    pub(crate) fn get(&self) -> Option<DetailsMap> {
        self.map.lock().unwrap().clone()
    }
}

#[async_trait]
impl DetailsStore for MemoryDetailsStore {
    async fn load(&self) -> anyhow::Result<Option<DetailsMap>> {
        Ok(self.get())
    }

    async fn save(&self, details: &DetailsMap) -> anyhow::Result<()> {
        self.put(details.clone());
        Ok(())
    }
}

pub(crate) fn client_with(
    transport: FakeTransport,
    store: MemoryDetailsStore,
) -> (LegacyApiClient, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let client = LegacyApiClient::new(
        Arc::new(transport),
        MemoryCache::new(),
        Arc::new(store),
        Arc::new(DiskStorageProvider::new(dir.path())),
    );
    (client, dir)
}

pub(crate) fn legacy_mod(id: i64, name: &str) -> LegacyMod {
    LegacyMod {
        mod_id: id,
        asset_id: id * 10,
        downloads: 0,
        comments: 0,
        follows: 0,
        trending_points: 0,
        name: name.into(),
        summary: None,
        mod_id_strs: vec![],
        author: "tyron".into(),
        url_alias: None,
        tags: vec![],
        last_released: DateTime::<Utc>::default(),
    }
}

pub(crate) fn legacy_details(id: i64, side: &str, versions: &[&str]) -> LegacyModDetails {
    LegacyModDetails {
        mod_id: id,
        asset_id: id * 10,
        name: format!("Mod {}", id),
        text: Some("<p>description</p>".into()),
        author: "tyron".into(),
        url_alias: None,
        logo_file_name: None,
        homepage_url: None,
        source_code_url: None,
        issue_tracker_url: None,
        wiki_url: None,
        downloads: 0,
        follows: 0,
        comments: 0,
        side: side.into(),
        created: DateTime::<Utc>::default(),
        last_modified: DateTime::<Utc>::default(),
        tags: vec![],
        releases: vec![LegacyModRelease {
            release_id: id,
            main_file: format!("https://mods.example/files/{}.zip", id),
            file_name: format!("mod-{}.zip", id),
            file_id: id,
            downloads: 0,
            tags: versions.iter().map(|v| v.to_string()).collect(),
            mod_id_str: format!("mod{}", id),
            mod_version: "1.0.0".into(),
            created: DateTime::<Utc>::default(),
        }],
    }
}

pub(crate) fn mods_json(mods: &[LegacyMod]) -> Value {
    json!({ "statuscode": "200", "mods": mods })
}

pub(crate) fn authors_json(authors: &[(i64, &str)]) -> Value {
    let authors: Vec<Value> = authors
        .iter()
        .map(|(id, name)| json!({ "userid": id, "name": name }))
        .collect();
    json!({ "statuscode": "200", "authors": authors })
}

/// `(comment id, asset id, user id)` triples.
pub(crate) fn comments_json(comments: &[(i64, i64, i64)]) -> Value {
    let comments: Vec<Value> = comments
        .iter()
        .map(|(id, asset, user)| {
            json!({
                "commentid": id,
                "assetid": asset,
                "userid": user,
                "text": format!("<p>comment {}</p>", id),
                "created": "2024-05-01 10:00:00",
                "lastmodified": ""
            })
        })
        .collect();
    json!({ "statuscode": "200", "comments": comments })
}
