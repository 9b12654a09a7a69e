use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use domain::{
    Asset, GetModsResponse, LatestModComment, ModComment, ModDbError, ModDetails, ModDisplay,
    ModListQuery, ModTag, SearchModsRequest,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LATEST_COUNT: usize = 10;

#[derive(Deserialize)]
pub struct LatestQuery {
    pub count: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerUpload {
    pub file_name: Option<String>,
}

fn asset_response(asset: Asset) -> Response {
    let mut headers = HeaderMap::new();
    if let Ok(ct) = HeaderValue::from_str(&asset.content_type) {
        headers.insert(CONTENT_TYPE, ct);
    }
    let disposition = format!("attachment; filename=\"{}\"", asset.file_name.replace('"', ""));
    if let Ok(cd) = HeaderValue::from_str(&disposition) {
        headers.insert(CONTENT_DISPOSITION, cd);
    }
    (headers, asset.data).into_response()
}

fn missing(what: &str, alias: &str) -> ApiError {
    ApiError::NotFound(format!("could not find {} for mod {}", what, alias))
}

pub async fn list_mods(
    State(state): State<AppState>,
    Query(query): Query<ModListQuery>,
) -> Result<Json<GetModsResponse>, ApiError> {
    Ok(Json(state.catalog().get_mods(&query).await?))
}

pub async fn search_mods(
    State(state): State<AppState>,
    Json(request): Json<SearchModsRequest>,
) -> Result<Json<GetModsResponse>, ApiError> {
    Ok(Json(state.catalog().search_mods(&request).await?))
}

pub async fn latest_mods(
    State(state): State<AppState>,
    Query(q): Query<LatestQuery>,
) -> Result<Json<Vec<ModDisplay>>, ApiError> {
    let count = q.count.unwrap_or(DEFAULT_LATEST_COUNT);
    Ok(Json(state.catalog().get_latest_mods(count).await?))
}

pub async fn latest_comments(
    State(state): State<AppState>,
) -> Result<Json<Vec<LatestModComment>>, ApiError> {
    Ok(Json(state.catalog().get_latest_mod_comments().await?))
}

pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<ModTag>>, ApiError> {
    Ok(Json(state.catalog().get_tags().await?))
}

pub async fn mods_by_author(
    State(state): State<AppState>,
    Path(author): Path<String>,
) -> Result<Json<Vec<ModDisplay>>, ApiError> {
    Ok(Json(state.catalog().get_mods_by_author(&author).await?))
}

pub async fn get_mod(
    State(state): State<AppState>,
    Path(alias): Path<String>,
) -> Result<Json<ModDetails>, ApiError> {
    state
        .catalog()
        .get_mod(&alias)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("could not find mod {}", alias)))
}

pub async fn get_mod_comments(
    State(state): State<AppState>,
    Path(alias): Path<String>,
) -> Result<Json<Vec<ModComment>>, ApiError> {
    state
        .catalog()
        .get_mod_comments(&alias)
        .await?
        .map(Json)
        .ok_or_else(|| missing("comments", &alias))
}

pub async fn get_banner(
    State(state): State<AppState>,
    Path(alias): Path<String>,
) -> Result<Response, ApiError> {
    let asset = state
        .catalog()
        .get_banner(&alias)
        .await?
        .ok_or_else(|| missing("banner", &alias))?;
    Ok(asset_response(asset))
}

/// Replaces a local mod's banner with the raw request body.
pub async fn set_banner(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(alias): Path<String>,
    Query(upload): Query<BannerUpload>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    if state.legacy_enabled {
        return Err(ModDbError::LegacyModeEnabled.into());
    }
    info!(alias = %alias, username = %user.username, "updating mod banner");

    if !state.mods.is_user_contributor(&alias, &user).await? {
        return Err(ApiError::Forbidden);
    }
    if body.is_empty() {
        return Err(ApiError::BadRequest("banner body is empty".to_string()));
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/png")
        .to_string();
    let banner = Asset {
        data: body.to_vec(),
        file_name: upload.file_name.unwrap_or_else(|| "banner.png".to_string()),
        content_type,
    };
    state.mods.set_banner(&alias, banner).await?;
    Ok(StatusCode::OK)
}

pub async fn get_mod_file(
    State(state): State<AppState>,
    Path((alias, version)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let asset = state
        .catalog()
        .get_mod_file(&alias, &version)
        .await?
        .ok_or_else(|| missing(&format!("release {}", version), &alias))?;
    Ok(asset_response(asset))
}
