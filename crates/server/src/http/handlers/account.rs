use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use domain::UserProfile;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{self, CurrentUser};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAccountLinkRequest {
    pub username: String,
    pub email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAccountLinkResponse {
    pub link_token: String,
    /// Mod post the token has to be commented on.
    pub url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAccountLinkRequest {
    pub link_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAccountPasswordRequest {
    pub password: String,
    pub link_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn start_link(
    State(state): State<AppState>,
    Json(req): Json<StartAccountLinkRequest>,
) -> Result<(HeaderMap, Json<StartAccountLinkResponse>), ApiError> {
    info!(username = %req.username, "received request to start account link");
    let details = state.accounts.start_account_link(&req.username, &req.email).await?;

    let options = state.accounts.options();
    let mut headers = HeaderMap::new();
    auth::set_link_secret(
        &mut headers,
        &details.secret,
        options.link_token_expiration_minutes,
        state.secure_cookies,
    );

    Ok((
        headers,
        Json(StartAccountLinkResponse {
            link_token: details.token,
            url: options.link_token_mod_post_url.clone(),
        }),
    ))
}

/// Verifies the posted comment and signs the new user in, so the follow-up
/// set-password call is authenticated.
pub async fn verify_link(
    State(state): State<AppState>,
    request_headers: HeaderMap,
    Json(req): Json<VerifyAccountLinkRequest>,
) -> Result<(HeaderMap, Json<UserProfile>), ApiError> {
    info!(token = %req.link_token, "received request to verify account link");
    let secret = auth::read_cookie(&request_headers, auth::LINK_SECRET_COOKIE);

    let user = state
        .accounts
        .verify_account_link(&req.link_token, secret.as_deref())
        .await?;
    let session = state.accounts.sign_in(&user).await?;

    let mut headers = HeaderMap::new();
    auth::set_session(&mut headers, &session.token, session.expires_utc, state.secure_cookies);
    Ok((headers, Json(UserProfile::from(&user))))
}

pub async fn set_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    request_headers: HeaderMap,
    Json(req): Json<SetAccountPasswordRequest>,
) -> Result<(HeaderMap, StatusCode), ApiError> {
    info!(username = %user.username, "received request to set account password");
    let secret = auth::read_cookie(&request_headers, auth::LINK_SECRET_COOKIE);

    state
        .accounts
        .set_account_password(&user, &req.password, &req.link_token, secret.as_deref())
        .await?;

    let mut headers = HeaderMap::new();
    auth::clear_link_secret(&mut headers, state.secure_cookies);
    Ok((headers, StatusCode::OK))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<UserProfile>), ApiError> {
    let user = state.accounts.login(&req.username, &req.password).await?;
    let session = state.accounts.sign_in(&user).await?;
    info!(username = %user.username, "user signed in");

    let mut headers = HeaderMap::new();
    auth::set_session(&mut headers, &session.token, session.expires_utc, state.secure_cookies);
    Ok((headers, Json(UserProfile::from(&user))))
}

pub async fn logout(
    State(state): State<AppState>,
    request_headers: HeaderMap,
) -> Result<(HeaderMap, StatusCode), ApiError> {
    if let Some(token) = auth::read_cookie(&request_headers, auth::SESSION_COOKIE) {
        state.accounts.sign_out(&token).await?;
    }
    let mut headers = HeaderMap::new();
    auth::clear_session(&mut headers, state.secure_cookies);
    Ok((headers, StatusCode::OK))
}

pub async fn profile(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}
