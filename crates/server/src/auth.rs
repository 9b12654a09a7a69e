use crate::error::ApiError;
use crate::state::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};
use domain::User;
use tracing::debug;

pub const SESSION_COOKIE: &str = ".ModDbSession";
pub const LINK_SECRET_COOKIE: &str = ".LinkToken";

/// Looks up a cookie by name in every `Cookie` header of the request.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim_matches('"').to_string())
}

fn cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> HeaderValue {
    let mut c = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name,
        value,
        max_age_secs.max(0)
    );
    if secure {
        c.push_str("; Secure");
    }
    // hex token 和固定名字，不会出现非法字符
    HeaderValue::from_str(&c).unwrap_or_else(|_| HeaderValue::from_static(""))
}

pub fn set_link_secret(headers: &mut HeaderMap, secret: &str, minutes: i64, secure: bool) {
    headers.append(SET_COOKIE, cookie(LINK_SECRET_COOKIE, secret, minutes * 60, secure));
}

pub fn clear_link_secret(headers: &mut HeaderMap, secure: bool) {
    headers.append(SET_COOKIE, cookie(LINK_SECRET_COOKIE, "", 0, secure));
}

pub fn set_session(headers: &mut HeaderMap, token: &str, expires_utc: DateTime<Utc>, secure: bool) {
    let max_age = (expires_utc - Utc::now()).num_seconds();
    headers.append(SET_COOKIE, cookie(SESSION_COOKIE, token, max_age, secure));
}

pub fn clear_session(headers: &mut HeaderMap, secure: bool) {
    headers.append(SET_COOKIE, cookie(SESSION_COOKIE, "", 0, secure));
}

/// The signed-in user. Rejects with 401 when the session cookie is missing,
/// unknown or expired.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, SESSION_COOKIE).ok_or(ApiError::Unauthorized)?;

        match state.accounts.authenticate(&token).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                debug!("session cookie did not match a live session");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_cookie_among_many() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; .LinkToken=abc123"));
        headers.append(COOKIE, HeaderValue::from_static(".ModDbSession=\"s1\""));

        assert_eq!(read_cookie(&headers, LINK_SECRET_COOKIE).as_deref(), Some("abc123"));
        assert_eq!(read_cookie(&headers, SESSION_COOKIE).as_deref(), Some("s1"));
        assert!(read_cookie(&headers, "missing").is_none());
    }

    #[test]
    fn cookies_are_http_only() {
        let mut headers = HeaderMap::new();
        set_link_secret(&mut headers, "deadbeef", 10, false);
        clear_session(&mut headers, true);

        let values: Vec<_> = headers.get_all(SET_COOKIE).iter().collect();
        assert_eq!(values.len(), 2);
        let link = values[0].to_str().unwrap();
        assert!(link.starts_with(".LinkToken=deadbeef;"));
        assert!(link.contains("HttpOnly"));
        assert!(link.contains("Max-Age=600"));
        let cleared = values[1].to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));
        assert!(cleared.ends_with("; Secure"));
    }
}
