use super::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use super::verification::LinkCommentSource;
use crate::traits::AuthorDirectory;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use domain::{AccountLinkRequest, ErrorCode, ModDbError, User};
use std::sync::Arc;
use storage::Db;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct AccountOptions {
    pub link_token_expiration_minutes: i64,
    pub link_token_mod_post_url: String,
    pub session_lifetime_days: i64,
}

impl Default for AccountOptions {
    fn default() -> Self {
        Self {
            link_token_expiration_minutes: 10,
            link_token_mod_post_url: String::new(),
            session_lifetime_days: 14,
        }
    }
}

/// Public token and private secret of a freshly started link request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDetails {
    pub token: String,
    pub secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub expires_utc: DateTime<Utc>,
}

fn random_hex(bytes: usize) -> String {
    let raw: Vec<u8> = (0..bytes).map(|_| rand::random::<u8>()).collect();
    hex::encode(raw)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

fn rejected(code: ErrorCode) -> anyhow::Error {
    ModDbError::Account(code).into()
}

/// Links a legacy ModDB account to a new local user by having the user post
/// a one-off token as a comment on a known mod page.
pub struct AccountService {
    db: Db,
    comments: Arc<dyn LinkCommentSource>,
    authors: Arc<dyn AuthorDirectory>,
    options: AccountOptions,
}

impl AccountService {
    pub fn new(
        db: Db,
        comments: Arc<dyn LinkCommentSource>,
        authors: Arc<dyn AuthorDirectory>,
        options: AccountOptions,
    ) -> Self {
        Self {
            db,
            comments,
            authors,
            options,
        }
    }

    pub fn options(&self) -> &AccountOptions {
        &self.options
    }

    pub async fn start_account_link(&self, username: &str, email: &str) -> Result<LinkDetails> {
        if self.db.find_user_by_name(username).await?.is_some() {
            warn!(username, "user already exists");
            return Err(rejected(ErrorCode::AccountAlreadyExists));
        }

        let now = Utc::now();
        let purged = self
            .db
            .delete_link_requests_created_before(
                now - Duration::minutes(self.options.link_token_expiration_minutes),
            )
            .await?;
        if purged > 0 {
            debug!(purged, "purged expired link requests");
        }

        let details = LinkDetails {
            token: random_hex(16),
            secret: random_hex(32),
        };
        self.db
            .add_link_request(&AccountLinkRequest {
                username: username.to_string(),
                email: email.to_string(),
                link_token: details.token.clone(),
                secret: details.secret.clone(),
                time_created_utc: now,
                time_verified_utc: None,
            })
            .await?;

        info!(username, token = %details.token, "started account link");
        Ok(details)
    }

    /// Loads a request the caller proves ownership of. Expired requests are
    /// deleted on sight.
    async fn load_request(&self, token: &str, secret: Option<&str>) -> Result<AccountLinkRequest> {
        let Some(request) = self.db.get_link_request(token).await? else {
            warn!(token, "could not find link request");
            return Err(rejected(ErrorCode::InvalidLinkRequest));
        };

        let expired =
            request.is_expired(Utc::now(), self.options.link_token_expiration_minutes);
        let secret_ok = secret.is_some_and(|s| constant_time_eq(s, &request.secret));

        if expired {
            warn!(token, "link request has expired, deleting");
            self.db.delete_link_request(token).await?;
        }
        if !secret_ok {
            warn!(token, "link secret mismatch");
            return Err(rejected(ErrorCode::InvalidLinkRequest));
        }
        if expired {
            return Err(rejected(ErrorCode::LinkRequestExpired));
        }
        Ok(request)
    }

    pub async fn verify_account_link(&self, token: &str, secret: Option<&str>) -> Result<User> {
        debug!(token, "verifying account link");
        let request = self.load_request(token, secret).await?;

        let comments = self.comments.fetch_comments().await?;
        debug!(count = comments.len(), "fetched link post comments");

        let matched = comments
            .iter()
            .filter(|c| c.comment.contains(&request.link_token))
            .find(|c| c.author == request.username);
        if matched.is_none() {
            warn!(token, username = %request.username, "no comment with matching token and author");
            return Err(rejected(ErrorCode::LinkVerificationFailed));
        }

        let Some(mod_db_user_id) = self.authors.find_user_id(&request.username).await? else {
            warn!(username = %request.username, "legacy author id not found");
            return Err(rejected(ErrorCode::LinkVerificationFailed));
        };

        let Some(user) = self
            .db
            .create_user(&request.username, &request.email, Some(mod_db_user_id))
            .await?
        else {
            warn!(username = %request.username, "user already exists");
            return Err(rejected(ErrorCode::AccountAlreadyExists));
        };

        self.db.mark_link_request_verified(token, Utc::now()).await?;
        info!(username = %user.username, mod_db_user_id, "account link verified, user created");
        Ok(user)
    }

    pub async fn set_account_password(
        &self,
        user: &User,
        password: &str,
        token: &str,
        secret: Option<&str>,
    ) -> Result<()> {
        let request = self.load_request(token, secret).await?;

        if !request.is_verified() || !request.username.eq_ignore_ascii_case(&user.username) {
            warn!(token, username = %user.username, "link request not usable for this user");
            return Err(rejected(ErrorCode::InvalidLinkRequest));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(rejected(ErrorCode::PasswordBad));
        }

        let hash = hash_password(password)?;
        self.db.set_password_hash(user.id, &hash).await?;
        self.db.delete_link_request(token).await?;
        info!(username = %user.username, "account password set");
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let user = self.db.find_user_by_name(username).await?;
        match user {
            Some(user)
                if user
                    .password_hash
                    .as_deref()
                    .is_some_and(|h| verify_password(password, h)) =>
            {
                Ok(user)
            }
            _ => {
                warn!(username, "failed login");
                Err(ModDbError::Unauthorized.into())
            }
        }
    }

    pub async fn sign_in(&self, user: &User) -> Result<Session> {
        let token = random_hex(32);
        let expires_utc = Utc::now() + Duration::days(self.options.session_lifetime_days);
        self.db.create_session(user.id, &token, expires_utc).await?;
        Ok(Session { token, expires_utc })
    }

    pub async fn sign_out(&self, token: &str) -> Result<()> {
        self.db.delete_session(token).await
    }

    pub async fn authenticate(&self, token: &str) -> Result<Option<User>> {
        self.db.find_session_user(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::LinkComment;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeComments(Mutex<Vec<LinkComment>>);

    impl FakeComments {
        fn post(&self, author: &str, comment: &str) {
            self.0.lock().unwrap().push(LinkComment {
                author: author.into(),
                comment: comment.into(),
            });
        }
    }

    #[async_trait]
    impl LinkCommentSource for FakeComments {
        async fn fetch_comments(&self) -> Result<Vec<LinkComment>> {
            Ok(self.0.lock().unwrap().clone())
        }
    }

    struct FakeAuthors;

    #[async_trait]
    impl AuthorDirectory for FakeAuthors {
        async fn find_user_id(&self, username: &str) -> Result<Option<i64>> {
            Ok(match username {
                "alice" => Some(1001),
                _ => None,
            })
        }
    }

    async fn service() -> (AccountService, Arc<FakeComments>, Db) {
        let db = Db::in_memory().await.unwrap();
        let comments = Arc::new(FakeComments::default());
        let svc = AccountService::new(
            db.clone(),
            comments.clone(),
            Arc::new(FakeAuthors),
            AccountOptions::default(),
        );
        (svc, comments, db)
    }

    fn code(err: &anyhow::Error) -> Option<ErrorCode> {
        err.downcast_ref::<ModDbError>().and_then(ModDbError::error_code)
    }

    #[tokio::test]
    async fn start_creates_distinct_token_and_secret() {
        let (svc, _, db) = service().await;

        let details = svc.start_account_link("alice", "a@b.com").await.unwrap();
        assert_eq!(details.token.len(), 32);
        assert_eq!(details.secret.len(), 64);
        assert_ne!(details.token, details.secret);

        let stored = db.get_link_request(&details.token).await.unwrap().unwrap();
        assert_eq!(stored.username, "alice");
        assert_eq!(stored.email, "a@b.com");
        assert_eq!(stored.secret, details.secret);
    }

    #[tokio::test]
    async fn start_rejects_existing_user() {
        let (svc, _, db) = service().await;
        db.create_user("alice", "a@b.com", None).await.unwrap();

        let err = svc.start_account_link("Alice", "x@b.com").await.unwrap_err();
        assert_eq!(code(&err), Some(ErrorCode::AccountAlreadyExists));
    }

    #[tokio::test]
    async fn verify_rejects_wrong_or_missing_secret() {
        let (svc, comments, _) = service().await;
        let details = svc.start_account_link("alice", "a@b.com").await.unwrap();
        comments.post("alice", &details.token);

        let err = svc.verify_account_link(&details.token, Some("wrong")).await.unwrap_err();
        assert_eq!(code(&err), Some(ErrorCode::InvalidLinkRequest));
        let err = svc.verify_account_link(&details.token, None).await.unwrap_err();
        assert_eq!(code(&err), Some(ErrorCode::InvalidLinkRequest));
        let err = svc.verify_account_link("nope", Some(&details.secret)).await.unwrap_err();
        assert_eq!(code(&err), Some(ErrorCode::InvalidLinkRequest));
    }

    #[tokio::test]
    async fn verify_without_comment_fails() {
        let (svc, comments, _) = service().await;
        let details = svc.start_account_link("alice", "a@b.com").await.unwrap();
        comments.post("mallory", &format!("stolen {}", details.token));

        let err = svc
            .verify_account_link(&details.token, Some(&details.secret))
            .await
            .unwrap_err();
        assert_eq!(code(&err), Some(ErrorCode::LinkVerificationFailed));
    }

    #[tokio::test]
    async fn expired_request_is_rejected_and_removed() {
        let (svc, _, db) = service().await;
        db.add_link_request(&AccountLinkRequest {
            username: "alice".into(),
            email: "a@b.com".into(),
            link_token: "old".into(),
            secret: "s3cret".into(),
            time_created_utc: Utc::now() - Duration::minutes(11),
            time_verified_utc: None,
        })
        .await
        .unwrap();

        let err = svc.verify_account_link("old", Some("s3cret")).await.unwrap_err();
        assert_eq!(code(&err), Some(ErrorCode::LinkRequestExpired));
        assert!(db.get_link_request("old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn full_link_flow() {
        let (svc, comments, db) = service().await;
        let details = svc.start_account_link("alice", "a@b.com").await.unwrap();
        comments.post("bob", "unrelated");
        comments.post("alice", &format!("linking: {}", details.token));

        let user = svc
            .verify_account_link(&details.token, Some(&details.secret))
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.mod_db_user_id, Some(1001));
        assert!(db.get_link_request(&details.token).await.unwrap().unwrap().is_verified());

        let err = svc
            .set_account_password(&user, "short", &details.token, Some(&details.secret))
            .await
            .unwrap_err();
        assert_eq!(code(&err), Some(ErrorCode::PasswordBad));

        svc.set_account_password(&user, "correct horse", &details.token, Some(&details.secret))
            .await
            .unwrap();
        assert!(db.get_link_request(&details.token).await.unwrap().is_none());

        let logged_in = svc.login("alice", "correct horse").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        let err = svc.login("alice", "wrong horse").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ModDbError>(), Some(ModDbError::Unauthorized)));
    }

    #[tokio::test]
    async fn set_password_needs_verified_request() {
        let (svc, _, db) = service().await;
        let details = svc.start_account_link("alice", "a@b.com").await.unwrap();
        let user = db.create_user("alice", "a@b.com", None).await.unwrap().unwrap();

        let err = svc
            .set_account_password(&user, "long enough", &details.token, Some(&details.secret))
            .await
            .unwrap_err();
        assert_eq!(code(&err), Some(ErrorCode::InvalidLinkRequest));
    }

    #[tokio::test]
    async fn unknown_legacy_author_fails_verification() {
        let (svc, comments, _) = service().await;
        let details = svc.start_account_link("carol", "c@b.com").await.unwrap();
        comments.post("carol", &details.token);

        let err = svc
            .verify_account_link(&details.token, Some(&details.secret))
            .await
            .unwrap_err();
        assert_eq!(code(&err), Some(ErrorCode::LinkVerificationFailed));
    }

    #[tokio::test]
    async fn sessions_authenticate_until_signed_out() {
        let (svc, _, db) = service().await;
        let user = db.create_user("alice", "a@b.com", None).await.unwrap().unwrap();

        let session = svc.sign_in(&user).await.unwrap();
        assert_eq!(svc.authenticate(&session.token).await.unwrap().unwrap().id, user.id);

        svc.sign_out(&session.token).await.unwrap();
        assert!(svc.authenticate(&session.token).await.unwrap().is_none());
    }
}
