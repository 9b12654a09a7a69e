use crate::{models::SqlLinkRequest, Db};
use chrono::{DateTime, Utc};
use domain::AccountLinkRequest;

impl Db {
    pub async fn add_link_request(&self, req: &AccountLinkRequest) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO account_link_requests (
                username, email, link_token, secret, time_created_utc, time_verified_utc
            )
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&req.username)
        .bind(&req.email)
        .bind(&req.link_token)
        .bind(&req.secret)
        .bind(req.time_created_utc)
        .bind(req.time_verified_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_link_request(&self, token: &str) -> anyhow::Result<Option<AccountLinkRequest>> {
        let row = sqlx::query_as::<_, SqlLinkRequest>(
            r#"
            SELECT username, email, link_token, secret, time_created_utc, time_verified_utc
            FROM account_link_requests
            WHERE link_token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn mark_link_request_verified(
        &self,
        token: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE account_link_requests SET time_verified_utc = ? WHERE link_token = ?")
            .bind(at)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_link_request(&self, token: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM account_link_requests WHERE link_token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Removes every request created before `cutoff`, returns how many were deleted.
    pub async fn delete_link_requests_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM account_link_requests WHERE time_created_utc < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(token: &str, created: DateTime<Utc>) -> AccountLinkRequest {
        AccountLinkRequest {
            username: "alice".into(),
            email: "a@b.com".into(),
            link_token: token.into(),
            secret: format!("{}-secret", token),
            time_created_utc: created,
            time_verified_utc: None,
        }
    }

    #[tokio::test]
    async fn link_request_lifecycle() {
        let db = Db::in_memory().await.unwrap();
        let now = Utc::now();
        db.add_link_request(&request("tok1", now)).await.unwrap();

        let stored = db.get_link_request("tok1").await.unwrap().unwrap();
        assert_eq!(stored.username, "alice");
        assert_eq!(stored.secret, "tok1-secret");
        assert!(!stored.is_verified());

        db.mark_link_request_verified("tok1", now).await.unwrap();
        assert!(db.get_link_request("tok1").await.unwrap().unwrap().is_verified());

        db.delete_link_request("tok1").await.unwrap();
        assert!(db.get_link_request("tok1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn link_token_is_unique() {
        let db = Db::in_memory().await.unwrap();
        db.add_link_request(&request("dup", Utc::now())).await.unwrap();
        assert!(db.add_link_request(&request("dup", Utc::now())).await.is_err());
    }

    #[tokio::test]
    async fn purges_old_requests() {
        let db = Db::in_memory().await.unwrap();
        let now = Utc::now();
        db.add_link_request(&request("old", now - Duration::hours(2))).await.unwrap();
        db.add_link_request(&request("new", now)).await.unwrap();

        let removed = db
            .delete_link_requests_created_before(now - Duration::minutes(10))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert!(db.get_link_request("old").await.unwrap().is_none());
        assert!(db.get_link_request("new").await.unwrap().is_some());
    }
}
