use crate::{models::SqlUser, Db};
use chrono::{DateTime, Utc};
use domain::User;
use sha2::{Digest, Sha256};

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

impl Db {
    pub async fn create_session(
        &self,
        user_id: i64,
        token: &str,
        expires_utc: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO sessions (token_hash, user_id, expires_utc) VALUES (?, ?, ?)")
            .bind(hash_token(token))
            .bind(user_id)
            .bind(expires_utc)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Resolves a session cookie to its user, ignoring expired sessions.
    pub async fn find_session_user(&self, token: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, SqlUser>(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.mod_db_user_id, u.time_created_utc
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = ? AND s.expires_utc > ?
            "#,
        )
        .bind(hash_token(token))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn delete_session(&self, token: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(hash_token(token))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_expired_sessions(&self) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_utc <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
