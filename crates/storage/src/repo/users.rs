use crate::{models::SqlUser, Db};
use chrono::Utc;
use domain::User;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, mod_db_user_id, time_created_utc";

impl Db {
    /// Inserts a user, returns `None` when the username is already taken.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        mod_db_user_id: Option<i64>,
    ) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, SqlUser>(&format!(
            r#"
            INSERT INTO users (username, email, mod_db_user_id, time_created_utc)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(username) DO NOTHING
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(username)
        .bind(email)
        .bind(mod_db_user_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn find_user_by_name(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, SqlUser>(&format!(
            "SELECT {} FROM users WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn find_user_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, SqlUser>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn set_password_hash(&self, user_id: i64, hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
