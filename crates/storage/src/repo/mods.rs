use crate::{
    models::{SqlAsset, SqlMod, SqlModComment},
    Db,
};
use chrono::Utc;
use domain::{LocalMod, LocalModComment, ModCommentContentType, StoredAsset};
use sqlx::Row;

const MOD_SELECT: &str = r#"
    SELECT
        m.id, m.name, m.summary, m.url_alias, m.description,
        m.time_created_utc, m.time_updated_utc,
        (SELECT COUNT(*) FROM mod_comments c WHERE c.mod_id = m.id) AS comment_count
    FROM mods m
"#;

const COMMENT_SELECT: &str = r#"
    SELECT
        c.id, c.mod_id, u.username AS author, c.comment, c.content_type,
        c.time_created_utc, c.time_updated_utc
    FROM mod_comments c
    JOIN users u ON u.id = c.user_id
"#;

impl Db {
    pub async fn create_mod(
        &self,
        name: &str,
        summary: &str,
        url_alias: Option<&str>,
        description: Option<&str>,
        tags: &[&str],
    ) -> anyhow::Result<i64> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let id: i64 = sqlx::query(
            r#"
            INSERT INTO mods (name, summary, url_alias, description, time_created_utc, time_updated_utc)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(summary)
        .bind(url_alias)
        .bind(description)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?
        .get(0);

        for tag in tags {
            sqlx::query("INSERT INTO mod_tags (mod_id, value) VALUES (?, ?)")
                .bind(id)
                .bind(*tag)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    pub async fn add_mod_comment(
        &self,
        mod_id: i64,
        user_id: i64,
        comment: &str,
        content_type: ModCommentContentType,
    ) -> anyhow::Result<i64> {
        let id: i64 = sqlx::query(
            r#"
            INSERT INTO mod_comments (mod_id, user_id, comment, content_type, time_created_utc)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(mod_id)
        .bind(user_id)
        .bind(comment)
        .bind(content_type.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?
        .get(0);
        Ok(id)
    }

    pub async fn find_mod_by_id(&self, id: i64) -> anyhow::Result<Option<LocalMod>> {
        let row = sqlx::query_as::<_, SqlMod>(&format!("{} WHERE m.id = ?", MOD_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        self.with_tags(row).await
    }

    pub async fn find_mod_by_url_alias(&self, alias: &str) -> anyhow::Result<Option<LocalMod>> {
        let row = sqlx::query_as::<_, SqlMod>(&format!("{} WHERE m.url_alias = ?", MOD_SELECT))
            .bind(alias)
            .fetch_optional(&self.pool)
            .await?;
        self.with_tags(row).await
    }

    pub async fn find_mod_id_by_alias(&self, alias: &str) -> anyhow::Result<Option<i64>> {
        let row = sqlx::query("SELECT id FROM mods WHERE url_alias = ? LIMIT 1")
            .bind(alias)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get(0)))
    }

    /// Newest mods first.
    pub async fn list_latest_mods(&self, count: i64) -> anyhow::Result<Vec<LocalMod>> {
        let rows = sqlx::query_as::<_, SqlMod>(&format!("{} ORDER BY m.id DESC LIMIT ?", MOD_SELECT))
            .bind(count)
            .fetch_all(&self.pool)
            .await?;

        let mut mods = Vec::with_capacity(rows.len());
        for row in rows {
            let tags = self.get_mod_tags(row.id).await?;
            mods.push(row.into_mod(tags));
        }
        Ok(mods)
    }

    pub async fn get_mod_tags(&self, mod_id: i64) -> anyhow::Result<Vec<String>> {
        let rows = sqlx::query("SELECT value FROM mod_tags WHERE mod_id = ? ORDER BY id")
            .bind(mod_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.get(0)).collect())
    }

    pub async fn get_comments_by_mod_id(&self, mod_id: i64) -> anyhow::Result<Vec<LocalModComment>> {
        let rows = sqlx::query_as::<_, SqlModComment>(&format!(
            "{} WHERE c.mod_id = ? ORDER BY c.time_created_utc ASC, c.id ASC",
            COMMENT_SELECT
        ))
        .bind(mod_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn list_latest_comments(&self, count: i64) -> anyhow::Result<Vec<LocalModComment>> {
        let rows = sqlx::query_as::<_, SqlModComment>(&format!(
            "{} ORDER BY c.time_created_utc DESC, c.id DESC LIMIT ?",
            COMMENT_SELECT
        ))
        .bind(count)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn find_mod_banner(&self, mod_id: i64) -> anyhow::Result<Option<StoredAsset>> {
        let row = sqlx::query_as::<_, SqlAsset>(
            r#"
            SELECT a.id, a.file_name, a.content_type, a.asset_path
            FROM mods m
            JOIN assets a ON a.id = m.banner_id
            WHERE m.id = ?
            "#,
        )
        .bind(mod_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Points the mod's banner at a new asset record and drops the previous one.
    pub async fn update_mod_banner(
        &self,
        mod_id: i64,
        asset_path: &str,
        file_name: &str,
        content_type: &str,
    ) -> anyhow::Result<StoredAsset> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<i64> = sqlx::query("SELECT banner_id FROM mods WHERE id = ?")
            .bind(mod_id)
            .fetch_optional(&mut *tx)
            .await?
            .and_then(|r| r.get(0));

        let asset = sqlx::query_as::<_, SqlAsset>(
            r#"
            INSERT INTO assets (file_name, content_type, asset_path)
            VALUES (?, ?, ?)
            RETURNING id, file_name, content_type, asset_path
            "#,
        )
        .bind(file_name)
        .bind(content_type)
        .bind(asset_path)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE mods SET banner_id = ?, time_updated_utc = ? WHERE id = ?")
            .bind(asset.id)
            .bind(Utc::now())
            .bind(mod_id)
            .execute(&mut *tx)
            .await?;

        if let Some(old_id) = previous {
            sqlx::query("DELETE FROM assets WHERE id = ?")
                .bind(old_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(asset.into())
    }

    pub async fn delete_mod(&self, mod_id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM mods WHERE id = ?")
            .bind(mod_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn with_tags(&self, row: Option<SqlMod>) -> anyhow::Result<Option<LocalMod>> {
        match row {
            Some(row) => {
                let tags = self.get_mod_tags(row.id).await?;
                Ok(Some(row.into_mod(tags)))
            }
            None => Ok(None),
        }
    }
}
