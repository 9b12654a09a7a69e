use crate::Db;
use chrono::Utc;
use sqlx::Row;

// 长期缓存：值为 JSON 文本，没有 TTL
impl Db {
    pub async fn get_cache_value(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM cache_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get(0)))
    }

    pub async fn set_cache_value(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cache_entries (key, value, time_updated_utc) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                time_updated_utc = excluded.time_updated_utc
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_cache_value(&self, key: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM cache_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upserts_cache_values() {
        let db = Db::in_memory().await.unwrap();
        assert!(db.get_cache_value("k").await.unwrap().is_none());

        db.set_cache_value("k", "{\"a\":1}").await.unwrap();
        db.set_cache_value("k", "{\"a\":2}").await.unwrap();
        assert_eq!(db.get_cache_value("k").await.unwrap().as_deref(), Some("{\"a\":2}"));

        db.remove_cache_value("k").await.unwrap();
        assert!(db.get_cache_value("k").await.unwrap().is_none());
    }
}
