use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::{
    database::ports::settings::SettingsRepository,
    error::{AlbumError, Result},
};

#[derive(Clone, Debug)]
pub struct SqliteSettingsRepository {
    pool: SqlitePool,
}

impl SqliteSettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for SqliteSettingsRepository {
    async fn put(&self, key: &str, value: &Value) -> Result<()> {
        let encoded = serde_json::to_string(value).map_err(|err| {
            AlbumError::InvalidInput(format!("setting {key}: {err}"))
        })?;

        sqlx::query(
            "INSERT INTO app_settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(encoded)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT value FROM app_settings WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        raw.map(|raw| {
            serde_json::from_str(&raw).map_err(|err| {
                AlbumError::Parse(format!("stored setting {key}: {err}"))
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::SqliteDatabase;
    use serde_json::json;

    #[tokio::test]
    async fn put_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let db = SqliteDatabase::open(&dir.path().join("tourist.db"))
            .await
            .unwrap();
        let repo = db.settings();

        assert!(repo.get("map.viewport").await.unwrap().is_none());
        repo.put("map.viewport", &json!({"zoom": 1})).await.unwrap();
        repo.put("map.viewport", &json!({"zoom": 2})).await.unwrap();

        assert_eq!(
            repo.get("map.viewport").await.unwrap(),
            Some(json!({"zoom": 2}))
        );
    }
}
