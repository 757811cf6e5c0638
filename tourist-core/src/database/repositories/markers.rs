use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tourist_model::{Coordinate, Marker, MarkerId};
use tracing::debug;
use uuid::Uuid;

use crate::{
    database::ports::markers::MarkerRepository,
    error::{AlbumError, Result},
};

#[derive(Debug, FromRow)]
struct MarkerRow {
    id: Uuid,
    latitude: f64,
    longitude: f64,
    created_at: DateTime<Utc>,
}

impl From<MarkerRow> for Marker {
    fn from(row: MarkerRow) -> Self {
        Marker {
            id: MarkerId(row.id),
            latitude: row.latitude,
            longitude: row.longitude,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SqliteMarkerRepository {
    pool: SqlitePool,
}

impl SqliteMarkerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MarkerRepository for SqliteMarkerRepository {
    async fn create(&self, coordinate: Coordinate) -> Result<Marker> {
        let marker = Marker {
            id: MarkerId::new(),
            latitude: coordinate.latitude(),
            longitude: coordinate.longitude(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO markers (id, latitude, longitude, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(marker.id.to_uuid())
        .bind(marker.latitude)
        .bind(marker.longitude)
        .bind(marker.created_at)
        .execute(&self.pool)
        .await?;

        debug!(marker_id = %marker.id, "marker row inserted");
        Ok(marker)
    }

    async fn list_all(&self) -> Result<Vec<Marker>> {
        let rows = sqlx::query_as::<_, MarkerRow>(
            "SELECT id, latitude, longitude, created_at FROM markers ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Marker::from).collect())
    }

    async fn find(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<Marker>> {
        let row = sqlx::query_as::<_, MarkerRow>(
            "SELECT id, latitude, longitude, created_at FROM markers
             WHERE latitude = ?1 AND longitude = ?2
             ORDER BY created_at, id
             LIMIT 1",
        )
        .bind(latitude)
        .bind(longitude)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Marker::from))
    }

    async fn get(&self, id: MarkerId) -> Result<Option<Marker>> {
        let row = sqlx::query_as::<_, MarkerRow>(
            "SELECT id, latitude, longitude, created_at FROM markers WHERE id = ?1",
        )
        .bind(id.to_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Marker::from))
    }

    async fn delete(&self, id: MarkerId) -> Result<()> {
        let rows = sqlx::query("DELETE FROM markers WHERE id = ?1")
            .bind(id.to_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AlbumError::NotFound(format!("marker {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::SqliteDatabase;
    use tempfile::TempDir;

    async fn repo() -> (TempDir, SqliteMarkerRepository) {
        let dir = tempfile::tempdir().unwrap();
        let db = SqliteDatabase::open(&dir.path().join("tourist.db"))
            .await
            .unwrap();
        (dir, SqliteMarkerRepository::new(db.pool().clone()))
    }

    #[tokio::test]
    async fn find_uses_exact_coordinates() {
        let (_dir, repo) = repo().await;
        let coordinate = Coordinate::new(37.7749, -122.4194).unwrap();
        let created = repo.create(coordinate).await.unwrap();

        let found = repo.find(37.7749, -122.4194).await.unwrap();
        assert_eq!(found.map(|m| m.id), Some(created.id));

        let nearby = repo.find(37.77490001, -122.4194).await.unwrap();
        assert!(nearby.is_none());
    }

    #[tokio::test]
    async fn list_all_returns_creation_order() {
        let (_dir, repo) = repo().await;
        let first = repo.create(Coordinate::new(1.0, 1.0).unwrap()).await.unwrap();
        let second =
            repo.create(Coordinate::new(2.0, 2.0).unwrap()).await.unwrap();

        let ids: Vec<_> =
            repo.list_all().await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn deleting_twice_reports_not_found() {
        let (_dir, repo) = repo().await;
        let marker = repo.create(Coordinate::new(0.0, 0.0).unwrap()).await.unwrap();

        repo.delete(marker.id).await.unwrap();
        assert!(repo.get(marker.id).await.unwrap().is_none());
        assert!(repo.delete(marker.id).await.unwrap_err().is_not_found());
    }
}
