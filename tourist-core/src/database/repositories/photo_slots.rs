use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use tourist_model::{MarkerId, PhotoSlot, SlotId};
use tracing::debug;
use uuid::Uuid;

use crate::{
    database::{
        ports::photo_slots::PhotoSlotRepository,
        repositories::classify_write_error,
    },
    error::{AlbumError, Result},
};

#[derive(Debug, FromRow)]
struct SlotRow {
    id: Uuid,
    marker_id: Uuid,
    position: i64,
    cache_key: Option<String>,
}

impl TryFrom<SlotRow> for PhotoSlot {
    type Error = AlbumError;

    fn try_from(row: SlotRow) -> Result<Self> {
        let position = u32::try_from(row.position).map_err(|_| {
            AlbumError::Parse(format!(
                "photo slot {} has position {}",
                row.id, row.position
            ))
        })?;
        Ok(PhotoSlot {
            id: SlotId(row.id),
            marker_id: MarkerId(row.marker_id),
            position,
            cache_key: row.cache_key,
        })
    }
}

#[derive(Clone, Debug)]
pub struct SqlitePhotoSlotRepository {
    pool: SqlitePool,
}

impl SqlitePhotoSlotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn update_cache_key(
        &self,
        slot_id: SlotId,
        cache_key: Option<&str>,
    ) -> Result<PhotoSlot> {
        let row = sqlx::query_as::<_, SlotRow>(
            "UPDATE photo_slots SET cache_key = ?1 WHERE id = ?2
             RETURNING id, marker_id, position, cache_key",
        )
        .bind(cache_key)
        .bind(slot_id.to_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| AlbumError::NotFound(format!("photo slot {slot_id}")))?
            .try_into()
    }
}

#[async_trait]
impl PhotoSlotRepository for SqlitePhotoSlotRepository {
    async fn slots_for(&self, marker_id: MarkerId) -> Result<Vec<PhotoSlot>> {
        let rows = sqlx::query_as::<_, SlotRow>(
            "SELECT id, marker_id, position, cache_key FROM photo_slots
             WHERE marker_id = ?1
             ORDER BY position",
        )
        .bind(marker_id.to_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PhotoSlot::try_from).collect()
    }

    async fn get(&self, slot_id: SlotId) -> Result<Option<PhotoSlot>> {
        let row = sqlx::query_as::<_, SlotRow>(
            "SELECT id, marker_id, position, cache_key FROM photo_slots WHERE id = ?1",
        )
        .bind(slot_id.to_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PhotoSlot::try_from).transpose()
    }

    async fn create_empty_slots(
        &self,
        marker_id: MarkerId,
        count: u32,
    ) -> Result<Vec<PhotoSlot>> {
        if count == 0 {
            return Err(AlbumError::Precondition(
                "an album needs at least one slot".into(),
            ));
        }

        // Inserting first takes the write lock up front; an existing batch
        // always occupies position 0, so the unique index rejects a second one.
        let mut tx = self.pool.begin().await?;
        let mut slots = Vec::with_capacity(count as usize);
        for position in 0..count {
            let slot = PhotoSlot {
                id: SlotId::new(),
                marker_id,
                position,
                cache_key: None,
            };
            sqlx::query(
                "INSERT INTO photo_slots (id, marker_id, position, cache_key) VALUES (?1, ?2, ?3, NULL)",
            )
            .bind(slot.id.to_uuid())
            .bind(marker_id.to_uuid())
            .bind(i64::from(position))
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                classify_write_error(err, || {
                    format!("photo slots for marker {marker_id}")
                })
            })?;
            slots.push(slot);
        }

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM photo_slots WHERE marker_id = ?1",
        )
        .bind(marker_id.to_uuid())
        .fetch_one(&mut *tx)
        .await?;
        if total != i64::from(count) {
            return Err(AlbumError::Precondition(format!(
                "marker {marker_id} already owns photo slots"
            )));
        }

        tx.commit().await?;
        debug!(marker_id = %marker_id, count, "photo slots created");
        Ok(slots)
    }

    async fn set_cache_key(
        &self,
        slot_id: SlotId,
        cache_key: &str,
    ) -> Result<PhotoSlot> {
        self.update_cache_key(slot_id, Some(cache_key)).await
    }

    async fn clear_cache_key(&self, slot_id: SlotId) -> Result<PhotoSlot> {
        self.update_cache_key(slot_id, None).await
    }

    async fn delete_all(&self, marker_id: MarkerId) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM photo_slots WHERE marker_id = ?1")
            .bind(marker_id.to_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows)
    }

    async fn count_references(&self, cache_key: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM photo_slots WHERE cache_key = ?1",
        )
        .bind(cache_key)
        .fetch_one(&self.pool)
        .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
