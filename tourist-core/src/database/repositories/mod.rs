pub mod markers;
pub mod photo_slots;
pub mod settings;

pub use markers::SqliteMarkerRepository;
pub use photo_slots::SqlitePhotoSlotRepository;
pub use settings::SqliteSettingsRepository;

use crate::error::AlbumError;

/// Maps constraint violations onto the engine's error kinds; everything else
/// stays a database error.
pub(crate) fn classify_write_error(
    err: sqlx::Error,
    what: impl FnOnce() -> String,
) -> AlbumError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AlbumError::Precondition(format!(
                "{} already exists",
                what()
            ));
        }
        if db_err.is_foreign_key_violation() {
            return AlbumError::NotFound(format!("owner of {}", what()));
        }
    }
    AlbumError::Database(err)
}
