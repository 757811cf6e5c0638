use std::{any::type_name_of_val, fmt, sync::Arc};

use crate::database::{
    SqliteDatabase,
    ports::{MarkerRepository, PhotoSlotRepository, SettingsRepository},
};

/// Repository ports used by the application services.
#[derive(Clone)]
pub struct AppUnitOfWork {
    pub markers: Arc<dyn MarkerRepository>,
    pub photo_slots: Arc<dyn PhotoSlotRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl fmt::Debug for AppUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWork")
            .field("markers", &type_name_of_val(self.markers.as_ref()))
            .field("photo_slots", &type_name_of_val(self.photo_slots.as_ref()))
            .field("settings", &type_name_of_val(self.settings.as_ref()))
            .finish()
    }
}

impl AppUnitOfWork {
    pub fn from_sqlite(db: &SqliteDatabase) -> Self {
        Self {
            markers: db.markers(),
            photo_slots: db.photo_slots(),
            settings: db.settings(),
        }
    }
}
