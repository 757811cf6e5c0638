pub mod ports;
pub mod repositories;
pub mod sqlite;

pub use sqlite::SqliteDatabase;
