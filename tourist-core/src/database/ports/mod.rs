//! Repository ports (interfaces) for the marker graph.
//!
//! The sync engine only talks to these traits; the SQLite adapters live in
//! `database::repositories` and tests substitute their own implementations.

pub mod markers;
pub mod photo_slots;
pub mod settings;

pub use markers::MarkerRepository;
pub use photo_slots::PhotoSlotRepository;
pub use settings::SettingsRepository;
