//! Core data model definitions shared across Tourist crates.
#![allow(missing_docs)]

pub mod error;
pub mod events;
pub mod ids;
pub mod image;
pub mod marker;
pub mod slot;
pub mod viewport;

// Intentionally curated re-exports for downstream consumers.
pub use error::{ModelError, Result as ModelResult};
pub use events::{AlbumEvent, ChangeSet, SlotFailure};
pub use ids::{MarkerId, SlotId};
pub use image::{BoundingBox, ImageRef};
pub use marker::{Coordinate, Marker};
pub use slot::{PhotoSlot, SlotState};
pub use viewport::Viewport;
