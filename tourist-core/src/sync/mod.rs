//! Album synchronization: slot lifecycle, photo fetching and per-view
//! completion tracking.

pub mod engine;
pub mod session;

pub use engine::{AlbumSyncEngine, DEFAULT_DOWNLOAD_CONCURRENCY, ResolveOutcome};
pub use session::AlbumSession;
