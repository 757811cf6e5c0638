//! Configuration loading for Tourist.
//!
//! Values come from environment variables (optionally seeded from a `.env`
//! file), a `tourist.toml` file and built-in defaults, in that order of
//! precedence. Loading validates the result and returns non-fatal findings
//! as [`ConfigWarnings`].
#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{
    ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError,
};
pub use models::{
    AlbumConfig, CacheConfig, Config, ConfigMetadata, DatabaseConfig,
    SearchConfig,
};
pub use validation::{ConfigValidationError, ConfigWarning, ConfigWarnings};
