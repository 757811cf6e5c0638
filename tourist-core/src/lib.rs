//! Core library for Tourist.
//!
//! Markers placed on a map each own a fixed-size album of photo slots. The
//! slots are filled with random photos found near the marker through the
//! Flickr search API and cached on disk so albums survive restarts.
//!
//! Layers, leaf-first:
//! - [`database`]: SQLite repositories behind async ports
//! - [`infra`]: the image cache and the remote photo search client
//! - [`sync`]: the album synchronization engine and view sessions
//! - [`application`]: the facade a front end drives
#![allow(missing_docs)]

pub mod application;
pub mod database;
pub mod error;
pub mod infra;
pub mod sync;

/// Embedded schema migrations for the SQLite store.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use application::{AppUnitOfWork, TouristFacade};
pub use database::SqliteDatabase;
pub use error::{AlbumError, Result};
pub use infra::{
    cache::ImageCache,
    providers::{FlickrClient, FlickrConfig, RemoteImageSearch, SearchOutcome},
};
pub use sync::{AlbumSession, AlbumSyncEngine, ResolveOutcome};
pub use tourist_model as model;
