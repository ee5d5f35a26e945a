//! # Library Management Module
//!
//! Owns the canonical media library database and provides repository patterns
//! for data access.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite schema (tables, indexes, default-album trigger, read view)
//! - Connection pooling with idempotent schema application
//! - Repository patterns for albums, media and the `media_with_album` view
//! - Batched import sessions used by the folder scanner

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod store;
mod sql_util;

pub use error::{LibraryError, Result};
pub use models::{
    Album, AlbumId, Media, MediaId, MediaWithAlbum, NewAlbum, NewMedia, DEFAULT_ALBUM_NAME,
};
pub use store::{ImportSession, ImportStats, ImportedTrack, Library, OrphanPolicy};
