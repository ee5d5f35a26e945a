//! # Repository Pattern Implementation
//!
//! This module provides repository traits and implementations for data access.
//! Each entity has a corresponding repository with CRUD operations, querying,
//! and pagination support.
//!
//! ## Architecture
//!
//! - Traits define the interface for each repository
//! - SQLite implementations use sqlx for async database access
//! - All operations return `Result<T>` for error handling
//! - Pagination is supported via the `Page<T>` wrapper
//!
//! ## Available Repositories
//!
//! - `AlbumRepository` - Albums, including the "Unknown Album" sentinel
//! - `MediaRepository` - Playable files and their album assignment
//! - `MediaWithAlbumRepository` - Read-only joined rows from `media_with_album`

pub mod album;
pub mod media;
pub mod pagination;
pub mod view;

pub use album::{AlbumRepository, SqliteAlbumRepository};
pub use media::{MediaRepository, SqliteMediaRepository};
pub use pagination::{Page, PageRequest, MAX_PAGE_SIZE};
pub use view::{MediaWithAlbumRepository, SqliteMediaWithAlbumRepository};
