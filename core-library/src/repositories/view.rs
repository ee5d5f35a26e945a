//! Read-only access to the `media_with_album` view

use crate::error::Result;
use crate::models::{MediaId, MediaWithAlbum};
use crate::repositories::{Page, PageRequest};
use async_trait::async_trait;
use sqlx::{query_as, query_scalar, SqlitePool};

const VIEW_COLUMNS: &str =
    "id, file, name, artist, track, album_name, album_year, album_cover";

/// Reads over media joined with their album.
///
/// Every media row shows up exactly once; album columns are `None` when
/// the row has no album or its album no longer exists.
#[async_trait]
pub trait MediaWithAlbumRepository: Send + Sync {
    async fn find_by_id(&self, id: MediaId) -> Result<Option<MediaWithAlbum>>;

    async fn find_by_file(&self, file: &str) -> Result<Option<MediaWithAlbum>>;

    /// All rows ordered by album name then track position
    async fn query(&self, page_request: PageRequest) -> Result<Page<MediaWithAlbum>>;

    /// Rows whose album has exactly this name
    async fn query_by_album_name(
        &self,
        album_name: &str,
        page_request: PageRequest,
    ) -> Result<Page<MediaWithAlbum>>;
}

/// SQLite implementation of MediaWithAlbumRepository
#[derive(Clone)]
pub struct SqliteMediaWithAlbumRepository {
    pool: SqlitePool,
}

impl SqliteMediaWithAlbumRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaWithAlbumRepository for SqliteMediaWithAlbumRepository {
    async fn find_by_id(&self, id: MediaId) -> Result<Option<MediaWithAlbum>> {
        let row = query_as::<_, MediaWithAlbum>(&format!(
            "SELECT {VIEW_COLUMNS} FROM media_with_album WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_file(&self, file: &str) -> Result<Option<MediaWithAlbum>> {
        let row = query_as::<_, MediaWithAlbum>(&format!(
            "SELECT {VIEW_COLUMNS} FROM media_with_album WHERE file = ?"
        ))
        .bind(file)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<MediaWithAlbum>> {
        let total: i64 = query_scalar("SELECT COUNT(*) FROM media_with_album")
            .fetch_one(&self.pool)
            .await?;

        let items = query_as::<_, MediaWithAlbum>(&format!(
            "SELECT {VIEW_COLUMNS} FROM media_with_album \
             ORDER BY album_name IS NULL, album_name, track IS NULL, track, name, id \
             LIMIT ? OFFSET ?"
        ))
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, total as u64, page_request))
    }

    async fn query_by_album_name(
        &self,
        album_name: &str,
        page_request: PageRequest,
    ) -> Result<Page<MediaWithAlbum>> {
        let total: i64 =
            query_scalar("SELECT COUNT(*) FROM media_with_album WHERE album_name = ?")
                .bind(album_name)
                .fetch_one(&self.pool)
                .await?;

        let items = query_as::<_, MediaWithAlbum>(&format!(
            "SELECT {VIEW_COLUMNS} FROM media_with_album WHERE album_name = ? \
             ORDER BY track IS NULL, track, name, id LIMIT ? OFFSET ?"
        ))
        .bind(album_name)
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, total as u64, page_request))
    }
}
