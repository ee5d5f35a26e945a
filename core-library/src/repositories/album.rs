//! Album repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{Album, AlbumId, NewAlbum, DEFAULT_ALBUM_NAME};
use crate::repositories::{Page, PageRequest};
use crate::sql_util::{
    contains_pattern, generate_parameterized_bindings, MAX_BINDINGS_PER_STATEMENT,
};
use async_trait::async_trait;
use sqlx::{query, query_as, query_scalar, Executor, Sqlite, SqlitePool};
use tracing::debug;

const ALBUM_COLUMNS: &str = "id, name, year, track, cover, is_default";

/// Album repository interface for data access operations
///
/// Deletes never leave the table empty: the store's `ensure_default_album`
/// trigger inserts a fresh "Unknown Album" whenever the last row goes.
#[async_trait]
pub trait AlbumRepository: Send + Sync {
    /// Find an album by its ID
    ///
    /// # Returns
    /// - `Ok(Some(album))` if found
    /// - `Ok(None)` if not found
    /// - `Err` if database error occurs
    async fn find_by_id(&self, id: AlbumId) -> Result<Option<Album>>;

    /// The album flagged as the "Unknown Album" sentinel, if one exists
    async fn find_default(&self) -> Result<Option<Album>>;

    /// Find an album by exact name and cover
    ///
    /// `cover = None` only matches albums without a cover.
    async fn find_by_name_and_cover(&self, name: &str, cover: Option<&str>)
        -> Result<Option<Album>>;

    /// Insert a new album and return its assigned ID
    ///
    /// # Errors
    /// Returns error if:
    /// - Album validation fails
    /// - Database error occurs
    async fn insert(&self, album: &NewAlbum) -> Result<AlbumId>;

    /// Replace the fields of an existing album
    ///
    /// The default flag survives only while the row still reads as a bare
    /// "Unknown Album"; any other edit turns it into an ordinary album.
    ///
    /// # Errors
    /// Returns error if:
    /// - Album does not exist
    /// - Album validation fails
    /// - Database error occurs
    async fn update(&self, id: AlbumId, album: &NewAlbum) -> Result<()>;

    /// Delete an album by ID
    ///
    /// # Returns
    /// - `Ok(true)` if album was deleted
    /// - `Ok(false)` if album was not found
    async fn delete(&self, id: AlbumId) -> Result<bool>;

    /// Delete several albums in one statement, returning the number removed
    async fn delete_many(&self, ids: &[AlbumId]) -> Result<u64>;

    /// Delete every album; the store is left with a single fresh default
    async fn delete_all(&self) -> Result<u64>;

    /// Query albums ordered by name
    async fn query(&self, page_request: PageRequest) -> Result<Page<Album>>;

    /// Albums whose name contains `fragment` (case-insensitive for ASCII)
    async fn search(&self, fragment: &str, page_request: PageRequest) -> Result<Page<Album>>;

    /// Count total albums
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of AlbumRepository
#[derive(Clone)]
pub struct SqliteAlbumRepository {
    pool: SqlitePool,
}

impl SqliteAlbumRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn validate(album: &NewAlbum) -> Result<()> {
    album.validate().map_err(|message| LibraryError::InvalidInput {
        field: "album".to_string(),
        message,
    })
}

/// Insert usable on a pool or inside a transaction.
pub(crate) async fn insert_album<'e, E>(executor: E, album: &NewAlbum) -> Result<AlbumId>
where
    E: Executor<'e, Database = Sqlite>,
{
    validate(album)?;

    let id: i64 = query_scalar(
        r#"
        INSERT INTO album (name, year, track, cover)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&album.name)
    .bind(album.year)
    .bind(album.track)
    .bind(&album.cover)
    .fetch_one(executor)
    .await?;

    debug!(album_id = id, name = %album.name, "Inserted album");
    Ok(AlbumId(id))
}

/// Null-safe lookup on `(name, cover)`, lowest id first.
pub(crate) async fn find_album_id<'e, E>(
    executor: E,
    name: &str,
    cover: Option<&str>,
) -> Result<Option<AlbumId>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = query_scalar::<_, i64>(
        "SELECT id FROM album WHERE name = ? AND cover IS ? ORDER BY id LIMIT 1",
    )
    .bind(name)
    .bind(cover)
    .fetch_optional(executor)
    .await?;

    Ok(id.map(AlbumId))
}

#[async_trait]
impl AlbumRepository for SqliteAlbumRepository {
    async fn find_by_id(&self, id: AlbumId) -> Result<Option<Album>> {
        let album = query_as::<_, Album>(&format!(
            "SELECT {ALBUM_COLUMNS} FROM album WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(album)
    }

    async fn find_default(&self) -> Result<Option<Album>> {
        let album = query_as::<_, Album>(&format!(
            "SELECT {ALBUM_COLUMNS} FROM album WHERE is_default = 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(album)
    }

    async fn find_by_name_and_cover(
        &self,
        name: &str,
        cover: Option<&str>,
    ) -> Result<Option<Album>> {
        let album = query_as::<_, Album>(&format!(
            "SELECT {ALBUM_COLUMNS} FROM album WHERE name = ? AND cover IS ? ORDER BY id LIMIT 1"
        ))
        .bind(name)
        .bind(cover)
        .fetch_optional(&self.pool)
        .await?;

        Ok(album)
    }

    async fn insert(&self, album: &NewAlbum) -> Result<AlbumId> {
        insert_album(&self.pool, album).await
    }

    async fn update(&self, id: AlbumId, album: &NewAlbum) -> Result<()> {
        validate(album)?;

        let result = query(
            r#"
            UPDATE album
            SET name = ?, year = ?, track = ?, cover = ?,
                is_default = (is_default AND ? = ? AND ? IS NULL AND ? IS NULL AND ? IS NULL)
            WHERE id = ?
            "#,
        )
        .bind(&album.name)
        .bind(album.year)
        .bind(album.track)
        .bind(&album.cover)
        .bind(&album.name)
        .bind(DEFAULT_ALBUM_NAME)
        .bind(album.year)
        .bind(album.track)
        .bind(&album.cover)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::album_not_found(id));
        }

        Ok(())
    }

    async fn delete(&self, id: AlbumId) -> Result<bool> {
        let result = query("DELETE FROM album WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_many(&self, ids: &[AlbumId]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut deleted = 0;
        for chunk in ids.chunks(MAX_BINDINGS_PER_STATEMENT) {
            let sql = format!(
                "DELETE FROM album WHERE id IN ({})",
                generate_parameterized_bindings(chunk.len())
            );
            let mut statement = query(&sql);
            for id in chunk {
                statement = statement.bind(*id);
            }
            deleted += statement.execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        debug!(requested = ids.len(), deleted, "Deleted albums");
        Ok(deleted)
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = query("DELETE FROM album").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<Album>> {
        let total = self.count().await?;

        let albums = query_as::<_, Album>(&format!(
            "SELECT {ALBUM_COLUMNS} FROM album ORDER BY name ASC, id ASC LIMIT ? OFFSET ?"
        ))
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(albums, total as u64, page_request))
    }

    async fn search(&self, fragment: &str, page_request: PageRequest) -> Result<Page<Album>> {
        let pattern = contains_pattern(fragment);

        let total: i64 = query_scalar("SELECT COUNT(*) FROM album WHERE name LIKE ? ESCAPE '\\'")
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let albums = query_as::<_, Album>(&format!(
            "SELECT {ALBUM_COLUMNS} FROM album WHERE name LIKE ? ESCAPE '\\' \
             ORDER BY name ASC, id ASC LIMIT ? OFFSET ?"
        ))
        .bind(&pattern)
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(albums, total as u64, page_request))
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = query_scalar("SELECT COUNT(*) FROM album")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
