//! Media repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{AlbumId, Media, MediaId, NewMedia};
use crate::repositories::{Page, PageRequest};
use async_trait::async_trait;
use sqlx::{query, query_as, query_scalar, Executor, Sqlite, SqlitePool};
use tracing::debug;

const MEDIA_COLUMNS: &str = "id, file, name, artist, album_id, track";

/// Media repository interface for data access operations
#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// Find a media row by its ID
    async fn find_by_id(&self, id: MediaId) -> Result<Option<Media>>;

    /// Find a media row by its file path
    async fn find_by_file(&self, file: &str) -> Result<Option<Media>>;

    /// Insert a new media row and return its assigned ID
    ///
    /// # Errors
    /// Returns error if:
    /// - Media validation fails
    /// - The file is already in the library (`DuplicateFile`)
    /// - The album does not exist while foreign keys are enforced
    async fn insert(&self, media: &NewMedia) -> Result<MediaId>;

    /// Insert the row, or overwrite the existing row with the same file.
    /// The ID of an existing row is kept.
    async fn upsert(&self, media: &NewMedia) -> Result<MediaId>;

    /// Replace the fields of an existing media row
    async fn update(&self, id: MediaId, media: &NewMedia) -> Result<()>;

    /// Delete a media row by ID
    ///
    /// # Returns
    /// - `Ok(true)` if the row was deleted
    /// - `Ok(false)` if the row was not found
    async fn delete(&self, id: MediaId) -> Result<bool>;

    /// Delete the media row for a file path
    async fn delete_by_file(&self, file: &str) -> Result<bool>;

    /// Query media ordered by name
    async fn query(&self, page_request: PageRequest) -> Result<Page<Media>>;

    /// Media of one album, ordered by track position then name
    async fn query_by_album(
        &self,
        album_id: AlbumId,
        page_request: PageRequest,
    ) -> Result<Page<Media>>;

    /// Media with an exact artist match
    async fn query_by_artist(
        &self,
        artist: &str,
        page_request: PageRequest,
    ) -> Result<Page<Media>>;

    /// Media whose album reference is null or points at no existing album
    async fn query_unassigned(&self, page_request: PageRequest) -> Result<Page<Media>>;

    /// Count total media rows
    async fn count(&self) -> Result<i64>;

    /// Every file path in the library
    async fn list_files(&self) -> Result<Vec<String>>;
}

/// SQLite implementation of MediaRepository
#[derive(Clone)]
pub struct SqliteMediaRepository {
    pool: SqlitePool,
}

impl SqliteMediaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn validate(media: &NewMedia) -> Result<()> {
    media.validate().map_err(|message| LibraryError::InvalidInput {
        field: "media".to_string(),
        message,
    })
}

/// Upsert keyed on `media.file`, usable on a pool or inside a transaction.
pub(crate) async fn upsert_media<'e, E>(executor: E, media: &NewMedia) -> Result<MediaId>
where
    E: Executor<'e, Database = Sqlite>,
{
    validate(media)?;

    let id: i64 = query_scalar(
        r#"
        INSERT INTO media (file, name, artist, album_id, track)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(file) DO UPDATE SET
            name = excluded.name,
            artist = excluded.artist,
            album_id = excluded.album_id,
            track = excluded.track
        RETURNING id
        "#,
    )
    .bind(&media.file)
    .bind(&media.name)
    .bind(&media.artist)
    .bind(media.album_id)
    .bind(media.track)
    .fetch_one(executor)
    .await
    .map_err(|e| LibraryError::from_media_write(e, &media.file, media.album_id))?;

    Ok(MediaId(id))
}

#[async_trait]
impl MediaRepository for SqliteMediaRepository {
    async fn find_by_id(&self, id: MediaId) -> Result<Option<Media>> {
        let media = query_as::<_, Media>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(media)
    }

    async fn find_by_file(&self, file: &str) -> Result<Option<Media>> {
        let media = query_as::<_, Media>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media WHERE file = ?"
        ))
        .bind(file)
        .fetch_optional(&self.pool)
        .await?;

        Ok(media)
    }

    async fn insert(&self, media: &NewMedia) -> Result<MediaId> {
        validate(media)?;

        let id: i64 = query_scalar(
            r#"
            INSERT INTO media (file, name, artist, album_id, track)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&media.file)
        .bind(&media.name)
        .bind(&media.artist)
        .bind(media.album_id)
        .bind(media.track)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| LibraryError::from_media_write(e, &media.file, media.album_id))?;

        debug!(media_id = id, file = %media.file, "Inserted media");
        Ok(MediaId(id))
    }

    async fn upsert(&self, media: &NewMedia) -> Result<MediaId> {
        upsert_media(&self.pool, media).await
    }

    async fn update(&self, id: MediaId, media: &NewMedia) -> Result<()> {
        validate(media)?;

        let result = query(
            r#"
            UPDATE media
            SET file = ?, name = ?, artist = ?, album_id = ?, track = ?
            WHERE id = ?
            "#,
        )
        .bind(&media.file)
        .bind(&media.name)
        .bind(&media.artist)
        .bind(media.album_id)
        .bind(media.track)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| LibraryError::from_media_write(e, &media.file, media.album_id))?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::media_not_found(id));
        }

        Ok(())
    }

    async fn delete(&self, id: MediaId) -> Result<bool> {
        let result = query("DELETE FROM media WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_file(&self, file: &str) -> Result<bool> {
        let result = query("DELETE FROM media WHERE file = ?")
            .bind(file)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<Media>> {
        let total = self.count().await?;

        let items = query_as::<_, Media>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media ORDER BY name ASC, id ASC LIMIT ? OFFSET ?"
        ))
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, total as u64, page_request))
    }

    async fn query_by_album(
        &self,
        album_id: AlbumId,
        page_request: PageRequest,
    ) -> Result<Page<Media>> {
        let total: i64 = query_scalar("SELECT COUNT(*) FROM media WHERE album_id = ?")
            .bind(album_id)
            .fetch_one(&self.pool)
            .await?;

        let items = query_as::<_, Media>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media WHERE album_id = ? \
             ORDER BY track IS NULL, track ASC, name ASC LIMIT ? OFFSET ?"
        ))
        .bind(album_id)
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, total as u64, page_request))
    }

    async fn query_by_artist(
        &self,
        artist: &str,
        page_request: PageRequest,
    ) -> Result<Page<Media>> {
        let total: i64 = query_scalar("SELECT COUNT(*) FROM media WHERE artist = ?")
            .bind(artist)
            .fetch_one(&self.pool)
            .await?;

        let items = query_as::<_, Media>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media WHERE artist = ? \
             ORDER BY name ASC, id ASC LIMIT ? OFFSET ?"
        ))
        .bind(artist)
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, total as u64, page_request))
    }

    async fn query_unassigned(&self, page_request: PageRequest) -> Result<Page<Media>> {
        const UNASSIGNED: &str =
            "WHERE NOT EXISTS (SELECT 1 FROM album a WHERE a.id = media.album_id)";

        let total: i64 = query_scalar(&format!("SELECT COUNT(*) FROM media {UNASSIGNED}"))
            .fetch_one(&self.pool)
            .await?;

        let items = query_as::<_, Media>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media {UNASSIGNED} \
             ORDER BY name ASC, id ASC LIMIT ? OFFSET ?"
        ))
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, total as u64, page_request))
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = query_scalar("SELECT COUNT(*) FROM media")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn list_files(&self) -> Result<Vec<String>> {
        let files = query_scalar("SELECT file FROM media ORDER BY file")
            .fetch_all(&self.pool)
            .await?;

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, create_test_pool, DatabaseConfig};
    use crate::models::NewAlbum;
    use crate::repositories::{AlbumRepository, SqliteAlbumRepository};

    async fn setup() -> (SqliteMediaRepository, SqliteAlbumRepository) {
        let pool = create_test_pool().await.unwrap();
        (
            SqliteMediaRepository::new(pool.clone()),
            SqliteAlbumRepository::new(pool),
        )
    }

    #[tokio::test]
    async fn test_insert_and_find_media() {
        let (repo, albums) = setup().await;
        let album = albums.insert(&NewAlbum::new("Rumours")).await.unwrap();

        let id = repo
            .insert(
                &NewMedia::new("/music/dreams.mp3", "Dreams")
                    .with_artist("Fleetwood Mac")
                    .with_album(album)
                    .with_track(2),
            )
            .await
            .unwrap();

        let found = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.name, "Dreams");
        assert_eq!(found.album_id, Some(album));
        assert_eq!(found.track, Some(2));

        let by_file = repo.find_by_file("/music/dreams.mp3").await.unwrap();
        assert_eq!(by_file, Some(found));
    }

    #[tokio::test]
    async fn test_duplicate_file_rejected() {
        let (repo, _) = setup().await;
        let first = repo
            .insert(&NewMedia::new("/music/a.mp3", "First"))
            .await
            .unwrap();

        let result = repo.insert(&NewMedia::new("/music/a.mp3", "Second")).await;
        assert!(matches!(result, Err(LibraryError::DuplicateFile { .. })));

        let kept = repo.find_by_id(first).await.unwrap().unwrap();
        assert_eq!(kept.name, "First");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_album_rejected_with_foreign_keys() {
        let (repo, _) = setup().await;

        let result = repo
            .insert(&NewMedia::new("/music/a.mp3", "A").with_album(AlbumId(404)))
            .await;

        match result {
            Err(LibraryError::NotFound { entity_type, id }) => {
                assert_eq!(entity_type, "Album");
                assert_eq!(id, "404");
            }
            other => panic!("expected album not found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dangling_album_allowed_without_foreign_keys() {
        let pool = create_pool(DatabaseConfig::in_memory().foreign_keys(false))
            .await
            .unwrap();
        let repo = SqliteMediaRepository::new(pool);

        repo.insert(&NewMedia::new("/music/a.mp3", "A").with_album(AlbumId(404)))
            .await
            .unwrap();
        repo.insert(&NewMedia::new("/music/b.mp3", "B"))
            .await
            .unwrap();

        let page = repo.query_unassigned(PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_upsert_keeps_id() {
        let (repo, albums) = setup().await;
        let album = albums.insert(&NewAlbum::new("Tusk")).await.unwrap();

        let first = repo
            .upsert(&NewMedia::new("/music/sara.flac", "Sara"))
            .await
            .unwrap();
        let second = repo
            .upsert(
                &NewMedia::new("/music/sara.flac", "Sara (Remaster)")
                    .with_album(album)
                    .with_track(6),
            )
            .await
            .unwrap();

        assert_eq!(first, second);
        let media = repo.find_by_id(first).await.unwrap().unwrap();
        assert_eq!(media.name, "Sara (Remaster)");
        assert_eq!(media.album_id, Some(album));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (repo, _) = setup().await;
        let id = repo
            .insert(&NewMedia::new("/music/a.mp3", "A"))
            .await
            .unwrap();

        repo.update(id, &NewMedia::new("/music/a.mp3", "A2").with_artist("X"))
            .await
            .unwrap();
        let media = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(media.name, "A2");
        assert_eq!(media.artist.as_deref(), Some("X"));

        assert!(repo.delete(id).await.unwrap());
        assert!(!repo.delete(id).await.unwrap());

        let result = repo.update(id, &NewMedia::new("/music/a.mp3", "A3")).await;
        assert!(matches!(result, Err(LibraryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_by_file() {
        let (repo, _) = setup().await;
        repo.insert(&NewMedia::new("/music/a.mp3", "A"))
            .await
            .unwrap();

        assert!(repo.delete_by_file("/music/a.mp3").await.unwrap());
        assert!(!repo.delete_by_file("/music/a.mp3").await.unwrap());
    }

    #[tokio::test]
    async fn test_query_by_album_orders_by_track() {
        let (repo, albums) = setup().await;
        let album = albums.insert(&NewAlbum::new("Rumours")).await.unwrap();
        let other = albums.insert(&NewAlbum::new("Tusk")).await.unwrap();

        for (file, name, track) in [
            ("/r/03.mp3", "Never Going Back Again", Some(3)),
            ("/r/01.mp3", "Second Hand News", Some(1)),
            ("/r/xx.mp3", "Bonus", None),
            ("/r/02.mp3", "Dreams", Some(2)),
        ] {
            let mut media = NewMedia::new(file, name).with_album(album);
            media.track = track;
            repo.insert(&media).await.unwrap();
        }
        repo.insert(&NewMedia::new("/t/01.mp3", "Over & Over").with_album(other))
            .await
            .unwrap();

        let page = repo
            .query_by_album(album, PageRequest::default())
            .await
            .unwrap();
        let names: Vec<_> = page.items.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(page.total, 4);
        assert_eq!(
            names,
            vec!["Second Hand News", "Dreams", "Never Going Back Again", "Bonus"]
        );
    }

    #[tokio::test]
    async fn test_query_by_artist() {
        let (repo, _) = setup().await;
        repo.insert(&NewMedia::new("/a.mp3", "A").with_artist("Fleetwood Mac"))
            .await
            .unwrap();
        repo.insert(&NewMedia::new("/b.mp3", "B").with_artist("Stevie Nicks"))
            .await
            .unwrap();

        let page = repo
            .query_by_artist("Fleetwood Mac", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].file, "/a.mp3");
    }

    #[tokio::test]
    async fn test_album_delete_unassigns_media() {
        let (repo, albums) = setup().await;
        let album = albums.insert(&NewAlbum::new("Mirage")).await.unwrap();
        let id = repo
            .insert(&NewMedia::new("/m/gypsy.mp3", "Gypsy").with_album(album))
            .await
            .unwrap();

        albums.delete(album).await.unwrap();

        let media = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(media.album_id, None);
        let page = repo.query_unassigned(PageRequest::default()).await.unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_list_files_and_pagination() {
        let (repo, _) = setup().await;
        for i in 0..5 {
            repo.insert(&NewMedia::new(format!("/music/{}.mp3", i), format!("Song {}", i)))
                .await
                .unwrap();
        }

        let files = repo.list_files().await.unwrap();
        assert_eq!(files.len(), 5);
        assert_eq!(files[0], "/music/0.mp3");

        let page = repo.query(PageRequest::new(2, 2)).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Song 4");
    }

    #[tokio::test]
    async fn test_validation_runs_before_sql() {
        let (repo, _) = setup().await;
        let result = repo.insert(&NewMedia::new("/music/a.mp3", "")).await;
        assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
