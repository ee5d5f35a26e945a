//! # Library Store
//!
//! `Library` bundles the connection pool with the album, media and view
//! repositories, and owns the operations that span several statements:
//! album deletion with orphan handling and batched imports.

use crate::db::{create_pool, DatabaseConfig};
use crate::error::Result;
use crate::models::{AlbumId, NewAlbum, NewMedia, DEFAULT_ALBUM_NAME};
use crate::repositories::album::{find_album_id, insert_album};
use crate::repositories::media::upsert_media;
use crate::repositories::{
    SqliteAlbumRepository, SqliteMediaRepository, SqliteMediaWithAlbumRepository,
};
use crate::sql_util::{generate_parameterized_bindings, MAX_BINDINGS_PER_STATEMENT};
use serde::{Deserialize, Serialize};
use sqlx::{query, query_scalar, Acquire, Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Tracks written per transaction when no batch size is given
pub const DEFAULT_COMMIT_EVERY: usize = 64;

/// What happens to an album's tracks when the album is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrphanPolicy {
    /// Tracks keep no album (`album_id` becomes null)
    #[default]
    Unassign,
    /// Tracks move to the "Unknown Album" sentinel
    MoveToDefault,
}

/// Handle to an opened media library
#[derive(Clone)]
pub struct Library {
    pool: SqlitePool,
    albums: SqliteAlbumRepository,
    media: SqliteMediaRepository,
    media_with_album: SqliteMediaWithAlbumRepository,
}

impl Library {
    /// Wrap a pool whose schema has already been applied
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            albums: SqliteAlbumRepository::new(pool.clone()),
            media: SqliteMediaRepository::new(pool.clone()),
            media_with_album: SqliteMediaWithAlbumRepository::new(pool.clone()),
            pool,
        }
    }

    /// Open (or create) the store described by `config` and apply the schema
    pub async fn open(config: DatabaseConfig) -> Result<Self> {
        let pool = create_pool(config).await?;
        Ok(Self::new(pool))
    }

    pub fn albums(&self) -> &SqliteAlbumRepository {
        &self.albums
    }

    pub fn media(&self) -> &SqliteMediaRepository {
        &self.media
    }

    pub fn media_with_album(&self) -> &SqliteMediaWithAlbumRepository {
        &self.media_with_album
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Delete an album and deal with its tracks according to `policy`.
    ///
    /// Runs in one transaction. Returns `false` when the album does not exist.
    /// With [`OrphanPolicy::MoveToDefault`] the tracks end up on the default
    /// album, which is recreated first if it is missing.
    #[instrument(skip(self))]
    pub async fn delete_album(&self, id: AlbumId, policy: OrphanPolicy) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let tracks: Vec<i64> = query_scalar("SELECT id FROM media WHERE album_id = ?")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        let deleted = query("DELETE FROM album WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            debug!("Album not found, nothing deleted");
            return Ok(false);
        }

        let target = match policy {
            OrphanPolicy::Unassign => None,
            OrphanPolicy::MoveToDefault => Some(ensure_default_album(&mut tx).await?),
        };

        // One binding goes to the target album.
        for chunk in tracks.chunks(MAX_BINDINGS_PER_STATEMENT - 1) {
            let sql = format!(
                "UPDATE media SET album_id = ? WHERE id IN ({})",
                generate_parameterized_bindings(chunk.len())
            );
            let mut statement = query(&sql).bind(target);
            for track in chunk {
                statement = statement.bind(*track);
            }
            statement.execute(&mut *tx).await?;
        }

        tx.commit().await?;

        info!(
            tracks = tracks.len(),
            moved_to = ?target,
            "Deleted album"
        );
        Ok(true)
    }

    /// Start a batched import committing every `commit_every` tracks
    pub fn import_session(&self, commit_every: usize) -> ImportSession {
        ImportSession::new(self.pool.clone(), commit_every)
    }
}

/// Id of the album flagged as default, inserting a fresh one when none exists.
async fn ensure_default_album(conn: &mut SqliteConnection) -> Result<AlbumId> {
    let existing: Option<i64> = query_scalar("SELECT id FROM album WHERE is_default = 1")
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(id) = existing {
        return Ok(AlbumId(id));
    }

    let id: i64 = query_scalar(
        "INSERT INTO album (name, year, track, cover, is_default) \
         VALUES (?, NULL, NULL, NULL, 1) RETURNING id",
    )
    .bind(DEFAULT_ALBUM_NAME)
    .fetch_one(&mut *conn)
    .await?;

    warn!(album_id = id, "Default album was missing and has been recreated");
    Ok(AlbumId(id))
}

/// One track as produced by a scanner, before album resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedTrack {
    pub file: String,
    pub name: String,
    pub artist: Option<String>,
    /// Position on the album
    pub track: Option<i32>,
    /// Album title; tracks without one go to the default album
    pub album: Option<String>,
    pub year: Option<i32>,
    /// Number of tracks on the album
    pub track_total: Option<i32>,
    pub cover: Option<String>,
}

/// Totals reported when an import session finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    /// Media rows inserted or updated
    pub imported: usize,
    /// Named albums inserted
    pub albums_created: usize,
}

/// Batched writer for scanner output.
///
/// Writes go through one open transaction that is committed every
/// `commit_every` tracks and on [`finish`](Self::finish). Dropping the session
/// rolls back whatever was not yet committed.
pub struct ImportSession {
    pool: SqlitePool,
    tx: Option<Transaction<'static, Sqlite>>,
    commit_every: usize,
    pending: usize,
    albums: HashMap<AlbumKey, AlbumId>,
    stats: ImportStats,
}

impl ImportSession {
    fn new(pool: SqlitePool, commit_every: usize) -> Self {
        Self {
            pool,
            tx: None,
            commit_every: commit_every.max(1),
            pending: 0,
            albums: HashMap::new(),
            stats: ImportStats::default(),
        }
    }

    /// Resolve the track's album and upsert its media row by file
    pub async fn import(&mut self, track: ImportedTrack) -> Result<()> {
        let mut tx = match self.tx.take() {
            Some(tx) => tx,
            None => self.pool.begin().await?,
        };

        let result = Self::write(&mut tx, &mut self.albums, &mut self.stats, track).await;
        self.tx = Some(tx);
        result?;

        self.stats.imported += 1;
        self.pending += 1;
        if self.pending >= self.commit_every {
            self.commit().await?;
        }

        Ok(())
    }

    /// Commit the remaining tracks and return the session totals
    pub async fn finish(mut self) -> Result<ImportStats> {
        self.commit().await?;
        info!(
            imported = self.stats.imported,
            albums_created = self.stats.albums_created,
            "Import finished"
        );
        Ok(self.stats)
    }

    pub fn stats(&self) -> ImportStats {
        self.stats
    }

    async fn commit(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
            debug!(tracks = self.pending, "Committed import batch");
        }
        self.pending = 0;
        Ok(())
    }

    /// Write one track inside a savepoint so a failure leaves neither a
    /// stray album in the batch nor a stale entry in the album cache.
    async fn write(
        tx: &mut Transaction<'static, Sqlite>,
        albums: &mut HashMap<AlbumKey, AlbumId>,
        stats: &mut ImportStats,
        track: ImportedTrack,
    ) -> Result<()> {
        let mut savepoint = Acquire::begin(&mut *tx).await?;

        match Self::write_track(&mut savepoint, albums, track).await {
            Ok(resolved) => {
                savepoint.commit().await?;
                if let Some(resolved) = resolved {
                    if resolved.created {
                        stats.albums_created += 1;
                    }
                    albums.insert(resolved.key, resolved.id);
                }
                Ok(())
            }
            Err(e) => {
                savepoint.rollback().await?;
                Err(e)
            }
        }
    }

    /// Returns the named album the track was filed under when it was not
    /// already cached.
    async fn write_track(
        conn: &mut SqliteConnection,
        albums: &HashMap<AlbumKey, AlbumId>,
        track: ImportedTrack,
    ) -> Result<Option<ResolvedAlbum>> {
        let album_name = track
            .album
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        let (album_id, resolved) = match album_name {
            None => (ensure_default_album(&mut *conn).await?, None),
            Some(name) => {
                let key = (name.to_string(), track.cover.clone());
                match albums.get(&key) {
                    Some(id) => (*id, None),
                    None => {
                        let (id, created) =
                            match find_album_id(&mut *conn, name, track.cover.as_deref()).await? {
                                Some(id) => (id, false),
                                None => {
                                    let mut album = NewAlbum::new(name);
                                    album.year = track.year;
                                    album.track = track.track_total;
                                    album.cover = track.cover.clone();
                                    (insert_album(&mut *conn, &album).await?, true)
                                }
                            };
                        (id, Some(ResolvedAlbum { key, id, created }))
                    }
                }
            }
        };

        let mut media = NewMedia::new(track.file, track.name).with_album(album_id);
        media.artist = track.artist;
        media.track = track.track;
        upsert_media(&mut *conn, &media).await?;

        Ok(resolved)
    }
}

type AlbumKey = (String, Option<String>);

struct ResolvedAlbum {
    key: AlbumKey,
    id: AlbumId,
    created: bool,
}
