//! # Library Schema
//!
//! The complete persisted surface of the media library as one idempotent SQL
//! batch: the `album` and `media` tables, their lookup indexes, the
//! default-album seed, the `ensure_default_album` trigger and the
//! `media_with_album` read view.
//!
//! Every statement uses "create if not already present" semantics, so the
//! batch can be applied to an already-initialized store any number of times
//! without touching existing rows.

use crate::error::{LibraryError, Result};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

pub const ALBUM_TABLE: &str = "album";
pub const MEDIA_TABLE: &str = "media";
pub const DEFAULT_ALBUM_TRIGGER: &str = "ensure_default_album";
pub const MEDIA_WITH_ALBUM_VIEW: &str = "media_with_album";

/// `(type, name)` of every object the schema creates, as listed in `sqlite_master`.
pub const SCHEMA_OBJECTS: &[(&str, &str)] = &[
    ("table", ALBUM_TABLE),
    ("table", MEDIA_TABLE),
    ("index", "idx_media_album_id"),
    ("index", "idx_media_artist"),
    ("index", "idx_media_name"),
    ("index", "idx_album_name"),
    ("index", "idx_album_default"),
    ("trigger", DEFAULT_ALBUM_TRIGGER),
    ("view", MEDIA_WITH_ALBUM_VIEW),
];

pub const SCHEMA: &str = r#"
-- Albums. `track` holds the album's total track count.
CREATE TABLE IF NOT EXISTS album (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    year INTEGER,
    track INTEGER,
    cover TEXT,                             -- path or URI of the cover art
    is_default INTEGER NOT NULL DEFAULT 0   -- 1 for the "Unknown Album" sentinel
);

-- Playable files. `track` is the position within the album.
CREATE TABLE IF NOT EXISTS media (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    artist TEXT,
    album_id INTEGER,
    track INTEGER,
    FOREIGN KEY (album_id) REFERENCES album(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_media_album_id ON media(album_id);
CREATE INDEX IF NOT EXISTS idx_media_artist ON media(artist);
CREATE INDEX IF NOT EXISTS idx_media_name ON media(name);
CREATE INDEX IF NOT EXISTS idx_album_name ON album(name);

-- At most one sentinel row
CREATE UNIQUE INDEX IF NOT EXISTS idx_album_default ON album(is_default) WHERE is_default = 1;

INSERT INTO album (name, year, track, cover, is_default)
SELECT 'Unknown Album', NULL, NULL, NULL, 1
WHERE NOT EXISTS (SELECT 1 FROM album);

CREATE TRIGGER IF NOT EXISTS ensure_default_album
AFTER DELETE ON album
WHEN (SELECT COUNT(*) FROM album) = 0
BEGIN
    INSERT INTO album (name, year, track, cover, is_default)
    VALUES ('Unknown Album', NULL, NULL, NULL, 1);
END;

CREATE VIEW IF NOT EXISTS media_with_album AS
SELECT
    m.id,
    m.file,
    m.name,
    m.artist,
    m.track,
    a.name AS album_name,
    a.year AS album_year,
    a.cover AS album_cover
FROM media m
LEFT JOIN album a ON m.album_id = a.id;
"#;

/// Apply [`SCHEMA`] inside a single transaction.
///
/// Safe to call against an initialized store: nothing is recreated and the
/// default album is only seeded when `album` is empty.
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    info!("Applying library schema");

    let mut tx = pool.begin().await?;
    sqlx::raw_sql(SCHEMA).execute(&mut *tx).await.map_err(|e| {
        warn!(error = %e, "Schema application failed");
        LibraryError::Schema(e.to_string())
    })?;
    tx.commit().await?;

    verify_schema(pool).await?;

    info!("Library schema ready");
    Ok(())
}

/// Check that every object in [`SCHEMA_OBJECTS`] exists exactly once.
pub async fn verify_schema(pool: &SqlitePool) -> Result<()> {
    let mut missing = Vec::new();

    for &(kind, name) in SCHEMA_OBJECTS {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = ? AND name = ?")
                .bind(kind)
                .bind(name)
                .fetch_one(pool)
                .await?;

        if count != 1 {
            missing.push(format!("{kind} {name}"));
        }
    }

    if !missing.is_empty() {
        return Err(LibraryError::Schema(format!(
            "missing schema objects: {}",
            missing.join(", ")
        )));
    }

    debug!(objects = SCHEMA_OBJECTS.len(), "Schema verified");
    Ok(())
}
