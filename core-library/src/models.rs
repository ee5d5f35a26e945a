//! Domain models for the media library
//!
//! This module contains the row types for `album`, `media` and the
//! `media_with_album` view, plus the insert payloads with validation.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Name given to the sentinel album that exists whenever no other album does.
pub const DEFAULT_ALBUM_NAME: &str = "Unknown Album";

// =============================================================================
// ID Types
// =============================================================================

/// Surrogate identifier of an album row
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct AlbumId(pub i64);

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Surrogate identifier of a media row
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct MediaId(pub i64);

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Domain Models
// =============================================================================

/// Music album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Album {
    pub id: AlbumId,
    pub name: String,
    /// Release year
    pub year: Option<i32>,
    /// Total number of tracks on the album
    pub track: Option<i32>,
    /// Path or URI of the cover art
    pub cover: Option<String>,
    /// Whether this is the "Unknown Album" sentinel
    pub is_default: bool,
}

/// Album fields supplied on insert or update; the id is assigned by SQLite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAlbum {
    pub name: String,
    pub year: Option<i32>,
    pub track: Option<i32>,
    pub cover: Option<String>,
}

impl NewAlbum {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            year: None,
            track: None,
            cover: None,
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_track_count(mut self, tracks: i32) -> Self {
        self.track = Some(tracks);
        self
    }

    pub fn with_cover(mut self, cover: impl Into<String>) -> Self {
        self.cover = Some(cover.into());
        self
    }

    /// Validate album data
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Album name cannot be empty".to_string());
        }

        if let Some(track) = self.track {
            if track < 0 {
                return Err("Album track count cannot be negative".to_string());
            }
        }

        Ok(())
    }
}

impl From<Album> for NewAlbum {
    fn from(album: Album) -> Self {
        Self {
            name: album.name,
            year: album.year,
            track: album.track,
            cover: album.cover,
        }
    }
}

/// Single playable file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Media {
    pub id: MediaId,
    /// Filesystem path, unique across the library
    pub file: String,
    /// Track title
    pub name: String,
    pub artist: Option<String>,
    /// Owning album, `None` when unassigned
    pub album_id: Option<AlbumId>,
    /// Position within the album
    pub track: Option<i32>,
}

/// Media fields supplied on insert or update; the id is assigned by SQLite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMedia {
    pub file: String,
    pub name: String,
    pub artist: Option<String>,
    pub album_id: Option<AlbumId>,
    pub track: Option<i32>,
}

impl NewMedia {
    pub fn new(file: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            name: name.into(),
            artist: None,
            album_id: None,
            track: None,
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_album(mut self, album_id: AlbumId) -> Self {
        self.album_id = Some(album_id);
        self
    }

    pub fn with_track(mut self, track: i32) -> Self {
        self.track = Some(track);
        self
    }

    /// Validate media data
    pub fn validate(&self) -> Result<(), String> {
        if self.file.trim().is_empty() {
            return Err("Media file cannot be empty".to_string());
        }

        if self.name.trim().is_empty() {
            return Err("Media name cannot be empty".to_string());
        }

        Ok(())
    }
}

impl From<Media> for NewMedia {
    fn from(media: Media) -> Self {
        Self {
            file: media.file,
            name: media.name,
            artist: media.artist,
            album_id: media.album_id,
            track: media.track,
        }
    }
}

/// Row of the `media_with_album` view.
///
/// Album columns are `None` when the media row has no album or points at an
/// album that no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MediaWithAlbum {
    pub id: MediaId,
    pub file: String,
    pub name: String,
    pub artist: Option<String>,
    pub track: Option<i32>,
    pub album_name: Option<String>,
    pub album_year: Option<i32>,
    pub album_cover: Option<String>,
}

impl MediaWithAlbum {
    pub fn has_album(&self) -> bool {
        self.album_name.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_album_builder() {
        let album = NewAlbum::new("Rumours")
            .with_year(1977)
            .with_track_count(11)
            .with_cover("cover.jpg");

        assert_eq!(album.name, "Rumours");
        assert_eq!(album.year, Some(1977));
        assert_eq!(album.track, Some(11));
        assert_eq!(album.cover.as_deref(), Some("cover.jpg"));
        assert!(album.validate().is_ok());
    }

    #[test]
    fn test_album_validation() {
        assert!(NewAlbum::new("   ").validate().is_err());
        assert!(NewAlbum::new("A").with_track_count(-1).validate().is_err());
    }

    #[test]
    fn test_media_validation() {
        assert!(NewMedia::new("/music/a.mp3", "A").validate().is_ok());
        assert!(NewMedia::new("", "A").validate().is_err());
        assert!(NewMedia::new("/music/a.mp3", " ").validate().is_err());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(AlbumId(7).to_string(), "7");
        assert_eq!(MediaId(12).to_string(), "12");
    }

    #[test]
    fn test_media_with_album_has_album() {
        let row = MediaWithAlbum {
            id: MediaId(1),
            file: "/a.mp3".to_string(),
            name: "A".to_string(),
            artist: None,
            track: None,
            album_name: None,
            album_year: None,
            album_cover: None,
        };
        assert!(!row.has_album());
    }
}
