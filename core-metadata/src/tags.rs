//! # Audio Tag Reading
//!
//! Reads the handful of tag fields the library stores, using the `lofty`
//! crate. ID3v2, Vorbis Comments, MP4 ilst, APE and RIFF INFO tags are all
//! handled by lofty; the primary tag of the format wins, else the first tag
//! found.

use crate::error::{MetadataError, Result};
use lofty::config::ParseOptions;
use lofty::error::ErrorKind;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Tag fields of one audio file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackTags {
    /// Title, or the file stem when the file carries none
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<i32>,
    /// Position on the album
    pub track_number: Option<i32>,
    /// Number of tracks on the album
    pub total_tracks: Option<i32>,
}

impl TrackTags {
    /// Tags holding only a title derived from the file name
    pub fn from_file_stem(path: &Path) -> Self {
        Self {
            title: file_stem_title(path),
            ..Default::default()
        }
    }
}

/// Source of [`TrackTags`] for a file on disk.
///
/// Implementations block on file I/O; async callers run them on the blocking
/// pool.
#[cfg_attr(test, mockall::automock)]
pub trait TagReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<TrackTags>;
}

/// [`TagReader`] backed by `lofty`
#[derive(Debug, Clone, Copy)]
pub struct LoftyTagReader {
    parse_options: ParseOptions,
}

impl LoftyTagReader {
    pub fn new() -> Self {
        // Audio properties are never stored, skip them.
        Self {
            parse_options: ParseOptions::new().read_properties(false),
        }
    }

    pub fn with_options(parse_options: ParseOptions) -> Self {
        Self { parse_options }
    }

    fn tags_from(tag: &Tag, path: &Path) -> TrackTags {
        let title = tag
            .title()
            .map(|s| normalize_text(s.as_ref()))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| file_stem_title(path));

        TrackTags {
            title,
            artist: tag
                .artist()
                .map(|s| normalize_text(s.as_ref()))
                .filter(|s| !s.is_empty()),
            album: tag
                .album()
                .map(|s| normalize_text(s.as_ref()))
                .filter(|s| !s.is_empty()),
            year: tag.year().and_then(|y| i32::try_from(y).ok()),
            track_number: tag.track().and_then(|n| i32::try_from(n).ok()),
            total_tracks: tag.track_total().and_then(|n| i32::try_from(n).ok()),
        }
    }
}

impl Default for LoftyTagReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TagReader for LoftyTagReader {
    fn read(&self, path: &Path) -> Result<TrackTags> {
        debug!(file = %path.display(), "Reading tags");

        let tagged_file = Probe::open(path)
            .map_err(|e| MetadataError::ExtractionFailed(format!("Failed to open file: {}", e)))?
            .options(self.parse_options)
            .guess_file_type()?
            .read()
            .map_err(|e| match e.kind() {
                ErrorKind::UnknownFormat => {
                    MetadataError::UnsupportedFormat(path.display().to_string())
                }
                _ => MetadataError::ExtractionFailed(format!("Failed to parse file: {}", e)),
            })?;

        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag());

        match tag {
            Some(tag) => Ok(Self::tags_from(tag, path)),
            None => {
                warn!(file = %path.display(), "No tags found, using filename as title");
                Ok(TrackTags::from_file_stem(path))
            }
        }
    }
}

fn file_stem_title(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(normalize_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Collapse whitespace runs and drop control characters
fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Go   Your Own\tWay "), "Go Your Own Way");
        assert_eq!(normalize_text("Dreams\u{0}"), "Dreams");
    }

    #[test]
    fn test_file_stem_fallback() {
        let tags = TrackTags::from_file_stem(&PathBuf::from("/music/02 Dreams.mp3"));
        assert_eq!(tags.title, "02 Dreams");
        assert!(tags.album.is_none());

        let tags = TrackTags::from_file_stem(&PathBuf::from("/"));
        assert_eq!(tags.title, "Unknown");
    }

    #[test]
    fn test_tags_from_lofty_tag() {
        use lofty::tag::TagType;

        let mut tag = Tag::new(TagType::Id3v2);
        tag.set_title("Dreams".to_string());
        tag.set_artist("Fleetwood Mac".to_string());
        tag.set_album("Rumours".to_string());
        tag.set_year(1977);
        tag.set_track(2);
        tag.set_track_total(11);

        let tags = LoftyTagReader::tags_from(&tag, Path::new("/music/dreams.mp3"));
        assert_eq!(tags.title, "Dreams");
        assert_eq!(tags.artist.as_deref(), Some("Fleetwood Mac"));
        assert_eq!(tags.album.as_deref(), Some("Rumours"));
        assert_eq!(tags.year, Some(1977));
        assert_eq!(tags.track_number, Some(2));
        assert_eq!(tags.total_tracks, Some(11));
    }

    #[test]
    fn test_untitled_tag_falls_back_to_stem() {
        use lofty::tag::TagType;

        let mut tag = Tag::new(TagType::VorbisComments);
        tag.set_album("Tusk".to_string());

        let tags = LoftyTagReader::tags_from(&tag, Path::new("/music/Sara.flac"));
        assert_eq!(tags.title, "Sara");
        assert_eq!(tags.album.as_deref(), Some("Tusk"));
    }

    #[test]
    fn test_missing_file_fails() {
        let reader = LoftyTagReader::new();
        assert!(reader.read(Path::new("/definitely/not/here.mp3")).is_err());
    }

    #[test]
    fn test_garbage_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.flac");
        std::fs::write(&path, b"this is not audio").unwrap();

        let reader = LoftyTagReader::new();
        assert!(reader.read(&path).is_err());
    }
}
