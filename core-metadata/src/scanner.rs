//! # Folder Scanner
//!
//! Walks a music folder, reads tags for every media file, and imports the
//! results into the library through a batched [`ImportSession`].
//!
//! Directory traversal and tag reading block, so both run on tokio's blocking
//! pool. A file whose tags cannot be read is logged and counted, the scan
//! carries on.
//!
//! [`ImportSession`]: core_library::ImportSession

use crate::error::{MetadataError, Result};
use crate::tags::TagReader;
use core_library::repositories::MediaRepository;
use core_library::store::DEFAULT_COMMIT_EVERY;
use core_library::{ImportedTrack, Library, LibraryError};
use core_runtime::logging::strip_path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// File extensions treated as playable media
pub const MEDIA_EXTENSIONS: &[&str] = &["flac", "wav", "ogg", "aac", "mp3"];

/// Cover art file names looked up beside a track, in order of preference
pub const COVER_FILE_NAMES: &[&str] = &["cover.jpg", "cover.png", "folder.jpg", "folder.png"];

/// Whether `path` has a media extension (case-insensitive)
pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            MEDIA_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// First cover image present in `dir`
pub fn find_cover(dir: &Path) -> Option<PathBuf> {
    COVER_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Outcome of one folder scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Media files found under the root
    pub discovered: usize,
    /// Files written to the library
    pub imported: usize,
    /// Files skipped because their tags or row could not be written
    pub failed: usize,
    /// Albums created during the scan
    pub albums_created: usize,
}

/// Imports music folders into a [`Library`]
pub struct LibraryScanner {
    library: Library,
    reader: Arc<dyn TagReader>,
    commit_every: usize,
}

impl LibraryScanner {
    pub fn new(library: Library, reader: Arc<dyn TagReader>) -> Self {
        Self {
            library,
            reader,
            commit_every: DEFAULT_COMMIT_EVERY,
        }
    }

    /// Tracks written per transaction
    pub fn commit_every(mut self, commit_every: usize) -> Self {
        self.commit_every = commit_every.max(1);
        self
    }

    /// Scan `root` recursively and import every media file found
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not a directory or the library fails
    /// while writing. Unreadable files are counted in
    /// [`ScanSummary::failed`] instead.
    #[instrument(skip(self, root), fields(root = %root.display()))]
    pub async fn scan(&self, root: &Path) -> Result<ScanSummary> {
        let root = root.to_path_buf();
        let files = tokio::task::spawn_blocking(move || collect_media_files(&root)).await??;

        let mut summary = ScanSummary {
            discovered: files.len(),
            ..Default::default()
        };
        info!(files = files.len(), "Discovered media files");

        let mut session = self.library.import_session(self.commit_every);

        for path in files {
            let reader = Arc::clone(&self.reader);
            let read_path = path.clone();
            let tags = match tokio::task::spawn_blocking(move || reader.read(&read_path)).await? {
                Ok(tags) => tags,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Skipping unreadable file");
                    summary.failed += 1;
                    continue;
                }
            };

            let cover = path
                .parent()
                .and_then(find_cover)
                .map(|cover| cover.to_string_lossy().into_owned());
            let file = path.to_string_lossy().into_owned();

            let track = ImportedTrack {
                name: tags.title,
                artist: tags.artist,
                track: tags.track_number,
                album: tags.album,
                year: tags.year,
                track_total: tags.total_tracks,
                cover,
                file,
            };

            match session.import(track).await {
                Ok(()) => {
                    debug!(file = %strip_path(&path.to_string_lossy()), "Imported");
                }
                Err(e @ LibraryError::InvalidInput { .. }) => {
                    warn!(file = %path.display(), error = %e, "Skipping invalid track");
                    summary.failed += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let stats = session.finish().await?;
        summary.imported = stats.imported;
        summary.albums_created = stats.albums_created;

        info!(
            discovered = summary.discovered,
            imported = summary.imported,
            failed = summary.failed,
            albums_created = summary.albums_created,
            "Scan complete"
        );
        Ok(summary)
    }

    /// Delete media rows whose file no longer exists; returns how many went
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<usize> {
        let files = self.library.media().list_files().await?;
        let mut removed = 0;

        for file in files {
            if tokio::fs::try_exists(&file).await? {
                continue;
            }
            if self.library.media().delete_by_file(&file).await? {
                debug!(file = %strip_path(&file), "Removed missing file");
                removed += 1;
            }
        }

        info!(removed, "Refresh complete");
        Ok(removed)
    }
}

/// Absolute paths of all media files under `root`, sorted
fn collect_media_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(MetadataError::FileNotFound(root.display().to_string()));
    }
    let root = root.canonicalize()?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && is_media_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
