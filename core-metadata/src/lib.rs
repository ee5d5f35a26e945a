//! # Metadata & Scanning Module
//!
//! Reads audio tags and feeds music folders into the library.
//!
//! ## Overview
//!
//! This module handles:
//! - Audio tag extraction (ID3, Vorbis, MP4, FLAC) through [`tags::TagReader`]
//! - Media file detection and cover art discovery
//! - Folder scans that import tracks in batched transactions
//! - Refreshes that drop rows for files that disappeared

pub mod error;
pub mod scanner;
pub mod tags;

pub use error::{MetadataError, Result};
pub use scanner::{find_cover, is_media_file, LibraryScanner, ScanSummary};
pub use tags::{LoftyTagReader, TagReader, TrackTags};
