mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Command, PageArgs};
use core_library::db::DatabaseConfig;
use core_library::repositories::{
    AlbumRepository, MediaRepository, MediaWithAlbumRepository, Page, PageRequest,
};
use core_library::{AlbumId, Library, OrphanPolicy};
use core_metadata::{LibraryScanner, LoftyTagReader};
use core_runtime::logging::init_logging;
use core_runtime::AppConfig;
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        AppConfig::load_or_default(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    init_logging(config.logging.clone()).context("Failed to initialize logging")?;

    let library = open_library(&config).await?;
    let outcome = run(cli.command, &library, &config).await;
    library.close().await;
    outcome
}

async fn open_library(config: &AppConfig) -> Result<Library> {
    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let db_config =
        DatabaseConfig::new(&config.database_path).foreign_keys(config.enforce_foreign_keys);

    Library::open(db_config)
        .await
        .with_context(|| format!("Failed to open {}", config.database_path.display()))
}

async fn run(command: Command, library: &Library, config: &AppConfig) -> Result<()> {
    match command {
        Command::Init => {
            let albums = library.albums().count().await?;
            let tracks = library.media().count().await?;
            println!(
                "Library ready at {} ({} albums, {} tracks)",
                config.database_path.display(),
                albums,
                tracks
            );
        }

        Command::Scan { path } => {
            let roots = match path {
                Some(path) => vec![path],
                None if !config.music_dirs.is_empty() => config.music_dirs.clone(),
                None => bail!("No folder given and no music_dirs configured"),
            };

            let scanner = LibraryScanner::new(library.clone(), Arc::new(LoftyTagReader::new()))
                .commit_every(config.import_batch_size);

            for root in roots {
                let summary = scanner
                    .scan(&root)
                    .await
                    .with_context(|| format!("Failed to scan {}", root.display()))?;
                println!(
                    "{}: {} found, {} imported, {} failed, {} new albums",
                    root.display(),
                    summary.discovered,
                    summary.imported,
                    summary.failed,
                    summary.albums_created
                );
            }
        }

        Command::Refresh => {
            let scanner = LibraryScanner::new(library.clone(), Arc::new(LoftyTagReader::new()));
            let removed = scanner.refresh().await?;
            println!("Removed {} missing tracks", removed);
        }

        Command::Albums { page } => {
            let albums = library.albums().query(page_request(page)).await?;
            print_page(&albums, page.json, |album| {
                format!(
                    "{}\t{}\t{}\t{}{}",
                    album.id,
                    album.name,
                    optional(album.year),
                    optional(album.track),
                    if album.is_default { "\t(default)" } else { "" }
                )
            })?;
        }

        Command::Tracks { album: Some(id), page } => {
            let tracks = library
                .media()
                .query_by_album(AlbumId(id), page_request(page))
                .await?;
            print_page(&tracks, page.json, |media| {
                format!(
                    "{}\t{}\t{}\t{}\t{}",
                    media.id,
                    optional(media.track),
                    media.name,
                    optional(media.artist.as_deref()),
                    media.file
                )
            })?;
        }

        Command::Tracks { album: None, page } => {
            let tracks = library
                .media_with_album()
                .query(page_request(page))
                .await?;
            print_page(&tracks, page.json, |row| {
                format!(
                    "{}\t{}\t{}\t{}\t{}",
                    row.id,
                    row.name,
                    optional(row.artist.as_deref()),
                    optional(row.album_name.as_deref()),
                    row.file
                )
            })?;
        }

        Command::RemoveAlbum { id, move_to_default } => {
            let policy = if move_to_default {
                OrphanPolicy::MoveToDefault
            } else {
                OrphanPolicy::Unassign
            };

            if !library.delete_album(AlbumId(id), policy).await? {
                bail!("Album {} not found", id);
            }
            info!(album_id = id, ?policy, "Album removed");
            println!("Removed album {}", id);
        }
    }

    Ok(())
}

fn page_request(args: PageArgs) -> PageRequest {
    PageRequest::new(args.page, args.page_size)
}

fn optional<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn print_page<T, F>(page: &Page<T>, json: bool, line: F) -> Result<()>
where
    T: Serialize,
    F: Fn(&T) -> String,
{
    for item in &page.items {
        if json {
            println!("{}", serde_json::to_string(item)?);
        } else {
            println!("{}", line(item));
        }
    }

    eprintln!(
        "page {}/{} ({} total)",
        page.page.saturating_add(1),
        page.total_pages.max(1),
        page.total
    );
    Ok(())
}
