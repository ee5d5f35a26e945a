use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "oto", version, about = "Personal media library", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding the configuration
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the database and schema if missing
    Init,

    /// Import media files below a folder (or the configured music folders)
    Scan { path: Option<PathBuf> },

    /// Drop tracks whose files no longer exist
    Refresh,

    /// List albums
    Albums {
        #[command(flatten)]
        page: PageArgs,
    },

    /// List tracks with their album
    Tracks {
        /// Only tracks of this album
        #[arg(short, long)]
        album: Option<i64>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Delete an album; its tracks become unassigned
    RemoveAlbum {
        id: i64,

        /// Move the tracks to the default album instead
        #[arg(long)]
        move_to_default: bool,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Zero-based page number
    #[arg(long, default_value_t = 0)]
    pub page: u32,

    #[arg(long, default_value_t = 50)]
    pub page_size: u32,

    /// Print one JSON object per line
    #[arg(long)]
    pub json: bool,
}
