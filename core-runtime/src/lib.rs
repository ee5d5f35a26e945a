//! # Core Runtime Module
//!
//! Provides the runtime infrastructure shared by the workspace crates:
//! - Logging and tracing setup
//! - Application configuration (TOML file plus builder)
//!
//! ## Overview
//!
//! Library crates only emit `tracing` events; the binary calls
//! [`logging::init_logging`] once with the `[logging]` section of the loaded
//! [`config::AppConfig`].

pub mod config;
pub mod error;
pub mod logging;

pub use config::AppConfig;
pub use error::{Error, Result};
