//! Integration tests for configuration loading

use core_runtime::config::AppConfig;
use core_runtime::logging::LogLevel;
use core_runtime::Error;
use std::io::Write;
use std::path::PathBuf;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_file() {
    let file = write_config(
        r#"
        database_path = "/srv/oto/library.sqlite"
        enforce_foreign_keys = false
        import_batch_size = 32
        music_dirs = ["/srv/music"]

        [logging]
        level = "trace"
        filter = "core_library=trace"
        "#,
    );

    let config = AppConfig::load(file.path()).unwrap();
    assert_eq!(config.database_path, PathBuf::from("/srv/oto/library.sqlite"));
    assert!(!config.enforce_foreign_keys);
    assert_eq!(config.import_batch_size, 32);
    assert_eq!(config.music_dirs, vec![PathBuf::from("/srv/music")]);
    assert_eq!(config.logging.level, LogLevel::Trace);
    assert_eq!(config.logging.filter.as_deref(), Some("core_library=trace"));
}

#[test]
fn test_load_rejects_invalid_values() {
    let file = write_config("import_batch_size = 0\n");
    assert!(matches!(AppConfig::load(file.path()), Err(Error::Config(_))));
}

#[test]
fn test_load_rejects_bad_toml() {
    let file = write_config("import_batch_size = [\n");
    assert!(matches!(AppConfig::load(file.path()), Err(Error::Parse(_))));
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = AppConfig::load(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_explicit_path_wins() {
    let file = write_config("import_batch_size = 5\n");
    let config = AppConfig::load_or_default(Some(file.path())).unwrap();
    assert_eq!(config.import_batch_size, 5);
}
