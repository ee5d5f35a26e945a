use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Media file already in library: {file}")]
    DuplicateFile { file: String },

    #[error("Schema initialization failed: {0}")]
    Schema(String),
}

impl LibraryError {
    pub(crate) fn album_not_found(id: impl ToString) -> Self {
        LibraryError::NotFound {
            entity_type: "Album".to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn media_not_found(id: impl ToString) -> Self {
        LibraryError::NotFound {
            entity_type: "Media".to_string(),
            id: id.to_string(),
        }
    }

    /// Map a failed media write into the constraint it violated.
    ///
    /// Unique violations can only come from `media.file`, foreign key
    /// violations only from `media.album_id`.
    pub(crate) fn from_media_write(
        err: sqlx::Error,
        file: &str,
        album_id: Option<crate::models::AlbumId>,
    ) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return LibraryError::DuplicateFile {
                    file: file.to_string(),
                };
            }
            if db_err.is_foreign_key_violation() {
                return match album_id {
                    Some(id) => LibraryError::album_not_found(id),
                    None => LibraryError::Database(err),
                };
            }
        }
        LibraryError::Database(err)
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
