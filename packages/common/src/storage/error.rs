use std::fmt;

/// Errors that can occur during file storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// The requested stored object was not found.
    NotFound(String),
    /// A local I/O error occurred while writing, moving, or reading storage.
    Io(std::io::Error),
    /// Reading the upload source failed (client abort, transport limit).
    Source(std::io::Error),
    /// The provided storage key is not a system-generated key.
    InvalidKey(String),
}

impl StorageError {
    /// Whether the upload source was cut off by a transport-level size limit.
    pub fn is_source_too_large(&self) -> bool {
        matches!(self, Self::Source(err) if err.kind() == std::io::ErrorKind::FileTooLarge)
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "stored object not found: {key}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::Source(err) => write!(f, "upload source read error: {err}"),
            Self::InvalidKey(key) => write!(f, "invalid storage key: {key:?}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) | Self::Source(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
