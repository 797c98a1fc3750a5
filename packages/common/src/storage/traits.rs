use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::hash::ContentHash;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Upload source consumed by [`FileStore::stage`].
pub type SourceReader<'a> = &'a mut (dyn AsyncRead + Unpin + Send);

/// Number of leading bytes kept in memory for content sniffing.
pub const SNIFF_LEN: usize = 16 * 1024;

/// Longest extension (including the dot) a stored key may carry.
const MAX_EXTENSION_LEN: usize = 16;

/// System-generated name of a stored object: 32 lowercase hex characters
/// followed by an optional `.ext` of lowercase alphanumerics.
///
/// Keys are never built from client input, and [`StoredKey::parse`] rejects
/// anything that could name a path outside the storage root.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StoredKey(String);

impl StoredKey {
    /// Generate a fresh random key carrying `extension` (e.g. `".pdf"` or `""`).
    pub fn generate(extension: &str) -> Result<Self, StorageError> {
        Self::parse(&format!("{}{extension}", uuid::Uuid::new_v4().simple()))
    }

    /// Validate a key previously produced by [`StoredKey::generate`].
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let (token, extension) = match raw.find('.') {
            Some(pos) => raw.split_at(pos),
            None => (raw, ""),
        };

        let token_ok = token.len() == 32
            && token
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        let extension_ok = extension.is_empty()
            || (extension.len() > 1
                && extension.len() <= MAX_EXTENSION_LEN
                && extension[1..]
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));

        if token_ok && extension_ok {
            Ok(Self(raw.to_string()))
        } else {
            Err(StorageError::InvalidKey(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StoredKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoredKey({})", self.0)
    }
}

impl fmt::Display for StoredKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An upload written to the staging area but not yet promoted.
///
/// Staged files are invisible to queries; they are either promoted into the
/// storage root or discarded.
#[derive(Debug)]
pub struct StagedFile {
    pub(crate) path: PathBuf,
    pub(crate) extension: String,
    pub(crate) size: u64,
    pub(crate) hash: ContentHash,
    pub(crate) head: Vec<u8>,
}

impl StagedFile {
    /// Bytes written to staging. Exceeds the staging limit by one byte when
    /// the source was longer than the limit.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// SHA-256 of the staged content.
    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    /// Leading bytes of the content (at most [`SNIFF_LEN`]).
    pub fn head(&self) -> &[u8] {
        &self.head
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Storage backend for uploaded files.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Write `source` to a uniquely named staging file.
    ///
    /// Reads stop once more than `limit` bytes have been written, so the
    /// staged size tells whether the source exceeded `limit`. On error no
    /// staging file is left behind.
    async fn stage(
        &self,
        source: SourceReader<'_>,
        extension: &str,
        limit: u64,
    ) -> Result<StagedFile, StorageError>;

    /// Atomically move a staged file to its final location under a fresh key.
    async fn promote(&self, staged: StagedFile) -> Result<StoredKey, StorageError>;

    /// Remove a staged file without promoting it.
    async fn discard(&self, staged: StagedFile) -> Result<(), StorageError>;

    /// Open a stored object for streaming.
    async fn open(&self, key: &StoredKey) -> Result<BoxReader, StorageError>;

    /// Remove a stored object.
    ///
    /// Returns `true` if the object was removed, `false` if it did not exist.
    async fn remove(&self, key: &StoredKey) -> Result<bool, StorageError>;

    /// Check whether a stored object exists.
    async fn exists(&self, key: &StoredKey) -> Result<bool, StorageError>;
}
