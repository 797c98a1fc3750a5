use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::hash::ContentHash;
use super::traits::{BoxReader, FileStore, SNIFF_LEN, SourceReader, StagedFile, StoredKey};

const STAGING_DIR: &str = ".staging";

/// Directory-backed file store.
///
/// Stored objects live flat in `{root}/{key}`. Uploads are first written to
/// `{root}/.staging/~{uuid}{ext}` and renamed into place, so a final name
/// never refers to partially written content.
pub struct FilesystemFileStore {
    root: PathBuf,
}

impl FilesystemFileStore {
    /// Create the store, creating the root and staging directories if needed.
    ///
    /// Staging files left over from an interrupted run are removed.
    pub async fn new(root: PathBuf) -> Result<Self, StorageError> {
        let staging = root.join(STAGING_DIR);
        fs::create_dir_all(&staging).await?;

        let mut entries = fs::read_dir(&staging).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Err(e) = fs::remove_file(entry.path()).await {
                tracing::warn!("Failed to remove stale staging file {:?}: {}", entry.path(), e);
            }
        }

        Ok(Self { root })
    }

    fn object_path(&self, key: &StoredKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    fn staging_path(&self, extension: &str) -> PathBuf {
        self.root
            .join(STAGING_DIR)
            .join(format!("~{}{extension}", uuid::Uuid::new_v4().simple()))
    }
}

/// Copy at most `limit + 1` bytes of `source` into `path`.
async fn write_staged(
    source: SourceReader<'_>,
    path: &Path,
    limit: u64,
) -> Result<(u64, ContentHash, Vec<u8>), StorageError> {
    let mut file = fs::File::create(path).await?;
    let mut hasher = Sha256::new();
    let mut head = Vec::new();
    let mut total: u64 = 0;
    let mut buf = vec![0u8; 64 * 1024];

    while total <= limit {
        let want = usize::try_from((limit - total).saturating_add(1))
            .unwrap_or(usize::MAX)
            .min(buf.len());
        let n = source
            .read(&mut buf[..want])
            .await
            .map_err(StorageError::Source)?;
        if n == 0 {
            break;
        }

        let chunk = &buf[..n];
        if head.len() < SNIFF_LEN {
            let take = (SNIFF_LEN - head.len()).min(n);
            head.extend_from_slice(&chunk[..take]);
        }
        hasher.update(chunk);
        file.write_all(chunk).await?;
        total += n as u64;
    }

    file.flush().await?;
    file.sync_all().await?;

    Ok((total, ContentHash::finish(hasher), head))
}

#[async_trait]
impl FileStore for FilesystemFileStore {
    async fn stage(
        &self,
        source: SourceReader<'_>,
        extension: &str,
        limit: u64,
    ) -> Result<StagedFile, StorageError> {
        let path = self.staging_path(extension);

        match write_staged(source, &path, limit).await {
            Ok((size, hash, head)) => Ok(StagedFile {
                path,
                extension: extension.to_string(),
                size,
                hash,
                head,
            }),
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&path).await
                    && cleanup.kind() != std::io::ErrorKind::NotFound
                {
                    tracing::warn!(path = %path.display(), "Failed to remove staging file: {cleanup}");
                }
                Err(e)
            }
        }
    }

    async fn promote(&self, staged: StagedFile) -> Result<StoredKey, StorageError> {
        let key = match StoredKey::generate(&staged.extension) {
            Ok(key) => key,
            Err(e) => {
                let path = staged.path.clone();
                if let Err(cleanup) = self.discard(staged).await {
                    tracing::warn!(path = %path.display(), "Failed to remove staging file: {cleanup}");
                }
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&staged.path, self.object_path(&key)).await {
            if let Err(cleanup) = fs::remove_file(&staged.path).await
                && cleanup.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(path = %staged.path.display(), "Failed to remove staging file: {cleanup}");
            }
            return Err(e.into());
        }

        Ok(key)
    }

    async fn discard(&self, staged: StagedFile) -> Result<(), StorageError> {
        match fs::remove_file(&staged.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn open(&self, key: &StoredKey) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.object_path(key)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, key: &StoredKey) -> Result<bool, StorageError> {
        match fs::remove_file(self.object_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &StoredKey) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.object_path(key)).await?)
    }
}
