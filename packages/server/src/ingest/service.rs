use std::sync::Arc;

use chrono::Utc;
use common::sniff::sniff_file;
use common::storage::{BoxReader, FileStore, SourceReader, StagedFile, StorageError, StoredKey};
use sea_orm::sea_query::{Expr, ExprTrait, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionSession,
    TransactionTrait,
};
use tracing::{debug, error, info, warn};

use crate::entity::upload;
use crate::models::files::FileListItem;
use crate::models::shared::escape_like;

use super::error::{UploadError, UploadRejection};
use super::policy::UploadPolicy;
use super::query::ListParams;

/// Result of a successful upload request.
#[derive(Debug, Clone)]
pub enum UploadOutcome {
    /// A new record was created.
    Created(upload::Model),
    /// The owner already holds identical content under this record id.
    Duplicate { id: i32 },
}

/// One page of an owner's files.
#[derive(Debug, Clone)]
pub struct FilePage {
    pub items: Vec<FileListItem>,
    pub total: u64,
    pub pages: u64,
}

/// Upload ingestion and retrieval for a single datastore and file store.
///
/// Holds owned handles so the commit phase of an upload can run detached
/// from the request future.
pub struct UploadService<C> {
    conn: C,
    store: Arc<dyn FileStore>,
    policy: Arc<UploadPolicy>,
}

impl<C: Clone> Clone for UploadService<C> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            store: Arc::clone(&self.store),
            policy: Arc::clone(&self.policy),
        }
    }
}

impl<C> UploadService<C>
where
    C: ConnectionTrait + TransactionTrait + Clone + Send + Sync + 'static,
{
    pub fn new(conn: C, store: Arc<dyn FileStore>, policy: Arc<UploadPolicy>) -> Self {
        Self {
            conn,
            store,
            policy,
        }
    }

    /// Validate, store, and record an upload for `owner`.
    ///
    /// Nothing is left in the storage root unless a row references it. Once
    /// the content has been validated the remaining steps run on a spawned
    /// task, so a dropped request cannot strand a promoted file.
    pub async fn upload(
        &self,
        owner: &str,
        filename: &str,
        source: SourceReader<'_>,
    ) -> Result<UploadOutcome, UploadError> {
        let extension = self.policy.check_filename(filename)?;
        let limit = self.policy.max_file_size();
        let staged = self.store.stage(source, &extension, limit).await?;

        let mime = match sniff_staged(&staged).await {
            Ok(mime) => mime,
            Err(e) => {
                self.discard(staged).await;
                return Err(e);
            }
        };
        if !self.policy.allows_mime(&mime) {
            self.discard(staged).await;
            debug!(owner, mime = %mime, "Rejected upload with disallowed content type");
            return Err(UploadRejection::MimeNotAllowed { mime }.into());
        }
        if staged.size() > limit {
            self.discard(staged).await;
            debug!(owner, limit, "Rejected upload over size limit");
            return Err(UploadError::TooLarge);
        }

        let service = self.clone();
        let owner = owner.to_string();
        let filename = filename.to_string();
        tokio::spawn(async move { service.commit(&owner, &filename, staged, &mime).await })
            .await
            .map_err(|e| UploadError::Task(e.to_string()))?
    }

    async fn commit(
        &self,
        owner: &str,
        filename: &str,
        staged: StagedFile,
        mime: &str,
    ) -> Result<UploadOutcome, UploadError> {
        let sha256 = staged.hash().to_hex();
        let size = i64::try_from(staged.size()).unwrap_or(i64::MAX);
        let key = self.store.promote(staged).await?;

        match self.find_by_hash(owner, &sha256).await {
            Ok(Some(id)) => {
                self.remove_orphan(&key).await;
                info!(duplicate_of = id, owner, "Duplicate upload collapsed into existing record");
                return Ok(UploadOutcome::Duplicate { id });
            }
            Ok(None) => {}
            Err(e) => {
                self.remove_orphan(&key).await;
                return Err(e.into());
            }
        }

        let model = upload::ActiveModel {
            owner: Set(owner.to_string()),
            original_name: Set(filename.to_string()),
            stored_name: Set(key.to_string()),
            size: Set(size),
            mime: Set(mime.to_string()),
            sha256: Set(sha256.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        match model.insert(&self.conn).await {
            Ok(inserted) => {
                info!(
                    id = inserted.id,
                    owner,
                    size,
                    mime,
                    stored_name = %key,
                    "Upload stored"
                );
                Ok(UploadOutcome::Created(inserted))
            }
            // A concurrent upload of the same content won the insert.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                self.remove_orphan(&key).await;
                let id = self.find_by_hash(owner, &sha256).await?.ok_or_else(|| {
                    DbErr::Custom("UniqueConstraintViolation but existing row not found".to_string())
                })?;
                Ok(UploadOutcome::Duplicate { id })
            }
            Err(e) => {
                self.remove_orphan(&key).await;
                Err(e.into())
            }
        }
    }

    async fn find_by_hash(&self, owner: &str, sha256: &str) -> Result<Option<i32>, DbErr> {
        let existing = upload::Entity::find()
            .filter(upload::Column::Sha256.eq(sha256))
            .filter(upload::Column::Owner.eq(owner))
            .one(&self.conn)
            .await?;
        Ok(existing.map(|m| m.id))
    }

    async fn discard(&self, staged: StagedFile) {
        if let Err(e) = self.store.discard(staged).await {
            warn!("Failed to discard staged upload: {}", e);
        }
    }

    async fn remove_orphan(&self, key: &StoredKey) {
        if let Err(e) = self.store.remove(key).await {
            warn!(stored_name = %key, "Failed to remove unreferenced upload: {}", e);
        }
    }

    /// List `owner`'s files, optionally filtered by a case-insensitive
    /// substring of the original name or MIME type.
    pub async fn list(&self, owner: &str, params: &ListParams) -> Result<FilePage, UploadError> {
        let mut query = upload::Entity::find().filter(upload::Column::Owner.eq(owner));

        if let Some(term) = &params.q {
            let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
            query = query.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(upload::Column::OriginalName)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(upload::Column::Mime)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }

        let total = query.clone().count(&self.conn).await?;

        let order = params.order.order();
        let items = query
            .select_only()
            .columns([
                upload::Column::Id,
                upload::Column::OriginalName,
                upload::Column::Size,
                upload::Column::Mime,
                upload::Column::CreatedAt,
            ])
            .order_by(params.sort.column(), order.clone())
            .order_by(upload::Column::Id, order)
            .offset(params.offset())
            .limit(params.per_page)
            .into_model::<FileListItem>()
            .all(&self.conn)
            .await?;

        Ok(FilePage {
            items,
            total,
            pages: total.div_ceil(params.per_page),
        })
    }

    /// Fetch a record, enforcing that it belongs to `owner`.
    pub async fn get(&self, owner: &str, id: i32) -> Result<upload::Model, UploadError> {
        let record = upload::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or(UploadError::NotFound)?;

        if record.owner != owner {
            return Err(UploadError::Forbidden);
        }
        Ok(record)
    }

    /// Open the stored content of a record.
    ///
    /// A record whose file has gone missing reads as not found.
    pub async fn open(&self, record: &upload::Model) -> Result<BoxReader, UploadError> {
        let key = StoredKey::parse(&record.stored_name)?;
        match self.store.open(&key).await {
            Ok(reader) => Ok(reader),
            Err(StorageError::NotFound(_)) => {
                warn!(id = record.id, stored_name = %key, "Stored file missing for upload record");
                Err(UploadError::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a record owned by `owner` together with its stored file.
    ///
    /// The row delete is committed only after the file is gone; a file that
    /// was already missing does not block the delete.
    pub async fn delete(&self, owner: &str, id: i32) -> Result<(), UploadError> {
        let record = self.get(owner, id).await?;
        let key = StoredKey::parse(&record.stored_name)?;

        let txn = self.conn.begin().await?;
        let result = upload::Entity::delete_by_id(record.id).exec(&txn).await?;
        if result.rows_affected == 0 {
            // Deleted concurrently; dropping the transaction rolls it back.
            return Err(UploadError::NotFound);
        }

        match self.store.remove(&key).await {
            Ok(true) => {}
            Ok(false) => warn!(id, stored_name = %key, "Stored file already missing on delete"),
            Err(e) => {
                txn.rollback().await?;
                return Err(e.into());
            }
        }

        if let Err(e) = txn.commit().await {
            error!(id, stored_name = %key, "File removed but record delete failed to commit: {}", e);
            return Err(e.into());
        }

        info!(id, owner, "Upload deleted");
        Ok(())
    }
}

/// Sniff the full staged file off the async runtime.
async fn sniff_staged(staged: &StagedFile) -> Result<String, UploadError> {
    let path = staged.path().to_path_buf();
    let head = staged.head().to_vec();
    tokio::task::spawn_blocking(move || sniff_file(&path, &head))
        .await
        .map_err(|e| UploadError::Task(e.to_string()))?
        .map_err(|e| UploadError::Storage(StorageError::Io(e)))
}
