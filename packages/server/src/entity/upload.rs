use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One stored upload. Rows are immutable once inserted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "uploads")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Identity of the uploading user.
    pub owner: String,

    /// Filename as sent by the client.
    pub original_name: String,

    /// System-generated storage key (random token + allow-listed extension).
    #[sea_orm(unique)]
    pub stored_name: String,

    /// Size of the stored content in bytes.
    pub size: i64,

    /// Sniffed MIME type.
    pub mime: String,

    /// Hex-encoded SHA-256 of the content.
    pub sha256: String,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
