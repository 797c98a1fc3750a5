use std::time::Duration;

use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder, SqliteQueryBuilder};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Schema,
};
use tracing::info;

use crate::entity::upload;

/// Unique index backing per-owner deduplication.
pub const DEDUP_INDEX: &str = "idx_uploads_sha256_owner";

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(20)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    ensure_schema(&db).await?;

    Ok(db)
}

/// Create the `uploads` table and its indexes if they do not exist yet.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();

    let mut table = Schema::new(backend).create_table_from_entity(upload::Entity);
    table.if_not_exists();
    let sql = match backend {
        DbBackend::Sqlite => table.to_string(SqliteQueryBuilder),
        _ => table.to_string(PostgresQueryBuilder),
    };
    db.execute_unprepared(&sql).await?;

    // Two uploads of the same content by the same owner must collapse into one row.
    let dedup = Index::create()
        .if_not_exists()
        .unique()
        .name(DEDUP_INDEX)
        .table(upload::Entity)
        .col(upload::Column::Sha256)
        .col(upload::Column::Owner)
        .to_owned();
    create_index(db, backend, &dedup).await?;
    info!("Ensured index {DEDUP_INDEX} exists");

    // SELECT ... FROM uploads WHERE owner = ? ORDER BY created_at
    let listing = Index::create()
        .if_not_exists()
        .name("idx_uploads_owner_created")
        .table(upload::Entity)
        .col(upload::Column::Owner)
        .col(upload::Column::CreatedAt)
        .to_owned();
    if let Err(e) = create_index(db, backend, &listing).await {
        tracing::warn!("Failed to create index idx_uploads_owner_created: {}", e);
    }

    Ok(())
}

async fn create_index(
    db: &DatabaseConnection,
    backend: DbBackend,
    stmt: &IndexCreateStatement,
) -> Result<(), DbErr> {
    let sql = match backend {
        DbBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
        _ => stmt.to_string(PostgresQueryBuilder),
    };
    db.execute_unprepared(&sql).await.map(|_| ())
}
