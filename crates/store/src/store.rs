//! Portfolio store traits and the SQLite implementation.

use crate::error::{StoreError, StoreResult};
use crate::models::*;
use crate::repos::{AttachmentRepo, PositionRepo, ProfileRepo};
use async_trait::async_trait;
use folio_core::{CollectionMetadata, CollectionType, ItemId, ListOrder, OwnerId, Position};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Sqlite, Transaction};
use std::ops::RangeInclusive;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use time::OffsetDateTime;

/// A unit of work against the store.
///
/// All repositories are implemented on the transaction so the indexer and
/// reconciler compose inside one commit. Dropping a transaction without
/// committing rolls it back.
#[async_trait]
pub trait StoreTx: PositionRepo + AttachmentRepo + ProfileRepo + Send {
    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// Combined portfolio store trait.
#[async_trait]
pub trait PortfolioStore: Send + Sync {
    /// Open a transaction.
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;

    /// Run database migrations.
    async fn migrate(&self) -> StoreResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> StoreResult<()>;
}

/// Columns selected for every collection table.
pub(crate) const ITEM_COLUMNS: &str = "id, user_id, order_index, payload, created_at, updated_at";

pub(crate) const ATTACHMENT_COLUMNS: &str = "id, parent_table, parent_id, user_id, file_url, \
     file_name, file_type, file_size, created_at, updated_at";

pub(crate) const INSERT_ATTACHMENTS_SQL: &str = "INSERT INTO attachments (parent_table, parent_id, \
     user_id, file_url, file_name, file_type, file_size, created_at, updated_at) ";

/// Map a unique violation on `user_profiles.slug` to a caller error.
pub(crate) fn slug_conflict(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::InvalidArgument("slug is already taken".to_string())
        }
        _ => StoreError::Storage(err),
    }
}

/// SQLite has a limit of ~999 bound parameters per statement.
const BATCH_SIZE: usize = 900;

const INSERT_ATTACHMENT_BINDS: usize = 9;

/// SQLite-based portfolio store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if needed) a SQLite database file.
    pub async fn new(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true);
        Self::connect(opts).await
    }

    /// Open a private in-memory database.
    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect(SqliteConnectOptions::from_str("sqlite::memory:")?).await
    }

    async fn connect(opts: SqliteConnectOptions) -> StoreResult<Self> {
        let opts = opts
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        // A single connection serialises every transaction, which is what
        // keeps concurrent position updates of one collection consistent.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            // An in-memory database lives only as long as its connection.
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::info!("SQLite portfolio store ready");
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl PortfolioStore for SqliteStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteTx { tx }))
    }

    async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Open SQLite transaction.
pub struct SqliteTx {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl StoreTx for SqliteTx {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl PositionRepo for SqliteTx {
    async fn lock_collection(
        &mut self,
        _owner: &OwnerId,
        _collection: CollectionType,
    ) -> StoreResult<()> {
        // Single-connection pool: transactions never interleave.
        Ok(())
    }

    async fn find_item(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        id: ItemId,
    ) -> StoreResult<Option<PositionedItem>> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM {} WHERE id = ? AND user_id = ?",
            collection.table_name()
        );
        let row = sqlx::query_as::<_, ItemRow>(&query)
            .bind(id)
            .bind(owner.as_str())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(|r| r.into_item(collection)).transpose()
    }

    async fn max_position(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
    ) -> StoreResult<Position> {
        let query = format!(
            "SELECT COALESCE(MAX(order_index), 0) FROM {} WHERE user_id = ?",
            collection.table_name()
        );
        let max: i64 = sqlx::query_scalar(&query)
            .bind(owner.as_str())
            .fetch_one(&mut *self.tx)
            .await?;
        Position::try_from(max)
            .map_err(|_| StoreError::Internal(format!("{collection} position {max} out of range")))
    }

    async fn count(&mut self, owner: &OwnerId, collection: CollectionType) -> StoreResult<i64> {
        let query = format!(
            "SELECT COUNT(*) FROM {} WHERE user_id = ?",
            collection.table_name()
        );
        let count: i64 = sqlx::query_scalar(&query)
            .bind(owner.as_str())
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count)
    }

    async fn shift_positions(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        range: RangeInclusive<Position>,
        delta: i32,
    ) -> StoreResult<u64> {
        let query = format!(
            "UPDATE {} SET order_index = order_index + ?, updated_at = ? \
             WHERE user_id = ? AND order_index BETWEEN ? AND ?",
            collection.table_name()
        );
        let result = sqlx::query(&query)
            .bind(delta)
            .bind(OffsetDateTime::now_utc())
            .bind(owner.as_str())
            .bind(*range.start())
            .bind(*range.end())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn set_position(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        id: ItemId,
        position: Position,
    ) -> StoreResult<()> {
        let query = format!(
            "UPDATE {} SET order_index = ?, updated_at = ? WHERE id = ? AND user_id = ?",
            collection.table_name()
        );
        sqlx::query(&query)
            .bind(position)
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .bind(owner.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_item(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        position: Position,
        payload: &Value,
    ) -> StoreResult<PositionedItem> {
        let now = OffsetDateTime::now_utc();
        let query = format!(
            "INSERT INTO {} (user_id, order_index, payload, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {ITEM_COLUMNS}",
            collection.table_name()
        );
        let row = sqlx::query_as::<_, ItemRow>(&query)
            .bind(owner.as_str())
            .bind(position)
            .bind(serde_json::to_string(payload)?)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *self.tx)
            .await?;
        row.into_item(collection)
    }

    async fn update_payload(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        id: ItemId,
        payload: &Value,
    ) -> StoreResult<Option<PositionedItem>> {
        let query = format!(
            "UPDATE {} SET payload = ?, updated_at = ? WHERE id = ? AND user_id = ? \
             RETURNING {ITEM_COLUMNS}",
            collection.table_name()
        );
        let row = sqlx::query_as::<_, ItemRow>(&query)
            .bind(serde_json::to_string(payload)?)
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .bind(owner.as_str())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(|r| r.into_item(collection)).transpose()
    }

    async fn delete_item(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        id: ItemId,
    ) -> StoreResult<u64> {
        let query = format!(
            "DELETE FROM {} WHERE id = ? AND user_id = ?",
            collection.table_name()
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(owner.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_items(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        order: ListOrder,
    ) -> StoreResult<Vec<PositionedItem>> {
        let dir = order.as_sql();
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM {} WHERE user_id = ? ORDER BY order_index {dir}, id {dir}",
            collection.table_name()
        );
        let rows = sqlx::query_as::<_, ItemRow>(&query)
            .bind(owner.as_str())
            .fetch_all(&mut *self.tx)
            .await?;
        rows.into_iter().map(|r| r.into_item(collection)).collect()
    }
}

#[async_trait]
impl AttachmentRepo for SqliteTx {
    async fn list_attachments(
        &mut self,
        owner: &OwnerId,
        parent_table: &str,
        parent_id: ItemId,
    ) -> StoreResult<Vec<AttachmentRow>> {
        let query = format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments \
             WHERE user_id = ? AND parent_table = ? AND parent_id = ? ORDER BY id"
        );
        let rows = sqlx::query_as::<_, AttachmentRow>(&query)
            .bind(owner.as_str())
            .bind(parent_table)
            .bind(parent_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn list_attachments_for_parents(
        &mut self,
        owner: &OwnerId,
        parent_table: &str,
        parent_ids: &[ItemId],
    ) -> StoreResult<Vec<AttachmentRow>> {
        let mut result = Vec::new();
        for batch in parent_ids.chunks(BATCH_SIZE) {
            let placeholders: Vec<&str> = batch.iter().map(|_| "?").collect();
            let query = format!(
                "SELECT {ATTACHMENT_COLUMNS} FROM attachments \
                 WHERE user_id = ? AND parent_table = ? AND parent_id IN ({}) \
                 ORDER BY parent_id, id",
                placeholders.join(", ")
            );

            let mut query_builder = sqlx::query_as::<_, AttachmentRow>(&query)
                .bind(owner.as_str())
                .bind(parent_table);
            for id in batch {
                query_builder = query_builder.bind(*id);
            }
            result.extend(query_builder.fetch_all(&mut *self.tx).await?);
        }
        Ok(result)
    }

    async fn insert_attachments(&mut self, attachments: &[NewAttachment]) -> StoreResult<()> {
        let now = OffsetDateTime::now_utc();
        for batch in attachments.chunks(BATCH_SIZE / INSERT_ATTACHMENT_BINDS) {
            let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(INSERT_ATTACHMENTS_SQL);
            builder.push_values(batch, |mut row, attachment| {
                row.push_bind(attachment.parent_table)
                    .push_bind(attachment.parent_id)
                    .push_bind(attachment.user_id.as_str())
                    .push_bind(attachment.file_url.as_str())
                    .push_bind(attachment.file_name.as_str())
                    .push_bind(attachment.file_type.as_str())
                    .push_bind(attachment.file_size)
                    .push_bind(now)
                    .push_bind(now);
            });
            builder.build().execute(&mut *self.tx).await?;
        }
        Ok(())
    }

    async fn delete_attachments(&mut self, owner: &OwnerId, ids: &[i64]) -> StoreResult<u64> {
        let mut deleted = 0;
        for batch in ids.chunks(BATCH_SIZE) {
            let placeholders: Vec<&str> = batch.iter().map(|_| "?").collect();
            let query = format!(
                "DELETE FROM attachments WHERE user_id = ? AND id IN ({})",
                placeholders.join(", ")
            );
            let mut query_builder = sqlx::query(&query).bind(owner.as_str());
            for id in batch {
                query_builder = query_builder.bind(*id);
            }
            deleted += query_builder.execute(&mut *self.tx).await?.rows_affected();
        }
        Ok(deleted)
    }

    async fn delete_attachments_for_parent(
        &mut self,
        owner: &OwnerId,
        parent_table: &str,
        parent_id: ItemId,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "DELETE FROM attachments WHERE user_id = ? AND parent_table = ? AND parent_id = ?",
        )
        .bind(owner.as_str())
        .bind(parent_table)
        .bind(parent_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ProfileRepo for SqliteTx {
    async fn get_profile(&mut self, owner: &OwnerId) -> StoreResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT user_id, email, full_name, avatar_url, slug, attributes, created_at, updated_at \
             FROM user_profiles WHERE user_id = ?",
        )
        .bind(owner.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(ProfileRow::into_profile).transpose()
    }

    async fn find_owner_by_slug(&mut self, slug: &str) -> StoreResult<Option<OwnerId>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT user_id FROM user_profiles WHERE slug = ?")
                .bind(slug)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(row.map(|(id,)| OwnerId::parse(&id)).transpose()?)
    }

    async fn upsert_profile(
        &mut self,
        owner: &OwnerId,
        update: &ProfileUpdate,
    ) -> StoreResult<Profile> {
        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO user_profiles (user_id, email, full_name, avatar_url, slug, attributes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, '{}', ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                email = excluded.email,
                full_name = excluded.full_name,
                avatar_url = excluded.avatar_url,
                slug = excluded.slug,
                updated_at = excluded.updated_at
            RETURNING user_id, email, full_name, avatar_url, slug, attributes, created_at, updated_at
            "#,
        )
        .bind(owner.as_str())
        .bind(&update.email)
        .bind(&update.full_name)
        .bind(&update.avatar_url)
        .bind(&update.slug)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(slug_conflict)?;
        row.into_profile()
    }

    async fn get_collection_metadata(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
    ) -> StoreResult<Option<CollectionMetadata>> {
        let row: Option<(Option<String>,)> = sqlx::query_as(
            "SELECT json_extract(COALESCE(attributes, '{}'), ?) FROM user_profiles WHERE user_id = ?",
        )
        .bind(format!("$.{}", collection.metadata_key()))
        .bind(owner.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        match row {
            None => Err(StoreError::NotFound(format!("profile {owner}"))),
            Some((None,)) => Ok(None),
            Some((Some(text),)) => Ok(serde_json::from_str(&text)?),
        }
    }

    async fn set_collection_metadata(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        metadata: &CollectionMetadata,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE user_profiles \
             SET attributes = json_set(COALESCE(attributes, '{}'), ?, json(?)), updated_at = ? \
             WHERE user_id = ?",
        )
        .bind(format!("$.{}", collection.metadata_key()))
        .bind(serde_json::to_string(metadata)?)
        .bind(OffsetDateTime::now_utc())
        .bind(owner.as_str())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("profile {owner}")));
        }
        Ok(())
    }
}

/// SQLite schema.
const SCHEMA_SQL: &str = r#"
-- User profiles; collection metadata lives in attributes
CREATE TABLE IF NOT EXISTS user_profiles (
    user_id TEXT PRIMARY KEY,
    email TEXT NOT NULL,
    full_name TEXT,
    avatar_url TEXT,
    slug TEXT UNIQUE,
    attributes TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Ordered collections: one table per collection type, identical layout
CREATE TABLE IF NOT EXISTS educations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    order_index INTEGER NOT NULL,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_educations_user_order ON educations(user_id, order_index);

CREATE TABLE IF NOT EXISTS certifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    order_index INTEGER NOT NULL,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_certifications_user_order ON certifications(user_id, order_index);

CREATE TABLE IF NOT EXISTS hackathons (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    order_index INTEGER NOT NULL,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_hackathons_user_order ON hackathons(user_id, order_index);

CREATE TABLE IF NOT EXISTS work_experiences (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    order_index INTEGER NOT NULL,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_work_experiences_user_order ON work_experiences(user_id, order_index);

CREATE TABLE IF NOT EXISTS tech_projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    order_index INTEGER NOT NULL,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tech_projects_user_order ON tech_projects(user_id, order_index);

-- Attachments, polymorphic over the parent table
CREATE TABLE IF NOT EXISTS attachments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_table TEXT NOT NULL,
    parent_id INTEGER NOT NULL,
    user_id TEXT NOT NULL,
    file_url TEXT NOT NULL,
    file_name TEXT NOT NULL,
    file_type TEXT NOT NULL,
    file_size INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_attachments_parent ON attachments(user_id, parent_table, parent_id);
"#;
