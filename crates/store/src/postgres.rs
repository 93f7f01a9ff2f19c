//! PostgreSQL-based portfolio store implementation.

use crate::error::{StoreError, StoreResult};
use crate::models::*;
use crate::repos::{AttachmentRepo, PositionRepo, ProfileRepo};
use crate::store::{
    ATTACHMENT_COLUMNS, INSERT_ATTACHMENTS_SQL, PortfolioStore, StoreTx, slug_conflict,
};
use async_trait::async_trait;
use folio_core::config::PgSslMode;
use folio_core::{CollectionMetadata, CollectionType, ItemId, ListOrder, OwnerId, Position};
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode as SqlxPgSslMode};
use sqlx::{Pool, Postgres, QueryBuilder, Transaction};
use std::ops::RangeInclusive;
use std::str::FromStr;
use time::OffsetDateTime;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

/// Payload is JSONB on PostgreSQL; it is read back as text.
const PG_ITEM_COLUMNS: &str =
    "id, user_id, order_index, payload::text AS payload, created_at, updated_at";

const PG_PROFILE_COLUMNS: &str = "user_id, email, full_name, avatar_url, slug, \
     attributes::text AS attributes, created_at, updated_at";

fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// Advisory lock key of one owner's collection.
fn collection_lock_key(owner: &OwnerId, collection: CollectionType) -> String {
    format!("{}:{}", collection.as_str(), owner.as_str())
}

/// PostgreSQL-based portfolio store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> StoreResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Create a new PostgreSQL store from individual connection parameters.
    ///
    /// Lets the password come from the environment instead of a URL in the
    /// config file.
    #[allow(clippy::too_many_arguments)]
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        ssl_mode: Option<PgSslMode>,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> StoreResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }

        if let Some(pass) = password {
            opts = opts.password(pass);
        }

        if let Some(mode) = ssl_mode {
            let sqlx_mode = match mode {
                PgSslMode::Disable => SqlxPgSslMode::Disable,
                PgSslMode::Prefer => SqlxPgSslMode::Prefer,
                PgSslMode::Require => SqlxPgSslMode::Require,
            };
            opts = opts.ssl_mode(sqlx_mode);
        }

        tracing::info!(
            host = host,
            port = port,
            database = database,
            username = username.unwrap_or("<none>"),
            ssl_mode = ?ssl_mode,
            "Connecting to PostgreSQL with individual parameters"
        );

        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    async fn connect(
        mut opts: PgConnectOptions,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> StoreResult<Self> {
        if let Some(timeout_ms) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{}ms", timeout_ms))]);
            tracing::info!(timeout_ms = timeout_ms, "PostgreSQL statement_timeout set");
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl PortfolioStore for PostgresStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn migrate(&self) -> StoreResult<()> {
        // PostgreSQL doesn't allow multiple statements in a single prepared statement,
        // so we split the schema and execute each statement separately.
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Open PostgreSQL transaction.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
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
impl PositionRepo for PgTx {
    async fn lock_collection(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
    ) -> StoreResult<()> {
        // Released automatically at commit or rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1)::bigint)")
            .bind(collection_lock_key(owner, collection))
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn find_item(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        id: ItemId,
    ) -> StoreResult<Option<PositionedItem>> {
        let query = format!(
            "SELECT {PG_ITEM_COLUMNS} FROM {} WHERE id = $1 AND user_id = $2",
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
            "SELECT COALESCE(MAX(order_index), 0) FROM {} WHERE user_id = $1",
            collection.table_name()
        );
        let max: i32 = sqlx::query_scalar(&query)
            .bind(owner.as_str())
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(max)
    }

    async fn count(&mut self, owner: &OwnerId, collection: CollectionType) -> StoreResult<i64> {
        let query = format!(
            "SELECT COUNT(*) FROM {} WHERE user_id = $1",
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
            "UPDATE {} SET order_index = order_index + $1, updated_at = $2 \
             WHERE user_id = $3 AND order_index BETWEEN $4 AND $5",
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
            "UPDATE {} SET order_index = $1, updated_at = $2 WHERE id = $3 AND user_id = $4",
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
             VALUES ($1, $2, $3::jsonb, $4, $5) RETURNING {PG_ITEM_COLUMNS}",
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
            "UPDATE {} SET payload = $1::jsonb, updated_at = $2 WHERE id = $3 AND user_id = $4 \
             RETURNING {PG_ITEM_COLUMNS}",
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
            "DELETE FROM {} WHERE id = $1 AND user_id = $2",
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
            "SELECT {PG_ITEM_COLUMNS} FROM {} WHERE user_id = $1 ORDER BY order_index {dir}, id {dir}",
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
impl AttachmentRepo for PgTx {
    async fn list_attachments(
        &mut self,
        owner: &OwnerId,
        parent_table: &str,
        parent_id: ItemId,
    ) -> StoreResult<Vec<AttachmentRow>> {
        let query = format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments \
             WHERE user_id = $1 AND parent_table = $2 AND parent_id = $3 ORDER BY id"
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
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments \
             WHERE user_id = $1 AND parent_table = $2 AND parent_id = ANY($3) \
             ORDER BY parent_id, id"
        );
        let rows = sqlx::query_as::<_, AttachmentRow>(&query)
            .bind(owner.as_str())
            .bind(parent_table)
            .bind(parent_ids)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn insert_attachments(&mut self, attachments: &[NewAttachment]) -> StoreResult<()> {
        if attachments.is_empty() {
            return Ok(());
        }
        let now = OffsetDateTime::now_utc();
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(INSERT_ATTACHMENTS_SQL);
        builder.push_values(attachments, |mut row, attachment| {
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
        Ok(())
    }

    async fn delete_attachments(&mut self, owner: &OwnerId, ids: &[i64]) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM attachments WHERE user_id = $1 AND id = ANY($2)")
            .bind(owner.as_str())
            .bind(ids)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_attachments_for_parent(
        &mut self,
        owner: &OwnerId,
        parent_table: &str,
        parent_id: ItemId,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "DELETE FROM attachments WHERE user_id = $1 AND parent_table = $2 AND parent_id = $3",
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
impl ProfileRepo for PgTx {
    async fn get_profile(&mut self, owner: &OwnerId) -> StoreResult<Option<Profile>> {
        let query = format!("SELECT {PG_PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1");
        let row = sqlx::query_as::<_, ProfileRow>(&query)
            .bind(owner.as_str())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(ProfileRow::into_profile).transpose()
    }

    async fn find_owner_by_slug(&mut self, slug: &str) -> StoreResult<Option<OwnerId>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT user_id FROM user_profiles WHERE slug = $1")
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
        let query = format!(
            r#"
            INSERT INTO user_profiles (user_id, email, full_name, avatar_url, slug, attributes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, '{{}}'::jsonb, $6, $7)
            ON CONFLICT (user_id) DO UPDATE SET
                email = EXCLUDED.email,
                full_name = EXCLUDED.full_name,
                avatar_url = EXCLUDED.avatar_url,
                slug = EXCLUDED.slug,
                updated_at = EXCLUDED.updated_at
            RETURNING {PG_PROFILE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ProfileRow>(&query)
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
            "SELECT (COALESCE(attributes, '{}'::jsonb) -> $1::text)::text \
             FROM user_profiles WHERE user_id = $2",
        )
        .bind(collection.metadata_key())
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
             SET attributes = jsonb_set(COALESCE(attributes, '{}'::jsonb), ARRAY[$1::text], $2::jsonb, true), \
                 updated_at = $3 \
             WHERE user_id = $4",
        )
        .bind(collection.metadata_key())
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
