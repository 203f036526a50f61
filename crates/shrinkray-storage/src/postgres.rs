use async_trait::async_trait;
use jiff::Timestamp;
use shrinkray_core::storage::Result;
use shrinkray_core::{Storage, StorageError, Token, UrlRecord};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use typed_builder::TypedBuilder;

const SCHEMA: &str = include_str!("../ddl/postgres/urls.sql");

/// Constraint backing the token primary key.
const TOKEN_CONSTRAINT: &str = "urls_pkey";

/// Connection settings for [`PostgresStorage::connect`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct PostgresSettings {
    #[builder(setter(into))]
    url: String,
    #[builder(default = 10)]
    max_connections: u32,
    #[builder(default = Duration::from_secs(5))]
    acquire_timeout: Duration,
}

/// PostgreSQL implementation of the storage contract.
///
/// Records live in a single `urls` table keyed by token. A unique index over
/// the URL digest rejects a second token for a URL that already has one, so
/// concurrent first-time saves of the same URL surface as
/// [`StorageError::UrlConflict`] instead of duplicating the mapping.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates a storage from an existing connection pool.
    ///
    /// The schema is not created; call [`PostgresStorage::ensure_schema`]
    /// if the table may be missing.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool and makes sure the schema exists.
    pub async fn connect(settings: &PostgresSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect(&settings.url)
            .await
            .map_err(map_sqlx_error)?;

        let storage = Self::new(pool);
        storage.ensure_schema().await?;
        Ok(storage)
    }

    /// Creates the `urls` table and its indexes if they do not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn parse_created_at(seconds: i64) -> Result<Timestamp> {
    Timestamp::from_second(seconds).map_err(|e| {
        StorageError::InvalidData(format!("invalid created_at timestamp '{}': {e}", seconds))
    })
}

fn unique_violation_constraint(err: &sqlx::Error) -> Option<Option<&str>> {
    let db_err = err.as_database_error()?;
    db_err.is_unique_violation().then(|| db_err.constraint())
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn resolve(&self, token: &Token) -> Result<Option<UrlRecord>> {
        let row = sqlx::query(
            r#"
            SELECT full_url, created_at
            FROM urls
            WHERE token = $1
            "#,
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let full_url: String = row.try_get("full_url").map_err(map_sqlx_error)?;
        let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;

        Ok(Some(UrlRecord {
            token: token.clone(),
            full_url,
            created_at: parse_created_at(created_at)?,
        }))
    }

    async fn find_token(&self, full_url: &str) -> Result<Option<Token>> {
        let row = sqlx::query(
            r#"
            SELECT token
            FROM urls
            WHERE md5(full_url) = md5($1)
              AND full_url = $1
            "#,
        )
        .bind(full_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|row| {
            row.try_get::<String, _>("token")
                .map(Token::new_unchecked)
                .map_err(map_sqlx_error)
        })
        .transpose()
    }

    async fn save(&self, full_url: &str, token: &Token) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO urls (token, full_url, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(token.as_str())
        .bind(full_url)
        .bind(Timestamp::now().as_second())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => match unique_violation_constraint(&err) {
                Some(Some(TOKEN_CONSTRAINT)) => Err(StorageError::TokenConflict(token.to_string())),
                Some(_) => Err(StorageError::UrlConflict(full_url.to_owned())),
                None => Err(map_sqlx_error(err)),
            },
        }
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}
