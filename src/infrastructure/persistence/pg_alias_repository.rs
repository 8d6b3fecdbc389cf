//! PostgreSQL implementation of the alias repository.

use async_trait::async_trait;
use sqlx::postgres::PgDatabaseError;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::domain::entities::{NewRecord, Record};
use crate::domain::repositories::{
    AliasRepository, BatchRepository, BatchTransaction, Pinger, RepositoryError,
    RepositoryResult, TxRunner,
};

/// Deadline applied to every statement.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Deadline for the liveness probe.
pub const PING_TIMEOUT: Duration = Duration::from_secs(1);

const SHORT_URL_CONSTRAINT: &str = "alias_url_short_url_uk";

/// PostgreSQL repository storing mappings in the `alias_url` table.
///
/// Uniqueness of both columns is enforced by the table constraints
/// (`alias_url_url_uk` and `alias_url_short_url_uk`); a violation is reported
/// as the matching collision variant of [`RepositoryError`], carrying the
/// conflicting value.
pub struct PgAliasRepository {
    pool: Arc<PgPool>,
}

impl PgAliasRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

async fn with_timeout<T, F>(op: &str, fut: F) -> RepositoryResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result.map_err(|e| map_sqlx_error(e, op)),
        Err(_) => Err(RepositoryError::Timeout(op.to_string())),
    }
}

fn map_sqlx_error(e: sqlx::Error, context: &str) -> RepositoryError {
    if let Some(db_err) = e.as_database_error()
        && db_err.is_unique_violation()
    {
        let value = db_err
            .try_downcast_ref::<PgDatabaseError>()
            .and_then(PgDatabaseError::detail)
            .and_then(conflicting_value)
            .unwrap_or(context);
        return unique_violation(db_err.constraint(), value);
    }

    if let sqlx::Error::PoolTimedOut = e {
        return RepositoryError::Timeout(context.to_string());
    }

    RepositoryError::Backend(format!("{context}: {e}"))
}

/// Maps a unique violation to a collision. Only the alias constraint is an
/// alias collision; any other unique key is treated as the URL being taken.
fn unique_violation(constraint: Option<&str>, value: &str) -> RepositoryError {
    match constraint {
        Some(SHORT_URL_CONSTRAINT) => RepositoryError::ShortAlreadyExists(value.to_string()),
        _ => RepositoryError::UrlAlreadyExists(value.to_string()),
    }
}

/// Extracts the offending value from a detail like `Key (url)=(x) already exists.`
fn conflicting_value(detail: &str) -> Option<&str> {
    let start = detail.find(")=(")? + 3;
    let end = detail.rfind(") already exists")?;
    (start <= end).then(|| &detail[start..end])
}

async fn fetch_by_urls<'e, E>(executor: E, urls: &[String]) -> RepositoryResult<Vec<Record>>
where
    E: PgExecutor<'e>,
{
    if urls.is_empty() {
        return Ok(Vec::new());
    }

    let rows = with_timeout(
        "get_by_urls",
        sqlx::query_as::<_, (i64, String, String)>(
            "SELECT id, url, short_url FROM alias_url WHERE url = ANY($1)",
        )
        .bind(urls)
        .fetch_all(executor),
    )
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, url, short_url)| Record::new(id, url, short_url))
        .collect())
}

async fn insert_many<'e, E>(executor: E, records: Vec<NewRecord>) -> RepositoryResult<Vec<Record>>
where
    E: PgExecutor<'e>,
{
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let (urls, short_urls): (Vec<String>, Vec<String>) =
        records.into_iter().map(|r| (r.url, r.short_url)).unzip();

    // Alias conflicts are skipped; a URL conflict still raises and aborts the statement.
    let rows = with_timeout(
        "add_many",
        sqlx::query_as::<_, (i64, String, String)>(
            r#"
            INSERT INTO alias_url (url, short_url)
            SELECT * FROM UNNEST($1::text[], $2::text[])
            ON CONFLICT (short_url) DO NOTHING
            RETURNING id, url, short_url
            "#,
        )
        .bind(&urls)
        .bind(&short_urls)
        .fetch_all(executor),
    )
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, url, short_url)| Record::new(id, url, short_url))
        .collect())
}

#[async_trait]
impl AliasRepository for PgAliasRepository {
    async fn add(&self, short_url: &str, url: &str) -> RepositoryResult<()> {
        let result = timeout(
            QUERY_TIMEOUT,
            sqlx::query("INSERT INTO alias_url (url, short_url) VALUES ($1, $2)")
                .bind(url)
                .bind(short_url)
                .execute(self.pool.as_ref()),
        )
        .await
        .map_err(|_| RepositoryError::Timeout("add".into()))?;

        match result {
            Ok(_) => Ok(()),
            Err(e) => Err(match map_sqlx_error(e, "add") {
                RepositoryError::ShortAlreadyExists(_) => {
                    RepositoryError::ShortAlreadyExists(short_url.to_string())
                }
                RepositoryError::UrlAlreadyExists(_) => {
                    RepositoryError::UrlAlreadyExists(url.to_string())
                }
                other => other,
            }),
        }
    }

    async fn get(&self, short_url: &str) -> RepositoryResult<String> {
        with_timeout(
            "get",
            sqlx::query_scalar::<_, String>("SELECT url FROM alias_url WHERE short_url = $1")
                .bind(short_url)
                .fetch_optional(self.pool.as_ref()),
        )
        .await?
        .ok_or_else(|| RepositoryError::NotFoundShort(short_url.to_string()))
    }

    async fn search(&self, url: &str) -> RepositoryResult<String> {
        with_timeout(
            "search",
            sqlx::query_scalar::<_, String>("SELECT short_url FROM alias_url WHERE url = $1")
                .bind(url)
                .fetch_optional(self.pool.as_ref()),
        )
        .await?
        .ok_or_else(|| RepositoryError::NotFoundUrl(url.to_string()))
    }
}

#[async_trait]
impl BatchRepository for PgAliasRepository {
    async fn get_by_urls(&self, urls: &[String]) -> RepositoryResult<Vec<Record>> {
        fetch_by_urls(self.pool.as_ref(), urls).await
    }

    async fn add_many(&self, records: Vec<NewRecord>) -> RepositoryResult<Vec<Record>> {
        insert_many(self.pool.as_ref(), records).await
    }
}

#[async_trait]
impl TxRunner for PgAliasRepository {
    async fn begin(&self) -> RepositoryResult<Box<dyn BatchTransaction>> {
        let tx = with_timeout("begin", self.pool.begin()).await?;
        Ok(Box::new(PgBatchTransaction {
            tx: Mutex::new(tx),
        }))
    }
}

#[async_trait]
impl Pinger for PgAliasRepository {
    async fn ping(&self) -> RepositoryResult<()> {
        timeout(PING_TIMEOUT, sqlx::query("SELECT 1").execute(self.pool.as_ref()))
            .await
            .map_err(|_| RepositoryError::Timeout("ping".into()))?
            .map_err(|e| map_sqlx_error(e, "ping"))?;
        Ok(())
    }
}

/// Open transaction handed out by [`PgAliasRepository::begin`].
///
/// Dropping it without [`BatchTransaction::commit`] lets sqlx roll it back.
pub struct PgBatchTransaction {
    tx: Mutex<Transaction<'static, Postgres>>,
}

#[async_trait]
impl BatchRepository for PgBatchTransaction {
    async fn get_by_urls(&self, urls: &[String]) -> RepositoryResult<Vec<Record>> {
        let mut tx = self.tx.lock().await;
        fetch_by_urls(&mut **tx, urls).await
    }

    async fn add_many(&self, records: Vec<NewRecord>) -> RepositoryResult<Vec<Record>> {
        let mut tx = self.tx.lock().await;
        insert_many(&mut **tx, records).await
    }
}

#[async_trait]
impl BatchTransaction for PgBatchTransaction {
    async fn commit(self: Box<Self>) -> RepositoryResult<()> {
        let tx = self.tx.into_inner();
        with_timeout("commit", tx.commit()).await
    }
}
