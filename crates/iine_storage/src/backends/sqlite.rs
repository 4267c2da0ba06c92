use async_trait::async_trait;
use chrono::{DateTime, Utc};
use iine_core::{ArticleRecord, ArticleStore, ChangeRecord, Error, EventKind, Result, WriteOutcome};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqliteConnection, SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use crate::{StorageBackend, StoreConfig};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        like_count INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS article_changes (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        event_kind TEXT NOT NULL,
        before_image TEXT,
        after_image TEXT,
        recorded_at TEXT
    )
    "#,
    // Add future migrations here
];

/// Conditional upsert: the update arm only fires when the count differs.
const CONDITIONAL_UPSERT: &str = r#"
    INSERT INTO articles (id, title, like_count)
    VALUES (?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        title = excluded.title,
        like_count = excluded.like_count
    WHERE articles.like_count <> excluded.like_count
"#;

pub struct SQLiteStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

fn map_sqlx(context: &str, e: sqlx::Error) -> Error {
    match e {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            Error::StoreUnavailable(format!("{}: {}", context, e))
        }
        other => Error::Database(format!("{}: {}", context, other)),
    }
}

fn row_to_record(row: &SqliteRow) -> Result<ArticleRecord> {
    let like_count: i64 = row.try_get("like_count").map_err(|e| map_sqlx("Failed to read like_count", e))?;
    Ok(ArticleRecord {
        id: row.try_get("id").map_err(|e| map_sqlx("Failed to read id", e))?,
        title: row.try_get("title").map_err(|e| map_sqlx("Failed to read title", e))?,
        like_count: u64::try_from(like_count).unwrap_or(0),
    })
}

fn decode_image(raw: Option<String>) -> Result<Option<ArticleRecord>> {
    raw.map(|json| serde_json::from_str(&json).map_err(Error::from)).transpose()
}

fn encode_image(image: &Option<ArticleRecord>) -> Result<Option<String>> {
    image.as_ref().map(|r| serde_json::to_string(r).map_err(Error::from)).transpose()
}

#[async_trait]
impl StorageBackend for SQLiteStore {
    fn name() -> &'static str {
        "sqlite"
    }

    async fn open(config: &StoreConfig) -> Result<Self> {
        Self::new_with_path(&config.db_path).await
    }
}

impl SQLiteStore {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::StoreUnavailable(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::StoreUnavailable(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| map_sqlx(&format!("Failed to run migration {}", i), e))?;
        }

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    /// Take a connection holding the write lock, so the read of the old
    /// image and the conditional write see the same state.
    async fn begin_immediate(&self) -> Result<PoolConnection<Sqlite>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx("Failed to acquire connection", e))?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx("Failed to begin transaction", e))?;
        Ok(conn)
    }

    async fn finish<T>(mut conn: PoolConnection<Sqlite>, result: Result<T>) -> Result<T> {
        let statement = if result.is_ok() { "COMMIT" } else { "ROLLBACK" };
        sqlx::query(statement)
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx("Failed to finish transaction", e))?;
        result
    }
}

async fn write_article(
    conn: &mut SqliteConnection,
    id: &str,
    title: &str,
    like_count: u64,
) -> Result<WriteOutcome> {
    let stored_count = i64::try_from(like_count)
        .map_err(|_| Error::Database(format!("like count {} out of range", like_count)))?;

    let before = sqlx::query("SELECT id, title, like_count FROM articles WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx("Failed to read article", e))?
        .map(|row| row_to_record(&row))
        .transpose()?;

    let written = sqlx::query(CONDITIONAL_UPSERT)
        .bind(id)
        .bind(title)
        .bind(stored_count)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx("Failed to update article", e))?;

    if written.rows_affected() == 0 {
        return Err(Error::ConditionNotMet(format!(
            "{} already has {} likes",
            id, like_count
        )));
    }

    let after = ArticleRecord::new(id, title, like_count);
    let (outcome, change) = match before {
        Some(before) => (WriteOutcome::Modified, ChangeRecord::modify(before, after)),
        None => (WriteOutcome::Inserted, ChangeRecord::insert(after)),
    };

    append_change(conn, &change).await?;

    Ok(outcome)
}

async fn append_change(conn: &mut SqliteConnection, change: &ChangeRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO article_changes (event_kind, before_image, after_image, recorded_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(change.event_kind.as_str())
    .bind(encode_image(&change.before)?)
    .bind(encode_image(&change.after)?)
    .bind(change.recorded_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx("Failed to append change record", e))?;
    Ok(())
}

async fn consume_changes(conn: &mut SqliteConnection, max: usize) -> Result<Vec<ChangeRecord>> {
    let limit = i64::try_from(max).unwrap_or(i64::MAX);
    let rows = sqlx::query(
        r#"
        SELECT seq, event_kind, before_image, after_image, recorded_at
        FROM article_changes
        ORDER BY seq
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx("Failed to read change feed", e))?;

    let mut changes = Vec::with_capacity(rows.len());
    let mut last_seq = None;
    for row in &rows {
        let seq: i64 = row.try_get("seq").map_err(|e| map_sqlx("Failed to read seq", e))?;
        let kind: String = row
            .try_get("event_kind")
            .map_err(|e| map_sqlx("Failed to read event_kind", e))?;
        let before: Option<String> = row
            .try_get("before_image")
            .map_err(|e| map_sqlx("Failed to read before_image", e))?;
        let after: Option<String> = row
            .try_get("after_image")
            .map_err(|e| map_sqlx("Failed to read after_image", e))?;
        let recorded_at: Option<DateTime<Utc>> = row
            .try_get("recorded_at")
            .map_err(|e| map_sqlx("Failed to read recorded_at", e))?;

        changes.push(ChangeRecord {
            event_kind: EventKind::parse(&kind),
            before: decode_image(before)?,
            after: decode_image(after)?,
            recorded_at,
        });
        last_seq = Some(seq);
    }

    if let Some(last_seq) = last_seq {
        sqlx::query("DELETE FROM article_changes WHERE seq <= ?")
            .bind(last_seq)
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx("Failed to consume change feed", e))?;
    }

    Ok(changes)
}

#[async_trait]
impl ArticleStore for SQLiteStore {
    async fn conditional_update(&self, id: &str, title: &str, like_count: u64) -> Result<WriteOutcome> {
        let mut conn = self.begin_immediate().await?;
        let result = write_article(&mut conn, id, title, like_count).await;
        Self::finish(conn, result).await
    }

    async fn get(&self, id: &str) -> Result<Option<ArticleRecord>> {
        sqlx::query("SELECT id, title, like_count FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx("Failed to get article", e))?
            .map(|row| row_to_record(&row))
            .transpose()
    }

    async fn list(&self) -> Result<Vec<ArticleRecord>> {
        let rows = sqlx::query("SELECT id, title, like_count FROM articles ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx("Failed to list articles", e))?;

        rows.iter().map(row_to_record).collect()
    }

    async fn take_changes(&self, max: usize) -> Result<Vec<ChangeRecord>> {
        let mut conn = self.begin_immediate().await?;
        let result = consume_changes(&mut conn, max).await;
        Self::finish(conn, result).await
    }

    async fn requeue_changes(&self, changes: Vec<ChangeRecord>) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut conn = self.begin_immediate().await?;
        let mut result = Ok(());
        for change in &changes {
            result = append_change(&mut conn, change).await;
            if result.is_err() {
                break;
            }
        }
        Self::finish(conn, result).await
    }
}
