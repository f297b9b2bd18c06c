//! libSQL storage layer for collected articles (local file mode).
//!
//! The [`Storage`] struct wraps a libSQL database holding the `articles`
//! table. The content hash is `UNIQUE`, so re-inserting a known article is
//! reported as [`InsertOutcome::Duplicate`] rather than an error.
//!
//! **Access rules:**
//! - `solonews collect`: read-write via [`Storage::open`]
//! - `solonews list` and other readers: read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database, Row, params};
use serde::Serialize;
use uuid::Uuid;

use solonews_shared::{ArticleStatus, CandidateArticle, InsertOutcome, RawMeta, Result, SoloNewsError};

/// Upper bound for one `list_articles` page.
pub const MAX_LIST_LIMIT: i64 = 100;

const ARTICLE_COLUMNS: &str = "id, title, summary, original_url, canonical_url, author, \
     published_at, fetched_at, status, raw_meta, hash, created_at";

/// An article row as read back from the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredArticle {
    pub id: String,
    #[serde(flatten)]
    pub article: CandidateArticle,
    pub created_at: String,
}

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SoloNewsError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SoloNewsError::Storage(format!(
                "database not found: {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        SoloNewsError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    pub fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(SoloNewsError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Article operations
    // -----------------------------------------------------------------------

    /// Insert one article. A hash that is already stored yields
    /// [`InsertOutcome::Duplicate`]; any other failure is an error.
    pub async fn insert_article(&self, article: &CandidateArticle) -> Result<InsertOutcome> {
        self.check_writable()?;

        let raw_meta = serde_json::to_string(&article.raw_meta)
            .map_err(|e| SoloNewsError::Storage(format!("failed to encode raw_meta: {e}")))?;
        let id = Uuid::now_v7().to_string();

        let result = self
            .conn
            .execute(
                "INSERT INTO articles (id, title, summary, original_url, canonical_url, author,
                                       published_at, fetched_at, status, raw_meta, hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    id.as_str(),
                    article.title.as_str(),
                    article.summary.as_str(),
                    article.original_url.as_str(),
                    article.canonical_url.as_str(),
                    article.author.as_str(),
                    timestamp(&article.published_at),
                    timestamp(&article.fetched_at),
                    article.status.as_str(),
                    raw_meta,
                    article.hash.as_str(),
                ],
            )
            .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!(hash = %article.hash, "article already stored");
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Look an article up by its content hash.
    pub async fn get_article_by_hash(&self, hash: &str) -> Result<Option<StoredArticle>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE hash = ?1"),
                params![hash],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_article(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Total number of stored articles.
    pub async fn count_articles(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM articles", params![])
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => {
                let count = row.get::<i64>(0).map_err(storage_err)?;
                Ok(u64::try_from(count).unwrap_or(0))
            }
            Ok(None) => Ok(0),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Newest articles first. `limit` is clamped to `1..=100`, `offset` to `>= 0`.
    pub async fn list_articles(&self, limit: i64, offset: i64) -> Result<Vec<StoredArticle>> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        let offset = offset.max(0);

        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {ARTICLE_COLUMNS} FROM articles
                     ORDER BY published_at DESC, created_at DESC
                     LIMIT ?1 OFFSET ?2"
                ),
                params![limit, offset],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_article(&row)?);
        }
        Ok(results)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn storage_err(e: libsql::Error) -> SoloNewsError {
    SoloNewsError::Storage(e.to_string())
}

fn is_unique_violation(e: &libsql::Error) -> bool {
    e.to_string().contains("UNIQUE constraint failed")
}

/// Fixed-width RFC 3339 so text ordering matches time ordering.
fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SoloNewsError::Storage(format!("invalid date: {e}")))
}

fn row_to_article(row: &Row) -> Result<StoredArticle> {
    let text = |idx: i32| row.get::<String>(idx).map_err(storage_err);

    let status = text(8)?
        .parse::<ArticleStatus>()
        .map_err(SoloNewsError::Storage)?;
    let raw_meta: RawMeta = serde_json::from_str(&text(9)?)
        .map_err(|e| SoloNewsError::Storage(format!("invalid raw_meta: {e}")))?;

    Ok(StoredArticle {
        id: text(0)?,
        article: CandidateArticle {
            title: text(1)?,
            summary: text(2)?,
            original_url: text(3)?,
            canonical_url: text(4)?,
            author: text(5)?,
            published_at: parse_timestamp(&text(6)?)?,
            fetched_at: parse_timestamp(&text(7)?)?,
            status,
            raw_meta,
            hash: text(10)?,
        },
        created_at: text(11)?,
    })
}
