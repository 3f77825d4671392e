//! SQLite-backed knowledge store and ticket history
//!
//! Articles live in a plain table mirrored into an FTS5 index over their
//! content. Ticket comments keep their metadata as a JSON column.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use deskpilot_core::{
    Article, CommentMetadata, DeskError, DeskResult, KnowledgeStore, MessageRole, TicketComment,
    TicketHistory, FULL_TEXT_OR,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::{WebError, WebResult};

/// Upper bound on rows returned by any single search
const SEARCH_LIMIT: i64 = 50;

/// Connection pool shared by both stores
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and create the schema
    pub async fn connect(database_url: &str) -> WebResult<Self> {
        info!("Connecting to database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| WebError::Database(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true);

        // Every connection to :memory: is its own database, so keep exactly one alive
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            tracing::error!("Database connection failed: {}", e);
            WebError::Database(format!("Failed to connect to database: {}", e))
        })?;

        Self::create_tables(&pool).await?;
        info!("Database ready");

        Ok(Self { pool })
    }

    async fn create_tables(pool: &SqlitePool) -> WebResult<()> {
        let statements = [
            (
                "articles",
                r#"
                CREATE TABLE IF NOT EXISTS articles (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    content TEXT NOT NULL,
                    category_id TEXT
                )
                "#,
            ),
            (
                "articles_fts",
                "CREATE VIRTUAL TABLE IF NOT EXISTS articles_fts USING fts5(id UNINDEXED, content)",
            ),
            (
                "ticket_comments",
                r#"
                CREATE TABLE IF NOT EXISTS ticket_comments (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    ticket_id TEXT NOT NULL,
                    author_id TEXT NOT NULL,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    metadata TEXT NOT NULL DEFAULT '{}'
                )
                "#,
            ),
            (
                "ticket_comments_index",
                "CREATE INDEX IF NOT EXISTS idx_ticket_comments_ticket ON ticket_comments (ticket_id, created_at)",
            ),
        ];

        for (name, sql) in statements {
            debug!("Creating {}", name);
            sqlx::query(sql).execute(pool).await.map_err(|e| {
                WebError::Database(format!("Failed to create {}: {}", name, e))
            })?;
        }

        Ok(())
    }

    pub fn knowledge_store(&self) -> SqliteKnowledgeStore {
        SqliteKnowledgeStore {
            pool: self.pool.clone(),
        }
    }

    pub fn ticket_history(&self) -> SqliteTicketHistory {
        SqliteTicketHistory {
            pool: self.pool.clone(),
        }
    }
}

fn storage_error(component: &str, operation: &str, e: sqlx::Error) -> DeskError {
    DeskError::storage(
        format!("{} failed: {}", operation, e),
        component,
        operation,
        Some(Box::new(e)),
    )
}

/// Quote a string as an FTS5 string literal
fn fts_quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Escape LIKE wildcards so the fragment matches literally
fn like_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn article_from_row(row: &SqliteRow) -> Result<Article, sqlx::Error> {
    Ok(Article {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        category_id: row.try_get("category_id")?,
    })
}

/// Knowledge store over the `articles` table and its FTS5 index
#[derive(Clone)]
pub struct SqliteKnowledgeStore {
    pool: SqlitePool,
}

impl SqliteKnowledgeStore {
    const COMPONENT: &'static str = "sqlite_knowledge_store";

    /// Insert or replace an article and reindex its content
    pub async fn insert_article(&self, article: &Article) -> DeskResult<()> {
        let err = |e| storage_error(Self::COMPONENT, "insert_article", e);
        let mut tx = self.pool.begin().await.map_err(err)?;

        sqlx::query(
            "INSERT OR REPLACE INTO articles (id, title, content, category_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&article.id)
        .bind(&article.title)
        .bind(&article.content)
        .bind(&article.category_id)
        .execute(&mut *tx)
        .await
        .map_err(err)?;

        sqlx::query("DELETE FROM articles_fts WHERE id = ?")
            .bind(&article.id)
            .execute(&mut *tx)
            .await
            .map_err(err)?;

        sqlx::query("INSERT INTO articles_fts (id, content) VALUES (?, ?)")
            .bind(&article.id)
            .bind(&article.content)
            .execute(&mut *tx)
            .await
            .map_err(err)?;

        tx.commit().await.map_err(err)?;
        Ok(())
    }

    async fn full_text(&self, match_expr: &str, operation: &str) -> DeskResult<Vec<Article>> {
        debug!(operation = operation, match_expr = %match_expr, "Running full-text query");

        let rows = sqlx::query(
            r#"
            SELECT a.id, a.title, a.content, a.category_id
            FROM articles_fts
            JOIN articles a ON a.id = articles_fts.id
            WHERE articles_fts MATCH ?
            ORDER BY articles_fts.rank
            LIMIT ?
            "#,
        )
        .bind(match_expr)
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error(Self::COMPONENT, operation, e))?;

        rows.iter()
            .map(article_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| storage_error(Self::COMPONENT, operation, e))
    }
}

#[async_trait]
impl KnowledgeStore for SqliteKnowledgeStore {
    async fn ping(&self) -> DeskResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error(Self::COMPONENT, "ping", e))?;
        Ok(())
    }

    async fn search_content(&self, query: &str) -> DeskResult<Vec<Article>> {
        let match_expr = query
            .split(FULL_TEXT_OR)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(fts_quote)
            .collect::<Vec<_>>()
            .join(FULL_TEXT_OR);

        if match_expr.is_empty() {
            return Ok(Vec::new());
        }
        self.full_text(&match_expr, "search_content").await
    }

    async fn search_phrase(&self, phrase: &str) -> DeskResult<Vec<Article>> {
        self.full_text(&fts_quote(phrase), "search_phrase").await
    }

    async fn search_titles(&self, fragment: &str) -> DeskResult<Vec<Article>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, content, category_id
            FROM articles
            WHERE lower(title) LIKE lower(?) ESCAPE '\'
            ORDER BY title
            LIMIT ?
            "#,
        )
        .bind(like_pattern(fragment))
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error(Self::COMPONENT, "search_titles", e))?;

        rows.iter()
            .map(article_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| storage_error(Self::COMPONENT, "search_titles", e))
    }

    async fn get_article(&self, id: &str) -> DeskResult<Option<Article>> {
        let row = sqlx::query("SELECT id, title, content, category_id FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error(Self::COMPONENT, "get_article", e))?;

        row.as_ref()
            .map(article_from_row)
            .transpose()
            .map_err(|e| storage_error(Self::COMPONENT, "get_article", e))
    }
}

/// Ticket history over the `ticket_comments` table
#[derive(Clone)]
pub struct SqliteTicketHistory {
    pool: SqlitePool,
}

impl SqliteTicketHistory {
    const COMPONENT: &'static str = "sqlite_ticket_history";

    pub async fn insert_comment(&self, ticket_id: &str, comment: &TicketComment) -> DeskResult<()> {
        let metadata = serde_json::to_string(&comment.metadata)?;

        sqlx::query(
            "INSERT INTO ticket_comments (ticket_id, author_id, content, created_at, metadata) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(ticket_id)
        .bind(&comment.author_id)
        .bind(&comment.content)
        .bind(comment.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .bind(metadata)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error(Self::COMPONENT, "insert_comment", e))?;

        Ok(())
    }
}

/// Read the role out of a metadata JSON blob, tolerating unknown labels
fn parse_metadata(raw: &str) -> CommentMetadata {
    let role = serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|value| {
            value
                .get("role")
                .and_then(|role| role.as_str())
                .and_then(MessageRole::from_label)
        });
    CommentMetadata { role }
}

#[async_trait]
impl TicketHistory for SqliteTicketHistory {
    async fn comments_for_ticket(&self, ticket_id: &str) -> DeskResult<Vec<TicketComment>> {
        let rows = sqlx::query(
            r#"
            SELECT author_id, content, created_at, metadata
            FROM ticket_comments
            WHERE ticket_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error(Self::COMPONENT, "comments_for_ticket", e))?;

        let mut comments = Vec::with_capacity(rows.len());
        for row in rows {
            let created_at: String = row
                .try_get("created_at")
                .map_err(|e| storage_error(Self::COMPONENT, "comments_for_ticket", e))?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|e| {
                    warn!(ticket_id = %ticket_id, error = %e, "Unparseable comment timestamp");
                    Utc::now()
                });
            let metadata: String = row.try_get("metadata").unwrap_or_default();

            comments.push(TicketComment {
                author_id: row.try_get("author_id").unwrap_or_default(),
                content: row
                    .try_get("content")
                    .map_err(|e| storage_error(Self::COMPONENT, "comments_for_ticket", e))?,
                created_at,
                metadata: parse_metadata(&metadata),
            });
        }

        Ok(comments)
    }
}
