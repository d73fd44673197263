use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::{DocStorage, StorageError};
use crate::models::{Document, Selection, Session};

const SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL DEFAULT '',
        owner TEXT NOT NULL,
        is_public BOOLEAN NOT NULL DEFAULT FALSE,
        last_modified TIMESTAMPTZ NOT NULL
    );
    CREATE INDEX IF NOT EXISTS documents_owner_idx ON documents (owner, last_modified DESC);
    CREATE INDEX IF NOT EXISTS documents_last_modified_idx ON documents (last_modified DESC);

    CREATE TABLE IF NOT EXISTS document_collaborators (
        document UUID NOT NULL REFERENCES documents (id) ON DELETE CASCADE,
        prpl TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (document, prpl)
    );
    CREATE INDEX IF NOT EXISTS document_collaborators_prpl_idx ON document_collaborators (prpl);

    CREATE TABLE IF NOT EXISTS document_sessions (
        document UUID NOT NULL REFERENCES documents (id) ON DELETE CASCADE,
        user_id TEXT NOT NULL,
        user_name TEXT NOT NULL,
        cursor_position BIGINT NOT NULL,
        selection_start BIGINT NOT NULL,
        selection_end BIGINT NOT NULL,
        last_seen TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (user_id, document)
    );
    CREATE INDEX IF NOT EXISTS document_sessions_document_idx ON document_sessions (document, last_seen);
"#;

const DOCUMENT_SELECT: &str = r#"
    SELECT
        d.id,
        d.title,
        d.content,
        d.owner,
        d.is_public,
        d.last_modified,
        COALESCE(
            (SELECT array_agg(dc.prpl ORDER BY dc.prpl) FROM document_collaborators dc WHERE dc.document = d.id),
            '{}'::text[]
        ) AS collaborators
    FROM documents d
"#;

/// Document row joined with its collaborator set
#[derive(Debug, Clone, sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    title: String,
    content: String,
    owner: String,
    is_public: bool,
    last_modified: DateTime<Utc>,
    collaborators: Vec<String>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            title: row.title,
            content: row.content,
            owner_id: row.owner,
            collaborators: row.collaborators.into_iter().collect(),
            is_public: row.is_public,
            last_modified: row.last_modified,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SessionRow {
    document: Uuid,
    user_id: String,
    user_name: String,
    cursor_position: i64,
    selection_start: i64,
    selection_end: i64,
    last_seen: DateTime<Utc>,
}

fn to_offset(value: i64) -> Result<u32, StorageError> {
    u32::try_from(value).map_err(|e| StorageError::Decode(format!("Offset {} out of range: {}", value, e)))
}

impl TryFrom<SessionRow> for Session {
    type Error = StorageError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Session {
            document_id: row.document,
            user_id: row.user_id,
            user_name: row.user_name,
            cursor_position: to_offset(row.cursor_position)?,
            selection: Selection::new(to_offset(row.selection_start)?, to_offset(row.selection_end)?),
            last_seen: row.last_seen,
        })
    }
}

/// Postgres backed storage
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Create a new connection pool and make sure the schema exists
    ///
    /// # Arguments
    /// * `database_url` - PostgreSQL connection string
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await?;

        info!("Database connection pool created successfully");

        let storage = Self { pool };
        storage.ensure_schema().await?;
        Ok(storage)
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await.map_err(|e| {
            error!("Failed to create schema: {}", e);
            StorageError::from(e)
        })?;
        info!("Database schema ready");
        Ok(())
    }

    fn log_pool(&self, what: &str, doc_id: Option<Uuid>) {
        let pool_idle = self.pool.num_idle() as u32;
        let pool_size = self.pool.size();
        debug!(
            "{} (doc {:?}). Pool connections: {} idle, {} in use",
            what,
            doc_id,
            pool_idle,
            pool_size.saturating_sub(pool_idle)
        );
    }
}

#[async_trait]
impl DocStorage for PgStorage {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn insert_document(&self, doc: &Document) -> Result<(), StorageError> {
        self.log_pool("Inserting document", Some(doc.id));

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO documents (id, title, content, owner, is_public, last_modified)
            VALUES ($1, $2, $3, $4, $5, $6);
            "#,
        )
        .bind(doc.id)
        .bind(&doc.title)
        .bind(&doc.content)
        .bind(&doc.owner_id)
        .bind(doc.is_public)
        .bind(doc.last_modified)
        .execute(&mut *tx)
        .await?;

        for prpl in &doc.collaborators {
            sqlx::query(
                "INSERT INTO document_collaborators (document, prpl, created_at) VALUES ($1, $2, $3);",
            )
            .bind(doc.id)
            .bind(prpl)
            .bind(doc.last_modified)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Document {} created by {}", doc.id, doc.owner_id);
        Ok(())
    }

    async fn get_document(&self, doc_id: Uuid) -> Result<Option<Document>, StorageError> {
        self.log_pool("Loading document", Some(doc_id));

        let query_sql = format!("{} WHERE d.id = $1", DOCUMENT_SELECT);
        let row = sqlx::query_as::<_, DocumentRow>(&query_sql)
            .bind(doc_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn list_owned(&self, owner: &str) -> Result<Vec<Document>, StorageError> {
        let query_sql = format!(
            "{} WHERE d.owner = $1 ORDER BY d.last_modified DESC, d.id",
            DOCUMENT_SELECT
        );
        let rows = sqlx::query_as::<_, DocumentRow>(&query_sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn list_shared(&self, prpl: &str) -> Result<Vec<Document>, StorageError> {
        let query_sql = format!(
            r#"{}
            WHERE d.owner <> $1
                AND (
                    d.is_public OR
                    EXISTS (SELECT 1 FROM document_collaborators dc WHERE dc.document = d.id AND dc.prpl = $1)
                )
            ORDER BY d.last_modified DESC, d.id"#,
            DOCUMENT_SELECT
        );
        let rows = sqlx::query_as::<_, DocumentRow>(&query_sql)
            .bind(prpl)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn update_content(
        &self,
        doc_id: Uuid,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.log_pool("Updating content", Some(doc_id));

        let result = sqlx::query("UPDATE documents SET content = $1, last_modified = $2 WHERE id = $3;")
            .bind(content)
            .bind(at)
            .bind(doc_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn update_title(
        &self,
        doc_id: Uuid,
        title: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE documents SET title = $1, last_modified = $2 WHERE id = $3;")
            .bind(title)
            .bind(at)
            .bind(doc_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn set_public(
        &self,
        doc_id: Uuid,
        is_public: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE documents SET is_public = $1, last_modified = $2 WHERE id = $3;")
            .bind(is_public)
            .bind(at)
            .bind(doc_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn add_collaborator(
        &self,
        doc_id: Uuid,
        prpl: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        self.log_pool("Adding collaborator", Some(doc_id));

        let mut tx = self.pool.begin().await?;

        // Lock the document row so the add and the timestamp bump commit together
        let locked = sqlx::query("SELECT id FROM documents WHERE id = $1 FOR UPDATE;")
            .bind(doc_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(StorageError::NotFound);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO document_collaborators (document, prpl, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (document, prpl) DO NOTHING;
            "#,
        )
        .bind(doc_id)
        .bind(prpl)
        .bind(at)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if inserted {
            sqlx::query("UPDATE documents SET last_modified = $1 WHERE id = $2;")
                .bind(at)
                .bind(doc_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn delete_document(&self, doc_id: Uuid) -> Result<(), StorageError> {
        self.log_pool("Deleting document", Some(doc_id));

        let mut tx = self.pool.begin().await?;

        let sessions = sqlx::query("DELETE FROM document_sessions WHERE document = $1;")
            .bind(doc_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM documents WHERE id = $1;")
            .bind(doc_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(StorageError::NotFound);
        }

        tx.commit().await?;
        info!("Document {} deleted along with {} sessions", doc_id, sessions);
        Ok(())
    }

    async fn upsert_session(&self, session: &Session) -> Result<(), StorageError> {
        let result = sqlx::query(
            r#"
            INSERT INTO document_sessions
                (document, user_id, user_name, cursor_position, selection_start, selection_end, last_seen)
            SELECT $1::uuid, $2::text, $3::text, $4::bigint, $5::bigint, $6::bigint, $7::timestamptz
            WHERE EXISTS (SELECT 1 FROM documents WHERE id = $1)
            ON CONFLICT (user_id, document) DO UPDATE
                SET cursor_position = EXCLUDED.cursor_position,
                    selection_start = EXCLUDED.selection_start,
                    selection_end = EXCLUDED.selection_end,
                    last_seen = EXCLUDED.last_seen;
            "#,
        )
        .bind(session.document_id)
        .bind(&session.user_id)
        .bind(&session.user_name)
        .bind(i64::from(session.cursor_position))
        .bind(i64::from(session.selection.start))
        .bind(i64::from(session.selection.end))
        .bind(session.last_seen)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_sessions_since(
        &self,
        doc_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Session>, StorageError> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT document, user_id, user_name, cursor_position, selection_start, selection_end, last_seen
            FROM document_sessions
            WHERE document = $1 AND last_seen > $2
            ORDER BY user_id;
            "#,
        )
        .bind(doc_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Session::try_from).collect()
    }

    async fn get_session(
        &self,
        user_id: &str,
        doc_id: Uuid,
    ) -> Result<Option<Session>, StorageError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT document, user_id, user_name, cursor_position, selection_start, selection_end, last_seen
            FROM document_sessions
            WHERE user_id = $1 AND document = $2;
            "#,
        )
        .bind(user_id)
        .bind(doc_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Session::try_from).transpose()
    }

    async fn delete_session(&self, user_id: &str, doc_id: Uuid) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM document_sessions WHERE user_id = $1 AND document = $2;")
            .bind(user_id)
            .bind(doc_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn evict_sessions_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM document_sessions WHERE last_seen <= $1;")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
