use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::notes::repo_types::{Note, NoteStatus};

pub const PAGE_SIZE: i64 = 20;

/// Filters for the owner-scoped listing. `status` always has a value; the
/// default is applied at the boundary.
#[derive(Debug)]
pub struct NoteFilters {
    pub status: NoteStatus,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub cursor: Option<OffsetDateTime>,
}

impl Note {
    /// Cursor-paginated listing, newest first. Fetches one row past the page
    /// size to decide whether another page exists; the returned cursor is the
    /// creation time of the last row on the page.
    pub async fn paginate(
        db: &PgPool,
        author_id: Uuid,
        filters: &NoteFilters,
    ) -> anyhow::Result<(Vec<Note>, Option<OffsetDateTime>)> {
        // Wildcard wrapping for the substring search lives here and nowhere
        // else.
        let pattern = filters.search.as_ref().map(|term| format!("%{term}%"));

        let mut rows = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, title, content, tags, author_id, status, created_at, updated_at
            FROM notes
            WHERE author_id = $1
              AND status = $2
              AND ($3::text IS NULL OR $3 = ANY(tags))
              AND ($4::text IS NULL OR title ILIKE $4 OR content ILIKE $4)
              AND ($5::timestamptz IS NULL OR created_at < $5)
            ORDER BY created_at DESC
            LIMIT $6
            "#,
        )
        .bind(author_id)
        .bind(filters.status)
        .bind(filters.tag.as_deref())
        .bind(pattern.as_deref())
        .bind(filters.cursor)
        .bind(PAGE_SIZE + 1)
        .fetch_all(db)
        .await?;

        let next_cursor = if rows.len() as i64 > PAGE_SIZE {
            rows.truncate(PAGE_SIZE as usize);
            rows.last().map(|note| note.created_at)
        } else {
            None
        };

        Ok((rows, next_cursor))
    }

    /// The sole ownership check for mutating operations. A note owned by
    /// someone else and a nonexistent note are indistinguishable here.
    pub async fn find_by_id_and_author(
        db: &PgPool,
        note_id: Uuid,
        author_id: Uuid,
    ) -> anyhow::Result<Option<Note>> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, title, content, tags, author_id, status, created_at, updated_at
            FROM notes
            WHERE id = $1 AND author_id = $2
            "#,
        )
        .bind(note_id)
        .bind(author_id)
        .fetch_optional(db)
        .await?;
        Ok(note)
    }

    pub async fn insert(
        db: &PgPool,
        author_id: Uuid,
        title: &str,
        content: &str,
        tags: &[String],
    ) -> anyhow::Result<Note> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (title, content, tags, author_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, content, tags, author_id, status, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(tags)
        .bind(author_id)
        .fetch_one(db)
        .await?;
        Ok(note)
    }

    /// Partial update; absent fields keep their stored values. The update
    /// timestamp is set in the same write.
    pub async fn update(
        db: &PgPool,
        note_id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
        tags: Option<&[String]>,
    ) -> anyhow::Result<Note> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            UPDATE notes
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                tags = COALESCE($4, tags),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, content, tags, author_id, status, created_at, updated_at
            "#,
        )
        .bind(note_id)
        .bind(title)
        .bind(content)
        .bind(tags)
        .fetch_one(db)
        .await?;
        Ok(note)
    }

    /// Guarded transition: only an active note archives. Zero rows affected
    /// means the guard failed.
    pub async fn archive(db: &PgPool, note_id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE notes
            SET status = 'archived', updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(note_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    /// Mirror of `archive`: only an archived note restores.
    pub async fn restore(db: &PgPool, note_id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE notes
            SET status = 'active', updated_at = NOW()
            WHERE id = $1 AND status = 'archived'
            "#,
        )
        .bind(note_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(db: &PgPool, note_id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query(r#"DELETE FROM notes WHERE id = $1"#)
            .bind(note_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}
