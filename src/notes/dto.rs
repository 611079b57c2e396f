use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::notes::repo_types::{Note, NoteStatus};

/// Query parameters for the note listing.
#[derive(Debug, Deserialize)]
pub struct ListNotesQuery {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub cursor: Option<OffsetDateTime>,
    pub status: Option<NoteStatus>,
    pub tag: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update; at least one field must be present.
#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UpdateNoteRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tags.is_none()
    }
}

/// Listing projection: content and ownership stay server-side.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteListItem {
    pub id: Uuid,
    pub title: String,
    pub tags: Vec<String>,
    pub status: NoteStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Note> for NoteListItem {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            tags: note.tags,
            status: note.status,
            created_at: note.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub author_id: Uuid,
    pub status: NoteStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            tags: note.tags,
            author_id: note.author_id,
            status: note.status,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageMeta {
    #[serde(with = "time::serde::rfc3339::option")]
    pub cursor: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub struct NotePage {
    pub docs: Vec<NoteListItem>,
    pub meta: PageMeta,
}

#[derive(Debug, Serialize)]
pub struct ArchivedResponse {
    pub archived: bool,
}

#[derive(Debug, Serialize)]
pub struct RestoredResponse {
    pub restored: bool,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch_is_detected() {
        let patch = UpdateNoteRequest {
            title: None,
            content: None,
            tags: None,
        };
        assert!(patch.is_empty());

        let patch = UpdateNoteRequest {
            title: Some("T".into()),
            content: None,
            tags: None,
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn list_query_parses_from_url_params() {
        let query: ListNotesQuery = serde_urlencoded::from_str(
            "cursor=2026-01-02T03:04:05Z&status=archived&tag=work&search=rust",
        )
        .expect("parse query");
        assert_eq!(
            query.cursor,
            Some(time::macros::datetime!(2026-01-02 03:04:05 UTC))
        );
        assert_eq!(query.status, Some(NoteStatus::Archived));
        assert_eq!(query.tag.as_deref(), Some("work"));
        assert_eq!(query.search.as_deref(), Some("rust"));
    }

    #[test]
    fn list_query_defaults_to_no_filters() {
        let query: ListNotesQuery = serde_urlencoded::from_str("").expect("parse empty query");
        assert!(query.cursor.is_none());
        assert!(query.status.is_none());
        assert!(query.tag.is_none());
        assert!(query.search.is_none());
    }

    #[test]
    fn list_item_serializes_without_content_or_author() {
        let item = NoteListItem {
            id: Uuid::new_v4(),
            title: "T".into(),
            tags: vec!["x".into()],
            status: NoteStatus::Active,
            created_at: time::macros::datetime!(2026-01-02 03:04:05 UTC),
        };
        let json = serde_json::to_value(&item).expect("serialize");
        assert_eq!(json["status"], "active");
        assert_eq!(json["createdAt"], "2026-01-02T03:04:05Z");
        assert!(json.get("content").is_none());
        assert!(json.get("authorId").is_none());
    }

    #[test]
    fn page_meta_cursor_is_nullable() {
        let json = serde_json::to_value(PageMeta { cursor: None }).expect("serialize");
        assert!(json["cursor"].is_null());
    }
}
