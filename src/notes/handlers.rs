use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    notes::{
        dto::{
            ArchivedResponse, CreateNoteRequest, DeletedResponse, ListNotesQuery, NotePage,
            NoteResponse, PageMeta, RestoredResponse, UpdateNoteRequest,
        },
        repo::NoteFilters,
        repo_types::{Note, NoteStatus},
    },
    response::ApiData,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route("/notes/:note_id", patch(update_note).delete(delete_note))
        .route("/notes/:note_id/archive", post(archive_note))
        .route("/notes/:note_id/restore", post(restore_note))
}

const NOTE_NOT_FOUND: &str = "Note not found or you don't have permissions";

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.is_empty() || title.len() > 128 {
        return Err(ApiError::Validation(
            "Title must be between 1 and 128 characters".into(),
        ));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), ApiError> {
    if content.is_empty() || content.len() > 10_000 {
        return Err(ApiError::Validation(
            "Content must be between 1 and 10000 characters".into(),
        ));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), ApiError> {
    if tags.len() > 3 {
        return Err(ApiError::Validation("At most 3 tags are allowed".into()));
    }
    Ok(())
}

/// Uniform authorization step run before every mutating operation. Raises the
/// authorization kind, which the boundary renders as a plain not-found.
async fn get_owned(state: &AppState, note_id: Uuid, author_id: Uuid) -> Result<Note, ApiError> {
    Note::find_by_id_and_author(&state.db, note_id, author_id)
        .await?
        .ok_or_else(|| ApiError::Authorization(NOTE_NOT_FOUND.into()))
}

#[instrument(skip(state))]
pub async fn list_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListNotesQuery>,
) -> Result<ApiData<NotePage>, ApiError> {
    if let Some(search) = query.search.as_deref() {
        if search.is_empty() {
            return Err(ApiError::Validation("Search must not be empty".into()));
        }
    }

    let filters = NoteFilters {
        status: query.status.unwrap_or(NoteStatus::Active),
        tag: query.tag,
        search: query.search,
        cursor: query.cursor,
    };

    let (notes, cursor) = Note::paginate(&state.db, auth.user_id, &filters).await?;
    Ok(ApiData(NotePage {
        docs: notes.into_iter().map(Into::into).collect(),
        meta: PageMeta { cursor },
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateNoteRequest>,
) -> Result<ApiData<NoteResponse>, ApiError> {
    validate_title(&payload.title)?;
    validate_content(&payload.content)?;
    validate_tags(&payload.tags)?;

    let note = Note::insert(
        &state.db,
        auth.user_id,
        &payload.title,
        &payload.content,
        &payload.tags,
    )
    .await?;

    info!(note_id = %note.id, user_id = %auth.user_id, "note created");
    Ok(ApiData(NoteResponse::from(note)))
}

#[instrument(skip(state, payload))]
pub async fn update_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(note_id): Path<Uuid>,
    Json(payload): Json<UpdateNoteRequest>,
) -> Result<ApiData<NoteResponse>, ApiError> {
    if payload.is_empty() {
        return Err(ApiError::Validation(
            "At least one field must be provided".into(),
        ));
    }
    if let Some(title) = payload.title.as_deref() {
        validate_title(title)?;
    }
    if let Some(content) = payload.content.as_deref() {
        validate_content(content)?;
    }
    if let Some(tags) = payload.tags.as_deref() {
        validate_tags(tags)?;
    }

    get_owned(&state, note_id, auth.user_id).await?;

    let note = Note::update(
        &state.db,
        note_id,
        payload.title.as_deref(),
        payload.content.as_deref(),
        payload.tags.as_deref(),
    )
    .await?;

    info!(note_id = %note.id, "note updated");
    Ok(ApiData(NoteResponse::from(note)))
}

#[instrument(skip(state))]
pub async fn archive_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(note_id): Path<Uuid>,
) -> Result<ApiData<ArchivedResponse>, ApiError> {
    get_owned(&state, note_id, auth.user_id).await?;

    let affected = Note::archive(&state.db, note_id).await?;
    if affected == 0 {
        error!(%note_id, "archive affected no rows");
        return Err(ApiError::Internal("Cannot archive note".into()));
    }

    info!(%note_id, "note archived");
    Ok(ApiData(ArchivedResponse { archived: true }))
}

#[instrument(skip(state))]
pub async fn restore_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(note_id): Path<Uuid>,
) -> Result<ApiData<RestoredResponse>, ApiError> {
    get_owned(&state, note_id, auth.user_id).await?;

    let affected = Note::restore(&state.db, note_id).await?;
    if affected == 0 {
        error!(%note_id, "restore affected no rows");
        return Err(ApiError::Internal("Cannot restore note".into()));
    }

    info!(%note_id, "note restored");
    Ok(ApiData(RestoredResponse { restored: true }))
}

#[instrument(skip(state))]
pub async fn delete_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(note_id): Path<Uuid>,
) -> Result<ApiData<DeletedResponse>, ApiError> {
    get_owned(&state, note_id, auth.user_id).await?;

    let affected = Note::delete(&state.db, note_id).await?;
    if affected == 0 {
        error!(%note_id, "delete affected no rows");
        return Err(ApiError::Internal("Cannot delete note".into()));
    }

    info!(%note_id, "note deleted");
    Ok(ApiData(DeletedResponse { deleted: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_bounds() {
        assert!(validate_title("T").is_ok());
        assert!(validate_title(&"t".repeat(128)).is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title(&"t".repeat(129)).is_err());
    }

    #[test]
    fn content_bounds() {
        assert!(validate_content("C").is_ok());
        assert!(validate_content(&"c".repeat(10_000)).is_ok());
        assert!(validate_content("").is_err());
        assert!(validate_content(&"c".repeat(10_001)).is_err());
    }

    #[test]
    fn at_most_three_tags() {
        let tags: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        assert!(validate_tags(&tags).is_ok());
        assert!(validate_tags(&[]).is_ok());

        let too_many: Vec<String> = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        assert!(validate_tags(&too_many).is_err());
    }

    #[test]
    fn validation_failures_are_the_validation_kind() {
        match validate_title("") {
            Err(ApiError::Validation(_)) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
