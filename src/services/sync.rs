// Pull/push delta synchronization over the per-user notes and todos
// corpus. Both operations are plain functions over a connection rather
// than a service struct: there is no state beyond the store itself.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::note::Note;
use crate::models::todo::Todo;
use crate::schema::{notes, todos};
use crate::services::ids;

#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

#[derive(Debug, Deserialize)]
pub struct NoteChange {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub note_type: String,
    pub modified_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TodoChange {
    pub id: String,
    pub note_id: Option<String>,
    pub line_ref: Option<String>,
    pub content: String,
    pub due_date: Option<i64>,
    pub completed: bool,
    pub modified_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ConflictRecord {
    pub kind: String,
    pub id: String,
    pub server_copy: serde_json::Value,
}

#[derive(Debug, Serialize, Default)]
pub struct PushResult {
    pub accepted: i64,
    pub conflicts: Vec<ConflictRecord>,
}

/// `changes_since(user, cursor_ms)`: every note and todo owned by `user`
/// with `modified_at > cursor_ms`, tombstones included, plus the server's
/// current clock reading. Clients persist the returned timestamp and
/// present it as their next cursor, which keeps the protocol immune to
/// client clock skew.
pub fn changes_since(
    conn: &mut SqliteConnection,
    user_id: &str,
    cursor_ms: i64,
) -> Result<(Vec<Note>, Vec<Todo>, i64), SyncError> {
    let note_deltas = Note::changes_since(conn, user_id, cursor_ms)?;
    let todo_deltas = Todo::changes_since(conn, user_id, cursor_ms)?;
    Ok((note_deltas, todo_deltas, ids::now_millis()))
}

fn note_json(note: &Note) -> serde_json::Value {
    json!({
        "id": note.id,
        "title": note.title,
        "content": note.content,
        "type": note.note_type,
        "modified_at": note.modified_at,
        "deleted_at": note.deleted_at,
    })
}

fn todo_json(todo: &Todo) -> serde_json::Value {
    json!({
        "id": todo.id,
        "note_id": todo.note_id,
        "line_ref": todo.line_ref,
        "content": todo.content,
        "due_date": todo.due_date,
        "completed": todo.completed,
        "modified_at": todo.modified_at,
        "deleted_at": todo.deleted_at,
    })
}

/// `apply_batch(user, notes[], todos[])`. Every incoming record is forced
/// onto `user_id` (the body's own claim of ownership is never trusted).
/// Absent records are inserted verbatim; present records are overwritten
/// only if the incoming `modified_at` is strictly greater than the stored
/// one, otherwise the push is reported as a conflict and the stored
/// record is left untouched. A database error anywhere in the batch
/// aborts the whole call — the caller must not see a partial accept
/// count, since retrying the full batch is always safe under LWW.
pub fn apply_batch(
    conn: &mut SqliteConnection,
    user_id: &str,
    note_changes: Vec<NoteChange>,
    todo_changes: Vec<TodoChange>,
    device_id: &str,
) -> Result<PushResult, SyncError> {
    let mut result = PushResult::default();

    for change in note_changes {
        match Note::get_any(conn, user_id, &change.id)? {
            None => {
                use notes::dsl;
                let now = ids::now_millis();
                diesel::insert_into(dsl::notes)
                    .values((
                        dsl::id.eq(&change.id),
                        dsl::user_id.eq(user_id),
                        dsl::title.eq(&change.title),
                        dsl::content.eq(&change.content),
                        dsl::note_type.eq(&change.note_type),
                        dsl::modified_at.eq(change.modified_at),
                        dsl::modified_by_device.eq(device_id),
                        dsl::deleted_at.eq(change.deleted_at),
                        dsl::created_at.eq(now),
                    ))
                    .execute(conn)?;
                result.accepted += 1;
            },
            Some(existing) if change.modified_at > existing.modified_at => {
                use notes::dsl;
                diesel::update(dsl::notes.filter(dsl::id.eq(&change.id)).filter(dsl::user_id.eq(user_id)))
                    .set((
                        dsl::title.eq(&change.title),
                        dsl::content.eq(&change.content),
                        dsl::note_type.eq(&change.note_type),
                        dsl::modified_at.eq(change.modified_at),
                        dsl::modified_by_device.eq(device_id),
                        dsl::deleted_at.eq(change.deleted_at),
                    ))
                    .execute(conn)?;
                result.accepted += 1;
            },
            Some(existing) => {
                result.conflicts.push(ConflictRecord {
                    kind: "note".to_string(),
                    id: change.id,
                    server_copy: note_json(&existing),
                });
            },
        }
    }

    for change in todo_changes {
        match Todo::get_any(conn, user_id, &change.id)? {
            None => {
                use todos::dsl;
                let now = ids::now_millis();
                diesel::insert_into(dsl::todos)
                    .values((
                        dsl::id.eq(&change.id),
                        dsl::user_id.eq(user_id),
                        dsl::note_id.eq(&change.note_id),
                        dsl::line_ref.eq(&change.line_ref),
                        dsl::content.eq(&change.content),
                        dsl::due_date.eq(change.due_date),
                        dsl::completed.eq(change.completed),
                        dsl::modified_at.eq(change.modified_at),
                        dsl::modified_by_device.eq(device_id),
                        dsl::deleted_at.eq(change.deleted_at),
                        dsl::created_at.eq(now),
                    ))
                    .execute(conn)?;
                result.accepted += 1;
            },
            Some(existing) if change.modified_at > existing.modified_at => {
                use todos::dsl;
                diesel::update(dsl::todos.filter(dsl::id.eq(&change.id)).filter(dsl::user_id.eq(user_id)))
                    .set((
                        dsl::note_id.eq(&change.note_id),
                        dsl::line_ref.eq(&change.line_ref),
                        dsl::content.eq(&change.content),
                        dsl::due_date.eq(change.due_date),
                        dsl::completed.eq(change.completed),
                        dsl::modified_at.eq(change.modified_at),
                        dsl::modified_by_device.eq(device_id),
                        dsl::deleted_at.eq(change.deleted_at),
                    ))
                    .execute(conn)?;
                result.accepted += 1;
            },
            Some(existing) => {
                result.conflicts.push(ConflictRecord {
                    kind: "todo".to_string(),
                    id: change.id,
                    server_copy: todo_json(&existing),
                });
            },
        }
    }

    Ok(result)
}
