use diesel::prelude::*;

use crate::schema::notes;
use crate::services::ids;

pub const MAX_LIMIT: i64 = 200;
pub const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = notes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub note_type: String,
    pub modified_at: i64,
    pub modified_by_device: String,
    pub deleted_at: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notes)]
pub struct NewNote {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub note_type: String,
    pub modified_at: i64,
    pub modified_by_device: String,
    pub deleted_at: Option<i64>,
    pub created_at: i64,
}

impl NewNote {
    pub fn new(user_id: String, title: String, content: String, note_type: String, device_id: String) -> Self {
        let now = ids::now_millis();
        Self {
            id: ids::new_id(),
            user_id,
            title,
            content,
            note_type,
            modified_at: now,
            modified_by_device: device_id,
            deleted_at: None,
            created_at: now,
        }
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = notes)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub note_type: Option<String>,
    pub modified_at: i64,
    pub modified_by_device: String,
    pub deleted_at: Option<Option<i64>>,
}

#[derive(thiserror::Error, Debug)]
pub enum NoteError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Note not found")]
    NotFound,
}

impl Note {
    /// Visible get, scoped to the owning user: tombstoned or cross-tenant
    /// rows are reported as not-found.
    pub fn get(conn: &mut SqliteConnection, owner: &str, note_id: &str) -> Result<Self, NoteError> {
        use crate::schema::notes::dsl::*;

        notes
            .filter(id.eq(note_id))
            .filter(user_id.eq(owner))
            .filter(deleted_at.is_null())
            .first::<Note>(conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => NoteError::NotFound,
                _ => NoteError::Database(e),
            })
    }

    /// Ignores `deleted_at` and tenant scoping at the SQL layer; callers
    /// (the sync engine) are expected to check `user_id` themselves since
    /// push needs to see tombstones belonging to the authenticated user.
    pub fn get_any(conn: &mut SqliteConnection, owner: &str, note_id: &str) -> Result<Option<Self>, NoteError> {
        use crate::schema::notes::dsl::*;

        notes
            .filter(id.eq(note_id))
            .filter(user_id.eq(owner))
            .first::<Note>(conn)
            .optional()
            .map_err(NoteError::Database)
    }

    pub fn create(conn: &mut SqliteConnection, new_note: NewNote) -> Result<Self, NoteError> {
        use crate::schema::notes::dsl::*;

        diesel::insert_into(notes)
            .values(&new_note)
            .execute(conn)
            .map_err(NoteError::Database)?;

        Note::get(conn, &new_note.user_id, &new_note.id)
    }

    pub fn list(
        conn: &mut SqliteConnection,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Self>, i64), NoteError> {
        use crate::schema::notes::dsl::*;

        let total = notes
            .filter(user_id.eq(owner))
            .filter(deleted_at.is_null())
            .count()
            .get_result::<i64>(conn)
            .map_err(NoteError::Database)?;

        let items = notes
            .filter(user_id.eq(owner))
            .filter(deleted_at.is_null())
            .order(modified_at.desc())
            .limit(limit)
            .offset(offset)
            .load::<Note>(conn)
            .map_err(NoteError::Database)?;

        Ok((items, total))
    }

    /// Case-sensitive substring match over title or content, done in Rust
    /// rather than SQL `LIKE` because SQLite's `LIKE` is ASCII
    /// case-insensitive by default.
    pub fn search(
        conn: &mut SqliteConnection,
        owner: &str,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Self>, i64), NoteError> {
        use crate::schema::notes::dsl::*;

        let matching: Vec<Note> = notes
            .filter(user_id.eq(owner))
            .filter(deleted_at.is_null())
            .order(modified_at.desc())
            .load::<Note>(conn)
            .map_err(NoteError::Database)?
            .into_iter()
            .filter(|n| n.title.contains(query) || n.content.contains(query))
            .collect();

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }

    pub fn update(
        conn: &mut SqliteConnection,
        owner: &str,
        note_id: &str,
        update: NoteUpdate,
    ) -> Result<Self, NoteError> {
        use crate::schema::notes::dsl::*;

        let affected = diesel::update(
            notes
                .filter(id.eq(note_id))
                .filter(user_id.eq(owner))
                .filter(deleted_at.is_null()),
        )
        .set(&update)
        .execute(conn)
        .map_err(NoteError::Database)?;

        if affected == 0 {
            return Err(NoteError::NotFound);
        }

        Note::get(conn, owner, note_id)
    }

    pub fn soft_delete(
        conn: &mut SqliteConnection,
        owner: &str,
        note_id: &str,
    ) -> Result<(), NoteError> {
        use crate::schema::notes::dsl::*;

        let now = ids::now_millis();
        let affected = diesel::update(
            notes
                .filter(id.eq(note_id))
                .filter(user_id.eq(owner))
                .filter(deleted_at.is_null()),
        )
        .set((modified_at.eq(now), deleted_at.eq(Some(now))))
        .execute(conn)
        .map_err(NoteError::Database)?;

        if affected == 0 {
            return Err(NoteError::NotFound);
        }

        Ok(())
    }

    /// Every note owned by `owner` with `modified_at > cursor`, tombstones
    /// included, ordered ascending so the cursor can advance monotonically.
    pub fn changes_since(
        conn: &mut SqliteConnection,
        owner: &str,
        cursor_ms: i64,
    ) -> Result<Vec<Self>, NoteError> {
        use crate::schema::notes::dsl::*;

        notes
            .filter(user_id.eq(owner))
            .filter(modified_at.gt(cursor_ms))
            .order(modified_at.asc())
            .load::<Note>(conn)
            .map_err(NoteError::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, DatabaseConfig};

    fn test_pool() -> crate::db::SqlitePool {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note_test.db");
        std::mem::forget(dir);
        let config = DatabaseConfig {
            path: path.to_string_lossy().to_string(),
            max_connections: 2,
            connection_timeout: std::time::Duration::from_secs(5),
        };
        let pool = create_pool(&config).unwrap();
        let mut conn = pool.get().unwrap();
        diesel::connection::SimpleConnection::batch_execute(
            &mut conn,
            &std::fs::read_to_string(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/migrations/2026-01-01-000000_initial_schema/up.sql"
            ))
            .unwrap(),
        )
        .unwrap();
        pool
    }

    fn seed_user(conn: &mut SqliteConnection) -> String {
        use crate::models::user::{NewUser, User};
        let new_user = NewUser::new(
            format!("{}@test.co", ids::new_id()),
            "hash".to_string(),
            "Tester".to_string(),
        );
        User::create(conn, new_user).unwrap().id
    }

    #[test]
    fn test_create_get_list() {
        let pool = test_pool();
        let mut conn = pool.get().unwrap();
        let user_id = seed_user(&mut conn);

        let note = Note::create(
            &mut conn,
            NewNote::new(
                user_id.clone(),
                "T".into(),
                "C".into(),
                "note".into(),
                "d1".into(),
            ),
        )
        .unwrap();

        let fetched = Note::get(&mut conn, &user_id, &note.id).unwrap();
        assert_eq!(fetched.title, "T");

        let (items, total) = Note::list(&mut conn, &user_id, 50, 0).unwrap();
        assert_eq!(total, 1);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_cross_tenant_is_not_found() {
        let pool = test_pool();
        let mut conn = pool.get().unwrap();
        let owner = seed_user(&mut conn);
        let other = seed_user(&mut conn);

        let note = Note::create(
            &mut conn,
            NewNote::new(owner.clone(), "T".into(), "C".into(), "note".into(), "d1".into()),
        )
        .unwrap();

        let result = Note::get(&mut conn, &other, &note.id);
        assert!(matches!(result, Err(NoteError::NotFound)));

        let (_, total) = Note::list(&mut conn, &other, 50, 0).unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn test_soft_delete_hides_from_list_and_get_but_changes_since_sees_it() {
        let pool = test_pool();
        let mut conn = pool.get().unwrap();
        let owner = seed_user(&mut conn);

        let note = Note::create(
            &mut conn,
            NewNote::new(owner.clone(), "T".into(), "C".into(), "note".into(), "d1".into()),
        )
        .unwrap();

        Note::soft_delete(&mut conn, &owner, &note.id).unwrap();

        assert!(matches!(
            Note::get(&mut conn, &owner, &note.id),
            Err(NoteError::NotFound)
        ));
        let (_, total) = Note::list(&mut conn, &owner, 50, 0).unwrap();
        assert_eq!(total, 0);

        let deltas = Note::changes_since(&mut conn, &owner, 0).unwrap();
        assert_eq!(deltas.len(), 1);
        assert!(deltas[0].deleted_at.is_some());
    }

    #[test]
    fn test_search_is_case_sensitive_substring() {
        let pool = test_pool();
        let mut conn = pool.get().unwrap();
        let owner = seed_user(&mut conn);

        Note::create(
            &mut conn,
            NewNote::new(owner.clone(), "Hello".into(), "world".into(), "note".into(), "d1".into()),
        )
        .unwrap();

        let (found, _) = Note::search(&mut conn, &owner, "Hello", 50, 0).unwrap();
        assert_eq!(found.len(), 1);

        let (not_found, _) = Note::search(&mut conn, &owner, "hello", 50, 0).unwrap();
        assert_eq!(not_found.len(), 0);
    }
}
