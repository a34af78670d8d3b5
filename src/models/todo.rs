use diesel::prelude::*;

use crate::schema::todos;
use crate::services::ids;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = todos)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Todo {
    pub id: String,
    pub user_id: String,
    pub note_id: Option<String>,
    pub line_ref: Option<String>,
    pub content: String,
    pub due_date: Option<i64>,
    pub completed: bool,
    pub modified_at: i64,
    pub modified_by_device: String,
    pub deleted_at: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = todos)]
pub struct NewTodo {
    pub id: String,
    pub user_id: String,
    pub note_id: Option<String>,
    pub line_ref: Option<String>,
    pub content: String,
    pub due_date: Option<i64>,
    pub completed: bool,
    pub modified_at: i64,
    pub modified_by_device: String,
    pub deleted_at: Option<i64>,
    pub created_at: i64,
}

impl NewTodo {
    pub fn new(
        user_id: String,
        note_id: Option<String>,
        line_ref: Option<String>,
        content: String,
        due_date: Option<i64>,
        device_id: String,
    ) -> Self {
        let now = ids::now_millis();
        Self {
            id: ids::new_id(),
            user_id,
            note_id,
            line_ref,
            content,
            due_date,
            completed: false,
            modified_at: now,
            modified_by_device: device_id,
            deleted_at: None,
            created_at: now,
        }
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = todos)]
pub struct TodoUpdate {
    pub note_id: Option<Option<String>>,
    pub line_ref: Option<Option<String>>,
    pub content: Option<String>,
    pub due_date: Option<Option<i64>>,
    pub completed: Option<bool>,
    pub modified_at: i64,
    pub modified_by_device: String,
    pub deleted_at: Option<Option<i64>>,
}

#[derive(thiserror::Error, Debug)]
pub enum TodoError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Todo not found")]
    NotFound,
}

impl Todo {
    pub fn get(conn: &mut SqliteConnection, owner: &str, todo_id: &str) -> Result<Self, TodoError> {
        use crate::schema::todos::dsl::*;

        todos
            .filter(id.eq(todo_id))
            .filter(user_id.eq(owner))
            .filter(deleted_at.is_null())
            .first::<Todo>(conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => TodoError::NotFound,
                _ => TodoError::Database(e),
            })
    }

    pub fn get_any(conn: &mut SqliteConnection, owner: &str, todo_id: &str) -> Result<Option<Self>, TodoError> {
        use crate::schema::todos::dsl::*;

        todos
            .filter(id.eq(todo_id))
            .filter(user_id.eq(owner))
            .first::<Todo>(conn)
            .optional()
            .map_err(TodoError::Database)
    }

    pub fn create(conn: &mut SqliteConnection, new_todo: NewTodo) -> Result<Self, TodoError> {
        use crate::schema::todos::dsl::*;

        diesel::insert_into(todos)
            .values(&new_todo)
            .execute(conn)
            .map_err(TodoError::Database)?;

        Todo::get(conn, &new_todo.user_id, &new_todo.id)
    }

    pub fn list(
        conn: &mut SqliteConnection,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Self>, i64), TodoError> {
        use crate::schema::todos::dsl::*;

        let total = todos
            .filter(user_id.eq(owner))
            .filter(deleted_at.is_null())
            .count()
            .get_result::<i64>(conn)
            .map_err(TodoError::Database)?;

        let items = todos
            .filter(user_id.eq(owner))
            .filter(deleted_at.is_null())
            .order(modified_at.desc())
            .limit(limit)
            .offset(offset)
            .load::<Todo>(conn)
            .map_err(TodoError::Database)?;

        Ok((items, total))
    }

    pub fn update(
        conn: &mut SqliteConnection,
        owner: &str,
        todo_id: &str,
        update: TodoUpdate,
    ) -> Result<Self, TodoError> {
        use crate::schema::todos::dsl::*;

        let affected = diesel::update(
            todos
                .filter(id.eq(todo_id))
                .filter(user_id.eq(owner))
                .filter(deleted_at.is_null()),
        )
        .set(&update)
        .execute(conn)
        .map_err(TodoError::Database)?;

        if affected == 0 {
            return Err(TodoError::NotFound);
        }

        Todo::get(conn, owner, todo_id)
    }

    pub fn soft_delete(
        conn: &mut SqliteConnection,
        owner: &str,
        todo_id: &str,
    ) -> Result<(), TodoError> {
        use crate::schema::todos::dsl::*;

        let now = ids::now_millis();
        let affected = diesel::update(
            todos
                .filter(id.eq(todo_id))
                .filter(user_id.eq(owner))
                .filter(deleted_at.is_null()),
        )
        .set((modified_at.eq(now), deleted_at.eq(Some(now))))
        .execute(conn)
        .map_err(TodoError::Database)?;

        if affected == 0 {
            return Err(TodoError::NotFound);
        }

        Ok(())
    }

    /// Visible, incomplete, past-due todos, ordered by due date ascending,
    /// unpaginated.
    pub fn overdue(conn: &mut SqliteConnection, owner: &str, now_ms: i64) -> Result<Vec<Self>, TodoError> {
        use crate::schema::todos::dsl::*;

        todos
            .filter(user_id.eq(owner))
            .filter(deleted_at.is_null())
            .filter(completed.eq(false))
            .filter(due_date.lt(now_ms))
            .order(due_date.asc())
            .load::<Todo>(conn)
            .map_err(TodoError::Database)
    }

    pub fn changes_since(
        conn: &mut SqliteConnection,
        owner: &str,
        cursor_ms: i64,
    ) -> Result<Vec<Self>, TodoError> {
        use crate::schema::todos::dsl::*;

        todos
            .filter(user_id.eq(owner))
            .filter(modified_at.gt(cursor_ms))
            .order(modified_at.asc())
            .load::<Todo>(conn)
            .map_err(TodoError::Database)
    }
}
