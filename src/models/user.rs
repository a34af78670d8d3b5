use diesel::prelude::*;

use crate::schema::users;
use crate::services::ids;

/// User database model.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub created_at: i64,
}

impl NewUser {
    pub fn new(email: String, password_hash: String, display_name: String) -> Self {
        Self {
            id: ids::new_id(),
            email,
            password_hash,
            display_name,
            created_at: ids::now_millis(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum UserError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("User not found")]
    NotFound,

    #[error("An account with this email already exists")]
    EmailTaken,
}

impl User {
    pub fn find_by_id(conn: &mut SqliteConnection, user_id: &str) -> Result<Self, UserError> {
        use crate::schema::users::dsl::*;

        users
            .filter(id.eq(user_id))
            .first::<User>(conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => UserError::NotFound,
                _ => UserError::Database(e),
            })
    }

    /// Email lookup is an exact match against the stored (already
    /// normalized-to-lowercase) value; normalization happens at the
    /// handler boundary, not here.
    pub fn find_by_email(conn: &mut SqliteConnection, email_addr: &str) -> Result<Self, UserError> {
        use crate::schema::users::dsl::*;

        users
            .filter(email.eq(email_addr))
            .first::<User>(conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => UserError::NotFound,
                _ => UserError::Database(e),
            })
    }

    pub fn create(conn: &mut SqliteConnection, new_user: NewUser) -> Result<Self, UserError> {
        use crate::schema::users::dsl::*;

        diesel::insert_into(users)
            .values(&new_user)
            .execute(conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    _,
                ) => UserError::EmailTaken,
                _ => UserError::Database(e),
            })?;

        User::find_by_id(conn, &new_user.id)
    }
}
