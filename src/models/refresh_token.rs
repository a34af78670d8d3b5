use diesel::prelude::*;
use sha2::{Digest, Sha256};

use crate::schema::refresh_tokens;
use crate::services::ids;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = refresh_tokens)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RefreshToken {
    pub id: String,
    pub user_id: String,
    pub device_id: String,
    pub token_hash: String,
    pub expires_at: i64,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub id: String,
    pub user_id: String,
    pub device_id: String,
    pub token_hash: String,
    pub expires_at: i64,
    pub created_at: i64,
}

impl NewRefreshToken {
    /// `id` is the `jti` the caller already minted for the signed token;
    /// the record must be stored under the same id so that rotation can
    /// delete it by id.
    pub fn new(jti: String, user_id: String, device_id: String, token: &str, expires_at: i64) -> Self {
        Self {
            id: jti,
            user_id,
            device_id,
            token_hash: sha256_hex(token),
            expires_at,
            created_at: ids::now_millis(),
        }
    }
}

/// SHA-256 hex digest of the opaque refresh token string. The clear-text
/// token is never persisted, only this hash.
pub fn sha256_hex(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(thiserror::Error, Debug)]
pub enum RefreshTokenError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Refresh token not found")]
    NotFound,

    #[error("Refresh token expired")]
    Expired,
}

impl RefreshToken {
    pub fn store(conn: &mut SqliteConnection, new_token: NewRefreshToken) -> Result<Self, RefreshTokenError> {
        use crate::schema::refresh_tokens::dsl::*;

        diesel::insert_into(refresh_tokens)
            .values(&new_token)
            .execute(conn)
            .map_err(RefreshTokenError::Database)?;

        refresh_tokens
            .filter(id.eq(&new_token.id))
            .first::<RefreshToken>(conn)
            .map_err(RefreshTokenError::Database)
    }

    /// Look up a refresh token record by the hash of the presented token.
    /// A row found but already expired is reported distinctly so callers
    /// can still choose to delete it, but verification must treat it as
    /// unauthorized either way.
    pub fn find_by_hash(
        conn: &mut SqliteConnection,
        token_hash_hex: &str,
    ) -> Result<Self, RefreshTokenError> {
        use crate::schema::refresh_tokens::dsl::*;

        let record = refresh_tokens
            .filter(token_hash.eq(token_hash_hex))
            .first::<RefreshToken>(conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => RefreshTokenError::NotFound,
                _ => RefreshTokenError::Database(e),
            })?;

        if record.expires_at < ids::now_millis() {
            return Err(RefreshTokenError::Expired);
        }

        Ok(record)
    }

    /// Hard-delete by id. Rotation and replay-detection both rely on this
    /// being a real delete, not a soft revoke: once gone, no row can ever
    /// match the presented token's hash again.
    pub fn delete_by_id(conn: &mut SqliteConnection, token_id: &str) -> Result<(), RefreshTokenError> {
        use crate::schema::refresh_tokens::dsl::*;

        diesel::delete(refresh_tokens.filter(id.eq(token_id)))
            .execute(conn)
            .map_err(RefreshTokenError::Database)?;

        Ok(())
    }

    /// Logout: delete every refresh token record for the user, across all
    /// devices.
    pub fn delete_all_for_user(conn: &mut SqliteConnection, owner: &str) -> Result<usize, RefreshTokenError> {
        use crate::schema::refresh_tokens::dsl::*;

        diesel::delete(refresh_tokens.filter(user_id.eq(owner)))
            .execute(conn)
            .map_err(RefreshTokenError::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, DatabaseConfig};
    use crate::models::user::{NewUser, User};

    fn test_pool() -> crate::db::SqlitePool {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refresh_test.db");
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
        let new_user = NewUser::new(
            format!("{}@test.co", ids::new_id()),
            "hash".to_string(),
            "Tester".to_string(),
        );
        User::create(conn, new_user).unwrap().id
    }

    #[test]
    fn test_rotation_is_single_use() {
        let pool = test_pool();
        let mut conn = pool.get().unwrap();
        let owner = seed_user(&mut conn);

        let token = "opaque-refresh-token";
        let jti = ids::new_id();
        let stored = RefreshToken::store(
            &mut conn,
            NewRefreshToken::new(jti.clone(), owner.clone(), "d1".into(), token, ids::now_millis() + 1_000_000),
        )
        .unwrap();

        let found = RefreshToken::find_by_hash(&mut conn, &sha256_hex(token)).unwrap();
        assert_eq!(found.id, stored.id);

        RefreshToken::delete_by_id(&mut conn, &stored.id).unwrap();

        let result = RefreshToken::find_by_hash(&mut conn, &sha256_hex(token));
        assert!(matches!(result, Err(RefreshTokenError::NotFound)));
    }

    #[test]
    fn test_logout_deletes_all_devices() {
        let pool = test_pool();
        let mut conn = pool.get().unwrap();
        let owner = seed_user(&mut conn);

        for device in ["d1", "d2"] {
            RefreshToken::store(
                &mut conn,
                NewRefreshToken::new(
                    ids::new_id(),
                    owner.clone(),
                    device.into(),
                    &format!("token-{}", device),
                    ids::now_millis() + 1_000_000,
                ),
            )
            .unwrap();
        }

        let deleted = RefreshToken::delete_all_for_user(&mut conn, &owner).unwrap();
        assert_eq!(deleted, 2);

        assert!(matches!(
            RefreshToken::find_by_hash(&mut conn, &sha256_hex("token-d1")),
            Err(RefreshTokenError::NotFound)
        ));
    }
}
