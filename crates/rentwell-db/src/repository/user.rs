//! # User Repository
//!
//! Users are owned by the account service; this subsystem only reads names
//! for rental detail. `insert` exists for seeding and tests.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use rentwell_core::User;

/// Repository for user lookups.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, email FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Inserts a user.
    ///
    /// ## Errors
    /// `UniqueViolation` if the id or email is taken.
    pub async fn insert(&self, id: &str, name: &str, email: &str) -> DbResult<User> {
        debug!(id = %id, "Inserting user");

        sqlx::query("INSERT INTO users (id, name, email) VALUES (?1, ?2, ?3)")
            .bind(id)
            .bind(name)
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(User {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
        })
    }

    /// Number of users, used by the seeder to skip populated databases.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_get_and_count() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        assert_eq!(users.count().await.unwrap(), 0);
        users.insert("u-1", "Ana", "ana@example.com").await.unwrap();

        let ana = users.get_by_id("u-1").await.unwrap().unwrap();
        assert_eq!(ana.name, "Ana");
        assert_eq!(users.count().await.unwrap(), 1);
        assert!(users.get_by_id("u-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        users.insert("u-1", "Ana", "ana@example.com").await.unwrap();
        let err = users.insert("u-2", "Ana B", "ana@example.com").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
